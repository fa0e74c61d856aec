//! JSON <-> Value conversion utilities

use rust_decimal::prelude::ToPrimitive;

use crate::{
    config::Config,
    namespace::{VariantContainer, Variables},
    value::{Value, parse_decimal},
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    #[error("expected a JSON object of variables, found {0}")]
    NotAnObject(&'static str),

    /// Objects can only group variables; they have no value representation.
    #[error("JSON object at '{0}' cannot be stored as a value")]
    UnsupportedObject(String),
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn convert_at(v: serde_json::Value, path: &str) -> Result<Value, ConvertError> {
    Ok(match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match parse_decimal(&n.to_string()) {
            Some(d) => Value::Numeric(d),
            None => n.as_f64().map(Value::from_f64).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Array(
            arr.into_iter()
                .enumerate()
                .map(|(i, item)| convert_at(item, &format!("{}[{}]", path, i)))
                .collect::<Result<_, _>>()?,
        ),
        serde_json::Value::Object(_) => return Err(ConvertError::UnsupportedObject(path.to_string())),
    })
}

/// Convert serde_json::Value to Value. Numbers keep their exact decimal
/// digits when they fit in a decimal.
pub fn json_to_value(v: serde_json::Value) -> Result<Value, ConvertError> {
    convert_at(v, "$")
}

/// Convert Value to serde_json::Value. Integral numbers become JSON integers;
/// other numbers are rounded to the configured scale and emitted as floats.
pub fn value_to_json(v: &Value, config: &Config) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Numeric(n) => {
            let rounded = config.round(*n);
            if rounded.fract().is_zero()
                && let Some(i) = rounded.to_i64()
            {
                serde_json::Value::Number(i.into())
            } else {
                rounded
                    .to_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
        }
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(|item| value_to_json(item, config)).collect())
        }
    }
}

fn flatten_into(
    vars: &mut Variables,
    prefix: &str,
    object: serde_json::Map<String, serde_json::Value>,
) -> Result<(), ConvertError> {
    for (key, value) in object {
        let name = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            serde_json::Value::Object(inner) => flatten_into(vars, &name, inner)?,
            other => {
                let value = convert_at(other, &name)?;
                vars.set(&name, value);
            }
        }
    }
    Ok(())
}

/// Builds a namespace from a JSON object. Top-level keys become variables and
/// nested objects are flattened into dotted names, so
/// `{"customer": {"vip": true}}` defines `customer.vip`.
///
/// # Examples
///
/// ```
/// use tally_lang::{Config, Value, VariantContainer};
/// use tally_lang::convert::variables_from_json;
///
/// let json = serde_json::json!({"price": 9.5, "customer": {"vip": true}});
/// let vars = variables_from_json(json, &Config::default()).unwrap();
///
/// assert_eq!(vars.get("price").to_string(), "9.5");
/// assert_eq!(vars.get("customer.vip"), Value::Boolean(true));
/// ```
pub fn variables_from_json(json: serde_json::Value, config: &Config) -> Result<Variables, ConvertError> {
    let serde_json::Value::Object(object) = json else {
        return Err(ConvertError::NotAnObject(json_kind(&json)));
    };
    let mut vars = if config.case_sensitive {
        Variables::new()
    } else {
        Variables::case_insensitive()
    };
    flatten_into(&mut vars, "", object)?;
    Ok(vars)
}

/// Namespace contents as a JSON object, keys in sorted order.
pub fn variables_to_json(vars: &Variables, config: &Config) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for name in vars.names() {
        object.insert(name.to_string(), value_to_json(&vars.get(name), config));
    }
    serde_json::Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_stay_exact() {
        let value = json_to_value(json!(0.1)).unwrap();
        assert_eq!(value.to_string(), "0.1");
        assert_eq!(json_to_value(json!(12)).unwrap(), Value::from(12));
    }

    #[test]
    fn test_object_inside_array_is_rejected() {
        let err = json_to_value(json!([1, {"a": 2}])).unwrap_err();
        assert_eq!(err, ConvertError::UnsupportedObject("$[1]".into()));
    }

    #[test]
    fn test_top_level_must_be_object() {
        assert_eq!(
            variables_from_json(json!([1]), &Config::default()).unwrap_err(),
            ConvertError::NotAnObject("array")
        );
    }

    #[test]
    fn test_value_to_json() {
        let config = Config::default().with_scale(2);
        let value = Value::Array(vec![
            Value::from(3),
            Value::Numeric(rust_decimal::Decimal::new(1255, 3)),
            Value::from("x"),
            Value::Null,
        ]);
        assert_eq!(value_to_json(&value, &config), json!([3, 1.26, "x", null]));
    }

    #[test]
    fn test_variables_round_trip_through_flattening() {
        let config = Config::default();
        let vars = variables_from_json(json!({"a": {"b": {"c": 1}}, "d": "x"}), &config).unwrap();
        assert_eq!(variables_to_json(&vars, &config), json!({"a.b.c": 1, "d": "x"}));
    }
}
