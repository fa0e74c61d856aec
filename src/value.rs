use std::{fmt, str::FromStr};

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

use crate::config::Config;

/// A dynamically typed value of the expression language.
///
/// # Numbers
///
/// Numbers are decimals (`rust_decimal::Decimal`, 28 significant digits), so
/// `0.1 + 0.2` is exactly `0.3`. Multiplication, division and power are
/// rounded to the configured scale; addition and subtraction are exact.
///
/// # Examples
///
/// ```
/// use tally_lang::Value;
///
/// let null = Value::Null;
/// let number = Value::from(42);
/// let text = Value::from("hello");
/// let flag = Value::Boolean(true);
/// let list = Value::Array(vec![Value::from(1), Value::from("two")]);
///
/// assert_eq!(list.to_string(), r#"[1, "two"]"#);
/// assert!(null.is_null());
/// assert_eq!(number.type_name(), "numeric");
/// # let _ = (text, flag);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent or unknown value
    #[default]
    Null,

    /// Decimal number
    Numeric(Decimal),

    /// UTF-8 string
    String(String),

    /// Boolean (true/false)
    Boolean(bool),

    /// Ordered sequence of values
    Array(Vec<Value>),
}

impl Value {
    /// Converts a float, yielding `Null` for NaN and infinities.
    pub fn from_f64(n: f64) -> Self {
        Decimal::from_f64(n).map(Value::Numeric).unwrap_or(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Human-readable type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Numeric(_) => "numeric",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Array(_) => "array",
        }
    }

    /// Convert to boolean for conditions.
    ///
    /// Strings are true when they spell `true` (any case) or a non-zero number.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Numeric(n) => !n.is_zero(),
            Value::String(s) => {
                s.trim().eq_ignore_ascii_case("true")
                    || parse_decimal(s).is_some_and(|n| !n.is_zero())
            }
            Value::Array(arr) => !arr.is_empty(),
        }
    }

    /// Numeric view of the value: numbers as-is, strings when they parse.
    pub fn to_numeric(&self) -> Option<Decimal> {
        match self {
            Value::Numeric(n) => Some(*n),
            Value::String(s) => parse_decimal(s),
            _ => None,
        }
    }

    /// Get as float
    pub fn as_f64(&self) -> Option<f64> {
        self.to_numeric().and_then(|n| n.to_f64())
    }

    /// Get as integer, truncating any fraction.
    pub fn as_i64(&self) -> Option<i64> {
        self.to_numeric().and_then(|n| n.trunc().to_i64())
    }

    /// Renders the value as text using the configured scale and rounding.
    ///
    /// Integral numbers have no fractional part and trailing zeros are dropped.
    pub fn render(&self, config: &Config) -> String {
        match self {
            Value::Numeric(n) => render_decimal(config.round(*n)),
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => format!("\"{}\"", s),
                        other => other.render(config),
                    })
                    .collect();
                format!("[{}]", parts.join(", "))
            }
            other => other.to_string(),
        }
    }
}

/// Text form without rounding.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Numeric(n) => write!(f, "{}", render_decimal(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::String(s) => write!(f, "\"{}\"", s)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, "]")
            }
        }
    }
}

fn render_decimal(n: Decimal) -> String {
    let normalized = n.normalize();
    if normalized.is_zero() {
        "0".to_string()
    } else {
        normalized.to_string()
    }
}

/// Parses numeric text such as `"12"`, `"-0.5"` or `"1e3"`.
///
/// Surrounding whitespace is ignored; anything else that is not part of a
/// number makes the whole text non-numeric.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty()
        || !text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        || !text.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(text).ok()
    } else {
        Decimal::from_str(text).ok()
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Value::Numeric(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Numeric(Decimal::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Numeric(Decimal::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Numeric(Decimal::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}
