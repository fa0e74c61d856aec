use std::cmp::Ordering;

use rust_decimal::{
    Decimal, MathematicalOps,
    prelude::{FromPrimitive, ToPrimitive},
};

use super::{EvalError, Evaluator, operators};
use crate::{
    ast::{Builtin, Expr},
    config::MAX_SCALE,
    namespace::VariantContainer,
    scope::Scope,
    value::{Value, parse_decimal},
};

/// Numeric view of a math argument. `None` means the argument has no numeric
/// reading and the call yields `Null`; a string that is not a number is an
/// error.
fn decimal_argument(function: Builtin, value: &Value) -> Result<Option<Decimal>, EvalError> {
    match value {
        Value::Numeric(n) => Ok(Some(*n)),
        Value::String(s) => parse_decimal(s).map(Some).ok_or_else(|| {
            EvalError::TypeError(format!("{}() cannot convert \"{}\" to a number", function, s))
        }),
        _ => Ok(None),
    }
}

impl Evaluator<'_> {
    pub(super) fn call_builtin(
        &self,
        function: Builtin,
        args: &[Expr],
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
        operands: &mut Vec<Value>,
    ) -> Result<Value, EvalError> {
        let arity = function.arity();
        if !arity.accepts(args.len()) {
            return Err(EvalError::ArgumentCount {
                function: function.name().to_string(),
                expected: arity.to_string(),
                found: args.len(),
            });
        }

        let values = self.eval_arguments(args, vars, scope, operands)?;

        match function {
            Builtin::Sin => self.float_math(function, &values[0], f64::sin),
            Builtin::Cos => self.float_math(function, &values[0], f64::cos),
            Builtin::Asin => self.float_math(function, &values[0], f64::asin),
            Builtin::Acos => self.float_math(function, &values[0], f64::acos),
            Builtin::Tan => self.float_math(function, &values[0], f64::tan),
            Builtin::Atan => self.float_math(function, &values[0], f64::atan),
            Builtin::Exp => self.float_math(function, &values[0], f64::exp),
            Builtin::Ln => self.float_math(function, &values[0], f64::ln),
            Builtin::Log => self.float_math(function, &values[0], f64::log10),
            Builtin::Neg => self.exact_math(function, &values[0], |n| Some(-n)),
            Builtin::Abs => self.exact_math(function, &values[0], |n| Some(n.abs())),
            Builtin::Sqrt => self.exact_math(function, &values[0], |n| n.sqrt()),
            Builtin::Floor => self.exact_math(function, &values[0], |n| Some(n.floor())),
            Builtin::Ceil => self.exact_math(function, &values[0], |n| Some(n.ceil())),
            Builtin::Round => self.round(&values),
            Builtin::Min => self.extreme(function, &values, Ordering::Less),
            Builtin::Max => self.extreme(function, &values, Ordering::Greater),

            Builtin::Size => Ok(Value::from(match &values[0] {
                Value::Array(items) => items.len(),
                Value::String(s) => s.chars().count(),
                Value::Null => 0,
                _ => 1,
            })),
            Builtin::IsString => Ok(Value::Boolean(matches!(values[0], Value::String(_)))),
            Builtin::IsNumeric => Ok(Value::Boolean(matches!(values[0], Value::Numeric(_)))),
            Builtin::IsArray => Ok(Value::Boolean(matches!(values[0], Value::Array(_)))),
            Builtin::IsNull => Ok(Value::Boolean(values[0].is_null())),
            Builtin::ToArray => Ok(Value::Array(values)),
            Builtin::ToString => Ok(match &values[0] {
                Value::Null => Value::Null,
                other => Value::String(other.render(self.config)),
            }),
            Builtin::ToNumber => Ok(match &values[0] {
                Value::Boolean(b) => Value::from(i64::from(*b)),
                other => other.to_numeric().map(Value::Numeric).unwrap_or(Value::Null),
            }),

            Builtin::Day
            | Builtin::Month
            | Builtin::Year
            | Builtin::DayOfYear
            | Builtin::DaysInMonth
            | Builtin::Now
            | Builtin::Iso
            | Builtin::DaysBeforeNow
            | Builtin::HoursBeforeNow => self.call_date(function, &values),

            Builtin::Debug => {
                let text = values[0].render(self.config);
                tracing::info!(target: "tally::debug", "{}", text);
                if let Some(tracer) = self.tracer {
                    tracer.trace(&format!("debug: {}", text));
                }
                Ok(Value::Null)
            }
        }
    }

    /// Floating-point math; results that are not finite become `Null`.
    fn float_math(&self, function: Builtin, value: &Value, f: fn(f64) -> f64) -> Result<Value, EvalError> {
        let Some(x) = decimal_argument(function, value)?.and_then(|n| n.to_f64()) else {
            return Ok(Value::Null);
        };
        let result = f(x);
        if !result.is_finite() {
            return Ok(Value::Null);
        }
        Ok(Decimal::from_f64(result)
            .map(|d| Value::Numeric(self.config.round(d)))
            .unwrap_or(Value::Null))
    }

    fn exact_math(
        &self,
        function: Builtin,
        value: &Value,
        f: impl Fn(Decimal) -> Option<Decimal>,
    ) -> Result<Value, EvalError> {
        Ok(decimal_argument(function, value)?
            .and_then(f)
            .map(|d| Value::Numeric(self.config.round(d)))
            .unwrap_or(Value::Null))
    }

    /// `round(x[, digits])` using the configured rounding strategy.
    fn round(&self, values: &[Value]) -> Result<Value, EvalError> {
        let digits = match values.get(1) {
            None => 0,
            Some(value) => value
                .as_i64()
                .ok_or_else(|| EvalError::TypeError(format!("round() digits must be numeric, got '{}'", value)))?
                .clamp(0, i64::from(MAX_SCALE)) as u32,
        };
        Ok(decimal_argument(Builtin::Round, &values[0])?
            .map(|n| Value::Numeric(n.round_dp_with_strategy(digits, self.config.rounding)))
            .unwrap_or(Value::Null))
    }

    /// `min`/`max` over the arguments, or over the elements of a single array
    /// argument. Nulls are skipped.
    fn extreme(&self, function: Builtin, values: &[Value], wanted: Ordering) -> Result<Value, EvalError> {
        let candidates = match values {
            [Value::Array(items)] => items.as_slice(),
            _ => values,
        };

        let mut best: Option<&Value> = None;
        for candidate in candidates.iter().filter(|v| !v.is_null()) {
            best = match best {
                None => Some(candidate),
                Some(current) => match operators::compare(candidate, current) {
                    Some(ordering) if ordering == wanted => Some(candidate),
                    Some(_) => Some(current),
                    None => {
                        return Err(EvalError::TypeError(format!(
                            "{}() cannot compare {} with {}",
                            function,
                            candidate.type_name(),
                            current.type_name()
                        )));
                    }
                },
            };
        }
        Ok(best.cloned().unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Config, Scope, Value, Variables, evaluator::EvalError, evaluator::Evaluator, parser::parse_program};

    fn eval(source: &str) -> Result<Value, EvalError> {
        let config = Config::default();
        let program = parse_program(source, &config).unwrap();
        Evaluator::new(&config).execute(&program, &mut Variables::new(), &Scope::new())
    }

    #[test]
    fn test_math_arguments() {
        assert_eq!(eval("sqrt(4)").unwrap(), Value::from(2));
        assert_eq!(eval("sqrt(-4)").unwrap(), Value::Null);
        assert_eq!(eval("sqrt(\"16\")").unwrap(), Value::from(4));
        assert_eq!(eval("sin(null)").unwrap(), Value::Null);
        assert_eq!(eval("cos(true)").unwrap(), Value::Null);
        assert_eq!(eval("ln(0)").unwrap(), Value::Null);
        assert!(matches!(eval("exp(\"abc\")"), Err(EvalError::TypeError(_))));
    }

    #[test]
    fn test_exact_functions() {
        assert_eq!(eval("neg(2.5)").unwrap().to_string(), "-2.5");
        assert_eq!(eval("abs(-3)").unwrap(), Value::from(3));
        assert_eq!(eval("floor(2.7)").unwrap(), Value::from(2));
        assert_eq!(eval("ceil(2.1)").unwrap(), Value::from(3));
        assert_eq!(eval("round(2.5)").unwrap(), Value::from(2));
        assert_eq!(eval("round(3.14159, 2)").unwrap().to_string(), "3.14");
    }

    #[test]
    fn test_min_max() {
        assert_eq!(eval("min(3, 1, 2)").unwrap(), Value::from(1));
        assert_eq!(eval("max(to_array(3, 7, null, 2))").unwrap(), Value::from(7));
        assert_eq!(eval("max(\"apple\", \"pear\")").unwrap(), Value::from("pear"));
        assert!(matches!(eval("min(1, true)"), Err(EvalError::TypeError(_))));
    }

    #[test]
    fn test_introspection() {
        assert_eq!(eval("size(\"hello\")").unwrap(), Value::from(5));
        assert_eq!(eval("size(to_array(1, 2, 3))").unwrap(), Value::from(3));
        assert_eq!(eval("size(null)").unwrap(), Value::from(0));
        assert_eq!(eval("is_numeric(\"5\")").unwrap(), Value::Boolean(false));
        assert_eq!(eval("is_string(\"5\")").unwrap(), Value::Boolean(true));
        assert_eq!(eval("is_array(to_array())").unwrap(), Value::Boolean(true));
        assert_eq!(eval("is_null(missing)").unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(eval("to_number(\" 12.50 \")").unwrap().to_string(), "12.5");
        assert_eq!(eval("to_number(\"x\")").unwrap(), Value::Null);
        assert_eq!(eval("to_number(true)").unwrap(), Value::from(1));
        assert_eq!(eval("to_string(1.50)").unwrap(), Value::from("1.5"));
    }

    #[test]
    fn test_argument_count() {
        assert_eq!(
            eval("sqrt(1, 2)"),
            Err(EvalError::ArgumentCount {
                function: "sqrt".into(),
                expected: "1".into(),
                found: 2
            })
        );
        assert!(matches!(eval("now(1)"), Err(EvalError::ArgumentCount { .. })));
        assert!(matches!(eval("min()"), Err(EvalError::ArgumentCount { .. })));
    }

    #[test]
    fn test_debug_returns_null() {
        assert_eq!(eval("debug(1 + 1)").unwrap(), Value::Null);
    }
}
