//! Binary operator semantics over [`Value`].
//!
//! Arrays broadcast: comparing an array with a scalar is true when any
//! element satisfies the comparison, and `+`/`-` with an array build a new
//! array without touching their operands.

use std::cmp::Ordering;

use rust_decimal::{
    Decimal, MathematicalOps,
    prelude::{FromPrimitive, ToPrimitive},
};

use super::EvalError;
use crate::{
    ast::BinOp,
    config::Config,
    value::{Value, parse_decimal},
};

/// Applies a strict (non short-circuiting) binary operator.
pub fn apply(op: BinOp, left: &Value, right: &Value, config: &Config) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => add(left, right, config),
        BinOp::Subtract => subtract(left, right),
        BinOp::Multiply | BinOp::Divide | BinOp::Power => arithmetic(op, left, right, config),
        BinOp::BitAnd | BinOp::BitOr => bitwise(op, left, right),
        BinOp::Equal
        | BinOp::NotEqual
        | BinOp::LessThan
        | BinOp::GreaterThan
        | BinOp::LessEqual
        | BinOp::GreaterEqual => Ok(Value::Boolean(compare_with(op, left, right))),
        BinOp::And | BinOp::Or => Err(EvalError::Internal(format!(
            "'{}' reached strict operator evaluation",
            op
        ))),
    }
}

fn type_error(op: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeError(format!(
        "cannot apply '{}' to {} and {}",
        op,
        left.type_name(),
        right.type_name()
    ))
}

fn checked(result: Option<Decimal>, op: BinOp) -> Result<Decimal, EvalError> {
    result.ok_or_else(|| EvalError::Overflow(op.symbol().to_string()))
}

fn add(left: &Value, right: &Value, config: &Config) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Array(items), Value::Array(more)) => {
            Ok(Value::Array(items.iter().chain(more).cloned().collect()))
        }
        (Value::Array(items), scalar) => {
            let mut appended = items.clone();
            appended.push(scalar.clone());
            Ok(Value::Array(appended))
        }
        (scalar, Value::Array(items)) => {
            let mut prepended = Vec::with_capacity(items.len() + 1);
            prepended.push(scalar.clone());
            prepended.extend(items.iter().cloned());
            Ok(Value::Array(prepended))
        }
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Boolean(_), _) | (_, Value::Boolean(_)) => Err(type_error("+", left, right)),
        (Value::Numeric(a), Value::Numeric(b)) => {
            Ok(Value::Numeric(checked(a.checked_add(*b), BinOp::Add)?))
        }
        (Value::String(s), Value::Numeric(n)) | (Value::Numeric(n), Value::String(s)) => {
            match parse_decimal(s) {
                Some(parsed) => Ok(Value::Numeric(checked(parsed.checked_add(*n), BinOp::Add)?)),
                None => Ok(Value::String(format!(
                    "{}{}",
                    left.render(config),
                    right.render(config)
                ))),
            }
        }
        _ => Ok(Value::String(format!(
            "{}{}",
            left.render(config),
            right.render(config)
        ))),
    }
}

fn subtract(left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Array(items), Value::Array(removed)) => {
            let mut remaining = items.clone();
            for item in removed {
                if let Some(pos) = remaining.iter().position(|x| values_equal(x, item)) {
                    remaining.remove(pos);
                }
            }
            Ok(Value::Array(remaining))
        }
        (Value::Array(items), scalar) => {
            let mut remaining = items.clone();
            if let Some(pos) = remaining.iter().position(|x| values_equal(x, scalar)) {
                remaining.remove(pos);
            }
            Ok(Value::Array(remaining))
        }
        (_, Value::Array(_)) => Err(type_error("-", left, right)),
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Boolean(_), _) | (_, Value::Boolean(_)) => Err(type_error("-", left, right)),
        _ => {
            let (a, b) = numeric_pair(BinOp::Subtract, left, right)?;
            Ok(Value::Numeric(checked(a.checked_sub(b), BinOp::Subtract)?))
        }
    }
}

fn numeric_pair(op: BinOp, left: &Value, right: &Value) -> Result<(Decimal, Decimal), EvalError> {
    let operand = |value: &Value| {
        value.to_numeric().ok_or_else(|| {
            EvalError::TypeError(format!(
                "'{}' needs numeric operands, '{}' is not a number",
                op.symbol(),
                value
            ))
        })
    };
    Ok((operand(left)?, operand(right)?))
}

/// `*`, `/` and power. Results are rounded to the configured scale.
fn arithmetic(op: BinOp, left: &Value, right: &Value, config: &Config) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Array(_), _) | (_, Value::Array(_)) => Err(type_error(op.symbol(), left, right)),
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Boolean(_), _) | (_, Value::Boolean(_)) => {
            Err(type_error(op.symbol(), left, right))
        }
        _ => {
            let (a, b) = numeric_pair(op, left, right)?;
            match op {
                BinOp::Multiply => Ok(Value::Numeric(config.round(checked(a.checked_mul(b), op)?))),
                BinOp::Divide => {
                    if b.is_zero() {
                        return Err(EvalError::DivisionByZero);
                    }
                    Ok(Value::Numeric(config.round(checked(a.checked_div(b), op)?)))
                }
                _ => power(a, b, config),
            }
        }
    }
}

/// Integral exponents are computed exactly; anything else goes through
/// `f64::powf`, and a non-finite result is `Null`.
fn power(base: Decimal, exponent: Decimal, config: &Config) -> Result<Value, EvalError> {
    if exponent.fract().is_zero()
        && let Some(n) = exponent.to_i64()
    {
        let result = if n >= 0 {
            base.checked_powi(n)
        } else {
            if base.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            n.checked_neg()
                .and_then(|m| base.checked_powi(m))
                .and_then(|d| Decimal::ONE.checked_div(d))
        };
        return Ok(Value::Numeric(config.round(checked(result, BinOp::Power)?)));
    }

    let (Some(b), Some(e)) = (base.to_f64(), exponent.to_f64()) else {
        return Ok(Value::Null);
    };
    let result = b.powf(e);
    if !result.is_finite() {
        return Ok(Value::Null);
    }
    Ok(Decimal::from_f64(result)
        .map(|d| Value::Numeric(config.round(d)))
        .unwrap_or(Value::Null))
}

fn bit_operand(value: &Value) -> Option<i64> {
    match value {
        Value::Boolean(b) => Some(i64::from(*b)),
        Value::Numeric(_) | Value::String(_) => value.as_i64(),
        _ => None,
    }
}

/// `&` and `|` on values truncated to 64-bit integers.
fn bitwise(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    let (Some(a), Some(b)) = (bit_operand(left), bit_operand(right)) else {
        return Err(type_error(op.symbol(), left, right));
    };
    let result = match op {
        BinOp::BitAnd => a & b,
        _ => a | b,
    };
    Ok(Value::from(result))
}

fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Ordering of two scalars, or `None` when their kinds cannot be ordered.
///
/// A string compared with a number is compared numerically when it parses,
/// otherwise textually against the number's rendering.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Numeric(a), Value::Numeric(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        (Value::String(s), Value::Numeric(n)) => Some(match parse_decimal(s) {
            Some(parsed) => parsed.cmp(n),
            None => s.as_str().cmp(right.to_string().as_str()),
        }),
        (Value::Numeric(_), Value::String(_)) => compare(right, left).map(Ordering::reverse),
        (Value::Boolean(b), Value::String(s)) => parse_bool(s).map(|parsed| b.cmp(&parsed)),
        (Value::String(_), Value::Boolean(_)) => compare(right, left).map(Ordering::reverse),
        _ => None,
    }
}

/// Equality used for array structure and element removal.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Array(_), _) | (_, Value::Array(_)) => false,
        _ => compare(left, right) == Some(Ordering::Equal),
    }
}

/// Evaluates a comparison operator, broadcasting over arrays.
pub fn compare_with(op: BinOp, left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Array(_), Value::Array(_)) => match op {
            BinOp::Equal => values_equal(left, right),
            BinOp::NotEqual => !values_equal(left, right),
            _ => false,
        },
        (Value::Array(items), scalar) => items.iter().any(|item| compare_with(op, item, scalar)),
        (scalar, Value::Array(items)) => items.iter().any(|item| compare_with(op, scalar, item)),
        _ => match compare(left, right) {
            Some(ordering) => match op {
                BinOp::Equal => ordering == Ordering::Equal,
                BinOp::NotEqual => ordering != Ordering::Equal,
                BinOp::LessThan => ordering == Ordering::Less,
                BinOp::GreaterThan => ordering == Ordering::Greater,
                BinOp::LessEqual => ordering != Ordering::Greater,
                BinOp::GreaterEqual => ordering != Ordering::Less,
                _ => false,
            },
            None => op == BinOp::NotEqual,
        },
    }
}
