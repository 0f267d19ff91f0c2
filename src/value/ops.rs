//! Operator application over values.
//!
//! Binary and unary operators are identified by small enums so an
//! [`Operation`](crate::pipeline::Operation) can carry them as data and
//! replay them on every re-evaluation. No operand validation happens ahead
//! of time; mismatches surface here, at application.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::value::Value;

// =============================================================================
// Operator enums
// =============================================================================

/// Binary operators a pipeline step can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl BinOp {
    /// Operator spelling used in error messages and tracing.
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        }
    }
}

/// Unary operators a pipeline step can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    Invert,
    Abs,
    Round,
}

impl UnOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "not",
            UnOp::Invert => "~",
            UnOp::Abs => "abs",
            UnOp::Round => "round",
        }
    }
}

// =============================================================================
// Binary application
// =============================================================================

/// Apply a binary operator.
///
/// Arithmetic broadcasts elementwise when one side is a list (the moral
/// equivalent of the array ufunc path); strings support `+` (concat) and
/// `*` (repeat); comparisons work across the numeric tower and on strings.
pub fn binary(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    use BinOp::*;

    // Equality never type-errors.
    match op {
        Eq => return Ok(Value::Bool(loose_eq(lhs, rhs))),
        Ne => return Ok(Value::Bool(!loose_eq(lhs, rhs))),
        _ => {}
    }

    // Elementwise broadcast for arithmetic with one list side.
    if matches!(op, Add | Sub | Mul | Div | FloorDiv | Mod | Pow) {
        match (lhs, rhs) {
            (Value::List(a), Value::List(b)) if a.len() == b.len() => {
                let items = a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| binary(op, x, y))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(Value::List(items));
            }
            (Value::List(a), b) if b.as_f64().is_some() => {
                let items = a
                    .iter()
                    .map(|x| binary(op, x, b))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(Value::List(items));
            }
            (a, Value::List(b)) if a.as_f64().is_some() => {
                let items = b
                    .iter()
                    .map(|y| binary(op, a, y))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(Value::List(items));
            }
            _ => {}
        }
    }

    match op {
        Add => add(lhs, rhs),
        Sub => numeric(op, lhs, rhs, |a, b| a.checked_sub(b), |a, b| a - b),
        Mul => mul(lhs, rhs),
        Div => div(lhs, rhs),
        FloorDiv => floor_div(lhs, rhs),
        Mod => modulo(lhs, rhs),
        Pow => pow(lhs, rhs),
        Lt | Le | Gt | Ge => {
            let ord = compare(lhs, rhs).ok_or_else(|| mismatch(op, lhs, rhs))?;
            Ok(Value::Bool(match op {
                Lt => ord == Ordering::Less,
                Le => ord != Ordering::Greater,
                Gt => ord == Ordering::Greater,
                Ge => ord != Ordering::Less,
                _ => unreachable!(),
            }))
        }
        And | Or | Xor => bitwise(op, lhs, rhs),
        Shl | Shr => shift(op, lhs, rhs),
        Eq | Ne => unreachable!("handled above"),
    }
}

/// Equality across the numeric tower; other kinds use structural equality.
fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => lhs == rhs,
    }
}

/// Three-way comparison where one exists: numeric tower, strings, bools,
/// and lists (lexicographic). Used by comparison operators and sorting.
pub fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::List(a), Value::List(b)) => {
            for (x, y) in a.iter().zip(b) {
                match compare(x, y)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(a.len().cmp(&b.len()))
        }
        _ => {
            let a = lhs.as_f64()?;
            let b = rhs.as_f64()?;
            a.partial_cmp(&b)
        }
    }
}

fn mismatch(op: BinOp, lhs: &Value, rhs: &Value) -> Error {
    Error::TypeMismatch {
        op: op.as_str(),
        lhs: lhs.kind(),
        rhs: rhs.kind(),
    }
}

/// Shared int/float arithmetic with int overflow falling back to float.
fn numeric(
    op: BinOp,
    lhs: &Value,
    rhs: &Value,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => match int_op(*a, *b) {
            Some(v) => Ok(Value::Int(v)),
            None => Ok(Value::Float(float_op(*a as f64, *b as f64))),
        },
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
            _ => Err(mismatch(op, lhs, rhs)),
        },
    }
}

fn add(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.clone();
            items.extend(b.iter().cloned());
            Ok(Value::List(items))
        }
        _ => numeric(BinOp::Add, lhs, rhs, |a, b| a.checked_add(b), |a, b| a + b),
    }
}

fn mul(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            Ok(Value::Str(s.repeat((*n).max(0) as usize)))
        }
        _ => numeric(BinOp::Mul, lhs, rhs, |a, b| a.checked_mul(b), |a, b| a * b),
    }
}

fn div(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(_), Some(b)) if b == 0.0 => Err(Error::DivisionByZero),
        // True division always yields a float, even for int operands.
        (Some(a), Some(b)) => Ok(Value::Float(a / b)),
        _ => Err(mismatch(BinOp::Div, lhs, rhs)),
    }
}

fn floor_div(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Int(_), Value::Int(0)) => Err(Error::DivisionByZero),
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.div_euclid(*b))),
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(_), Some(b)) if b == 0.0 => Err(Error::DivisionByZero),
            (Some(a), Some(b)) => Ok(Value::Float((a / b).floor())),
            _ => Err(mismatch(BinOp::FloorDiv, lhs, rhs)),
        },
    }
}

fn modulo(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Int(_), Value::Int(0)) => Err(Error::DivisionByZero),
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.rem_euclid(*b))),
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(_), Some(b)) if b == 0.0 => Err(Error::DivisionByZero),
            (Some(a), Some(b)) => Ok(Value::Float(a.rem_euclid(b))),
            _ => Err(mismatch(BinOp::Mod, lhs, rhs)),
        },
    }
}

fn pow(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) if *b >= 0 => {
            match u32::try_from(*b).ok().and_then(|e| a.checked_pow(e)) {
                Some(v) => Ok(Value::Int(v)),
                None => Ok(Value::Float((*a as f64).powf(*b as f64))),
            }
        }
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(a.powf(b))),
            _ => Err(mismatch(BinOp::Pow, lhs, rhs)),
        },
    }
}

fn bitwise(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(match op {
            BinOp::And => a & b,
            BinOp::Or => a | b,
            BinOp::Xor => a ^ b,
            _ => unreachable!(),
        })),
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(match op {
            BinOp::And => *a && *b,
            BinOp::Or => *a || *b,
            BinOp::Xor => a != b,
            _ => unreachable!(),
        })),
        _ => Err(mismatch(op, lhs, rhs)),
    }
}

fn shift(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) if *b >= 0 => {
            let shift = (*b).min(63) as u32;
            Ok(Value::Int(match op {
                BinOp::Shl => a.wrapping_shl(shift),
                BinOp::Shr => a.wrapping_shr(shift),
                _ => unreachable!(),
            }))
        }
        _ => Err(mismatch(op, lhs, rhs)),
    }
}

// =============================================================================
// Unary application
// =============================================================================

/// Apply a unary operator.
pub fn unary(op: UnOp, value: &Value) -> Result<Value> {
    let fail = || Error::UnaryMismatch {
        op: op.as_str(),
        kind: value.kind(),
    };
    match op {
        UnOp::Neg => match value {
            // i64::MIN has no integer negation; fall back to float like
            // the binary arithmetic paths do on overflow.
            Value::Int(i) => Ok(match i.checked_neg() {
                Some(v) => Value::Int(v),
                None => Value::Float(-(*i as f64)),
            }),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|v| unary(UnOp::Neg, v))
                    .collect::<Result<Vec<_>>>()?,
            )),
            _ => Err(fail()),
        },
        UnOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnOp::Invert => match value {
            Value::Int(i) => Ok(Value::Int(!i)),
            _ => Err(fail()),
        },
        UnOp::Abs => match value {
            Value::Int(i) => Ok(match i.checked_abs() {
                Some(v) => Value::Int(v),
                None => Value::Float((*i as f64).abs()),
            }),
            Value::Float(f) => Ok(Value::Float(f.abs())),
            _ => Err(fail()),
        },
        UnOp::Round => match value {
            Value::Int(i) => Ok(Value::Int(*i)),
            Value::Float(f) => Ok(Value::Int(f.round() as i64)),
            _ => Err(fail()),
        },
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_promotion() {
        assert_eq!(
            binary(BinOp::Add, &Value::Int(1), &Value::Float(2.5)).unwrap(),
            Value::Float(3.5)
        );
        assert_eq!(
            binary(BinOp::Mul, &Value::Int(3), &Value::Int(4)).unwrap(),
            Value::Int(12)
        );
    }

    #[test]
    fn test_true_division_yields_float() {
        assert_eq!(
            binary(BinOp::Div, &Value::Int(7), &Value::Int(2)).unwrap(),
            Value::Float(3.5)
        );
        assert_eq!(
            binary(BinOp::FloorDiv, &Value::Int(7), &Value::Int(2)).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            binary(BinOp::Div, &Value::Int(1), &Value::Int(0)),
            Err(Error::DivisionByZero)
        );
        assert_eq!(
            binary(BinOp::Mod, &Value::Int(1), &Value::Int(0)),
            Err(Error::DivisionByZero)
        );
    }

    #[test]
    fn test_string_ops() {
        assert_eq!(
            binary(BinOp::Add, &Value::Str("ab".into()), &Value::Str("cd".into())).unwrap(),
            Value::Str("abcd".into())
        );
        assert_eq!(
            binary(BinOp::Mul, &Value::Str("ab".into()), &Value::Int(3)).unwrap(),
            Value::Str("ababab".into())
        );
    }

    #[test]
    fn test_list_broadcast() {
        let list = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(
            binary(BinOp::Mul, &list, &Value::Int(2)).unwrap(),
            Value::List(vec![Value::Int(2), Value::Int(4), Value::Int(6)])
        );
        assert_eq!(
            binary(BinOp::Add, &Value::Int(10), &list).unwrap(),
            Value::List(vec![Value::Int(11), Value::Int(12), Value::Int(13)])
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            binary(BinOp::Lt, &Value::Int(1), &Value::Float(1.5)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            binary(BinOp::Eq, &Value::Int(2), &Value::Float(2.0)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            binary(BinOp::Ne, &Value::Str("a".into()), &Value::Int(1)).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_type_mismatch_propagates() {
        assert!(matches!(
            binary(BinOp::Sub, &Value::Str("a".into()), &Value::Int(1)),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_neg_and_abs_of_min_int_promote_to_float() {
        assert_eq!(
            unary(UnOp::Neg, &Value::Int(i64::MIN)).unwrap(),
            Value::Float(-(i64::MIN as f64))
        );
        assert_eq!(
            unary(UnOp::Abs, &Value::Int(i64::MIN)).unwrap(),
            Value::Float((i64::MIN as f64).abs())
        );
        // In-range values stay integers.
        assert_eq!(
            unary(UnOp::Abs, &Value::Int(i64::MIN + 1)).unwrap(),
            Value::Int(i64::MAX)
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary(UnOp::Neg, &Value::Int(5)).unwrap(), Value::Int(-5));
        assert_eq!(
            unary(UnOp::Abs, &Value::Float(-2.5)).unwrap(),
            Value::Float(2.5)
        );
        assert_eq!(
            unary(UnOp::Round, &Value::Float(2.6)).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            unary(UnOp::Not, &Value::Str(String::new())).unwrap(),
            Value::Bool(true)
        );
        assert!(unary(UnOp::Invert, &Value::Float(1.0)).is_err());
    }
}
