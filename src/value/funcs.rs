//! Named free functions over values.
//!
//! An operation whose callee is a free function receives the current
//! pipeline value as its first positional argument (or second, on the
//! reverse path). The builtins here mirror the handful of global functions
//! the expression syntax relies on: `len`, `abs`, `round`, `sum`, `min`,
//! `max`, `sorted`, `reversed`, `divmod`.

use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::value::{Value, ops};

/// A named function over values, recordable in an operation.
///
/// The name exists for diagnostics only; identity plays no role in
/// evaluation or dependency tracking.
#[derive(Clone)]
pub struct FreeFn {
    name: String,
    func: Rc<dyn Fn(&[Value], &IndexMap<String, Value>) -> Result<Value>>,
}

impl FreeFn {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&[Value], &IndexMap<String, Value>) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self, args: &[Value], kwargs: &IndexMap<String, Value>) -> Result<Value> {
        (self.func)(args, kwargs)
    }
}

impl fmt::Debug for FreeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FreeFn({})", self.name)
    }
}

// =============================================================================
// Builtins
// =============================================================================

fn exactly_one<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value> {
    match args {
        [v] => Ok(v),
        _ => Err(Error::Arity {
            name: name.to_string(),
            expected: 1,
            got: args.len(),
        }),
    }
}

fn numeric_items(name: &str, v: &Value) -> Result<Vec<Value>> {
    match v {
        Value::List(items) => Ok(items.clone()),
        other => Err(Error::TypeMismatch {
            op: match name {
                "sum" => "sum",
                "min" => "min",
                "max" => "max",
                _ => "builtin",
            },
            lhs: "list",
            rhs: other.kind(),
        }),
    }
}

/// `len(value)` for strings (chars), lists, maps, and tables (rows).
pub fn len() -> FreeFn {
    FreeFn::new("len", |args, _| {
        let v = exactly_one("len", args)?;
        let n = match v {
            Value::Str(s) => s.chars().count(),
            Value::List(items) => items.len(),
            Value::Map(m) => m.len(),
            Value::Table(t) => t.len(),
            other => {
                return Err(Error::UnaryMismatch {
                    op: "len",
                    kind: other.kind(),
                });
            }
        };
        Ok(Value::Int(n as i64))
    })
}

/// `abs(value)`.
pub fn abs() -> FreeFn {
    FreeFn::new("abs", |args, _| {
        ops::unary(ops::UnOp::Abs, exactly_one("abs", args)?)
    })
}

/// `round(value)` or `round(value, ndigits)`.
pub fn round() -> FreeFn {
    FreeFn::new("round", |args, _| match args {
        [v] => ops::unary(ops::UnOp::Round, v),
        [v, Value::Int(digits)] => match v.as_f64() {
            Some(f) => {
                let scale = 10f64.powi(*digits as i32);
                Ok(Value::Float((f * scale).round() / scale))
            }
            None => Err(Error::UnaryMismatch {
                op: "round",
                kind: v.kind(),
            }),
        },
        _ => Err(Error::Arity {
            name: "round".into(),
            expected: 1,
            got: args.len(),
        }),
    })
}

/// `sum(list)`.
pub fn sum() -> FreeFn {
    FreeFn::new("sum", |args, _| {
        let items = numeric_items("sum", exactly_one("sum", args)?)?;
        let mut acc = Value::Int(0);
        for item in &items {
            acc = ops::binary(ops::BinOp::Add, &acc, item)?;
        }
        Ok(acc)
    })
}

fn extreme(name: &'static str, want_greater: bool) -> FreeFn {
    FreeFn::new(name, move |args, _| {
        let items = numeric_items(name, exactly_one(name, args)?)?;
        let mut iter = items.into_iter();
        let Some(mut best) = iter.next() else {
            return Err(Error::IndexOutOfRange { index: 0, len: 0 });
        };
        for item in iter {
            let is_greater = ops::compare(&item, &best)
                .ok_or(Error::TypeMismatch {
                    op: name,
                    lhs: "comparable",
                    rhs: "mixed",
                })?
                .is_gt();
            if is_greater == want_greater {
                best = item;
            }
        }
        Ok(best)
    })
}

/// `min(list)`.
pub fn min() -> FreeFn {
    extreme("min", false)
}

/// `max(list)`.
pub fn max() -> FreeFn {
    extreme("max", true)
}

/// `sorted(list)`; incomparable elements keep their relative order.
pub fn sorted() -> FreeFn {
    FreeFn::new("sorted", |args, _| {
        let mut items = numeric_items("sorted", exactly_one("sorted", args)?)?;
        items.sort_by(|a, b| ops::compare(a, b).unwrap_or(std::cmp::Ordering::Equal));
        Ok(Value::List(items))
    })
}

/// `reversed(list | str)`.
pub fn reversed() -> FreeFn {
    FreeFn::new("reversed", |args, _| {
        match exactly_one("reversed", args)? {
            Value::List(items) => Ok(Value::List(items.iter().rev().cloned().collect())),
            Value::Str(s) => Ok(Value::Str(s.chars().rev().collect())),
            other => Err(Error::UnaryMismatch {
                op: "reversed",
                kind: other.kind(),
            }),
        }
    })
}

/// `divmod(a, b)` returning `[quotient, remainder]`.
pub fn divmod() -> FreeFn {
    FreeFn::new("divmod", |args, _| match args {
        [a, b] => Ok(Value::List(vec![
            ops::binary(ops::BinOp::FloorDiv, a, b)?,
            ops::binary(ops::BinOp::Mod, a, b)?,
        ])),
        _ => Err(Error::Arity {
            name: "divmod".into(),
            expected: 2,
            got: args.len(),
        }),
    })
}

// =============================================================================
// Tests
// =============================================================================
