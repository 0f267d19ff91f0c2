//! Operation records.
//!
//! An operation is the immutable descriptor of one pipeline step: what to
//! apply (method, operator, index, attribute projection, or free function),
//! the operand arguments, and whether the call is reversed (right-hand
//! operator variants flip the operand ordering).

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::observe::observable::FieldRef;
use crate::pipeline::operand::Operand;
use crate::value::{self, FreeFn, Value, methods, ops};
use crate::value::ops::{BinOp, UnOp};

/// Operand argument list; almost always one or two entries.
pub type Args = SmallVec<[Operand; 2]>;
/// Keyword operand arguments.
pub type Kwargs = IndexMap<String, Operand>;

/// What an operation applies to the incoming value.
#[derive(Debug, Clone)]
pub enum Callee {
    /// Invoke a method by name on the current value.
    Method(String),
    /// Read an attribute of the current value.
    Attr(String),
    /// Binary operator; the current value is the left operand unless the
    /// operation is reversed.
    Binary(BinOp),
    /// Unary operator.
    Unary(UnOp),
    /// Index the current value with the first argument.
    Index,
    /// Free function; the current value is inserted as the first positional
    /// argument (or second, when reversed).
    Func(FreeFn),
}

impl Callee {
    /// Short description for tracing.
    pub fn describe(&self) -> String {
        match self {
            Callee::Method(name) => format!(".{name}()"),
            Callee::Attr(name) => format!(".{name}"),
            Callee::Binary(op) => op.as_str().to_string(),
            Callee::Unary(op) => op.as_str().to_string(),
            Callee::Index => "[]".to_string(),
            Callee::Func(f) => format!("{}()", f.name()),
        }
    }
}

/// One immutable pipeline step.
#[derive(Debug, Clone)]
pub struct Operation {
    pub callee: Callee,
    pub args: Args,
    pub kwargs: Kwargs,
    pub reverse: bool,
}

impl Operation {
    pub fn method(name: impl Into<String>, args: Args, kwargs: Kwargs) -> Operation {
        Operation {
            callee: Callee::Method(name.into()),
            args,
            kwargs,
            reverse: false,
        }
    }

    pub fn attr(name: impl Into<String>) -> Operation {
        Operation {
            callee: Callee::Attr(name.into()),
            args: Args::new(),
            kwargs: Kwargs::new(),
            reverse: false,
        }
    }

    pub fn binary(op: BinOp, other: Operand, reverse: bool) -> Operation {
        let mut args = Args::new();
        args.push(other);
        Operation {
            callee: Callee::Binary(op),
            args,
            kwargs: Kwargs::new(),
            reverse,
        }
    }

    pub fn unary(op: UnOp) -> Operation {
        Operation {
            callee: Callee::Unary(op),
            args: Args::new(),
            kwargs: Kwargs::new(),
            reverse: false,
        }
    }

    pub fn index(key: Operand) -> Operation {
        let mut args = Args::new();
        args.push(key);
        Operation {
            callee: Callee::Index,
            args,
            kwargs: Kwargs::new(),
            reverse: false,
        }
    }

    pub fn func(f: FreeFn, args: Args, kwargs: Kwargs, reverse: bool) -> Operation {
        Operation {
            callee: Callee::Func(f),
            args,
            kwargs,
            reverse,
        }
    }

    /// Accumulate the field references of every operand (args and kwargs).
    pub fn refs(&self, out: &mut Vec<FieldRef>) {
        for arg in &self.args {
            arg.refs(out);
        }
        for arg in self.kwargs.values() {
            arg.refs(out);
        }
    }

    /// Apply this operation to `base`, resolving every operand now.
    pub fn apply(&self, base: &Value) -> Result<Value> {
        let args = self
            .args
            .iter()
            .map(Operand::resolve)
            .collect::<Result<Vec<_>>>()?;
        let mut kwargs: IndexMap<String, Value> = IndexMap::new();
        for (k, v) in &self.kwargs {
            kwargs.insert(k.clone(), v.resolve()?);
        }

        match &self.callee {
            Callee::Method(name) => methods::call(base, name, &args, &kwargs),
            Callee::Attr(name) => value::attr(base, name),
            Callee::Binary(op) => {
                let other = args.first().ok_or_else(|| Error::Arity {
                    name: op.as_str().to_string(),
                    expected: 1,
                    got: 0,
                })?;
                if self.reverse {
                    ops::binary(*op, other, base)
                } else {
                    ops::binary(*op, base, other)
                }
            }
            Callee::Unary(op) => ops::unary(*op, base),
            Callee::Index => {
                let key = args.first().ok_or_else(|| Error::Arity {
                    name: "[]".to_string(),
                    expected: 1,
                    got: 0,
                })?;
                value::index(base, key)
            }
            Callee::Func(f) => {
                // Forward: f(base, args...). Reverse: f(args[0], base, args[1..]).
                let mut full = Vec::with_capacity(args.len() + 1);
                if self.reverse && !args.is_empty() {
                    full.push(args[0].clone());
                    full.push(base.clone());
                    full.extend(args[1..].iter().cloned());
                } else {
                    full.push(base.clone());
                    full.extend(args.iter().cloned());
                }
                f.invoke(&full, &kwargs)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::funcs;

    #[test]
    fn test_binary_forward_and_reverse() {
        let forward = Operation::binary(BinOp::Sub, Operand::from(2), false);
        assert_eq!(forward.apply(&Value::Int(5)).unwrap(), Value::Int(3));

        let reverse = Operation::binary(BinOp::Sub, Operand::from(2), true);
        assert_eq!(reverse.apply(&Value::Int(5)).unwrap(), Value::Int(-3));
    }

    #[test]
    fn test_method_with_kwargs() {
        let t = crate::value::Table::from_columns([(
            "a",
            (0..10).map(Value::Int).collect::<Vec<_>>(),
        )])
        .unwrap();
        let mut kwargs = Kwargs::new();
        kwargs.insert("n".into(), Operand::from(2));
        let op = Operation::method("head", Args::new(), kwargs);
        match op.apply(&Value::Table(t)).unwrap() {
            Value::Table(t) => assert_eq!(t.len(), 2),
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_free_function_reverse_inserts_base_second() {
        // divmod(7, base)
        let mut args = Args::new();
        args.push(Operand::from(7));
        let op = Operation::func(funcs::divmod(), args, Kwargs::new(), true);
        assert_eq!(
            op.apply(&Value::Int(2)).unwrap(),
            Value::List(vec![Value::Int(3), Value::Int(1)])
        );
    }

    #[test]
    fn test_index_operation() {
        let op = Operation::index(Operand::from(1));
        let list = Value::List(vec![Value::Int(10), Value::Int(20)]);
        assert_eq!(op.apply(&list).unwrap(), Value::Int(20));
    }

    #[test]
    fn test_attr_operation() {
        let mut m = IndexMap::new();
        m.insert("x".to_string(), Value::Int(1));
        let op = Operation::attr("x");
        assert_eq!(op.apply(&Value::Map(m)).unwrap(), Value::Int(1));
    }
}
