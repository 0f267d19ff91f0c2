//! Operands and the dependency resolver.
//!
//! Every argument slot in a pipeline operation is an [`Operand`]: a
//! constant, a live field reference, a bound expression, a nested pipeline
//! node, or a container of operands. Operands are immutable after
//! construction. The resolver extracts (a) the operand's current value and
//! (b) the observable fields it transitively depends on.

use indexmap::IndexMap;
use std::rc::Rc;

use crate::error::Result;
use crate::observe::observable::{FieldRef, push_unique};
use crate::observe::widget::Widget;
use crate::pipeline::node::Pipe;
use crate::value::Value;

// =============================================================================
// Bound expressions
// =============================================================================

/// A named closure over resolved dependency values.
///
/// The closure is invoked with its dependencies resolved in declaration
/// order; its reference set is the union of the dependencies' own
/// transitively resolved references (a bound expression may depend on
/// other bound expressions).
#[derive(Clone)]
pub struct BoundExpr {
    name: String,
    deps: Vec<Operand>,
    func: Rc<dyn Fn(&[Value]) -> Result<Value>>,
}

impl BoundExpr {
    pub fn new(
        name: impl Into<String>,
        deps: Vec<Operand>,
        func: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            deps,
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for BoundExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BoundExpr({}, {} deps)", self.name, self.deps.len())
    }
}

// =============================================================================
// Operand
// =============================================================================

/// One argument/value slot in an operation.
#[derive(Debug, Clone)]
pub enum Operand {
    /// Fixed value.
    Constant(Value),
    /// Live reference to an observable field.
    Field(FieldRef),
    /// Named closure over other operands.
    Bound(BoundExpr),
    /// Nested pipeline node; resolving forces its evaluation.
    Pipe(Pipe),
    /// Sequence of operands, resolved elementwise.
    List(Vec<Operand>),
    /// Mapping of operands, resolved per entry.
    Map(IndexMap<String, Operand>),
    /// Slice whose bounds are themselves operands.
    Span {
        start: Option<Box<Operand>>,
        stop: Option<Box<Operand>>,
        step: Option<Box<Operand>>,
    },
}

impl Operand {
    /// Convenience constructor for bound expressions.
    pub fn bound(
        name: impl Into<String>,
        deps: Vec<Operand>,
        func: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> Operand {
        Operand::Bound(BoundExpr::new(name, deps, func))
    }

    /// Slice operand with integer bounds.
    pub fn span(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Operand {
        let lift = |v: Option<i64>| v.map(|i| Box::new(Operand::Constant(Value::Int(i))));
        Operand::Span {
            start: lift(start),
            stop: lift(stop),
            step: lift(step),
        }
    }

    /// Current value of this operand (live references are read now, nested
    /// pipelines are forced).
    pub fn resolve(&self) -> Result<Value> {
        match self {
            Operand::Constant(v) => Ok(v.clone()),
            Operand::Field(r) => r.get(),
            Operand::Bound(b) => {
                let args = b
                    .deps
                    .iter()
                    .map(Operand::resolve)
                    .collect::<Result<Vec<_>>>()?;
                (b.func)(&args)
            }
            Operand::Pipe(p) => p.eval(),
            Operand::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(Operand::resolve)
                    .collect::<Result<Vec<_>>>()?,
            )),
            Operand::Map(entries) => {
                let mut out = IndexMap::new();
                for (k, v) in entries {
                    out.insert(k.clone(), v.resolve()?);
                }
                Ok(Value::Map(out))
            }
            Operand::Span { start, stop, step } => {
                let bound = |operand: &Option<Box<Operand>>| -> Result<Option<i64>> {
                    match operand {
                        None => Ok(None),
                        Some(o) => match o.resolve()? {
                            Value::Int(i) => Ok(Some(i)),
                            Value::None => Ok(None),
                            other => Err(crate::error::Error::InvalidIndex {
                                kind: "slice bound",
                                key: other.kind(),
                            }),
                        },
                    }
                };
                Ok(Value::Slice {
                    start: bound(start)?,
                    stop: bound(stop)?,
                    step: bound(step)?,
                })
            }
        }
    }

    /// Accumulate the observable fields this operand transitively depends
    /// on. Deduplicated by reference identity, first-seen order preserved.
    pub fn refs(&self, out: &mut Vec<FieldRef>) {
        match self {
            Operand::Constant(_) => {}
            Operand::Field(r) => push_unique(out, r),
            Operand::Bound(b) => {
                for dep in &b.deps {
                    dep.refs(out);
                }
            }
            Operand::Pipe(p) => {
                for r in p.dependencies() {
                    push_unique(out, &r);
                }
            }
            Operand::List(items) => {
                for item in items {
                    item.refs(out);
                }
            }
            Operand::Map(entries) => {
                for value in entries.values() {
                    value.refs(out);
                }
            }
            Operand::Span { start, stop, step } => {
                for bound in [start, stop, step].into_iter().flatten() {
                    bound.refs(out);
                }
            }
        }
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Constant(v)
    }
}

impl From<bool> for Operand {
    fn from(v: bool) -> Self {
        Operand::Constant(v.into())
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Operand::Constant(v.into())
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Operand::Constant(v.into())
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Constant(v.into())
    }
}

impl From<&str> for Operand {
    fn from(v: &str) -> Self {
        Operand::Constant(v.into())
    }
}

impl From<String> for Operand {
    fn from(v: String) -> Self {
        Operand::Constant(v.into())
    }
}

impl From<Vec<Value>> for Operand {
    fn from(v: Vec<Value>) -> Self {
        Operand::Constant(Value::List(v))
    }
}

impl From<crate::value::Table> for Operand {
    fn from(v: crate::value::Table) -> Self {
        Operand::Constant(Value::Table(v))
    }
}

impl From<FieldRef> for Operand {
    fn from(r: FieldRef) -> Self {
        Operand::Field(r)
    }
}

// A raw widget operand means "this widget's value field".
impl From<Widget> for Operand {
    fn from(w: Widget) -> Self {
        Operand::Field(w.value_ref())
    }
}

impl From<&Widget> for Operand {
    fn from(w: &Widget) -> Self {
        Operand::Field(w.value_ref())
    }
}

impl From<Pipe> for Operand {
    fn from(p: Pipe) -> Self {
        Operand::Pipe(p)
    }
}

impl From<&Pipe> for Operand {
    fn from(p: &Pipe) -> Self {
        Operand::Pipe(p.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================
