//! Display registry.
//!
//! An explicit, shareable registry object replaces any global table of
//! display behaviors. It holds two kinds of entries:
//!
//! - **Transforms**: predicate plus conversion. The output adapter walks
//!   transforms in registration order; the first whose predicate answers
//!   `true` converts the value into a [`RenderUnit`]. A predicate that
//!   fails with an arity error is treated as "does not apply"; any other
//!   predicate error aborts the render.
//! - **Method handlers**: keyed by method name, run when a pipeline call
//!   step is recorded. A handler may rewrite the call's arguments, e.g.
//!   injecting implicit keyword arguments.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::display::opts::DisplayOpts;
use crate::display::output::RenderUnit;
use crate::error::{Error, Result};
use crate::pipeline::operand::Operand;
use crate::pipeline::operation::{Args, Kwargs};
use crate::value::Value;

/// Decides whether a transform applies to a value.
pub type Predicate = Rc<dyn Fn(&Value) -> Result<bool>>;

/// Converts an applicable value into its render form.
pub type Convert = Rc<dyn Fn(&Value, &DisplayOpts) -> Result<RenderUnit>>;

/// Rewrites a recorded call's arguments before the operation is stored.
pub type MethodHandler = Rc<dyn Fn(&mut Args, &mut Kwargs)>;

/// One display transform: when `predicate` answers `true`, `convert` runs.
#[derive(Clone)]
pub struct Transform {
    name: String,
    predicate: Predicate,
    convert: Convert,
}

impl Transform {
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&Value) -> Result<bool> + 'static,
        convert: impl Fn(&Value, &DisplayOpts) -> Result<RenderUnit> + 'static,
    ) -> Transform {
        Transform {
            name: name.into(),
            predicate: Rc::new(predicate),
            convert: Rc::new(convert),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Transform({})", self.name)
    }
}

/// Registry of display transforms and method handlers.
///
/// Build and populate one, then share it via `Rc`; pipelines constructed
/// with it consult it on every call step and every render.
pub struct Registry {
    transforms: Vec<Transform>,
    method_handlers: IndexMap<String, MethodHandler>,
}

impl Registry {
    /// Registry preloaded with the stock entries: the paged-table
    /// transform and the plot-axes method handler.
    pub fn new() -> Registry {
        let mut registry = Registry::empty();
        registry.register_transform(paged_table_transform());
        registry.register_method_handler("plot", |_args, kwargs| {
            if !kwargs.contains_key("axes") {
                kwargs.insert("axes".to_string(), Operand::Constant(default_axes()));
            }
        });
        registry
    }

    /// Registry with no entries at all.
    pub fn empty() -> Registry {
        Registry {
            transforms: Vec::new(),
            method_handlers: IndexMap::new(),
        }
    }

    pub fn register_transform(&mut self, transform: Transform) {
        self.transforms.push(transform);
    }

    pub fn register_method_handler(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&mut Args, &mut Kwargs) + 'static,
    ) {
        self.method_handlers.insert(name.into(), Rc::new(handler));
    }

    pub fn method_handler(&self, name: &str) -> Option<MethodHandler> {
        self.method_handlers.get(name).cloned()
    }

    /// Run the transform chain over `value`. Falls through to
    /// [`RenderUnit::Raw`] when no transform applies.
    pub fn render(&self, value: &Value, opts: &DisplayOpts) -> Result<RenderUnit> {
        for transform in &self.transforms {
            match (transform.predicate)(value) {
                Ok(true) => return (transform.convert)(value, opts),
                Ok(false) => continue,
                // Arity mismatch means the transform does not apply here.
                Err(Error::Arity { .. }) => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(RenderUnit::Raw(value.clone()))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field(
                "transforms",
                &self.transforms.iter().map(Transform::name).collect::<Vec<_>>(),
            )
            .field(
                "method_handlers",
                &self.method_handlers.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// The stock transform: tables render paged, capped at `max_rows`.
pub fn paged_table_transform() -> Transform {
    Transform::new(
        "paged_table",
        |value| Ok(matches!(value, Value::Table(_))),
        |value, opts| {
            let Value::Table(table) = value else {
                return Err(Error::TypeMismatch {
                    op: "paged_table",
                    lhs: value.kind(),
                    rhs: "table",
                });
            };
            let total_rows = table.len();
            let shown_rows = total_rows.min(opts.max_rows);
            Ok(RenderUnit::Paged {
                value: Value::Table(table.head(shown_rows)),
                shown_rows,
                total_rows,
            })
        },
    )
}

/// Default axes specification injected into plot calls that omit one.
pub fn default_axes() -> Value {
    let mut axes = IndexMap::new();
    axes.insert("x".to_string(), Value::Str("index".to_string()));
    axes.insert("y".to_string(), Value::Str("values".to_string()));
    Value::Map(axes)
}

// =============================================================================
// Tests
// =============================================================================
