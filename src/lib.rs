//! # reflow
//!
//! Reactive expression pipelines over observable values.
//!
//! Wrap a value (or a live reference to an observable field), describe a
//! chain of operations on it, and evaluate lazily: the chain discovers its
//! own dependencies, watches them, and recomputes only what a change
//! actually invalidated. Widgets referenced anywhere in a chain can be
//! extracted and composed with the rendered output into an abstract layout.
//!
//! ## Architecture
//!
//! ```text
//! wrap(value) → Pipe chain → eval()/output() → RenderUnit → LayoutTree
//!                   │
//!                   └── dependency discovery → watches → dirty flags
//! ```
//!
//! Construction is eager and immutable (each builder step makes a new
//! node), evaluation is lazy and cached, and invalidation is push-based:
//! observable changes synchronously flip dirty flags, nothing more.
//!
//! ## Example
//!
//! ```
//! use reflow::{Value, int_slider, wrap};
//!
//! let n = int_slider("n", 0, 10, 2);
//! let total = (&wrap(&n) * 100) + 5;
//! assert_eq!(total.eval().unwrap(), Value::Int(205));
//!
//! n.set_value(3).unwrap();
//! assert_eq!(total.eval().unwrap(), Value::Int(305));
//! ```
//!
//! ## Modules
//!
//! - [`value`] - Dynamic values, operators, methods, free functions
//! - [`observe`] - Observable capability, params, widgets
//! - [`pipeline`] - Nodes, operands, operations, widget extraction
//! - [`display`] - Options, registry, output adapter, layout composition

pub mod display;
pub mod error;
pub mod observe;
pub mod pipeline;
pub mod value;

// Re-export commonly used items
pub use error::{Error, Result};

pub use value::{BinOp, FreeFn, Table, UnOp, Value};

pub use observe::{
    FieldRef, Observable, ObservableId, ObservableRc, Param, WatchCallback, WatchToken, Widget,
    checkbox, float_slider, int_slider, select,
};

pub use pipeline::{BoundExpr, Operand, Operation, Pipe, collect_widgets, wrap};

pub use display::{DisplayOpts, LayoutTree, Location, Output, Registry, RenderUnit, Transform};
