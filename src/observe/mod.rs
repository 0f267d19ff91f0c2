//! Observable layer.
//!
//! The pipeline core never talks to concrete widget libraries; it consumes
//! the [`Observable`] capability (named fields, readable/settable, watchable
//! for changes). [`Param`] is the in-crate reference implementation used by
//! tests and demos, and [`Widget`] is the "observable with a `value` field"
//! convention the widget extractor collects.
//!
//! # Modules
//!
//! - [`observable`] - Capability trait, field references, watch tokens
//! - [`param`] - Concrete observable with synchronous dispatch
//! - [`widget`] - Widget wrapper and small control constructors

pub mod observable;
pub mod param;
pub mod widget;

pub use observable::{FieldRef, Observable, ObservableId, ObservableRc, WatchCallback, WatchToken};
pub use param::Param;
pub use widget::{Widget, checkbox, float_slider, int_slider, select};
