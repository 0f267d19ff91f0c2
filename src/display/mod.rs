//! Display layer.
//!
//! Everything between a finished pipeline value and a front end that draws:
//! per-pipeline options, the transform/handler registry, the reactive
//! output adapter, and abstract layout composition. Nothing in here touches
//! a screen.
//!
//! # Modules
//!
//! - [`opts`] - Location and per-pipeline display options
//! - [`registry`] - Explicit registry of transforms and method handlers
//! - [`output`] - Reactive adapter producing [`RenderUnit`]s
//! - [`layout`] - Widgets + output pane into an abstract [`LayoutTree`]

pub mod layout;
pub mod opts;
pub mod output;
pub mod registry;

pub use layout::{LayoutTree, compose};
pub use opts::{DisplayOpts, Location};
pub use output::{Output, RenderUnit};
pub use registry::{Registry, Transform};
