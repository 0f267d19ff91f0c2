//! Reactive expression pipeline.
//!
//! This module implements the expression core: chains of lazily evaluated
//! operations over a shared mutable root, with automatic dependency
//! discovery and watch-driven invalidation.
//!
//! # Pipeline Architecture
//!
//! ```text
//! wrap(root) → builder steps (access/call/apply/index/...) → eval()
//!                    │                                          │
//!                    └── dependency discovery ──► watches ──► dirty flags
//! ```
//!
//! ## Data Flow
//!
//! 1. **Construction** - Each builder call records an [`Operation`] on a new
//!    immutable node; the operands' field references are accumulated and
//!    watch registrations installed, one per distinct observable.
//! 2. **Evaluation** - `eval()` walks root-to-tip, reusing each node's cache
//!    unless its dirty flag or version basis says otherwise.
//! 3. **Invalidation** - Observable changes fire synchronously and only set
//!    flags; recomputation happens at the next `eval()`.
//!
//! ## Key Design Principles
//!
//! - **Immutable steps**: a node never changes after construction; extending
//!   a chain makes new nodes, so shared prefixes stay shared.
//! - **One shared root**: every node derived from the same `wrap()` sees
//!   root overrides through the same cell.
//! - **Lazy everywhere**: nothing recomputes until a consumer asks.

pub mod node;
pub mod operand;
pub mod operation;
pub mod widgets;

// Re-exports
pub use node::{Pipe, wrap};
pub use operand::{BoundExpr, Operand};
pub use operation::{Args, Callee, Kwargs, Operation};
pub use widgets::collect_widgets;
