//! Crate-wide error type.
//!
//! Every fallible operation in the pipeline returns `Result<T, Error>`.
//! Evaluation performs no ahead-of-time validation: type mismatches surface
//! at `eval()` time from the operator/method that hit them, attribute errors
//! surface at `access()` time, and layout locations are rejected when display
//! options are built (never at layout time).

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the reactive pipeline can produce.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Attribute lookup failed on the current evaluated value.
    #[error("no attribute `{name}` on {kind} value")]
    UnknownAttribute { name: String, kind: &'static str },

    /// Method dispatch failed on the current evaluated value.
    #[error("no method `{name}` on {kind} value")]
    UnknownMethod { name: String, kind: &'static str },

    /// An attribute that resolves to a method was read as data.
    #[error("`{name}` is a method of {kind} values and must be called")]
    PendingAttribute { name: String, kind: &'static str },

    /// Observable has no field with this name.
    #[error("no field `{0}` on observable")]
    UnknownField(String),

    /// Binary operator applied to incompatible operand types.
    #[error("unsupported operand types for `{op}`: {lhs} and {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    /// Unary operator applied to an incompatible operand type.
    #[error("unsupported operand type for `{op}`: {kind}")]
    UnaryMismatch { op: &'static str, kind: &'static str },

    /// Integer division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Sequence index out of range.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// Value cannot be indexed with the given key kind.
    #[error("cannot index {kind} value with {key} key")]
    InvalidIndex { kind: &'static str, key: &'static str },

    /// Map lookup failed.
    #[error("no key `{0}`")]
    MissingKey(String),

    /// Table column lookup failed.
    #[error("no column `{0}`")]
    MissingColumn(String),

    /// Table columns have unequal lengths.
    #[error("column `{name}` has {got} rows, expected {expected}")]
    RaggedColumn {
        name: String,
        expected: usize,
        got: usize,
    },

    /// Wrong number of arguments for a method or free function.
    ///
    /// Transform-output predicates that report this error are treated as
    /// "does not apply"; every other predicate error propagates.
    #[error("`{name}` expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    /// `set()` was called on a pipeline whose root is a live reference.
    #[error("cannot override a reference root")]
    ReferenceRoot,

    /// `call()` was invoked with no pending attribute to finalize.
    #[error("pipeline node is not callable without a pending attribute")]
    NotCallable,

    /// Layout location string did not match any known location.
    #[error("unknown layout location `{0}`")]
    UnknownLocation(String),
}
