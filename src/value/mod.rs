//! Dynamic value representation.
//!
//! Pipelines operate on values whose types are only known at evaluation
//! time, so the crate carries its own tagged union instead of generics.
//! Everything the operator/method/attribute machinery understands flows
//! through [`Value`].
//!
//! # Modules
//!
//! - [`ops`] - Binary/unary operator application
//! - [`methods`] - Method dispatch by name, per value kind
//! - [`funcs`] - Named free functions over values (`len`, `abs`, ...)

use indexmap::IndexMap;
use std::fmt;

use crate::error::{Error, Result};

pub mod funcs;
pub mod methods;
pub mod ops;

pub use funcs::FreeFn;
pub use ops::{BinOp, UnOp};

// =============================================================================
// Value
// =============================================================================

/// A dynamically typed value.
///
/// `Slice` mirrors a slice key (`start:stop:step`) so that range indexing is
/// an ordinary value flowing through an `Index` operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Table(Table),
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
}

impl Value {
    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Table(_) => "table",
            Value::Slice { .. } => "slice",
        }
    }

    /// Numeric view, promoting ints to floats.
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Truthiness, following the conventions of dynamic languages:
    /// empty collections, zero, and `None` are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Table(t) => t.len() > 0,
            Value::Slice { .. } => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Table(t) => write!(f, "{t}"),
            Value::Slice { start, stop, step } => {
                let part = |v: &Option<i64>| v.map(|i| i.to_string()).unwrap_or_default();
                match step {
                    Some(_) => write!(f, "{}:{}:{}", part(start), part(stop), part(step)),
                    None => write!(f, "{}:{}", part(start), part(stop)),
                }
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Table> for Value {
    fn from(v: Table) -> Self {
        Value::Table(v)
    }
}

// =============================================================================
// Table
// =============================================================================

/// Small columnar table: ordered, equal-length columns of values.
///
/// Enough of a tabular type to exercise the display path (row limiting,
/// column access, head/tail/sorting); it is not a dataframe library.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: IndexMap<String, Vec<Value>>,
}

impl Table {
    /// Build a table from `(name, column)` pairs.
    ///
    /// All columns must have the same length.
    pub fn from_columns<I, S>(columns: I) -> Result<Table>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let mut map: IndexMap<String, Vec<Value>> = IndexMap::new();
        let mut rows: Option<usize> = None;
        for (name, column) in columns {
            let name = name.into();
            match rows {
                None => rows = Some(column.len()),
                Some(n) if n != column.len() => {
                    return Err(Error::RaggedColumn {
                        name,
                        expected: n,
                        got: column.len(),
                    });
                }
                Some(_) => {}
            }
            map.insert(name, column);
        }
        Ok(Table { columns: map })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.values().next().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    /// A single column.
    pub fn column(&self, name: &str) -> Result<&Vec<Value>> {
        self.columns
            .get(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        self.row_range(0, n.min(self.len()))
    }

    /// Last `n` rows.
    pub fn tail(&self, n: usize) -> Table {
        let len = self.len();
        self.row_range(len.saturating_sub(n), len)
    }

    /// Rows in `[start, stop)`.
    pub fn row_range(&self, start: usize, stop: usize) -> Table {
        let stop = stop.min(self.len());
        let start = start.min(stop);
        Table {
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (k.clone(), v[start..stop].to_vec()))
                .collect(),
        }
    }

    /// A table with only the given columns, in the given order.
    pub fn select(&self, names: &[String]) -> Result<Table> {
        let mut columns = IndexMap::new();
        for name in names {
            columns.insert(name.clone(), self.column(name)?.clone());
        }
        Ok(Table { columns })
    }

    /// Rows sorted by the given column.
    ///
    /// Incomparable cells keep their relative order.
    pub fn sort_by_column(&self, by: &str, ascending: bool) -> Result<Table> {
        let key = self.column(by)?;
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            let cmp = ops::compare(&key[a], &key[b]).unwrap_or(std::cmp::Ordering::Equal);
            if ascending { cmp } else { cmp.reverse() }
        });
        Ok(Table {
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (k.clone(), order.iter().map(|&i| v[i].clone()).collect()))
                .collect(),
        })
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Table[{} rows x {} columns]",
            self.len(),
            self.columns.len()
        )
    }
}

// =============================================================================
// Attribute access
// =============================================================================

/// Whether `name` resolves on `value`, either as a data attribute or as a
/// callable method. This is the test that decides whether an `access()`
/// extends the pipeline or fails.
pub fn has_attr(value: &Value, name: &str) -> bool {
    data_attr(value, name).is_some() || methods::supports(value, name)
}

/// Read an attribute as data.
///
/// Method names are attributes too, but reading one without calling it is
/// an error ([`Error::PendingAttribute`]) rather than a bound-callable value.
pub fn attr(value: &Value, name: &str) -> Result<Value> {
    if let Some(v) = data_attr(value, name) {
        return Ok(v);
    }
    if methods::supports(value, name) {
        return Err(Error::PendingAttribute {
            name: name.to_string(),
            kind: value.kind(),
        });
    }
    Err(Error::UnknownAttribute {
        name: name.to_string(),
        kind: value.kind(),
    })
}

/// Data attributes: map keys, table columns, and a few tabular
/// conveniences (`columns`, `shape`).
fn data_attr(value: &Value, name: &str) -> Option<Value> {
    match value {
        Value::Map(m) => m.get(name).cloned(),
        Value::Table(t) => match name {
            "columns" => Some(Value::List(
                t.column_names().into_iter().map(Value::Str).collect(),
            )),
            "shape" => Some(Value::List(vec![
                Value::Int(t.len() as i64),
                Value::Int(t.column_names().len() as i64),
            ])),
            _ => t
                .column(name)
                .ok()
                .map(|col| Value::List(col.clone())),
        },
        _ => None,
    }
}

// =============================================================================
// Indexing
// =============================================================================

/// Apply an `Index` operation: `base[key]`.
pub fn index(base: &Value, key: &Value) -> Result<Value> {
    match (base, key) {
        (Value::List(items), Value::Int(i)) => {
            let idx = normalize_index(*i, items.len())?;
            Ok(items[idx].clone())
        }
        (Value::Str(s), Value::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            let idx = normalize_index(*i, chars.len())?;
            Ok(Value::Str(chars[idx].to_string()))
        }
        (Value::Map(m), Value::Str(k)) => m
            .get(k)
            .cloned()
            .ok_or_else(|| Error::MissingKey(k.clone())),
        (Value::Table(t), Value::Str(k)) => Ok(Value::List(t.column(k)?.clone())),
        (Value::List(items), Value::Slice { start, stop, step }) => {
            let picked = slice_indices(items.len(), *start, *stop, *step)?;
            Ok(Value::List(picked.into_iter().map(|i| items[i].clone()).collect()))
        }
        (Value::Str(s), Value::Slice { start, stop, step }) => {
            let chars: Vec<char> = s.chars().collect();
            let picked = slice_indices(chars.len(), *start, *stop, *step)?;
            Ok(Value::Str(picked.into_iter().map(|i| chars[i]).collect()))
        }
        (Value::Table(t), Value::Slice { start, stop, step }) => {
            if step.unwrap_or(1) != 1 {
                return Err(Error::InvalidIndex {
                    kind: "table",
                    key: "stepped slice",
                });
            }
            let len = t.len();
            let start = clamp_bound(start.unwrap_or(0), len);
            let stop = clamp_bound(stop.unwrap_or(len as i64), len);
            Ok(Value::Table(t.row_range(start, stop)))
        }
        _ => Err(Error::InvalidIndex {
            kind: base.kind(),
            key: key.kind(),
        }),
    }
}

/// Resolve a possibly negative index against `len`.
fn normalize_index(i: i64, len: usize) -> Result<usize> {
    let idx = if i < 0 { i + len as i64 } else { i };
    if idx < 0 || idx as usize >= len {
        return Err(Error::IndexOutOfRange { index: i, len });
    }
    Ok(idx as usize)
}

/// Clamp a possibly negative slice bound into `[0, len]`.
fn clamp_bound(i: i64, len: usize) -> usize {
    let idx = if i < 0 { i + len as i64 } else { i };
    idx.clamp(0, len as i64) as usize
}

/// Element indices selected by a slice over a sequence of length `len`.
fn slice_indices(
    len: usize,
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
) -> Result<Vec<usize>> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(Error::InvalidIndex {
            kind: "sequence",
            key: "zero-step slice",
        });
    }
    let mut out = Vec::new();
    if step > 0 {
        let start = clamp_bound(start.unwrap_or(0), len);
        let stop = clamp_bound(stop.unwrap_or(len as i64), len);
        let mut i = start;
        while i < stop {
            out.push(i);
            i += step as usize;
        }
    } else {
        let start = match start {
            Some(s) => clamp_bound(s, len).min(len.saturating_sub(1)),
            None => len.saturating_sub(1),
        };
        let stop = stop.map(|s| clamp_bound(s, len) as i64).unwrap_or(-1);
        let mut i = start as i64;
        while i > stop && i >= 0 {
            out.push(i as usize);
            i += step;
        }
    }
    Ok(out)
}

// =============================================================================
// Tests
// =============================================================================
