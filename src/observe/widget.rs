//! Widget - an observable with a conventional `value` field.
//!
//! Widgets appear on both sides of a pipeline: as operands (a raw widget
//! operand means "this widget's `value` field") and as the output of the
//! widget extractor, which hands them to the layout composer as UI
//! controls. The constructors at the bottom stand in for the external
//! widget library the core collaborates with; each is just a [`Param`]
//! with a `value` field plus descriptive fields.

use crate::error::{Error, Result};
use crate::observe::observable::{FieldRef, ObservableId, ObservableRc};
use crate::observe::param::Param;
use crate::value::Value;

/// The field every widget exposes.
pub const VALUE_FIELD: &str = "value";

/// An observable verified to expose a `value` field.
#[derive(Clone)]
pub struct Widget {
    inner: ObservableRc,
}

impl Widget {
    /// Wrap an observable, verifying the `value` field convention.
    pub fn new(observable: ObservableRc) -> Result<Widget> {
        if !observable.has_field(VALUE_FIELD) {
            return Err(Error::UnknownField(VALUE_FIELD.to_string()));
        }
        Ok(Widget { inner: observable })
    }

    /// Internal constructor for observables known to carry `value`.
    pub(crate) fn from_verified(observable: ObservableRc) -> Widget {
        Widget { inner: observable }
    }

    pub fn id(&self) -> ObservableId {
        self.inner.id()
    }

    pub fn observable(&self) -> &ObservableRc {
        &self.inner
    }

    /// Current widget value.
    pub fn value(&self) -> Result<Value> {
        self.inner.get_field(VALUE_FIELD)
    }

    /// Set the widget value, notifying watchers.
    pub fn set_value(&self, value: impl Into<Value>) -> Result<()> {
        self.inner.set_field(VALUE_FIELD, value.into())
    }

    /// Reference to this widget's `value` field.
    pub fn value_ref(&self) -> FieldRef {
        FieldRef::new(self.inner.clone(), VALUE_FIELD)
    }

    /// A descriptive label, when the widget carries one.
    pub fn label(&self) -> Option<String> {
        match self.inner.get_field("name") {
            Ok(Value::Str(s)) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Widget {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.label() {
            Some(label) => write!(f, "Widget({:?}, {label})", self.id()),
            None => write!(f, "Widget({:?})", self.id()),
        }
    }
}

// =============================================================================
// Control constructors
// =============================================================================

fn control(fields: Vec<(&'static str, Value)>) -> Widget {
    Widget::from_verified(Param::new(fields).as_observable())
}

/// Integer slider control.
pub fn int_slider(name: &str, start: i64, end: i64, value: i64) -> Widget {
    control(vec![
        ("value", Value::Int(value)),
        ("name", Value::Str(name.to_string())),
        ("start", Value::Int(start)),
        ("end", Value::Int(end)),
    ])
}

/// Float slider control.
pub fn float_slider(name: &str, start: f64, end: f64, value: f64) -> Widget {
    control(vec![
        ("value", Value::Float(value)),
        ("name", Value::Str(name.to_string())),
        ("start", Value::Float(start)),
        ("end", Value::Float(end)),
    ])
}

/// Select control over a fixed option list.
pub fn select(name: &str, options: Vec<Value>, value: Value) -> Widget {
    control(vec![
        ("value", value),
        ("name", Value::Str(name.to_string())),
        ("options", Value::List(options)),
    ])
}

/// Checkbox control.
pub fn checkbox(name: &str, value: bool) -> Widget {
    control(vec![
        ("value", Value::Bool(value)),
        ("name", Value::Str(name.to_string())),
    ])
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_requires_value_field() {
        let no_value = Param::new([("x", Value::Int(1))]);
        assert!(Widget::new(no_value.as_observable()).is_err());

        let with_value = Param::new([("value", Value::Int(1))]);
        assert!(Widget::new(with_value.as_observable()).is_ok());
    }

    #[test]
    fn test_slider_round_trip() {
        let s = int_slider("count", 0, 10, 3);
        assert_eq!(s.value().unwrap(), Value::Int(3));
        s.set_value(7).unwrap();
        assert_eq!(s.value().unwrap(), Value::Int(7));
        assert_eq!(s.label().as_deref(), Some("count"));
    }

    #[test]
    fn test_widget_equality_is_identity() {
        let a = checkbox("a", true);
        let b = checkbox("a", true);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_value_ref_points_at_value() {
        let s = float_slider("alpha", 0.0, 1.0, 0.5);
        let r = s.value_ref();
        assert_eq!(r.get().unwrap(), Value::Float(0.5));
        r.set(Value::Float(0.9)).unwrap();
        assert_eq!(s.value().unwrap(), Value::Float(0.9));
    }
}
