//! Param - concrete observable with synchronous watch dispatch.
//!
//! `Param` is the reference implementation of the [`Observable`] capability:
//! an ordered set of named value fields with per-registration name filters.
//! Setting a field to its current value is a no-op (no notification), and
//! `set_fields` batches several updates into one callback per watcher.

use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::observe::observable::{
    FieldRef, Observable, ObservableId, ObservableRc, WatchCallback, WatchToken,
    next_observable_id,
};
use crate::value::Value;

struct Watcher {
    token: WatchToken,
    names: Vec<String>,
    callback: WatchCallback,
}

struct ParamInner {
    id: ObservableId,
    fields: RefCell<IndexMap<String, Value>>,
    watchers: RefCell<Vec<Watcher>>,
    next_token: Cell<u64>,
}

/// An observable parameter set. Cheap to clone; clones share state and
/// identity.
#[derive(Clone)]
pub struct Param {
    inner: Rc<ParamInner>,
}

impl Param {
    /// Create a param with the given fields, in order.
    pub fn new<I, S, V>(fields: I) -> Param
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        Param {
            inner: Rc::new(ParamInner {
                id: next_observable_id(),
                fields: RefCell::new(
                    fields
                        .into_iter()
                        .map(|(name, value)| (name.into(), value.into()))
                        .collect(),
                ),
                watchers: RefCell::new(Vec::new()),
                next_token: Cell::new(1),
            }),
        }
    }

    /// A live reference to one of this param's fields.
    pub fn field_ref(&self, name: &str) -> Result<FieldRef> {
        if !self.inner.fields.borrow().contains_key(name) {
            return Err(Error::UnknownField(name.to_string()));
        }
        Ok(FieldRef::new(self.as_observable(), name))
    }

    /// This param as a shared observable handle. The handle shares identity
    /// and state with `self`.
    pub fn as_observable(&self) -> ObservableRc {
        Rc::new(self.clone())
    }

    /// Update several fields, then notify each watcher once with the full
    /// set of changed names it cares about.
    pub fn set_fields<I, S, V>(&self, updates: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let mut changed: Vec<String> = Vec::new();
        {
            let mut fields = self.inner.fields.borrow_mut();
            for (name, value) in updates {
                let name = name.into();
                let value = value.into();
                match fields.get_mut(&name) {
                    Some(slot) => {
                        if *slot != value {
                            *slot = value;
                            changed.push(name);
                        }
                    }
                    None => return Err(Error::UnknownField(name)),
                }
            }
        }
        if !changed.is_empty() {
            trace!(id = ?self.inner.id, fields = ?changed, "param batch update");
            self.notify(&changed);
        }
        Ok(())
    }

    /// Invoke every watcher whose name filter intersects `changed`.
    ///
    /// Callbacks are collected before any is invoked: a callback may
    /// re-enter this param (read fields, register watches).
    fn notify(&self, changed: &[String]) {
        let pending: Vec<(WatchCallback, Vec<String>)> = self
            .inner
            .watchers
            .borrow()
            .iter()
            .filter_map(|w| {
                let relevant: Vec<String> = changed
                    .iter()
                    .filter(|name| w.names.iter().any(|n| n == *name))
                    .cloned()
                    .collect();
                if relevant.is_empty() {
                    None
                } else {
                    Some((w.callback.clone(), relevant))
                }
            })
            .collect();
        for (callback, names) in pending {
            callback(&names);
        }
    }
}

impl Observable for Param {
    fn id(&self) -> ObservableId {
        self.inner.id
    }

    fn field_names(&self) -> Vec<String> {
        self.inner.fields.borrow().keys().cloned().collect()
    }

    fn get_field(&self, name: &str) -> Result<Value> {
        self.inner
            .fields
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    fn set_field(&self, name: &str, value: Value) -> Result<()> {
        {
            let mut fields = self.inner.fields.borrow_mut();
            let Some(slot) = fields.get_mut(name) else {
                return Err(Error::UnknownField(name.to_string()));
            };
            if *slot == value {
                return Ok(());
            }
            *slot = value;
        }
        trace!(id = ?self.inner.id, field = name, "param field changed");
        self.notify(&[name.to_string()]);
        Ok(())
    }

    fn watch(&self, names: &[String], callback: WatchCallback) -> WatchToken {
        let token = WatchToken(self.inner.next_token.get());
        self.inner.next_token.set(token.0 + 1);
        self.inner.watchers.borrow_mut().push(Watcher {
            token,
            names: names.to_vec(),
            callback,
        });
        token
    }

    fn unwatch(&self, token: WatchToken) {
        self.inner.watchers.borrow_mut().retain(|w| w.token != token);
    }
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Param")
            .field("id", &self.inner.id)
            .field("fields", &self.inner.fields.borrow())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_get_set() {
        let p = Param::new([("x", Value::Int(1))]);
        assert_eq!(p.get_field("x").unwrap(), Value::Int(1));

        p.set_field("x", Value::Int(5)).unwrap();
        assert_eq!(p.get_field("x").unwrap(), Value::Int(5));

        assert_eq!(
            p.get_field("missing"),
            Err(Error::UnknownField("missing".into()))
        );
    }

    #[test]
    fn test_watch_notified_with_changed_names() {
        let p = Param::new([("x", Value::Int(1)), ("y", Value::Int(2))]);
        let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();

        p.watch(
            &["x".to_string()],
            Rc::new(move |names| seen_clone.borrow_mut().push(names.to_vec())),
        );

        p.set_field("x", Value::Int(9)).unwrap();
        p.set_field("y", Value::Int(9)).unwrap(); // not watched
        assert_eq!(*seen.borrow(), vec![vec!["x".to_string()]]);
    }

    #[test]
    fn test_unchanged_set_does_not_notify() {
        let p = Param::new([("x", Value::Int(1))]);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = count.clone();

        p.watch(
            &["x".to_string()],
            Rc::new(move |_| count_clone.set(count_clone.get() + 1)),
        );

        p.set_field("x", Value::Int(1)).unwrap();
        assert_eq!(count.get(), 0);
        p.set_field("x", Value::Int(2)).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_unwatch() {
        let p = Param::new([("x", Value::Int(1))]);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = count.clone();

        let token = p.watch(
            &["x".to_string()],
            Rc::new(move |_| count_clone.set(count_clone.get() + 1)),
        );
        p.set_field("x", Value::Int(2)).unwrap();
        p.unwatch(token);
        p.set_field("x", Value::Int(3)).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_batch_set_fields_single_callback() {
        let p = Param::new([("x", Value::Int(1)), ("y", Value::Int(2))]);
        let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();

        p.watch(
            &["x".to_string(), "y".to_string()],
            Rc::new(move |names| seen_clone.borrow_mut().push(names.to_vec())),
        );

        p.set_fields([("x", Value::Int(10)), ("y", Value::Int(20))])
            .unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![vec!["x".to_string(), "y".to_string()]]
        );
    }

    #[test]
    fn test_clones_share_state_and_identity() {
        let p = Param::new([("x", Value::Int(1))]);
        let q = p.clone();
        q.set_field("x", Value::Int(7)).unwrap();
        assert_eq!(p.get_field("x").unwrap(), Value::Int(7));
        assert_eq!(p.id(), q.id());
    }
}
