//! Observable capability - named, watchable fields.
//!
//! A pipeline's live references point at fields of observables. Identity
//! matters here: dependency dedup and widget collection key on the
//! *instance* (via [`ObservableId`]) plus the field name, never on value
//! equality.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::Result;
use crate::value::Value;

// =============================================================================
// Identity
// =============================================================================

/// Process-unique identity of an observable instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservableId(u64);

thread_local! {
    /// Counter for generating observable identities.
    static NEXT_OBSERVABLE_ID: Cell<u64> = const { Cell::new(1) };
}

/// Allocate a fresh identity. Called by observable implementations at
/// construction time.
pub fn next_observable_id() -> ObservableId {
    NEXT_OBSERVABLE_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        ObservableId(id)
    })
}

/// Token identifying one watch registration, used to unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchToken(pub u64);

/// Watch callback; invoked synchronously with the names of the fields that
/// changed.
pub type WatchCallback = Rc<dyn Fn(&[String])>;

// =============================================================================
// Observable trait
// =============================================================================

/// Something with named observable fields.
///
/// Implementations are single-threaded (interior mutability, no locking)
/// and must invoke watch callbacks synchronously, after the field value has
/// been updated, before returning to the caller.
pub trait Observable {
    /// Stable per-instance identity.
    fn id(&self) -> ObservableId;

    /// Field names, in declaration order.
    fn field_names(&self) -> Vec<String>;

    /// Live read of a field.
    fn get_field(&self, name: &str) -> Result<Value>;

    /// Replace a field value, notifying watchers when it actually changed.
    fn set_field(&self, name: &str, value: Value) -> Result<()>;

    /// Register a callback for changes to any of `names`.
    fn watch(&self, names: &[String], callback: WatchCallback) -> WatchToken;

    /// Remove a previous registration. Unknown tokens are ignored.
    fn unwatch(&self, token: WatchToken);

    fn has_field(&self, name: &str) -> bool {
        self.field_names().iter().any(|n| n == name)
    }
}

/// Shared handle to an observable.
pub type ObservableRc = Rc<dyn Observable>;

// =============================================================================
// Field references
// =============================================================================

/// A live reference to one observable field: `(owner identity, name)`.
#[derive(Clone)]
pub struct FieldRef {
    owner: ObservableRc,
    name: String,
}

impl FieldRef {
    pub fn new(owner: ObservableRc, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }

    pub fn owner(&self) -> &ObservableRc {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Live read of the referenced field.
    pub fn get(&self) -> Result<Value> {
        self.owner.get_field(&self.name)
    }

    /// Write through to the referenced field.
    pub fn set(&self, value: Value) -> Result<()> {
        self.owner.set_field(&self.name, value)
    }
}

impl PartialEq for FieldRef {
    fn eq(&self, other: &Self) -> bool {
        self.owner.id() == other.owner.id() && self.name == other.name
    }
}

impl std::fmt::Debug for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FieldRef({:?}.{})", self.owner.id(), self.name)
    }
}

// =============================================================================
// Dedup / grouping helpers
// =============================================================================

/// Append `r` to `out` unless an identical reference (same owner identity,
/// same name) is already present. Preserves first-seen order.
pub(crate) fn push_unique(out: &mut Vec<FieldRef>, r: &FieldRef) {
    if !out.iter().any(|existing| existing == r) {
        out.push(r.clone());
    }
}

/// Group references per distinct owner so one change event produces one
/// callback covering all of that owner's relevant fields.
pub(crate) fn group_by_owner(refs: &[FieldRef]) -> Vec<(ObservableRc, Vec<String>)> {
    let mut groups: Vec<(ObservableRc, Vec<String>)> = Vec::new();
    for r in refs {
        match groups.iter_mut().find(|(o, _)| o.id() == r.owner().id()) {
            Some((_, names)) => {
                if !names.iter().any(|n| n == r.name()) {
                    names.push(r.name().to_string());
                }
            }
            None => groups.push((r.owner().clone(), vec![r.name().to_string()])),
        }
    }
    groups
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::Param;

    #[test]
    fn test_ids_are_unique() {
        let a = next_observable_id();
        let b = next_observable_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_field_ref_identity_equality() {
        let p = Param::new([("x", Value::Int(1)), ("y", Value::Int(2))]);
        let q = Param::new([("x", Value::Int(1))]);

        let px: FieldRef = p.field_ref("x").unwrap();
        let px2: FieldRef = p.field_ref("x").unwrap();
        let py: FieldRef = p.field_ref("y").unwrap();
        let qx: FieldRef = q.field_ref("x").unwrap();

        assert_eq!(px, px2);
        assert_ne!(px, py);
        // Same name and value on a different instance is a different ref.
        assert_ne!(px, qx);
    }

    #[test]
    fn test_push_unique_and_grouping() {
        let p = Param::new([("x", Value::Int(1)), ("y", Value::Int(2))]);
        let q = Param::new([("value", Value::Int(3))]);

        let mut refs = Vec::new();
        push_unique(&mut refs, &p.field_ref("x").unwrap());
        push_unique(&mut refs, &q.field_ref("value").unwrap());
        push_unique(&mut refs, &p.field_ref("x").unwrap());
        push_unique(&mut refs, &p.field_ref("y").unwrap());
        assert_eq!(refs.len(), 3);

        let groups = group_by_owner(&refs);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(groups[1].1, vec!["value".to_string()]);
    }
}
