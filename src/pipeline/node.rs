//! Pipeline nodes.
//!
//! A [`Pipe`] is one link in a reactive expression chain. Each builder call
//! (`access`/`call`/`apply`/`index`/...) records an [`Operation`] on a new
//! node; nothing is applied until `eval()`. Nodes sharing a root share one
//! mutable [`RootCell`]; everything else is per-node state.
//!
//! # Invalidation
//!
//! Two independent watch registrations keep cached values honest:
//!
//! 1. The root cell (when source-backed) watches its source's dependency
//!    set and marks itself stale on change, so every branch re-reads one
//!    recomputed root instead of recomputing the source per branch.
//! 2. Every node watches its accumulated dependency set (own operation
//!    refs + all ancestors' + root source refs, identity-deduped and
//!    coalesced per owner) and sets its dirty flag on change.
//!
//! Version counters complement the dirty flag: a node records the
//! root/prev version its cache was computed against, so `set()` on a
//! shared root invalidates sibling branches without touching their flags.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::display::opts::DisplayOpts;
use crate::display::registry::Registry;
use crate::error::{Error, Result};
use crate::observe::observable::{
    FieldRef, ObservableRc, WatchToken, group_by_owner, push_unique,
};
use crate::pipeline::operand::Operand;
use crate::pipeline::operation::{Args, Kwargs, Operation};
use crate::value::{self, FreeFn, Value};
use crate::value::ops::{BinOp, UnOp};

// =============================================================================
// Root cell
// =============================================================================

struct RootInner {
    value: RefCell<Value>,
    version: Cell<u64>,
    /// Present when the root was wrapped from a live reference rather than
    /// a literal; `set()` is rejected in that case.
    source: Option<Operand>,
    stale: Cell<bool>,
    source_refs: Vec<FieldRef>,
    watches: RefCell<Vec<(ObservableRc, WatchToken)>>,
}

impl Drop for RootInner {
    fn drop(&mut self) {
        for (owner, token) in self.watches.borrow_mut().drain(..) {
            owner.unwatch(token);
        }
    }
}

/// The single shared mutable slot holding a pipeline's original input.
#[derive(Clone)]
pub(crate) struct RootCell {
    inner: Rc<RootInner>,
}

impl RootCell {
    fn constant(value: Value) -> RootCell {
        RootCell {
            inner: Rc::new(RootInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                source: None,
                stale: Cell::new(false),
                source_refs: Vec::new(),
                watches: RefCell::new(Vec::new()),
            }),
        }
    }

    fn from_source(source: Operand) -> RootCell {
        let mut refs = Vec::new();
        source.refs(&mut refs);
        let cell = RootCell {
            inner: Rc::new(RootInner {
                value: RefCell::new(Value::None),
                version: Cell::new(0),
                source: Some(source),
                stale: Cell::new(true),
                source_refs: refs,
                watches: RefCell::new(Vec::new()),
            }),
        };
        // Root refresh watch: one registration per owner; on change the
        // cell re-resolves its source lazily, once, for every branch.
        let weak = Rc::downgrade(&cell.inner);
        for (owner, names) in group_by_owner(&cell.inner.source_refs) {
            let weak = weak.clone();
            let token = owner.watch(
                &names,
                Rc::new(move |_changed: &[String]| {
                    if let Some(root) = weak.upgrade() {
                        root.stale.set(true);
                        root.version.set(root.version.get() + 1);
                        trace!("root source invalidated");
                    }
                }),
            );
            cell.inner.watches.borrow_mut().push((owner, token));
        }
        cell
    }

    fn refresh_if_stale(&self) -> Result<()> {
        if self.inner.stale.get() {
            if let Some(source) = &self.inner.source {
                let value = source.resolve()?;
                *self.inner.value.borrow_mut() = value;
                trace!("root source recomputed");
            }
            self.inner.stale.set(false);
        }
        Ok(())
    }

    fn value(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    fn version(&self) -> u64 {
        self.inner.version.get()
    }

    fn is_constant(&self) -> bool {
        self.inner.source.is_none()
    }

    fn set(&self, value: Value) -> Result<()> {
        if !self.is_constant() {
            return Err(Error::ReferenceRoot);
        }
        *self.inner.value.borrow_mut() = value;
        self.inner.version.set(self.inner.version.get() + 1);
        Ok(())
    }

    fn source_refs(&self) -> &[FieldRef] {
        &self.inner.source_refs
    }
}

// =============================================================================
// Node
// =============================================================================

struct NodeInner {
    root: RootCell,
    prev: Option<Pipe>,
    operation: Option<Operation>,
    /// Set when an attribute access has been recorded but not yet finalized
    /// into a call or operator step.
    pending: Option<String>,
    depth: u32,
    /// Accumulated dependency set: root source refs, every ancestor's
    /// operation refs, then this node's own operation refs.
    deps: Vec<FieldRef>,
    dirty: Cell<bool>,
    cached: RefCell<Option<Value>>,
    /// Version of the base (prev node or root cell) the cache was computed
    /// against.
    basis: Cell<u64>,
    /// Bumped on every recompute; descendants compare against it.
    version: Cell<u64>,
    watches: RefCell<Vec<(ObservableRc, WatchToken)>>,
    opts: DisplayOpts,
    registry: Rc<Registry>,
}

impl Drop for NodeInner {
    fn drop(&mut self) {
        for (owner, token) in self.watches.borrow_mut().drain(..) {
            owner.unwatch(token);
        }
    }
}

/// One link in a reactive expression chain. Cheap to clone; clones share
/// the same node.
#[derive(Clone)]
pub struct Pipe {
    inner: Rc<NodeInner>,
}

impl Pipe {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Wrap a value (or live reference) as the root of a new pipeline,
    /// with default display options and registry.
    pub fn wrap(value: impl Into<Operand>) -> Pipe {
        Self::wrap_with(value, DisplayOpts::default(), Rc::new(Registry::new()))
    }

    /// Wrap with explicit display options and registry.
    pub fn wrap_with(value: impl Into<Operand>, opts: DisplayOpts, registry: Rc<Registry>) -> Pipe {
        let root = match value.into() {
            Operand::Constant(v) => RootCell::constant(v),
            source => RootCell::from_source(source),
        };
        Self::construct(root, None, None, None, 0, opts, registry)
    }

    fn construct(
        root: RootCell,
        prev: Option<Pipe>,
        operation: Option<Operation>,
        pending: Option<String>,
        depth: u32,
        opts: DisplayOpts,
        registry: Rc<Registry>,
    ) -> Pipe {
        let mut deps: Vec<FieldRef> = Vec::new();
        for r in root.source_refs() {
            push_unique(&mut deps, r);
        }
        if let Some(p) = &prev {
            for r in &p.inner.deps {
                push_unique(&mut deps, r);
            }
        }
        if let Some(op) = &operation {
            op.refs(&mut deps);
        }

        let inner = Rc::new(NodeInner {
            root,
            prev,
            operation,
            pending,
            depth,
            deps,
            dirty: Cell::new(true),
            cached: RefCell::new(None),
            basis: Cell::new(0),
            version: Cell::new(0),
            watches: RefCell::new(Vec::new()),
            opts,
            registry,
        });

        // Dirty-propagation watch: one registration per distinct owner.
        let weak = Rc::downgrade(&inner);
        for (owner, names) in group_by_owner(&inner.deps) {
            let weak = weak.clone();
            let token = owner.watch(
                &names,
                Rc::new(move |changed: &[String]| {
                    if let Some(node) = weak.upgrade() {
                        node.dirty.set(true);
                        trace!(depth = node.depth, fields = ?changed, "node marked dirty");
                    }
                }),
            );
            inner.watches.borrow_mut().push((owner, token));
        }

        trace!(
            depth = inner.depth,
            deps = inner.deps.len(),
            step = ?inner.operation.as_ref().map(|op| op.callee.describe()),
            "pipeline node created"
        );
        Pipe { inner }
    }

    /// Extend the chain: the new node's `prev` is `self`.
    fn chain(&self, operation: Option<Operation>, pending: Option<String>) -> Pipe {
        Self::construct(
            self.inner.root.clone(),
            Some(self.clone()),
            operation,
            pending,
            self.inner.depth + 1,
            self.inner.opts.clone(),
            self.inner.registry.clone(),
        )
    }

    /// Finalize in place of `self`: the new node keeps `self`'s `prev`,
    /// replacing the pending attribute with a concrete operation.
    fn finalize(&self, operation: Operation) -> Pipe {
        Self::construct(
            self.inner.root.clone(),
            self.inner.prev.clone(),
            Some(operation),
            None,
            self.inner.depth + 1,
            self.inner.opts.clone(),
            self.inner.registry.clone(),
        )
    }

    /// Base node for an operator step: a pending attribute is first
    /// materialized as a projection so `x.access("a") + 1` means
    /// `x.a + 1`.
    fn operator_base(&self) -> Pipe {
        match &self.inner.pending {
            Some(name) => self.finalize(Operation::attr(name.clone())),
            None => self.clone(),
        }
    }

    // =========================================================================
    // Builder API (the explicit form of attribute/call/operator syntax)
    // =========================================================================

    /// Attribute step. Forces evaluation of the current value; fails when
    /// the name resolves to neither a data attribute nor a method.
    pub fn access(&self, name: &str) -> Result<Pipe> {
        let base = self.operator_base();
        let current = base.eval_raw()?;
        if !value::has_attr(&current, name) {
            return Err(Error::UnknownAttribute {
                name: name.to_string(),
                kind: current.kind(),
            });
        }
        Ok(base.chain(None, Some(name.to_string())))
    }

    /// Finalize a pending attribute into a method call.
    pub fn call<I>(&self, args: I) -> Result<Pipe>
    where
        I: IntoIterator<Item = Operand>,
    {
        self.call_kw(args, Kwargs::new())
    }

    /// Finalize a pending attribute into a method call with keyword
    /// arguments. Registered method handlers run first and may inject
    /// implicit keyword arguments before the operation is recorded.
    pub fn call_kw<I>(&self, args: I, kwargs: Kwargs) -> Result<Pipe>
    where
        I: IntoIterator<Item = Operand>,
    {
        let Some(name) = self.inner.pending.clone() else {
            return Err(Error::NotCallable);
        };
        let mut args: Args = args.into_iter().collect();
        let mut kwargs = kwargs;
        if let Some(handler) = self.inner.registry.method_handler(&name) {
            handler(&mut args, &mut kwargs);
        }
        Ok(self.finalize(Operation::method(name, args, kwargs)))
    }

    /// Attribute access plus call in one step.
    pub fn method<I>(&self, name: &str, args: I) -> Result<Pipe>
    where
        I: IntoIterator<Item = Operand>,
    {
        self.access(name)?.call(args)
    }

    /// Attribute access plus keyword call in one step.
    pub fn method_kw<I>(&self, name: &str, args: I, kwargs: Kwargs) -> Result<Pipe>
    where
        I: IntoIterator<Item = Operand>,
    {
        self.access(name)?.call_kw(args, kwargs)
    }

    /// Binary operator step with `self` on the left.
    pub fn apply(&self, op: BinOp, other: impl Into<Operand>) -> Pipe {
        self.operator_base()
            .chain(Some(Operation::binary(op, other.into(), false)), None)
    }

    /// Binary operator step with `self` on the right (reverse variant).
    pub fn rapply(&self, op: BinOp, other: impl Into<Operand>) -> Pipe {
        self.operator_base()
            .chain(Some(Operation::binary(op, other.into(), true)), None)
    }

    /// Unary operator step.
    pub fn unary(&self, op: UnOp) -> Pipe {
        self.operator_base().chain(Some(Operation::unary(op)), None)
    }

    /// Index step: `self[key]`. Use [`Operand::span`] for slices.
    pub fn index(&self, key: impl Into<Operand>) -> Pipe {
        self.operator_base()
            .chain(Some(Operation::index(key.into())), None)
    }

    /// Free-function step: `f(self, args...)`.
    pub fn pipe_fn<I>(&self, f: FreeFn, args: I) -> Pipe
    where
        I: IntoIterator<Item = Operand>,
    {
        self.operator_base().chain(
            Some(Operation::func(
                f,
                args.into_iter().collect(),
                Kwargs::new(),
                false,
            )),
            None,
        )
    }

    /// Reverse free-function step: `f(args[0], self, args[1..])`.
    pub fn pipe_fn_rev<I>(&self, f: FreeFn, args: I) -> Pipe
    where
        I: IntoIterator<Item = Operand>,
    {
        self.operator_base().chain(
            Some(Operation::func(
                f,
                args.into_iter().collect(),
                Kwargs::new(),
                true,
            )),
            None,
        )
    }

    /// Same node with different display options (the root-call
    /// reconfiguration of the original API).
    pub fn options(&self, opts: DisplayOpts) -> Pipe {
        Self::construct(
            self.inner.root.clone(),
            self.inner.prev.clone(),
            self.inner.operation.clone(),
            self.inner.pending.clone(),
            self.inner.depth,
            opts,
            self.inner.registry.clone(),
        )
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Evaluate this node, reusing the cache when nothing changed.
    ///
    /// A pending attribute is projected through the result for display,
    /// but the cache keeps the pre-projection value: the projection is not
    /// part of the chain's persisted state.
    pub fn eval(&self) -> Result<Value> {
        let base = self.eval_raw()?;
        match &self.inner.pending {
            Some(name) => value::attr(&base, name),
            None => Ok(base),
        }
    }

    /// Evaluate without the pending-attribute projection.
    pub(crate) fn eval_raw(&self) -> Result<Value> {
        let (base, basis) = match &self.inner.prev {
            Some(prev) => {
                let v = prev.eval_raw()?;
                (v, prev.inner.version.get())
            }
            None => {
                self.inner.root.refresh_if_stale()?;
                (self.inner.root.value(), self.inner.root.version())
            }
        };

        if !self.inner.dirty.get() && self.inner.basis.get() == basis {
            if let Some(cached) = self.inner.cached.borrow().as_ref() {
                return Ok(cached.clone());
            }
        }

        let result = match &self.inner.operation {
            Some(op) => {
                trace!(depth = self.inner.depth, step = %op.callee.describe(), "applying operation");
                op.apply(&base)?
            }
            None => base,
        };

        *self.inner.cached.borrow_mut() = Some(result.clone());
        self.inner.basis.set(basis);
        self.inner.dirty.set(false);
        self.inner.version.set(self.inner.version.get() + 1);
        Ok(result)
    }

    /// Override the shared root value.
    ///
    /// Marks this node and every ancestor dirty; sibling branches pick the
    /// new root up through the root cell's version. Fails when the root is
    /// a live reference rather than a literal.
    pub fn set(&self, value: impl Into<Value>) -> Result<()> {
        if !self.inner.root.is_constant() {
            return Err(Error::ReferenceRoot);
        }
        let mut current = Some(self.clone());
        while let Some(node) = current {
            node.inner.dirty.set(true);
            current = node.inner.prev.clone();
        }
        self.inner.root.set(value.into())
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Accumulated dependency set, root-first, identity-deduped.
    pub fn dependencies(&self) -> Vec<FieldRef> {
        self.inner.deps.clone()
    }

    pub(crate) fn deps(&self) -> &[FieldRef] {
        &self.inner.deps
    }

    pub(crate) fn registry(&self) -> &Rc<Registry> {
        &self.inner.registry
    }

    pub(crate) fn opts(&self) -> &DisplayOpts {
        &self.inner.opts
    }

    /// Display options this pipeline renders with.
    pub fn display_opts(&self) -> DisplayOpts {
        self.inner.opts.clone()
    }

    pub fn depth(&self) -> u32 {
        self.inner.depth
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    // =========================================================================
    // Terminal operations
    // =========================================================================

    /// Every widget referenced anywhere in the chain, first-seen order.
    pub fn widgets(&self) -> Vec<crate::observe::Widget> {
        crate::pipeline::widgets::collect_widgets(self)
    }

    /// Display adapter for this node.
    pub fn output(&self) -> crate::display::Output {
        crate::display::Output::new(self)
    }

    /// Compose widgets and rendered output into the configured layout.
    pub fn layout(&self) -> Result<crate::display::LayoutTree> {
        let unit = self.output().refresh()?;
        Ok(crate::display::layout::compose(
            self.widgets(),
            unit,
            self.inner.opts.location,
            self.inner.opts.center,
        ))
    }
}

impl std::fmt::Debug for Pipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipe")
            .field("depth", &self.inner.depth)
            .field("dirty", &self.inner.dirty.get())
            .field("pending", &self.inner.pending)
            .field(
                "step",
                &self.inner.operation.as_ref().map(|op| op.callee.describe()),
            )
            .field("deps", &self.inner.deps.len())
            .finish()
    }
}

// =============================================================================
// Operator sugar
// =============================================================================

macro_rules! forward_binop {
    ($trait:ident, $fn:ident, $op:expr) => {
        impl<T: Into<Operand>> std::ops::$trait<T> for &Pipe {
            type Output = Pipe;
            fn $fn(self, rhs: T) -> Pipe {
                self.apply($op, rhs)
            }
        }

        impl<T: Into<Operand>> std::ops::$trait<T> for Pipe {
            type Output = Pipe;
            fn $fn(self, rhs: T) -> Pipe {
                self.apply($op, rhs)
            }
        }
    };
}

macro_rules! reverse_binop {
    ($trait:ident, $fn:ident, $op:expr, $lhs:ty) => {
        impl std::ops::$trait<&Pipe> for $lhs {
            type Output = Pipe;
            fn $fn(self, rhs: &Pipe) -> Pipe {
                rhs.rapply($op, self)
            }
        }
    };
}

forward_binop!(Add, add, BinOp::Add);
forward_binop!(Sub, sub, BinOp::Sub);
forward_binop!(Mul, mul, BinOp::Mul);
forward_binop!(Div, div, BinOp::Div);
forward_binop!(Rem, rem, BinOp::Mod);

reverse_binop!(Add, add, BinOp::Add, i64);
reverse_binop!(Sub, sub, BinOp::Sub, i64);
reverse_binop!(Mul, mul, BinOp::Mul, i64);
reverse_binop!(Div, div, BinOp::Div, i64);
reverse_binop!(Rem, rem, BinOp::Mod, i64);
reverse_binop!(Add, add, BinOp::Add, f64);
reverse_binop!(Sub, sub, BinOp::Sub, f64);
reverse_binop!(Mul, mul, BinOp::Mul, f64);
reverse_binop!(Div, div, BinOp::Div, f64);
reverse_binop!(Rem, rem, BinOp::Mod, f64);

impl std::ops::Neg for &Pipe {
    type Output = Pipe;
    fn neg(self) -> Pipe {
        self.unary(UnOp::Neg)
    }
}

/// Wrap a value (or live reference) as a new pipeline root.
pub fn wrap(value: impl Into<Operand>) -> Pipe {
    Pipe::wrap(value)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{Observable, Param};
    use crate::value::funcs;
    use std::cell::Cell;

    #[test]
    fn test_constant_chain_eval() {
        let p = wrap(5);
        let result = (&p + 2) * 3;
        assert_eq!(result.eval().unwrap(), Value::Int(21));
    }

    #[test]
    fn test_eval_is_cached() {
        let calls = Rc::new(Cell::new(0u32));
        let calls_clone = calls.clone();
        let counting = FreeFn::new("counting", move |args, _| {
            calls_clone.set(calls_clone.get() + 1);
            Ok(args[0].clone())
        });

        let node = wrap(5).pipe_fn(counting, []);
        assert_eq!(node.eval().unwrap(), Value::Int(5));
        assert_eq!(node.eval().unwrap(), Value::Int(5));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_set_marks_and_recomputes() {
        let root = wrap(5);
        let node = (&root + 2) * 3;
        assert_eq!(node.eval().unwrap(), Value::Int(21));

        node.set(10).unwrap();
        assert_eq!(node.eval().unwrap(), Value::Int(36));
    }

    #[test]
    fn test_set_rejected_on_reference_root() {
        let p = Param::new([("x", Value::Int(1))]);
        let node = wrap(p.field_ref("x").unwrap());
        assert_eq!(node.set(99), Err(Error::ReferenceRoot));
    }

    #[test]
    fn test_field_change_marks_dirty() {
        let p = Param::new([("x", Value::Int(1))]);
        let node = wrap(p.field_ref("x").unwrap()).apply(BinOp::Add, 2);

        assert_eq!(node.eval().unwrap(), Value::Int(3));
        assert!(!node.is_dirty());

        p.set_field("x", Value::Int(5)).unwrap();
        assert!(node.is_dirty());
        assert_eq!(node.eval().unwrap(), Value::Int(7));
    }

    #[test]
    fn test_field_operand_marks_dirty() {
        let p = Param::new([("x", Value::Int(10))]);
        let node = wrap(1).apply(BinOp::Add, p.field_ref("x").unwrap());

        assert_eq!(node.eval().unwrap(), Value::Int(11));
        p.set_field("x", Value::Int(20)).unwrap();
        assert_eq!(node.eval().unwrap(), Value::Int(21));
    }

    #[test]
    fn test_shared_root_fan_out() {
        let root = wrap(Value::List(vec![Value::Int(1), Value::Int(2)]));
        let first = root.index(0);
        let last = root.index(-1);

        assert_eq!(first.eval().unwrap(), Value::Int(1));
        assert_eq!(last.eval().unwrap(), Value::Int(2));

        first
            .set(Value::List(vec![Value::Int(7), Value::Int(9)]))
            .unwrap();
        assert_eq!(first.eval().unwrap(), Value::Int(7));
        assert_eq!(last.eval().unwrap(), Value::Int(9));
    }

    #[test]
    fn test_reverse_operator() {
        let node = 2 - &wrap(5);
        assert_eq!(node.eval().unwrap(), Value::Int(-3));
    }

    #[test]
    fn test_reverse_remainder() {
        let node = 10 % &wrap(3);
        assert_eq!(node.eval().unwrap(), Value::Int(1));
        let node = 7.5 % &wrap(2.0);
        assert_eq!(node.eval().unwrap(), Value::Float(1.5));
    }

    #[test]
    fn test_access_unknown_attribute_errors() {
        let node = wrap(5);
        assert_eq!(
            node.access("head").err(),
            Some(Error::UnknownAttribute {
                name: "head".into(),
                kind: "int"
            })
        );
    }

    #[test]
    fn test_access_then_call() {
        let node = wrap("hello").method("upper", []).unwrap();
        assert_eq!(node.eval().unwrap(), Value::Str("HELLO".into()));
    }

    #[test]
    fn test_pending_attribute_projection() {
        let mut m = indexmap::IndexMap::new();
        m.insert("x".to_string(), Value::Int(42));
        let node = wrap(Value::Map(m)).access("x").unwrap();
        // Projection is display-only: eval projects, the chain keeps the map.
        assert_eq!(node.eval().unwrap(), Value::Int(42));
    }

    #[test]
    fn test_pending_attribute_combined_with_operator() {
        let mut m = indexmap::IndexMap::new();
        m.insert("x".to_string(), Value::Int(40));
        let node = wrap(Value::Map(m)).access("x").unwrap().apply(BinOp::Add, 2);
        assert_eq!(node.eval().unwrap(), Value::Int(42));
    }

    #[test]
    fn test_call_without_pending_errors() {
        let node = wrap(5);
        assert!(matches!(node.call([]), Err(Error::NotCallable)));
    }

    #[test]
    fn test_nested_pipe_operand() {
        let a = wrap(2);
        let b = wrap(10).apply(BinOp::Add, &a.apply(BinOp::Mul, 3));
        assert_eq!(b.eval().unwrap(), Value::Int(16));
    }

    #[test]
    fn test_dirty_locality_between_siblings() {
        let calls = Rc::new(Cell::new(0u32));
        let calls_clone = calls.clone();
        let counting = FreeFn::new("counting", move |args, _| {
            calls_clone.set(calls_clone.get() + 1);
            Ok(args[0].clone())
        });

        let root = wrap(5);
        let watched = root.pipe_fn(counting, []);
        let other = root.apply(BinOp::Add, 1);

        // Evaluating one branch must not force the sibling.
        assert_eq!(other.eval().unwrap(), Value::Int(6));
        assert_eq!(calls.get(), 0);
        assert_eq!(watched.eval().unwrap(), Value::Int(5));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_wrapped_bound_root_refreshes() {
        let p = Param::new([("x", Value::Int(3))]);
        let source = Operand::bound(
            "x_squared",
            vec![p.field_ref("x").unwrap().into()],
            |args| crate::value::ops::binary(BinOp::Mul, &args[0], &args[0]),
        );
        let node = wrap(source).apply(BinOp::Add, 1);

        assert_eq!(node.eval().unwrap(), Value::Int(10));
        p.set_field("x", Value::Int(5)).unwrap();
        assert_eq!(node.eval().unwrap(), Value::Int(26));
    }

    #[test]
    fn test_slice_step() {
        let node = wrap(Value::List((0..6).map(Value::Int).collect()))
            .index(Operand::span(None, None, Some(2)));
        assert_eq!(
            node.eval().unwrap(),
            Value::List(vec![Value::Int(0), Value::Int(2), Value::Int(4)])
        );
    }

    #[test]
    fn test_free_function_chain() {
        let node = wrap(Value::List(vec![
            Value::Int(3),
            Value::Int(1),
            Value::Int(2),
        ]))
        .pipe_fn(funcs::sorted(), [])
        .index(0);
        assert_eq!(node.eval().unwrap(), Value::Int(1));
    }
}
