//! Output adapter.
//!
//! An [`Output`] tracks one pipeline node: it evaluates the node, runs the
//! registry's transform chain over the result, and pushes the rendered unit
//! to registered listeners whenever a dependency changes. The adapter is
//! the seam a rendering front end plugs into; the core never draws.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::error::Result;
use crate::observe::observable::{ObservableRc, WatchToken, group_by_owner};
use crate::pipeline::node::Pipe;
use crate::value::Value;

/// What a render front end receives: either the value as-is or a paged
/// view of it.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderUnit {
    /// Untransformed value.
    Raw(Value),
    /// Row-capped view of a larger value.
    Paged {
        value: Value,
        shown_rows: usize,
        total_rows: usize,
    },
}

impl RenderUnit {
    /// The value carried by this unit, whatever its form.
    pub fn value(&self) -> &Value {
        match self {
            RenderUnit::Raw(v) => v,
            RenderUnit::Paged { value, .. } => value,
        }
    }
}

type Listener = Rc<dyn Fn(&RenderUnit)>;

struct OutputInner {
    node: Pipe,
    listeners: RefCell<Vec<Listener>>,
    watches: RefCell<Vec<(ObservableRc, WatchToken)>>,
}

impl Drop for OutputInner {
    fn drop(&mut self) {
        for (owner, token) in self.watches.borrow_mut().drain(..) {
            owner.unwatch(token);
        }
    }
}

/// Reactive display adapter over one pipeline node.
#[derive(Clone)]
pub struct Output {
    inner: Rc<OutputInner>,
}

impl Output {
    /// Adapt `node`, watching its full dependency set.
    pub fn new(node: &Pipe) -> Output {
        let inner = Rc::new(OutputInner {
            node: node.clone(),
            listeners: RefCell::new(Vec::new()),
            watches: RefCell::new(Vec::new()),
        });

        let weak = Rc::downgrade(&inner);
        for (owner, names) in group_by_owner(node.deps()) {
            let weak: Weak<OutputInner> = weak.clone();
            let token = owner.watch(
                &names,
                Rc::new(move |_changed: &[String]| {
                    if let Some(inner) = weak.upgrade() {
                        notify(&inner);
                    }
                }),
            );
            inner.watches.borrow_mut().push((owner, token));
        }

        Output { inner }
    }

    /// The node this output tracks.
    pub fn node(&self) -> &Pipe {
        &self.inner.node
    }

    /// Evaluate now and run the transform chain.
    pub fn refresh(&self) -> Result<RenderUnit> {
        let value = self.inner.node.eval()?;
        let unit = self
            .inner
            .node
            .registry()
            .render(&value, self.inner.node.opts())?;
        trace!(?unit, "output refreshed");
        Ok(unit)
    }

    /// Register a listener invoked with the fresh render unit after every
    /// dependency change.
    pub fn on_change(&self, listener: impl Fn(&RenderUnit) + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }
}

/// Re-render and fan out to listeners. Evaluation errors are logged, not
/// raised: a watch callback has no caller to hand them to.
fn notify(inner: &Rc<OutputInner>) {
    let output = Output {
        inner: inner.clone(),
    };
    match output.refresh() {
        Ok(unit) => {
            let listeners: Vec<Listener> = inner.listeners.borrow().clone();
            for listener in listeners {
                listener(&unit);
            }
        }
        Err(err) => debug!(%err, "output refresh failed"),
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output")
            .field("node", &self.inner.node)
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::widget::int_slider;
    use crate::pipeline::node::wrap;
    use crate::value::Table;
    use crate::value::ops::BinOp;

    #[test]
    fn test_refresh_raw_value() {
        let node = wrap(5).apply(BinOp::Add, 1);
        let output = node.output();
        assert_eq!(output.refresh().unwrap(), RenderUnit::Raw(Value::Int(6)));
    }

    #[test]
    fn test_refresh_pages_tables() {
        let table = Table::from_columns([(
            "a",
            (0..50).map(Value::Int).collect::<Vec<_>>(),
        )])
        .unwrap();
        let output = wrap(table).output();
        match output.refresh().unwrap() {
            RenderUnit::Paged {
                shown_rows,
                total_rows,
                ..
            } => {
                assert_eq!(shown_rows, 20);
                assert_eq!(total_rows, 50);
            }
            other => panic!("expected paged unit, got {other:?}"),
        }
    }

    #[test]
    fn test_listener_fires_on_dependency_change() {
        let slider = int_slider("n", 0, 10, 2);
        let node = wrap(&slider).apply(BinOp::Mul, 10);
        let output = node.output();

        let seen: Rc<RefCell<Vec<RenderUnit>>> = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        output.on_change(move |unit| seen_clone.borrow_mut().push(unit.clone()));

        slider.set_value(3).unwrap();
        slider.set_value(4).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                RenderUnit::Raw(Value::Int(30)),
                RenderUnit::Raw(Value::Int(40)),
            ]
        );
    }

    #[test]
    fn test_drop_unregisters_watches() {
        let slider = int_slider("n", 0, 10, 2);
        let seen: Rc<RefCell<Vec<RenderUnit>>> = Rc::new(RefCell::new(Vec::new()));
        {
            let node = wrap(&slider).apply(BinOp::Mul, 10);
            let output = node.output();
            let seen_clone = seen.clone();
            output.on_change(move |unit| seen_clone.borrow_mut().push(unit.clone()));
            slider.set_value(3).unwrap();
        }
        slider.set_value(4).unwrap();
        assert_eq!(seen.borrow().len(), 1);
    }
}
