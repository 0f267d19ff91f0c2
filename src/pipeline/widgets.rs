//! Widget extraction.
//!
//! Walks a node's accumulated dependency set and surfaces every observable
//! that follows the widget convention (exposes a `value` field), in
//! first-seen order: root source references first, then operation operands
//! from the earliest step to the latest. One entry per observable, however
//! many of its fields the chain touches.

use crate::observe::widget::{VALUE_FIELD, Widget};
use crate::pipeline::node::Pipe;

/// Every widget the chain depends on, deduplicated by observable identity.
pub fn collect_widgets(node: &Pipe) -> Vec<Widget> {
    let mut widgets: Vec<Widget> = Vec::new();
    for r in node.deps() {
        let owner = r.owner();
        if owner.has_field(VALUE_FIELD)
            && !widgets.iter().any(|w| w.id() == owner.id())
        {
            widgets.push(Widget::from_verified(owner.clone()));
        }
    }
    widgets
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::Param;
    use crate::observe::widget::{checkbox, int_slider};
    use crate::pipeline::node::wrap;
    use crate::value::Value;
    use crate::value::ops::BinOp;

    #[test]
    fn test_collects_in_first_seen_order() {
        let a = int_slider("a", 0, 10, 1);
        let b = int_slider("b", 0, 10, 2);
        let node = wrap(&a).apply(BinOp::Add, &b).apply(BinOp::Mul, &a);

        let widgets = collect_widgets(&node);
        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets[0], a);
        assert_eq!(widgets[1], b);
    }

    #[test]
    fn test_non_widget_observables_are_skipped() {
        let p = Param::new([("x", Value::Int(3))]);
        let w = checkbox("flag", true);
        let node = wrap(p.field_ref("x").unwrap()).apply(BinOp::Add, &w);

        let widgets = collect_widgets(&node);
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0], w);
    }

    #[test]
    fn test_nested_pipe_widgets_surface() {
        let a = int_slider("a", 0, 10, 1);
        let inner = wrap(&a).apply(BinOp::Mul, 2);
        let outer = wrap(10).apply(BinOp::Add, &inner);

        let widgets = collect_widgets(&outer);
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0], a);
    }

    #[test]
    fn test_constant_chain_has_no_widgets() {
        let node = wrap(5).apply(BinOp::Add, 1);
        assert!(collect_widgets(&node).is_empty());
    }
}
