//! Layout composition.
//!
//! Turns extracted widgets plus a rendered unit into an abstract layout
//! tree. The tree says only *where* things sit (rows, columns, spacers);
//! an actual front end decides pixels.

use crate::display::opts::Location;
use crate::display::output::RenderUnit;
use crate::observe::widget::Widget;

/// Abstract arrangement of controls and output.
#[derive(Debug, Clone)]
pub enum LayoutTree {
    /// Children laid out horizontally.
    Row(Vec<LayoutTree>),
    /// Children laid out vertically.
    Column(Vec<LayoutTree>),
    /// Flexible empty space.
    Spacer,
    /// The rendered output pane.
    Output(RenderUnit),
    /// The extracted controls, in collection order.
    Controls(Vec<Widget>),
}

impl LayoutTree {
    /// The render units anywhere in this tree, left-to-right.
    pub fn outputs(&self) -> Vec<&RenderUnit> {
        let mut out = Vec::new();
        self.collect_outputs(&mut out);
        out
    }

    fn collect_outputs<'a>(&'a self, out: &mut Vec<&'a RenderUnit>) {
        match self {
            LayoutTree::Row(children) | LayoutTree::Column(children) => {
                for child in children {
                    child.collect_outputs(out);
                }
            }
            LayoutTree::Output(unit) => out.push(unit),
            LayoutTree::Spacer | LayoutTree::Controls(_) => {}
        }
    }

    /// The widgets anywhere in this tree, in order.
    pub fn widgets(&self) -> Vec<&Widget> {
        let mut out = Vec::new();
        self.collect_widgets(&mut out);
        out
    }

    fn collect_widgets<'a>(&'a self, out: &mut Vec<&'a Widget>) {
        match self {
            LayoutTree::Row(children) | LayoutTree::Column(children) => {
                for child in children {
                    child.collect_widgets(out);
                }
            }
            LayoutTree::Controls(widgets) => out.extend(widgets.iter()),
            LayoutTree::Spacer | LayoutTree::Output(_) => {}
        }
    }
}

/// Compose widgets and output into the arrangement `location` describes.
///
/// With no widgets the result is the output pane alone. `center` nests the
/// whole arrangement in flexible spacers along its orthogonal axis.
pub fn compose(
    widgets: Vec<Widget>,
    unit: RenderUnit,
    location: Location,
    center: bool,
) -> LayoutTree {
    let arrangement = arrange(widgets, unit, location);
    if !center {
        return arrangement;
    }
    match arrangement {
        row @ LayoutTree::Row(_) => {
            LayoutTree::Column(vec![LayoutTree::Spacer, row, LayoutTree::Spacer])
        }
        other => LayoutTree::Row(vec![LayoutTree::Spacer, other, LayoutTree::Spacer]),
    }
}

fn arrange(widgets: Vec<Widget>, unit: RenderUnit, location: Location) -> LayoutTree {
    let pane = LayoutTree::Output(unit);
    if widgets.is_empty() {
        return pane;
    }
    let controls = LayoutTree::Controls(widgets);

    match location {
        Location::Left => LayoutTree::Row(vec![controls, pane]),
        Location::Right => LayoutTree::Row(vec![pane, controls]),
        Location::Top => LayoutTree::Column(vec![controls, pane]),
        Location::Bottom => LayoutTree::Column(vec![pane, controls]),
        Location::TopLeft => LayoutTree::Column(vec![
            LayoutTree::Row(vec![controls, LayoutTree::Spacer]),
            pane,
        ]),
        Location::TopRight => LayoutTree::Column(vec![
            LayoutTree::Row(vec![LayoutTree::Spacer, controls]),
            pane,
        ]),
        Location::BottomLeft => LayoutTree::Column(vec![
            pane,
            LayoutTree::Row(vec![controls, LayoutTree::Spacer]),
        ]),
        Location::BottomRight => LayoutTree::Column(vec![
            pane,
            LayoutTree::Row(vec![LayoutTree::Spacer, controls]),
        ]),
        Location::LeftTop => LayoutTree::Row(vec![
            LayoutTree::Column(vec![controls, LayoutTree::Spacer]),
            pane,
        ]),
        Location::LeftBottom => LayoutTree::Row(vec![
            LayoutTree::Column(vec![LayoutTree::Spacer, controls]),
            pane,
        ]),
        Location::RightTop => LayoutTree::Row(vec![
            pane,
            LayoutTree::Column(vec![controls, LayoutTree::Spacer]),
        ]),
        Location::RightBottom => LayoutTree::Row(vec![
            pane,
            LayoutTree::Column(vec![LayoutTree::Spacer, controls]),
        ]),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::widget::int_slider;
    use crate::value::Value;

    fn unit() -> RenderUnit {
        RenderUnit::Raw(Value::Int(1))
    }

    #[test]
    fn test_no_widgets_is_bare_pane() {
        let tree = compose(Vec::new(), unit(), Location::Left, false);
        assert!(matches!(tree, LayoutTree::Output(_)));
    }

    #[test]
    fn test_left_puts_controls_first() {
        let w = int_slider("n", 0, 10, 1);
        let tree = compose(vec![w], unit(), Location::Left, false);
        match tree {
            LayoutTree::Row(children) => {
                assert!(matches!(children[0], LayoutTree::Controls(_)));
                assert!(matches!(children[1], LayoutTree::Output(_)));
            }
            other => panic!("expected row, got {other:?}"),
        }
    }

    #[test]
    fn test_bottom_right_pins_controls() {
        let w = int_slider("n", 0, 10, 1);
        let tree = compose(vec![w.clone()], unit(), Location::BottomRight, false);
        match tree {
            LayoutTree::Column(children) => {
                assert!(matches!(children[0], LayoutTree::Output(_)));
                match &children[1] {
                    LayoutTree::Row(inner) => {
                        assert!(matches!(inner[0], LayoutTree::Spacer));
                        assert!(matches!(inner[1], LayoutTree::Controls(_)));
                    }
                    other => panic!("expected row, got {other:?}"),
                }
            }
            other => panic!("expected column, got {other:?}"),
        }
        assert_eq!(compose(vec![w], unit(), Location::BottomRight, false).widgets().len(), 1);
    }

    #[test]
    fn test_center_wraps_bare_pane_in_spacers() {
        let tree = compose(Vec::new(), unit(), Location::Left, true);
        match tree {
            LayoutTree::Row(children) => {
                assert!(matches!(children[0], LayoutTree::Spacer));
                assert!(matches!(children[1], LayoutTree::Output(_)));
                assert!(matches!(children[2], LayoutTree::Spacer));
            }
            other => panic!("expected row, got {other:?}"),
        }
    }

    #[test]
    fn test_center_pads_along_orthogonal_axis() {
        let w = int_slider("n", 0, 10, 1);
        let tree = compose(vec![w], unit(), Location::Left, true);
        match tree {
            LayoutTree::Column(children) => {
                assert!(matches!(children[0], LayoutTree::Spacer));
                assert!(matches!(children[1], LayoutTree::Row(_)));
                assert!(matches!(children[2], LayoutTree::Spacer));
            }
            other => panic!("expected column, got {other:?}"),
        }
    }

    #[test]
    fn test_tree_accessors() {
        let w = int_slider("n", 0, 10, 1);
        let tree = compose(vec![w], unit(), Location::Top, true);
        assert_eq!(tree.outputs().len(), 1);
        assert_eq!(tree.widgets().len(), 1);
    }
}
