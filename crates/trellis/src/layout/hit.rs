//! Hit-testing over the laid-out instance tree.
//!
//! Walks later-first (topmost paint order), respecting the clip bounds
//! accumulated from scrolling/hidden ancestors. Rect boundaries are
//! left/top inclusive, right/bottom exclusive; zero-dimensioned
//! focusables never hit.

use crate::geometry::Rect;
use crate::instance::RuntimeInstance;
use crate::props::Overflow;
use crate::vnode::{NodeKind, VNode};

use super::LayoutNode;

/// Finds the topmost focusable widget at a point, returning its id.
pub fn hit_test_focusable(
    inst: &RuntimeInstance,
    layout: &LayoutNode,
    x: i32,
    y: i32,
) -> Option<String> {
    let clip = Rect::new(i32::MIN / 2, i32::MIN / 2, i32::MAX, i32::MAX);
    hit_node(inst, layout, x, y, clip)
}

fn hit_node(
    inst: &RuntimeInstance,
    layout: &LayoutNode,
    x: i32,
    y: i32,
    clip: Rect,
) -> Option<String> {
    let clip = match clips_children(&inst.node) {
        true => clip.intersection(&layout.rect),
        false => clip,
    };

    // Later children paint on top, so test them first.
    for (child, child_layout) in inst.children.iter().zip(&layout.children).rev() {
        if let Some(hit) = hit_node(child, child_layout, x, y, clip) {
            return Some(hit);
        }
    }

    if inst.node.is_focusable_kind()
        && !inst.node.is_disabled()
        && !layout.rect.is_empty()
        && layout.rect.contains(x, y)
        && clip.contains(x, y)
    {
        return inst.node.widget_id().map(String::from);
    }
    None
}

fn clips_children(node: &VNode) -> bool {
    match node {
        VNode::Row(p) | VNode::Column(p) | VNode::Box(p) => {
            matches!(p.overflow, Overflow::Hidden | Overflow::Scroll)
        }
        VNode::Modal(_) => true,
        _ => false,
    }
}

/// Finds the layout rect of a widget by id.
pub fn find_rect_by_id(inst: &RuntimeInstance, layout: &LayoutNode, id: &str) -> Option<Rect> {
    if inst.node.widget_id() == Some(id) {
        return Some(layout.rect);
    }
    inst.children
        .iter()
        .zip(&layout.children)
        .find_map(|(c, l)| find_rect_by_id(c, l, id))
}

/// Finds the nearest scrollable node under a point for wheel routing:
/// the deepest virtual list, logs console, or overflow-scroll container
/// whose rect contains the point. Returns its widget id (for widget
/// stores) or `None` id for prop-scrolled containers.
pub fn scrollable_at<'a>(
    inst: &'a RuntimeInstance,
    layout: &LayoutNode,
    x: i32,
    y: i32,
) -> Option<&'a RuntimeInstance> {
    if layout.rect.is_empty() || !layout.rect.contains(x, y) {
        return None;
    }
    for (child, child_layout) in inst.children.iter().zip(&layout.children).rev() {
        if let Some(found) = scrollable_at(child, child_layout, x, y) {
            return Some(found);
        }
    }
    let scrollable = match &inst.node {
        VNode::VirtualList(_) | VNode::LogsConsole(_) => true,
        VNode::Table(_) | VNode::Tree(_) => true,
        VNode::Row(p) | VNode::Column(p) | VNode::Box(p) => {
            matches!(p.overflow, Overflow::Scroll)
        }
        _ => false,
    };
    scrollable.then_some(inst)
}

/// True when the instance hosts a pressable widget (press actions fire
/// on mouse up over the same id).
pub fn is_pressable_kind(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Button | NodeKind::Checkbox | NodeKind::Select | NodeKind::RadioGroup
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::{CommitCx, commit_vnode_tree};
    use crate::geometry::Size;
    use crate::hooks::Invalidate;
    use crate::instance::IdAllocator;
    use crate::layout::layout_tree;
    use crate::props::*;

    fn commit(view: &VNode) -> RuntimeInstance {
        let mut alloc = IdAllocator::new();
        let mut cx = CommitCx::new(&mut alloc, Invalidate::new());
        commit_vnode_tree(None, view, &mut cx).unwrap()
    }

    #[test]
    fn test_hit_finds_button() {
        let view = VNode::row(vec![VNode::button("a", "AA"), VNode::button("b", "BB")]);
        let inst = commit(&view);
        let layout = layout_tree(&inst, Size::new(40, 4)).unwrap();
        assert_eq!(hit_test_focusable(&inst, &layout, 0, 0).as_deref(), Some("a"));
        // Second button starts after the first's 6 cells.
        assert_eq!(hit_test_focusable(&inst, &layout, 6, 0).as_deref(), Some("b"));
        assert_eq!(hit_test_focusable(&inst, &layout, 0, 2), None);
    }

    #[test]
    fn test_right_bottom_exclusive() {
        let view = VNode::row(vec![VNode::button("a", "AA")]); // width 6
        let inst = commit(&view);
        let layout = layout_tree(&inst, Size::new(40, 4)).unwrap();
        assert_eq!(hit_test_focusable(&inst, &layout, 5, 0).as_deref(), Some("a"));
        assert_eq!(hit_test_focusable(&inst, &layout, 6, 0), None);
        assert_eq!(hit_test_focusable(&inst, &layout, 0, 1), None);
    }

    #[test]
    fn test_disabled_and_zero_dim_never_hit() {
        let view = VNode::row(vec![VNode::Button(ButtonProps {
            id: "d".into(),
            label: "D".into(),
            disabled: true,
            ..Default::default()
        })]);
        let inst = commit(&view);
        let layout = layout_tree(&inst, Size::new(40, 4)).unwrap();
        assert_eq!(hit_test_focusable(&inst, &layout, 1, 0), None);
    }

    #[test]
    fn test_clipped_child_not_hit() {
        // Button scrolled out of a hidden-overflow container.
        let view = VNode::Column(ContainerProps {
            overflow: Overflow::Scroll,
            scroll_y: 2,
            children: vec![
                VNode::button("top", "T"),
                VNode::button("mid", "M"),
                VNode::button("bot", "B"),
            ],
            ..Default::default()
        });
        let inst = commit(&view);
        let layout = layout_tree(&inst, Size::new(20, 1)).unwrap();
        // Only the third button is visible at row 0 now.
        assert_eq!(hit_test_focusable(&inst, &layout, 0, 0).as_deref(), Some("bot"));
    }

    #[test]
    fn test_later_sibling_wins_overlap() {
        let abs = |id: &str| {
            VNode::Button(ButtonProps {
                common: Common {
                    position: Position::Absolute,
                    left: Some(0),
                    top: Some(0),
                    width: Dim::Cells(6),
                    height: Dim::Cells(1),
                    ..Default::default()
                },
                id: id.into(),
                label: "X".into(),
                ..Default::default()
            })
        };
        let view = VNode::Box(ContainerProps {
            children: vec![abs("under"), abs("over")],
            ..Default::default()
        });
        let inst = commit(&view);
        let layout = layout_tree(&inst, Size::new(20, 4)).unwrap();
        assert_eq!(hit_test_focusable(&inst, &layout, 1, 0).as_deref(), Some("over"));
    }

    #[test]
    fn test_find_rect_by_id() {
        let view = VNode::column(vec![VNode::text("x"), VNode::button("go", "Go")]);
        let inst = commit(&view);
        let layout = layout_tree(&inst, Size::new(20, 4)).unwrap();
        let rect = find_rect_by_id(&inst, &layout, "go").unwrap();
        assert_eq!(rect.y, 1);
    }
}
