//! Focus list computation, keyboard traversal, and pending focus.
//!
//! The focus list is the DFS pre-order of focusable widgets with
//! `disabled != true` and non-zero layout width. An active focus trap
//! confines the list to its subtree; focus zones reorder Tab navigation
//! by `tab_index`. Absolute-positioned widgets participate in DFS order.

use crate::instance::RuntimeInstance;
use crate::layout::LayoutNode;
use crate::vnode::VNode;

/// Focus bookkeeping owned by the scheduler.
#[derive(Clone, Debug, Default)]
pub struct FocusState {
    pub focused_id: Option<String>,
    /// A change requested mid-frame, applied after the next commit so it
    /// addresses ids that exist in the new tree. `Some(None)` is an
    /// explicit blur.
    pub pending_focused_id: Option<Option<String>>,
    /// Announcement for observers, updated on focus changes.
    pub announcement: Option<String>,
}

impl FocusState {
    pub fn request_focus(&mut self, id: Option<String>) {
        self.pending_focused_id = Some(id);
    }
}

/// Traversal direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusDir {
    Next,
    Prev,
}

/// Computes the ordered focus list for a committed, laid-out tree.
pub fn compute_focus_list(inst: &RuntimeInstance, layout: &LayoutNode) -> Vec<String> {
    // An active trap confines traversal to the deepest active trap.
    if let Some((trap_inst, trap_layout)) = deepest_active_trap(inst, layout) {
        let mut groups = Vec::new();
        collect_groups(trap_inst, trap_layout, 0, &mut groups);
        return flatten_groups(groups);
    }
    let mut groups = Vec::new();
    collect_groups(inst, layout, 0, &mut groups);
    flatten_groups(groups)
}

/// The id of the deepest active focus trap, for announcements.
pub fn active_trap_id(inst: &RuntimeInstance) -> Option<String> {
    let mut found = None;
    inst.walk(&mut |node| {
        if let VNode::FocusTrap(p) = &node.node {
            if p.active {
                found = Some(p.id.clone());
            }
        }
    });
    found
}

/// The id of the focus zone containing the focused widget, if any.
pub fn active_zone_id(inst: &RuntimeInstance, focused: &str) -> Option<String> {
    fn walk(inst: &RuntimeInstance, focused: &str, zone: Option<&str>) -> Option<String> {
        let zone = match &inst.node {
            VNode::FocusZone(p) => Some(p.id.as_str()),
            _ => zone,
        };
        if inst.node.widget_id() == Some(focused) {
            return zone.map(String::from);
        }
        inst.children
            .iter()
            .find_map(|c| walk(c, focused, zone))
    }
    walk(inst, focused, None)
}

fn deepest_active_trap<'a>(
    inst: &'a RuntimeInstance,
    layout: &'a LayoutNode,
) -> Option<(&'a RuntimeInstance, &'a LayoutNode)> {
    let mut found = None;
    if let VNode::FocusTrap(p) = &inst.node {
        if p.active {
            found = Some((inst, layout));
        }
    }
    for (child, child_layout) in inst.children.iter().zip(&layout.children) {
        if let Some(deeper) = deepest_active_trap(child, child_layout) {
            found = Some(deeper);
        }
    }
    found
}

/// Collects `(tab_index, declaration_order, ids)` groups. Widgets outside
/// any zone belong to the implicit group at tab index 0.
fn collect_groups(
    inst: &RuntimeInstance,
    layout: &LayoutNode,
    zone_index: i32,
    groups: &mut Vec<(i32, Vec<String>)>,
) {
    let zone_index = match &inst.node {
        VNode::FocusZone(p) => p.tab_index,
        _ => zone_index,
    };
    if inst.node.is_focusable_kind() && !inst.node.is_disabled() && layout.rect.w > 0 {
        if let Some(id) = inst.node.widget_id() {
            match groups.iter_mut().find(|(idx, _)| *idx == zone_index) {
                Some((_, ids)) => ids.push(id.to_string()),
                None => groups.push((zone_index, vec![id.to_string()])),
            }
        }
    }
    for (child, child_layout) in inst.children.iter().zip(&layout.children) {
        collect_groups(child, child_layout, zone_index, groups);
    }
}

fn flatten_groups(mut groups: Vec<(i32, Vec<String>)>) -> Vec<String> {
    // Stable: equal tab indexes keep first-seen order.
    groups.sort_by_key(|(idx, _)| *idx);
    groups.into_iter().flat_map(|(_, ids)| ids).collect()
}

/// Advances focus by one list slot with wraparound.
///
/// A `None` current starts at the first (Next) or last (Prev) entry; a
/// current id that is no longer in the list falls back the same way.
pub fn compute_moved_focus_id(
    list: &[String],
    current: Option<&str>,
    dir: FocusDir,
) -> Option<String> {
    if list.is_empty() {
        return None;
    }
    let at = current.and_then(|id| list.iter().position(|x| x == id));
    let next = match (at, dir) {
        (Some(i), FocusDir::Next) => (i + 1) % list.len(),
        (Some(i), FocusDir::Prev) => (i + list.len() - 1) % list.len(),
        (None, FocusDir::Next) => 0,
        (None, FocusDir::Prev) => list.len() - 1,
    };
    Some(list[next].clone())
}

/// Applies pending focus against the committed tree's focus list:
/// pending first (when its target exists), then the retained current,
/// then the first focusable, then none.
pub fn finalize_focus_for_committed_tree(state: &mut FocusState, list: &[String]) -> bool {
    let previous = state.focused_id.clone();
    let next = match state.pending_focused_id.take() {
        Some(None) => None,
        Some(Some(id)) => {
            if list.iter().any(|x| *x == id) {
                Some(id)
            } else {
                log::debug!("pending focus `{id}` not in committed tree, reassigning");
                retain_or_first(&state.focused_id, list)
            }
        }
        None => retain_or_first(&state.focused_id, list),
    };
    let changed = next != previous;
    if changed {
        state.announcement = Some(match &next {
            Some(id) => format!("focused {id}"),
            None => "focus cleared".to_string(),
        });
    }
    state.focused_id = next;
    changed
}

fn retain_or_first(current: &Option<String>, list: &[String]) -> Option<String> {
    match current {
        Some(id) if list.iter().any(|x| x == id) => Some(id.clone()),
        _ => list.first().cloned(),
    }
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

    fn committed(view: &VNode) -> (RuntimeInstance, LayoutNode) {
        let mut alloc = IdAllocator::new();
        let mut cx = CommitCx::new(&mut alloc, Invalidate::new());
        let inst = commit_vnode_tree(None, view, &mut cx).unwrap();
        let layout = layout_tree(&inst, Size::new(80, 24)).unwrap();
        (inst, layout)
    }

    fn list_of(view: &VNode) -> Vec<String> {
        let (inst, layout) = committed(view);
        compute_focus_list(&inst, &layout)
    }

    #[test]
    fn test_dfs_preorder() {
        let view = VNode::column(vec![
            VNode::button("a", "A"),
            VNode::row(vec![VNode::button("b", "B"), VNode::button("c", "C")]),
        ]);
        assert_eq!(list_of(&view), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_disabled_skipped() {
        let view = VNode::column(vec![
            VNode::button("a", "A"),
            VNode::Button(ButtonProps {
                id: "dead".into(),
                label: "D".into(),
                disabled: true,
                ..Default::default()
            }),
            VNode::button("b", "B"),
        ]);
        assert_eq!(list_of(&view), vec!["a", "b"]);
    }

    #[test]
    fn test_active_trap_confines_list() {
        let view = VNode::column(vec![
            VNode::button("outside", "O"),
            VNode::FocusTrap(FocusTrapProps {
                id: "trap".into(),
                active: true,
                children: vec![VNode::button("inside", "I")],
                ..Default::default()
            }),
        ]);
        assert_eq!(list_of(&view), vec!["inside"]);
        let (inst, _) = committed(&view);
        assert_eq!(active_trap_id(&inst).as_deref(), Some("trap"));
    }

    #[test]
    fn test_zone_tab_index_orders_groups() {
        let zone = |id: &str, tab: i32, button: &str| {
            VNode::FocusZone(FocusZoneProps {
                id: id.into(),
                tab_index: tab,
                children: vec![VNode::button(button, "X")],
                ..Default::default()
            })
        };
        let view = VNode::column(vec![zone("z2", 2, "late"), zone("z1", 1, "early")]);
        assert_eq!(list_of(&view), vec!["early", "late"]);
    }

    #[test]
    fn test_move_with_wrap() {
        let list: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            compute_moved_focus_id(&list, Some("c"), FocusDir::Next).as_deref(),
            Some("a")
        );
        assert_eq!(
            compute_moved_focus_id(&list, Some("a"), FocusDir::Prev).as_deref(),
            Some("c")
        );
        assert_eq!(
            compute_moved_focus_id(&list, None, FocusDir::Next).as_deref(),
            Some("a")
        );
        assert_eq!(
            compute_moved_focus_id(&list, None, FocusDir::Prev).as_deref(),
            Some("c")
        );
        assert_eq!(
            compute_moved_focus_id(&list, Some("gone"), FocusDir::Next).as_deref(),
            Some("a")
        );
        assert_eq!(compute_moved_focus_id(&[], None, FocusDir::Next), None);
    }

    #[test]
    fn test_finalize_pending_then_retain_then_first() {
        let list: Vec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();

        let mut state = FocusState::default();
        state.focused_id = Some("a".into());
        state.request_focus(Some("b".into()));
        assert!(finalize_focus_for_committed_tree(&mut state, &list));
        assert_eq!(state.focused_id.as_deref(), Some("b"));

        // Pending id vanished from the tree: retain current.
        state.request_focus(Some("gone".into()));
        assert!(!finalize_focus_for_committed_tree(&mut state, &list));
        assert_eq!(state.focused_id.as_deref(), Some("b"));

        // Current vanished: first focusable.
        state.focused_id = Some("gone".into());
        assert!(finalize_focus_for_committed_tree(&mut state, &list));
        assert_eq!(state.focused_id.as_deref(), Some("a"));

        // Nothing focusable: none.
        assert!(finalize_focus_for_committed_tree(&mut state, &[]));
        assert_eq!(state.focused_id, None);
    }

    #[test]
    fn test_explicit_blur() {
        let list: Vec<String> = vec!["a".to_string()];
        let mut state = FocusState {
            focused_id: Some("a".into()),
            ..Default::default()
        };
        state.request_focus(None);
        finalize_focus_for_committed_tree(&mut state, &list);
        assert_eq!(state.focused_id, None);
    }
}
