//! Virtual list keyboard and wheel routing.
//!
//! The store keeps the scroll offset and selected row; `scroll_top` is
//! recomputed from the item height to keep the selected row visible with
//! overscan. `Scrolled` actions fire only when the offset changes.

use std::sync::Arc;

use twire::keys;

use crate::action::{Action, RouteOutcome};
use crate::props::VirtualListProps;

/// Rows scrolled per wheel notch.
pub const WHEEL_STEP: i32 = 3;

/// Store entry for one virtual list.
#[derive(Clone, Debug, Default)]
pub struct VirtualListState {
    pub scroll_top: i32,
    pub selected_index: usize,
    pub viewport_height: i32,
    pub measured_item_count: usize,
    /// Identity of the items payload this state was computed against.
    items_ptr: usize,
}

impl VirtualListState {
    /// Invariant-checks the owning props; a new items value resets the
    /// derived fields so stale indexes never outlive their data.
    pub fn ensure(&mut self, props: &VirtualListProps, viewport_height: i32) {
        let ptr = Arc::as_ptr(&props.items) as usize;
        if self.items_ptr != ptr {
            self.items_ptr = ptr;
            self.measured_item_count = props.items.len();
            self.selected_index = self.selected_index.min(props.items.len().saturating_sub(1));
            self.scroll_top = self.scroll_top.clamp(0, self.max_scroll(props, viewport_height));
        }
        self.viewport_height = viewport_height;
    }

    pub fn content_height(&self, props: &VirtualListProps) -> i32 {
        props.items.len() as i32 * props.item_height.max(1)
    }

    pub fn max_scroll(&self, props: &VirtualListProps, viewport_height: i32) -> i32 {
        (self.content_height(props) - viewport_height).max(0)
    }

    /// Visible item span with overscan applied.
    pub fn visible_range(&self, props: &VirtualListProps, viewport_height: i32) -> (usize, usize) {
        let item_h = props.item_height.max(1);
        let len = props.items.len();
        if len == 0 || viewport_height <= 0 {
            return (0, 0);
        }
        let first = (self.scroll_top / item_h) as usize;
        let rows = (viewport_height + item_h - 1) / item_h;
        let start = first.saturating_sub(props.overscan.max(0) as usize);
        let end = (first + rows as usize + props.overscan.max(0) as usize).min(len);
        (start, end)
    }

    /// Adjusts scroll so the selected row sits inside the viewport.
    fn scroll_selected_into_view(&mut self, props: &VirtualListProps, viewport_height: i32) {
        let item_h = props.item_height.max(1);
        let top = self.selected_index as i32 * item_h;
        let bottom = top + item_h;
        if top < self.scroll_top {
            self.scroll_top = top;
        } else if bottom > self.scroll_top + viewport_height {
            self.scroll_top = bottom - viewport_height;
        }
        self.scroll_top = self.scroll_top.clamp(0, self.max_scroll(props, viewport_height));
    }
}

/// Routes a key-down into a focused virtual list.
pub fn route_virtual_list_key(
    state: &mut VirtualListState,
    props: &VirtualListProps,
    viewport_height: i32,
    key: u16,
) -> RouteOutcome {
    state.ensure(props, viewport_height);
    let len = props.items.len();
    if len == 0 {
        return RouteOutcome::none();
    }
    let last = len - 1;
    let page = (viewport_height / props.item_height.max(1)).max(1) as usize;
    let prev_selected = state.selected_index;
    let prev_scroll = state.scroll_top;

    match key {
        keys::UP => state.selected_index = state.selected_index.saturating_sub(1),
        keys::DOWN => state.selected_index = (state.selected_index + 1).min(last),
        keys::HOME => state.selected_index = 0,
        keys::END => state.selected_index = last,
        keys::PAGE_UP => state.selected_index = state.selected_index.saturating_sub(page),
        keys::PAGE_DOWN => state.selected_index = (state.selected_index + page).min(last),
        keys::ENTER => {
            return RouteOutcome::action(Action::RowPress {
                id: props.id.clone(),
                row: state.selected_index,
                key: props
                    .items
                    .get(state.selected_index)
                    .cloned()
                    .unwrap_or_default(),
            });
        }
        _ => return RouteOutcome::none(),
    }

    state.scroll_selected_into_view(props, viewport_height);
    if state.scroll_top != prev_scroll {
        let range = state.visible_range(props, viewport_height);
        return RouteOutcome::action(Action::Scrolled {
            id: props.id.clone(),
            scroll_top: state.scroll_top,
            range,
        });
    }
    if state.selected_index != prev_selected {
        return RouteOutcome::render();
    }
    RouteOutcome::none()
}

/// Routes a wheel event: a small multiplier per notch, clamped to
/// `[0, content - viewport]`.
pub fn route_virtual_list_wheel(
    state: &mut VirtualListState,
    props: &VirtualListProps,
    viewport_height: i32,
    wheel_y: i32,
) -> RouteOutcome {
    state.ensure(props, viewport_height);
    let prev = state.scroll_top;
    let max = state.max_scroll(props, viewport_height);
    state.scroll_top = (state.scroll_top + wheel_y * WHEEL_STEP).clamp(0, max);
    if state.scroll_top == prev {
        return RouteOutcome::none();
    }
    let range = state.visible_range(props, viewport_height);
    RouteOutcome::action(Action::Scrolled {
        id: props.id.clone(),
        scroll_top: state.scroll_top,
        range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(n: usize) -> VirtualListProps {
        VirtualListProps {
            id: "list".into(),
            items: Arc::new((0..n).map(|i| format!("item {i}")).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_down_moves_selection_without_scroll() {
        let mut state = VirtualListState::default();
        let p = props(100);
        let out = route_virtual_list_key(&mut state, &p, 10, keys::DOWN);
        assert_eq!(state.selected_index, 1);
        assert!(out.needs_render);
        assert!(out.action.is_none()); // no scroll change yet
    }

    #[test]
    fn test_selection_past_viewport_scrolls() {
        let mut state = VirtualListState::default();
        let p = props(100);
        for _ in 0..12 {
            route_virtual_list_key(&mut state, &p, 10, keys::DOWN);
        }
        assert_eq!(state.selected_index, 12);
        assert_eq!(state.scroll_top, 3); // row 12 visible in a 10-row viewport
    }

    #[test]
    fn test_end_and_home() {
        let mut state = VirtualListState::default();
        let p = props(50);
        let out = route_virtual_list_key(&mut state, &p, 10, keys::END);
        assert_eq!(state.selected_index, 49);
        assert_eq!(state.scroll_top, 40);
        assert!(matches!(out.action, Some(Action::Scrolled { scroll_top: 40, .. })));
        route_virtual_list_key(&mut state, &p, 10, keys::HOME);
        assert_eq!(state.scroll_top, 0);
    }

    #[test]
    fn test_enter_fires_row_press() {
        let mut state = VirtualListState::default();
        let p = props(5);
        route_virtual_list_key(&mut state, &p, 10, keys::DOWN);
        let out = route_virtual_list_key(&mut state, &p, 10, keys::ENTER);
        assert_eq!(
            out.action,
            Some(Action::RowPress {
                id: "list".into(),
                row: 1,
                key: "item 1".into()
            })
        );
    }

    #[test]
    fn test_wheel_clamps_to_content() {
        let mut state = VirtualListState::default();
        let p = props(20);
        // 20 rows, viewport 10: max scroll is 10.
        let out = route_virtual_list_wheel(&mut state, &p, 10, 100);
        assert_eq!(state.scroll_top, 10);
        assert!(matches!(out.action, Some(Action::Scrolled { .. })));
        // Already clamped: no action on further wheel-down.
        let out = route_virtual_list_wheel(&mut state, &p, 10, 5);
        assert!(out.action.is_none());
        route_virtual_list_wheel(&mut state, &p, 10, -100);
        assert_eq!(state.scroll_top, 0);
    }

    #[test]
    fn test_new_items_identity_resets_derived_state() {
        let mut state = VirtualListState::default();
        let p = props(100);
        route_virtual_list_key(&mut state, &p, 10, keys::END);
        assert_eq!(state.selected_index, 99);
        // New, shorter payload: selection clamps.
        let p2 = props(5);
        state.ensure(&p2, 10);
        assert_eq!(state.selected_index, 4);
        assert_eq!(state.scroll_top, 0);
    }

    #[test]
    fn test_visible_range_with_overscan() {
        let mut state = VirtualListState::default();
        let p = props(1000);
        state.ensure(&p, 31);
        state.scroll_top = 100;
        let (start, end) = state.visible_range(&p, 31);
        assert_eq!(start, 96); // 100 - overscan 4
        assert_eq!(end, 135); // 100 + 31 + 4
    }
}
