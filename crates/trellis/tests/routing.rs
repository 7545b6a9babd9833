//! Router-level behavior: press lifecycles, traversal, chords, layers,
//! and wheel scrolling.

mod support;

use std::sync::Arc;

use support::{Fixture, key_down, mouse_event, text_event, wheel_event};
use trellis::layers::Layer;
use trellis::props::*;
use trellis::{Action, Rect, VNode, keys};
use twire::events::MouseKind;
use twire::keys::mods;

fn two_buttons() -> VNode {
    VNode::row(vec![VNode::button("a", "AA"), VNode::button("b", "BB")])
}

#[test]
fn test_down_up_same_target_fires_one_press() {
    let mut fx = Fixture::new(&two_buttons(), 40, 4);
    let down = fx.route(&mouse_event(0, 1, 0, MouseKind::Down, 0));
    assert!(down.needs_render);
    assert_eq!(fx.focused(), Some("a"));
    let up = fx.action_of(&mouse_event(1, 1, 0, MouseKind::Up, 0));
    assert_eq!(up, Some(Action::Press { id: "a".into(), mods: 0 }));
    // Pressed state cleared: a second UP does nothing.
    assert_eq!(fx.action_of(&mouse_event(2, 1, 0, MouseKind::Up, 0)), None);
}

#[test]
fn test_down_a_up_b_fires_nothing() {
    let mut fx = Fixture::new(&two_buttons(), 40, 4);
    fx.route(&mouse_event(0, 1, 0, MouseKind::Down, 0));
    // Button b starts at x = 6.
    let up = fx.action_of(&mouse_event(1, 7, 0, MouseKind::Up, 0));
    assert_eq!(up, None);
    assert!(fx.pressed.is_none());
}

#[test]
fn test_modifier_drag_is_ignored() {
    // DOWN at A with ctrl+shift, DRAG to B, UP at A: one press at A,
    // focus stays at A, drag mutates nothing.
    let mut fx = Fixture::new(&two_buttons(), 40, 4);
    let m = mods::CTRL | mods::SHIFT;
    fx.route(&mouse_event(0, 1, 0, MouseKind::Down, m));
    assert_eq!(fx.pressed.as_deref(), Some("a"));
    fx.route(&mouse_event(1, 7, 0, MouseKind::Drag, m));
    assert_eq!(fx.pressed.as_deref(), Some("a"));
    assert_eq!(fx.focused(), Some("a"));
    let up = fx.action_of(&mouse_event(2, 1, 0, MouseKind::Up, m));
    assert_eq!(up, Some(Action::Press { id: "a".into(), mods: m }));
    assert_eq!(fx.focused(), Some("a"));
}

#[test]
fn test_tab_reaches_each_enabled_focusable_and_wraps() {
    let view = VNode::column(vec![
        VNode::button("one", "1"),
        VNode::Button(ButtonProps {
            id: "dead".into(),
            label: "D".into(),
            disabled: true,
            ..Default::default()
        }),
        VNode::button("two", "2"),
    ]);
    let mut fx = Fixture::new(&view, 40, 6);
    let mut seen = Vec::new();
    for t in 0..4 {
        fx.route(&key_down(t, keys::TAB, 0));
        seen.push(fx.focused().map(String::from));
    }
    assert_eq!(
        seen,
        vec![
            Some("one".to_string()),
            Some("two".to_string()),
            Some("one".to_string()), // wrapped, disabled skipped
            Some("two".to_string()),
        ]
    );
}

#[test]
fn test_shift_tab_goes_backward() {
    let mut fx = Fixture::new(&two_buttons(), 40, 4);
    fx.route(&key_down(0, keys::TAB, 0));
    assert_eq!(fx.focused(), Some("a"));
    fx.route(&key_down(1, keys::TAB, mods::SHIFT));
    assert_eq!(fx.focused(), Some("b")); // wrapped backward
}

#[test]
fn test_enter_presses_focused_button() {
    let mut fx = Fixture::new(&two_buttons(), 40, 4);
    fx.route(&key_down(0, keys::TAB, 0));
    let action = fx.action_of(&key_down(1, keys::ENTER, 0));
    assert_eq!(action, Some(Action::Press { id: "a".into(), mods: 0 }));
}

#[test]
fn test_chord_two_g_within_window_fires() {
    let mut fx = Fixture::new(&two_buttons(), 40, 4);
    fx.chords.bind("g g", "go-top").unwrap();
    let g = keys::from_char('g').unwrap();
    assert_eq!(fx.action_of(&key_down(0, g, 0)), None);
    assert_eq!(
        fx.action_of(&key_down(300, g, 0)),
        Some(Action::Command { tag: "go-top".into() })
    );
}

#[test]
fn test_intervening_click_resets_chord() {
    let mut fx = Fixture::new(&two_buttons(), 40, 4);
    fx.chords.bind("g g", "go-top").unwrap();
    let g = keys::from_char('g').unwrap();
    fx.route(&key_down(0, g, 0));
    fx.route(&mouse_event(10, 1, 0, MouseKind::Down, 0));
    // The click cleared the pending g; this one starts a new sequence.
    assert_eq!(fx.action_of(&key_down(20, g, 0)), None);
    assert_eq!(
        fx.action_of(&key_down(30, g, 0)),
        Some(Action::Command { tag: "go-top".into() })
    );
}

#[test]
fn test_esc_closes_topmost_closable_layer() {
    let mut fx = Fixture::new(&two_buttons(), 40, 4);
    fx.stack.push_layer("inert", false);
    fx.stack.push_layer("popup", true);
    let action = fx.action_of(&key_down(0, keys::ESCAPE, 0));
    assert_eq!(action, Some(Action::LayerClosed { id: "popup".into() }));
    // Only the inert layer remains; ESC now falls through.
    assert_eq!(fx.action_of(&key_down(1, keys::ESCAPE, 0)), None);
}

#[test]
fn test_modal_layer_blocks_mouse_below() {
    let mut fx = Fixture::new(&two_buttons(), 40, 4);
    fx.layers.register(Layer {
        id: "dialog".into(),
        z_index: 10,
        rect: Rect::new(20, 0, 10, 3),
        backdrop: Backdrop::None,
        modal: true,
        close_on_escape: true,
    });
    // Click over button "a", outside the modal: blocked, no focus.
    let out = fx.route(&mouse_event(0, 1, 0, MouseKind::Down, 0));
    assert!(out.action.is_none());
    assert_eq!(fx.focused(), None);
}

#[test]
fn test_backdrop_click_closes_closable_modal() {
    let mut fx = Fixture::new(&two_buttons(), 40, 4);
    fx.layers.register(Layer {
        id: "dialog".into(),
        z_index: 10,
        rect: Rect::new(20, 0, 10, 3),
        backdrop: Backdrop::Dim,
        modal: true,
        close_on_escape: true,
    });
    fx.stack.push_layer("dialog", true);
    let action = fx.action_of(&mouse_event(0, 1, 0, MouseKind::Down, 0));
    assert_eq!(action, Some(Action::LayerClosed { id: "dialog".into() }));
    assert!(fx.stack.is_empty());
}

#[test]
fn test_wheel_scrolls_virtual_list_under_cursor() {
    let view = VNode::column(vec![VNode::VirtualList(VirtualListProps {
        id: "list".into(),
        items: Arc::new((0..100).map(|i| format!("row {i}")).collect()),
        ..Default::default()
    })]);
    let mut fx = Fixture::new(&view, 30, 10);
    let action = fx.action_of(&wheel_event(0, 5, 5, 2));
    // Wheel multiplier is 3 rows per notch.
    assert_eq!(
        action,
        Some(Action::Scrolled {
            id: "list".into(),
            scroll_top: 6,
            range: (2, 20)
        })
    );
    // Wheel up clamps at zero.
    fx.route(&wheel_event(1, 5, 5, -5));
    assert_eq!(fx.stores.vlists["list"].scroll_top, 0);
}

#[test]
fn test_text_routes_to_focused_input() {
    let input = |value: &str| {
        VNode::column(vec![VNode::Input(InputProps {
            id: "name".into(),
            value: value.into(),
            ..Default::default()
        })])
    };
    let mut fx = Fixture::new(&input(""), 30, 3);
    fx.route(&key_down(0, keys::TAB, 0));
    assert_eq!(fx.focused(), Some("name"));
    let action = fx.action_of(&text_event(1, 'h'));
    assert_eq!(
        action,
        Some(Action::InputChanged {
            id: "name".into(),
            value: "h".into()
        })
    );
    // The host applied the change; the next frame's props carry it.
    fx.update_view(&input("h"));
    let action = fx.action_of(&text_event(2, 'i'));
    assert_eq!(
        action,
        Some(Action::InputChanged {
            id: "name".into(),
            value: "hi".into()
        })
    );
}

#[test]
fn test_disabled_input_ignores_text() {
    let view = VNode::column(vec![VNode::Input(InputProps {
        id: "name".into(),
        disabled: true,
        ..Default::default()
    })]);
    let mut fx = Fixture::new(&view, 30, 3);
    fx.focus.focused_id = Some("name".into());
    assert_eq!(fx.action_of(&text_event(0, 'x')), None);
}

#[test]
fn test_arrow_traversal_when_not_consumed() {
    let mut fx = Fixture::new(&two_buttons(), 40, 4);
    fx.route(&key_down(0, keys::RIGHT, 0));
    assert_eq!(fx.focused(), Some("a"));
    fx.route(&key_down(1, keys::RIGHT, 0));
    assert_eq!(fx.focused(), Some("b"));
    fx.route(&key_down(2, keys::LEFT, 0));
    assert_eq!(fx.focused(), Some("a"));
}

#[test]
fn test_focus_trap_confines_tab() {
    let view = VNode::column(vec![
        VNode::button("outside", "O"),
        VNode::FocusTrap(FocusTrapProps {
            id: "trap".into(),
            active: true,
            children: vec![VNode::button("in1", "1"), VNode::button("in2", "2")],
            ..Default::default()
        }),
    ]);
    let mut fx = Fixture::new(&view, 40, 8);
    let mut seen = Vec::new();
    for t in 0..3 {
        fx.route(&key_down(t, keys::TAB, 0));
        seen.push(fx.focused().map(String::from));
    }
    assert_eq!(
        seen,
        vec![
            Some("in1".to_string()),
            Some("in2".to_string()),
            Some("in1".to_string()),
        ]
    );
}
