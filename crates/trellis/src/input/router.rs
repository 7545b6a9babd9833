//! Central event routing.
//!
//! `route_engine_event` dispatches decoded engine events with a strict
//! precedence: fatal/resize bypass routing; mouse goes through layer
//! hit-testing before widget hit-testing; keys go ESC-close → focused
//! widget router → chord manager → focus traversal → pressable
//! activation; text and paste go to the focused editor or palette.
//!
//! Local routing failures (an id that no longer resolves) are logged
//! no-ops; they never abort the frame.

use twire::events::{EngineEvent, EventKind, KeyAction, MouseKind};
use twire::keys;

use crate::action::{Action, RouteOutcome};
use crate::focus::{FocusDir, FocusState, compute_focus_list, compute_moved_focus_id};
use crate::geometry::Size;
use crate::instance::RuntimeInstance;
use crate::layers::{LayerRegistry, LayerStackState};
use crate::layout::{LayoutNode, find_rect_by_id, hit_test_focusable, is_pressable_kind, scrollable_at};
use crate::props::Backdrop;
use crate::vnode::VNode;

use super::chords::{ChordManager, ChordOutcome};
use super::editor::InputEditor;
use super::palette::{route_palette_key, route_palette_text};
use super::table::route_table_key;
use super::tree_nav::route_tree_key;
use super::vlist::{WHEEL_STEP, route_virtual_list_key, route_virtual_list_wheel};
use super::LocalStores;

/// Everything one routing step may read or mutate.
pub struct RouterCx<'a> {
    pub root: &'a RuntimeInstance,
    pub layout: &'a LayoutNode,
    pub viewport: &'a mut Size,
    pub focus: &'a mut FocusState,
    pub layers: &'a LayerRegistry,
    pub layer_stack: &'a mut LayerStackState,
    pub stores: &'a mut LocalStores,
    pub chords: &'a mut ChordManager,
    pub pressed: &'a mut Option<String>,
}

pub fn route_engine_event(cx: &mut RouterCx<'_>, event: &EngineEvent) -> RouteOutcome {
    match &event.kind {
        EventKind::Fatal { code, detail } => RouteOutcome::action(Action::Fatal {
            code: format!("{code:?}").to_uppercase(),
            detail: detail.clone(),
        }),
        EventKind::Resize { cols, rows } => {
            *cx.viewport = Size::new(*cols, *rows);
            RouteOutcome::action(Action::Resized {
                cols: *cols,
                rows: *rows,
            })
        }
        EventKind::Mouse {
            x,
            y,
            kind,
            mods,
            wheel_y,
            ..
        } => route_mouse(cx, *x, *y, *kind, *mods, *wheel_y),
        EventKind::Key { key, mods, action } => match action {
            KeyAction::Down | KeyAction::Repeat => route_key(cx, *key, *mods, event.time_ms),
            KeyAction::Up => RouteOutcome::none(),
        },
        EventKind::Text { codepoint } => match char::from_u32(*codepoint) {
            Some(ch) => route_text(cx, ch, event.time_ms),
            None => RouteOutcome::none(),
        },
        EventKind::Paste { text } => route_paste(cx, text, event.time_ms),
        EventKind::Tick { .. } | EventKind::User { .. } => RouteOutcome::none(),
    }
}

// ---------------------------------------------------------------------------
// Mouse
// ---------------------------------------------------------------------------

fn route_mouse(
    cx: &mut RouterCx<'_>,
    x: i32,
    y: i32,
    kind: MouseKind,
    mods: u8,
    wheel_y: i32,
) -> RouteOutcome {
    // Layer pass: a modal blocks everything below it; a backdrop click
    // on a closable modal closes it.
    let mut scope: Option<&str> = None;
    if !cx.layers.is_empty() {
        let hit = cx.layers.hit_test_layers(x, y);
        if hit.blocked {
            let Some(blocking) = hit.blocking_layer else {
                return RouteOutcome::none();
            };
            if kind == MouseKind::Down
                && blocking.close_on_escape
                && blocking.backdrop != Backdrop::None
            {
                let id = blocking.id.clone();
                cx.layer_stack.pop_layer(&id);
                cx.chords.reset();
                return RouteOutcome::action(Action::LayerClosed { id });
            }
            return RouteOutcome::none();
        }
        if let Some(layer) = hit.layer {
            scope = Some(layer.id.as_str());
        }
    }
    let (scope_inst, scope_layout) = match scope {
        Some(id) => match find_subtree(cx.root, cx.layout, id) {
            Some(pair) => pair,
            None => {
                log::debug!("layer `{id}` has no committed subtree; routing skipped");
                return RouteOutcome::none();
            }
        },
        None => (cx.root, cx.layout),
    };

    match kind {
        MouseKind::Down => {
            let Some(id) = hit_test_focusable(scope_inst, scope_layout, x, y) else {
                return RouteOutcome::none();
            };
            cx.chords.reset();
            let focus_changed = cx.focus.focused_id.as_deref() != Some(id.as_str());
            cx.focus.focused_id = Some(id.clone());
            cx.focus.request_focus(Some(id.clone()));
            let Some(inst) = cx.root.find_by_widget_id(&id) else {
                log::debug!("hit id `{id}` not in tree; ignoring");
                return RouteOutcome::none();
            };
            if is_pressable_kind(inst.kind) {
                *cx.pressed = Some(id.clone());
            }
            let mut out = click_into_widget(cx, &inst.node.clone(), &id, y);
            out.needs_render |= focus_changed;
            if out.action.is_none() && focus_changed {
                out.action = Some(Action::FocusChanged { id: Some(id) });
            }
            out
        }
        MouseKind::Up => {
            let hit = hit_test_focusable(scope_inst, scope_layout, x, y);
            let pressed = cx.pressed.take();
            match (pressed, hit) {
                (Some(p), Some(h)) if p == h => RouteOutcome::action(Action::Press { id: p, mods }),
                _ => RouteOutcome::none(),
            }
        }
        // Drag and move never mutate focus or pressed state.
        MouseKind::Drag | MouseKind::Move => RouteOutcome::none(),
        MouseKind::Wheel => route_wheel(cx, x, y, wheel_y),
    }
}

/// Row-level selection for clicks into collection widgets.
fn click_into_widget(cx: &mut RouterCx<'_>, node: &VNode, id: &str, y: i32) -> RouteOutcome {
    let Some(rect) = find_rect_by_id(cx.root, cx.layout, id) else {
        return RouteOutcome::render();
    };
    match node {
        VNode::VirtualList(p) => {
            let state = cx.stores.vlists.entry(id.to_string()).or_default();
            state.ensure(p, rect.h);
            let row = ((y - rect.y + state.scroll_top) / p.item_height.max(1)).max(0) as usize;
            if row < p.items.len() && row != state.selected_index {
                state.selected_index = row;
                return RouteOutcome::action(Action::Select {
                    id: id.to_string(),
                    index: row,
                });
            }
            RouteOutcome::render()
        }
        VNode::Table(p) => {
            let state = cx.stores.tables.entry(id.to_string()).or_default();
            state.ensure(p);
            let header_rows = i32::from(p.show_header);
            let row = y - rect.y - header_rows + state.scroll_top;
            if row >= 0 && (row as usize) < p.rows.len() {
                state.focused_row = row;
                state.last_clicked_key = Some(p.rows[row as usize].key.clone());
            }
            RouteOutcome::render()
        }
        _ => RouteOutcome::render(),
    }
}

fn route_wheel(cx: &mut RouterCx<'_>, x: i32, y: i32, wheel_y: i32) -> RouteOutcome {
    let Some(target) = scrollable_at(cx.root, cx.layout, x, y) else {
        return RouteOutcome::none();
    };
    let Some(id) = target.node.widget_id().map(String::from) else {
        // Prop-scrolled containers are host state; nothing to mutate here.
        return RouteOutcome::none();
    };
    let Some(rect) = find_rect_by_id(cx.root, cx.layout, &id) else {
        return RouteOutcome::none();
    };
    match &target.node {
        VNode::VirtualList(p) => {
            let state = cx.stores.vlists.entry(id).or_default();
            route_virtual_list_wheel(state, p, rect.h, wheel_y)
        }
        VNode::LogsConsole(p) => {
            scroll_lines_store(cx, &id, p.lines.len() as i32, rect.h, wheel_y * WHEEL_STEP)
        }
        VNode::Table(p) => {
            let state = cx.stores.tables.entry(id).or_default();
            state.ensure(p);
            let max = (p.rows.len() as i32 - rect.h).max(0);
            let next = (state.scroll_top + wheel_y * WHEEL_STEP).clamp(0, max);
            if next == state.scroll_top {
                return RouteOutcome::none();
            }
            state.scroll_top = next;
            RouteOutcome::render()
        }
        VNode::Tree(_) | VNode::FileTreeExplorer(_) => {
            let state = cx.stores.trees.entry(id).or_default();
            let next = (state.scroll_top + wheel_y * WHEEL_STEP).max(0);
            if next == state.scroll_top {
                return RouteOutcome::none();
            }
            state.scroll_top = next;
            RouteOutcome::render()
        }
        _ => RouteOutcome::none(),
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

fn route_key(cx: &mut RouterCx<'_>, key: u16, mods: u8, time_ms: u64) -> RouteOutcome {
    // ESC consults the layer open-order stack first.
    if key == keys::ESCAPE {
        if let Some(id) = cx.layer_stack.close_topmost_layer() {
            cx.chords.reset();
            return RouteOutcome::action(Action::LayerClosed { id });
        }
    }

    // Focused widget-local routers consume before anything generic.
    if let Some(focused) = cx.focus.focused_id.clone() {
        if let Some(out) = route_widget_key(cx, &focused, key, mods, time_ms) {
            return out;
        }
    }

    // Global chord bindings.
    match cx.chords.on_key(key, mods, time_ms) {
        ChordOutcome::Matched(tag) => return RouteOutcome::action(Action::Command { tag }),
        ChordOutcome::Pending => return RouteOutcome::none(),
        ChordOutcome::NoMatch => {}
    }

    // Focus traversal: Tab/Shift-Tab, and arrows not claimed above.
    let dir = match key {
        keys::TAB if mods & keys::mods::SHIFT != 0 => Some(FocusDir::Prev),
        keys::TAB => Some(FocusDir::Next),
        keys::RIGHT | keys::DOWN => Some(FocusDir::Next),
        keys::LEFT | keys::UP => Some(FocusDir::Prev),
        _ => None,
    };
    if let Some(dir) = dir {
        let list = compute_focus_list(cx.root, cx.layout);
        let next = compute_moved_focus_id(&list, cx.focus.focused_id.as_deref(), dir);
        if next != cx.focus.focused_id {
            cx.chords.reset();
            cx.focus.focused_id = next.clone();
            cx.focus.request_focus(next.clone());
            cx.focus.announcement = Some(match &next {
                Some(id) => format!("focused {id}"),
                None => "focus cleared".into(),
            });
            return RouteOutcome::action(Action::FocusChanged { id: next });
        }
        return RouteOutcome::none();
    }

    // Enter/Space press the focused pressable.
    if key == keys::ENTER || key == keys::SPACE {
        if let Some(id) = cx.focus.focused_id.clone() {
            if let Some(inst) = cx.root.find_by_widget_id(&id) {
                if is_pressable_kind(inst.kind) && !inst.node.is_disabled() {
                    return RouteOutcome::action(Action::Press { id, mods });
                }
            }
        }
    }
    RouteOutcome::none()
}

/// Dispatches a key to the focused widget's local router. `None` means
/// the widget did not consume it.
fn route_widget_key(
    cx: &mut RouterCx<'_>,
    id: &str,
    key: u16,
    mods: u8,
    time_ms: u64,
) -> Option<RouteOutcome> {
    let inst = cx.root.find_by_widget_id(id)?;
    let node = inst.node.clone();
    let rect = find_rect_by_id(cx.root, cx.layout, id).unwrap_or_default();
    match &node {
        VNode::Input(p) => {
            if p.disabled {
                return None;
            }
            let editor = cx
                .stores
                .editors
                .entry(id.to_string())
                .or_insert_with(|| InputEditor::new(&p.value));
            editor.sync_value(&p.value);
            let out = editor.route_key(key, mods, time_ms);
            if !out.consumed {
                return None;
            }
            if out.submitted {
                return Some(RouteOutcome::action(Action::InputSubmitted {
                    id: id.to_string(),
                    value: editor.value().to_string(),
                }));
            }
            if out.changed {
                return Some(RouteOutcome::action(Action::InputChanged {
                    id: id.to_string(),
                    value: editor.value().to_string(),
                }));
            }
            Some(RouteOutcome::none())
        }
        VNode::VirtualList(p) => {
            let state = cx.stores.vlists.entry(id.to_string()).or_default();
            let out = route_virtual_list_key(state, p, rect.h, key);
            consumed_or_none(out, key)
        }
        VNode::Table(p) => {
            let state = cx.stores.tables.entry(id.to_string()).or_default();
            let viewport = (rect.h - i32::from(p.show_header)).max(1);
            let out = route_table_key(state, p, viewport, key);
            consumed_or_none(out, key)
        }
        VNode::Tree(p) => {
            let state = cx.stores.trees.entry(id.to_string()).or_default();
            let out = route_tree_key(state, p, rect.h, key);
            consumed_or_none(out, key)
        }
        VNode::FileTreeExplorer(p) => {
            let tree_props = crate::props::TreeProps {
                common: p.common.clone(),
                id: p.id.clone(),
                nodes: p.nodes.clone(),
                lazy: false,
            };
            let state = cx.stores.trees.entry(id.to_string()).or_default();
            let out = route_tree_key(state, &tree_props, rect.h, key);
            consumed_or_none(out, key)
        }
        VNode::CommandPalette(p) => {
            let out = route_palette_key(p, key);
            if out.action.is_some() {
                cx.chords.reset();
                return Some(out);
            }
            // An open palette swallows its navigation keys either way.
            if p.open
                && matches!(
                    key,
                    keys::UP | keys::DOWN | keys::TAB | keys::ENTER | keys::ESCAPE | keys::BACKSPACE
                )
            {
                return Some(RouteOutcome::none());
            }
            None
        }
        VNode::Select(p) => {
            if p.disabled {
                return None;
            }
            let last = p.options.len().saturating_sub(1);
            let next = match key {
                keys::LEFT | keys::UP => p.selected.saturating_sub(1),
                keys::RIGHT | keys::DOWN => (p.selected + 1).min(last),
                _ => return None,
            };
            if next == p.selected {
                return Some(RouteOutcome::none());
            }
            Some(RouteOutcome::action(Action::Select {
                id: id.to_string(),
                index: next,
            }))
        }
        VNode::Checkbox(p) => {
            if p.disabled || !matches!(key, keys::SPACE | keys::ENTER) {
                return None;
            }
            Some(RouteOutcome::action(Action::Toggle {
                id: id.to_string(),
                checked: !p.checked,
            }))
        }
        VNode::RadioGroup(p) => {
            if p.disabled {
                return None;
            }
            let last = p.options.len().saturating_sub(1);
            let next = match key {
                keys::UP => p.selected.saturating_sub(1),
                keys::DOWN => (p.selected + 1).min(last),
                _ => return None,
            };
            if next == p.selected {
                return Some(RouteOutcome::none());
            }
            Some(RouteOutcome::action(Action::Select {
                id: id.to_string(),
                index: next,
            }))
        }
        VNode::Dropdown(p) => {
            if p.disabled || !p.open {
                return None;
            }
            let last = p.items.len().saturating_sub(1);
            match key {
                keys::UP => Some(RouteOutcome::action(Action::Select {
                    id: id.to_string(),
                    index: p.selected.saturating_sub(1),
                })),
                keys::DOWN => Some(RouteOutcome::action(Action::Select {
                    id: id.to_string(),
                    index: (p.selected + 1).min(last),
                })),
                keys::ENTER => Some(RouteOutcome::action(Action::Press {
                    id: id.to_string(),
                    mods,
                })),
                _ => None,
            }
        }
        VNode::FilePicker(p) => {
            let state = cx.stores.vlists.entry(id.to_string()).or_default();
            let last = p.entries.len().saturating_sub(1);
            match key {
                keys::UP => {
                    state.selected_index = state.selected_index.saturating_sub(1);
                    Some(RouteOutcome::render())
                }
                keys::DOWN => {
                    state.selected_index = (state.selected_index + 1).min(last);
                    Some(RouteOutcome::render())
                }
                keys::ENTER => p.entries.get(state.selected_index).map(|entry| {
                    RouteOutcome::action(Action::FileOpened {
                        id: id.to_string(),
                        path: entry.path.clone(),
                    })
                }),
                _ => None,
            }
        }
        VNode::ToolApprovalDialog(_) => match key {
            k if k == keys::from_char('y').unwrap_or(0) || k == keys::ENTER => Some(
                RouteOutcome::action(Action::Approval {
                    id: id.to_string(),
                    approved: true,
                }),
            ),
            k if k == keys::from_char('n').unwrap_or(0) => Some(RouteOutcome::action(
                Action::Approval {
                    id: id.to_string(),
                    approved: false,
                },
            )),
            _ => None,
        },
        VNode::LogsConsole(p) => {
            route_line_scroll_key(cx, id, p.lines.len() as i32, rect.h, key)
        }
        VNode::CodeEditor(p) => route_line_scroll_key(cx, id, p.lines.len() as i32, rect.h, key),
        VNode::DiffViewer(p) => route_line_scroll_key(cx, id, p.lines.len() as i32, rect.h, key),
        _ => None,
    }
}

/// Arrow/page scrolling for read-only line widgets (logs, code, diffs).
fn route_line_scroll_key(
    cx: &mut RouterCx<'_>,
    id: &str,
    content: i32,
    viewport: i32,
    key: u16,
) -> Option<RouteOutcome> {
    let delta = match key {
        keys::UP => -1,
        keys::DOWN => 1,
        keys::PAGE_UP => -viewport.max(1),
        keys::PAGE_DOWN => viewport.max(1),
        keys::HOME => i32::MIN / 2,
        keys::END => i32::MAX / 2,
        _ => return None,
    };
    Some(scroll_lines_store(cx, id, content, viewport, delta))
}

fn scroll_lines_store(
    cx: &mut RouterCx<'_>,
    id: &str,
    content: i32,
    viewport: i32,
    delta: i32,
) -> RouteOutcome {
    let state = cx.stores.vlists.entry(id.to_string()).or_default();
    let max = (content - viewport).max(0);
    let next = state.scroll_top.saturating_add(delta).clamp(0, max);
    if next == state.scroll_top {
        return RouteOutcome::none();
    }
    state.scroll_top = next;
    RouteOutcome::render()
}

fn consumed_or_none(out: RouteOutcome, key: u16) -> Option<RouteOutcome> {
    // Collection routers claim their navigation keys even at the ends of
    // the list, so focus does not jump away mid-scroll.
    let claims = matches!(
        key,
        keys::UP
            | keys::DOWN
            | keys::LEFT
            | keys::RIGHT
            | keys::HOME
            | keys::END
            | keys::PAGE_UP
            | keys::PAGE_DOWN
            | keys::ENTER
            | keys::SPACE
    );
    if out.needs_render || out.action.is_some() || claims {
        Some(out)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Text and paste
// ---------------------------------------------------------------------------

fn route_text(cx: &mut RouterCx<'_>, ch: char, time_ms: u64) -> RouteOutcome {
    let Some(id) = cx.focus.focused_id.clone() else {
        return RouteOutcome::none();
    };
    let Some(inst) = cx.root.find_by_widget_id(&id) else {
        return RouteOutcome::none();
    };
    match &inst.node {
        VNode::Input(p) => {
            if p.disabled || ch.is_control() {
                return RouteOutcome::none();
            }
            let value = p.value.clone();
            let editor = cx
                .stores
                .editors
                .entry(id.clone())
                .or_insert_with(|| InputEditor::new(&value));
            editor.sync_value(&value);
            editor.insert_char(ch, time_ms);
            RouteOutcome::action(Action::InputChanged {
                id,
                value: editor.value().to_string(),
            })
        }
        VNode::CommandPalette(p) => {
            if ch.is_control() {
                return RouteOutcome::none();
            }
            route_palette_text(p, ch)
        }
        _ => RouteOutcome::none(),
    }
}

fn route_paste(cx: &mut RouterCx<'_>, text: &str, time_ms: u64) -> RouteOutcome {
    let Some(id) = cx.focus.focused_id.clone() else {
        return RouteOutcome::none();
    };
    let Some(inst) = cx.root.find_by_widget_id(&id) else {
        return RouteOutcome::none();
    };
    match &inst.node {
        VNode::Input(p) if !p.disabled => {
            let value = p.value.clone();
            let editor = cx
                .stores
                .editors
                .entry(id.clone())
                .or_insert_with(|| InputEditor::new(&value));
            editor.sync_value(&value);
            editor.insert_str(text, time_ms);
            RouteOutcome::action(Action::InputChanged {
                id,
                value: editor.value().to_string(),
            })
        }
        _ => RouteOutcome::none(),
    }
}

fn find_subtree<'a>(
    inst: &'a RuntimeInstance,
    layout: &'a LayoutNode,
    id: &str,
) -> Option<(&'a RuntimeInstance, &'a LayoutNode)> {
    if inst.node.widget_id() == Some(id) {
        return Some((inst, layout));
    }
    inst.children
        .iter()
        .zip(&layout.children)
        .find_map(|(c, l)| find_subtree(c, l, id))
}
