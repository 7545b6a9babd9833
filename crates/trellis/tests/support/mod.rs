//! Shared fixture for routing tests: a committed, laid-out tree plus
//! the mutable routing state, driven event by event.

use trellis::commit::{CommitCx, commit_vnode_tree};
use trellis::input::chords::ChordManager;
use trellis::input::{LocalStores, RouterCx, route_engine_event};
use trellis::instance::IdAllocator;
use trellis::layers::{LayerRegistry, LayerStackState};
use trellis::layout::layout_tree;
use trellis::{
    Action, FocusState, Invalidate, LayoutNode, RouteOutcome, RuntimeInstance, Size, VNode,
};
use twire::events::{EngineEvent, EventKind, KeyAction, MouseKind};

pub struct Fixture {
    pub root: RuntimeInstance,
    pub layout: LayoutNode,
    pub viewport: Size,
    pub focus: FocusState,
    pub layers: LayerRegistry,
    pub stack: LayerStackState,
    pub stores: LocalStores,
    pub chords: ChordManager,
    pub pressed: Option<String>,
    allocator: IdAllocator,
}

impl Fixture {
    pub fn new(view: &VNode, cols: u16, rows: u16) -> Self {
        let mut allocator = IdAllocator::new();
        let mut cx = CommitCx::new(&mut allocator, Invalidate::new());
        let root = commit_vnode_tree(None, view, &mut cx).expect("commit");
        let viewport = Size::new(cols, rows);
        let layout = layout_tree(&root, viewport).expect("layout");
        Self {
            root,
            layout,
            viewport,
            focus: FocusState::default(),
            layers: LayerRegistry::new(),
            stack: LayerStackState::new(),
            stores: LocalStores::new(),
            chords: ChordManager::new(),
            pressed: None,
            allocator,
        }
    }

    /// Commits a new view (host state moved on) and relays out. Widget
    /// stores survive because they are keyed by widget id.
    pub fn update_view(&mut self, view: &VNode) {
        let mut cx = CommitCx::new(&mut self.allocator, Invalidate::new());
        self.root = commit_vnode_tree(None, view, &mut cx).expect("recommit");
        self.layout = layout_tree(&self.root, self.viewport).expect("relayout");
    }

    pub fn route(&mut self, event: &EngineEvent) -> RouteOutcome {
        let mut cx = RouterCx {
            root: &self.root,
            layout: &self.layout,
            viewport: &mut self.viewport,
            focus: &mut self.focus,
            layers: &self.layers,
            layer_stack: &mut self.stack,
            stores: &mut self.stores,
            chords: &mut self.chords,
            pressed: &mut self.pressed,
        };
        route_engine_event(&mut cx, event)
    }

    /// Routes and returns only the published action, if any.
    pub fn action_of(&mut self, event: &EngineEvent) -> Option<Action> {
        self.route(event).action
    }

    pub fn focused(&self) -> Option<&str> {
        self.focus.focused_id.as_deref()
    }
}

pub fn key_down(time_ms: u64, key: u16, mods: u8) -> EngineEvent {
    EngineEvent {
        time_ms,
        kind: EventKind::Key {
            key,
            mods,
            action: KeyAction::Down,
        },
    }
}

pub fn text_event(time_ms: u64, ch: char) -> EngineEvent {
    EngineEvent {
        time_ms,
        kind: EventKind::Text {
            codepoint: ch as u32,
        },
    }
}

pub fn mouse_event(time_ms: u64, x: i32, y: i32, kind: MouseKind, mods: u8) -> EngineEvent {
    EngineEvent {
        time_ms,
        kind: EventKind::Mouse {
            x,
            y,
            kind,
            mods,
            buttons: 1,
            wheel_x: 0,
            wheel_y: 0,
        },
    }
}

pub fn wheel_event(time_ms: u64, x: i32, y: i32, wheel_y: i32) -> EngineEvent {
    EngineEvent {
        time_ms,
        kind: EventKind::Mouse {
            x,
            y,
            kind: MouseKind::Wheel,
            mods: 0,
            buttons: 0,
            wheel_x: 0,
            wheel_y,
        },
    }
}
