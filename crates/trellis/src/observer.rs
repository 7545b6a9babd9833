//! Render observers (breadcrumbs).
//!
//! A pluggable observer receives a snapshot after each render. Enabling
//! an observer never alters routing or rendering outcomes; when unset
//! the runtime pays nothing.

/// Focus portion of a breadcrumb.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FocusSnapshot {
    pub focused_id: Option<String>,
    pub active_zone_id: Option<String>,
    pub active_trap_id: Option<String>,
    pub announcement: Option<String>,
}

/// Frame statistics portion of a breadcrumb.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub committed: bool,
    pub laid_out: bool,
    pub incremental: bool,
    pub render_time_ms: u64,
}

/// Snapshot published after each render.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameBreadcrumb {
    /// Kind of the event that triggered the frame, when one did.
    pub event_kind: Option<String>,
    pub focus: FocusSnapshot,
    pub cursor: Option<(i32, i32)>,
    /// `"full"` or `"rect"`.
    pub damage_mode: &'static str,
    pub frame: FrameStats,
    pub last_action: Option<String>,
}

/// Observer trait; all hooks default to no-ops.
pub trait RenderObserver {
    fn on_render(&mut self, _crumb: &FrameBreadcrumb) {}
    fn on_layout(&mut self, _checksum: u64) {}
}

/// Collects breadcrumbs in memory, for tests and debug tooling.
#[derive(Default)]
pub struct CollectingObserver {
    pub renders: Vec<FrameBreadcrumb>,
    pub layouts: Vec<u64>,
}

impl RenderObserver for CollectingObserver {
    fn on_render(&mut self, crumb: &FrameBreadcrumb) {
        self.renders.push(crumb.clone());
    }

    fn on_layout(&mut self, checksum: u64) {
        self.layouts.push(checksum);
    }
}
