//! Trellis: a frame-driven terminal UI runtime.
//!
//! Applications declare state, produce a [`VNode`] tree from it, and the
//! runtime commits the tree into stable instances, lays it out on a
//! character grid, serializes it into a binary drawlist for a terminal
//! engine, routes input events into widgets, and manages overlays,
//! focus, and animation. Given the same state and event stream, the same
//! drawlist bytes come out.
//!
//! Data flow:
//!
//! ```text
//! State -> view() -> VNode tree -> commit() -> Instance tree
//!       -> layout() -> LayoutTree -> render() -> Drawlist bytes -> Backend
//! ```
//!
//! Events flow back from the backend through the router into focus
//! state, widget stores, and typed [`Action`]s the host maps onto state
//! updates.

pub mod action;
pub mod app;
pub mod backend;
pub mod backend_term;
pub mod commit;
pub mod error;
pub mod focus;
pub mod geometry;
pub mod glyph;
pub mod hooks;
pub mod input;
pub mod instance;
pub mod layers;
pub mod layout;
mod log_init;
pub mod observer;
pub mod props;
pub mod render;
pub mod testing;
pub mod vnode;

pub use action::{Action, RouteOutcome};
pub use app::{App, AppConfig, Command, DispatchHandle, Flow};
pub use backend::{ExecutionMode, RuntimeBackend, TerminalCaps, TerminalProfile};
pub use backend_term::TermBackend;
pub use commit::{CommitCx, commit_vnode_tree};
pub use error::{Result, RuntimeError};
pub use focus::{FocusDir, FocusState, compute_focus_list, compute_moved_focus_id};
pub use geometry::{Rect, Size};
pub use hooks::{Cleanup, Dep, HookCx, Invalidate, Setter};
pub use instance::{IdAllocator, InstanceId, RuntimeInstance};
pub use layers::{Layer, LayerRegistry, LayerStackState};
pub use layout::{LayoutNode, ScrollMeta, checksum, hit_test_focusable, layout_tree};
pub use log_init::init_logger;
pub use observer::{CollectingObserver, FrameBreadcrumb, RenderObserver};
pub use props::*;
pub use render::{RenderParams, render_to_drawlist};
pub use vnode::{NodeKind, VNode};

// Re-export the log crate so hosts can use trellis::log::info!, etc.
pub use log;
pub use tstyle::{self, ResolvedStyle, Rgb, Theme};
pub use twire::{self, keys};
