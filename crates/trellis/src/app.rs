//! The application scheduler: state ownership, the frame loop,
//! backpressure, ticks, and hook effects.
//!
//! Frame body: evaluate the view, commit, finalize focus, lay out,
//! render, submit to the backend, and only after the ack run the pending
//! hook cleanups and then the new effects. A second frame may be
//! requested while one is unacked only as a one-shot interactive
//! overcommit; everything else waits for the ack.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::sync::mpsc;
use tstyle::{StyleCache, Theme};
use twire::events::{EngineEvent, EventKind};
use twire::{DrawlistBuilder, EventDecoder};

use crate::action::Action;
use crate::backend::{
    BackendHandle, BackendMsg, BackendReply, ExecutionMode, RuntimeBackend, spawn_backend,
    validate_caps,
};
use crate::commit::{CommitCx, commit_vnode_tree};
use crate::error::{Result, RuntimeError};
use crate::focus::{FocusState, active_trap_id, active_zone_id, compute_focus_list,
    finalize_focus_for_committed_tree};
use crate::geometry::Size;
use crate::hooks::{Invalidate, PendingCleanup, PendingEffect};
use crate::input::chords::ChordManager;
use crate::input::{LocalStores, RouterCx, route_engine_event};
use crate::instance::{IdAllocator, RuntimeInstance};
use crate::layers::{Layer, LayerRegistry, LayerStackState};
use crate::layout::{LayoutNode, checksum, layout_tree};
use crate::observer::{FocusSnapshot, FrameBreadcrumb, FrameStats, RenderObserver};
use crate::render::{RenderParams, SPINNER_TICK_MS, render_to_drawlist};
use crate::vnode::VNode;

/// Hard ceiling on the per-batch event byte budget.
const MAX_EVENT_BYTES_CEILING: u32 = 4 * 1024 * 1024;

/// Runtime configuration (spec'd keys plus the theme).
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub max_frames_in_flight: u32,
    pub max_event_bytes: u32,
    pub fps_cap: u16,
    pub execution_mode: ExecutionMode,
    pub use_v2_cursor: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_frames_in_flight: 1,
            max_event_bytes: 1 << 20,
            fps_cap: 60,
            execution_mode: ExecutionMode::Inline,
            use_v2_cursor: true,
        }
    }
}

/// What the host's `update` tells the scheduler to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A deferred state mutation: a replacement value, an updater over the
/// previous state, or a thunk that may dispatch more of either (possibly
/// from async tasks).
pub enum Command<S> {
    Set(S),
    Update(Box<dyn FnOnce(&S) -> S + Send>),
    Thunk(Box<dyn FnOnce(DispatchHandle<S>) + Send>),
    /// Requests a focus move, applied after the next commit.
    Focus(Option<String>),
    /// Marks a lazy tree load complete; stale tokens are discarded.
    TreeLoaded { id: String, key: String, token: u64 },
}

/// Cloneable dispatcher usable from thunks and async tasks.
pub struct DispatchHandle<S> {
    tx: mpsc::UnboundedSender<Command<S>>,
}

impl<S> Clone for DispatchHandle<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S: Send + 'static> DispatchHandle<S> {
    pub fn dispatch(&self, command: Command<S>) {
        let _ = self.tx.send(command);
    }

    pub fn set(&self, state: S) {
        self.dispatch(Command::Set(state));
    }

    pub fn update(&self, f: impl FnOnce(&S) -> S + Send + 'static) {
        self.dispatch(Command::Update(Box::new(f)));
    }

    pub fn thunk(&self, f: impl FnOnce(DispatchHandle<S>) + Send + 'static) {
        self.dispatch(Command::Thunk(Box::new(f)));
    }

    pub fn focus(&self, id: Option<String>) {
        self.dispatch(Command::Focus(id));
    }
}

type ViewFn<S> = Box<dyn FnMut(&S) -> VNode>;
type UpdateFn<S> = Box<dyn FnMut(&mut S, &Action) -> Flow>;

/// The application runtime. Owns the state, the committed tree, focus,
/// layers, local widget stores, and the backend connection.
pub struct App<S, B> {
    state: S,
    view: ViewFn<S>,
    update: UpdateFn<S>,
    backend: Option<B>,
    config: AppConfig,
    theme: Theme,
    observer: Option<Box<dyn RenderObserver>>,
    no_color: bool,

    allocator: IdAllocator,
    invalidate: Invalidate,
    root: Option<RuntimeInstance>,
    layout: Option<LayoutNode>,
    viewport: Size,
    focus: FocusState,
    layers: LayerRegistry,
    layer_stack: LayerStackState,
    stores: LocalStores,
    chords: ChordManager,
    pressed: Option<String>,
    builder: DrawlistBuilder,
    style_cache: StyleCache,
    decoder: EventDecoder,

    pending_effects: VecDeque<(u64, PendingEffect)>,
    pending_cleanups: VecDeque<(u64, PendingCleanup)>,
    frames_submitted: u64,
    frames_acked: u64,
    frames_in_flight: u32,
    overcommitted: bool,
    pending_render: bool,
    has_animated: bool,
    last_anim_ms: u64,
    last_action: Option<String>,

    command_tx: mpsc::UnboundedSender<Command<S>>,
    command_rx: mpsc::UnboundedReceiver<Command<S>>,
}

impl<S, B> App<S, B>
where
    S: Clone + PartialEq + Send + 'static,
    B: RuntimeBackend + 'static,
{
    pub fn new(
        state: S,
        view: impl FnMut(&S) -> VNode + 'static,
        update: impl FnMut(&mut S, &Action) -> Flow + 'static,
        backend: B,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let config = AppConfig::default();
        Self {
            state,
            view: Box::new(view),
            update: Box::new(update),
            backend: Some(backend),
            builder: DrawlistBuilder::new(if config.use_v2_cursor { 2 } else { 1 }),
            config,
            theme: Theme::default(),
            observer: None,
            no_color: std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()),
            allocator: IdAllocator::new(),
            invalidate: Invalidate::new(),
            root: None,
            layout: None,
            viewport: Size::new(80, 24),
            focus: FocusState::default(),
            layers: LayerRegistry::new(),
            layer_stack: LayerStackState::new(),
            stores: LocalStores::new(),
            chords: ChordManager::new(),
            pressed: None,
            style_cache: StyleCache::new(),
            decoder: EventDecoder::new(),
            pending_effects: VecDeque::new(),
            pending_cleanups: VecDeque::new(),
            frames_submitted: 0,
            frames_acked: 0,
            frames_in_flight: 0,
            overcommitted: false,
            pending_render: false,
            has_animated: false,
            last_anim_ms: 0,
            last_action: None,
            command_tx,
            command_rx,
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.builder = DrawlistBuilder::new(if config.use_v2_cursor { 2 } else { 1 });
        self.config = config;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn RenderObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Registers a global chord binding (`"ctrl+k ctrl+c"`, `"g g"`).
    pub fn bind_chord(&mut self, sequence: &str, tag: impl Into<String>) -> Result<()> {
        self.chords.bind(sequence, tag)
    }

    /// Whether the `NO_COLOR` environment variable was set. The renderer
    /// keeps emitting colors; honoring this is the host's choice.
    pub fn no_color(&self) -> bool {
        self.no_color
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn handle(&self) -> DispatchHandle<S> {
        DispatchHandle {
            tx: self.command_tx.clone(),
        }
    }

    /// Runs the event loop, creating a runtime if necessary.
    ///
    /// From inside a multi-thread Tokio runtime the loop blocks in
    /// place; from a current-thread runtime use [`Self::run_async`]
    /// instead (blocking there would deadlock).
    pub fn run(&mut self) -> Result<()> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => match handle.runtime_flavor() {
                tokio::runtime::RuntimeFlavor::MultiThread => {
                    tokio::task::block_in_place(|| handle.block_on(self.run_async()))
                }
                _ => Err(RuntimeError::internal(
                    "cannot call run() from a current-thread runtime; use run_async().await",
                )),
            },
            Err(_) => {
                let rt = tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| RuntimeError::internal(e.to_string()))?;
                rt.block_on(self.run_async())
            }
        }
    }

    /// Runs the event loop on the current executor.
    pub async fn run_async(&mut self) -> Result<()> {
        let mut backend = self
            .backend
            .take()
            .ok_or_else(|| RuntimeError::internal("app already running"))?;

        if self.config.max_event_bytes > MAX_EVENT_BYTES_CEILING {
            return Err(RuntimeError::invalid_props(format!(
                "config.maxEventBytes {} exceeds the 4 MiB ceiling",
                self.config.max_event_bytes
            )));
        }
        let caps = backend.caps().await?;
        validate_caps(
            &caps,
            self.config.max_event_bytes,
            self.config.fps_cap,
            self.config.use_v2_cursor,
        )?;
        if self.config.fps_cap > 1000 {
            return Err(RuntimeError::invalid_props("config.fpsCap exceeds 1000"));
        }
        self.viewport = Size::new(caps.cols, caps.rows);
        backend.start().await?;
        let mut handle = spawn_backend(backend, self.config.execution_mode);

        let result = self.event_loop(&mut handle).await;

        // Teardown: reverse-DFS hook cleanups, then stop the backend.
        self.teardown_tree();
        let _ = handle.tx.send(BackendMsg::Stop).await;
        while let Some(reply) = handle.rx.recv().await {
            if matches!(reply, BackendReply::Stopped) {
                break;
            }
        }
        result
    }

    async fn event_loop(&mut self, handle: &mut BackendHandle) -> Result<()> {
        // Initial frame.
        if let Err(err) = self.do_frame(handle, None).await {
            return self.to_fatal(err).map(|_| ());
        }

        loop {
            enum Step<S> {
                Reply(BackendReply),
                Command(Command<S>),
                Closed,
            }
            // Biased: queued commands (focus requests, dispatched state)
            // apply before the next backend reply, which keeps replays
            // deterministic.
            let step = tokio::select! {
                biased;
                command = self.command_rx.recv() => match command {
                    Some(c) => Step::Command(c),
                    None => Step::Closed,
                },
                reply = handle.rx.recv() => match reply {
                    Some(r) => Step::Reply(r),
                    None => Step::Closed,
                },
            };
            let flow = match step {
                Step::Closed => {
                    return Err(RuntimeError::internal("backend channel closed"));
                }
                Step::Reply(BackendReply::Stopped) => return Ok(()),
                Step::Reply(BackendReply::Failed(detail)) => {
                    return self.to_fatal(RuntimeError::BackendPlatform { detail }).map(|_| ());
                }
                Step::Reply(BackendReply::FrameAcked) => {
                    self.on_frame_acked(handle).await?
                }
                Step::Reply(BackendReply::Events(bytes)) => {
                    self.on_event_batch(handle, bytes).await?
                }
                Step::Command(command) => self.on_command(handle, command).await?,
            };
            if flow == Flow::Exit {
                return Ok(());
            }
        }
    }

    async fn on_frame_acked(&mut self, handle: &mut BackendHandle) -> Result<Flow> {
        self.frames_in_flight = self.frames_in_flight.saturating_sub(1);
        self.frames_acked += 1;
        if self.frames_in_flight < self.config.max_frames_in_flight {
            self.overcommitted = false;
        }
        // Only the acked frame's queue entries fire: cleanups of the
        // previous cycle first, then the new effects, each error-isolated.
        while self
            .pending_cleanups
            .front()
            .is_some_and(|(frame, _)| *frame <= self.frames_acked)
        {
            let (_, cleanup) = self.pending_cleanups.pop_front().expect("checked front");
            if catch_unwind(AssertUnwindSafe(|| (cleanup.run)())).is_err() {
                log::error!("hook cleanup threw; continuing");
            }
        }
        while self
            .pending_effects
            .front()
            .is_some_and(|(frame, _)| *frame <= self.frames_acked)
        {
            let (_, effect) = self.pending_effects.pop_front().expect("checked front");
            let state = effect.state.clone();
            let slot = effect.slot;
            match catch_unwind(AssertUnwindSafe(|| (effect.run)())) {
                Ok(cleanup) => state.borrow_mut().store_cleanup(slot, cleanup),
                Err(_) => log::error!("hook effect threw; continuing"),
            }
        }
        if self.invalidate.take() || self.pending_render {
            self.pending_render = false;
            self.request_render(handle, false, None).await?;
        }
        Ok(Flow::Continue)
    }

    async fn on_event_batch(&mut self, handle: &mut BackendHandle, bytes: Vec<u8>) -> Result<Flow> {
        if bytes.is_empty() {
            // Backend shutdown signal.
            return Ok(Flow::Exit);
        }
        let events = match self
            .decoder
            .decode_batch(&bytes, self.config.max_event_bytes as usize)
        {
            Ok(events) => events,
            Err(err) => {
                log::error!("event batch decode failed: {err}");
                return Ok(Flow::Continue);
            }
        };
        for event in events {
            let flow = self.handle_event(handle, &event).await?;
            if flow == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    async fn handle_event(
        &mut self,
        handle: &mut BackendHandle,
        event: &EngineEvent,
    ) -> Result<Flow> {
        if let EventKind::Tick { .. } = event.kind {
            // Tick frames only flow while an animated widget is mounted,
            // throttled to the animation period.
            if self.has_animated
                && event.time_ms.saturating_sub(self.last_anim_ms) >= SPINNER_TICK_MS
            {
                self.last_anim_ms = event.time_ms;
                self.request_render(handle, false, Some("tick")).await?;
            }
            return Ok(Flow::Continue);
        }

        let (Some(root), Some(layout)) = (&self.root, &self.layout) else {
            log::debug!("event before first frame; dropped");
            return Ok(Flow::Continue);
        };
        let mut cx = RouterCx {
            root,
            layout,
            viewport: &mut self.viewport,
            focus: &mut self.focus,
            layers: &self.layers,
            layer_stack: &mut self.layer_stack,
            stores: &mut self.stores,
            chords: &mut self.chords,
            pressed: &mut self.pressed,
        };
        let outcome = route_engine_event(&mut cx, event);
        let interactive = matches!(
            event.kind,
            EventKind::Key { .. }
                | EventKind::Text { .. }
                | EventKind::Mouse { .. }
                | EventKind::Paste { .. }
                | EventKind::Resize { .. }
        );
        let event_kind = Some(kind_name(&event.kind));

        let mut needs_render = outcome.needs_render;
        let mut flow = Flow::Continue;
        if let Some(action) = outcome.action {
            if let Action::Fatal { code, detail } = &action {
                let _ = (self.update)(&mut self.state, &action);
                return Err(RuntimeError::Internal {
                    detail: format!("{code}: {detail}"),
                });
            }
            self.last_action = Some(format!("{action:?}"));
            let before = self.state.clone();
            flow = (self.update)(&mut self.state, &action);
            if self.state != before {
                needs_render = true;
            }
        }
        if needs_render {
            self.request_render(handle, interactive, event_kind.as_deref())
                .await?;
        }
        Ok(flow)
    }

    async fn on_command(&mut self, handle: &mut BackendHandle, command: Command<S>) -> Result<Flow> {
        match command {
            Command::Set(next) => {
                if self.state != next {
                    self.state = next;
                    self.request_render(handle, false, None).await?;
                }
            }
            Command::Update(f) => {
                let next = f(&self.state);
                // An updater producing an equal state does not invalidate.
                if self.state != next {
                    self.state = next;
                    self.request_render(handle, false, None).await?;
                }
            }
            Command::Thunk(f) => {
                f(self.handle());
            }
            Command::Focus(id) => {
                self.focus.request_focus(id);
                self.request_render(handle, false, None).await?;
            }
            Command::TreeLoaded { id, key, token } => {
                let accepted = self
                    .stores
                    .trees
                    .entry(id)
                    .or_default()
                    .complete_load(&key, token);
                if accepted {
                    self.request_render(handle, false, None).await?;
                }
            }
        }
        Ok(Flow::Continue)
    }

    /// Applies the backpressure policy, deferring or overcommitting.
    async fn request_render(
        &mut self,
        handle: &mut BackendHandle,
        interactive: bool,
        event_kind: Option<&str>,
    ) -> Result<()> {
        if self.frames_in_flight >= self.config.max_frames_in_flight {
            if interactive && !self.overcommitted {
                self.overcommitted = true;
            } else {
                self.pending_render = true;
                return Ok(());
            }
        }
        match self.do_frame(handle, event_kind).await {
            Ok(()) => Ok(()),
            Err(err) => self.to_fatal(err).map(|_| ()),
        }
    }

    /// One full frame: view → commit → focus → layout → render → submit.
    async fn do_frame(&mut self, handle: &mut BackendHandle, event_kind: Option<&str>) -> Result<()> {
        let started = std::time::Instant::now();

        let view = match catch_unwind(AssertUnwindSafe(|| (self.view)(&self.state))) {
            Ok(view) => view,
            Err(payload) => {
                return Err(RuntimeError::UserCode {
                    detail: panic_text(&payload),
                });
            }
        };

        let prev = self.root.take();
        let mut cx = CommitCx::new(&mut self.allocator, self.invalidate.clone());
        let root = commit_vnode_tree(prev, &view, &mut cx)?;
        let frame = self.frames_submitted + 1;
        self.pending_cleanups
            .extend(cx.pending_cleanups.into_iter().map(|c| (frame, c)));
        self.pending_effects
            .extend(cx.pending_effects.into_iter().map(|e| (frame, e)));
        self.has_animated = root.has_animated();

        let layout = layout_tree(&root, self.viewport)?;
        let focus_list = compute_focus_list(&root, &layout);
        let focus_changed = finalize_focus_for_committed_tree(&mut self.focus, &focus_list);
        if focus_changed {
            // Announcements name the active trap so screen-reader hosts
            // can report the confinement.
            if let (Some(trap), Some(announcement)) =
                (active_trap_id(&root), self.focus.announcement.as_mut())
            {
                announcement.push_str(&format!(" (trap {trap})"));
            }
        }
        self.sync_layers(&root, &layout);
        let alive_root = &root;
        self.stores
            .retain_ids(&|id| alive_root.find_by_widget_id(id).is_some());

        if let Some(observer) = &mut self.observer {
            observer.on_layout(checksum(&layout));
        }

        self.builder.reset();
        let params = RenderParams {
            root: &root,
            layout: &layout,
            viewport: self.viewport,
            focus: &self.focus,
            stores: &self.stores,
            theme: &self.theme,
            tick_ms: self.last_anim_ms,
            damage: None,
        };
        let cursor = render_to_drawlist(&params, &mut self.builder, &mut self.style_cache)?;
        let bytes = self.builder.build()?.to_vec();

        if handle.tx.send(BackendMsg::Frame(bytes)).await.is_err() {
            return Err(RuntimeError::internal("backend task gone"));
        }
        self.frames_in_flight += 1;
        self.frames_submitted += 1;

        if let Some(observer) = &mut self.observer {
            let crumb = FrameBreadcrumb {
                event_kind: event_kind.map(String::from),
                focus: FocusSnapshot {
                    focused_id: self.focus.focused_id.clone(),
                    active_zone_id: self
                        .focus
                        .focused_id
                        .as_deref()
                        .and_then(|id| active_zone_id(&root, id)),
                    active_trap_id: active_trap_id(&root),
                    announcement: self.focus.announcement.clone(),
                },
                cursor: cursor.map(|c| (c.x, c.y)),
                damage_mode: "full",
                frame: FrameStats {
                    committed: true,
                    laid_out: true,
                    incremental: false,
                    render_time_ms: started.elapsed().as_millis() as u64,
                },
                last_action: self.last_action.clone(),
            };
            observer.on_render(&crumb);
        }

        self.root = Some(root);
        self.layout = Some(layout);

        // A setter fired during commit: resolve with one more frame
        // after this one acks.
        if self.invalidate.take() {
            self.pending_render = true;
        }
        Ok(())
    }

    /// Rebuilds the layer registry from the committed tree and keeps the
    /// ESC-close stack in sync: newly-opened layers push on top, closed
    /// layers leave, layers open across frames keep their stack order.
    fn sync_layers(&mut self, root: &RuntimeInstance, layout: &LayoutNode) {
        self.layers.clear();
        collect_layers(root, layout, &mut self.layers);
        let alive: Vec<(String, bool)> = self
            .layers
            .in_paint_order()
            .map(|l| (l.id.clone(), l.close_on_escape))
            .collect();
        for id in self.layer_stack.ids() {
            if !alive.iter().any(|(a, _)| *a == id) {
                self.layer_stack.pop_layer(&id);
            }
        }
        for (id, close_on_escape) in alive {
            if !self.layer_stack.contains(&id) {
                self.layer_stack.push_layer(id, close_on_escape);
            }
        }
    }

    /// Publishes a fatal, then converts the error for the caller.
    fn to_fatal(&mut self, err: RuntimeError) -> Result<Flow> {
        let action = Action::Fatal {
            code: fatal_code(&err).to_string(),
            detail: err.to_string(),
        };
        let _ = (self.update)(&mut self.state, &action);
        Err(err)
    }

    /// Reverse-DFS teardown of the whole tree; cleanup errors are
    /// isolated and logged.
    fn teardown_tree(&mut self) {
        for (_, cleanup) in self.pending_cleanups.drain(..) {
            if catch_unwind(AssertUnwindSafe(|| (cleanup.run)())).is_err() {
                log::error!("teardown cleanup threw; continuing");
            }
        }
        self.pending_effects.clear();
        if let Some(root) = self.root.take() {
            let mut stack = vec![root];
            let mut cleanups = Vec::new();
            while let Some(mut inst) = stack.pop() {
                if let Some(state) = &inst.composite {
                    cleanups.extend(state.borrow_mut().take_cleanups_reversed());
                }
                stack.extend(inst.children.drain(..));
            }
            for cleanup in cleanups.into_iter().rev() {
                if catch_unwind(AssertUnwindSafe(cleanup)).is_err() {
                    log::error!("teardown cleanup threw; continuing");
                }
            }
        }
    }
}

fn collect_layers(inst: &RuntimeInstance, layout: &LayoutNode, registry: &mut LayerRegistry) {
    match &inst.node {
        VNode::Layer(p) => registry.register(Layer {
            id: p.id.clone(),
            z_index: p.z_index,
            rect: layout.rect,
            backdrop: p.backdrop,
            modal: p.modal,
            close_on_escape: p.close_on_escape,
        }),
        VNode::Modal(p) => registry.register(Layer {
            id: p.id.clone(),
            z_index: 1000,
            rect: layout.rect,
            backdrop: p.backdrop,
            modal: true,
            close_on_escape: p.close_on_escape,
        }),
        _ => {}
    }
    for (child, child_layout) in inst.children.iter().zip(&layout.children) {
        collect_layers(child, child_layout, registry);
    }
}

fn kind_name(kind: &EventKind) -> String {
    match kind {
        EventKind::Key { .. } => "key",
        EventKind::Text { .. } => "text",
        EventKind::Mouse { .. } => "mouse",
        EventKind::Resize { .. } => "resize",
        EventKind::Paste { .. } => "paste",
        EventKind::Tick { .. } => "tick",
        EventKind::User { .. } => "user",
        EventKind::Fatal { .. } => "fatal",
    }
    .to_string()
}

fn fatal_code(err: &RuntimeError) -> &'static str {
    match err {
        RuntimeError::InvalidProps { .. } => "INVALID_PROPS",
        RuntimeError::DrawlistBuild(_) => "DRAWLIST_BUILD_ERROR",
        RuntimeError::UserCode { .. } => "USER_CODE_THROW",
        RuntimeError::BackendUnsupported(_) => "BACKEND_UNSUPPORTED",
        RuntimeError::BackendPlatform { .. } => "BACKEND_PLATFORM",
        RuntimeError::Internal { .. } | RuntimeError::Io(_) => "INTERNAL",
    }
}

fn panic_text(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
