//! End-to-end scheduler scenarios over the in-memory test backend:
//! tab-bar activation, palette open-and-select, effect convergence, and
//! backpressure with interactive overcommit.

use std::sync::{Arc, Mutex};

use trellis::hooks::Dep;
use trellis::observer::{FrameBreadcrumb, RenderObserver};
use trellis::props::*;
use trellis::testing::{TestBackend, TestBackendHandle, rasterize};
use trellis::{Action, App, DispatchHandle, Flow, VNode, keys};
use twire::events::KeyAction;

struct CountingObserver {
    renders: Arc<Mutex<Vec<FrameBreadcrumb>>>,
}

impl RenderObserver for CountingObserver {
    fn on_render(&mut self, crumb: &FrameBreadcrumb) {
        self.renders.lock().unwrap().push(crumb.clone());
    }
}

fn observer() -> (Box<CountingObserver>, Arc<Mutex<Vec<FrameBreadcrumb>>>) {
    let renders = Arc::new(Mutex::new(Vec::new()));
    (
        Box::new(CountingObserver {
            renders: renders.clone(),
        }),
        renders,
    )
}

async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

async fn wait_for(mut cond: impl FnMut() -> bool) {
    for _ in 0..2000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

fn frame_containing(handle: &TestBackendHandle, needle: &str) -> bool {
    handle
        .frames()
        .iter()
        .any(|bytes| rasterize(bytes).map(|r| r.contains(needle)).unwrap_or(false))
}

// ---------------------------------------------------------------------------
// Tab bar activation
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
struct TabState {
    active: String,
    presses: Vec<String>,
    focus_log: Vec<Option<String>>,
}

fn tab_view(state: &TabState) -> VNode {
    VNode::column(vec![
        VNode::row(vec![
            VNode::button("tab:/README.md", "README.md"),
            VNode::button("tab:/src/app.ts", "app.ts"),
        ]),
        VNode::Tree(TreeProps {
            id: "tree".into(),
            nodes: Arc::new(vec![TreeNodeData {
                key: "src".into(),
                label: "src".into(),
                ..Default::default()
            }]),
            common: Common {
                height: Dim::Cells(3),
                ..Default::default()
            },
            ..Default::default()
        }),
        VNode::text(format!("Active tab: {}", state.active)),
    ])
}

#[tokio::test(flavor = "current_thread")]
async fn test_tab_bar_activation() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let (backend, handle) = TestBackend::new(40, 8);
            let state = TabState {
                active: "/README.md".into(),
                presses: Vec::new(),
                focus_log: Vec::new(),
            };
            let mut app = App::new(
                state,
                tab_view,
                |s: &mut TabState, action: &Action| {
                    match action {
                        Action::Press { id, .. } if id.starts_with("tab:") => {
                            s.presses.push(id.clone());
                            s.active = id.trim_start_matches("tab:").to_string();
                        }
                        Action::FocusChanged { id } => s.focus_log.push(id.clone()),
                        _ => {}
                    }
                    Flow::Continue
                },
                backend,
            );
            let shared: Arc<Mutex<Option<TabState>>> = Arc::new(Mutex::new(None));
            let shared_in = shared.clone();
            let task = tokio::task::spawn_local(async move {
                let result = app.run_async().await;
                *shared_in.lock().unwrap() = Some(app.state().clone());
                result
            });

            // The first commit auto-assigns focus to the first focusable.
            wait_for(|| handle.frame_count() >= 1).await;
            handle.push_events(|w| {
                w.key(10, keys::ENTER, 0, KeyAction::Down)
                    .key(20, keys::TAB, 0, KeyAction::Down)
                    .key(30, keys::ENTER, 0, KeyAction::Down);
            });
            wait_for(|| frame_containing(&handle, "Active tab: /src/app.ts")).await;
            handle.close();
            task.await.unwrap().unwrap();

            let final_state = shared.lock().unwrap().clone().unwrap();
            assert_eq!(
                final_state.presses,
                vec!["tab:/README.md".to_string(), "tab:/src/app.ts".to_string()]
            );
            assert_eq!(final_state.active, "/src/app.ts");
            assert_eq!(
                final_state.focus_log,
                vec![Some("tab:/src/app.ts".to_string())]
            );
            // The initial frame showed the first tab active.
            assert!(frame_containing(&handle, "Active tab: /README.md"));
        })
        .await;
}

// ---------------------------------------------------------------------------
// Command palette open-and-select
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
struct PaletteState {
    open: bool,
    query: String,
    selected: usize,
    active_tab: String,
}

fn palette_items() -> Arc<Vec<PaletteItem>> {
    Arc::new(vec![
        PaletteItem {
            id: "file:/README.md".into(),
            label: "README.md".into(),
            source: "files".into(),
        },
        PaletteItem {
            id: "file:/src/app.ts".into(),
            label: "src/app.ts".into(),
            source: "files".into(),
        },
    ])
}

fn palette_view(state: &PaletteState) -> VNode {
    let mut children = vec![VNode::text(format!("Active tab: {}", state.active_tab))];
    if state.open {
        children.push(VNode::CommandPalette(CommandPaletteProps {
            id: "palette".into(),
            open: true,
            query: state.query.clone(),
            selected: state.selected,
            items: palette_items(),
            sources: Arc::new(vec!["files".into()]),
            active_source: 0,
            common: Common {
                height: Dim::Cells(8),
                ..Default::default()
            },
            ..Default::default()
        }));
    }
    VNode::column(children)
}

#[tokio::test(flavor = "current_thread")]
async fn test_palette_open_and_select() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let (backend, handle) = TestBackend::new(40, 12);
            let dispatch: Arc<Mutex<Option<DispatchHandle<PaletteState>>>> =
                Arc::new(Mutex::new(None));
            let dispatch_in = dispatch.clone();
            let state = PaletteState {
                open: false,
                query: String::new(),
                selected: 0,
                active_tab: "/README.md".into(),
            };
            let mut app = App::new(
                state,
                palette_view,
                move |s: &mut PaletteState, action: &Action| {
                    match action {
                        Action::Command { tag } if tag == "palette.open" => {
                            s.open = true;
                            s.query.clear();
                            s.selected = 0;
                            if let Some(d) = dispatch_in.lock().unwrap().as_ref() {
                                d.focus(Some("palette".into()));
                            }
                        }
                        Action::PaletteQuery { query, .. } => s.query = query.clone(),
                        Action::PaletteMoved { index, .. } => s.selected = *index,
                        Action::PaletteSelected { item_id, .. } => {
                            s.active_tab = item_id.trim_start_matches("file:").to_string();
                            s.open = false;
                        }
                        Action::PaletteClosed { .. } => s.open = false,
                        _ => {}
                    }
                    Flow::Continue
                },
                backend,
            );
            app.bind_chord("ctrl+p", "palette.open").unwrap();
            *dispatch.lock().unwrap() = Some(app.handle());

            let shared: Arc<Mutex<Option<PaletteState>>> = Arc::new(Mutex::new(None));
            let shared_in = shared.clone();
            let task = tokio::task::spawn_local(async move {
                let result = app.run_async().await;
                *shared_in.lock().unwrap() = Some(app.state().clone());
                result
            });

            wait_for(|| handle.frame_count() >= 1).await;
            handle.push_events(|w| {
                w.key(
                    10,
                    keys::from_char('p').unwrap(),
                    keys::mods::CTRL,
                    KeyAction::Down,
                );
            });
            // Wait for the focused, open palette before typing. Each
            // text event ships in its own batch: a handler's update is
            // only visible to routing after the next commit.
            wait_for(|| frame_containing(&handle, "> ")).await;
            settle().await;
            handle.push_events(|w| {
                w.text(20, 'a' as u32);
            });
            wait_for(|| frame_containing(&handle, "> a")).await;
            handle.push_events(|w| {
                w.text(30, 'p' as u32);
            });
            wait_for(|| frame_containing(&handle, "> ap")).await;
            handle.push_events(|w| {
                w.text(40, 'p' as u32);
            });
            wait_for(|| frame_containing(&handle, "> app")).await;
            handle.push_events(|w| {
                w.key(50, keys::ENTER, 0, KeyAction::Down);
            });
            wait_for(|| frame_containing(&handle, "Active tab: /src/app.ts")).await;
            handle.close();
            task.await.unwrap().unwrap();

            let final_state = shared.lock().unwrap().clone().unwrap();
            assert_eq!(final_state.query, "app");
            assert!(!final_state.open);
            assert_eq!(final_state.active_tab, "/src/app.ts");
        })
        .await;
}

// ---------------------------------------------------------------------------
// Effect-triggered self-update converges
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "current_thread")]
async fn test_effect_self_update_converges_in_two_renders() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let (backend, handle) = TestBackend::new(20, 3);
            let (obs, renders) = observer();
            let mut app = App::new(
                (),
                |_: &()| {
                    VNode::composite(None, |cx| {
                        let (count, set) = cx.use_state(|| 0i32);
                        let setter = set.clone();
                        cx.use_effect(Some(vec![Dep::I64(i64::from(count))]), move || {
                            if count == 0 {
                                setter.set(1);
                            }
                            None
                        });
                        VNode::text(format!("count {count}"))
                    })
                },
                |_: &mut (), _: &Action| Flow::Continue,
                backend,
            )
            .with_observer(obs);
            let task = tokio::task::spawn_local(async move { app.run_async().await });

            wait_for(|| renders.lock().unwrap().len() >= 2).await;
            settle().await;
            // Converged: exactly two renders, no oscillation.
            assert_eq!(renders.lock().unwrap().len(), 2);
            let last = handle.last_frame().unwrap();
            assert!(rasterize(&last).unwrap().contains("count 1"));

            handle.close();
            task.await.unwrap().unwrap();
        })
        .await;
}

// ---------------------------------------------------------------------------
// Backpressure with interactive overcommit
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "current_thread")]
async fn test_backpressure_allows_one_interactive_overcommit() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let (backend, handle) = TestBackend::new(30, 4);
            let backend = backend.manual_ack();
            let (obs, renders) = observer();
            let view = |_: &()| {
                VNode::row(vec![
                    VNode::button("go", "Go"),
                    VNode::button("stop", "Stop"),
                    VNode::Spinner(SpinnerProps::default()),
                ])
            };
            let mut app = App::new((), view, |_: &mut (), _: &Action| Flow::Continue, backend)
                .with_observer(obs);
            let task = tokio::task::spawn_local(async move { app.run_async().await });

            // Frame 1 submitted, unacked.
            wait_for(|| renders.lock().unwrap().len() == 1).await;

            // Interactive key: exactly one overcommitted frame.
            handle.push_events(|w| {
                w.key(10, keys::TAB, 0, KeyAction::Down);
            });
            wait_for(|| renders.lock().unwrap().len() == 2).await;

            // A tick under two unacked frames must not submit a third.
            handle.push_events(|w| {
                w.tick(200, Some(100));
            });
            settle().await;
            assert_eq!(renders.lock().unwrap().len(), 2);

            // Acks drain the queue; the deferred tick frame now flows.
            handle.ack();
            settle().await;
            handle.ack();
            wait_for(|| renders.lock().unwrap().len() == 3).await;

            handle.ack(); // release the third frame
            handle.close();
            task.await.unwrap().unwrap();
        })
        .await;
}
