//! Renderer: laid-out instance tree → binary drawlist.
//!
//! The walk is an explicit stack (deep trees must not recurse), pre-order
//! over (instance, layout) pairs. Containers may push a clip before their
//! children; every push is balanced by a pop queued behind the subtree.
//! Styles inherit downward; merges run through the style cache. The
//! focused input resolves at most one cursor, emitted (or hidden) at the
//! end under the v2 cursor protocol.

mod containers;
mod widgets;

pub use widgets::SPINNER_TICK_MS;

use tstyle::{ResolvedStyle, StyleCache, Theme, apply_opacity};
use twire::{CursorShape, DrawlistBuilder};

use crate::error::Result;
use crate::focus::FocusState;
use crate::geometry::{Rect, Size};
use crate::input::LocalStores;
use crate::instance::RuntimeInstance;
use crate::layout::LayoutNode;
use crate::props::StyleProps;
use crate::vnode::{NodeKind, VNode};

/// The single cursor resolved during a walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorReq {
    pub x: i32,
    pub y: i32,
    pub shape: CursorShape,
    pub blink: bool,
}

/// Inputs to one render pass.
pub struct RenderParams<'a> {
    pub root: &'a RuntimeInstance,
    pub layout: &'a LayoutNode,
    pub viewport: Size,
    pub focus: &'a FocusState,
    pub stores: &'a LocalStores,
    pub theme: &'a Theme,
    /// Monotonic milliseconds driving spinner/progress animation.
    pub tick_ms: u64,
    /// When set, subtrees not intersecting this rect are skipped.
    pub damage: Option<Rect>,
}

/// Per-pass context handed to widget renderers.
pub struct RenderCx<'a> {
    pub builder: &'a mut DrawlistBuilder,
    pub theme: &'a Theme,
    pub cache: &'a mut StyleCache,
    pub focus: &'a FocusState,
    pub stores: &'a LocalStores,
    pub viewport: Size,
    pub tick_ms: u64,
    base_bg: tstyle::Rgb,
    cursor: Option<CursorReq>,
}

impl<'a> RenderCx<'a> {
    /// Resolves a props-level style fragment over an inherited style.
    pub fn styled(&mut self, inherited: ResolvedStyle, props: &StyleProps) -> ResolvedStyle {
        if props.is_empty() {
            return inherited;
        }
        let over = tstyle::StyleOverride {
            fg: props.fg.as_ref().map(|c| self.theme.resolve_color(c)),
            bg: props.bg.as_ref().map(|c| self.theme.resolve_color(c)),
            attrs: props.attrs,
            ..Default::default()
        };
        self.cache.merge(inherited, &over)
    }

    /// Emits text with subtree opacity applied.
    pub fn text(&mut self, x: i32, y: i32, text: &str, style: ResolvedStyle, opacity: f32) {
        let style = apply_opacity(style, opacity, self.base_bg);
        self.builder.draw_text(x, y, text, Some(&style));
    }

    /// Emits a fill with subtree opacity applied.
    pub fn fill(&mut self, rect: Rect, style: ResolvedStyle, opacity: f32) {
        if rect.is_empty() {
            return;
        }
        let style = apply_opacity(style, opacity, self.base_bg);
        self.builder
            .fill_rect(rect.x, rect.y, rect.w, rect.h, Some(&style));
    }

    /// Records the resolved cursor; the last focused input wins, but by
    /// construction at most one input is focused per frame.
    pub fn set_cursor(&mut self, req: CursorReq) {
        self.cursor = Some(req);
    }

    pub fn is_focused(&self, id: &str) -> bool {
        self.focus.focused_id.as_deref() == Some(id)
    }
}

struct Frame<'a> {
    inst: &'a RuntimeInstance,
    layout: &'a LayoutNode,
    style: ResolvedStyle,
    opacity: f32,
}

enum Work<'a> {
    Visit(Frame<'a>),
    PopClips(u32),
}

/// Renders a frame into the builder, returning the resolved cursor (if
/// any). The builder must be reset by the caller between frames.
pub fn render_to_drawlist(
    params: &RenderParams<'_>,
    builder: &mut DrawlistBuilder,
    cache: &mut StyleCache,
) -> Result<Option<CursorReq>> {
    let base_style = ResolvedStyle::new(params.theme.fg(), params.theme.bg());
    builder.clear_to(params.viewport.width, params.viewport.height, &base_style);

    let mut cx = RenderCx {
        builder,
        theme: params.theme,
        cache,
        focus: params.focus,
        stores: params.stores,
        viewport: params.viewport,
        tick_ms: params.tick_ms,
        base_bg: params.theme.bg(),
        cursor: None,
    };

    let mut stack: Vec<Work<'_>> = vec![Work::Visit(Frame {
        inst: params.root,
        layout: params.layout,
        style: base_style,
        opacity: 1.0,
    })];

    while let Some(work) = stack.pop() {
        match work {
            Work::PopClips(n) => {
                for _ in 0..n {
                    cx.builder.pop_clip();
                }
            }
            Work::Visit(frame) => {
                if frame.layout.rect.is_empty() && frame.inst.kind != NodeKind::Composite {
                    continue;
                }
                if let Some(damage) = params.damage {
                    if !damage.intersects(&frame.layout.rect)
                        && frame.inst.kind != NodeKind::Composite
                    {
                        continue;
                    }
                }
                let emitted = draw_node(&mut cx, &frame)?;
                if emitted.clips > 0 {
                    stack.push(Work::PopClips(emitted.clips));
                }
                if emitted.descend {
                    push_children(&mut stack, &frame, emitted.child_style, emitted.child_opacity);
                }
            }
        }
    }

    // Exactly one cursor resolves per frame; without one the cursor is
    // explicitly hidden (v2 protocol).
    if cx.builder.version() >= 2 {
        match cx.cursor {
            Some(req) => cx
                .builder
                .set_cursor(req.x, req.y, req.shape, true, req.blink),
            None => cx.builder.hide_cursor(),
        }
    }
    Ok(cx.cursor)
}

/// Queues children for the walk. Stack order is reversed so the first
/// child is visited first; layer hosts order children by z instead.
fn push_children<'a>(
    stack: &mut Vec<Work<'a>>,
    frame: &Frame<'a>,
    style: ResolvedStyle,
    opacity: f32,
) {
    let pairs: Vec<(usize, &RuntimeInstance)> = match &frame.inst.node {
        VNode::Layers(_) => {
            let mut order: Vec<(usize, &RuntimeInstance)> =
                frame.inst.children.iter().enumerate().collect();
            order.sort_by_key(|(i, inst)| {
                let z = match &inst.node {
                    VNode::Layer(p) => p.z_index,
                    _ => 0,
                };
                (z, *i)
            });
            order
        }
        _ => frame.inst.children.iter().enumerate().collect(),
    };
    for (index, child) in pairs.into_iter().rev() {
        let Some(child_layout) = frame.layout.children.get(index) else {
            log::warn!("layout/instance child count mismatch at {:?}", frame.inst.kind);
            continue;
        };
        stack.push(Work::Visit(Frame {
            inst: child,
            layout: child_layout,
            style,
            opacity,
        }));
    }
}

/// What a widget renderer produced for the walk.
pub(crate) struct Emitted {
    pub clips: u32,
    pub descend: bool,
    pub child_style: ResolvedStyle,
    pub child_opacity: f32,
}

impl Emitted {
    fn leaf() -> Self {
        Self {
            clips: 0,
            descend: false,
            child_style: ResolvedStyle::default(),
            child_opacity: 1.0,
        }
    }

    fn parent(style: ResolvedStyle, opacity: f32) -> Self {
        Self {
            clips: 0,
            descend: true,
            child_style: style,
            child_opacity: opacity,
        }
    }
}

fn draw_node(cx: &mut RenderCx<'_>, frame: &Frame<'_>) -> Result<Emitted> {
    use VNode::*;
    let rect = frame.layout.rect;
    let style = frame.style;
    let opacity = frame.opacity;
    let out = match &frame.inst.node {
        Row(p) | Column(p) | Box(p) => {
            containers::draw_container(cx, p, rect, frame.layout, style, opacity)
        }
        Field(p) => containers::draw_field(cx, p, rect, style, opacity),
        Modal(p) => containers::draw_modal(cx, p, rect, style, opacity),
        Layer(p) => containers::draw_layer(cx, p, style, opacity),
        Layers(_) | FocusZone(_) | FocusTrap(_) | PanelGroup(_) | ResizablePanel(_)
        | Composite(_) => Emitted::parent(style, opacity),
        SplitPane(p) => containers::draw_split(cx, p, rect, frame.layout, style, opacity),
        Text(p) => widgets::draw_text_node(cx, p, rect, style, opacity),
        RichText(p) => widgets::draw_rich_text(cx, p, rect, style, opacity),
        Button(p) => widgets::draw_button(cx, p, rect, style, opacity),
        Input(p) => widgets::draw_input(cx, p, rect, style, opacity),
        Select(p) => widgets::draw_select(cx, p, rect, style, opacity),
        Checkbox(p) => widgets::draw_checkbox(cx, p, rect, style, opacity),
        RadioGroup(p) => widgets::draw_radio_group(cx, p, rect, style, opacity),
        Spacer(_) | Empty => Emitted::leaf(),
        Badge(p) => widgets::draw_badge(cx, p, rect, style, opacity),
        Spinner(p) => widgets::draw_spinner(cx, p, rect, style, opacity),
        Progress(p) => widgets::draw_progress(cx, p, rect, style, opacity),
        Skeleton(p) => widgets::draw_skeleton(cx, p, rect, style, opacity),
        Icon(p) => widgets::draw_icon(cx, p, rect, style, opacity),
        Kbd(p) => widgets::draw_kbd(cx, p, rect, style, opacity),
        Status(p) => widgets::draw_status(cx, p, rect, style, opacity),
        Tag(p) => widgets::draw_tag(cx, p, rect, style, opacity),
        Gauge(p) => widgets::draw_gauge(cx, p, rect, style, opacity),
        ErrorDisplay(p) => widgets::draw_error_display(cx, p, rect, style, opacity),
        Callout(p) => widgets::draw_callout(cx, p, rect, style, opacity),
        Divider(p) => widgets::draw_divider(cx, p, rect, style, opacity),
        Sparkline(p) => widgets::draw_sparkline(cx, p, rect, style, opacity),
        BarChart(p) => widgets::draw_bar_chart(cx, p, rect, style, opacity),
        MiniChart(p) => widgets::draw_mini_chart(cx, p, rect, style, opacity),
        VirtualList(p) => widgets::draw_virtual_list(cx, p, rect, style, opacity),
        Table(p) => widgets::draw_table(cx, p, rect, style, opacity),
        Tree(p) => widgets::draw_tree(cx, p, rect, style, opacity),
        FilePicker(p) => widgets::draw_file_picker(cx, p, rect, style, opacity),
        FileTreeExplorer(p) => widgets::draw_file_tree(cx, p, rect, style, opacity),
        Dropdown(p) => widgets::draw_dropdown(cx, p, rect, style, opacity),
        CommandPalette(p) => widgets::draw_palette(cx, p, rect, style, opacity),
        ToolApprovalDialog(p) => widgets::draw_approval(cx, p, rect, style, opacity),
        ToastContainer(p) => widgets::draw_toasts(cx, p, rect, style, opacity),
        CodeEditor(p) => widgets::draw_code_editor(cx, p, rect, style, opacity),
        DiffViewer(p) => widgets::draw_diff_viewer(cx, p, rect, style, opacity),
        LogsConsole(p) => widgets::draw_logs(cx, p, rect, style, opacity),
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::{CommitCx, commit_vnode_tree};
    use crate::hooks::Invalidate;
    use crate::instance::IdAllocator;
    use crate::layout::layout_tree;
    use crate::props::*;
    use tstyle::presets;
    use twire::{DrawOp, DrawlistReader};

    fn render_bytes(view: &VNode, viewport: Size, focus: &FocusState) -> Vec<u8> {
        let mut alloc = IdAllocator::new();
        let mut ccx = CommitCx::new(&mut alloc, Invalidate::new());
        let inst = commit_vnode_tree(None, view, &mut ccx).unwrap();
        let layout = layout_tree(&inst, viewport).unwrap();
        let stores = LocalStores::new();
        let params = RenderParams {
            root: &inst,
            layout: &layout,
            viewport,
            focus,
            stores: &stores,
            theme: presets::dark(),
            tick_ms: 0,
            damage: None,
        };
        let mut builder = DrawlistBuilder::new(2);
        let mut cache = StyleCache::new();
        render_to_drawlist(&params, &mut builder, &mut cache).unwrap();
        builder.build().unwrap().to_vec()
    }

    #[test]
    fn test_identical_inputs_identical_bytes() {
        let view = VNode::column(vec![
            VNode::text("hello"),
            VNode::button("go", "Go"),
            VNode::Progress(ProgressProps {
                value: 0.5,
                ..Default::default()
            }),
        ]);
        let focus = FocusState::default();
        let a = render_bytes(&view, Size::new(40, 10), &focus);
        let b = render_bytes(&view, Size::new(40, 10), &focus);
        assert_eq!(a, b);
    }

    #[test]
    fn test_clips_balanced() {
        let view = VNode::Column(ContainerProps {
            overflow: Overflow::Scroll,
            children: vec![VNode::text("inside"), VNode::row(vec![VNode::text("x")])],
            ..Default::default()
        });
        let bytes = render_bytes(&view, Size::new(20, 2), &FocusState::default());
        let ops = DrawlistReader::decode(&bytes).unwrap();
        let pushes = ops.iter().filter(|o| matches!(o, DrawOp::PushClip { .. })).count();
        let pops = ops.iter().filter(|o| matches!(o, DrawOp::PopClip)).count();
        assert!(pushes > 0);
        assert_eq!(pushes, pops);
    }

    #[test]
    fn test_focused_input_resolves_one_cursor() {
        let view = VNode::column(vec![VNode::Input(InputProps {
            id: "q".into(),
            value: "hi".into(),
            ..Default::default()
        })]);
        let mut focus = FocusState::default();
        focus.focused_id = Some("q".into());
        let bytes = render_bytes(&view, Size::new(20, 2), &focus);
        let ops = DrawlistReader::decode(&bytes).unwrap();
        let cursors: Vec<_> = ops
            .iter()
            .filter(|o| matches!(o, DrawOp::SetCursor { .. }))
            .collect();
        assert_eq!(cursors.len(), 1);
        assert!(matches!(cursors[0], DrawOp::SetCursor { x: 2, y: 0, .. }));
    }

    #[test]
    fn test_unfocused_frame_hides_cursor() {
        let view = VNode::text("no inputs");
        let bytes = render_bytes(&view, Size::new(20, 2), &FocusState::default());
        let ops = DrawlistReader::decode(&bytes).unwrap();
        assert!(ops.iter().any(|o| matches!(o, DrawOp::HideCursor)));
        assert!(!ops.iter().any(|o| matches!(o, DrawOp::SetCursor { .. })));
    }

    #[test]
    fn test_damage_rect_skips_disjoint_subtrees() {
        let view = VNode::column(vec![VNode::text("top"), VNode::text("bottom")]);
        let mut alloc = IdAllocator::new();
        let mut ccx = CommitCx::new(&mut alloc, Invalidate::new());
        let inst = commit_vnode_tree(None, &view, &mut ccx).unwrap();
        let layout = layout_tree(&inst, Size::new(20, 4)).unwrap();
        let stores = LocalStores::new();
        let focus = FocusState::default();
        let params = RenderParams {
            root: &inst,
            layout: &layout,
            viewport: Size::new(20, 4),
            focus: &focus,
            stores: &stores,
            theme: presets::dark(),
            tick_ms: 0,
            damage: Some(Rect::new(0, 0, 20, 1)),
        };
        let mut builder = DrawlistBuilder::new(2);
        let mut cache = StyleCache::new();
        render_to_drawlist(&params, &mut builder, &mut cache).unwrap();
        let bytes = builder.build().unwrap().to_vec();
        let ops = DrawlistReader::decode(&bytes).unwrap();
        let texts: Vec<&str> = ops
            .iter()
            .filter_map(|o| match o {
                DrawOp::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(texts.contains(&"top"));
        assert!(!texts.contains(&"bottom"));
    }

    #[test]
    fn test_opacity_blends_styles() {
        let dim_box = VNode::Box(ContainerProps {
            opacity: Some(0.5),
            children: vec![VNode::text("faded")],
            ..Default::default()
        });
        let plain = VNode::column(vec![VNode::text("faded")]);
        let a = render_bytes(&dim_box, Size::new(20, 2), &FocusState::default());
        let b = render_bytes(&plain, Size::new(20, 2), &FocusState::default());
        assert_ne!(a, b); // the faded text carries blended colors
    }
}
