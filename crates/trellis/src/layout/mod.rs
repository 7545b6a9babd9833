//! Layout: measuring and arranging the instance tree on the cell grid.
//!
//! `layout_tree` produces a [`LayoutNode`] tree mirroring the instance
//! tree 1:1 (child index i corresponds to instance child i). Layout is
//! pure: identical inputs produce identical trees, checkable with
//! [`checksum`].
//!
//! Sizing passes per container: intrinsic measure, flex redistribution of
//! remaining main-axis space, percent resolution against the content
//! rect, clamp to the viewport.

mod flex;
mod hit;

pub use hit::{find_rect_by_id, hit_test_focusable, is_pressable_kind, scrollable_at};

use crate::error::{Result, RuntimeError};
use crate::geometry::{Rect, Size};
use crate::glyph::{cell_width, icon_width};
use crate::instance::RuntimeInstance;
use crate::props::{Axis, Dim};
use crate::vnode::VNode;

/// Scroll bookkeeping recorded for scrollable containers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScrollMeta {
    pub scroll_x: i32,
    pub scroll_y: i32,
    pub content_width: i32,
    pub content_height: i32,
    pub viewport_width: i32,
    pub viewport_height: i32,
}

/// One laid-out node; children mirror the instance's children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutNode {
    pub rect: Rect,
    pub children: Vec<LayoutNode>,
    pub meta: Option<ScrollMeta>,
}

impl LayoutNode {
    pub fn leaf(rect: Rect) -> Self {
        Self {
            rect,
            children: Vec::new(),
            meta: None,
        }
    }

    /// Shifts this subtree by a delta (scroll application).
    pub(crate) fn shift(&mut self, dx: i32, dy: i32) {
        self.rect.x += dx;
        self.rect.y += dy;
        for child in &mut self.children {
            child.shift(dx, dy);
        }
    }

    /// Zeroes every rect in this subtree (fully scrolled-out children).
    pub(crate) fn zero(&mut self) {
        self.rect.w = 0;
        self.rect.h = 0;
        for child in &mut self.children {
            child.zero();
        }
    }
}

/// Lays out the whole tree against a viewport.
pub fn layout_tree(inst: &RuntimeInstance, viewport: Size) -> Result<LayoutNode> {
    layout_node(
        inst,
        0,
        0,
        i32::from(viewport.width),
        i32::from(viewport.height),
        Axis::Vertical,
    )
}

/// Measures a node's intrinsic size within the given bounds.
pub fn measure(inst: &RuntimeInstance, max_w: i32, max_h: i32, axis: Axis) -> Result<(i32, i32)> {
    measure_node(inst, max_w, max_h, axis)
}

/// Resolves a dimension against an available extent and an intrinsic
/// fallback. `path` names the offending prop in `INVALID_PROPS` details.
pub(crate) fn resolve_dim(dim: Dim, max: i32, intrinsic: i32, path: &str) -> Result<i32> {
    let out = match dim {
        Dim::Auto => intrinsic,
        Dim::Cells(n) => {
            if n < 0 {
                return Err(RuntimeError::invalid_props(format!("{path}: negative size {n}")));
            }
            n
        }
        Dim::Percent(p) => {
            if !p.is_finite() || p < 0.0 {
                return Err(RuntimeError::invalid_props(format!("{path}: bad percent {p}")));
            }
            ((f64::from(max) * f64::from(p)) / 100.0).floor() as i32
        }
        Dim::Full => max,
    };
    Ok(out.clamp(0, max.max(0)))
}

pub(crate) fn layout_node(
    inst: &RuntimeInstance,
    x: i32,
    y: i32,
    max_w: i32,
    max_h: i32,
    axis: Axis,
) -> Result<LayoutNode> {
    let (iw, ih) = measure_node(inst, max_w, max_h, axis)?;
    let (w, h) = match inst.node.common() {
        Some(common) => {
            let path = kind_path(inst);
            let w = resolve_dim(common.width, max_w, iw, &format!("{path}.width"))?;
            let h = resolve_dim(common.height, max_h, ih, &format!("{path}.height"))?;
            (w, h)
        }
        None => (iw, ih),
    };
    layout_node_sized(inst, x, y, w, h, axis)
}

pub(crate) fn layout_node_sized(
    inst: &RuntimeInstance,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    axis: Axis,
) -> Result<LayoutNode> {
    flex::arrange(inst, x, y, w, h, axis)
}

pub(crate) fn kind_path(inst: &RuntimeInstance) -> String {
    format!("{:?}", inst.kind).to_lowercase()
}

/// Intrinsic measurement, dispatched by kind.
pub(crate) fn measure_node(
    inst: &RuntimeInstance,
    max_w: i32,
    max_h: i32,
    axis: Axis,
) -> Result<(i32, i32)> {
    use VNode::*;
    let out = match &inst.node {
        Row(_) | Column(_) | Box(_) | Field(_) | Modal(_) | FocusZone(_) | FocusTrap(_)
        | Layers(_) | Layer(_) | PanelGroup(_) | ResizablePanel(_) | SplitPane(_) => {
            return flex::measure_container(inst, max_w, max_h);
        }
        Text(p) => {
            let mut w = cell_width(&p.text);
            if let Some(cap) = p.max_width {
                w = w.min(cap);
            }
            (w, 1)
        }
        RichText(p) => {
            let w: i32 = p.spans.iter().map(|s| cell_width(&s.text)).sum();
            (w, 1)
        }
        Spacer(p) => match (p.size, axis) {
            (Some(n), Axis::Horizontal) => (n.max(0), 0),
            (Some(n), Axis::Vertical) => (0, n.max(0)),
            (None, _) => (0, 0),
        },
        Badge(p) => (cell_width(&p.text) + 2, 1),
        Spinner(p) => {
            let label = p.label.as_deref().map_or(0, |l| cell_width(l) + 1);
            (1 + label, 1)
        }
        Progress(p) => {
            let label = p.label.as_deref().map_or(0, |l| cell_width(l) + 1);
            (20 + label, 1)
        }
        Skeleton(p) => (max_w, p.lines.max(1)),
        Icon(p) => (icon_width(&p.name), 1),
        Kbd(p) => (cell_width(&p.keys) + 2, 1),
        Status(p) => (cell_width(&p.text) + 2, 1),
        Tag(p) => (cell_width(&p.text) + 2, 1),
        Gauge(p) => {
            let label = p.label.as_deref().map_or(0, |l| cell_width(l) + 1);
            (10 + label, 1)
        }
        Empty => (0, 0),
        ErrorDisplay(p) => {
            let lines = 1 + i32::from(p.detail.is_some()) + i32::from(p.retry_id.is_some());
            (max_w, lines)
        }
        Callout(_) => (max_w, 3),
        Sparkline(p) => ((p.values.len() as i32).min(max_w), 1),
        BarChart(p) => (max_w, p.values.len() as i32),
        MiniChart(p) => ((p.values.len() as i32).min(max_w), 3),
        Divider(p) => {
            if p.vertical {
                (1, max_h)
            } else {
                (max_w, 1)
            }
        }
        Button(p) => (cell_width(&p.label) + 4, 1),
        Input(_) => (max_w, 1),
        Select(p) => {
            let widest = p.options.iter().map(|o| cell_width(o)).max().unwrap_or(0);
            (widest + 4, 1)
        }
        Checkbox(p) => (cell_width(&p.label) + 4, 1),
        RadioGroup(p) => {
            let widest = p.options.iter().map(|o| cell_width(o)).max().unwrap_or(0);
            (widest + 4, p.options.len() as i32)
        }
        ToolApprovalDialog(_) => (max_w, 6),
        ToastContainer(p) => {
            let widest = p
                .toasts
                .iter()
                .map(|t| cell_width(&t.text) + 4)
                .max()
                .unwrap_or(0);
            (widest.min(max_w), p.toasts.len() as i32)
        }
        // Viewport widgets fill the space they are given.
        VirtualList(_) | Table(_) | Tree(_) | FilePicker(_) | FileTreeExplorer(_)
        | CommandPalette(_) | CodeEditor(_) | DiffViewer(_) | LogsConsole(_) => (max_w, max_h),
        Dropdown(p) => {
            let widest = p.items.iter().map(|i| cell_width(i)).max().unwrap_or(0);
            (widest + 4, 1)
        }
        Composite(_) => {
            // Composites are transparent: size of the rendered child.
            match inst.children.first() {
                Some(child) => return measure_node(child, max_w, max_h, axis),
                None => (0, 0),
            }
        }
    };
    Ok((out.0.clamp(0, max_w.max(0)), out.1.clamp(0, max_h.max(0))))
}

/// FNV-1a checksum over a layout tree, for determinism assertions.
pub fn checksum(node: &LayoutNode) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    fn mix(hash: &mut u64, v: i64) {
        for b in v.to_le_bytes() {
            *hash ^= u64::from(b);
            *hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
    }
    fn walk(node: &LayoutNode, hash: &mut u64) {
        mix(hash, i64::from(node.rect.x));
        mix(hash, i64::from(node.rect.y));
        mix(hash, i64::from(node.rect.w));
        mix(hash, i64::from(node.rect.h));
        if let Some(meta) = &node.meta {
            mix(hash, i64::from(meta.scroll_x));
            mix(hash, i64::from(meta.scroll_y));
            mix(hash, i64::from(meta.content_width));
            mix(hash, i64::from(meta.content_height));
        }
        mix(hash, node.children.len() as i64);
        for child in &node.children {
            walk(child, hash);
        }
    }
    walk(node, &mut hash);
    hash
}
