//! Container arrangement: the row/column/box flex model plus the
//! specialized container kinds (field, modal, layers, panels, splits).

use crate::error::{Result, RuntimeError};
use crate::geometry::Rect;
use crate::glyph::cell_width;
use crate::instance::RuntimeInstance;
use crate::props::{
    Align, Axis, Common, ContainerProps, Dim, Insets, Justify, Overflow, Position,
};
use crate::vnode::VNode;

use super::{
    LayoutNode, ScrollMeta, kind_path, layout_node, layout_node_sized, measure_node, resolve_dim,
};

pub(crate) fn arrange(
    inst: &RuntimeInstance,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    axis: Axis,
) -> Result<LayoutNode> {
    match &inst.node {
        VNode::Row(p) => flex_arrange(inst, p, Axis::Horizontal, x, y, w, h),
        VNode::Column(p) | VNode::Box(p) => flex_arrange(inst, p, Axis::Vertical, x, y, w, h),
        VNode::Field(_) => arrange_field(inst, x, y, w, h),
        VNode::Modal(p) => {
            let title_rows = i32::from(p.title.is_some());
            arrange_stack(inst, x + 1, y + 1 + title_rows, w - 2, h - 2 - title_rows)
                .map(|children| framed(x, y, w, h, children))
        }
        VNode::FocusZone(_) | VNode::FocusTrap(_) | VNode::Layer(_) | VNode::ResizablePanel(_) => {
            arrange_stack(inst, x, y, w, h).map(|children| framed(x, y, w, h, children))
        }
        VNode::Layers(_) => arrange_layers(inst, x, y, w, h),
        VNode::PanelGroup(p) => arrange_panel_group(inst, p.axis, x, y, w, h),
        VNode::SplitPane(p) => arrange_split(inst, p.axis, p.ratio, x, y, w, h),
        VNode::Composite(_) => {
            let mut children = Vec::with_capacity(1);
            for child in &inst.children {
                children.push(layout_node_sized(child, x, y, w, h, axis)?);
            }
            Ok(framed(x, y, w, h, children))
        }
        // Leaves: collections record scroll metadata for their viewport.
        VNode::VirtualList(p) => {
            let mut node = LayoutNode::leaf(Rect::new(x, y, w, h));
            node.meta = Some(ScrollMeta {
                scroll_x: 0,
                scroll_y: 0,
                content_width: w,
                content_height: p.items.len() as i32 * p.item_height.max(1),
                viewport_width: w,
                viewport_height: h,
            });
            Ok(node)
        }
        VNode::LogsConsole(p) => {
            let mut node = LayoutNode::leaf(Rect::new(x, y, w, h));
            node.meta = Some(ScrollMeta {
                scroll_x: 0,
                scroll_y: 0,
                content_width: w,
                content_height: p.lines.len() as i32,
                viewport_width: w,
                viewport_height: h,
            });
            Ok(node)
        }
        _ => Ok(LayoutNode::leaf(Rect::new(x, y, w, h))),
    }
}

fn framed(x: i32, y: i32, w: i32, h: i32, children: Vec<LayoutNode>) -> LayoutNode {
    LayoutNode {
        rect: Rect::new(x, y, w, h),
        children,
        meta: None,
    }
}

/// Effective insets of a flex container: border plus padding.
fn container_insets(p: &ContainerProps) -> Insets {
    let b = i32::from(p.border);
    Insets {
        top: p.padding.top + b,
        right: p.padding.right + b,
        bottom: p.padding.bottom + b,
        left: p.padding.left + b,
    }
}

struct FlowChild {
    index: usize,
    base_main: i32,
    intrinsic_cross: i32,
    flex: Option<f32>,
    contributing: bool,
}

pub(crate) fn flex_arrange(
    inst: &RuntimeInstance,
    p: &ContainerProps,
    main_axis: Axis,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
) -> Result<LayoutNode> {
    let path = kind_path(inst);
    let insets = container_insets(p);
    let content_x = x + insets.left;
    let content_y = y + insets.top;
    let content_w = (w - insets.horizontal()).max(0);
    let content_h = (h - insets.vertical()).max(0);
    let (content_main, content_cross) = match main_axis {
        Axis::Horizontal => (content_w, content_h),
        Axis::Vertical => (content_h, content_w),
    };

    // Pass 1: intrinsic measure and base sizes for flow children.
    let mut flow: Vec<FlowChild> = Vec::new();
    for (index, child) in inst.children.iter().enumerate() {
        if child.node.is_sparse() || is_absolute(child) {
            continue;
        }
        let (iw, ih) = measure_node(child, content_w, content_h, main_axis)?;
        let (i_main, i_cross) = match main_axis {
            Axis::Horizontal => (iw, ih),
            Axis::Vertical => (ih, iw),
        };
        let (main_dim, flex) = child
            .node
            .common()
            .map_or((Dim::Auto, None), |c| (main_dim_of(c, main_axis), c.flex));
        if let Some(f) = flex {
            if !f.is_finite() || f < 0.0 {
                return Err(RuntimeError::invalid_props(format!("{path}.flex: bad weight {f}")));
            }
        }
        let base_main = resolve_dim(main_dim, content_main, i_main, &format!("{path}.child"))?;
        let contributing = base_main > 0 || flex.is_some();
        flow.push(FlowChild {
            index,
            base_main,
            intrinsic_cross: i_cross,
            flex,
            contributing,
        });
    }

    // Pass 2: flex redistribution of remaining main-axis space.
    let contributing_count = flow.iter().filter(|c| c.contributing).count() as i32;
    let gap_total = p.gap.max(0) * (contributing_count - 1).max(0);
    let base_total: i32 = flow.iter().map(|c| c.base_main).sum();
    let remaining = content_main - base_total - gap_total;
    let flex_total: f32 = flow.iter().filter_map(|c| c.flex).sum();
    let mut shares: Vec<i32> = vec![0; flow.len()];
    if remaining > 0 && flex_total > 0.0 {
        let mut given = 0i32;
        let mut flex_indices = Vec::new();
        for (i, child) in flow.iter().enumerate() {
            if let Some(f) = child.flex {
                let share =
                    ((f64::from(remaining) * f64::from(f)) / f64::from(flex_total)).floor() as i32;
                shares[i] = share;
                given += share;
                flex_indices.push(i);
            }
        }
        // Hand out the integer remainder left to right.
        let mut leftover = remaining - given;
        for &i in &flex_indices {
            if leftover == 0 {
                break;
            }
            shares[i] += 1;
            leftover -= 1;
        }
    }

    // Main-axis totals and justify offsets over the content rect minus
    // the gap total.
    let final_total: i32 = flow
        .iter()
        .enumerate()
        .map(|(i, c)| c.base_main + shares[i])
        .sum::<i32>()
        + gap_total;
    let leftover = (content_main - final_total).max(0);
    let (lead, between_extra) = justify_offsets(p.justify, leftover, contributing_count);

    // Pass 3+4: place children in declaration order.
    let mut nodes: Vec<Option<LayoutNode>> = (0..inst.children.len()).map(|_| None).collect();
    let mut cursor = lead;
    let mut seen_contributing = false;
    for (fi, fc) in flow.iter().enumerate() {
        let child = &inst.children[fc.index];
        if fc.contributing && seen_contributing {
            cursor += p.gap.max(0) + between_extra;
        }
        if fc.contributing {
            seen_contributing = true;
        }
        let child_main = (fc.base_main + shares[fi]).max(0);
        let cross_dim = child
            .node
            .common()
            .map_or(Dim::Auto, |c| cross_dim_of(c, main_axis));
        let mut child_cross = match cross_dim {
            Dim::Auto => {
                if p.align == Align::Stretch {
                    content_cross
                } else {
                    fc.intrinsic_cross
                }
            }
            other => resolve_dim(other, content_cross, fc.intrinsic_cross, &format!("{path}.child"))?,
        };
        child_cross = child_cross.clamp(0, content_cross);
        let cross_offset = match p.align {
            Align::Start | Align::Stretch => 0,
            Align::Center => (content_cross - child_cross) / 2,
            Align::End => content_cross - child_cross,
        };
        let (cx, cy, cw, ch) = match main_axis {
            Axis::Horizontal => (content_x + cursor, content_y + cross_offset, child_main, child_cross),
            Axis::Vertical => (content_x + cross_offset, content_y + cursor, child_cross, child_main),
        };
        nodes[fc.index] = Some(layout_node_sized(child, cx, cy, cw, ch, main_axis)?);
        cursor += child_main;
    }

    // Absolute children resolve against the content origin and do not
    // affect flow sizing.
    for (index, child) in inst.children.iter().enumerate() {
        if nodes[index].is_some() {
            continue;
        }
        if child.node.is_sparse() {
            nodes[index] = Some(LayoutNode::leaf(Rect::new(content_x, content_y, 0, 0)));
            continue;
        }
        nodes[index] = Some(arrange_absolute(
            child, content_x, content_y, content_w, content_h, main_axis,
        )?);
    }
    let mut children: Vec<LayoutNode> = nodes.into_iter().flatten().collect();

    // Overflow: extent over the unscrolled child rects.
    let mut meta = None;
    if matches!(p.overflow, Overflow::Hidden | Overflow::Scroll) {
        let content_right = children.iter().map(|c| c.rect.right()).max().unwrap_or(content_x);
        let content_bottom = children.iter().map(|c| c.rect.bottom()).max().unwrap_or(content_y);
        let extent_w = (content_right - content_x).max(0);
        let extent_h = (content_bottom - content_y).max(0);
        let scroll_x = p.scroll_x.clamp(0, (extent_w - content_w).max(0));
        let scroll_y = p.scroll_y.clamp(0, (extent_h - content_h).max(0));
        if scroll_x != 0 || scroll_y != 0 {
            for child in &mut children {
                child.shift(-scroll_x, -scroll_y);
            }
        }
        let viewport = Rect::new(content_x, content_y, content_w, content_h);
        for child in &mut children {
            if !child.rect.is_empty() && !child.rect.intersects(&viewport) {
                child.zero();
            }
        }
        meta = Some(ScrollMeta {
            scroll_x,
            scroll_y,
            content_width: extent_w,
            content_height: extent_h,
            viewport_width: content_w,
            viewport_height: content_h,
        });
    }

    Ok(LayoutNode {
        rect: Rect::new(x, y, w, h),
        children,
        meta,
    })
}

fn is_absolute(inst: &RuntimeInstance) -> bool {
    inst.node
        .common()
        .is_some_and(|c| c.position == Position::Absolute)
}

fn main_dim_of(c: &Common, axis: Axis) -> Dim {
    match axis {
        Axis::Horizontal => c.width,
        Axis::Vertical => c.height,
    }
}

fn cross_dim_of(c: &Common, axis: Axis) -> Dim {
    match axis {
        Axis::Horizontal => c.height,
        Axis::Vertical => c.width,
    }
}

fn justify_offsets(justify: Justify, leftover: i32, contributing: i32) -> (i32, i32) {
    match justify {
        Justify::Start => (0, 0),
        Justify::Center => (leftover / 2, 0),
        Justify::End => (leftover, 0),
        Justify::SpaceBetween => {
            if contributing > 1 {
                (0, leftover / (contributing - 1))
            } else {
                (0, 0)
            }
        }
        Justify::SpaceAround => {
            if contributing > 0 {
                let around = leftover / contributing;
                (around / 2, around)
            } else {
                (0, 0)
            }
        }
    }
}

/// Positions an out-of-flow child from `{top, bottom, left, right,
/// width, height}`: explicit size wins; paired offsets without a size
/// stretch across; offsets are relative to the content origin.
fn arrange_absolute(
    inst: &RuntimeInstance,
    content_x: i32,
    content_y: i32,
    content_w: i32,
    content_h: i32,
    axis: Axis,
) -> Result<LayoutNode> {
    let common = inst.node.common().cloned().unwrap_or_default();
    let (iw, ih) = measure_node(inst, content_w, content_h, axis)?;
    let path = kind_path(inst);

    let w = match (common.width, common.left, common.right) {
        (Dim::Auto, Some(l), Some(r)) => (content_w - l - r).max(0),
        (dim, _, _) => resolve_dim(dim, content_w, iw, &format!("{path}.width"))?,
    };
    let h = match (common.height, common.top, common.bottom) {
        (Dim::Auto, Some(t), Some(b)) => (content_h - t - b).max(0),
        (dim, _, _) => resolve_dim(dim, content_h, ih, &format!("{path}.height"))?,
    };
    let x = match (common.left, common.right) {
        (Some(l), _) => content_x + l,
        (None, Some(r)) => content_x + content_w - r - w,
        (None, None) => content_x,
    };
    let y = match (common.top, common.bottom) {
        (Some(t), _) => content_y + t,
        (None, Some(b)) => content_y + content_h - b - h,
        (None, None) => content_y,
    };
    layout_node_sized(inst, x, y, w, h, axis)
}

/// Field: one label row, then children stacked beneath.
fn arrange_field(inst: &RuntimeInstance, x: i32, y: i32, w: i32, h: i32) -> Result<LayoutNode> {
    let children = stack_children(inst, x, y + 1, w, (h - 1).max(0))?;
    Ok(framed(x, y, w, h, children))
}

fn arrange_stack(inst: &RuntimeInstance, x: i32, y: i32, w: i32, h: i32) -> Result<Vec<LayoutNode>> {
    stack_children(inst, x, y, w.max(0), h.max(0))
}

/// Plain vertical stack with no gap or justify, used by the transparent
/// wrapper containers.
fn stack_children(
    inst: &RuntimeInstance,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
) -> Result<Vec<LayoutNode>> {
    let mut out = Vec::with_capacity(inst.children.len());
    let mut cy = y;
    for child in &inst.children {
        if child.node.is_sparse() {
            out.push(LayoutNode::leaf(Rect::new(x, cy, 0, 0)));
            continue;
        }
        let remaining = (h - (cy - y)).max(0);
        let node = layout_node(child, x, cy, w, remaining, Axis::Vertical)?;
        cy += node.rect.h;
        out.push(node);
    }
    Ok(out)
}

/// Layers: every child is placed over the full rect; a child with
/// offsets or explicit dims positions itself, otherwise it is centered.
fn arrange_layers(inst: &RuntimeInstance, x: i32, y: i32, w: i32, h: i32) -> Result<LayoutNode> {
    let mut children = Vec::with_capacity(inst.children.len());
    for child in &inst.children {
        if child.node.is_sparse() {
            children.push(LayoutNode::leaf(Rect::new(x, y, 0, 0)));
            continue;
        }
        let common = child.node.common().cloned().unwrap_or_default();
        let (iw, ih) = measure_node(child, w, h, Axis::Vertical)?;
        let path = kind_path(child);
        let cw = resolve_dim(common.width, w, iw, &format!("{path}.width"))?;
        let ch = resolve_dim(common.height, h, ih, &format!("{path}.height"))?;
        let cx = match (common.left, common.right) {
            (Some(l), _) => x + l,
            (None, Some(r)) => x + w - r - cw,
            (None, None) => x + (w - cw) / 2,
        };
        let cy = match (common.top, common.bottom) {
            (Some(t), _) => y + t,
            (None, Some(b)) => y + h - b - ch,
            (None, None) => y + (h - ch) / 2,
        };
        children.push(layout_node_sized(child, cx, cy, cw, ch, Axis::Vertical)?);
    }
    Ok(framed(x, y, w, h, children))
}

/// PanelGroup: main axis split by normalized child ratios, honoring
/// each panel's minimum size.
fn arrange_panel_group(
    inst: &RuntimeInstance,
    axis: Axis,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
) -> Result<LayoutNode> {
    let main = match axis {
        Axis::Horizontal => w,
        Axis::Vertical => h,
    };
    let ratios: Vec<(f32, i32)> = inst
        .children
        .iter()
        .map(|c| match &c.node {
            VNode::ResizablePanel(p) => (p.ratio.clamp(0.0, 1.0).max(0.01), p.min_size.max(0)),
            _ => (1.0, 0),
        })
        .collect();
    let total: f32 = ratios.iter().map(|(r, _)| r).sum();
    let mut sizes: Vec<i32> = ratios
        .iter()
        .map(|(r, min)| {
            let share = ((f64::from(main) * f64::from(*r)) / f64::from(total.max(0.01))).floor() as i32;
            share.max(*min)
        })
        .collect();
    // Trim overshoot from the last panel so the group fits its rect.
    let overshoot: i32 = sizes.iter().sum::<i32>() - main;
    if overshoot > 0 {
        if let Some(last) = sizes.last_mut() {
            *last = (*last - overshoot).max(0);
        }
    }

    let mut children = Vec::with_capacity(inst.children.len());
    let mut cursor = 0;
    for (child, size) in inst.children.iter().zip(sizes) {
        let (cx, cy, cw, ch) = match axis {
            Axis::Horizontal => (x + cursor, y, size, h),
            Axis::Vertical => (x, y + cursor, w, size),
        };
        children.push(layout_node_sized(child, cx, cy, cw, ch, axis)?);
        cursor += size;
    }
    Ok(framed(x, y, w, h, children))
}

/// SplitPane: first child takes `ratio` of the main axis, the second the
/// rest; extra children are zeroed.
fn arrange_split(
    inst: &RuntimeInstance,
    axis: Axis,
    ratio: f32,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
) -> Result<LayoutNode> {
    if !ratio.is_finite() {
        return Err(RuntimeError::invalid_props("splitpane.ratio: not finite"));
    }
    let ratio = ratio.clamp(0.0, 1.0);
    let main = match axis {
        Axis::Horizontal => w,
        Axis::Vertical => h,
    };
    let first = ((f64::from(main) * f64::from(ratio)).floor() as i32).clamp(0, main);
    let second = main - first;
    let mut children = Vec::with_capacity(inst.children.len());
    for (i, child) in inst.children.iter().enumerate() {
        let node = match i {
            0 => {
                let (cw, ch) = match axis {
                    Axis::Horizontal => (first, h),
                    Axis::Vertical => (w, first),
                };
                layout_node_sized(child, x, y, cw, ch, axis)?
            }
            1 => {
                let (cx, cy, cw, ch) = match axis {
                    Axis::Horizontal => (x + first, y, second, h),
                    Axis::Vertical => (x, y + first, w, second),
                };
                layout_node_sized(child, cx, cy, cw, ch, axis)?
            }
            _ => LayoutNode::leaf(Rect::new(x, y, 0, 0)),
        };
        children.push(node);
    }
    Ok(framed(x, y, w, h, children))
}

/// Intrinsic size of a container kind: children flow plus insets.
pub(crate) fn measure_container(
    inst: &RuntimeInstance,
    max_w: i32,
    max_h: i32,
) -> Result<(i32, i32)> {
    let (out_w, out_h) = match &inst.node {
        VNode::Row(p) => {
            let (main, cross) = measure_flow(inst, p, Axis::Horizontal, max_w, max_h)?;
            let insets = container_insets(p);
            (main + insets.horizontal(), cross + insets.vertical())
        }
        VNode::Column(p) | VNode::Box(p) => {
            let (main, cross) = measure_flow(inst, p, Axis::Vertical, max_w, max_h)?;
            let insets = container_insets(p);
            (cross + insets.horizontal(), main + insets.vertical())
        }
        VNode::Field(p) => {
            let (cw, ch) = measure_stack(inst, max_w, max_h)?;
            (cw.max(cell_width(&p.label)), ch + 1)
        }
        VNode::Modal(p) => {
            let (cw, ch) = measure_stack(inst, max_w - 2, max_h - 2)?;
            (cw + 2, ch + 2 + i32::from(p.title.is_some()))
        }
        VNode::FocusZone(_) | VNode::FocusTrap(_) | VNode::Layer(_) | VNode::ResizablePanel(_) => {
            measure_stack(inst, max_w, max_h)?
        }
        // Overlay hosts and panel groups fill what they are given.
        VNode::Layers(_) | VNode::PanelGroup(_) | VNode::SplitPane(_) => (max_w, max_h),
        _ => (0, 0),
    };
    Ok((out_w.clamp(0, max_w.max(0)), out_h.clamp(0, max_h.max(0))))
}

fn measure_flow(
    inst: &RuntimeInstance,
    p: &ContainerProps,
    axis: Axis,
    max_w: i32,
    max_h: i32,
) -> Result<(i32, i32)> {
    let mut main = 0;
    let mut cross = 0;
    let mut contributing = 0;
    for child in &inst.children {
        if child.node.is_sparse() || is_absolute(child) {
            continue;
        }
        let (iw, ih) = measure_node(child, max_w, max_h, axis)?;
        let (c_main, c_cross) = match axis {
            Axis::Horizontal => (iw, ih),
            Axis::Vertical => (ih, iw),
        };
        main += c_main;
        cross = cross.max(c_cross);
        if c_main > 0 {
            contributing += 1;
        }
    }
    main += p.gap.max(0) * (contributing - 1_i32).max(0);
    Ok((main, cross))
}

fn measure_stack(inst: &RuntimeInstance, max_w: i32, max_h: i32) -> Result<(i32, i32)> {
    let mut width = 0;
    let mut height = 0;
    for child in &inst.children {
        if child.node.is_sparse() {
            continue;
        }
        let (iw, ih) = measure_node(child, max_w.max(0), max_h.max(0), Axis::Vertical)?;
        width = width.max(iw);
        height += ih;
    }
    Ok((width, height))
}
