//! Per-widget drawing: basic text widgets, charts, collections,
//! overlays, and editors.

use tstyle::{AttrFlags, ColorRef, ResolvedStyle, StyleOverride};
use twire::{CursorShape, TextSegment};

use crate::geometry::Rect;
use crate::glyph::{cell_width, grapheme_count, graphemes, icon, truncate_to_cells};
use crate::input::TreeState;
use crate::props::*;

use super::{CursorReq, Emitted, RenderCx};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPARK_LEVELS: [&str; 8] = ["▁", "▂", "▃", "▄", "▅", "▆", "▇", "█"];

/// Period of one spinner animation step.
pub const SPINNER_TICK_MS: u64 = 100;

fn muted(cx: &mut RenderCx<'_>, style: ResolvedStyle) -> ResolvedStyle {
    cx.styled(
        style,
        &StyleProps {
            fg: Some(ColorRef::Named("fg.muted".into())),
            ..Default::default()
        },
    )
}

fn toned(cx: &mut RenderCx<'_>, style: ResolvedStyle, token: &str) -> ResolvedStyle {
    cx.styled(
        style,
        &StyleProps {
            fg: Some(ColorRef::Named(token.into())),
            ..Default::default()
        },
    )
}

fn severity_token(level: Severity) -> &'static str {
    match level {
        Severity::Info => "status.info",
        Severity::Success => "status.success",
        Severity::Warning => "status.warning",
        Severity::Error => "status.error",
    }
}

fn attr(cx: &mut RenderCx<'_>, style: ResolvedStyle, flag: AttrFlags) -> ResolvedStyle {
    cx.cache.merge(style, &StyleOverride::attr(flag, true))
}

// ---------------------------------------------------------------------------
// Basic widgets
// ---------------------------------------------------------------------------

pub(crate) fn draw_text_node(
    cx: &mut RenderCx<'_>,
    p: &TextProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let style = cx.styled(inherited, &p.style);
    match (p.text_overflow, p.max_width) {
        (TextOverflow::Clip, Some(max)) => {
            cx.builder.push_clip(rect.x, rect.y, max.min(rect.w), 1);
            cx.text(rect.x, rect.y, &p.text, style, opacity);
            cx.builder.pop_clip();
        }
        _ => cx.text(rect.x, rect.y, &p.text, style, opacity),
    }
    Emitted::leaf()
}

pub(crate) fn draw_rich_text(
    cx: &mut RenderCx<'_>,
    p: &RichTextProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    // Rich runs dedup well across frames; fall back to plain segments
    // when the builder declines the blob.
    let segments: Vec<TextSegment> = p
        .spans
        .iter()
        .map(|span| TextSegment {
            text: span.text.clone(),
            style: cx.styled(inherited, &span.style),
        })
        .collect();
    if opacity >= 1.0 {
        if let Some(index) = cx.builder.add_text_run_blob(&segments) {
            cx.builder.draw_text_run(rect.x, rect.y, index);
            return Emitted::leaf();
        }
    }
    let mut x = rect.x;
    for seg in &segments {
        cx.text(x, rect.y, &seg.text, seg.style, opacity);
        x += cell_width(&seg.text);
    }
    Emitted::leaf()
}

pub(crate) fn draw_button(
    cx: &mut RenderCx<'_>,
    p: &ButtonProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let mut style = cx.styled(inherited, &p.style);
    if p.disabled {
        style = attr(cx, style, AttrFlags::DIM);
    } else if cx.is_focused(&p.id) {
        style = attr(cx, style, AttrFlags::INVERSE);
    }
    cx.text(rect.x, rect.y, &format!("[ {} ]", p.label), style, opacity);
    Emitted::leaf()
}

pub(crate) fn draw_input(
    cx: &mut RenderCx<'_>,
    p: &InputProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let focused = cx.is_focused(&p.id);
    let editor = cx.stores.editors.get(&p.id);
    let value = editor
        .filter(|e| e.value() == p.value || focused)
        .map(|e| e.value().to_string())
        .unwrap_or_else(|| p.value.clone());
    let shown = if p.masked {
        "\u{2022}".repeat(grapheme_count(&value))
    } else {
        value.clone()
    };

    if shown.is_empty() {
        if let Some(placeholder) = &p.placeholder {
            let ph = muted(cx, inherited);
            cx.text(rect.x, rect.y, truncate_to_cells(placeholder, rect.w), ph, opacity);
        }
    } else {
        let style = if p.disabled {
            attr(cx, inherited, AttrFlags::DIM)
        } else {
            inherited
        };
        if let Some((sel_a, sel_b)) = editor.and_then(|e| e.selection()).filter(|_| focused) {
            let gs: Vec<&str> = graphemes(&shown).collect();
            let before: String = gs.iter().take(sel_a).copied().collect();
            let selected: String = gs.iter().take(sel_b).skip(sel_a).copied().collect();
            let after: String = gs.iter().skip(sel_b).copied().collect();
            let inverse = attr(cx, style, AttrFlags::INVERSE);
            let mut x = rect.x;
            cx.text(x, rect.y, &before, style, opacity);
            x += cell_width(&before);
            cx.text(x, rect.y, &selected, inverse, opacity);
            x += cell_width(&selected);
            cx.text(x, rect.y, &after, style, opacity);
        } else {
            cx.text(rect.x, rect.y, truncate_to_cells(&shown, rect.w), style, opacity);
        }
    }

    if focused && !p.disabled {
        let cursor_cells = editor.map_or_else(
            || cell_width(&shown),
            |e| {
                let gs: Vec<&str> = graphemes(&shown).collect();
                gs.iter().take(e.cursor()).map(|g| cell_width(g)).sum()
            },
        );
        cx.set_cursor(CursorReq {
            x: rect.x + cursor_cells.min((rect.w - 1).max(0)),
            y: rect.y,
            shape: CursorShape::Bar,
            blink: true,
        });
    }
    Emitted::leaf()
}

pub(crate) fn draw_select(
    cx: &mut RenderCx<'_>,
    p: &SelectProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let mut style = inherited;
    if p.disabled {
        style = attr(cx, style, AttrFlags::DIM);
    } else if cx.is_focused(&p.id) {
        style = attr(cx, style, AttrFlags::INVERSE);
    }
    let value = p.options.get(p.selected).map(String::as_str).unwrap_or("");
    cx.text(rect.x, rect.y, &format!("\u{2039} {value} \u{203a}"), style, opacity);
    Emitted::leaf()
}

pub(crate) fn draw_checkbox(
    cx: &mut RenderCx<'_>,
    p: &CheckboxProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let mut style = inherited;
    if p.disabled {
        style = attr(cx, style, AttrFlags::DIM);
    } else if cx.is_focused(&p.id) {
        style = attr(cx, style, AttrFlags::INVERSE);
    }
    let mark = if p.checked { "x" } else { " " };
    cx.text(rect.x, rect.y, &format!("[{mark}] {}", p.label), style, opacity);
    Emitted::leaf()
}

pub(crate) fn draw_radio_group(
    cx: &mut RenderCx<'_>,
    p: &RadioGroupProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let focused = cx.is_focused(&p.id);
    for (i, option) in p.options.iter().enumerate() {
        let y = rect.y + i as i32;
        if y >= rect.bottom() {
            break;
        }
        let mark = if i == p.selected { "\u{25cf}" } else { " " };
        let mut style = inherited;
        if p.disabled {
            style = attr(cx, style, AttrFlags::DIM);
        } else if focused && i == p.selected {
            style = attr(cx, style, AttrFlags::INVERSE);
        }
        cx.text(rect.x, y, &format!("({mark}) {option}"), style, opacity);
    }
    Emitted::leaf()
}

pub(crate) fn draw_badge(
    cx: &mut RenderCx<'_>,
    p: &BadgeProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let base = cx.styled(inherited, &p.style);
    let style = attr(cx, base, AttrFlags::INVERSE);
    cx.text(rect.x, rect.y, &format!(" {} ", p.text), style, opacity);
    Emitted::leaf()
}

pub(crate) fn draw_spinner(
    cx: &mut RenderCx<'_>,
    p: &SpinnerProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let frame = SPINNER_FRAMES[((cx.tick_ms / SPINNER_TICK_MS) as usize) % SPINNER_FRAMES.len()];
    let accent = toned(cx, inherited, "accent.primary");
    cx.text(rect.x, rect.y, frame, accent, opacity);
    if let Some(label) = &p.label {
        cx.text(rect.x + 2, rect.y, label, inherited, opacity);
    }
    Emitted::leaf()
}

pub(crate) fn draw_progress(
    cx: &mut RenderCx<'_>,
    p: &ProgressProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let bar_w = (rect.w - p.label.as_deref().map_or(0, |l| cell_width(l) + 1)).max(1);
    let accent = toned(cx, inherited, "accent.primary");
    let mut bar = String::new();
    if p.indeterminate {
        let pos = ((cx.tick_ms / SPINNER_TICK_MS) as i32) % bar_w.max(1);
        for i in 0..bar_w {
            bar.push(if (i - pos).abs() <= 1 { '\u{2588}' } else { '\u{2591}' });
        }
    } else {
        let filled = ((f64::from(bar_w) * f64::from(p.value.clamp(0.0, 1.0))).round()) as i32;
        for i in 0..bar_w {
            bar.push(if i < filled { '\u{2588}' } else { '\u{2591}' });
        }
    }
    cx.text(rect.x, rect.y, &bar, accent, opacity);
    if let Some(label) = &p.label {
        cx.text(rect.x + bar_w + 1, rect.y, label, inherited, opacity);
    }
    Emitted::leaf()
}

pub(crate) fn draw_skeleton(
    cx: &mut RenderCx<'_>,
    p: &SkeletonProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let style = muted(cx, inherited);
    let line = "\u{2591}".repeat(rect.w.max(0) as usize);
    for i in 0..p.lines.max(1).min(rect.h) {
        cx.text(rect.x, rect.y + i, &line, style, opacity);
    }
    Emitted::leaf()
}

pub(crate) fn draw_icon(
    cx: &mut RenderCx<'_>,
    p: &IconProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let style = cx.styled(inherited, &p.style);
    cx.text(rect.x, rect.y, icon(&p.name).glyph, style, opacity);
    Emitted::leaf()
}

pub(crate) fn draw_kbd(
    cx: &mut RenderCx<'_>,
    p: &KbdProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let base = muted(cx, inherited);
    let style = attr(cx, base, AttrFlags::INVERSE);
    cx.text(rect.x, rect.y, &format!(" {} ", p.keys), style, opacity);
    Emitted::leaf()
}

pub(crate) fn draw_status(
    cx: &mut RenderCx<'_>,
    p: &StatusProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let dot = toned(cx, inherited, severity_token(p.level));
    cx.text(rect.x, rect.y, "\u{25cf}", dot, opacity);
    cx.text(rect.x + 2, rect.y, &p.text, inherited, opacity);
    Emitted::leaf()
}

pub(crate) fn draw_tag(
    cx: &mut RenderCx<'_>,
    p: &TagProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let style = cx.styled(inherited, &p.style);
    cx.text(rect.x, rect.y, &format!("[{}]", p.text), style, opacity);
    Emitted::leaf()
}

pub(crate) fn draw_gauge(
    cx: &mut RenderCx<'_>,
    p: &GaugeProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let bar_w = 10.min(rect.w).max(1);
    let filled = ((f64::from(bar_w) * f64::from(p.value.clamp(0.0, 1.0))).round()) as i32;
    let mut bar = String::new();
    for i in 0..bar_w {
        bar.push(if i < filled { '\u{25a0}' } else { '\u{25a1}' });
    }
    let accent = toned(cx, inherited, "accent.primary");
    cx.text(rect.x, rect.y, &bar, accent, opacity);
    if let Some(label) = &p.label {
        cx.text(rect.x + bar_w + 1, rect.y, label, inherited, opacity);
    }
    Emitted::leaf()
}

pub(crate) fn draw_error_display(
    cx: &mut RenderCx<'_>,
    p: &ErrorDisplayProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let error = toned(cx, inherited, "status.error");
    let title_style = attr(cx, error, AttrFlags::BOLD);
    cx.text(rect.x, rect.y, &format!("\u{2717} {}", p.title), title_style, opacity);
    let mut y = rect.y + 1;
    if let Some(detail) = &p.detail {
        let dim = muted(cx, inherited);
        cx.text(rect.x + 2, y, truncate_to_cells(detail, rect.w - 2), dim, opacity);
        y += 1;
    }
    if let Some(retry_id) = &p.retry_id {
        let mut style = inherited;
        if cx.is_focused(retry_id) {
            style = attr(cx, style, AttrFlags::INVERSE);
        }
        cx.text(rect.x + 2, y, "[ Retry ]", style, opacity);
    }
    Emitted::leaf()
}

pub(crate) fn draw_callout(
    cx: &mut RenderCx<'_>,
    p: &CalloutProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let tone = toned(cx, inherited, severity_token(p.level));
    let title_style = attr(cx, tone, AttrFlags::BOLD);
    for i in 0..rect.h.min(3) {
        cx.text(rect.x, rect.y + i, "\u{2503}", tone, opacity);
    }
    cx.text(rect.x + 2, rect.y, &p.title, title_style, opacity);
    if rect.h > 1 {
        cx.text(
            rect.x + 2,
            rect.y + 1,
            truncate_to_cells(&p.body, rect.w - 2),
            inherited,
            opacity,
        );
    }
    Emitted::leaf()
}

pub(crate) fn draw_divider(
    cx: &mut RenderCx<'_>,
    p: &DividerProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let style = muted(cx, inherited);
    if p.vertical {
        for y in rect.y..rect.bottom() {
            cx.text(rect.x, y, "\u{2502}", style, opacity);
        }
    } else {
        cx.text(rect.x, rect.y, &"\u{2500}".repeat(rect.w.max(0) as usize), style, opacity);
        if let Some(label) = &p.label {
            let x = rect.x + (rect.w - cell_width(label) - 2).max(0) / 2;
            cx.text(x, rect.y, &format!(" {label} "), style, opacity);
        }
    }
    Emitted::leaf()
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

fn spark_level(value: f64, min: f64, max: f64) -> &'static str {
    if !value.is_finite() || max <= min {
        return SPARK_LEVELS[0];
    }
    let norm = ((value - min) / (max - min)).clamp(0.0, 1.0);
    let idx = (norm * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
    SPARK_LEVELS[idx.min(SPARK_LEVELS.len() - 1)]
}

pub(crate) fn draw_sparkline(
    cx: &mut RenderCx<'_>,
    p: &SparklineProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let style = cx.styled(inherited, &p.style);
    let min = p.values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = p.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut line = String::new();
    for value in p.values.iter().take(rect.w.max(0) as usize) {
        line.push_str(spark_level(*value, min, max));
    }
    cx.text(rect.x, rect.y, &line, style, opacity);
    Emitted::leaf()
}

pub(crate) fn draw_bar_chart(
    cx: &mut RenderCx<'_>,
    p: &BarChartProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let style = cx.styled(inherited, &p.style);
    let accent = toned(cx, inherited, "accent.primary");
    let max = p
        .values
        .iter()
        .map(|(_, v)| *v)
        .fold(f64::NEG_INFINITY, f64::max);
    let label_w = p
        .values
        .iter()
        .map(|(l, _)| cell_width(l))
        .max()
        .unwrap_or(0);
    let bar_space = (rect.w - label_w - 1).max(1);
    for (i, (label, value)) in p.values.iter().enumerate() {
        let y = rect.y + i as i32;
        if y >= rect.bottom() {
            break;
        }
        cx.text(rect.x, y, label, style, opacity);
        let filled = if max > 0.0 && value.is_finite() {
            ((f64::from(bar_space) * (value / max).clamp(0.0, 1.0)).round()) as i32
        } else {
            0
        };
        let bar = "\u{2587}".repeat(filled.max(0) as usize);
        cx.text(rect.x + label_w + 1, y, &bar, accent, opacity);
    }
    Emitted::leaf()
}

pub(crate) fn draw_mini_chart(
    cx: &mut RenderCx<'_>,
    p: &MiniChartProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let style = cx.styled(inherited, &p.style);
    let min = p.values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = p.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let rows = rect.h.max(1);
    for (i, value) in p.values.iter().take(rect.w.max(0) as usize).enumerate() {
        let norm = if max > min && value.is_finite() {
            ((value - min) / (max - min)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let height = match p.chart {
            MiniChartKind::Bars => ((f64::from(rows) * norm).ceil() as i32).max(1),
            MiniChartKind::Line => 1,
        };
        match p.chart {
            MiniChartKind::Bars => {
                for r in 0..height.min(rows) {
                    cx.text(rect.x + i as i32, rect.bottom() - 1 - r, "\u{2588}", style, opacity);
                }
            }
            MiniChartKind::Line => {
                let row = rows - 1 - ((f64::from(rows - 1) * norm).round() as i32);
                cx.text(rect.x + i as i32, rect.y + row, "\u{25cf}", style, opacity);
            }
        }
    }
    Emitted::leaf()
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

pub(crate) fn draw_virtual_list(
    cx: &mut RenderCx<'_>,
    p: &VirtualListProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let (scroll_top, selected) = cx
        .stores
        .vlists
        .get(&p.id)
        .map(|s| (s.scroll_top, s.selected_index))
        .unwrap_or((0, 0));
    let item_h = p.item_height.max(1);
    let first = (scroll_top / item_h).max(0) as usize;
    let visible_rows = (rect.h / item_h).max(0) as usize + 1;
    let focused = cx.is_focused(&p.id);
    cx.builder.push_clip(rect.x, rect.y, rect.w, rect.h);
    for (offset, item) in p
        .items
        .iter()
        .skip(first)
        .take(visible_rows)
        .enumerate()
    {
        let index = first + offset;
        let y = rect.y + (index as i32 * item_h) - scroll_top;
        let mut style = inherited;
        if index == selected {
            style = attr(cx, style, AttrFlags::INVERSE);
            if !focused {
                style = attr(cx, style, AttrFlags::DIM);
            }
        }
        cx.text(rect.x, y, truncate_to_cells(item, rect.w), style, opacity);
    }
    cx.builder.pop_clip();
    Emitted::leaf()
}

pub(crate) fn draw_table(
    cx: &mut RenderCx<'_>,
    p: &TableProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let state = cx.stores.tables.get(&p.id);
    let (focused_row, focused_col, scroll_top) = state
        .map(|s| (s.focused_row, s.focused_col, s.scroll_top))
        .unwrap_or((if p.show_header { -1 } else { 0 }, 0, 0));
    let focused = cx.is_focused(&p.id);
    let columns = p.columns.as_ref();
    if columns.is_empty() {
        return Emitted::leaf();
    }
    let default_w = (rect.w / columns.len() as i32).max(4);
    let widths: Vec<i32> = columns.iter().map(|c| c.width.unwrap_or(default_w)).collect();

    cx.builder.push_clip(rect.x, rect.y, rect.w, rect.h);
    let mut y = rect.y;
    if p.show_header {
        let mut x = rect.x;
        for (ci, col) in columns.iter().enumerate() {
            let mut style = attr(cx, inherited, AttrFlags::BOLD);
            if focused && focused_row == -1 && ci == focused_col {
                style = attr(cx, style, AttrFlags::INVERSE);
            }
            let marker = match &p.sort {
                Some((key, SortDir::Asc)) if *key == col.key => " \u{25b2}",
                Some((key, SortDir::Desc)) if *key == col.key => " \u{25bc}",
                _ => "",
            };
            let label = format!("{}{}", col.title, marker);
            cx.text(x, y, truncate_to_cells(&label, widths[ci]), style, opacity);
            x += widths[ci] + 1;
        }
        y += 1;
    }
    let body_rows = (rect.h - i32::from(p.show_header)).max(0) as usize;
    for (offset, row) in p
        .rows
        .iter()
        .skip(scroll_top.max(0) as usize)
        .take(body_rows)
        .enumerate()
    {
        let row_index = scroll_top.max(0) + offset as i32;
        let mut x = rect.x;
        for (ci, cell) in row.cells.iter().enumerate() {
            let Some(w) = widths.get(ci) else { break };
            let mut style = inherited;
            if focused && row_index == focused_row && ci == focused_col {
                style = attr(cx, style, AttrFlags::INVERSE);
            } else if row_index == focused_row {
                style = attr(cx, style, AttrFlags::BOLD);
            }
            cx.text(x, y, truncate_to_cells(cell, *w), style, opacity);
            x += w + 1;
        }
        y += 1;
    }
    cx.builder.pop_clip();
    Emitted::leaf()
}

fn draw_tree_rows(
    cx: &mut RenderCx<'_>,
    id: &str,
    props: &TreeProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
    show_icons: bool,
) -> Emitted {
    let default_state = TreeState::default();
    let state = cx.stores.trees.get(id).unwrap_or(&default_state);
    let rows = state.flat_rows(props);
    let focused = cx.is_focused(id);
    cx.builder.push_clip(rect.x, rect.y, rect.w, rect.h);
    for (i, row) in rows
        .iter()
        .skip(state.scroll_top.max(0) as usize)
        .take(rect.h.max(0) as usize)
        .enumerate()
    {
        let y = rect.y + i as i32;
        let marker = if row.loading {
            "\u{2026}"
        } else if !row.has_children {
            " "
        } else if row.expanded {
            "\u{25be}"
        } else {
            "\u{25b8}"
        };
        let glyph = if show_icons {
            if row.has_children { "\u{25a3} " } else { "\u{25a1} " }
        } else {
            ""
        };
        let line = format!(
            "{}{} {}{}",
            "  ".repeat(row.depth),
            marker,
            glyph,
            row.label
        );
        let mut style = inherited;
        if focused && state.focused_key.as_deref() == Some(row.key.as_str()) {
            style = attr(cx, style, AttrFlags::INVERSE);
        }
        cx.text(rect.x, y, truncate_to_cells(&line, rect.w), style, opacity);
    }
    cx.builder.pop_clip();
    Emitted::leaf()
}

pub(crate) fn draw_tree(
    cx: &mut RenderCx<'_>,
    p: &TreeProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    draw_tree_rows(cx, &p.id, p, rect, inherited, opacity, false)
}

pub(crate) fn draw_file_tree(
    cx: &mut RenderCx<'_>,
    p: &FileTreeExplorerProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let tree_props = TreeProps {
        common: p.common.clone(),
        id: p.id.clone(),
        nodes: p.nodes.clone(),
        lazy: false,
    };
    draw_tree_rows(cx, &p.id, &tree_props, rect, inherited, opacity, p.show_icons)
}

pub(crate) fn draw_file_picker(
    cx: &mut RenderCx<'_>,
    p: &FilePickerProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let selected = cx
        .stores
        .vlists
        .get(&p.id)
        .map(|s| s.selected_index)
        .unwrap_or(0);
    let focused = cx.is_focused(&p.id);
    let prompt = muted(cx, inherited);
    cx.text(rect.x, rect.y, &format!("> {}", p.query), prompt, opacity);
    for (i, entry) in p.entries.iter().take((rect.h - 1).max(0) as usize).enumerate() {
        let y = rect.y + 1 + i as i32;
        let marker = if entry.is_dir { "/" } else { " " };
        let mut style = inherited;
        if focused && i == selected {
            style = attr(cx, style, AttrFlags::INVERSE);
        }
        cx.text(
            rect.x,
            y,
            truncate_to_cells(&format!("{}{marker}", entry.path), rect.w),
            style,
            opacity,
        );
    }
    Emitted::leaf()
}

pub(crate) fn draw_dropdown(
    cx: &mut RenderCx<'_>,
    p: &DropdownProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let mut style = inherited;
    if p.disabled {
        style = attr(cx, style, AttrFlags::DIM);
    } else if cx.is_focused(&p.id) {
        style = attr(cx, style, AttrFlags::INVERSE);
    }
    let value = p.items.get(p.selected).map(String::as_str).unwrap_or("");
    let arrow = if p.open { "\u{25b4}" } else { "\u{25be}" };
    cx.text(rect.x, rect.y, &format!("{value} {arrow}"), style, opacity);
    if p.open {
        for (i, item) in p.items.iter().enumerate() {
            let y = rect.y + 1 + i as i32;
            let mut item_style = inherited;
            if i == p.selected {
                item_style = attr(cx, item_style, AttrFlags::INVERSE);
            }
            cx.text(rect.x, y, item, item_style, opacity);
        }
    }
    Emitted::leaf()
}

pub(crate) fn draw_palette(
    cx: &mut RenderCx<'_>,
    p: &CommandPaletteProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    if !p.open {
        return Emitted::leaf();
    }
    let surface = cx.styled(
        inherited,
        &StyleProps {
            bg: Some(ColorRef::Named("bg.raised".into())),
            ..Default::default()
        },
    );
    cx.fill(rect, surface, opacity);
    super::containers::draw_frame(cx, rect, surface, opacity);
    let inner_x = rect.x + 1;
    let inner_w = (rect.w - 2).max(0);
    // Source tabs.
    let mut x = inner_x;
    for (i, source) in p.sources.iter().enumerate() {
        let mut style = muted(cx, surface);
        if i == p.active_source {
            style = attr(cx, surface, AttrFlags::BOLD);
        }
        cx.text(x, rect.y, &format!(" {source} "), style, opacity);
        x += cell_width(source) + 2;
    }
    // Query line with cursor.
    let query_y = rect.y + 1;
    cx.text(inner_x, query_y, &format!("> {}", p.query), surface, opacity);
    if cx.is_focused(&p.id) {
        cx.set_cursor(CursorReq {
            x: inner_x + 2 + cell_width(&p.query),
            y: query_y,
            shape: CursorShape::Bar,
            blink: true,
        });
    }
    // Filtered items.
    let visible = crate::input::palette::filtered_items(p);
    for (i, item) in visible
        .iter()
        .take((rect.h - 3).max(0) as usize)
        .enumerate()
    {
        let y = query_y + 1 + i as i32;
        let mut style = surface;
        if i == p.selected {
            style = attr(cx, style, AttrFlags::INVERSE);
        }
        let line = format!("{} \u{00b7} {}", item.source, item.label);
        cx.text(inner_x, y, truncate_to_cells(&line, inner_w), style, opacity);
    }
    Emitted::leaf()
}

pub(crate) fn draw_approval(
    cx: &mut RenderCx<'_>,
    p: &ToolApprovalDialogProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    super::containers::draw_frame(cx, rect, inherited, opacity);
    let bold = attr(cx, inherited, AttrFlags::BOLD);
    cx.text(rect.x + 2, rect.y + 1, &format!("Run tool: {}", p.tool), bold, opacity);
    cx.text(
        rect.x + 2,
        rect.y + 2,
        truncate_to_cells(&p.description, rect.w - 4),
        inherited,
        opacity,
    );
    let approve = if p.approve_label.is_empty() { "Approve" } else { &p.approve_label };
    let deny = if p.deny_label.is_empty() { "Deny" } else { &p.deny_label };
    let focused = cx.is_focused(&p.id);
    let approve_style = if focused {
        attr(cx, inherited, AttrFlags::INVERSE)
    } else {
        inherited
    };
    cx.text(rect.x + 2, rect.y + 4, &format!("[ {approve} (y) ]"), approve_style, opacity);
    cx.text(
        rect.x + 4 + cell_width(approve) + 8,
        rect.y + 4,
        &format!("[ {deny} (n) ]"),
        inherited,
        opacity,
    );
    Emitted::leaf()
}

pub(crate) fn draw_toasts(
    cx: &mut RenderCx<'_>,
    p: &ToastContainerProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    for (i, toast) in p.toasts.iter().enumerate() {
        let y = rect.y + i as i32;
        if y >= rect.bottom() {
            break;
        }
        let tone = toned(cx, inherited, severity_token(toast.level));
        let line = match &toast.action_label {
            Some(action) => format!("\u{25cf} {} [{}]", toast.text, action),
            None => format!("\u{25cf} {}", toast.text),
        };
        cx.text(rect.x, y, truncate_to_cells(&line, rect.w), tone, opacity);
    }
    Emitted::leaf()
}

// ---------------------------------------------------------------------------
// Editors
// ---------------------------------------------------------------------------

pub(crate) fn draw_code_editor(
    cx: &mut RenderCx<'_>,
    p: &CodeEditorProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let scroll = cx
        .stores
        .vlists
        .get(&p.id)
        .map(|s| s.scroll_top)
        .unwrap_or(0);
    let gutter_w = if p.show_gutter {
        (p.lines.len().max(1).ilog10() as i32) + 2
    } else {
        0
    };
    let gutter_style = muted(cx, inherited);
    cx.builder.push_clip(rect.x, rect.y, rect.w, rect.h);
    for (i, line) in p
        .lines
        .iter()
        .skip(scroll.max(0) as usize)
        .take(rect.h.max(0) as usize)
        .enumerate()
    {
        let y = rect.y + i as i32;
        let line_no = scroll.max(0) as usize + i + 1;
        if p.show_gutter {
            cx.text(
                rect.x,
                y,
                &format!("{line_no:>width$} ", width = (gutter_w - 1) as usize),
                gutter_style,
                opacity,
            );
        }
        cx.text(
            rect.x + gutter_w,
            y,
            truncate_to_cells(line, rect.w - gutter_w),
            inherited,
            opacity,
        );
    }
    cx.builder.pop_clip();
    Emitted::leaf()
}

pub(crate) fn draw_diff_viewer(
    cx: &mut RenderCx<'_>,
    p: &DiffViewerProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let scroll = cx
        .stores
        .vlists
        .get(&p.id)
        .map(|s| s.scroll_top)
        .unwrap_or(0);
    cx.builder.push_clip(rect.x, rect.y, rect.w, rect.h);
    for (i, line) in p
        .lines
        .iter()
        .skip(scroll.max(0) as usize)
        .take(rect.h.max(0) as usize)
        .enumerate()
    {
        let y = rect.y + i as i32;
        let (prefix, style) = match line.kind {
            DiffKind::Add => ("+", toned(cx, inherited, "status.success")),
            DiffKind::Remove => ("-", toned(cx, inherited, "status.error")),
            DiffKind::Header => {
                let base = muted(cx, inherited);
                ("@", attr(cx, base, AttrFlags::BOLD))
            }
            DiffKind::Context => (" ", inherited),
        };
        cx.text(
            rect.x,
            y,
            truncate_to_cells(&format!("{prefix}{}", line.text), rect.w),
            style,
            opacity,
        );
    }
    cx.builder.pop_clip();
    Emitted::leaf()
}

pub(crate) fn draw_logs(
    cx: &mut RenderCx<'_>,
    p: &LogsConsoleProps,
    rect: Rect,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let manual = cx.stores.vlists.get(&p.id).map(|s| s.scroll_top);
    let max_scroll = (p.lines.len() as i32 - rect.h).max(0);
    // Follow mode sticks to the tail unless the user scrolled away.
    let scroll = match (p.follow, manual) {
        (true, None) => max_scroll,
        (true, Some(s)) if s >= max_scroll => max_scroll,
        (_, Some(s)) => s.clamp(0, max_scroll),
        (false, None) => 0,
    };
    cx.builder.push_clip(rect.x, rect.y, rect.w, rect.h);
    for (i, line) in p
        .lines
        .iter()
        .skip(scroll as usize)
        .take(rect.h.max(0) as usize)
        .enumerate()
    {
        cx.text(
            rect.x,
            rect.y + i as i32,
            truncate_to_cells(line, rect.w),
            inherited,
            opacity,
        );
    }
    cx.builder.pop_clip();
    Emitted::leaf()
}
