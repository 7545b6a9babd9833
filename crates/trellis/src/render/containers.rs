//! Container rendering: fills, borders, clips, and frame chrome.

use tstyle::ResolvedStyle;

use crate::geometry::Rect;
use crate::layout::LayoutNode;
use crate::props::{Backdrop, ContainerProps, FieldProps, LayerProps, ModalProps, Overflow, SplitPaneProps, Axis};

use super::{Emitted, RenderCx};

const H: &str = "\u{2500}";
const V: &str = "\u{2502}";
const TL: &str = "\u{250c}";
const TR: &str = "\u{2510}";
const BL: &str = "\u{2514}";
const BR: &str = "\u{2518}";

/// Draws a one-cell box-drawing frame along the rect edges.
pub(crate) fn draw_frame(cx: &mut RenderCx<'_>, rect: Rect, style: ResolvedStyle, opacity: f32) {
    if rect.w < 2 || rect.h < 2 {
        return;
    }
    let horiz = H.repeat((rect.w - 2) as usize);
    cx.text(rect.x, rect.y, &format!("{TL}{horiz}{TR}"), style, opacity);
    cx.text(
        rect.x,
        rect.bottom() - 1,
        &format!("{BL}{horiz}{BR}"),
        style,
        opacity,
    );
    for y in rect.y + 1..rect.bottom() - 1 {
        cx.text(rect.x, y, V, style, opacity);
        cx.text(rect.right() - 1, y, V, style, opacity);
    }
}

pub(crate) fn draw_container(
    cx: &mut RenderCx<'_>,
    p: &ContainerProps,
    rect: Rect,
    layout: &LayoutNode,
    inherited: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let style = cx.styled(inherited, &p.style);
    let opacity = opacity * p.opacity.unwrap_or(1.0).clamp(0.0, 1.0);
    if p.style.bg.is_some() {
        cx.fill(rect, style, opacity);
    }
    if p.border {
        draw_frame(cx, rect, style, opacity);
    }
    let mut clips = 0;
    if matches!(p.overflow, Overflow::Hidden | Overflow::Scroll) {
        // Clip to the content viewport recorded at layout time.
        let meta = layout.meta.unwrap_or_default();
        let b = i32::from(p.border);
        let clip = Rect::new(
            rect.x + p.padding.left + b,
            rect.y + p.padding.top + b,
            meta.viewport_width,
            meta.viewport_height,
        );
        cx.builder.push_clip(clip.x, clip.y, clip.w, clip.h);
        clips = 1;
    }
    Emitted {
        clips,
        descend: true,
        child_style: style,
        child_opacity: opacity,
    }
}

pub(crate) fn draw_field(
    cx: &mut RenderCx<'_>,
    p: &FieldProps,
    rect: Rect,
    style: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let label_style = cx.cache.merge(
        style,
        &tstyle::StyleOverride::attr(tstyle::AttrFlags::BOLD, true),
    );
    cx.text(rect.x, rect.y, &p.label, label_style, opacity);
    if let Some(hint) = &p.hint {
        let x = rect.x + crate::glyph::cell_width(&p.label) + 1;
        let muted = cx.styled(
            style,
            &crate::props::StyleProps {
                fg: Some(tstyle::ColorRef::Named("fg.muted".into())),
                ..Default::default()
            },
        );
        cx.text(x, rect.y, hint, muted, opacity);
    }
    Emitted::parent(style, opacity)
}

pub(crate) fn draw_modal(
    cx: &mut RenderCx<'_>,
    p: &ModalProps,
    rect: Rect,
    style: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    let surface = cx.styled(
        style,
        &crate::props::StyleProps {
            bg: Some(tstyle::ColorRef::Named("bg.raised".into())),
            ..Default::default()
        },
    );
    cx.fill(rect, surface, opacity);
    draw_frame(cx, rect, surface, opacity);
    if let Some(title) = &p.title {
        let title_style = cx
            .cache
            .merge(surface, &tstyle::StyleOverride::attr(tstyle::AttrFlags::BOLD, true));
        cx.text(rect.x + 2, rect.y, &format!(" {title} "), title_style, opacity);
    }
    let mut clips = 0;
    if rect.w > 2 && rect.h > 2 {
        cx.builder
            .push_clip(rect.x + 1, rect.y + 1, rect.w - 2, rect.h - 2);
        clips = 1;
    }
    Emitted {
        clips,
        descend: true,
        child_style: surface,
        child_opacity: opacity,
    }
}

/// A layer fills its viewport-wide backdrop before its own content.
pub(crate) fn draw_layer(
    cx: &mut RenderCx<'_>,
    p: &LayerProps,
    style: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    match p.backdrop {
        Backdrop::None => {}
        Backdrop::Dim => {
            let full = Rect::new(0, 0, i32::from(cx.viewport.width), i32::from(cx.viewport.height));
            cx.fill(full, style, opacity * 0.4);
        }
        Backdrop::Opaque => {
            let full = Rect::new(0, 0, i32::from(cx.viewport.width), i32::from(cx.viewport.height));
            cx.fill(full, style, opacity);
        }
    }
    Emitted::parent(style, opacity)
}

pub(crate) fn draw_split(
    cx: &mut RenderCx<'_>,
    p: &SplitPaneProps,
    rect: Rect,
    layout: &LayoutNode,
    style: ResolvedStyle,
    opacity: f32,
) -> Emitted {
    // Divider line between the two panes.
    if let Some(first) = layout.children.first() {
        match p.axis {
            Axis::Horizontal => {
                let x = first.rect.right();
                if x > rect.x && x < rect.right() {
                    for y in rect.y..rect.bottom() {
                        cx.text(x - 1, y, V, style, opacity);
                    }
                }
            }
            Axis::Vertical => {
                let y = first.rect.bottom();
                if y > rect.y && y < rect.bottom() {
                    cx.text(rect.x, y - 1, &H.repeat(rect.w as usize), style, opacity);
                }
            }
        }
    }
    Emitted::parent(style, opacity)
}
