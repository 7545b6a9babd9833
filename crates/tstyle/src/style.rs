//! Resolved text styles, merging, and opacity blending.
//!
//! A [`ResolvedStyle`] always carries concrete foreground and background
//! colors; widgets express changes as [`StyleOverride`]s which are merged
//! on top during rendering. The merge hot path (large lists re-applying
//! the same attribute-only override) is deduplicated by [`StyleCache`].

use std::collections::HashMap;

use crate::attrs::{AttrFlags, TriAttrs};
use crate::color::{Rgb, blend};

/// How an underline is drawn, for terminals that support styled underlines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnderlineKind {
    Straight,
    Double,
    Curly,
    Dotted,
    Dashed,
}

/// A fully-resolved text style. `fg` and `bg` are always defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedStyle {
    pub fg: Rgb,
    pub bg: Rgb,
    pub attrs: AttrFlags,
    pub underline_kind: Option<UnderlineKind>,
    pub underline_color: Option<Rgb>,
}

impl ResolvedStyle {
    pub fn new(fg: Rgb, bg: Rgb) -> Self {
        Self {
            fg,
            bg,
            attrs: AttrFlags::empty(),
            underline_kind: None,
            underline_color: None,
        }
    }

    pub fn with_attrs(mut self, attrs: AttrFlags) -> Self {
        self.attrs = attrs;
        self
    }
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self::new(Rgb::white(), Rgb::black())
    }
}

/// A partial style: only the mentioned fields alter the base on merge.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleOverride {
    pub fg: Option<Rgb>,
    pub bg: Option<Rgb>,
    pub attrs: TriAttrs,
    pub underline_kind: Option<UnderlineKind>,
    pub underline_color: Option<Rgb>,
}

impl StyleOverride {
    pub fn fg(color: Rgb) -> Self {
        Self {
            fg: Some(color),
            ..Default::default()
        }
    }

    pub fn bg(color: Rgb) -> Self {
        Self {
            bg: Some(color),
            ..Default::default()
        }
    }

    pub fn attr(attr: AttrFlags, on: bool) -> Self {
        Self {
            attrs: TriAttrs::default().with(attr, on),
            ..Default::default()
        }
    }

    pub fn with_fg(mut self, color: Rgb) -> Self {
        self.fg = Some(color);
        self
    }

    pub fn with_bg(mut self, color: Rgb) -> Self {
        self.bg = Some(color);
        self
    }

    pub fn with_attr(mut self, attr: AttrFlags, on: bool) -> Self {
        self.attrs.set(attr, on);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fg.is_none()
            && self.bg.is_none()
            && self.attrs.is_empty()
            && self.underline_kind.is_none()
            && self.underline_color.is_none()
    }

    /// True when the override only touches boolean attributes, which is
    /// the cacheable fast path.
    fn attrs_only(&self) -> bool {
        self.fg.is_none()
            && self.bg.is_none()
            && self.underline_kind.is_none()
            && self.underline_color.is_none()
    }
}

/// Merges an override on top of a base style.
///
/// Returns `base` unchanged when the override does not alter any field.
pub fn merge(base: ResolvedStyle, over: &StyleOverride) -> ResolvedStyle {
    if over.is_empty() {
        return base;
    }
    let merged = ResolvedStyle {
        fg: over.fg.unwrap_or(base.fg),
        bg: over.bg.unwrap_or(base.bg),
        attrs: over.attrs.apply(base.attrs),
        underline_kind: over.underline_kind.or(base.underline_kind),
        underline_color: over.underline_color.or(base.underline_color),
    };
    if merged == base { base } else { merged }
}

/// Bound on cached merge results before the cache is dropped wholesale.
const STYLE_CACHE_CAP: usize = 4096;

/// Fast-path cache for attribute-only merges.
///
/// Keyed by `(base, TriAttrs::encode())`. Overrides that carry colors or
/// underline changes bypass the cache entirely; they are rare compared to
/// the bold/dim/inverse toggling done per row in large lists.
#[derive(Default)]
pub struct StyleCache {
    map: HashMap<(ResolvedStyle, u16), ResolvedStyle>,
}

impl StyleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, base: ResolvedStyle, over: &StyleOverride) -> ResolvedStyle {
        if !over.attrs_only() {
            return merge(base, over);
        }
        let key = (base, over.attrs.encode());
        if let Some(hit) = self.map.get(&key) {
            return *hit;
        }
        let merged = merge(base, over);
        if self.map.len() >= STYLE_CACHE_CAP {
            self.map.clear();
        }
        self.map.insert(key, merged);
        merged
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Blends a style's colors toward a backdrop color.
///
/// `a >= 1` returns the input unchanged; `a <= 0` collapses both colors to
/// the backdrop. Boolean attributes are preserved either way.
pub fn apply_opacity(style: ResolvedStyle, a: f32, backdrop: Rgb) -> ResolvedStyle {
    if a >= 1.0 {
        return style;
    }
    if a <= 0.0 {
        return ResolvedStyle {
            fg: backdrop,
            bg: backdrop,
            ..style
        };
    }
    ResolvedStyle {
        fg: blend(style.fg, backdrop, a),
        bg: blend(style.bg, backdrop, a),
        underline_color: style.underline_color.map(|c| blend(c, backdrop, a)),
        ..style
    }
}
