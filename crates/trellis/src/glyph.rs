//! Cell-based text measurement and the icon glyph table.
//!
//! Text measurement is cell-based: one column per narrow glyph, two for
//! wide CJK/emoji. Icon widths come from a static table; glyphs that
//! render unreliably across terminal emulators (emoji-risky) take a
//! fallback width instead of their nominal one.

use unicode_display_width::width as display_width;
use unicode_segmentation::UnicodeSegmentation;

/// Width assumed for emoji-risky glyphs whose rendered width varies by
/// terminal.
pub const FALLBACK_GLYPH_WIDTH: i32 = 2;

/// Display width of a string in cells.
pub fn cell_width(text: &str) -> i32 {
    display_width(text) as i32
}

/// Iterates grapheme clusters of a string.
pub fn graphemes(text: &str) -> impl Iterator<Item = &str> {
    text.graphemes(true)
}

/// Number of grapheme clusters in a string.
pub fn grapheme_count(text: &str) -> usize {
    text.graphemes(true).count()
}

/// An entry in the icon table: glyph, resolved width, and whether the
/// glyph is emoji-risky (fallback width applies).
#[derive(Clone, Copy, Debug)]
pub struct IconGlyph {
    pub glyph: &'static str,
    pub width: i32,
    pub risky: bool,
}

static ICONS: phf::Map<&'static str, IconGlyph> = phf::phf_map! {
    "chevron-right" => IconGlyph { glyph: "\u{276f}", width: 1, risky: false },
    "chevron-down" => IconGlyph { glyph: "\u{2304}", width: 1, risky: false },
    "arrow-up" => IconGlyph { glyph: "\u{2191}", width: 1, risky: false },
    "arrow-down" => IconGlyph { glyph: "\u{2193}", width: 1, risky: false },
    "dot" => IconGlyph { glyph: "\u{25cf}", width: 1, risky: false },
    "circle" => IconGlyph { glyph: "\u{25cb}", width: 1, risky: false },
    "square" => IconGlyph { glyph: "\u{25a0}", width: 1, risky: false },
    "check" => IconGlyph { glyph: "\u{2713}", width: 1, risky: false },
    "cross" => IconGlyph { glyph: "\u{2717}", width: 1, risky: false },
    "ellipsis" => IconGlyph { glyph: "\u{2026}", width: 1, risky: false },
    "bar" => IconGlyph { glyph: "\u{2502}", width: 1, risky: false },
    "branch" => IconGlyph { glyph: "\u{251c}", width: 1, risky: false },
    "corner" => IconGlyph { glyph: "\u{2514}", width: 1, risky: false },
    "folder" => IconGlyph { glyph: "\u{1f4c1}", width: 2, risky: true },
    "file" => IconGlyph { glyph: "\u{1f4c4}", width: 2, risky: true },
    "gear" => IconGlyph { glyph: "\u{2699}\u{fe0f}", width: 2, risky: true },
    "warning" => IconGlyph { glyph: "\u{26a0}\u{fe0f}", width: 2, risky: true },
    "info" => IconGlyph { glyph: "\u{2139}\u{fe0f}", width: 2, risky: true },
    "sparkle" => IconGlyph { glyph: "\u{2728}", width: 2, risky: true },
};

/// Looks up an icon by name. Unknown names resolve to the `dot` glyph.
pub fn icon(name: &str) -> IconGlyph {
    ICONS
        .get(name)
        .copied()
        .unwrap_or(IconGlyph {
            glyph: "\u{25cf}",
            width: 1,
            risky: false,
        })
}

/// The cell width reserved for an icon: resolved width for stable glyphs,
/// the fallback width for emoji-risky ones.
pub fn icon_width(name: &str) -> i32 {
    let entry = icon(name);
    if entry.risky {
        FALLBACK_GLYPH_WIDTH
    } else {
        entry.width
    }
}

/// Truncates a string to at most `max` display cells.
pub fn truncate_to_cells(text: &str, max: i32) -> &str {
    if max <= 0 {
        return "";
    }
    let mut used = 0i32;
    let mut end = 0usize;
    for g in text.grapheme_indices(true) {
        let w = cell_width(g.1);
        if used + w > max {
            break;
        }
        used += w;
        end = g.0 + g.1.len();
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_width() {
        assert_eq!(cell_width("hello"), 5);
        assert_eq!(cell_width(""), 0);
    }

    #[test]
    fn test_wide_glyph_width() {
        assert_eq!(cell_width("\u{4f60}\u{597d}"), 4); // CJK
    }

    #[test]
    fn test_icon_stable_vs_risky() {
        assert_eq!(icon_width("check"), 1);
        assert_eq!(icon_width("folder"), FALLBACK_GLYPH_WIDTH);
    }

    #[test]
    fn test_unknown_icon_falls_back() {
        assert_eq!(icon("no-such-icon").glyph, "\u{25cf}");
        assert_eq!(icon_width("no-such-icon"), 1);
    }

    #[test]
    fn test_truncate_to_cells() {
        assert_eq!(truncate_to_cells("hello", 3), "hel");
        assert_eq!(truncate_to_cells("hello", 0), "");
        assert_eq!(truncate_to_cells("\u{4f60}\u{597d}", 3), "\u{4f60}"); // wide glyph doesn't split
    }
}
