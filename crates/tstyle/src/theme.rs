//! Theme token maps, color resolution, and the built-in presets.
//!
//! A [`Theme`] is a flat map from dot-path tokens (`fg.primary`,
//! `accent.secondary`) to colors, plus a spacing scale. Presets are
//! defined as structured palettes and reduced to the flat map by
//! [`coerce`], so renderer code stays token-path agnostic.
//!
//! ## Standard tokens
//!
//! | Token              | Description                       |
//! |--------------------|-----------------------------------|
//! | `fg.primary`       | Default text color                |
//! | `fg.muted`         | Secondary/dim text                |
//! | `fg.disabled`      | Disabled text                     |
//! | `bg.primary`       | Base background                   |
//! | `bg.surface`       | Card/panel background             |
//! | `bg.raised`        | Overlay/popover background        |
//! | `accent.primary`   | Primary accent                    |
//! | `accent.secondary` | Secondary accent                  |
//! | `status.error`     | Error color                       |
//! | `status.warning`   | Warning color                     |
//! | `status.success`   | Success color                     |
//! | `status.info`      | Informational color               |
//! | `border.default`   | Border color                      |
//! | `border.focus`     | Focused border color              |
//! | `selection.bg`     | Selection background              |
//!
//! The bare tokens `fg` and `bg` are legacy aliases kept for widgets that
//! predate the dot-path scheme; unknown tokens fall back to `fg`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::color::{ColorRef, Rgb};

/// The spacing scale: `[0, xs, sm, md, lg, xl, 2xl]` in cells.
pub const SPACING_SCALE: [u16; 7] = [0, 1, 2, 4, 6, 8, 12];

/// A resolved theme: flat token map plus spacing scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    pub name: String,
    pub colors: HashMap<String, Rgb>,
    pub spacing: [u16; 7],
}

impl Theme {
    /// Resolves a color reference against this theme.
    ///
    /// Accepts a direct value, a dot-path token, or a `#hex` literal.
    /// Unknown tokens fall back to the legacy `fg` alias.
    pub fn resolve_color(&self, value: &ColorRef) -> Rgb {
        match value {
            ColorRef::Value(rgb) => *rgb,
            ColorRef::Named(name) => {
                if name.starts_with('#') {
                    if let Ok(rgb) = Rgb::parse_hex(name) {
                        return rgb;
                    }
                }
                if let Some(rgb) = self.colors.get(name.as_str()) {
                    return *rgb;
                }
                log::debug!("unknown theme token `{}`, falling back to fg", name);
                self.colors.get("fg").copied().unwrap_or(Rgb::white())
            }
        }
    }

    /// Resolves a spacing value: small non-negative integers index the
    /// scale, anything else is literal cells.
    pub fn resolve_spacing(&self, n: i32) -> i32 {
        if (0..self.spacing.len() as i32).contains(&n) {
            i32::from(self.spacing[n as usize])
        } else {
            n.max(0)
        }
    }

    pub fn fg(&self) -> Rgb {
        self.colors.get("fg").copied().unwrap_or(Rgb::white())
    }

    pub fn bg(&self) -> Rgb {
        self.colors.get("bg").copied().unwrap_or(Rgb::black())
    }
}

impl Default for Theme {
    fn default() -> Self {
        presets::dark().clone()
    }
}

/// A structured preset palette, reduced to a flat [`Theme`] by [`coerce`].
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub fg_primary: Rgb,
    pub fg_muted: Rgb,
    pub fg_disabled: Rgb,
    pub bg_primary: Rgb,
    pub bg_surface: Rgb,
    pub bg_raised: Rgb,
    pub accent_primary: Rgb,
    pub accent_secondary: Rgb,
    pub status_error: Rgb,
    pub status_warning: Rgb,
    pub status_success: Rgb,
    pub status_info: Rgb,
    pub border_default: Rgb,
    pub border_focus: Rgb,
    pub selection_bg: Rgb,
}

/// Flattens a palette into the legacy token map, including the bare
/// `fg`/`bg` aliases.
pub fn coerce(name: &str, palette: &Palette) -> Theme {
    let mut colors = HashMap::new();
    let mut put = |token: &str, rgb: Rgb| {
        colors.insert(token.to_string(), rgb);
    };
    put("fg.primary", palette.fg_primary);
    put("fg.muted", palette.fg_muted);
    put("fg.disabled", palette.fg_disabled);
    put("bg.primary", palette.bg_primary);
    put("bg.surface", palette.bg_surface);
    put("bg.raised", palette.bg_raised);
    put("accent.primary", palette.accent_primary);
    put("accent.secondary", palette.accent_secondary);
    put("status.error", palette.status_error);
    put("status.warning", palette.status_warning);
    put("status.success", palette.status_success);
    put("status.info", palette.status_info);
    put("border.default", palette.border_default);
    put("border.focus", palette.border_focus);
    put("selection.bg", palette.selection_bg);
    // Legacy aliases
    put("fg", palette.fg_primary);
    put("bg", palette.bg_primary);
    Theme {
        name: name.to_string(),
        colors,
        spacing: SPACING_SCALE,
    }
}

/// The built-in theme presets.
pub mod presets {
    use super::*;

    const fn rgb(r: u8, g: u8, b: u8) -> Rgb {
        Rgb::new(r, g, b)
    }

    static DARK: Lazy<Theme> = Lazy::new(|| {
        coerce(
            "dark",
            &Palette {
                fg_primary: rgb(0xd4, 0xd4, 0xd4),
                fg_muted: rgb(0x8b, 0x94, 0x9e),
                fg_disabled: rgb(0x5c, 0x63, 0x6b),
                bg_primary: rgb(0x1e, 0x1e, 0x1e),
                bg_surface: rgb(0x25, 0x26, 0x2b),
                bg_raised: rgb(0x2d, 0x2f, 0x36),
                accent_primary: rgb(0x4f, 0xc1, 0xff),
                accent_secondary: rgb(0xc5, 0x86, 0xc0),
                status_error: rgb(0xf4, 0x47, 0x47),
                status_warning: rgb(0xcc, 0xa7, 0x00),
                status_success: rgb(0x4e, 0xc9, 0xb0),
                status_info: rgb(0x3b, 0x8e, 0xea),
                border_default: rgb(0x3c, 0x3c, 0x3c),
                border_focus: rgb(0x4f, 0xc1, 0xff),
                selection_bg: rgb(0x26, 0x4f, 0x78),
            },
        )
    });

    static LIGHT: Lazy<Theme> = Lazy::new(|| {
        coerce(
            "light",
            &Palette {
                fg_primary: rgb(0x1f, 0x23, 0x28),
                fg_muted: rgb(0x57, 0x60, 0x6a),
                fg_disabled: rgb(0x8c, 0x95, 0x9f),
                bg_primary: rgb(0xff, 0xff, 0xff),
                bg_surface: rgb(0xf6, 0xf8, 0xfa),
                bg_raised: rgb(0xee, 0xf1, 0xf4),
                accent_primary: rgb(0x09, 0x69, 0xda),
                accent_secondary: rgb(0x82, 0x50, 0xdf),
                status_error: rgb(0xcf, 0x22, 0x2e),
                status_warning: rgb(0x9a, 0x67, 0x00),
                status_success: rgb(0x1a, 0x7f, 0x37),
                status_info: rgb(0x09, 0x69, 0xda),
                border_default: rgb(0xd0, 0xd7, 0xde),
                border_focus: rgb(0x09, 0x69, 0xda),
                selection_bg: rgb(0xb6, 0xd7, 0xff),
            },
        )
    });

    static DIMMED: Lazy<Theme> = Lazy::new(|| {
        coerce(
            "dimmed",
            &Palette {
                fg_primary: rgb(0xad, 0xba, 0xc7),
                fg_muted: rgb(0x76, 0x83, 0x90),
                fg_disabled: rgb(0x54, 0x5d, 0x68),
                bg_primary: rgb(0x22, 0x27, 0x2e),
                bg_surface: rgb(0x2d, 0x33, 0x3b),
                bg_raised: rgb(0x37, 0x3e, 0x47),
                accent_primary: rgb(0x53, 0x9b, 0xf5),
                accent_secondary: rgb(0xb0, 0x83, 0xf0),
                status_error: rgb(0xe5, 0x53, 0x4b),
                status_warning: rgb(0xc6, 0x90, 0x26),
                status_success: rgb(0x57, 0xab, 0x5a),
                status_info: rgb(0x53, 0x9b, 0xf5),
                border_default: rgb(0x44, 0x4c, 0x56),
                border_focus: rgb(0x53, 0x9b, 0xf5),
                selection_bg: rgb(0x2f, 0x47, 0x66),
            },
        )
    });

    static HIGH_CONTRAST: Lazy<Theme> = Lazy::new(|| {
        coerce(
            "high-contrast",
            &Palette {
                fg_primary: rgb(0xff, 0xff, 0xff),
                fg_muted: rgb(0xd9, 0xde, 0xe3),
                fg_disabled: rgb(0x9e, 0xa7, 0xb3),
                bg_primary: rgb(0x00, 0x00, 0x00),
                bg_surface: rgb(0x0a, 0x0c, 0x10),
                bg_raised: rgb(0x16, 0x1b, 0x22),
                accent_primary: rgb(0x71, 0xb7, 0xff),
                accent_secondary: rgb(0xcb, 0x9e, 0xff),
                status_error: rgb(0xff, 0x6a, 0x69),
                status_warning: rgb(0xf0, 0xb7, 0x2f),
                status_success: rgb(0x26, 0xcd, 0x4d),
                status_info: rgb(0x71, 0xb7, 0xff),
                border_default: rgb(0x7a, 0x82, 0x8e),
                border_focus: rgb(0xff, 0xff, 0xff),
                selection_bg: rgb(0x9e, 0x6a, 0x03),
            },
        )
    });

    static NORD: Lazy<Theme> = Lazy::new(|| {
        coerce(
            "nord",
            &Palette {
                fg_primary: rgb(0xd8, 0xde, 0xe9),
                fg_muted: rgb(0xa3, 0xad, 0xc2),
                fg_disabled: rgb(0x61, 0x6e, 0x88),
                bg_primary: rgb(0x2e, 0x34, 0x40),
                bg_surface: rgb(0x3b, 0x42, 0x52),
                bg_raised: rgb(0x43, 0x4c, 0x5e),
                accent_primary: rgb(0x88, 0xc0, 0xd0),
                accent_secondary: rgb(0xb4, 0x8e, 0xad),
                status_error: rgb(0xbf, 0x61, 0x6a),
                status_warning: rgb(0xeb, 0xcb, 0x8b),
                status_success: rgb(0xa3, 0xbe, 0x8c),
                status_info: rgb(0x81, 0xa1, 0xc1),
                border_default: rgb(0x4c, 0x56, 0x6a),
                border_focus: rgb(0x88, 0xc0, 0xd0),
                selection_bg: rgb(0x43, 0x4c, 0x5e),
            },
        )
    });

    static DRACULA: Lazy<Theme> = Lazy::new(|| {
        coerce(
            "dracula",
            &Palette {
                fg_primary: rgb(0xf8, 0xf8, 0xf2),
                fg_muted: rgb(0xa8, 0xb2, 0xd4),
                fg_disabled: rgb(0x62, 0x72, 0xa4),
                bg_primary: rgb(0x28, 0x2a, 0x36),
                bg_surface: rgb(0x30, 0x33, 0x42),
                bg_raised: rgb(0x3b, 0x3e, 0x51),
                accent_primary: rgb(0xbd, 0x93, 0xf9),
                accent_secondary: rgb(0xff, 0x79, 0xc6),
                status_error: rgb(0xff, 0x55, 0x55),
                status_warning: rgb(0xf1, 0xfa, 0x8c),
                status_success: rgb(0x50, 0xfa, 0x7b),
                status_info: rgb(0x8b, 0xe9, 0xfd),
                border_default: rgb(0x44, 0x47, 0x5a),
                border_focus: rgb(0xbd, 0x93, 0xf9),
                selection_bg: rgb(0x44, 0x47, 0x5a),
            },
        )
    });

    pub fn dark() -> &'static Theme {
        &DARK
    }

    pub fn light() -> &'static Theme {
        &LIGHT
    }

    pub fn dimmed() -> &'static Theme {
        &DIMMED
    }

    pub fn high_contrast() -> &'static Theme {
        &HIGH_CONTRAST
    }

    pub fn nord() -> &'static Theme {
        &NORD
    }

    pub fn dracula() -> &'static Theme {
        &DRACULA
    }

    /// All presets by name.
    pub fn by_name(name: &str) -> Option<&'static Theme> {
        match name {
            "dark" => Some(dark()),
            "light" => Some(light()),
            "dimmed" => Some(dimmed()),
            "high-contrast" => Some(high_contrast()),
            "nord" => Some(nord()),
            "dracula" => Some(dracula()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_direct_value() {
        let theme = presets::dark();
        let c = Rgb::new(1, 2, 3);
        assert_eq!(theme.resolve_color(&ColorRef::Value(c)), c);
    }

    #[test]
    fn test_resolve_token_path() {
        let theme = presets::dark();
        let accent = theme.resolve_color(&ColorRef::Named("accent.primary".into()));
        assert_eq!(accent, theme.colors["accent.primary"]);
    }

    #[test]
    fn test_resolve_hex_literal() {
        let theme = presets::dark();
        let c = theme.resolve_color(&ColorRef::Named("#ff8800".into()));
        assert_eq!(c, Rgb::new(255, 136, 0));
    }

    #[test]
    fn test_unknown_token_falls_back_to_fg() {
        let theme = presets::dark();
        let c = theme.resolve_color(&ColorRef::Named("no.such.token".into()));
        assert_eq!(c, theme.fg());
    }

    #[test]
    fn test_spacing_scale_vs_literal() {
        let theme = presets::dark();
        assert_eq!(theme.resolve_spacing(0), 0);
        assert_eq!(theme.resolve_spacing(3), 4); // md
        assert_eq!(theme.resolve_spacing(6), 12); // 2xl
        assert_eq!(theme.resolve_spacing(7), 7); // literal
        assert_eq!(theme.resolve_spacing(40), 40); // literal
        assert_eq!(theme.resolve_spacing(-2), 0); // clamped
    }

    #[test]
    fn test_all_presets_carry_legacy_aliases() {
        for name in ["dark", "light", "dimmed", "high-contrast", "nord", "dracula"] {
            let theme = presets::by_name(name).unwrap();
            assert!(theme.colors.contains_key("fg"), "{name} missing fg alias");
            assert!(theme.colors.contains_key("bg"), "{name} missing bg alias");
            assert_eq!(theme.colors["fg"], theme.colors["fg.primary"]);
        }
    }
}
