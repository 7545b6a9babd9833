//! Key code and modifier constants for the event wire format.
//!
//! Key codes are the engine's u16 values; printable keys use their ASCII
//! uppercase code, everything else has a named constant here.

pub const BACKSPACE: u16 = 8;
pub const TAB: u16 = 9;
pub const ENTER: u16 = 13;
pub const ESCAPE: u16 = 27;
pub const SPACE: u16 = 32;
pub const PAGE_UP: u16 = 33;
pub const PAGE_DOWN: u16 = 34;
pub const END: u16 = 35;
pub const HOME: u16 = 36;
pub const LEFT: u16 = 37;
pub const UP: u16 = 38;
pub const RIGHT: u16 = 39;
pub const DOWN: u16 = 40;
pub const DELETE: u16 = 46;

pub const KEY_0: u16 = 48;
pub const KEY_A: u16 = 65;
pub const KEY_Z: u16 = 90;

pub const F1: u16 = 112;
pub const F12: u16 = 123;

/// Modifier bit flags carried on key and mouse events.
pub mod mods {
    pub const SHIFT: u8 = 1 << 0;
    pub const CTRL: u8 = 1 << 1;
    pub const ALT: u8 = 1 << 2;
    pub const META: u8 = 1 << 3;
}

/// Returns the key code for an ASCII letter or digit.
pub fn from_char(c: char) -> Option<u16> {
    let up = c.to_ascii_uppercase();
    if up.is_ascii_uppercase() || up.is_ascii_digit() {
        Some(up as u16)
    } else {
        None
    }
}

/// Human-readable token for a key code, used by chord sequence parsing
/// and focus announcements.
pub fn name(key: u16) -> String {
    match key {
        BACKSPACE => "backspace".into(),
        TAB => "tab".into(),
        ENTER => "enter".into(),
        ESCAPE => "esc".into(),
        SPACE => "space".into(),
        PAGE_UP => "pageup".into(),
        PAGE_DOWN => "pagedown".into(),
        END => "end".into(),
        HOME => "home".into(),
        LEFT => "left".into(),
        UP => "up".into(),
        RIGHT => "right".into(),
        DOWN => "down".into(),
        DELETE => "delete".into(),
        k if (KEY_0..=57).contains(&k) || (KEY_A..=KEY_Z).contains(&k) => {
            char::from(k as u8).to_ascii_lowercase().to_string()
        }
        k if (F1..=F12).contains(&k) => format!("f{}", k - F1 + 1),
        other => format!("key{other}"),
    }
}

/// Parses a chord token (`ctrl+k`, `g`, `shift+tab`) into mods + key.
pub fn parse_token(token: &str) -> Option<(u8, u16)> {
    let mut mods_bits = 0u8;
    let mut key = None;
    for part in token.split('+') {
        match part {
            "ctrl" => mods_bits |= mods::CTRL,
            "shift" => mods_bits |= mods::SHIFT,
            "alt" => mods_bits |= mods::ALT,
            "meta" => mods_bits |= mods::META,
            other => {
                key = match other {
                    "tab" => Some(TAB),
                    "enter" => Some(ENTER),
                    "esc" | "escape" => Some(ESCAPE),
                    "space" => Some(SPACE),
                    "up" => Some(UP),
                    "down" => Some(DOWN),
                    "left" => Some(LEFT),
                    "right" => Some(RIGHT),
                    "home" => Some(HOME),
                    "end" => Some(END),
                    "pageup" => Some(PAGE_UP),
                    "pagedown" => Some(PAGE_DOWN),
                    "backspace" => Some(BACKSPACE),
                    "delete" => Some(DELETE),
                    s if s.len() == 1 => from_char(s.chars().next().unwrap_or(' ')),
                    s if s.starts_with('f') => s[1..]
                        .parse::<u16>()
                        .ok()
                        .filter(|n| (1..=12).contains(n))
                        .map(|n| F1 + n - 1),
                    _ => None,
                };
            }
        }
    }
    key.map(|k| (mods_bits, k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_char() {
        assert_eq!(from_char('a'), Some(65));
        assert_eq!(from_char('Z'), Some(90));
        assert_eq!(from_char('7'), Some(55));
        assert_eq!(from_char('!'), None);
    }

    #[test]
    fn test_parse_plain_token() {
        assert_eq!(parse_token("g"), Some((0, 71)));
        assert_eq!(parse_token("tab"), Some((0, TAB)));
    }

    #[test]
    fn test_parse_modified_token() {
        assert_eq!(parse_token("ctrl+k"), Some((mods::CTRL, 75)));
        assert_eq!(parse_token("ctrl+shift+p"), Some((mods::CTRL | mods::SHIFT, 80)));
    }

    #[test]
    fn test_parse_function_keys() {
        assert_eq!(parse_token("f1"), Some((0, F1)));
        assert_eq!(parse_token("f12"), Some((0, F12)));
        assert_eq!(parse_token("f13"), None);
    }

    #[test]
    fn test_name_roundtrip_for_letters() {
        assert_eq!(name(71), "g");
        assert_eq!(name(ESCAPE), "esc");
    }
}
