//! RGB color values and hex literal parsing.
//!
//! Colors in Trellis are plain 24-bit RGB triples. Anything fancier
//! (theme tokens, opacity blending) is layered on top of this type by
//! [`crate::theme`] and [`crate::style`].

use std::fmt;

use nom::{
    IResult,
    bytes::complete::{tag, take_while_m_n},
    combinator::{all_consuming, map_res},
};

use crate::error::StyleError;

/// A 24-bit RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Parses a `#rgb` or `#rrggbb` hex literal.
    pub fn parse_hex(input: &str) -> Result<Self, StyleError> {
        match all_consuming(hex_color)(input) {
            Ok((_, color)) => Ok(color),
            Err(_) => Err(StyleError::InvalidColor(input.to_string())),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Reference to a color: either a concrete value or a name that resolves
/// through a [`crate::Theme`]: a dot-path token (`fg.primary`) or a hex
/// literal (`#rrggbb`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColorRef {
    Value(Rgb),
    Named(String),
}

impl From<Rgb> for ColorRef {
    fn from(value: Rgb) -> Self {
        ColorRef::Value(value)
    }
}

impl From<&str> for ColorRef {
    fn from(value: &str) -> Self {
        ColorRef::Named(value.to_string())
    }
}

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

fn hex_pair(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, is_hex_digit), |s: &str| {
        u8::from_str_radix(s, 16)
    })(input)
}

fn hex_single(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(1, 1, is_hex_digit), |s: &str| {
        // `#abc` expands each digit: a -> aa
        u8::from_str_radix(s, 16).map(|v| v * 17)
    })(input)
}

fn hex_color(input: &str) -> IResult<&str, Rgb> {
    let (input, _) = tag("#")(input)?;
    if input.len() == 6 {
        let (input, r) = hex_pair(input)?;
        let (input, g) = hex_pair(input)?;
        let (input, b) = hex_pair(input)?;
        Ok((input, Rgb { r, g, b }))
    } else {
        let (input, r) = hex_single(input)?;
        let (input, g) = hex_single(input)?;
        let (input, b) = hex_single(input)?;
        Ok((input, Rgb { r, g, b }))
    }
}

/// Blends `top` toward `backdrop` with weight `a` (the opacity of `top`).
///
/// Channel math is integer-rounded so identical inputs always produce
/// byte-identical outputs regardless of call site.
pub fn blend(top: Rgb, backdrop: Rgb, a: f32) -> Rgb {
    let mix = |t: u8, b: u8| -> u8 {
        let v = f32::from(t) * a + f32::from(b) * (1.0 - a);
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgb {
        r: mix(top.r, backdrop.r),
        g: mix(top.g, backdrop.g),
        b: mix(top.b, backdrop.b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_hex() {
        assert_eq!(Rgb::parse_hex("#1e90ff").unwrap(), Rgb::new(30, 144, 255));
    }

    #[test]
    fn test_parse_short_hex() {
        assert_eq!(Rgb::parse_hex("#fff").unwrap(), Rgb::white());
        assert_eq!(Rgb::parse_hex("#a0c").unwrap(), Rgb::new(170, 0, 204));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Rgb::parse_hex("fff").is_err());
        assert!(Rgb::parse_hex("#ggg").is_err());
        assert!(Rgb::parse_hex("#12345").is_err());
        assert!(Rgb::parse_hex("#123456ff").is_err());
    }

    #[test]
    fn test_blend_endpoints() {
        let a = Rgb::new(200, 100, 50);
        let b = Rgb::new(20, 40, 60);
        assert_eq!(blend(a, b, 1.0), a);
        assert_eq!(blend(a, b, 0.0), b);
    }

    #[test]
    fn test_blend_rounds_deterministically() {
        let a = Rgb::new(255, 0, 0);
        let b = Rgb::new(0, 0, 0);
        let half = blend(a, b, 0.5);
        assert_eq!(half, blend(a, b, 0.5));
        assert_eq!(half.r, 128); // 127.5 rounds up
    }
}
