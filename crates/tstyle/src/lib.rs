//! Style model and theme system for the Trellis terminal UI runtime.
//!
//! This crate is deliberately free of any rendering or I/O concerns. It
//! provides:
//!
//! - [`Rgb`]: the color value type, with hex parsing
//! - [`AttrFlags`] / [`TriAttrs`]: text attribute flags and tri-state
//!   overrides with a compact 16-bit encoding
//! - [`ResolvedStyle`] / [`StyleOverride`]: fully-resolved text styles
//!   and partial overrides, with merge + opacity blending
//! - [`StyleCache`]: a fast-path cache for the merge hot path
//! - [`Theme`]: token map with dot-path color resolution, a spacing
//!   scale, and the built-in presets

pub mod attrs;
pub mod color;
pub mod error;
pub mod style;
pub mod theme;

pub use attrs::{AttrFlags, TriAttrs};
pub use color::{ColorRef, Rgb, blend};
pub use error::{Result, StyleError};
pub use style::{ResolvedStyle, StyleCache, StyleOverride, UnderlineKind, apply_opacity, merge};
pub use theme::{SPACING_SCALE, Theme, presets};
