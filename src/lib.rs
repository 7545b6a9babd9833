//! Facade crate re-exporting the Trellis runtime and its style system.
//!
//! Most applications only need `trellis`; the style crate is re-exported
//! for hosts that construct themes or styles directly.

pub use trellis;
pub use trellis::{Action, App, AppConfig, ExecutionMode, Result, RuntimeBackend, VNode};
pub use tstyle;
pub use tstyle::{ResolvedStyle, Rgb, Theme};
