//! Wire formats shared between the Trellis runtime and its backends.
//!
//! Two byte protocols cross the backend boundary:
//!
//! - **Drawlists** (runtime → backend): a linear buffer of drawing ops
//!   produced by [`DrawlistBuilder`] and consumed with [`DrawlistReader`].
//! - **Event batches** (backend → runtime): decoded by [`EventDecoder`]
//!   and produced by backends (or tests) with [`EventBatchWriter`].
//!
//! Both layouts are backend-private but ABI-pinned: [`abi::RUNTIME_PINS`]
//! must match what the backend advertises or startup fails with a
//! structured diagnostic.

pub mod abi;
pub mod drawlist;
pub mod error;
pub mod events;
pub mod keys;

pub use abi::{AbiPins, Version, RUNTIME_PINS};
pub use drawlist::{CursorShape, DrawOp, DrawlistBuilder, DrawlistReader, TextSegment};
pub use error::{DrawlistError, WireError};
pub use events::{
    EngineEvent, EventBatchWriter, EventDecoder, EventKind, FatalCode, KeyAction, MouseKind,
};
