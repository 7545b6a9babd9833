use thiserror::Error;

/// Structured failures from [`crate::DrawlistBuilder::build`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawlistError {
    #[error("drawlist exceeds {limit} bytes ({size})")]
    TooLarge { size: usize, limit: usize },

    #[error("internal drawlist error: {0}")]
    Internal(String),
}

/// Failures while decoding or validating wire data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("truncated wire data at byte {0}")]
    Truncated(usize),

    #[error("bad magic {found:#010x}, expected {expected:#010x}")]
    BadMagic { expected: u32, found: u32 },

    #[error("unsupported wire version {found}, runtime speaks {expected}")]
    BadVersion { expected: u16, found: u16 },

    #[error("unknown op or event tag {0:#04x}")]
    UnknownTag(u8),

    #[error("event batch exceeds {limit} bytes ({size})")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("invalid utf-8 payload")]
    InvalidUtf8,

    #[error(
        "backend ABI mismatch: runtime pins {expected}, backend advertises {found}; \
         rebuild the backend against this runtime or upgrade the runtime"
    )]
    Unsupported { expected: String, found: String },
}
