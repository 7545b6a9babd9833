use thiserror::Error;

/// Errors produced while parsing or resolving style values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("invalid color literal `{0}`")]
    InvalidColor(String),

    #[error("unknown theme token `{0}`")]
    UnknownToken(String),
}

pub type Result<T> = std::result::Result<T, StyleError>;
