use thiserror::Error;

/// Errors surfaced to callers of the scanner, analyzer and parser.
///
/// Internal invariant violations (bitset link asymmetry, slot indices out of
/// range) are programming errors and assert instead of reaching this enum.
#[derive(Debug, Error)]
pub enum Error {
    /// The input message was empty or contained only whitespace.
    #[error("empty or whitespace-only message")]
    EmptyInput,

    /// No recogniser could make sense of the input at the given offset.
    #[error("unknown token at offset {offset}: {fragment:?}")]
    UnknownToken { offset: usize, fragment: String },

    /// The `-N` suffix of a `%name-N%` placeholder did not parse as a
    /// positive decimal integer.
    #[error("invalid count in placeholder {placeholder:?}")]
    InvalidCount { placeholder: String },

    /// The depth-first walk reached no leaf for the message.
    #[error("no pattern matched for this message")]
    NoMatch,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
