//! Error type shared by the tag sessions and accessors.
//!
//! Session primitives return [`TagError`] directly. The read accessors in
//! [`crate::ultralight`] and [`crate::classic`] log the error and hand back
//! `None` instead, so most callers only meet this type on the write path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TagError {
    /// No session was supplied, or the session could not be connected
    #[error("tag session unavailable: {0}")]
    SessionUnavailable(String),

    /// The sector rejected the key. Recovered by skipping the sector.
    #[error("authentication failed for sector {sector}")]
    Unauthenticated { sector: usize },

    /// A page or block transaction failed on the radio link
    #[error("tag I/O failed: {0}")]
    Io(String),

    /// The session does not expose a memory layout this crate understands
    #[error("unsupported tag family")]
    UnsupportedFamily,

    /// The bytes do not form a valid NDEF message
    #[error("malformed NDEF message: {0}")]
    MalformedMessage(String),

    /// The message is absent or carries no decodable first record
    #[error("no NDEF record found")]
    RecordNotFound,

    #[error("tag is read-only")]
    ReadOnly,

    #[error("message needs {needed} bytes but the tag holds {available}")]
    InsufficientCapacity { needed: usize, available: usize },

    /// The tag is neither NDEF formatted nor NDEF formatable
    #[error("tag does not support NDEF")]
    UnsupportedFormat,

    #[error("invalid language code: {0}")]
    InvalidLanguageCode(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TagError {
    /// Returns true if repeating the operation might succeed
    ///
    /// Radio failures usually mean the tag moved out of the field; the caller
    /// may ask the user to tap again. Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::SessionUnavailable(_))
    }
}

impl From<binrw::Error> for TagError {
    fn from(err: binrw::Error) -> Self {
        TagError::MalformedMessage(err.to_string())
    }
}

impl From<serde_json::Error> for TagError {
    fn from(err: serde_json::Error) -> Self {
        TagError::InvalidConfig(err.to_string())
    }
}
