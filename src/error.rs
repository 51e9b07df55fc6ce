//! Error types for the JSON boundary.
//!
//! The dict itself never fails: rejected keys, misses and absent dicts are
//! ordinary outcomes. Errors only arise when text is decoded into a dict or
//! a dict is encoded as text.

use thiserror::Error;

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Input text is not valid JSON.
    #[cfg(feature = "json")]
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Valid JSON whose top level is neither an object nor `null`.
    #[cfg(feature = "json")]
    #[error("Expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// A stored value has no textual representation.
    #[cfg(feature = "json")]
    #[error("Encode error: {0}")]
    Encode(String),
}
