//! Error types for the protocol layer.
//!
//! Each Deckhand crate owns its error enum. A `ProtocolError` always
//! means bytes could not be turned into a value or back, never that a
//! game rule was broken.

/// Errors that can occur while encoding or decoding.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A value could not be serialized.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Bytes could not be parsed into the expected type.
    ///
    /// Usual suspects: malformed JSON, an unknown `action` tag, or a
    /// missing field such as `card_id`.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but makes no sense at the protocol level.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
