//! Unified error type for Deckhand.

use deckhand_lottery::LotteryError;
use deckhand_protocol::ProtocolError;
use deckhand_room::RoomError;
use deckhand_uno::ActionError;

/// Top-level error that wraps every crate-specific error.
///
/// When using the `deckhand` meta-crate you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attributes let `?` convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DeckhandError {
    /// Bytes could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not found, unknown game, not host).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A UNO action was rejected by the rules.
    #[error(transparent)]
    Uno(#[from] ActionError),

    /// A lottery action was rejected.
    #[error(transparent)]
    Lottery(#[from] LotteryError),
}
