//! Error types for the room layer.

use deckhand_protocol::{PlayerId, ProtocolError, RoomId};

/// Errors that can occur during room operations.
///
/// Game rule violations are not room errors: they travel inside the
/// encoded action reply. A `RoomError` means the request never reached
/// the game, or the room setup itself is wrong.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room is full.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The player is already in this room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player is not in this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// A privileged action was attempted by someone other than the host.
    #[error("player {0} is not the host of room {1}")]
    NotHost(PlayerId, RoomId),

    /// The room is in a state that doesn't allow this operation.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// No handler is registered for this game key. A configuration error.
    #[error("unknown game key {0:?}")]
    UnknownGame(String),

    /// A handler was registered twice under the same key.
    #[error("game key {0:?} is already registered")]
    DuplicateGame(String),

    /// An action or notification could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
