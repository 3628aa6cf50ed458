//! Core types shared across the Deckhand crates.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable identifier for a player.
///
/// Issued by the transport for each connection and used as the key of
/// every per-player map (hands, UNO declarations, rosters). Serialized as
/// a plain number thanks to `#[serde(transparent)]`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room (one table, one game session at a time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who a notification should be delivered to.
///
/// Game handlers pair each event with a `Recipient`; the room actor fans
/// the event out accordingly. Private data (a player's hand) always goes
/// to `Player`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player in the room.
    All,

    /// Exactly one player.
    Player(PlayerId),
}

impl Recipient {
    /// Returns `true` if a message with this recipient reaches `player`.
    pub fn includes(&self, player: PlayerId) -> bool {
        match self {
            Self::All => true,
            Self::Player(p) => *p == player,
        }
    }
}

// ---------------------------------------------------------------------------
// ActionReply
// ---------------------------------------------------------------------------

/// The uniform answer to a game action.
///
/// Serializes as `{"ok": true, ...extra}` on success and as
/// `{"ok": false, "reason": "<reason>"}` on rejection. `T` carries the
/// action-specific success fields and is flattened into the top-level
/// object; `R` is the game's machine-readable reason.
///
/// ```text
/// {"ok": true, "drew": 4, "stacked": true}
/// {"ok": false, "reason": "not_your_turn"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReply<T, R> {
    /// Whether the action was applied.
    pub ok: bool,

    /// Why the action was rejected. Absent on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<R>,

    /// Action-specific success fields.
    #[serde(flatten)]
    pub extra: Option<T>,
}

impl<T, R> ActionReply<T, R> {
    /// A successful reply carrying `extra`.
    pub fn accepted(extra: T) -> Self {
        Self {
            ok: true,
            reason: None,
            extra: Some(extra),
        }
    }

    /// A rejection with the given reason.
    pub fn rejected(reason: R) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
            extra: None,
        }
    }
}

impl<T, R> From<Result<T, R>> for ActionReply<T, R> {
    fn from(result: Result<T, R>) -> Self {
        match result {
            Ok(extra) => Self::accepted(extra),
            Err(reason) => Self::rejected(reason),
        }
    }
}
