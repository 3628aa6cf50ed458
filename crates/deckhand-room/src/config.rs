//! Room configuration and state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration for a room instance.
///
/// Games override these defaults through `GameHandler::room_config()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Players needed before the host may start. The room checks this
    /// before the game sees the roster.
    pub min_players: usize,

    /// Maximum players allowed in the room.
    pub max_players: usize,

    /// Capacity of the room actor's command queue. Senders wait when it
    /// is full.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 8,
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// WaitingForPlayers → InProgress → Finished
/// Finished → WaitingForPlayers (rematch)
/// any live state → Destroying
/// ```
///
/// - **WaitingForPlayers**: lobby. Players may join; the host may start.
/// - **InProgress**: a game is running. Joins are refused.
/// - **Finished**: the game ended. Players can still read the final
///   state and signal readiness for a rematch.
/// - **Destroying**: the room is being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    WaitingForPlayers,
    InProgress,
    Finished,
    Destroying,
}

impl RoomState {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::WaitingForPlayers)
    }

    /// Returns `true` if the last game has ended.
    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::WaitingForPlayers, Self::InProgress)
                | (Self::InProgress, Self::Finished)
                | (Self::Finished, Self::WaitingForPlayers)
                | (Self::WaitingForPlayers, Self::Destroying)
                | (Self::InProgress, Self::Destroying)
                | (Self::Finished, Self::Destroying)
        )
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
            Self::Destroying => write!(f, "Destroying"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_state_transitions() {
        assert!(RoomState::WaitingForPlayers
            .can_transition_to(RoomState::InProgress));
        assert!(RoomState::InProgress.can_transition_to(RoomState::Finished));
        assert!(RoomState::Finished
            .can_transition_to(RoomState::WaitingForPlayers));
        assert!(!RoomState::WaitingForPlayers
            .can_transition_to(RoomState::Finished));
        assert!(!RoomState::Destroying
            .can_transition_to(RoomState::WaitingForPlayers));
        assert!(!RoomState::Destroying.can_transition_to(RoomState::Destroying));
    }

    #[test]
    fn test_room_state_flags() {
        assert!(RoomState::WaitingForPlayers.is_joinable());
        assert!(!RoomState::InProgress.is_joinable());
        assert!(RoomState::Finished.is_ended());
        assert!(!RoomState::InProgress.is_ended());
    }

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.max_players, 8);
        assert_eq!(config.channel_size, 64);
    }
}
