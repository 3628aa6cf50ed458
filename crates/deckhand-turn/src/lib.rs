//! Game-agnostic turn rotation for Deckhand.
//!
//! [`TurnManager`] tracks whose turn it is over a fixed seating order, the
//! direction of play, and a counter of pending skips. It knows nothing
//! about cards: rules such as "reverse with two players acts as a skip"
//! belong to the game handler that drives it.
//!
//! Every mutating call returns the [`TurnEvent`]s it produced instead of
//! invoking observers, so callers decide when and where to dispatch them.
//!
//! ```text
//! initialize ──→ set_current_player ──→ next_turn ⟲
//!                                          ↑
//!                      skip_next / reverse_direction
//! ```
//!
//! A seat can be taken out of rotation with
//! [`sit_out`](TurnManager::sit_out). Turns and skips pass over it as if it
//! were not there, so a skip always lands on someone still playing.
//!
//! Operations on a manager that has not been initialized are no-ops and
//! return empty results.

use std::collections::HashSet;

use deckhand_protocol::PlayerId;
use serde::{Deserialize, Serialize};
use tracing::trace;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Direction of play over the seating order.
///
/// Serialized as `1` (forward) or `-1` (backward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    /// The index step for this direction.
    pub fn step(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> Self {
        direction.step() as i8
    }
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Forward),
            -1 => Ok(Self::Backward),
            other => Err(format!("direction must be 1 or -1, got {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Events and snapshots
// ---------------------------------------------------------------------------

/// Something the rotation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// The turn moved from `previous` to `current`.
    TurnChanged {
        previous: PlayerId,
        current: PlayerId,
    },
    /// Play now runs in `direction`.
    DirectionChanged { direction: Direction },
    /// `player` was passed over while consuming a pending skip.
    PlayerSkipped { player: PlayerId },
}

/// A read-only copy of the manager's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    pub players: Vec<PlayerId>,
    pub current_player: Option<PlayerId>,
    pub direction: Direction,
    pub pending_skips: u32,
    /// Seats passed over by the rotation, in seating order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sitting_out: Vec<PlayerId>,
}

// ---------------------------------------------------------------------------
// TurnManager
// ---------------------------------------------------------------------------

/// Rotation state machine over a fixed player sequence.
#[derive(Debug, Clone, Default)]
pub struct TurnManager {
    players: Vec<PlayerId>,
    current: usize,
    direction: Direction,
    pending_skips: u32,
    sitting_out: HashSet<PlayerId>,
}

impl TurnManager {
    /// Creates an uninitialized manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the seating order and resets direction and skips.
    ///
    /// The first player in `players` holds the turn until
    /// [`set_current_player`](Self::set_current_player) says otherwise.
    pub fn initialize(&mut self, players: Vec<PlayerId>) {
        trace!(players = players.len(), "turn manager initialized");
        self.players = players;
        self.current = 0;
        self.direction = Direction::Forward;
        self.pending_skips = 0;
        self.sitting_out.clear();
    }

    /// Returns `true` once [`initialize`](Self::initialize) has been called
    /// with at least one player.
    pub fn is_initialized(&self) -> bool {
        !self.players.is_empty()
    }

    /// Hands the turn directly to `player`.
    ///
    /// Returns `false` (and changes nothing) if `player` is not seated.
    pub fn set_current_player(&mut self, player: PlayerId) -> bool {
        match self.players.iter().position(|p| *p == player) {
            Some(index) => {
                self.current = index;
                true
            }
            None => false,
        }
    }

    /// Advances the turn by one seat, then by one more seat for every
    /// pending skip, consuming them.
    ///
    /// Returns a `PlayerSkipped` event per skipped seat followed by a
    /// single `TurnChanged`.
    pub fn next_turn(&mut self) -> Vec<TurnEvent> {
        let Some(previous) = self.current_player() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        self.current = self.step_from(self.current);
        while self.pending_skips > 0 {
            self.pending_skips -= 1;
            events.push(TurnEvent::PlayerSkipped {
                player: self.players[self.current],
            });
            self.current = self.step_from(self.current);
        }

        let current = self.players[self.current];
        trace!(%previous, %current, "turn changed");
        events.push(TurnEvent::TurnChanged { previous, current });
        events
    }

    /// Takes `player` out of rotation for the rest of the game.
    ///
    /// If `player` holds the turn they keep it until the next
    /// [`next_turn`](Self::next_turn). Returns `false` if `player` is not
    /// seated or already sitting out.
    pub fn sit_out(&mut self, player: PlayerId) -> bool {
        if !self.players.contains(&player) || !self.sitting_out.insert(player) {
            return false;
        }
        trace!(%player, "player sits out");
        true
    }

    /// Whether the rotation still visits `player`.
    pub fn is_in_rotation(&self, player: PlayerId) -> bool {
        self.players.contains(&player) && !self.sitting_out.contains(&player)
    }

    /// Queues one skip. The turn does not move until the next
    /// [`next_turn`](Self::next_turn).
    pub fn skip_next(&mut self) {
        if self.is_initialized() {
            self.pending_skips += 1;
        }
    }

    /// Flips the direction of play.
    pub fn reverse_direction(&mut self) -> Option<TurnEvent> {
        if !self.is_initialized() {
            return None;
        }
        self.direction = self.direction.flipped();
        trace!(direction = ?self.direction, "direction changed");
        Some(TurnEvent::DirectionChanged {
            direction: self.direction,
        })
    }

    /// The player who would hold the turn after the next
    /// [`next_turn`](Self::next_turn), pending skips included.
    /// Does not mutate anything.
    pub fn next_player(&self) -> Option<PlayerId> {
        if !self.is_initialized() {
            return None;
        }
        let mut index = self.step_from(self.current);
        for _ in 0..self.pending_skips {
            index = self.step_from(index);
        }
        Some(self.players[index])
    }

    /// The player whose turn it is.
    pub fn current_player(&self) -> Option<PlayerId> {
        self.players.get(self.current).copied()
    }

    /// The current direction of play.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The fixed seating order.
    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    /// A snapshot of the full rotation state.
    pub fn state(&self) -> TurnState {
        TurnState {
            players: self.players.clone(),
            current_player: self.current_player(),
            direction: self.direction,
            pending_skips: self.pending_skips,
            sitting_out: self
                .players
                .iter()
                .filter(|p| self.sitting_out.contains(p))
                .copied()
                .collect(),
        }
    }

    /// The next seat in the current direction that is still in rotation.
    /// With everyone sitting out, a full lap lands back on `index`.
    fn step_from(&self, index: usize) -> usize {
        let len = self.players.len() as isize;
        let mut next = index;
        for _ in 0..self.players.len() {
            next = (next as isize + self.direction.step()).rem_euclid(len) as usize;
            if !self.sitting_out.contains(&self.players[next]) {
                break;
            }
        }
        next
    }
}
