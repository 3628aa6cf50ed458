//! Notifications produced by UNO state transitions.

use deckhand_protocol::PlayerId;
use deckhand_turn::{Direction, TurnEvent};
use serde::Serialize;

use crate::{Card, Color};

/// Everything clients are told about a UNO game. `HandUpdated` is only
/// ever addressed to the hand's owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnoEvent {
    GameStarted {
        players: Vec<PlayerId>,
        first_player: PlayerId,
        top_card: Card,
        current_color: Color,
        direction: Direction,
        pending_draw_count: usize,
    },
    TurnChanged {
        previous: PlayerId,
        current: PlayerId,
    },
    DirectionChanged {
        direction: Direction,
    },
    PlayerSkipped {
        player: PlayerId,
    },
    HandUpdated {
        hand: Vec<Card>,
    },
    ChallengeAvailable {
        played_by: PlayerId,
        target_player: PlayerId,
        eligible_challengers: Vec<PlayerId>,
    },
    ChallengeResult {
        challenger: PlayerId,
        played_by: PlayerId,
        was_valid: bool,
        penalized: PlayerId,
        penalty: usize,
    },
    UnoAtOneCard {
        player: PlayerId,
    },
    UnoDeclared {
        player: PlayerId,
    },
    UnoStateCleared {
        player: PlayerId,
    },
    UnoCalledOut {
        accuser: PlayerId,
        target: PlayerId,
        penalty: usize,
    },
    Winner {
        player: PlayerId,
        by_forfeit: bool,
    },
}

impl From<TurnEvent> for UnoEvent {
    fn from(event: TurnEvent) -> Self {
        match event {
            TurnEvent::TurnChanged { previous, current } => {
                Self::TurnChanged { previous, current }
            }
            TurnEvent::DirectionChanged { direction } => {
                Self::DirectionChanged { direction }
            }
            TurnEvent::PlayerSkipped { player } => Self::PlayerSkipped { player },
        }
    }
}
