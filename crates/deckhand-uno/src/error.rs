use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CardId;

/// Why a UNO action was rejected.
///
/// These are expected outcomes of play, not faults. They serialize as the
/// snake_case `reason` of a rejected reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionError {
    #[error("game has not started")]
    NotStarted,

    #[error("game is over")]
    GameOver,

    #[error("not your turn")]
    NotYourTurn,

    #[error("player has no hand in this game")]
    HandNotFound,

    #[error("card is not in hand")]
    CardNotInHand,

    #[error("card cannot be played now")]
    InvalidPlay,

    #[error("no wild draw four to challenge")]
    NoActiveChallenge,

    #[error("player may not challenge this card")]
    NotEligibleChallenger,

    #[error("only the target may accept")]
    NotTargetPlayer,

    #[error("player is not at one card")]
    NotAtUno,

    #[error("uno already declared")]
    AlreadyDeclared,

    #[error("cannot call out yourself")]
    CannotCallSelf,

    #[error("target is not at one card")]
    TargetNotAtUno,

    #[error("target was already penalized")]
    AlreadyPenalized,

    #[error("target is still within the grace period")]
    GracePeriod,
}

/// A broken card-conservation invariant. Always an engine bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("expected {expected} cards in play, found {found}")]
    CardCount { expected: usize, found: usize },

    #[error("card {0} is held in more than one place")]
    DuplicateCard(CardId),
}

impl ActionError {
    pub const ALL: [ActionError; 15] = [
        Self::NotStarted,
        Self::GameOver,
        Self::NotYourTurn,
        Self::HandNotFound,
        Self::CardNotInHand,
        Self::InvalidPlay,
        Self::NoActiveChallenge,
        Self::NotEligibleChallenger,
        Self::NotTargetPlayer,
        Self::NotAtUno,
        Self::AlreadyDeclared,
        Self::CannotCallSelf,
        Self::TargetNotAtUno,
        Self::AlreadyPenalized,
        Self::GracePeriod,
    ];

    /// The wire reason string. Same as the serde name.
    pub fn reason(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::GameOver => "game_over",
            Self::NotYourTurn => "not_your_turn",
            Self::HandNotFound => "hand_not_found",
            Self::CardNotInHand => "card_not_in_hand",
            Self::InvalidPlay => "invalid_play",
            Self::NoActiveChallenge => "no_active_challenge",
            Self::NotEligibleChallenger => "not_eligible_challenger",
            Self::NotTargetPlayer => "not_target_player",
            Self::NotAtUno => "not_at_uno",
            Self::AlreadyDeclared => "already_declared",
            Self::CannotCallSelf => "cannot_call_self",
            Self::TargetNotAtUno => "target_not_at_uno",
            Self::AlreadyPenalized => "already_penalized",
            Self::GracePeriod => "grace_period",
        }
    }
}
