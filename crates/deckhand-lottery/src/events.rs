use deckhand_protocol::PlayerId;
use serde::Serialize;

use crate::{Figure, LotteryCard};

/// Why the game stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    FullCard,
    PouchEmpty,
}

/// Notifications produced by the lottery. `CardDealt` goes only to the
/// card's owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LotteryEvent {
    GameStarted {
        players: Vec<PlayerId>,
        numbers: u8,
    },
    CardDealt {
        card: LotteryCard,
    },
    NumberDrawn {
        number: u8,
        remaining: usize,
    },
    FigureAwarded {
        figure: Figure,
        players: Vec<PlayerId>,
        number: u8,
    },
    GameOver {
        reason: EndReason,
        winners: Vec<PlayerId>,
    },
}
