//! UNO game state and its public, redacted view.

use std::collections::HashMap;

use deckhand_protocol::PlayerId;
use deckhand_turn::{Direction, TurnManager};
use serde::Serialize;
use tokio::time::Instant;

use crate::{Card, CardKind, Color};

/// UNO-declaration tracking for one player at exactly one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnoDeclaration {
    /// When the player's hand reached one card.
    pub at_one_card_since: Instant,
    pub declared: bool,
    pub penalized: bool,
}

/// The record armed by a wild-draw-4 play.
///
/// `hand_snapshot` is a copy of the player's hand without the played card;
/// the cards themselves stay owned by the hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wild4Challenge {
    pub played_by: PlayerId,
    pub target_player: PlayerId,
    pub hand_snapshot: Vec<Card>,
    pub chosen_color: Color,
    pub previous_color: Option<Color>,
    pub previous_top_card: Option<Card>,
    pub eligible_challengers: Vec<PlayerId>,
    pub resolved: bool,
}

impl Wild4Challenge {
    /// The challenge if it is still open.
    pub fn open(&self) -> Option<&Self> {
        (!self.resolved).then_some(self)
    }
}

/// Everything one UNO game owns.
///
/// Only [`UnoHandler`](crate::UnoHandler) mutates it; everyone else sees it
/// through a shared reference.
#[derive(Debug)]
pub struct UnoState {
    /// Seating order captured at start.
    pub players: Vec<PlayerId>,
    pub hands: HashMap<PlayerId, Vec<Card>>,
    /// Top of the pile is the last element.
    pub draw_pile: Vec<Card>,
    /// Top of the pile is the last element.
    pub discard_pile: Vec<Card>,
    pub current_color: Option<Color>,
    pub current_kind: Option<CardKind>,
    pub current_value: Option<u8>,
    pub pending_draw_type: Option<CardKind>,
    pub pending_draw_count: usize,
    pub started: bool,
    pub game_ended: bool,
    pub winner: Option<PlayerId>,
    pub uno_tracker: HashMap<PlayerId, UnoDeclaration>,
    pub challenge: Option<Wild4Challenge>,
    /// Rotation over `players`. Participants who left mid-game sit out.
    pub turn: TurnManager,
}

impl UnoState {
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            hands: HashMap::new(),
            draw_pile: Vec::new(),
            discard_pile: Vec::new(),
            current_color: None,
            current_kind: None,
            current_value: None,
            pending_draw_type: None,
            pending_draw_count: 0,
            started: false,
            game_ended: false,
            winner: None,
            uno_tracker: HashMap::new(),
            challenge: None,
            turn: TurnManager::new(),
        }
    }

    pub fn top_card(&self) -> Option<&Card> {
        self.discard_pile.last()
    }

    pub fn hand(&self, player: PlayerId) -> Option<&[Card]> {
        self.hands.get(&player).map(Vec::as_slice)
    }

    /// The open wild-draw-4 challenge, if any.
    pub fn open_challenge(&self) -> Option<&Wild4Challenge> {
        self.challenge.as_ref().and_then(Wild4Challenge::open)
    }

    /// Players still seated at the table.
    pub fn active_players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players
            .iter()
            .copied()
            .filter(|p| self.turn.is_in_rotation(*p))
    }

    /// Cards across both piles and every hand.
    pub fn cards_in_play(&self) -> usize {
        self.draw_pile.len()
            + self.discard_pile.len()
            + self.hands.values().map(Vec::len).sum::<usize>()
    }

    /// Derives the snapshot any client may see.
    pub fn public_view(&self) -> UnoPublicState {
        let players = self.started.then(|| {
            self.players
                .iter()
                .map(|&id| PublicPlayer {
                    id,
                    card_count: self.hands.get(&id).map_or(0, Vec::len),
                    departed: !self.turn.is_in_rotation(id),
                })
                .collect()
        });

        let challenge = self.open_challenge().map(|c| PublicChallenge {
            played_by: c.played_by,
            target_player: c.target_player,
            chosen_color: c.chosen_color,
            eligible_challengers: c.eligible_challengers.clone(),
        });

        let uno = self
            .players
            .iter()
            .filter(|id| self.hands.get(id).is_some_and(|h| h.len() == 1))
            .filter_map(|&player| {
                self.uno_tracker.get(&player).map(|entry| PublicUno {
                    player,
                    declared: entry.declared,
                    penalized: entry.penalized,
                })
            })
            .collect();

        UnoPublicState {
            started: self.started,
            game_ended: self.game_ended,
            winner: self.winner,
            players,
            current_player: self.turn.current_player(),
            direction: self.turn.direction(),
            top_card: self.top_card().cloned(),
            current_color: self.current_color,
            current_kind: self.current_kind,
            current_value: self.current_value,
            draw_pile_count: self.draw_pile.len(),
            discard_pile_count: self.discard_pile.len(),
            pending_draw_type: self.pending_draw_type,
            pending_draw_count: self.pending_draw_count,
            challenge,
            uno,
        }
    }
}

impl Default for UnoState {
    fn default() -> Self {
        Self::new()
    }
}

/// Redacted game snapshot. Hands appear only as counts.
#[derive(Debug, Clone, Serialize)]
pub struct UnoPublicState {
    pub started: bool,
    pub game_ended: bool,
    pub winner: Option<PlayerId>,
    /// Absent before start so lobby rosters are not overwritten.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<PublicPlayer>>,
    pub current_player: Option<PlayerId>,
    pub direction: Direction,
    pub top_card: Option<Card>,
    pub current_color: Option<Color>,
    pub current_kind: Option<CardKind>,
    pub current_value: Option<u8>,
    pub draw_pile_count: usize,
    pub discard_pile_count: usize,
    pub pending_draw_type: Option<CardKind>,
    pub pending_draw_count: usize,
    pub challenge: Option<PublicChallenge>,
    pub uno: Vec<PublicUno>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicPlayer {
    pub id: PlayerId,
    pub card_count: usize,
    pub departed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicChallenge {
    pub played_by: PlayerId,
    pub target_player: PlayerId,
    pub chosen_color: Color,
    pub eligible_challengers: Vec<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUno {
    pub player: PlayerId,
    pub declared: bool,
    pub penalized: bool,
}
