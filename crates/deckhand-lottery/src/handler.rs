//! The lottery game handler.
//!
//! Nothing players send changes the game: the room calls
//! [`GameHandler::tick`] every draw interval, each tick draws one number,
//! and figures are checked after every draw.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use deckhand_protocol::{PlayerId, Recipient};
use deckhand_room::{GameHandler, RoomConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::{
    EndReason, Figure, LotteryCard, LotteryConfig, LotteryError, LotteryEvent,
};

/// What a player may ask of a running lottery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LotteryAction {
    /// Resend the player's own card.
    ShowCard,
}

/// Extra fields of a successful lottery reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardReply {
    pub card: LotteryCard,
}

/// A figure and everyone who reached it first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwardedFigure {
    pub figure: Figure,
    pub players: Vec<PlayerId>,
    pub number: u8,
}

/// Snapshot of the lottery any client may see. Cards stay private.
#[derive(Debug, Clone, Serialize)]
pub struct LotteryPublicState {
    pub started: bool,
    pub ended: bool,
    pub players: Vec<PlayerId>,
    pub drawn: Vec<u8>,
    pub remaining: usize,
    pub awarded: Vec<AwardedFigure>,
    pub next_figure: Option<Figure>,
}

pub struct LotteryHandler {
    config: LotteryConfig,
    rng: StdRng,
    players: Vec<PlayerId>,
    departed: HashSet<PlayerId>,
    cards: HashMap<PlayerId, LotteryCard>,
    /// Undrawn numbers; the next draw is the last element.
    pouch: Vec<u8>,
    drawn: Vec<u8>,
    drawn_set: HashSet<u8>,
    awarded: Vec<AwardedFigure>,
    started: bool,
    ended: bool,
    events: Vec<(Recipient, LotteryEvent)>,
}

impl LotteryHandler {
    pub fn new(config: LotteryConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates a handler with reproducible cards and draws.
    pub fn with_seed(config: LotteryConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: LotteryConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            players: Vec::new(),
            departed: HashSet::new(),
            cards: HashMap::new(),
            pouch: Vec::new(),
            drawn: Vec::new(),
            drawn_set: HashSet::new(),
            awarded: Vec::new(),
            started: false,
            ended: false,
            events: Vec::new(),
        }
    }

    pub fn card(&self, player: PlayerId) -> Option<&LotteryCard> {
        self.cards.get(&player)
    }

    pub fn drawn(&self) -> &[u8] {
        &self.drawn
    }

    /// The next figure still up for grabs.
    pub fn next_figure(&self) -> Option<Figure> {
        Figure::ALL
            .into_iter()
            .find(|f| !self.awarded.iter().any(|a| a.figure == *f))
    }

    /// Draws one number and awards any figures it completes.
    ///
    /// Every figure not yet awarded is checked on its own, so a short row
    /// layout can still reach the full card.
    ///
    /// Returns the number drawn, or `None` if nothing was drawn because
    /// the game is not running.
    pub fn draw(&mut self) -> Option<u8> {
        if !self.started || self.ended {
            return None;
        }
        let number = self.pouch.pop()?;
        self.drawn.push(number);
        self.drawn_set.insert(number);
        tracing::debug!(number, remaining = self.pouch.len(), "number drawn");
        self.broadcast(LotteryEvent::NumberDrawn {
            number,
            remaining: self.pouch.len(),
        });

        for figure in Figure::ALL {
            if self.awarded.iter().any(|a| a.figure == figure) {
                continue;
            }
            let reached: Vec<PlayerId> = self
                .players
                .iter()
                .copied()
                .filter(|p| !self.departed.contains(p))
                .filter(|p| {
                    self.cards
                        .get(p)
                        .is_some_and(|card| card.has(figure, &self.drawn_set))
                })
                .collect();
            if reached.is_empty() {
                continue;
            }

            tracing::info!(%figure, winners = reached.len(), number, "figure awarded");
            self.awarded.push(AwardedFigure {
                figure,
                players: reached.clone(),
                number,
            });
            self.broadcast(LotteryEvent::FigureAwarded {
                figure,
                players: reached.clone(),
                number,
            });
            if figure == Figure::FullCard {
                self.end(EndReason::FullCard, reached);
                return Some(number);
            }
        }

        if self.pouch.is_empty() {
            self.end(EndReason::PouchEmpty, Vec::new());
        }
        Some(number)
    }

    fn end(&mut self, reason: EndReason, winners: Vec<PlayerId>) {
        self.ended = true;
        tracing::info!(?reason, winners = winners.len(), "lottery over");
        self.broadcast(LotteryEvent::GameOver { reason, winners });
    }

    fn broadcast(&mut self, event: LotteryEvent) {
        self.events.push((Recipient::All, event));
    }
}

impl GameHandler for LotteryHandler {
    type Action = LotteryAction;
    type Success = CardReply;
    type Reason = LotteryError;
    type Event = LotteryEvent;
    type PublicState = LotteryPublicState;

    fn room_config(&self) -> RoomConfig {
        RoomConfig {
            min_players: 1,
            max_players: self.config.max_players,
            ..RoomConfig::default()
        }
    }

    /// Deals a card to every player and fills the pouch.
    fn start_game(&mut self, players: &[PlayerId]) -> bool {
        if self.started || players.is_empty() {
            return false;
        }

        let LotteryConfig {
            numbers,
            rows,
            per_row,
            ..
        } = self.config;
        let mut cards = HashMap::with_capacity(players.len());
        for &player in players {
            let Some(card) =
                LotteryCard::random(&mut self.rng, numbers, rows, per_row)
            else {
                tracing::warn!(numbers, rows, per_row, "card does not fit the number range");
                return false;
            };
            cards.insert(player, card);
        }

        let mut pouch: Vec<u8> = (1..=numbers).collect();
        pouch.shuffle(&mut self.rng);

        self.players = players.to_vec();
        self.cards = cards;
        self.pouch = pouch;
        self.started = true;
        tracing::info!(players = players.len(), numbers, "lottery started");

        self.broadcast(LotteryEvent::GameStarted {
            players: players.to_vec(),
            numbers,
        });
        for &player in players {
            if let Some(card) = self.cards.get(&player) {
                let card = card.clone();
                self.events
                    .push((Recipient::Player(player), LotteryEvent::CardDealt { card }));
            }
        }
        true
    }

    fn handle_action(
        &mut self,
        sender: PlayerId,
        action: LotteryAction,
    ) -> Result<CardReply, LotteryError> {
        match action {
            LotteryAction::ShowCard => {
                if !self.started {
                    return Err(LotteryError::NotStarted);
                }
                let card = self.cards.get(&sender).ok_or(LotteryError::NoCard)?;
                Ok(CardReply { card: card.clone() })
            }
        }
    }

    fn take_events(&mut self) -> Vec<(Recipient, LotteryEvent)> {
        std::mem::take(&mut self.events)
    }

    fn public_state(&self) -> LotteryPublicState {
        LotteryPublicState {
            started: self.started,
            ended: self.ended,
            players: self.players.clone(),
            drawn: self.drawn.clone(),
            remaining: self.pouch.len(),
            awarded: self.awarded.clone(),
            next_figure: self.next_figure(),
        }
    }

    fn is_finished(&self) -> bool {
        self.ended
    }

    /// Departed players keep their card on record but win nothing more.
    fn on_player_left(&mut self, player: PlayerId) {
        if self.started && self.players.contains(&player) {
            self.departed.insert(player);
        }
    }

    fn tick_interval(&self) -> Option<Duration> {
        Some(self.config.draw_interval())
    }

    fn tick(&mut self) {
        self.draw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);

    /// A started game with fixed cards and a fixed draw order.
    fn rigged(cards: &[(PlayerId, Vec<Vec<u8>>)], draws: &[u8]) -> LotteryHandler {
        let mut handler = LotteryHandler::with_seed(LotteryConfig::default(), 1);
        handler.start_game(&cards.iter().map(|(p, _)| *p).collect::<Vec<_>>());
        for (player, rows) in cards {
            handler.cards.insert(*player, LotteryCard { rows: rows.clone() });
        }
        handler.pouch = draws.iter().rev().copied().collect();
        handler.take_events();
        handler
    }

    fn awarded(handler: &mut LotteryHandler) -> Vec<(Figure, Vec<PlayerId>)> {
        handler
            .take_events()
            .into_iter()
            .filter_map(|(_, e)| match e {
                LotteryEvent::FigureAwarded { figure, players, .. } => {
                    Some((figure, players))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_start_deals_cards_and_fills_pouch() {
        let mut handler = LotteryHandler::with_seed(LotteryConfig::default(), 9);
        assert!(!handler.start_game(&[]));
        assert!(handler.start_game(&[P1, P2]));
        assert!(!handler.start_game(&[P1, P2]));

        assert_eq!(handler.pouch.len(), 90);
        assert!(handler.card(P1).is_some());
        let events = handler.take_events();
        assert!(events.contains(&(
            Recipient::Player(P2),
            LotteryEvent::CardDealt { card: handler.card(P2).unwrap().clone() }
        )));
    }

    #[test]
    fn test_figures_awarded_in_order() {
        let mut handler = rigged(
            &[
                (P1, vec![vec![1, 2, 3, 4, 5], vec![6, 7, 8, 9, 10]]),
                (P2, vec![vec![1, 2, 30, 40, 50], vec![60, 70, 80, 81, 82]]),
            ],
            &[1, 2, 3, 30, 4, 5, 6, 7, 8, 9, 10, 11],
        );

        handler.draw();
        assert!(awarded(&mut handler).is_empty());
        handler.draw();
        assert_eq!(awarded(&mut handler), vec![(Figure::Two, vec![P1, P2])]);
        handler.draw();
        assert_eq!(awarded(&mut handler), vec![(Figure::Three, vec![P1])]);
        handler.draw();
        assert_eq!(awarded(&mut handler), vec![]);
        handler.draw();
        assert_eq!(awarded(&mut handler), vec![(Figure::Four, vec![P1])]);
        handler.draw();
        assert_eq!(awarded(&mut handler), vec![(Figure::Five, vec![P1])]);
        assert_eq!(handler.next_figure(), Some(Figure::FullCard));

        for _ in 0..4 {
            handler.draw();
        }
        assert!(!handler.is_finished());
        handler.draw();
        assert_eq!(awarded(&mut handler), vec![(Figure::FullCard, vec![P1])]);
        assert!(handler.is_finished());
        assert_eq!(handler.draw(), None);
    }

    #[test]
    fn test_figures_checked_independently() {
        let mut handler = rigged(
            &[(P1, vec![vec![1, 2, 3]]), (P2, vec![vec![50, 60]])],
            &[1, 2, 3],
        );
        handler.draw();
        handler.draw();
        handler.draw();
        let figures: Vec<Figure> =
            awarded(&mut handler).into_iter().map(|(f, _)| f).collect();
        assert_eq!(figures, vec![Figure::Two, Figure::Three, Figure::FullCard]);
        assert!(handler.is_finished());
        assert_eq!(handler.next_figure(), Some(Figure::Four));
    }

    #[test]
    fn test_empty_pouch_ends_game() {
        let mut handler = rigged(&[(P1, vec![vec![1, 2, 3, 4, 5]])], &[80, 81]);
        handler.draw();
        assert!(!handler.is_finished());
        handler.draw();
        assert!(handler.is_finished());
        let events = handler.take_events();
        assert!(events.iter().any(|(_, e)| matches!(
            e,
            LotteryEvent::GameOver { reason: EndReason::PouchEmpty, .. }
        )));
    }

    #[test]
    fn test_departed_players_win_nothing() {
        let mut handler = rigged(
            &[(P1, vec![vec![1, 2, 3]]), (P2, vec![vec![1, 2, 40]])],
            &[1, 2],
        );
        handler.on_player_left(P1);
        handler.draw();
        handler.draw();
        assert_eq!(awarded(&mut handler), vec![(Figure::Two, vec![P2])]);
    }

    #[test]
    fn test_show_card() {
        let mut handler = LotteryHandler::with_seed(LotteryConfig::default(), 2);
        assert_eq!(
            handler.handle_action(P1, LotteryAction::ShowCard),
            Err(LotteryError::NotStarted)
        );
        handler.start_game(&[P1]);
        let reply = handler.handle_action(P1, LotteryAction::ShowCard).unwrap();
        assert_eq!(&reply.card, handler.card(P1).unwrap());
        assert_eq!(
            handler.handle_action(P2, LotteryAction::ShowCard),
            Err(LotteryError::NoCard)
        );
    }

    #[test]
    fn test_public_state_hides_cards() {
        let mut handler = rigged(&[(P1, vec![vec![1, 2]])], &[7, 8, 9]);
        handler.draw();
        let json = serde_json::to_value(handler.public_state()).unwrap();
        assert_eq!(json["drawn"], serde_json::json!([7]));
        assert_eq!(json["remaining"], 2);
        assert_eq!(json["next_figure"], "two");
        assert!(json.get("cards").is_none());
    }
}
