//! The UNO game handler.
//!
//! [`UnoHandler`] is the only thing that mutates a UNO [`UnoState`]. Every
//! operation validates first and commits second, so a rejected action
//! leaves the table exactly as it was. Notifications are queued as the
//! state changes and drained by the room through
//! [`GameHandler::take_events`].

use std::collections::HashSet;

use deckhand_protocol::{PlayerId, Recipient};
use deckhand_room::{GameHandler, RoomConfig};
use deckhand_turn::TurnEvent;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::rules::{self, DECK_SIZE};
use crate::{
    ActionError, Card, CardId, CardKind, Color, InvariantViolation,
    UnoConfig, UnoDeclaration, UnoEvent, UnoPublicState, UnoState,
    Wild4Challenge,
};

// ---------------------------------------------------------------------------
// Actions and replies
// ---------------------------------------------------------------------------

/// A player's request, tagged by `"action"` on the wire.
///
/// ```json
/// {"action": "play_card", "card_id": 17, "chosen_color": "blue"}
/// {"action": "call_out_uno", "target": 3}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UnoAction {
    PlayCard {
        card_id: CardId,
        #[serde(default)]
        chosen_color: Option<Color>,
    },
    DrawCard,
    #[serde(rename = "challenge_wild4")]
    ChallengeWild4,
    #[serde(rename = "accept_wild4")]
    AcceptWild4,
    DeclareUno,
    CallOutUno {
        target: PlayerId,
    },
}

/// Extra fields of a successful reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UnoSuccess {
    Played(PlayOutcome),
    Drew(DrawOutcome),
    Challenged(ChallengeOutcome),
    Accepted(AcceptOutcome),
    Declared(DeclareOutcome),
    CalledOut(CallOutOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawOutcome {
    /// Cards actually drawn.
    pub drew: usize,
    /// Whether a pending stack was paid.
    pub stacked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeOutcome {
    /// The challenger won: the wild-draw-4 was illegal.
    pub success: bool,
    pub penalized: PlayerId,
    pub penalty: usize,
    pub was_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptOutcome {
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclareOutcome {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallOutOutcome {
    pub penalty: usize,
}

// ---------------------------------------------------------------------------
// UnoHandler
// ---------------------------------------------------------------------------

/// Orchestrates one UNO game for one room.
pub struct UnoHandler {
    config: UnoConfig,
    state: UnoState,
    rng: StdRng,
    events: Vec<(Recipient, UnoEvent)>,
}

impl UnoHandler {
    /// Creates a handler that shuffles from OS entropy.
    pub fn new(config: UnoConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates a handler with a reproducible shuffle.
    pub fn with_seed(config: UnoConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: UnoConfig, rng: StdRng) -> Self {
        Self {
            config,
            state: UnoState::new(),
            rng,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &UnoConfig {
        &self.config
    }

    /// Read-only view of the full state, hands included.
    pub fn state(&self) -> &UnoState {
        &self.state
    }

    /// The cards `player` holds.
    pub fn hand(&self, player: PlayerId) -> Option<&[Card]> {
        self.state.hand(player)
    }

    /// Plays `card_id` from `player`'s hand.
    ///
    /// `chosen_color` only matters for wilds; without it the wild takes the
    /// most common color left in the hand.
    pub fn play_card(
        &mut self,
        player: PlayerId,
        card_id: CardId,
        chosen_color: Option<Color>,
    ) -> Result<PlayOutcome, ActionError> {
        self.ensure_running()?;
        self.ensure_turn(player)?;
        let hand = self
            .state
            .hands
            .get(&player)
            .ok_or(ActionError::HandNotFound)?;
        let index = hand
            .iter()
            .position(|c| c.id == card_id)
            .ok_or(ActionError::CardNotInHand)?;
        if !rules::can_play_card(&self.state, &hand[index]) {
            return Err(ActionError::InvalidPlay);
        }

        let previous_color = self.state.current_color;
        let previous_top = self.state.top_card().cloned();
        let Some(hand) = self.state.hands.get_mut(&player) else {
            return Err(ActionError::HandNotFound);
        };
        let card = hand.remove(index);
        let remaining = hand.len();
        let snapshot =
            (card.kind == CardKind::WildDraw4).then(|| hand.clone());
        let fallback = rules::default_color(hand);

        self.state.discard_pile.push(card.clone());
        if let Some(challenge) = self.state.challenge.as_mut() {
            challenge.resolved = true;
        }
        let reversed = rules::apply_card_effects(
            &mut self.state,
            &card,
            chosen_color,
            fallback,
        );
        tracing::debug!(%player, card = %card.id, kind = ?card.kind, "card played");

        self.hand_changed(player);
        self.push_turn_events(reversed);

        if remaining == 0 {
            self.finish(player, false);
            self.check_conservation();
            return Ok(PlayOutcome {
                winner: Some(player),
            });
        }

        if let Some(hand_snapshot) = snapshot {
            self.arm_challenge(player, hand_snapshot, previous_color, previous_top);
        }
        self.advance_after_play(card.kind);
        self.check_conservation();
        Ok(PlayOutcome { winner: None })
    }

    /// Draws for `player`: the whole pending stack if there is one,
    /// otherwise a single card. The turn always moves on.
    pub fn draw_card(
        &mut self,
        player: PlayerId,
    ) -> Result<DrawOutcome, ActionError> {
        self.ensure_running()?;
        self.ensure_turn(player)?;
        if !self.state.hands.contains_key(&player) {
            return Err(ActionError::HandNotFound);
        }

        let stacked = self.state.pending_draw_count > 0;
        let wanted = if stacked {
            self.state.pending_draw_count
        } else {
            1
        };
        let drew = self.draw_into_hand(player, wanted);

        if stacked {
            self.state.pending_draw_count = 0;
            self.state.pending_draw_type = None;
            if let Some(challenge) = self.state.challenge.as_mut() {
                if !challenge.resolved && challenge.target_player == player {
                    challenge.resolved = true;
                }
            }
        }

        self.hand_changed(player);
        self.advance_turn();
        self.check_conservation();
        Ok(DrawOutcome { drew, stacked })
    }

    /// Challenges the open wild-draw-4.
    ///
    /// The play is replayed against the hand and table as they were before
    /// it. An illegal play costs the player who made it; a legal one costs
    /// the challenger the larger of the penalty and the pending stack.
    /// Either way the stack is cleared.
    pub fn challenge_wild4(
        &mut self,
        challenger: PlayerId,
    ) -> Result<ChallengeOutcome, ActionError> {
        let challenge = self
            .state
            .open_challenge()
            .ok_or(ActionError::NoActiveChallenge)?;
        if !challenge.eligible_challengers.contains(&challenger) {
            return Err(ActionError::NotEligibleChallenger);
        }

        let was_valid = rules::wild4_play_was_legal(
            &challenge.hand_snapshot,
            challenge.previous_color,
            challenge.previous_top_card.as_ref(),
        );
        let played_by = challenge.played_by;
        let target = challenge.target_player;
        let (penalized, penalty) = if was_valid {
            let owed = self.state.pending_draw_count;
            (challenger, self.config.challenge_penalty.max(owed))
        } else {
            (played_by, self.config.challenge_penalty)
        };

        if let Some(challenge) = self.state.challenge.as_mut() {
            challenge.resolved = true;
        }
        self.state.pending_draw_count = 0;
        self.state.pending_draw_type = None;
        let drawn = self.draw_into_hand(penalized, penalty);

        tracing::info!(
            %challenger,
            %played_by,
            was_valid,
            %penalized,
            penalty = drawn,
            "wild draw four challenged"
        );
        self.broadcast(UnoEvent::ChallengeResult {
            challenger,
            played_by,
            was_valid,
            penalized,
            penalty: drawn,
        });
        self.hand_changed(penalized);

        if was_valid && challenger == target {
            self.advance_turn();
        }
        self.check_conservation();
        Ok(ChallengeOutcome {
            success: !was_valid,
            penalized,
            penalty: drawn,
            was_valid,
        })
    }

    /// The target acknowledges the wild-draw-4 without challenging. The
    /// stack stays pending until they draw it.
    pub fn accept_wild4(
        &mut self,
        target: PlayerId,
    ) -> Result<AcceptOutcome, ActionError> {
        let challenge = self
            .state
            .challenge
            .as_mut()
            .filter(|c| !c.resolved)
            .ok_or(ActionError::NoActiveChallenge)?;
        if challenge.target_player != target {
            return Err(ActionError::NotTargetPlayer);
        }
        challenge.resolved = true;
        Ok(AcceptOutcome { accepted: true })
    }

    /// `player` declares UNO while at one card.
    pub fn declare_uno(
        &mut self,
        player: PlayerId,
    ) -> Result<DeclareOutcome, ActionError> {
        let entry = self
            .state
            .uno_tracker
            .get_mut(&player)
            .ok_or(ActionError::NotAtUno)?;
        if entry.declared {
            return Err(ActionError::AlreadyDeclared);
        }
        entry.declared = true;
        self.broadcast(UnoEvent::UnoDeclared { player });
        Ok(DeclareOutcome {})
    }

    /// `accuser` calls out `target` for not declaring UNO.
    ///
    /// Only succeeds once the grace window since `target` reached one card
    /// has fully elapsed.
    pub fn call_out_uno(
        &mut self,
        accuser: PlayerId,
        target: PlayerId,
    ) -> Result<CallOutOutcome, ActionError> {
        if accuser == target {
            return Err(ActionError::CannotCallSelf);
        }
        let entry = self
            .state
            .uno_tracker
            .get(&target)
            .ok_or(ActionError::TargetNotAtUno)?;
        if entry.declared {
            return Err(ActionError::AlreadyDeclared);
        }
        if entry.penalized {
            return Err(ActionError::AlreadyPenalized);
        }
        if entry.at_one_card_since.elapsed() < self.config.uno_grace() {
            return Err(ActionError::GracePeriod);
        }

        if let Some(entry) = self.state.uno_tracker.get_mut(&target) {
            entry.penalized = true;
        }
        let drawn = self.draw_into_hand(target, self.config.uno_penalty);
        tracing::info!(%accuser, %target, penalty = drawn, "uno call-out");
        self.broadcast(UnoEvent::UnoCalledOut {
            accuser,
            target,
            penalty: drawn,
        });
        self.hand_changed(target);
        self.check_conservation();
        Ok(CallOutOutcome { penalty: drawn })
    }

    /// Checks that every card of the deck is in exactly one place.
    pub fn verify_conservation(&self) -> Result<(), InvariantViolation> {
        if !self.state.started {
            return Ok(());
        }
        let found = self.state.cards_in_play();
        if found != DECK_SIZE {
            return Err(InvariantViolation::CardCount {
                expected: DECK_SIZE,
                found,
            });
        }

        let mut seen = HashSet::with_capacity(DECK_SIZE);
        let cards = self
            .state
            .draw_pile
            .iter()
            .chain(&self.state.discard_pile)
            .chain(self.state.hands.values().flatten());
        for card in cards {
            if !seen.insert(card.id) {
                return Err(InvariantViolation::DuplicateCard(card.id));
            }
        }
        Ok(())
    }

    // -- internals ----------------------------------------------------------

    fn ensure_running(&self) -> Result<(), ActionError> {
        if self.state.game_ended {
            Err(ActionError::GameOver)
        } else if !self.state.started {
            Err(ActionError::NotStarted)
        } else {
            Ok(())
        }
    }

    fn ensure_turn(&self, player: PlayerId) -> Result<(), ActionError> {
        if self.state.turn.current_player() == Some(player) {
            Ok(())
        } else {
            Err(ActionError::NotYourTurn)
        }
    }

    fn check_conservation(&self) {
        if let Err(violation) = self.verify_conservation() {
            tracing::error!(%violation, "card conservation violated");
            if cfg!(debug_assertions) {
                panic!("card conservation violated: {violation}");
            }
        }
    }

    fn broadcast(&mut self, event: UnoEvent) {
        self.events.push((Recipient::All, event));
    }

    fn push_turn_events(&mut self, events: impl IntoIterator<Item = TurnEvent>) {
        for event in events {
            self.broadcast(event.into());
        }
    }

    /// Sends `player` their hand and keeps the UNO tracker in step with
    /// its size.
    fn hand_changed(&mut self, player: PlayerId) {
        let Some(hand) = self.state.hands.get(&player) else {
            return;
        };
        let size = hand.len();
        self.events.push((
            Recipient::Player(player),
            UnoEvent::HandUpdated { hand: hand.clone() },
        ));

        let tracked = self.state.uno_tracker.contains_key(&player);
        if size == 1 && !tracked {
            self.state.uno_tracker.insert(
                player,
                UnoDeclaration {
                    at_one_card_since: Instant::now(),
                    declared: false,
                    penalized: false,
                },
            );
            self.broadcast(UnoEvent::UnoAtOneCard { player });
        } else if size != 1 && tracked {
            self.state.uno_tracker.remove(&player);
            self.broadcast(UnoEvent::UnoStateCleared { player });
        }
    }

    /// Moves up to `count` cards from the draw pile into `player`'s hand,
    /// recycling the discards when the pile runs dry.
    fn draw_into_hand(&mut self, player: PlayerId, count: usize) -> usize {
        let mut drawn = 0;
        while drawn < count {
            if self.state.draw_pile.is_empty() {
                let recycled =
                    rules::recycle_discards(&mut self.state, &mut self.rng);
                if recycled == 0 {
                    tracing::warn!(%player, wanted = count, drawn, "no cards left to draw");
                    break;
                }
                tracing::debug!(recycled, "discards shuffled into draw pile");
            }
            let Some(card) = self.state.draw_pile.pop() else {
                break;
            };
            self.state.hands.entry(player).or_default().push(card);
            drawn += 1;
        }
        drawn
    }

    fn arm_challenge(
        &mut self,
        played_by: PlayerId,
        hand_snapshot: Vec<Card>,
        previous_color: Option<Color>,
        previous_top_card: Option<Card>,
    ) {
        let Some(target_player) = self.state.turn.next_player() else {
            return;
        };
        let eligible_challengers: Vec<PlayerId> = self
            .state
            .active_players()
            .filter(|p| *p != played_by)
            .collect();

        self.state.challenge = Some(Wild4Challenge {
            played_by,
            target_player,
            hand_snapshot,
            chosen_color: self.state.current_color.unwrap_or(Color::Red),
            previous_color,
            previous_top_card,
            eligible_challengers: eligible_challengers.clone(),
            resolved: false,
        });
        self.broadcast(UnoEvent::ChallengeAvailable {
            played_by,
            target_player,
            eligible_challengers,
        });
    }

    /// Turn policy after a play. Heads-up, skip and reverse both keep the
    /// turn with the player who played them.
    fn advance_after_play(&mut self, kind: CardKind) {
        let heads_up = self.state.active_players().count() == 2;
        match kind {
            CardKind::Skip if heads_up => {
                if let Some(player) = self.state.turn.next_player() {
                    self.broadcast(UnoEvent::PlayerSkipped { player });
                }
            }
            CardKind::Reverse if heads_up => {}
            CardKind::Skip => {
                self.state.turn.skip_next();
                self.advance_turn();
            }
            _ => self.advance_turn(),
        }
    }

    /// Advances the turn. Departed players sit out of the rotation, so
    /// neither the turn nor a pending skip can land on them.
    fn advance_turn(&mut self) {
        let events = self.state.turn.next_turn();
        self.push_turn_events(events);
    }

    fn finish(&mut self, winner: PlayerId, by_forfeit: bool) {
        self.state.winner = Some(winner);
        self.state.game_ended = true;
        self.state.uno_tracker.clear();
        self.state.challenge = None;
        tracing::info!(%winner, by_forfeit, "uno game won");
        self.broadcast(UnoEvent::Winner {
            player: winner,
            by_forfeit,
        });
    }

    fn player_departed(&mut self, player: PlayerId) {
        if !self.state.started
            || self.state.game_ended
            || !self.state.turn.sit_out(player)
        {
            return;
        }
        tracing::info!(%player, "player left a running uno game");
        self.state.uno_tracker.remove(&player);

        if let Some(challenge) = self.state.challenge.as_mut() {
            challenge.eligible_challengers.retain(|p| *p != player);
            if challenge.played_by == player
                || challenge.target_player == player
            {
                challenge.resolved = true;
            }
        }

        let active: Vec<PlayerId> = self.state.active_players().collect();
        if let [last] = active.as_slice() {
            self.finish(*last, true);
            return;
        }

        if self.state.turn.current_player() == Some(player) {
            self.state.pending_draw_count = 0;
            self.state.pending_draw_type = None;
            self.advance_turn();
        }
    }
}

impl GameHandler for UnoHandler {
    type Action = UnoAction;
    type Success = UnoSuccess;
    type Reason = ActionError;
    type Event = UnoEvent;
    type PublicState = UnoPublicState;

    fn room_config(&self) -> RoomConfig {
        RoomConfig {
            min_players: 2,
            max_players: 10,
            ..RoomConfig::default()
        }
    }

    /// Captures the seating order, shuffles, deals, opens the discard pile
    /// and applies the opening card.
    fn start_game(&mut self, players: &[PlayerId]) -> bool {
        if self.state.started || players.len() < 2 {
            return false;
        }

        let mut state = UnoState::new();
        state.players = players.to_vec();
        state.draw_pile = rules::build_deck();
        rules::shuffle(&mut state.draw_pile, &mut self.rng);
        rules::deal(&mut state, self.config.hand_size);
        let Some(top_card) = rules::seed_discard(&mut state).cloned() else {
            tracing::warn!(players = players.len(), "no card left to open the discard pile");
            return false;
        };
        state.turn.initialize(players.to_vec());
        rules::apply_opening_card(&mut state, &top_card);
        state.started = true;
        self.state = state;

        let first_player = self.state.turn.current_player().unwrap_or(players[0]);
        tracing::info!(
            players = players.len(),
            %first_player,
            top = %top_card.id,
            "uno game started"
        );
        self.broadcast(UnoEvent::GameStarted {
            players: players.to_vec(),
            first_player,
            current_color: self.state.current_color.unwrap_or(Color::Red),
            direction: self.state.turn.direction(),
            pending_draw_count: self.state.pending_draw_count,
            top_card,
        });
        for &player in players {
            self.hand_changed(player);
        }
        self.check_conservation();
        true
    }

    fn handle_action(
        &mut self,
        sender: PlayerId,
        action: UnoAction,
    ) -> Result<UnoSuccess, ActionError> {
        match action {
            UnoAction::PlayCard {
                card_id,
                chosen_color,
            } => self
                .play_card(sender, card_id, chosen_color)
                .map(UnoSuccess::Played),
            UnoAction::DrawCard => self.draw_card(sender).map(UnoSuccess::Drew),
            UnoAction::ChallengeWild4 => {
                self.challenge_wild4(sender).map(UnoSuccess::Challenged)
            }
            UnoAction::AcceptWild4 => {
                self.accept_wild4(sender).map(UnoSuccess::Accepted)
            }
            UnoAction::DeclareUno => {
                self.declare_uno(sender).map(UnoSuccess::Declared)
            }
            UnoAction::CallOutUno { target } => self
                .call_out_uno(sender, target)
                .map(UnoSuccess::CalledOut),
        }
    }

    fn take_events(&mut self) -> Vec<(Recipient, UnoEvent)> {
        std::mem::take(&mut self.events)
    }

    fn public_state(&self) -> UnoPublicState {
        self.state.public_view()
    }

    fn is_finished(&self) -> bool {
        self.state.game_ended
    }

    fn on_player_left(&mut self, player: PlayerId) {
        self.player_departed(player);
    }
}
