//! The UNO rule engine.
//!
//! Transition functions over [`UnoState`]: deck construction, dealing, the
//! first-card rule, the legality check and card effects, plus the replay
//! used to adjudicate a wild-draw-4 challenge. Turn advancement is left to
//! the handler because it depends on the size of the table.

use rand::Rng;
use rand::seq::SliceRandom;

use deckhand_turn::TurnEvent;

use crate::{Card, CardKind, Color, UnoState};

/// Cards in a standard deck.
pub const DECK_SIZE: usize = 108;

/// Builds an unshuffled deck with ids `0..DECK_SIZE`.
///
/// Per color: one 0, two each of 1 to 9, two each of skip, reverse and
/// draw2. Then four wilds and four wild-draw-4s.
pub fn build_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    let mut next_id = 0;
    let mut id = || {
        let id = next_id;
        next_id += 1;
        id
    };

    for color in Color::ALL {
        deck.push(Card::number(id(), color, 0));
        for value in 1..=9 {
            for _ in 0..2 {
                deck.push(Card::number(id(), color, value));
            }
        }
        for kind in [CardKind::Skip, CardKind::Reverse, CardKind::Draw2] {
            for _ in 0..2 {
                deck.push(Card::action(id(), color, kind));
            }
        }
    }
    for kind in [CardKind::Wild, CardKind::WildDraw4] {
        for _ in 0..4 {
            deck.push(Card::wild(id(), kind));
        }
    }
    deck
}

/// Uniform random permutation.
pub fn shuffle<R: Rng + ?Sized>(cards: &mut [Card], rng: &mut R) {
    cards.shuffle(rng);
}

/// Deals `hand_size` cards to every seated player, one at a time in seat
/// order, from the top of the draw pile.
pub fn deal(state: &mut UnoState, hand_size: usize) {
    for player in &state.players {
        state.hands.entry(*player).or_default();
    }
    for _ in 0..hand_size {
        for player in &state.players {
            let Some(card) = state.draw_pile.pop() else {
                return;
            };
            state.hands.entry(*player).or_default().push(card);
        }
    }
}

/// Turns over the opening discard.
///
/// A wild-draw-4 is never allowed to open: it goes back under the draw
/// pile and the next card is tried. An opening wild counts as red.
pub fn seed_discard(state: &mut UnoState) -> Option<&Card> {
    for _ in 0..state.draw_pile.len() {
        let card = state.draw_pile.pop()?;
        if card.kind == CardKind::WildDraw4 {
            state.draw_pile.insert(0, card);
            continue;
        }
        state.current_color = Some(card.color.unwrap_or(Color::Red));
        state.current_kind = Some(card.kind);
        state.current_value = card.value;
        state.discard_pile.push(card);
        return state.discard_pile.last();
    }
    None
}

/// Applies the opening discard before the first turn.
///
/// A skip passes over the first seat. A reverse flips the direction and the
/// first seat keeps the turn. A draw2 leaves a stack of two for the first
/// seat. Expects the turn manager to be initialized.
pub fn apply_opening_card(state: &mut UnoState, card: &Card) {
    match card.kind {
        CardKind::Skip => {
            state.turn.next_turn();
        }
        CardKind::Reverse => {
            state.turn.reverse_direction();
        }
        CardKind::Draw2 => {
            state.pending_draw_count = 2;
            state.pending_draw_type = Some(CardKind::Draw2);
        }
        CardKind::Number | CardKind::Wild | CardKind::WildDraw4 => {}
    }
}

/// Moves every discard except the top back into the draw pile, shuffled.
///
/// Returns how many cards were recycled.
pub fn recycle_discards<R: Rng + ?Sized>(
    state: &mut UnoState,
    rng: &mut R,
) -> usize {
    let Some(top) = state.discard_pile.pop() else {
        return 0;
    };
    let mut recycled = std::mem::replace(&mut state.discard_pile, vec![top]);
    let count = recycled.len();
    shuffle(&mut recycled, rng);
    recycled.append(&mut state.draw_pile);
    state.draw_pile = recycled;
    count
}

/// Whether `card` may be played on the current table.
///
/// With a draw stack pending only a penalty card can continue it: draw2 on
/// draw2, and wild-draw-4 on anything. Otherwise the card must match the
/// current color, the current action kind, or the current number, or be
/// a wild.
pub fn can_play_card(state: &UnoState, card: &Card) -> bool {
    if state.pending_draw_count > 0 {
        return match card.kind {
            CardKind::WildDraw4 => true,
            CardKind::Draw2 => state.pending_draw_type == Some(CardKind::Draw2),
            _ => false,
        };
    }

    if card.kind.is_wild() {
        return true;
    }
    if card.color.is_some() && card.color == state.current_color {
        return true;
    }
    match card.kind {
        CardKind::Number => {
            state.current_kind == Some(CardKind::Number)
                && card.value.is_some()
                && card.value == state.current_value
        }
        kind => state.current_kind == Some(kind),
    }
}

/// Updates the legality reference and the draw stack for a card that was
/// just placed on the discard pile.
///
/// Wilds take `chosen` as the new color, or `fallback` when the player
/// named none. A reverse flips the direction and returns the resulting
/// event. Skips are resolved by the caller's turn policy.
pub fn apply_card_effects(
    state: &mut UnoState,
    card: &Card,
    chosen: Option<Color>,
    fallback: Color,
) -> Option<TurnEvent> {
    state.current_kind = Some(card.kind);
    state.current_value = card.value;
    state.current_color = Some(match card.color {
        Some(color) => color,
        None => chosen.unwrap_or(fallback),
    });

    match card.kind {
        CardKind::Draw2 => {
            state.pending_draw_count += 2;
            state.pending_draw_type = Some(CardKind::Draw2);
            None
        }
        CardKind::WildDraw4 => {
            state.pending_draw_count += 4;
            state.pending_draw_type = Some(CardKind::WildDraw4);
            None
        }
        CardKind::Reverse => state.turn.reverse_direction(),
        CardKind::Number | CardKind::Skip | CardKind::Wild => None,
    }
}

/// The color a wild takes when the player names none: the most frequent
/// color left in `hand`, ties going to the earlier of red, yellow, green,
/// blue. Red for an empty or all-wild hand.
pub fn default_color(hand: &[Card]) -> Color {
    let mut best = (Color::Red, 0);
    for color in Color::ALL {
        let count = hand.iter().filter(|c| c.color == Some(color)).count();
        if count > best.1 {
            best = (color, count);
        }
    }
    best.0
}

/// Replays a wild-draw-4 play against the pre-play table.
///
/// The play was legal only if nothing in `snapshot` was a plain wild,
/// matched `previous_color`, or matched the previous top card's number or
/// action kind.
pub fn wild4_play_was_legal(
    snapshot: &[Card],
    previous_color: Option<Color>,
    previous_top: Option<&Card>,
) -> bool {
    !snapshot
        .iter()
        .any(|card| was_alternative(card, previous_color, previous_top))
}

fn was_alternative(
    card: &Card,
    previous_color: Option<Color>,
    previous_top: Option<&Card>,
) -> bool {
    if card.kind == CardKind::Wild {
        return true;
    }
    if card.color.is_some() && card.color == previous_color {
        return true;
    }
    let Some(top) = previous_top else {
        return false;
    };
    match card.kind {
        CardKind::Number => {
            top.kind == CardKind::Number && card.value == top.value
        }
        CardKind::Skip | CardKind::Reverse | CardKind::Draw2 => {
            top.kind == card.kind
        }
        CardKind::Wild | CardKind::WildDraw4 => false,
    }
}
