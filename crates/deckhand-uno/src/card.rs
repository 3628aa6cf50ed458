//! Card types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of a physical card within one deck.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// The four suit colors. Wild cards have no color of their own.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Yellow,
    Green,
    Blue,
}

impl Color {
    /// All colors, in tie-break order.
    pub const ALL: [Color; 4] = [Color::Red, Color::Yellow, Color::Green, Color::Blue];
}

/// What a card does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Number,
    Skip,
    Reverse,
    #[serde(rename = "draw2")]
    Draw2,
    Wild,
    #[serde(rename = "wild_draw4")]
    WildDraw4,
}

impl CardKind {
    /// Wild and wild-draw-4.
    pub fn is_wild(self) -> bool {
        matches!(self, Self::Wild | Self::WildDraw4)
    }

    /// Cards that add to a pending draw stack.
    pub fn is_penalty(self) -> bool {
        matches!(self, Self::Draw2 | Self::WildDraw4)
    }
}

/// A single card. `value` is only set for numbers, `color` only for
/// non-wild cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    pub kind: CardKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u8>,
}

impl Card {
    pub fn number(id: u32, color: Color, value: u8) -> Self {
        Self {
            id: CardId(id),
            color: Some(color),
            kind: CardKind::Number,
            value: Some(value),
        }
    }

    pub fn action(id: u32, color: Color, kind: CardKind) -> Self {
        Self {
            id: CardId(id),
            color: Some(color),
            kind,
            value: None,
        }
    }

    pub fn wild(id: u32, kind: CardKind) -> Self {
        Self {
            id: CardId(id),
            color: None,
            kind,
            value: None,
        }
    }
}
