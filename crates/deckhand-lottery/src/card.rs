//! Lottery cards and the figures they can score.

use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};

/// A scoring pattern, in the order figures are awarded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Figure {
    Two,
    Three,
    Four,
    Five,
    FullCard,
}

impl Figure {
    pub const ALL: [Figure; 5] = [
        Figure::Two,
        Figure::Three,
        Figure::Four,
        Figure::Five,
        Figure::FullCard,
    ];

    /// Marked numbers needed in a single row, or `None` for the full card.
    pub fn in_a_row(self) -> Option<usize> {
        match self {
            Self::Two => Some(2),
            Self::Three => Some(3),
            Self::Four => Some(4),
            Self::Five => Some(5),
            Self::FullCard => None,
        }
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Two => "two",
            Self::Three => "three",
            Self::Four => "four",
            Self::Five => "five",
            Self::FullCard => "full_card",
        };
        f.write_str(name)
    }
}

/// One player's card: distinct numbers laid out in sorted rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryCard {
    pub rows: Vec<Vec<u8>>,
}

impl LotteryCard {
    /// Draws `rows * per_row` distinct numbers from `1..=numbers`.
    ///
    /// Returns `None` if the range is too small to fill the card.
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        numbers: u8,
        rows: usize,
        per_row: usize,
    ) -> Option<Self> {
        let needed = rows * per_row;
        if needed == 0 || needed > usize::from(numbers) {
            return None;
        }
        let picked: Vec<u8> = index::sample(rng, usize::from(numbers), needed)
            .into_iter()
            .filter_map(|i| u8::try_from(i + 1).ok())
            .collect();
        let rows = picked
            .chunks(per_row)
            .map(|chunk| {
                let mut row = chunk.to_vec();
                row.sort_unstable();
                row
            })
            .collect();
        Some(Self { rows })
    }

    /// Whether the card reaches `figure` given the numbers drawn so far.
    pub fn has(&self, figure: Figure, drawn: &HashSet<u8>) -> bool {
        match figure.in_a_row() {
            Some(needed) => self.best_row(drawn) >= needed,
            None => self.is_complete(drawn),
        }
    }

    /// Most marked numbers in any single row.
    pub fn best_row(&self, drawn: &HashSet<u8>) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|n| drawn.contains(n)).count())
            .max()
            .unwrap_or(0)
    }

    pub fn is_complete(&self, drawn: &HashSet<u8>) -> bool {
        self.rows.iter().flatten().all(|n| drawn.contains(n))
    }

    pub fn contains(&self, number: u8) -> bool {
        self.rows.iter().flatten().any(|n| *n == number)
    }
}
