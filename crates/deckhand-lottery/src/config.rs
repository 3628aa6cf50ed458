use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for one lottery game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    /// Time between draws, in milliseconds. Default: 2000.
    pub draw_interval_ms: u64,

    /// Numbers in the pouch, drawn from `1..=numbers`. Default: 90.
    pub numbers: u8,

    /// Rows per card. Default: 3.
    pub rows: usize,

    /// Numbers per row. Default: 5.
    pub per_row: usize,

    /// Maximum players in a lottery room. Default: 20.
    pub max_players: usize,
}

impl LotteryConfig {
    pub fn draw_interval(&self) -> Duration {
        Duration::from_millis(self.draw_interval_ms)
    }
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            draw_interval_ms: 2000,
            numbers: 90,
            rows: 3,
            per_row: 5,
            max_players: 20,
        }
    }
}
