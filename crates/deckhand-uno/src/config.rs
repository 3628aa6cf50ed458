//! UNO game configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for one UNO game.
///
/// ```rust
/// use deckhand_uno::UnoConfig;
///
/// let config = UnoConfig {
///     hand_size: 5,
///     ..Default::default()
/// };
/// assert_eq!(config.uno_penalty, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnoConfig {
    /// Cards dealt to each player at start. Default: 7.
    pub hand_size: usize,

    /// How long a player at one card is safe from call-outs, in
    /// milliseconds. Default: 3000.
    pub uno_grace_ms: u64,

    /// Cards drawn by a player successfully called out. Default: 4.
    pub uno_penalty: usize,

    /// Cards drawn by the loser of a wild-draw-4 challenge. Default: 4.
    pub challenge_penalty: usize,
}

impl UnoConfig {
    /// The call-out grace window.
    pub fn uno_grace(&self) -> Duration {
        Duration::from_millis(self.uno_grace_ms)
    }
}

impl Default for UnoConfig {
    fn default() -> Self {
        Self {
            hand_size: 7,
            uno_grace_ms: 3000,
            uno_penalty: 4,
            challenge_penalty: 4,
        }
    }
}
