use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a lottery action was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotteryError {
    #[error("game has not started")]
    NotStarted,

    #[error("player holds no card in this game")]
    NoCard,
}
