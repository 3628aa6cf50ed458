//! A timer-driven number lottery for Deckhand rooms.
//!
//! Every player gets a card of distinct numbers in rows. The room ticks the
//! handler at a fixed interval; each tick draws one number from the pouch
//! and awards figures (two, three, four and five in a row, then the full
//! card) to the first players who reach them. The game ends on a full card
//! or when the pouch is empty.

mod card;
mod config;
mod error;
mod events;
mod handler;

pub use card::{Figure, LotteryCard};
pub use config::LotteryConfig;
pub use error::LotteryError;
pub use events::{EndReason, LotteryEvent};
pub use handler::{
    AwardedFigure, CardReply, LotteryAction, LotteryHandler,
    LotteryPublicState,
};
