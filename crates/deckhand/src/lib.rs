//! # Deckhand
//!
//! Server-side session, turn and rule machinery for multiplayer card games.
//!
//! A transport layer (not included) hands Deckhand a player id and encoded
//! bytes. Deckhand routes them to the player's room, where a single actor
//! task applies them to that room's game handler and fans the resulting
//! notifications back out to the right players.
//!
//! Two games ship with the crate: UNO ([`deckhand_uno`]) and a timed number
//! lottery ([`deckhand_lottery`]). New games implement
//! [`GameHandler`](deckhand_room::GameHandler) and register a constructor
//! with a [`HandlerFactory`](deckhand_room::HandlerFactory).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deckhand::prelude::*;
//! use tokio::sync::mpsc;
//!
//! # async fn run() -> Result<(), DeckhandError> {
//! deckhand::init_tracing();
//! let mut rooms = RoomManager::new(deckhand::default_factory()?);
//!
//! let (tx, _rx) = mpsc::unbounded_channel();
//! let host = PlayerRecord::new(PlayerId(1), "ana");
//! let room = rooms.create_room(host, "friday night", deckhand::UNO, tx).await?;
//! # let _ = room;
//! # Ok(())
//! # }
//! ```

mod error;
mod setup;

pub use error::DeckhandError;
pub use setup::{LOTTERY, UNO, default_factory, factory_with, init_tracing};

pub use deckhand_lottery;
pub use deckhand_protocol;
pub use deckhand_room;
pub use deckhand_turn;
pub use deckhand_uno;

pub mod prelude {
    pub use crate::DeckhandError;
    pub use deckhand_protocol::{
        ActionReply, Codec, JsonCodec, PlayerId, Recipient, RoomId,
    };
    pub use deckhand_room::{
        BoundGame, GameHandler, HandlerFactory, PlayerRecord, RoomConfig,
        RoomEvent, RoomGame, RoomInfo, RoomManager, RoomOutbound, RoomState,
    };
    pub use deckhand_turn::{Direction, TurnEvent, TurnManager};
    pub use deckhand_uno::{UnoAction, UnoConfig, UnoEvent, UnoHandler};
    pub use deckhand_lottery::{LotteryConfig, LotteryEvent, LotteryHandler};
}
