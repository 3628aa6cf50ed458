//! Room lifecycle management for Deckhand.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! roster and exactly one game handler. Actions for a room are processed
//! one at a time, in arrival order, so a handler never sees overlapping
//! mutations. Rooms share nothing and run independently.
//!
//! # Key types
//!
//! - [`GameHandler`] — the typed trait each game implements
//! - [`RoomGame`] — the object-safe, byte-level view a room actor drives
//! - [`HandlerFactory`] — builds the right handler for a game key
//! - [`RoomManager`] — creates/destroys rooms, routes players
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomState`] — lifecycle state machine
//! - [`RoomConfig`] — per-game room settings (player limits, queue size)

mod config;
mod error;
mod factory;
mod logic;
mod manager;
mod room;

pub use config::{RoomConfig, RoomState};
pub use error::RoomError;
pub use factory::HandlerFactory;
pub use logic::{BoundGame, GameHandler, RoomGame};
pub use manager::RoomManager;
pub use room::{
    LeaveOutcome, PlayerRecord, PlayerSender, RoomEvent, RoomHandle, RoomInfo,
    RoomOutbound,
};
