//! Shared vocabulary for Deckhand.
//!
//! This crate defines what every other layer agrees on:
//!
//! - **Identities** ([`PlayerId`], [`RoomId`]) — stable keys for players
//!   and rooms.
//! - **Addressing** ([`Recipient`]) — who a notification is meant for.
//! - **Replies** ([`ActionReply`]) — the uniform `{ok, reason?, ...}`
//!   shape every game action answers with.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how actions, replies and
//!   notifications become bytes for the transport.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about rooms or rules. The room layer
//! uses it to talk to an external transport without committing to a wire
//! format:
//!
//! ```text
//! Transport (bytes) ⇄ Protocol (Codec, ActionReply) ⇄ Room ⇄ Game handler
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ActionReply, PlayerId, Recipient, RoomId};
