//! The `GameHandler` trait, the extension point for each game.
//!
//! A game implements [`GameHandler`] with its own typed actions, replies
//! and events. The room actor cannot hold a generic handler (rooms for
//! different games share one registry), so [`BoundGame`] erases the types
//! behind the object-safe [`RoomGame`] trait, using a [`Codec`] to move
//! between bytes and typed values.

use std::fmt;
use std::time::Duration;

use deckhand_protocol::{
    ActionReply, Codec, JsonCodec, PlayerId, ProtocolError, Recipient,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::RoomConfig;

/// The orchestrator of one game instance for one room.
///
/// The handler is the sole mutator of its game state. Each call runs to
/// completion before the room actor delivers the next one.
///
/// Associated types:
/// - `Action` — what players ask for (play a card, draw, ...)
/// - `Success` — the extra fields of a successful reply
/// - `Reason` — the machine-readable rejection reason
/// - `Event` — notifications produced by state transitions
/// - `PublicState` — the redacted snapshot any client may see
pub trait GameHandler: Send + 'static {
    type Action: DeserializeOwned + Send;
    type Success: Serialize;
    type Reason: Serialize + fmt::Display;
    type Event: Serialize;
    type PublicState: Serialize;

    /// Room settings for this game. Default: `RoomConfig::default()`.
    fn room_config(&self) -> RoomConfig {
        RoomConfig::default()
    }

    /// Starts the game with the room's current roster, in seating order.
    ///
    /// Returns `false` without changing anything if the game is already
    /// started or `players` does not satisfy the game's minimum.
    fn start_game(&mut self, players: &[PlayerId]) -> bool;

    /// Applies one action from `sender`.
    ///
    /// Expected rule violations come back as `Err(reason)`; they never
    /// panic and never leave the state partially mutated.
    fn handle_action(
        &mut self,
        sender: PlayerId,
        action: Self::Action,
    ) -> Result<Self::Success, Self::Reason>;

    /// Drains the notifications queued by previous calls.
    fn take_events(&mut self) -> Vec<(Recipient, Self::Event)>;

    /// Derives the redacted public snapshot.
    fn public_state(&self) -> Self::PublicState;

    /// Returns `true` once the game is over.
    fn is_finished(&self) -> bool;

    /// A player joined the room. Default: no-op.
    fn on_player_joined(&mut self, _player: PlayerId) {}

    /// A player left the room. Default: no-op.
    fn on_player_left(&mut self, _player: PlayerId) {}

    /// How often the room should call [`tick`](Self::tick) while the game
    /// runs. `None` (the default) means purely action-driven.
    fn tick_interval(&self) -> Option<Duration> {
        None
    }

    /// Called every `tick_interval` while the game is running.
    fn tick(&mut self) {}
}

/// The type-erased view of a game handler that a room actor drives.
///
/// Actions come in as encoded bytes and replies, notifications and
/// snapshots go out as encoded bytes.
pub trait RoomGame: Send {
    /// The key this game was registered under.
    fn game_key(&self) -> &str;

    fn room_config(&self) -> RoomConfig;

    fn start_game(&mut self, players: &[PlayerId]) -> bool;

    /// Decodes and applies an action, returning the encoded
    /// [`ActionReply`].
    ///
    /// # Errors
    /// Returns [`ProtocolError`] if the action bytes cannot be decoded or
    /// the reply cannot be encoded. Rule violations are *not* errors here.
    fn handle_action(
        &mut self,
        sender: PlayerId,
        action: &[u8],
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Drains and encodes pending notifications.
    fn take_notifications(
        &mut self,
    ) -> Result<Vec<(Recipient, Vec<u8>)>, ProtocolError>;

    /// Encodes the current public snapshot.
    fn public_state(&self) -> Result<Vec<u8>, ProtocolError>;

    fn is_finished(&self) -> bool;

    fn on_player_joined(&mut self, player: PlayerId);

    fn on_player_left(&mut self, player: PlayerId);

    fn tick_interval(&self) -> Option<Duration>;

    fn tick(&mut self);
}

/// A [`GameHandler`] bound to its game key and a codec.
pub struct BoundGame<G, C = JsonCodec> {
    key: String,
    handler: G,
    codec: C,
}

impl<G: GameHandler> BoundGame<G, JsonCodec> {
    /// Binds `handler` under `key` using the JSON codec.
    pub fn new(key: impl Into<String>, handler: G) -> Self {
        Self::with_codec(key, handler, JsonCodec)
    }
}

impl<G: GameHandler, C: Codec> BoundGame<G, C> {
    /// Binds `handler` under `key` using `codec`.
    pub fn with_codec(key: impl Into<String>, handler: G, codec: C) -> Self {
        Self {
            key: key.into(),
            handler,
            codec,
        }
    }

    /// The typed handler inside.
    pub fn handler(&self) -> &G {
        &self.handler
    }
}

impl<G: GameHandler, C: Codec> RoomGame for BoundGame<G, C> {
    fn game_key(&self) -> &str {
        &self.key
    }

    fn room_config(&self) -> RoomConfig {
        self.handler.room_config()
    }

    fn start_game(&mut self, players: &[PlayerId]) -> bool {
        self.handler.start_game(players)
    }

    fn handle_action(
        &mut self,
        sender: PlayerId,
        action: &[u8],
    ) -> Result<Vec<u8>, ProtocolError> {
        let action: G::Action = self.codec.decode(action)?;
        let result = self.handler.handle_action(sender, action);
        if let Err(reason) = &result {
            tracing::debug!(
                game = %self.key,
                %sender,
                %reason,
                "action rejected"
            );
        }
        self.codec.encode(&ActionReply::from(result))
    }

    fn take_notifications(
        &mut self,
    ) -> Result<Vec<(Recipient, Vec<u8>)>, ProtocolError> {
        self.handler
            .take_events()
            .into_iter()
            .map(|(recipient, event)| {
                Ok((recipient, self.codec.encode(&event)?))
            })
            .collect()
    }

    fn public_state(&self) -> Result<Vec<u8>, ProtocolError> {
        self.codec.encode(&self.handler.public_state())
    }

    fn is_finished(&self) -> bool {
        self.handler.is_finished()
    }

    fn on_player_joined(&mut self, player: PlayerId) {
        self.handler.on_player_joined(player);
    }

    fn on_player_left(&mut self, player: PlayerId) {
        self.handler.on_player_left(player);
    }

    fn tick_interval(&self) -> Option<Duration> {
        self.handler.tick_interval()
    }

    fn tick(&mut self) {
        self.handler.tick();
    }
}
