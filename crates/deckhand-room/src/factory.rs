//! Game handler factory: registration by key, construction per room.

use std::collections::HashMap;

use deckhand_protocol::RoomId;

use crate::{BoundGame, GameHandler, RoomError, RoomGame};

type Constructor = Box<dyn Fn(RoomId) -> Box<dyn RoomGame> + Send + Sync>;

/// Builds the right [`GameHandler`] for a game key.
///
/// New games are added by registering a constructor; nothing else in the
/// room layer changes.
///
/// ```rust,ignore
/// let mut factory = HandlerFactory::new();
/// factory.register("uno", |_room| UnoHandler::new(UnoConfig::default()))?;
/// let game = factory.create("uno", room_id)?;
/// ```
#[derive(Default)]
pub struct HandlerFactory {
    constructors: HashMap<String, Constructor>,
}

impl HandlerFactory {
    /// Creates a factory with no games registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor for `key`.
    ///
    /// # Errors
    /// Returns [`RoomError::DuplicateGame`] if `key` is already taken.
    pub fn register<G, F>(
        &mut self,
        key: &str,
        make: F,
    ) -> Result<&mut Self, RoomError>
    where
        G: GameHandler,
        F: Fn(RoomId) -> G + Send + Sync + 'static,
    {
        if self.constructors.contains_key(key) {
            return Err(RoomError::DuplicateGame(key.to_string()));
        }
        let owned_key = key.to_string();
        self.constructors.insert(
            key.to_string(),
            Box::new(move |room_id| {
                Box::new(BoundGame::new(owned_key.clone(), make(room_id)))
            }),
        );
        tracing::debug!(game = key, "game handler registered");
        Ok(self)
    }

    /// Builds a fresh handler for `key`, bound to `room_id`.
    ///
    /// # Errors
    /// Returns [`RoomError::UnknownGame`] if nothing is registered under
    /// `key`. This is a setup mistake, not a game rule violation.
    pub fn create(
        &self,
        key: &str,
        room_id: RoomId,
    ) -> Result<Box<dyn RoomGame>, RoomError> {
        let make = self.constructors.get(key).ok_or_else(|| {
            tracing::error!(game = key, %room_id, "unknown game key");
            RoomError::UnknownGame(key.to_string())
        })?;
        Ok(make(room_id))
    }

    /// Returns `true` if `key` is registered.
    pub fn has_game(&self, key: &str) -> bool {
        self.constructors.contains_key(key)
    }

    /// All registered keys, sorted.
    pub fn game_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> =
            self.constructors.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
