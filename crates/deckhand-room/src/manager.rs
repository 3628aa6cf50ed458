//! Room manager: creates, tracks, and routes players to rooms.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use deckhand_protocol::{PlayerId, RoomId};

use crate::room::spawn_room;
use crate::{
    HandlerFactory, PlayerRecord, PlayerSender, RoomError, RoomHandle, RoomInfo,
};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// The room/session registry.
///
/// Owns every live room, knows which room each player is in, and resolves
/// game keys through the [`HandlerFactory`]. A player can be in at most one
/// room at a time. Rooms are created by a player's create request and
/// destroyed as soon as their roster empties.
pub struct RoomManager {
    factory: Arc<HandlerFactory>,

    /// Active rooms, keyed by room ID.
    rooms: HashMap<RoomId, RoomHandle>,

    /// Maps each player to the room they're currently in.
    player_rooms: HashMap<PlayerId, RoomId>,
}

impl RoomManager {
    /// Creates an empty registry that builds games with `factory`.
    pub fn new(factory: HandlerFactory) -> Self {
        Self {
            factory: Arc::new(factory),
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
        }
    }

    /// The factory rooms are built from.
    pub fn factory(&self) -> &HandlerFactory {
        &self.factory
    }

    /// Creates a room for `game_key` with `host` as its first player.
    ///
    /// # Errors
    /// - [`RoomError::UnknownGame`] if `game_key` is not registered; no
    ///   room is created in that case.
    /// - [`RoomError::InvalidState`] if `host` is already in a room.
    pub async fn create_room(
        &mut self,
        host: PlayerRecord,
        name: &str,
        game_key: &str,
        sender: PlayerSender,
    ) -> Result<RoomId, RoomError> {
        self.ensure_roomless(host.id)?;

        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let game = self.factory.create(game_key, room_id)?;
        let handle = spawn_room(
            room_id,
            name.to_string(),
            game,
            Arc::clone(&self.factory),
        );

        let host_id = host.id;
        handle.join(host, sender).await?;
        self.rooms.insert(room_id, handle);
        self.player_rooms.insert(host_id, room_id);
        tracing::info!(%room_id, game = game_key, host = %host_id, "room created");
        Ok(room_id)
    }

    /// Adds a player to a room.
    pub async fn join_room(
        &mut self,
        player: PlayerRecord,
        room_id: RoomId,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        if let Some(current) = self.player_rooms.get(&player.id) {
            if *current == room_id {
                return Err(RoomError::AlreadyInRoom(player.id, room_id));
            }
        }
        self.ensure_roomless(player.id)?;

        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        let player_id = player.id;
        handle.join(player, sender).await?;
        self.player_rooms.insert(player_id, room_id);
        Ok(())
    }

    /// Removes a player from their current room, destroying the room if
    /// it is now empty.
    pub async fn leave_room(
        &mut self,
        player_id: PlayerId,
    ) -> Result<(), RoomError> {
        let room_id = self.room_of(player_id)?;

        let outcome = match self.rooms.get(&room_id) {
            Some(handle) => Some(handle.leave(player_id).await?),
            None => None,
        };
        self.player_rooms.remove(&player_id);

        if outcome.is_some_and(|o| o.remaining == 0) {
            self.destroy_room(room_id).await?;
        }
        Ok(())
    }

    /// Asks the player's room to start its game (host only).
    pub async fn start_game(
        &self,
        player_id: PlayerId,
    ) -> Result<bool, RoomError> {
        self.handle_of(player_id)?.start_game(player_id).await
    }

    /// Routes an encoded game action to the player's room and returns the
    /// encoded reply.
    pub async fn route_action(
        &self,
        player_id: PlayerId,
        data: Vec<u8>,
    ) -> Result<Vec<u8>, RoomError> {
        self.handle_of(player_id)?.action(player_id, data).await
    }

    /// Marks the player ready for a rematch in their room.
    pub async fn ready_for_rematch(
        &self,
        player_id: PlayerId,
    ) -> Result<bool, RoomError> {
        self.handle_of(player_id)?.ready_for_rematch(player_id).await
    }

    /// Returns the encoded public snapshot of a room's game.
    pub async fn public_state(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<u8>, RoomError> {
        self.handle(room_id)?.public_state().await
    }

    /// Returns info about a specific room.
    pub async fn get_room_info(
        &self,
        room_id: RoomId,
    ) -> Result<RoomInfo, RoomError> {
        self.handle(room_id)?.get_info().await
    }

    /// Shuts down a room and removes all its players from the index.
    pub async fn destroy_room(
        &mut self,
        room_id: RoomId,
    ) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        let _ = handle.shutdown().await;
        self.player_rooms.retain(|_, rid| *rid != room_id);

        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }

    /// Returns the room ID a player is currently in, if any.
    pub fn player_room(&self, player_id: &PlayerId) -> Option<RoomId> {
        self.player_rooms.get(player_id).copied()
    }

    /// Lists all rooms that are currently joinable.
    ///
    /// Rooms that fail to respond (e.g., shutting down) are skipped.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut infos = Vec::with_capacity(self.rooms.len());
        for handle in self.rooms.values() {
            if let Ok(info) = handle.get_info().await {
                if info.state.is_joinable() {
                    infos.push(info);
                }
            }
        }
        infos
    }

    /// Returns cloned handles to all active rooms.
    pub fn room_handles(&self) -> Vec<RoomHandle> {
        self.rooms.values().cloned().collect()
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all active room IDs.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }

    fn ensure_roomless(&self, player_id: PlayerId) -> Result<(), RoomError> {
        match self.player_rooms.get(&player_id) {
            Some(existing) => Err(RoomError::InvalidState(format!(
                "player {} is already in room {}",
                player_id, existing
            ))),
            None => Ok(()),
        }
    }

    fn room_of(&self, player_id: PlayerId) -> Result<RoomId, RoomError> {
        self.player_rooms.get(&player_id).copied().ok_or_else(|| {
            RoomError::InvalidState(format!(
                "player {} is not in any room",
                player_id
            ))
        })
    }

    fn handle(&self, room_id: RoomId) -> Result<&RoomHandle, RoomError> {
        self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))
    }

    fn handle_of(&self, player_id: PlayerId) -> Result<&RoomHandle, RoomError> {
        self.handle(self.room_of(player_id)?)
    }
}
