//! Room actor: an isolated Tokio task that owns a roster and a game.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Commands are handled strictly one at a time,
//! which is what keeps a game's card piles consistent: nothing else can
//! touch the handler while an action is being applied.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use deckhand_protocol::{PlayerId, Recipient, RoomId};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::{HandlerFactory, RoomConfig, RoomError, RoomGame, RoomState};

/// A room-scoped player record. Lives as long as the player's
/// connection stays in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl PlayerRecord {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar: None,
        }
    }
}

/// Room-level notifications (not specific to any game).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    PlayerJoined { player: PlayerRecord },
    PlayerLeft { player_id: PlayerId },
    HostChanged { host: PlayerId },
    GameStarted { game: String },
    GameEnded { game: String },
    RematchReady { player_id: PlayerId, ready: usize, needed: usize },
}

/// An outbound message from the room actor to a player's connection.
///
/// Delivery is fire-and-forget: the room never waits for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomOutbound {
    /// A room lifecycle event.
    Room(RoomEvent),
    /// An encoded game notification.
    Game(Vec<u8>),
    /// An encoded public snapshot (sent when a game starts).
    State(Vec<u8>),
}

/// Channel sender for delivering outbound messages to a player.
pub type PlayerSender = mpsc::UnboundedSender<RoomOutbound>;

/// What a leave did to the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// Players still in the room. Zero means the room should be destroyed.
    pub remaining: usize,
    /// The new host, if the host was the one who left.
    pub new_host: Option<PlayerId>,
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        player: PlayerRecord,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<LeaveOutcome, RoomError>>,
    },
    StartGame {
        requester: PlayerId,
        reply: oneshot::Sender<Result<bool, RoomError>>,
    },
    Action {
        sender: PlayerId,
        data: Vec<u8>,
        reply: oneshot::Sender<Result<Vec<u8>, RoomError>>,
    },
    PublicState {
        reply: oneshot::Sender<Result<Vec<u8>, RoomError>>,
    },
    ReadyForRematch {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<bool, RoomError>>,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub name: String,
    pub game_key: String,
    pub state: RoomState,
    pub host: Option<PlayerId>,
    pub players: Vec<PlayerRecord>,
    pub player_count: usize,
    pub max_players: usize,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Sends a join request to the room.
    pub async fn join(
        &self,
        player: PlayerRecord,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Join {
            player,
            sender,
            reply,
        })
        .await?
    }

    /// Sends a leave request to the room.
    pub async fn leave(
        &self,
        player_id: PlayerId,
    ) -> Result<LeaveOutcome, RoomError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply })
            .await?
    }

    /// Asks the room to start its game. Only the host may do this.
    ///
    /// `Ok(false)` means the game refused to start (already running or
    /// too few players).
    pub async fn start_game(
        &self,
        requester: PlayerId,
    ) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::StartGame { requester, reply })
            .await?
    }

    /// Delivers an encoded game action and waits for the encoded reply.
    pub async fn action(
        &self,
        sender: PlayerId,
        data: Vec<u8>,
    ) -> Result<Vec<u8>, RoomError> {
        self.request(|reply| RoomCommand::Action {
            sender,
            data,
            reply,
        })
        .await?
    }

    /// Fetches the encoded public snapshot of the game.
    pub async fn public_state(&self) -> Result<Vec<u8>, RoomError> {
        self.request(|reply| RoomCommand::PublicState { reply })
            .await?
    }

    /// Marks `player_id` ready for a rematch. Returns `true` if this was
    /// the last missing player and a new game started.
    pub async fn ready_for_rematch(
        &self,
        player_id: PlayerId,
    ) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::ReadyForRematch { player_id, reply })
            .await?
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    name: String,
    state: RoomState,
    config: RoomConfig,
    host: Option<PlayerId>,
    /// Roster in join order. Seating order for new games comes from here.
    roster: Vec<PlayerRecord>,
    senders: HashMap<PlayerId, PlayerSender>,
    rematch_ready: HashSet<PlayerId>,
    game: Box<dyn RoomGame>,
    factory: Arc<HandlerFactory>,
    ticker: Option<Interval>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!(
            room_id = %self.room_id,
            game = self.game.game_key(),
            "room actor started"
        );

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                _ = next_tick(&mut self.ticker) => {
                    self.handle_tick();
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    /// Handles one command. Returns `false` when the actor should stop.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                player,
                sender,
                reply,
            } => {
                let _ = reply.send(self.handle_join(player, sender));
            }
            RoomCommand::Leave { player_id, reply } => {
                let _ = reply.send(self.handle_leave(player_id));
            }
            RoomCommand::StartGame { requester, reply } => {
                let _ = reply.send(self.handle_start(requester));
            }
            RoomCommand::Action {
                sender,
                data,
                reply,
            } => {
                let _ = reply.send(self.handle_action(sender, &data));
            }
            RoomCommand::PublicState { reply } => {
                let _ = reply.send(
                    self.game.public_state().map_err(RoomError::from),
                );
            }
            RoomCommand::ReadyForRematch { player_id, reply } => {
                let _ = reply.send(self.handle_rematch_ready(player_id));
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                tracing::info!(room_id = %self.room_id, "room shutting down");
                self.transition(RoomState::Destroying);
                return false;
            }
        }
        true
    }

    fn handle_join(
        &mut self,
        player: PlayerRecord,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        if !self.state.is_joinable() {
            return Err(RoomError::InvalidState(format!(
                "cannot join room in state {}",
                self.state
            )));
        }
        if self.is_member(player.id) {
            return Err(RoomError::AlreadyInRoom(player.id, self.room_id));
        }
        if self.roster.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.room_id));
        }

        let player_id = player.id;
        self.senders.insert(player_id, sender);
        self.roster.push(player.clone());
        if self.host.is_none() {
            self.host = Some(player_id);
        }
        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            players = self.roster.len(),
            "player joined"
        );

        self.broadcast(RoomEvent::PlayerJoined { player });
        self.game.on_player_joined(player_id);
        self.flush_notifications();
        Ok(())
    }

    fn handle_leave(
        &mut self,
        player_id: PlayerId,
    ) -> Result<LeaveOutcome, RoomError> {
        let index = self
            .roster
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(RoomError::NotInRoom(player_id, self.room_id))?;
        self.roster.remove(index);
        self.senders.remove(&player_id);
        self.rematch_ready.remove(&player_id);

        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            players = self.roster.len(),
            "player left"
        );

        let mut new_host = None;
        if self.host == Some(player_id) {
            self.host = self.roster.first().map(|p| p.id);
            new_host = self.host;
        }

        if self.roster.is_empty() {
            return Ok(LeaveOutcome {
                remaining: 0,
                new_host: None,
            });
        }

        self.broadcast(RoomEvent::PlayerLeft { player_id });
        if let Some(host) = new_host {
            tracing::info!(room_id = %self.room_id, %host, "host reassigned");
            self.broadcast(RoomEvent::HostChanged { host });
        }

        self.game.on_player_left(player_id);
        self.flush_notifications();
        self.check_finished();
        if self.state.is_ended() && !self.rematch_ready.is_empty() {
            if let Err(e) = self.try_rematch() {
                tracing::error!(room_id = %self.room_id, error = %e, "rematch failed");
            }
        }

        Ok(LeaveOutcome {
            remaining: self.roster.len(),
            new_host,
        })
    }

    fn handle_start(&mut self, requester: PlayerId) -> Result<bool, RoomError> {
        if !self.is_member(requester) {
            return Err(RoomError::NotInRoom(requester, self.room_id));
        }
        if self.host != Some(requester) {
            return Err(RoomError::NotHost(requester, self.room_id));
        }
        if !self.state.is_joinable() {
            return Ok(false);
        }
        if self.roster.len() < self.config.min_players {
            tracing::debug!(
                room_id = %self.room_id,
                players = self.roster.len(),
                needed = self.config.min_players,
                "not enough players to start"
            );
            return Ok(false);
        }
        Ok(self.start_game())
    }

    fn handle_action(
        &mut self,
        sender: PlayerId,
        data: &[u8],
    ) -> Result<Vec<u8>, RoomError> {
        if !self.is_member(sender) {
            tracing::warn!(
                room_id = %self.room_id,
                %sender,
                "action from non-member, ignoring"
            );
            return Err(RoomError::NotInRoom(sender, self.room_id));
        }

        let reply = self.game.handle_action(sender, data)?;
        self.flush_notifications();
        self.check_finished();
        Ok(reply)
    }

    fn handle_rematch_ready(
        &mut self,
        player_id: PlayerId,
    ) -> Result<bool, RoomError> {
        if !self.is_member(player_id) {
            return Err(RoomError::NotInRoom(player_id, self.room_id));
        }
        if !self.state.is_ended() {
            return Err(RoomError::InvalidState(format!(
                "rematch requires a finished game, room is {}",
                self.state
            )));
        }

        self.rematch_ready.insert(player_id);
        self.broadcast(RoomEvent::RematchReady {
            player_id,
            ready: self.rematch_ready.len(),
            needed: self.roster.len(),
        });
        self.try_rematch()
    }

    /// Starts a fresh game once every roster member is ready.
    fn try_rematch(&mut self) -> Result<bool, RoomError> {
        let all_ready = self
            .roster
            .iter()
            .all(|p| self.rematch_ready.contains(&p.id));
        if !all_ready {
            return Ok(false);
        }

        let key = self.game.game_key().to_string();
        self.game = self.factory.create(&key, self.room_id)?;
        self.rematch_ready.clear();
        self.transition(RoomState::WaitingForPlayers);
        tracing::info!(room_id = %self.room_id, game = %key, "rematch");
        Ok(self.start_game())
    }

    fn handle_tick(&mut self) {
        self.game.tick();
        self.flush_notifications();
        self.check_finished();
    }

    fn start_game(&mut self) -> bool {
        let players: Vec<PlayerId> = self.roster.iter().map(|p| p.id).collect();
        if !self.game.start_game(&players) {
            tracing::debug!(
                room_id = %self.room_id,
                players = players.len(),
                "game refused to start"
            );
            return false;
        }

        self.transition(RoomState::InProgress);
        self.ticker = self.game.tick_interval().map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        tracing::info!(
            room_id = %self.room_id,
            game = self.game.game_key(),
            players = players.len(),
            "game started"
        );

        let game = self.game.game_key().to_string();
        self.broadcast(RoomEvent::GameStarted { game });
        self.flush_notifications();
        match self.game.public_state() {
            Ok(snapshot) => {
                for pid in self.senders.keys() {
                    self.send_to(*pid, RoomOutbound::State(snapshot.clone()));
                }
            }
            Err(e) => {
                tracing::error!(room_id = %self.room_id, error = %e, "snapshot encode failed");
            }
        }
        true
    }

    fn check_finished(&mut self) {
        if self.state == RoomState::InProgress && self.game.is_finished() {
            self.transition(RoomState::Finished);
            self.ticker = None;
            tracing::info!(room_id = %self.room_id, "game finished");
            let game = self.game.game_key().to_string();
            self.broadcast(RoomEvent::GameEnded { game });
        }
    }

    /// Drains the game's notifications and delivers them.
    fn flush_notifications(&mut self) {
        match self.game.take_notifications() {
            Ok(notifications) => {
                for (recipient, bytes) in notifications {
                    self.dispatch(&recipient, RoomOutbound::Game(bytes));
                }
            }
            Err(e) => {
                tracing::error!(
                    room_id = %self.room_id,
                    error = %e,
                    "failed to encode notifications"
                );
            }
        }
    }

    /// Moves the room along its lifecycle. A move the state machine does
    /// not allow is a bug in the actor.
    fn transition(&mut self, target: RoomState) {
        if !self.state.can_transition_to(target) {
            tracing::error!(
                room_id = %self.room_id,
                from = %self.state,
                to = %target,
                "illegal room state transition"
            );
            if cfg!(debug_assertions) {
                panic!("illegal room state transition {} -> {}", self.state, target);
            }
        }
        tracing::debug!(room_id = %self.room_id, from = %self.state, to = %target, "room state");
        self.state = target;
    }

    fn broadcast(&self, event: RoomEvent) {
        self.dispatch(&Recipient::All, RoomOutbound::Room(event));
    }

    /// Delivers an outbound message to every player `recipient` covers.
    fn dispatch(&self, recipient: &Recipient, outbound: RoomOutbound) {
        for player in &self.roster {
            if recipient.includes(player.id) {
                self.send_to(player.id, outbound.clone());
            }
        }
    }

    /// Sends to a single player. Silently drops if the receiver is gone.
    fn send_to(&self, player_id: PlayerId, msg: RoomOutbound) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    fn is_member(&self, player_id: PlayerId) -> bool {
        self.roster.iter().any(|p| p.id == player_id)
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            name: self.name.clone(),
            game_key: self.game.game_key().to_string(),
            state: self.state,
            host: self.host,
            players: self.roster.clone(),
            player_count: self.roster.len(),
            max_players: self.config.max_players,
        }
    }
}

/// Resolves on the next tick, or never if the game has no ticker.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Spawns a new room actor task and returns a handle to it.
pub(crate) fn spawn_room(
    room_id: RoomId,
    name: String,
    game: Box<dyn RoomGame>,
    factory: Arc<HandlerFactory>,
) -> RoomHandle {
    let config = game.room_config();
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let actor = RoomActor {
        room_id,
        name,
        state: RoomState::WaitingForPlayers,
        config,
        host: None,
        roster: Vec::new(),
        senders: HashMap::new(),
        rematch_ready: HashSet::new(),
        game,
        factory,
        ticker: None,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
