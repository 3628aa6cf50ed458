//! Integration tests for the room system using a mock game.

use std::fmt;
use std::time::Duration;

use deckhand_protocol::{PlayerId, Recipient, RoomId};
use deckhand_room::{
    GameHandler, HandlerFactory, PlayerRecord, PlayerSender, RoomConfig,
    RoomError, RoomEvent, RoomManager, RoomOutbound, RoomState,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

// =========================================================================
// Mock game: a counter that finishes at a target value.
// =========================================================================

#[derive(Debug, Default)]
struct CounterGame {
    count: u32,
    target: u32,
    started: bool,
    ticks: u32,
    tick_every: Option<Duration>,
    room_min: usize,
    events: Vec<(Recipient, CounterEvent)>,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum CounterAction {
    Increment,
}

#[derive(Serialize)]
struct Counted {
    count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum CounterReason {
    NotStarted,
}

impl fmt::Display for CounterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not_started")
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
enum CounterEvent {
    Counted(u32),
    Finished,
}

#[derive(Serialize)]
struct CounterView {
    count: u32,
    ticks: u32,
    started: bool,
}

impl GameHandler for CounterGame {
    type Action = CounterAction;
    type Success = Counted;
    type Reason = CounterReason;
    type Event = CounterEvent;
    type PublicState = CounterView;

    fn room_config(&self) -> RoomConfig {
        RoomConfig {
            min_players: self.room_min.max(2),
            max_players: 4,
            ..RoomConfig::default()
        }
    }

    fn start_game(&mut self, players: &[PlayerId]) -> bool {
        if self.started || players.len() < 2 {
            return false;
        }
        self.started = true;
        true
    }

    fn handle_action(
        &mut self,
        _sender: PlayerId,
        action: CounterAction,
    ) -> Result<Counted, CounterReason> {
        if !self.started {
            return Err(CounterReason::NotStarted);
        }
        match action {
            CounterAction::Increment => self.count += 1,
        }
        let event = if self.count >= self.target {
            CounterEvent::Finished
        } else {
            CounterEvent::Counted(self.count)
        };
        self.events.push((Recipient::All, event));
        Ok(Counted { count: self.count })
    }

    fn take_events(&mut self) -> Vec<(Recipient, CounterEvent)> {
        std::mem::take(&mut self.events)
    }

    fn public_state(&self) -> CounterView {
        CounterView {
            count: self.count,
            ticks: self.ticks,
            started: self.started,
        }
    }

    fn is_finished(&self) -> bool {
        self.started && self.count >= self.target
    }

    fn tick_interval(&self) -> Option<Duration> {
        self.tick_every
    }

    fn tick(&mut self) {
        self.ticks += 1;
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn factory() -> HandlerFactory {
    let mut factory = HandlerFactory::new();
    factory
        .register("counter", |_room| CounterGame {
            target: 2,
            ..CounterGame::default()
        })
        .unwrap();
    factory
        .register("ticking", |_room| CounterGame {
            target: 100,
            tick_every: Some(Duration::from_millis(100)),
            ..CounterGame::default()
        })
        .unwrap();
    factory
        .register("quorum", |_room| CounterGame {
            target: 2,
            room_min: 3,
            ..CounterGame::default()
        })
        .unwrap();
    factory
}

fn player(id: u64) -> PlayerRecord {
    PlayerRecord::new(PlayerId(id), format!("player-{id}"))
}

/// Creates a dummy player sender (receiver is dropped immediately).
fn dummy_sender() -> PlayerSender {
    mpsc::unbounded_channel().0
}

fn increment() -> Vec<u8> {
    serde_json::to_vec(&"increment").unwrap()
}

fn json(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).unwrap()
}

async fn two_player_room(mgr: &mut RoomManager) -> RoomId {
    let room = mgr
        .create_room(player(1), "table", "counter", dummy_sender())
        .await
        .unwrap();
    mgr.join_room(player(2), room, dummy_sender()).await.unwrap();
    room
}

// =========================================================================
// Factory
// =========================================================================

#[test]
fn test_factory_rejects_duplicate_key() {
    let mut factory = factory();
    let result = factory.register("counter", |_room| CounterGame::default());
    assert!(matches!(result, Err(RoomError::DuplicateGame(_))));
}

#[test]
fn test_factory_unknown_key_fails() {
    let factory = factory();
    let result = factory.create("chess", RoomId(1));
    assert!(matches!(result, Err(RoomError::UnknownGame(key)) if key == "chess"));
    assert_eq!(factory.game_keys(), vec!["counter", "quorum", "ticking"]);
}

#[test]
fn test_factory_builds_fresh_handlers() {
    let factory = factory();
    let game = factory.create("counter", RoomId(1)).unwrap();
    assert_eq!(game.game_key(), "counter");
    assert_eq!(game.room_config().max_players, 4);
    assert!(!game.is_finished());
}

// =========================================================================
// Room lifecycle
// =========================================================================

#[tokio::test]
async fn test_create_room_makes_creator_host() {
    let mut mgr = RoomManager::new(factory());
    let room = mgr
        .create_room(player(1), "table", "counter", dummy_sender())
        .await
        .unwrap();

    let info = mgr.get_room_info(room).await.unwrap();
    assert_eq!(info.host, Some(PlayerId(1)));
    assert_eq!(info.name, "table");
    assert_eq!(info.game_key, "counter");
    assert_eq!(info.state, RoomState::WaitingForPlayers);
    assert_eq!(mgr.player_room(&PlayerId(1)), Some(room));
}

#[tokio::test]
async fn test_create_room_unknown_game_creates_nothing() {
    let mut mgr = RoomManager::new(factory());
    let result = mgr
        .create_room(player(1), "table", "chess", dummy_sender())
        .await;

    assert!(matches!(result, Err(RoomError::UnknownGame(_))));
    assert_eq!(mgr.room_count(), 0);
    assert_eq!(mgr.player_room(&PlayerId(1)), None);
}

#[tokio::test]
async fn test_create_room_unique_ids() {
    let mut mgr = RoomManager::new(factory());
    let r1 = mgr
        .create_room(player(1), "a", "counter", dummy_sender())
        .await
        .unwrap();
    let r2 = mgr
        .create_room(player(2), "b", "counter", dummy_sender())
        .await
        .unwrap();
    assert_ne!(r1, r2);
    assert_eq!(mgr.room_count(), 2);
}

#[tokio::test]
async fn test_join_room_one_room_at_a_time() {
    let mut mgr = RoomManager::new(factory());
    let r1 = mgr
        .create_room(player(1), "a", "counter", dummy_sender())
        .await
        .unwrap();
    let _r2 = mgr
        .create_room(player(2), "b", "counter", dummy_sender())
        .await
        .unwrap();

    let result = mgr.join_room(player(2), r1, dummy_sender()).await;
    assert!(result.is_err(), "player should not join two rooms");

    let result = mgr.join_room(player(1), r1, dummy_sender()).await;
    assert!(matches!(result, Err(RoomError::AlreadyInRoom(..))));
}

#[tokio::test]
async fn test_join_room_not_found() {
    let mut mgr = RoomManager::new(factory());
    let result = mgr.join_room(player(1), RoomId(999), dummy_sender()).await;
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

#[tokio::test]
async fn test_join_room_at_max_capacity() {
    let mut mgr = RoomManager::new(factory());
    let room = mgr
        .create_room(player(1), "table", "counter", dummy_sender())
        .await
        .unwrap();
    for i in 2..=4 {
        mgr.join_room(player(i), room, dummy_sender()).await.unwrap();
    }

    let result = mgr.join_room(player(5), room, dummy_sender()).await;
    assert!(matches!(result, Err(RoomError::RoomFull(_))));
}

#[tokio::test]
async fn test_only_host_can_start() {
    let mut mgr = RoomManager::new(factory());
    let room = two_player_room(&mut mgr).await;

    let result = mgr.start_game(PlayerId(2)).await;
    assert!(matches!(result, Err(RoomError::NotHost(..))));

    assert!(mgr.start_game(PlayerId(1)).await.unwrap());
    let info = mgr.get_room_info(room).await.unwrap();
    assert_eq!(info.state, RoomState::InProgress);

    // Starting twice is a silent no-op.
    assert!(!mgr.start_game(PlayerId(1)).await.unwrap());
}

#[tokio::test]
async fn test_start_refused_when_underpopulated() {
    let mut mgr = RoomManager::new(factory());
    let room = mgr
        .create_room(player(1), "table", "counter", dummy_sender())
        .await
        .unwrap();

    assert!(!mgr.start_game(PlayerId(1)).await.unwrap());
    let info = mgr.get_room_info(room).await.unwrap();
    assert_eq!(info.state, RoomState::WaitingForPlayers);
}

#[tokio::test]
async fn test_start_waits_for_room_minimum() {
    let mut mgr = RoomManager::new(factory());
    let room = mgr
        .create_room(player(1), "table", "quorum", dummy_sender())
        .await
        .unwrap();
    mgr.join_room(player(2), room, dummy_sender()).await.unwrap();

    // The game would take two players, the room asks for three.
    assert!(!mgr.start_game(PlayerId(1)).await.unwrap());
    let info = mgr.get_room_info(room).await.unwrap();
    assert_eq!(info.state, RoomState::WaitingForPlayers);

    mgr.join_room(player(3), room, dummy_sender()).await.unwrap();
    assert!(mgr.start_game(PlayerId(1)).await.unwrap());
    let info = mgr.get_room_info(room).await.unwrap();
    assert_eq!(info.state, RoomState::InProgress);
}

#[tokio::test]
async fn test_cannot_join_after_game_started() {
    let mut mgr = RoomManager::new(factory());
    let room = two_player_room(&mut mgr).await;
    mgr.start_game(PlayerId(1)).await.unwrap();

    let result = mgr.join_room(player(3), room, dummy_sender()).await;
    assert!(matches!(result, Err(RoomError::InvalidState(_))));
    assert!(mgr.list_rooms().await.is_empty());
}

// =========================================================================
// Actions and notifications
// =========================================================================

#[tokio::test]
async fn test_action_reply_shapes() {
    let mut mgr = RoomManager::new(factory());
    two_player_room(&mut mgr).await;

    let rejected = mgr.route_action(PlayerId(1), increment()).await.unwrap();
    assert_eq!(
        json(&rejected),
        serde_json::json!({"ok": false, "reason": "not_started"})
    );

    mgr.start_game(PlayerId(1)).await.unwrap();
    let accepted = mgr.route_action(PlayerId(2), increment()).await.unwrap();
    assert_eq!(json(&accepted), serde_json::json!({"ok": true, "count": 1}));
}

#[tokio::test]
async fn test_malformed_action_is_protocol_error() {
    let mut mgr = RoomManager::new(factory());
    two_player_room(&mut mgr).await;

    let result = mgr.route_action(PlayerId(1), b"{oops".to_vec()).await;
    assert!(matches!(result, Err(RoomError::Protocol(_))));
}

#[tokio::test]
async fn test_route_action_not_in_room() {
    let mgr = RoomManager::new(factory());
    let result = mgr.route_action(PlayerId(1), increment()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_start_broadcasts_event_and_snapshot() {
    let mut mgr = RoomManager::new(factory());
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();
    let room = mgr
        .create_room(player(1), "table", "counter", tx1)
        .await
        .unwrap();
    mgr.join_room(player(2), room, tx2).await.unwrap();
    while rx1.try_recv().is_ok() {}
    while rx2.try_recv().is_ok() {}

    mgr.start_game(PlayerId(1)).await.unwrap();

    for rx in [&mut rx1, &mut rx2] {
        let first = rx.try_recv().expect("should get GameStarted");
        assert_eq!(
            first,
            RoomOutbound::Room(RoomEvent::GameStarted {
                game: "counter".into(),
            })
        );
        let second = rx.try_recv().expect("should get snapshot");
        match second {
            RoomOutbound::State(bytes) => assert_eq!(json(&bytes)["started"], true),
            other => panic!("expected State, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_game_notifications_fan_out() {
    let mut mgr = RoomManager::new(factory());
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();
    let room = mgr
        .create_room(player(1), "table", "counter", tx1)
        .await
        .unwrap();
    mgr.join_room(player(2), room, tx2).await.unwrap();
    mgr.start_game(PlayerId(1)).await.unwrap();
    while rx1.try_recv().is_ok() {}
    while rx2.try_recv().is_ok() {}

    mgr.route_action(PlayerId(1), increment()).await.unwrap();

    for rx in [&mut rx1, &mut rx2] {
        match rx.try_recv().expect("should get notification") {
            RoomOutbound::Game(bytes) => {
                let event: CounterEvent = serde_json::from_slice(&bytes).unwrap();
                assert_eq!(event, CounterEvent::Counted(1));
            }
            other => panic!("expected Game, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_public_state_on_demand() {
    let mut mgr = RoomManager::new(factory());
    let room = two_player_room(&mut mgr).await;
    mgr.start_game(PlayerId(1)).await.unwrap();
    mgr.route_action(PlayerId(1), increment()).await.unwrap();

    let snapshot = json(&mgr.public_state(room).await.unwrap());
    assert_eq!(snapshot["count"], 1);
}

// =========================================================================
// Leaving, host reassignment, destruction
// =========================================================================

#[tokio::test]
async fn test_host_reassigned_when_host_leaves() {
    let mut mgr = RoomManager::new(factory());
    let room = mgr
        .create_room(player(1), "table", "counter", dummy_sender())
        .await
        .unwrap();
    let (tx2, mut rx2) = mpsc::unbounded_channel();
    mgr.join_room(player(2), room, tx2).await.unwrap();
    mgr.join_room(player(3), room, dummy_sender()).await.unwrap();
    while rx2.try_recv().is_ok() {}

    mgr.leave_room(PlayerId(1)).await.unwrap();

    let info = mgr.get_room_info(room).await.unwrap();
    assert_eq!(info.host, Some(PlayerId(2)));
    assert_eq!(info.player_count, 2);

    let mut saw_host_change = false;
    while let Ok(msg) = rx2.try_recv() {
        if msg == RoomOutbound::Room(RoomEvent::HostChanged { host: PlayerId(2) }) {
            saw_host_change = true;
        }
    }
    assert!(saw_host_change);
}

#[tokio::test]
async fn test_room_destroyed_when_empty() {
    let mut mgr = RoomManager::new(factory());
    let room = two_player_room(&mut mgr).await;

    mgr.leave_room(PlayerId(1)).await.unwrap();
    assert_eq!(mgr.room_count(), 1);

    mgr.leave_room(PlayerId(2)).await.unwrap();
    assert_eq!(mgr.room_count(), 0);
    assert!(matches!(
        mgr.get_room_info(room).await,
        Err(RoomError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_leave_room_not_in_any_room() {
    let mut mgr = RoomManager::new(factory());
    let result = mgr.leave_room(PlayerId(1)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_leave_stops_receiving() {
    let mut mgr = RoomManager::new(factory());
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let room = mgr
        .create_room(player(1), "table", "counter", tx1)
        .await
        .unwrap();
    mgr.join_room(player(2), room, dummy_sender()).await.unwrap();
    mgr.join_room(player(3), room, dummy_sender()).await.unwrap();
    mgr.start_game(PlayerId(1)).await.unwrap();
    mgr.leave_room(PlayerId(1)).await.unwrap();
    while rx1.try_recv().is_ok() {}

    mgr.route_action(PlayerId(2), increment()).await.unwrap();
    assert!(rx1.try_recv().is_err());
}

// =========================================================================
// Finish and rematch
// =========================================================================

#[tokio::test]
async fn test_game_finishes_and_rematch_barrier() {
    let mut mgr = RoomManager::new(factory());
    let room = two_player_room(&mut mgr).await;

    let early = mgr.ready_for_rematch(PlayerId(1)).await;
    assert!(matches!(early, Err(RoomError::InvalidState(_))));

    mgr.start_game(PlayerId(1)).await.unwrap();
    mgr.route_action(PlayerId(1), increment()).await.unwrap();
    mgr.route_action(PlayerId(2), increment()).await.unwrap();
    let info = mgr.get_room_info(room).await.unwrap();
    assert_eq!(info.state, RoomState::Finished);

    assert!(!mgr.ready_for_rematch(PlayerId(1)).await.unwrap());
    assert!(mgr.ready_for_rematch(PlayerId(2)).await.unwrap());

    let info = mgr.get_room_info(room).await.unwrap();
    assert_eq!(info.state, RoomState::InProgress);
    let snapshot = json(&mgr.public_state(room).await.unwrap());
    assert_eq!(snapshot["count"], 0, "rematch uses a fresh handler");
}

// =========================================================================
// Ticking games
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_ticking_game_is_driven_by_interval() {
    let mut mgr = RoomManager::new(factory());
    let room = mgr
        .create_room(player(1), "table", "ticking", dummy_sender())
        .await
        .unwrap();
    mgr.join_room(player(2), room, dummy_sender()).await.unwrap();
    mgr.start_game(PlayerId(1)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(350)).await;

    let snapshot = json(&mgr.public_state(room).await.unwrap());
    assert_eq!(snapshot["ticks"], 3);
}

#[tokio::test(start_paused = true)]
async fn test_action_driven_game_never_ticks() {
    let mut mgr = RoomManager::new(factory());
    let room = two_player_room(&mut mgr).await;
    mgr.start_game(PlayerId(1)).await.unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;

    let snapshot = json(&mgr.public_state(room).await.unwrap());
    assert_eq!(snapshot["ticks"], 0);
}
