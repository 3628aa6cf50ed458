use std::collections::HashMap;

use deckhand::prelude::*;
use serde_json::{json, Value};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Seating
// ---------------------------------------------------------------------------

const SEATS: [&str; 3] = ["ana", "ben", "cleo"];
const MAX_MOVES: usize = 2000;

struct Seat {
    id: PlayerId,
    name: &'static str,
    inbox: mpsc::UnboundedReceiver<RoomOutbound>,
    hand: Vec<Value>,
}

impl Seat {
    /// Reads everything the room sent this seat, keeping the latest hand.
    fn read_inbox(&mut self) -> Result<(), DeckhandError> {
        while let Ok(msg) = self.inbox.try_recv() {
            match msg {
                RoomOutbound::Room(event) => {
                    tracing::debug!(seat = self.name, ?event, "room event");
                }
                RoomOutbound::State(_) => {}
                RoomOutbound::Game(bytes) => {
                    let event: Value = decode(&bytes)?;
                    if event["type"] == "hand_updated" {
                        self.hand = event["hand"].as_array().cloned().unwrap_or_default();
                    } else if self.id == PlayerId(1) {
                        // Broadcasts reach every seat; log them once.
                        tracing::info!(%event, "table");
                    }
                }
            }
        }
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> Result<Value, DeckhandError> {
    JsonCodec.decode(bytes).map_err(DeckhandError::from)
}

// ---------------------------------------------------------------------------
// Bot moves
// ---------------------------------------------------------------------------

async fn act(
    rooms: &RoomManager,
    player: PlayerId,
    action: Value,
) -> Result<Value, DeckhandError> {
    let data = JsonCodec.encode(&action)?;
    let reply = rooms.route_action(player, data).await?;
    decode(&reply)
}

/// Plays the first card the engine accepts, or draws.
async fn take_turn(rooms: &RoomManager, seat: &Seat) -> Result<(), DeckhandError> {
    for card in &seat.hand {
        let mut action = json!({"action": "play_card", "card_id": card["id"]});
        if matches!(card["kind"].as_str(), Some("wild" | "wild_draw4")) {
            action["chosen_color"] = json!("green");
        }
        let reply = act(rooms, seat.id, action).await?;
        if reply["ok"] == true {
            tracing::info!(seat = seat.name, %card, "played");
            if seat.hand.len() == 2 {
                act(rooms, seat.id, json!({"action": "declare_uno"})).await?;
            }
            return Ok(());
        }
    }
    let reply = act(rooms, seat.id, json!({"action": "draw_card"})).await?;
    let drew = reply["drew"].as_u64().unwrap_or(0);
    tracing::info!(seat = seat.name, drew, "drew");
    Ok(())
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), DeckhandError> {
    deckhand::init_tracing();

    let mut rooms = RoomManager::new(deckhand::default_factory()?);
    let mut seats: HashMap<PlayerId, Seat> = HashMap::new();
    let mut room = None;

    for (i, name) in SEATS.into_iter().enumerate() {
        let id = PlayerId(i as u64 + 1);
        let (tx, inbox) = mpsc::unbounded_channel();
        let record = PlayerRecord::new(id, name);
        match room {
            None => room = Some(rooms.create_room(record, "demo", deckhand::UNO, tx).await?),
            Some(r) => rooms.join_room(record, r, tx).await?,
        }
        seats.insert(id, Seat { id, name, inbox, hand: Vec::new() });
    }
    let Some(room) = room else {
        return Ok(());
    };

    rooms.start_game(PlayerId(1)).await?;

    for _ in 0..MAX_MOVES {
        for seat in seats.values_mut() {
            seat.read_inbox()?;
        }
        let state = decode(&rooms.public_state(room).await?)?;
        if state["game_ended"] == true {
            let winner = state["winner"].as_u64();
            tracing::info!(?winner, "game over");
            break;
        }

        // Nobody at this table ever doubts a wild draw four.
        if let Some(challenge) = state["challenge"].as_object() {
            if let Some(target) = challenge["target_player"].as_u64() {
                act(&rooms, PlayerId(target), json!({"action": "accept_wild4"})).await?;
            }
            continue;
        }

        let Some(current) = state["current_player"].as_u64().map(PlayerId) else {
            break;
        };
        if let Some(seat) = seats.get(&current) {
            take_turn(&rooms, seat).await?;
        }
    }

    let info = rooms.get_room_info(room).await?;
    tracing::info!(room_id = %room, state = %info.state, "table closed");
    rooms.destroy_room(room).await?;
    Ok(())
}
