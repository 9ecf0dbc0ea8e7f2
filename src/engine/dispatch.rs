//! Broadcast dispatch: fire-and-forget delivery of serialized events.
//!
//! Delivery never awaits acknowledgment and never retries. A send failure
//! means the receiving task is gone, which is indistinguishable from a
//! racing disconnect and is tolerated; it is logged at warn level only.

use crate::domain::ConnectionId;
use crate::protocol::ServerEvent;

use super::registry::ConnectionRegistry;
use super::rooms::Room;

fn encode(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("Failed to serialize server event: {}", e);
            None
        }
    }
}

/// Deliver an event to a single connection.
pub fn unicast(registry: &ConnectionRegistry, id: &ConnectionId, event: &ServerEvent) {
    let Some(json) = encode(event) else { return };
    match registry.get(id) {
        Some(entry) => {
            if entry.sender.send(json).is_err() {
                tracing::warn!("Failed to send event to connection '{}'", id);
            }
        }
        None => {
            tracing::warn!("Connection '{}' not found for unicast, skipping", id);
        }
    }
}

/// Deliver an event to every connected client.
pub fn broadcast_all(registry: &ConnectionRegistry, event: &ServerEvent) {
    let Some(json) = encode(event) else { return };
    for (id, entry) in registry.iter() {
        if entry.sender.send(json.clone()).is_err() {
            tracing::warn!("Failed to send event to connection '{}'", id);
        }
    }
}

/// Deliver an event to the current members of one room.
pub fn broadcast_room(registry: &ConnectionRegistry, room: &Room, event: &ServerEvent) {
    let Some(json) = encode(event) else { return };
    for id in room.members() {
        match registry.get(id) {
            Some(entry) => {
                if entry.sender.send(json.clone()).is_err() {
                    tracing::warn!("Failed to send event to connection '{}'", id);
                }
            }
            None => {
                tracing::warn!("Room member '{}' not found during broadcast, skipping", id);
            }
        }
    }
}
