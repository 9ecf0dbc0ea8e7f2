//! Presence calculation: derived views over the registry and room table.
//!
//! These are pure functions recomputed on demand for every broadcast, never
//! separately maintained caches, so they cannot drift from the canonical
//! maps.

use std::collections::{HashMap, HashSet};

use crate::domain::ConnectionId;
use crate::protocol::server::RoomSummary;

use super::registry::ConnectionRegistry;
use super::rooms::RoomTable;

/// Public room list: room name to member count and has-password flag.
pub fn public_room_list(rooms: &RoomTable) -> HashMap<String, RoomSummary> {
    rooms
        .iter()
        .map(|(name, room)| {
            (
                name.clone(),
                RoomSummary {
                    user_count: room.member_count(),
                    has_password: room.has_password(),
                },
            )
        })
        .collect()
}

/// Nicknames of a room's members, in join order. Members with no resolvable
/// nickname are silently skipped; a partially registered connection must not
/// fail the whole snapshot.
pub fn room_members(registry: &ConnectionRegistry, rooms: &RoomTable, name: &str) -> Vec<String> {
    let Some(room) = rooms.get(name) else {
        return Vec::new();
    };
    room.members()
        .iter()
        .filter_map(|id| registry.nickname_of(id).map(str::to_string))
        .collect()
}

/// Nicknames of connections that have a nickname and are in no room,
/// computed as (all nicknamed connections) minus (union of all rooms'
/// members). Sorted for deterministic output.
pub fn lobby_members(registry: &ConnectionRegistry, rooms: &RoomTable) -> Vec<String> {
    let in_rooms: HashSet<&ConnectionId> = rooms
        .iter()
        .flat_map(|(_, room)| room.members().iter())
        .collect();

    let mut names: Vec<String> = registry
        .iter()
        .filter(|(id, _)| !in_rooms.contains(id))
        .filter_map(|(_, entry)| entry.nickname.clone())
        .collect();

    // Sort by nickname for consistent ordering
    names.sort();
    names
}
