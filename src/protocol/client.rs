//! Client-to-server events.

use serde::Deserialize;

/// Inbound event envelope, tagged by `event` with the payload under `data`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Set (or overwrite) the nickname for this connection.
    SetUsername(String),
    /// Create a room and immediately join it.
    CreateRoom(RoomRequest),
    /// Join an existing room.
    JoinRoom(RoomRequest),
    /// Leave a room by name.
    LeaveRoom(String),
    /// Send a chat message to a room the sender is a member of.
    SendMessage(RoomMessagePayload),
    /// Send a chat message to every connected client.
    SendGlobalMessage(GlobalMessagePayload),
    /// Request the member snapshot of a room the requester is a member of.
    RequestRoomUsers(String),
}

/// Payload for `create_room` and `join_room`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    pub room_name: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// Payload for `send_message`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessagePayload {
    pub room_name: String,
    pub username: String,
    pub message: String,
}

/// Payload for `send_global_message`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalMessagePayload {
    pub username: String,
    pub message: String,
}
