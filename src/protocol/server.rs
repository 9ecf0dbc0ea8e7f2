//! Server-to-client events and HTTP response DTOs.

use std::collections::HashMap;

use serde::Serialize;

/// Marker for server-originated notices, rendered distinctly from user chat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum MessageType {
    #[serde(rename = "system")]
    System,
}

/// A chat message delivered to one room, including the sender.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomChatMessage {
    pub sender_id: String,
    pub username: String,
    pub message: String,
    pub timestamp: i64,
}

/// A chat message delivered to every connected client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalChatMessage {
    pub username: String,
    pub message: String,
    pub timestamp: i64,
}

/// A server-originated notice with no sender identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemNotice {
    pub r#type: MessageType,
    pub message: String,
}

impl SystemNotice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::System,
            message: message.into(),
        }
    }
}

/// Payload of `receive_message`: either user chat or a system notice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RoomMessage {
    Chat(RoomChatMessage),
    System(SystemNotice),
}

/// Payload of `receive_global_message`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GlobalMessage {
    Chat(GlobalChatMessage),
    System(SystemNotice),
}

/// One entry of the public room list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub user_count: usize,
    pub has_password: bool,
}

/// Outbound event envelope, tagged by `event` with the payload under `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Public room list snapshot, sent to everyone or to a new connection.
    RoomList(HashMap<String, RoomSummary>),
    /// Join acknowledgment, sent to the requester only.
    JoinRoomSuccess(String),
    /// Join failure reason, sent to the requester only.
    JoinRoomFail(String),
    /// Creation failure reason, sent to the requester only.
    CreateRoomFail(String),
    /// Chat or system message for one room's members.
    ReceiveMessage(RoomMessage),
    /// Chat or system message for every connected client.
    ReceiveGlobalMessage(GlobalMessage),
    /// Member nickname snapshot for one room.
    UpdateRoomUsers(Vec<String>),
    /// Lobby member nickname snapshot, sent to everyone.
    UpdateWaitingRoomUsers(Vec<String>),
}

/// HTTP response DTO for `GET /api/rooms/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetail {
    pub name: String,
    pub users: Vec<String>,
    pub user_count: usize,
    pub has_password: bool,
}
