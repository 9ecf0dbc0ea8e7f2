//! The chat engine: session, room, and presence management plus broadcast
//! fan-out.
//!
//! [`ChatService`] owns the connection registry and the room table and is the
//! only place that mutates them. The server wraps it in a single
//! `tokio::sync::Mutex`, so each inbound client event runs to completion
//! (mutation plus all consequent broadcasts) before the next one starts.
//! That exclusive-owner discipline is what makes a room switch observably
//! atomic even though it is implemented as leave-then-join.

mod dispatch;
pub mod presence;
pub mod registry;
pub mod rooms;

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::common::time::now_millis;
use crate::domain::{ConnectionId, LeaveReason, RoomError};
use crate::protocol::ServerEvent;
use crate::protocol::server::{
    GlobalChatMessage, GlobalMessage, RoomChatMessage, RoomDetail, RoomMessage, RoomSummary,
    SystemNotice,
};

use registry::ConnectionRegistry;
use rooms::RoomTable;

/// Coordinating service for the whole chat core.
#[derive(Default)]
pub struct ChatService {
    registry: ConnectionRegistry,
    rooms: RoomTable,
}

impl ChatService {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- connection lifecycle -----

    /// Register a new connection and send it the current public room list.
    /// Returns the server-assigned connection id.
    pub fn on_connect(&mut self, sender: mpsc::UnboundedSender<String>) -> ConnectionId {
        let id = ConnectionId::generate();
        self.registry.insert(id.clone(), sender, now_millis());
        tracing::info!("Connection '{}' registered", id);

        dispatch::unicast(
            &self.registry,
            &id,
            &ServerEvent::RoomList(presence::public_room_list(&self.rooms)),
        );
        id
    }

    /// Assign (or overwrite) the nickname. Nickname-set is defined as a
    /// lobby-entry event, so the notice goes to everyone unconditionally.
    pub fn set_username(&mut self, id: &ConnectionId, name: String) {
        if !self.registry.assign_nickname(id, name.clone()) {
            tracing::warn!("set_username for unknown connection '{}', ignoring", id);
            return;
        }
        tracing::info!("Connection '{}' set nickname '{}'", id, name);

        dispatch::broadcast_all(
            &self.registry,
            &ServerEvent::ReceiveGlobalMessage(GlobalMessage::System(SystemNotice::new(
                format!("{} entered the lobby", name),
            ))),
        );
        self.broadcast_lobby_snapshot();
    }

    /// Tear down a connection: leave its room (if any, reason
    /// "disconnected"), delete the registry entry, announce the lobby exit
    /// when it was idling there with a nickname, and always finish with a
    /// lobby snapshot rebroadcast.
    pub fn on_disconnect(&mut self, id: &ConnectionId) {
        let current_room = self.registry.get(id).and_then(|e| e.current_room.clone());
        let was_in_room = match &current_room {
            Some(room) => self.leave_room_with_reason(id, room, LeaveReason::Disconnected),
            None => false,
        };

        let entry = self.registry.remove(id);
        let nickname = match &entry {
            Some(entry) => {
                tracing::info!(
                    "Connection '{}' closed after {} ms",
                    id,
                    now_millis() - entry.connected_at
                );
                entry.nickname.clone()
            }
            None => None,
        };

        if !was_in_room {
            if let Some(nickname) = nickname {
                dispatch::broadcast_all(
                    &self.registry,
                    &ServerEvent::ReceiveGlobalMessage(GlobalMessage::System(SystemNotice::new(
                        format!("{} left the lobby", nickname),
                    ))),
                );
            }
        }

        self.broadcast_lobby_snapshot();
    }

    // ----- room lifecycle -----

    /// Create a room and immediately join the creator through the same path
    /// as `join_room`. If the auto-join fails (e.g. no nickname yet) the
    /// empty room remains; see DESIGN.md.
    pub fn create_room(
        &mut self,
        id: &ConnectionId,
        name: &str,
        password: Option<String>,
    ) -> Result<(), RoomError> {
        if let Err(e) = self.rooms.create(name, password.clone()) {
            dispatch::unicast(&self.registry, id, &ServerEvent::CreateRoomFail(e.to_string()));
            return Err(e);
        }
        tracing::info!("Room '{}' created", name);

        // The new (still empty) room is visible to everyone right away.
        self.broadcast_room_list();

        self.join_room(id, name, password.as_deref())
    }

    /// Join a room, leaving any different current room first.
    pub fn join_room(
        &mut self,
        id: &ConnectionId,
        name: &str,
        password: Option<&str>,
    ) -> Result<(), RoomError> {
        let result = self.try_join(id, name, password);
        if let Err(e) = &result {
            dispatch::unicast(&self.registry, id, &ServerEvent::JoinRoomFail(e.to_string()));
        }
        result
    }

    fn try_join(
        &mut self,
        id: &ConnectionId,
        name: &str,
        password: Option<&str>,
    ) -> Result<(), RoomError> {
        let room = self.rooms.get(name).ok_or(RoomError::RoomNotFound)?;
        if !room.password_matches(password) {
            return Err(RoomError::WrongPassword);
        }
        let nickname = self
            .registry
            .nickname_of(id)
            .ok_or(RoomError::NoNickname)?
            .to_string();

        let current_room = self.registry.get(id).and_then(|e| e.current_room.clone());
        if current_room.as_deref() == Some(name) {
            // Already a member: acknowledge again, change nothing.
            dispatch::unicast(
                &self.registry,
                id,
                &ServerEvent::JoinRoomSuccess(name.to_string()),
            );
            return Ok(());
        }

        // Single-room membership: leave the old room inside this same
        // operation, with no lobby rebroadcast from the inner leave.
        if let Some(previous) = current_room {
            self.leave_room_with_reason(id, &previous, LeaveReason::SwitchedRoom);
        }

        if let Some(room) = self.rooms.get_mut(name) {
            room.add_member(id.clone());
        }
        if let Some(entry) = self.registry.get_mut(id) {
            entry.current_room = Some(name.to_string());
        }
        tracing::info!("'{}' joined room '{}' (connection '{}')", nickname, name, id);

        dispatch::unicast(
            &self.registry,
            id,
            &ServerEvent::JoinRoomSuccess(name.to_string()),
        );
        if let Some(room) = self.rooms.get(name) {
            dispatch::broadcast_room(
                &self.registry,
                room,
                &ServerEvent::ReceiveMessage(RoomMessage::System(SystemNotice::new(format!(
                    "{} joined the room",
                    nickname
                )))),
            );
        }
        self.broadcast_room_list();
        self.broadcast_room_users(name);
        self.broadcast_lobby_snapshot();

        Ok(())
    }

    /// Explicit leave requested by the client. Returns false (a silent
    /// no-op) if the connection is not a member of that room.
    pub fn leave_room(&mut self, id: &ConnectionId, name: &str) -> bool {
        let left = self.leave_room_with_reason(id, name, LeaveReason::Left);
        if left {
            // Back to the lobby, so its membership changed.
            self.broadcast_lobby_snapshot();
        }
        left
    }

    /// Shared leave path. Removes the member, notifies the remaining
    /// members, deletes the room when it becomes empty, and rebroadcasts the
    /// public room list. Callers decide whether a lobby snapshot follows.
    fn leave_room_with_reason(
        &mut self,
        id: &ConnectionId,
        name: &str,
        reason: LeaveReason,
    ) -> bool {
        let Some(room) = self.rooms.get_mut(name) else {
            return false;
        };
        if !room.remove_member(id) {
            return false;
        }
        if let Some(entry) = self.registry.get_mut(id) {
            entry.current_room = None;
        }

        let nickname = self.registry.nickname_of(id).map(str::to_string);
        tracing::info!(
            "'{}' left room '{}' (reason: {})",
            nickname.as_deref().unwrap_or("<no nickname>"),
            name,
            reason
        );

        if let Some(nickname) = nickname {
            if let Some(room) = self.rooms.get(name) {
                dispatch::broadcast_room(
                    &self.registry,
                    room,
                    &ServerEvent::ReceiveMessage(RoomMessage::System(SystemNotice::new(
                        format!("{} left the room", nickname),
                    ))),
                );
            }
            self.broadcast_room_users(name);
        }

        if self.rooms.get(name).is_some_and(rooms::Room::is_empty) {
            self.rooms.remove(name);
            tracing::info!("Room '{}' deleted (empty)", name);
        }
        self.broadcast_room_list();

        true
    }

    // ----- messaging -----

    /// Broadcast a chat message to the room, including the sender. Silently
    /// dropped when the sender is not a member: stale client state racing a
    /// leave or disconnect is expected and not actionable.
    pub fn send_room_message(
        &self,
        id: &ConnectionId,
        room_name: &str,
        username: String,
        message: String,
    ) {
        let is_member = self
            .registry
            .get(id)
            .is_some_and(|e| e.current_room.as_deref() == Some(room_name));
        if !is_member {
            tracing::debug!(
                "Dropping message from '{}' to room '{}': not a member",
                id,
                room_name
            );
            return;
        }
        if let Some(room) = self.rooms.get(room_name) {
            dispatch::broadcast_room(
                &self.registry,
                room,
                &ServerEvent::ReceiveMessage(RoomMessage::Chat(RoomChatMessage {
                    sender_id: id.to_string(),
                    username,
                    message,
                    timestamp: now_millis(),
                })),
            );
        }
    }

    /// Broadcast a lobby chat message to everyone. The lobby has no
    /// enrollment concept, so there is no membership check.
    pub fn send_global_message(&self, username: String, message: String) {
        dispatch::broadcast_all(
            &self.registry,
            &ServerEvent::ReceiveGlobalMessage(GlobalMessage::Chat(GlobalChatMessage {
                username,
                message,
                timestamp: now_millis(),
            })),
        );
    }

    /// Unicast the room member snapshot to the requester, but only if the
    /// requester is currently a member of that room.
    pub fn request_room_users(&self, id: &ConnectionId, room_name: &str) {
        let is_member = self
            .registry
            .get(id)
            .is_some_and(|e| e.current_room.as_deref() == Some(room_name));
        if is_member {
            dispatch::unicast(
                &self.registry,
                id,
                &ServerEvent::UpdateRoomUsers(presence::room_members(
                    &self.registry,
                    &self.rooms,
                    room_name,
                )),
            );
        }
    }

    // ----- derived views -----

    pub fn public_rooms(&self) -> HashMap<String, RoomSummary> {
        presence::public_room_list(&self.rooms)
    }

    pub fn room_members(&self, name: &str) -> Vec<String> {
        presence::room_members(&self.registry, &self.rooms, name)
    }

    pub fn lobby_members(&self) -> Vec<String> {
        presence::lobby_members(&self.registry, &self.rooms)
    }

    pub fn room_detail(&self, name: &str) -> Option<RoomDetail> {
        let room = self.rooms.get(name)?;
        Some(RoomDetail {
            name: name.to_string(),
            users: presence::room_members(&self.registry, &self.rooms, name),
            user_count: room.member_count(),
            has_password: room.has_password(),
        })
    }

    pub fn current_room_of(&self, id: &ConnectionId) -> Option<String> {
        self.registry.get(id).and_then(|e| e.current_room.clone())
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    // ----- broadcast helpers -----

    fn broadcast_room_list(&self) {
        dispatch::broadcast_all(
            &self.registry,
            &ServerEvent::RoomList(presence::public_room_list(&self.rooms)),
        );
    }

    fn broadcast_room_users(&self, name: &str) {
        if let Some(room) = self.rooms.get(name) {
            dispatch::broadcast_room(
                &self.registry,
                room,
                &ServerEvent::UpdateRoomUsers(presence::room_members(
                    &self.registry,
                    &self.rooms,
                    name,
                )),
            );
        }
    }

    fn broadcast_lobby_snapshot(&self) {
        dispatch::broadcast_all(
            &self.registry,
            &ServerEvent::UpdateWaitingRoomUsers(presence::lobby_members(
                &self.registry,
                &self.rooms,
            )),
        );
    }
}
