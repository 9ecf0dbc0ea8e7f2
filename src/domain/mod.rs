//! Core domain types: connection identity, room errors, leave reasons.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Server-assigned identity for one active client link.
///
/// Stable for the lifetime of the link, opaque to clients except where it
/// appears as `senderId` on room chat messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh connection id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors reported to the originating connection for room operations.
///
/// Never fatal to the server; the display string is what clients receive in
/// `create_room_fail` / `join_room_fail` events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("room already exists")]
    RoomAlreadyExists,
    #[error("room not found")]
    RoomNotFound,
    #[error("wrong password")]
    WrongPassword,
    #[error("nickname not set")]
    NoNickname,
}

/// Why a connection left a room. Informational only: it feeds logs and
/// decides whether the caller follows up with a lobby snapshot rebroadcast,
/// never behavior inside the leave itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    Left,
    SwitchedRoom,
    Disconnected,
}

impl fmt::Display for LeaveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LeaveReason::Left => "left",
            LeaveReason::SwitchedRoom => "switched room",
            LeaveReason::Disconnected => "disconnected",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_is_unique() {
        // テスト項目: 生成された ConnectionId が重複しない
        // given (前提条件):

        // when (操作):
        let id1 = ConnectionId::generate();
        let id2 = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_room_error_display_strings() {
        // テスト項目: エラーの表示文字列がクライアント向けの文言になっている
        // given (前提条件):

        // when / then (操作と期待する結果):
        assert_eq!(RoomError::RoomAlreadyExists.to_string(), "room already exists");
        assert_eq!(RoomError::RoomNotFound.to_string(), "room not found");
        assert_eq!(RoomError::WrongPassword.to_string(), "wrong password");
        assert_eq!(RoomError::NoNickname.to_string(), "nickname not set");
    }

    #[test]
    fn test_leave_reason_display_strings() {
        // テスト項目: 退室理由の表示文字列が正しい
        // given (前提条件):

        // when / then (操作と期待する結果):
        assert_eq!(LeaveReason::Left.to_string(), "left");
        assert_eq!(LeaveReason::SwitchedRoom.to_string(), "switched room");
        assert_eq!(LeaveReason::Disconnected.to_string(), "disconnected");
    }
}
