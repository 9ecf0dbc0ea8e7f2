//! Connection registry: one entry per live client link.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::domain::ConnectionId;

/// State attached to one live connection.
pub struct ConnectionEntry {
    /// Display name; `None` until the client sets one. Overwritable, and not
    /// deduplicated: two connections may carry the same nickname.
    pub nickname: Option<String>,
    /// Name of the room this connection is a member of, `None` = lobby.
    pub current_room: Option<String>,
    /// Outbound message channel for this connection.
    pub sender: mpsc::UnboundedSender<String>,
    /// Unix timestamp (UTC, milliseconds) when the connection was registered.
    pub connected_at: i64,
}

/// Maps each live connection to its entry. All mutation funnels through the
/// lifecycle operations of [`crate::engine::ChatService`].
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection with no nickname and no room.
    pub fn insert(&mut self, id: ConnectionId, sender: mpsc::UnboundedSender<String>, connected_at: i64) {
        self.entries.insert(
            id,
            ConnectionEntry {
                nickname: None,
                current_room: None,
                sender,
                connected_at,
            },
        );
    }

    /// Delete the entry, returning it if it existed.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<ConnectionEntry> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&ConnectionEntry> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &ConnectionId) -> Option<&mut ConnectionEntry> {
        self.entries.get_mut(id)
    }

    /// Set the nickname unconditionally, overwriting any previous value.
    /// Returns false if the connection is not registered.
    pub fn assign_nickname(&mut self, id: &ConnectionId, name: String) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.nickname = Some(name);
                true
            }
            None => false,
        }
    }

    /// Current nickname of a connection, if registered and set.
    pub fn nickname_of(&self, id: &ConnectionId) -> Option<&str> {
        self.entries.get(id).and_then(|e| e.nickname.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConnectionId, &ConnectionEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
