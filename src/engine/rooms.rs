//! Room table: named channels with optional passwords and member lists.

use std::collections::HashMap;

use crate::domain::{ConnectionId, RoomError};

/// A named chat channel. Members are kept in join order.
pub struct Room {
    password: Option<String>,
    members: Vec<ConnectionId>,
}

impl Room {
    fn new(password: Option<String>) -> Self {
        Self {
            password,
            members: Vec::new(),
        }
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Exact-match password check. Public rooms accept anything.
    pub fn password_matches(&self, supplied: Option<&str>) -> bool {
        match &self.password {
            None => true,
            Some(expected) => supplied == Some(expected.as_str()),
        }
    }

    pub fn is_member(&self, id: &ConnectionId) -> bool {
        self.members.contains(id)
    }

    pub fn add_member(&mut self, id: ConnectionId) {
        self.members.push(id);
    }

    /// Remove a member, returning true if it was present.
    pub fn remove_member(&mut self, id: &ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != id);
        self.members.len() != before
    }

    pub fn members(&self) -> &[ConnectionId] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Maps room name to room state. A room with no members must not exist here;
/// the lifecycle operations delete it synchronously when the last member
/// leaves.
#[derive(Default)]
pub struct RoomTable {
    rooms: HashMap<String, Room>,
}

impl RoomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room with no members. An empty-string password is normalized
    /// to none, so such rooms are public.
    pub fn create(&mut self, name: &str, password: Option<String>) -> Result<(), RoomError> {
        if self.rooms.contains_key(name) {
            return Err(RoomError::RoomAlreadyExists);
        }
        let password = password.filter(|p| !p.is_empty());
        self.rooms.insert(name.to_string(), Room::new(password));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Room> {
        self.rooms.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Room> {
        self.rooms.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rooms.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Room> {
        self.rooms.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Room)> {
        self.rooms.iter()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
