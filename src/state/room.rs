//! Room state: a named channel with bounded, ordered membership.

use super::session::SessionId;

/// A chat room. Owned by the registry; never shared by reference with
/// sessions (they hold the room id instead).
#[derive(Debug)]
pub struct Room {
    name: String,
    /// Members in join order.
    members: Vec<SessionId>,
}

impl Room {
    /// Create a room with its first member.
    pub fn new(name: String, creator: SessionId) -> Self {
        Self {
            name,
            members: vec![creator],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether the session is a member.
    pub fn contains(&self, id: SessionId) -> bool {
        self.members.contains(&id)
    }

    /// Members in join order.
    pub fn members(&self) -> &[SessionId] {
        &self.members
    }

    /// Members except `exclude`, in join order. Fan-out target list.
    pub fn members_except(&self, exclude: SessionId) -> Vec<SessionId> {
        self.members.iter().copied().filter(|m| *m != exclude).collect()
    }

    /// Append a member. The registry checks capacity before calling.
    pub fn add_member(&mut self, id: SessionId) {
        debug_assert!(!self.contains(id), "session joined the same room twice");
        self.members.push(id);
    }

    /// Remove a member. Returns `true` if it was present.
    pub fn remove_member(&mut self, id: SessionId) -> bool {
        match self.members.iter().position(|m| *m == id) {
            Some(index) => {
                self.members.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
