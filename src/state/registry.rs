//! The room registry: a bounded arena of rooms shared by all workers.
//!
//! All mutation happens under one mutex, held only for the table update and
//! never across socket I/O. Fan-out callers get a snapshot of member ids and
//! deliver frames after the lock is released.

use parking_lot::Mutex;
use parlor_proto::limits::MAX_ROOM_NAME_LEN;

use super::room::Room;
use super::session::SessionId;
use crate::error::CommandError;

/// Room identifier: the room's slot index in the arena. Recycled when the
/// room is deleted, so ids stay within `0..max_rooms`.
pub type RoomId = usize;

/// One row of a room-list snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub members: usize,
}

/// Result of a successful join: what the caller needs for replies and
/// fan-out without touching the table again.
#[derive(Debug, PartialEq)]
pub struct JoinOutcome {
    pub room_name: String,
    /// The other members at join time, in join order.
    pub peers: Vec<SessionId>,
}

/// Result of a leave (or disconnect removal).
#[derive(Debug)]
pub struct LeaveOutcome {
    /// Whether the session was actually a member.
    pub removed: bool,
    /// Remaining members, in join order.
    pub peers: Vec<SessionId>,
    /// Whether the room became empty and its id was recycled.
    pub room_deleted: bool,
}

/// Process-wide room table.
pub struct RoomRegistry {
    /// Arena indexed by `RoomId`; `None` slots are free for reuse.
    table: Mutex<Vec<Option<Room>>>,
    room_capacity: usize,
}

impl RoomRegistry {
    pub fn new(max_rooms: usize, room_capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(max_rooms);
        slots.resize_with(max_rooms, || None);
        Self {
            table: Mutex::new(slots),
            room_capacity,
        }
    }

    /// Create a room with `creator` as its first member and return the new
    /// room's id (the lowest free slot).
    ///
    /// The name must already be trimmed. Fails when the name length is
    /// outside `1..=24`, the name collides with an active room, or the table
    /// is full.
    pub fn create(&self, name: &str, creator: SessionId) -> Result<RoomId, CommandError> {
        if name.is_empty() || name.len() > MAX_ROOM_NAME_LEN {
            return Err(CommandError::RoomNameInvalid(name.len()));
        }

        let mut table = self.table.lock();
        if table
            .iter()
            .flatten()
            .any(|room| room.name() == name)
        {
            return Err(CommandError::RoomNameExists(name.to_string()));
        }
        let slot = table
            .iter()
            .position(Option::is_none)
            .ok_or(CommandError::RoomTableFull)?;
        table[slot] = Some(Room::new(name.to_string(), creator));
        Ok(slot)
    }

    /// Add `session` to the room. The capacity check and the insert happen
    /// under the same lock acquisition, so concurrent joins cannot overfill
    /// a room.
    pub fn join(&self, id: RoomId, session: SessionId) -> Result<JoinOutcome, CommandError> {
        let mut table = self.table.lock();
        let room = table
            .get_mut(id)
            .and_then(|slot| slot.as_mut())
            .ok_or(CommandError::RoomNotFound)?;
        if room.member_count() >= self.room_capacity {
            return Err(CommandError::RoomFull(id));
        }
        let peers = room.members().to_vec();
        room.add_member(session);
        Ok(JoinOutcome {
            room_name: room.name().to_string(),
            peers,
        })
    }

    /// Remove `session` from the room. Deleting the last member frees the
    /// room's id for reuse by a later `create`. Unknown rooms and
    /// non-members are a no-op (`removed == false`), so disconnect paths can
    /// call this unconditionally.
    pub fn leave(&self, id: RoomId, session: SessionId) -> LeaveOutcome {
        let mut table = self.table.lock();
        let Some(room) = table.get_mut(id).and_then(|slot| slot.as_mut()) else {
            return LeaveOutcome {
                removed: false,
                peers: Vec::new(),
                room_deleted: false,
            };
        };
        let removed = room.remove_member(session);
        let peers = room.members().to_vec();
        let room_deleted = removed && room.is_empty();
        if room_deleted {
            table[id] = None;
        }
        LeaveOutcome {
            removed,
            peers,
            room_deleted,
        }
    }

    /// The other members of a room, for message fan-out. Empty when the room
    /// is gone (a benign race with the last leave).
    pub fn peers(&self, id: RoomId, exclude: SessionId) -> Vec<SessionId> {
        let table = self.table.lock();
        table
            .get(id)
            .and_then(|slot| slot.as_ref())
            .map(|room| room.members_except(exclude))
            .unwrap_or_default()
    }

    /// Ordered snapshot of active rooms (ascending id). Two calls without an
    /// intervening mutation return identical snapshots.
    pub fn list(&self) -> Vec<RoomSummary> {
        let table = self.table.lock();
        table
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| {
                slot.as_ref().map(|room| RoomSummary {
                    id,
                    name: room.name().to_string(),
                    members: room.member_count(),
                })
            })
            .collect()
    }

    /// Number of active rooms.
    pub fn room_count(&self) -> usize {
        self.table.lock().iter().flatten().count()
    }

    /// Configured per-room member cap.
    pub fn room_capacity(&self) -> usize {
        self.room_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::session::SessionIdGenerator;

    fn registry() -> (RoomRegistry, SessionIdGenerator) {
        (RoomRegistry::new(50, 40), SessionIdGenerator::new())
    }

    #[test]
    fn create_allocates_lowest_free_id() {
        let (registry, ids) = registry();
        assert_eq!(registry.create("one", ids.next()).unwrap(), 0);
        assert_eq!(registry.create("two", ids.next()).unwrap(), 1);
        assert_eq!(registry.create("three", ids.next()).unwrap(), 2);
    }

    #[test]
    fn create_validates_name_length() {
        let (registry, ids) = registry();
        assert_eq!(
            registry.create("", ids.next()),
            Err(CommandError::RoomNameInvalid(0))
        );
        let long = "x".repeat(MAX_ROOM_NAME_LEN + 1);
        assert!(matches!(
            registry.create(&long, ids.next()),
            Err(CommandError::RoomNameInvalid(_))
        ));
        // 24 bytes exactly is fine.
        let max = "x".repeat(MAX_ROOM_NAME_LEN);
        assert!(registry.create(&max, ids.next()).is_ok());
    }

    #[test]
    fn create_rejects_duplicate_names() {
        let (registry, ids) = registry();
        registry.create("den", ids.next()).unwrap();
        assert!(matches!(
            registry.create("den", ids.next()),
            Err(CommandError::RoomNameExists(_))
        ));
    }

    #[test]
    fn create_fails_when_table_full() {
        let ids = SessionIdGenerator::new();
        let registry = RoomRegistry::new(2, 40);
        registry.create("a", ids.next()).unwrap();
        registry.create("b", ids.next()).unwrap();
        assert_eq!(
            registry.create("c", ids.next()),
            Err(CommandError::RoomTableFull)
        );
    }

    #[test]
    fn join_enforces_member_capacity() {
        let ids = SessionIdGenerator::new();
        let registry = RoomRegistry::new(50, 3);
        let room = registry.create("den", ids.next()).unwrap();
        registry.join(room, ids.next()).unwrap();
        registry.join(room, ids.next()).unwrap();
        assert_eq!(
            registry.join(room, ids.next()),
            Err(CommandError::RoomFull(room))
        );
    }

    #[test]
    fn join_reports_missing_rooms() {
        let (registry, ids) = registry();
        assert_eq!(registry.join(7, ids.next()), Err(CommandError::RoomNotFound));
        // Out of arena range entirely.
        assert_eq!(registry.join(999, ids.next()), Err(CommandError::RoomNotFound));
    }

    #[test]
    fn join_returns_existing_members_as_peers() {
        let (registry, ids) = registry();
        let creator = ids.next();
        let joiner = ids.next();
        let room = registry.create("den", creator).unwrap();
        let outcome = registry.join(room, joiner).unwrap();
        assert_eq!(outcome.room_name, "den");
        assert_eq!(outcome.peers, vec![creator]);
    }

    #[test]
    fn last_leave_deletes_room_and_recycles_id() {
        let (registry, ids) = registry();
        let creator = ids.next();
        let room = registry.create("den", creator).unwrap();
        assert_eq!(room, 0);

        let outcome = registry.leave(room, creator);
        assert!(outcome.removed);
        assert!(outcome.room_deleted);
        assert_eq!(registry.room_count(), 0);

        // The freed id is the lowest slot again.
        assert_eq!(registry.create("second", ids.next()).unwrap(), 0);
    }

    #[test]
    fn leave_keeps_room_while_members_remain() {
        let (registry, ids) = registry();
        let creator = ids.next();
        let joiner = ids.next();
        let room = registry.create("den", creator).unwrap();
        registry.join(room, joiner).unwrap();

        let outcome = registry.leave(room, creator);
        assert!(outcome.removed);
        assert!(!outcome.room_deleted);
        assert_eq!(outcome.peers, vec![joiner]);
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn leave_is_a_noop_for_non_members() {
        let (registry, ids) = registry();
        let room = registry.create("den", ids.next()).unwrap();
        let outcome = registry.leave(room, ids.next());
        assert!(!outcome.removed);
        assert!(!outcome.room_deleted);
        let outcome = registry.leave(42, ids.next());
        assert!(!outcome.removed);
    }

    #[test]
    fn freed_id_is_lowest_available() {
        let (registry, ids) = registry();
        let a = ids.next();
        let b = ids.next();
        let r0 = registry.create("zero", a).unwrap();
        let _r1 = registry.create("one", ids.next()).unwrap();
        let r2 = registry.create("two", b).unwrap();
        assert_eq!((r0, r2), (0, 2));

        registry.leave(r0, a);
        assert_eq!(registry.create("recycled", ids.next()).unwrap(), 0);
    }

    #[test]
    fn list_is_ordered_and_idempotent() {
        let (registry, ids) = registry();
        registry.create("alpha", ids.next()).unwrap();
        registry.create("beta", ids.next()).unwrap();

        let first = registry.list();
        let second = registry.list();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, 0);
        assert_eq!(first[0].name, "alpha");
        assert_eq!(first[0].members, 1);
        assert_eq!(first[1].id, 1);
    }

    #[test]
    fn peers_excludes_the_sender() {
        let (registry, ids) = registry();
        let creator = ids.next();
        let joiner = ids.next();
        let room = registry.create("den", creator).unwrap();
        registry.join(room, joiner).unwrap();
        assert_eq!(registry.peers(room, creator), vec![joiner]);
        assert_eq!(registry.peers(room, joiner), vec![creator]);
        assert!(registry.peers(9, creator).is_empty());
    }
}
