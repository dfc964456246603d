//! Shared server state.
//!
//! Workers share exactly three structures: the room registry (mutex-guarded
//! table), the session directory (concurrent map of outbound queues), and
//! the admission counters (atomics). Everything else is owned by a single
//! worker task.

pub mod admission;
pub mod registry;
pub mod room;
pub mod session;

pub use admission::{AdmissionController, AdmissionPermit, WorkerSlot};
pub use registry::{JoinOutcome, LeaveOutcome, RoomId, RoomRegistry, RoomSummary};
pub use room::Room;
pub use session::{SessionDirectory, SessionId, SessionIdGenerator, SessionState};

use crate::config::Config;
use std::sync::Arc;

/// The state handed by reference to every worker at construction.
pub struct ServerState {
    pub config: Arc<Config>,
    pub rooms: RoomRegistry,
    pub sessions: SessionDirectory,
    pub ids: SessionIdGenerator,
}

impl ServerState {
    pub fn new(config: Arc<Config>) -> Self {
        let rooms = RoomRegistry::new(config.limits.max_rooms, config.limits.room_capacity);
        Self {
            config,
            rooms,
            sessions: SessionDirectory::new(),
            ids: SessionIdGenerator::new(),
        }
    }
}
