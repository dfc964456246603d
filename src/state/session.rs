//! Session identity, state machine, and the cross-worker frame directory.

use dashmap::DashMap;
use parlor_proto::Frame;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use super::registry::RoomId;

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{:06}", self.0)
    }
}

/// Allocates session ids. Ids are never reused within a process.
#[derive(Debug, Default)]
pub struct SessionIdGenerator {
    counter: AtomicU64,
}

impl SessionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    pub fn next(&self) -> SessionId {
        SessionId(self.counter.fetch_add(1, Ordering::Relaxed))
    }
}

/// Per-session protocol state.
///
/// `Connecting` exists only between acceptance and the welcome frame; the
/// event loop never dispatches a command in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    AwaitingUsername,
    Lobby,
    InRoom(RoomId),
}

impl SessionState {
    /// Stable lowercase name for logs and error replies.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::AwaitingUsername => "awaiting_username",
            Self::Lobby => "lobby",
            Self::InRoom(_) => "in_room",
        }
    }

    /// The room this session is in, if any.
    pub fn room(&self) -> Option<RoomId> {
        match self {
            Self::InRoom(id) => Some(*id),
            _ => None,
        }
    }
}

/// Process-wide directory of session outbound queues.
///
/// Room fan-out posts frames here instead of writing sockets: each queue is
/// drained by the worker that owns the session, so all socket writes happen
/// on the owning worker's loop even when the frame originated on another
/// worker.
#[derive(Debug, Default)]
pub struct SessionDirectory {
    senders: DashMap<SessionId, mpsc::UnboundedSender<Frame>>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session's outbound queue. Called by the owning worker
    /// before the welcome frame is sent.
    pub fn register(&self, id: SessionId, sender: mpsc::UnboundedSender<Frame>) {
        self.senders.insert(id, sender);
    }

    /// Remove a session at teardown.
    pub fn unregister(&self, id: SessionId) {
        self.senders.remove(&id);
    }

    /// Enqueue a frame for a session. Returns `false` when the session is
    /// gone or its queue is closed (disconnecting); such targets are skipped
    /// silently by fan-out.
    pub fn send_to(&self, id: SessionId, frame: Frame) -> bool {
        match self.senders.get(&id) {
            Some(sender) => sender.send(frame).is_ok(),
            None => false,
        }
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
