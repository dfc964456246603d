//! Capacity limits configuration.

use serde::Deserialize;

/// Capacity limits.
///
/// These bound the resources a running server will hold: how many sessions
/// may be connected at once, how those sessions spread across workers, and
/// how many rooms of what size may exist. Wire-level size limits are fixed
/// by the protocol and live in `parlor_proto::limits`.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum concurrently connected sessions (default: 2000). Connections
    /// beyond this are rejected with a server-full frame.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Number of worker event loops (default: 2).
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Maximum sessions one worker multiplexes (default: 1000).
    #[serde(default = "default_worker_capacity")]
    pub worker_capacity: usize,
    /// Maximum concurrently active rooms (default: 50).
    #[serde(default = "default_max_rooms")]
    pub max_rooms: usize,
    /// Maximum members per room (default: 40).
    #[serde(default = "default_room_capacity")]
    pub room_capacity: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            workers: default_workers(),
            worker_capacity: default_worker_capacity(),
            max_rooms: default_max_rooms(),
            room_capacity: default_room_capacity(),
        }
    }
}

fn default_max_sessions() -> usize {
    2000
}

fn default_workers() -> usize {
    2
}

fn default_worker_capacity() -> usize {
    1000
}

fn default_max_rooms() -> usize {
    50
}

fn default_room_capacity() -> usize {
    40
}
