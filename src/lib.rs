//! parlord - Parlor Daemon.
//!
//! A multi-room TCP chat server built on a small fixed pool of
//! single-threaded event loops. The gateway admits connections against a
//! global session cap and assigns each to the least-loaded worker; the
//! worker owns the session's socket for its whole life. Rooms live in a
//! shared registry behind one lock; cross-worker message fan-out goes
//! through per-session outbound queues so only the owning worker ever
//! writes a socket.
//!
//! The wire protocol (command bytes, framing, limits) lives in the
//! `parlor-proto` crate.

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod metrics;
pub mod network;
pub mod state;

pub use config::Config;
pub use error::CommandError;
pub use network::{Gateway, ServerHandle};
