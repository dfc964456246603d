//! Networking: listener/admission (gateway), the worker pool, and the
//! per-session connection loop.

pub mod connection;
pub mod gateway;
pub mod worker;

pub use gateway::{Gateway, ServerHandle};
pub use worker::{Handoff, WorkerPool};
