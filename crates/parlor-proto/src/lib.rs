//! Wire protocol for the parlord chat server.
//!
//! A frame is a single command byte, one space, an opaque text payload, and
//! the two-byte `\r\n` terminator:
//!
//! ```text
//! <command-byte> <payload>\r\n
//! ```
//!
//! Payloads never contain the terminator, but may contain bare `\n` bytes
//! (multi-line server notices rely on this), so framing splits on the full
//! `\r\n` pair and nothing else. Several frames may share one TCP segment and
//! a frame may span several segments; [`codec::FrameCodec`] handles both.
//!
//! The crate is transport-agnostic by default; the `tokio` feature (on by
//! default) adds the [`codec`] module with a `tokio_util` codec.

pub mod command;
pub mod error;
pub mod frame;
pub mod limits;

#[cfg(feature = "tokio")]
pub mod codec;

pub use command::{ClientCommand, ErrorCode, ServerCommand};
pub use error::ProtocolError;
pub use frame::{parse_request, Frame, FrameError, Request};

#[cfg(feature = "tokio")]
pub use codec::{Decoded, FrameCodec};
