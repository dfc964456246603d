//! Frame types and structural validation.

use crate::command::{ClientCommand, ErrorCode, ServerCommand};
use crate::limits::MAX_CONTENT_LEN;
use thiserror::Error;

/// An outbound frame: command byte plus payload, terminator added on encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    byte: u8,
    payload: String,
}

impl Frame {
    /// Build a success frame.
    pub fn server(command: ServerCommand, payload: impl Into<String>) -> Self {
        Self {
            byte: command.byte(),
            payload: payload.into(),
        }
    }

    /// Build an error frame.
    pub fn error(code: ErrorCode, payload: impl Into<String>) -> Self {
        Self {
            byte: code.byte(),
            payload: payload.into(),
        }
    }

    /// The command byte on the wire.
    pub fn command_byte(&self) -> u8 {
        self.byte
    }

    /// The payload text.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Render the complete wire form, terminator included. The codec encoder
    /// is the hot path; this is for one-shot writes and tests.
    pub fn to_wire_string(&self) -> String {
        let mut out = String::with_capacity(self.payload.len() + 4);
        out.push(self.byte as char);
        out.push(' ');
        out.push_str(&self.payload);
        out.push_str("\r\n");
        out
    }
}

/// A structurally valid client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: ClientCommand,
    /// Raw payload, not trimmed. Guaranteed non-empty after whitespace trim
    /// and at most [`MAX_CONTENT_LEN`] bytes.
    pub content: String,
}

/// Structural frame violations, detected before any command handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Line shorter than command byte plus separator.
    #[error("frame too short")]
    TooShort,

    /// Second byte is not the space separator.
    #[error("missing space separator after command byte")]
    MissingSeparator,

    /// First byte does not map to a client command.
    #[error("unknown command byte 0x{0:02x}")]
    UnknownCommand(u8),

    /// Payload longer than [`MAX_CONTENT_LEN`] bytes.
    #[error("content exceeds {MAX_CONTENT_LEN} bytes (got {0})")]
    ContentTooLong(usize),

    /// Payload empty or whitespace-only.
    #[error("content is empty")]
    EmptyContent,
}

impl FrameError {
    /// The wire error code this violation is reported with.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyContent => ErrorCode::EmptyContent,
            _ => ErrorCode::InvalidFormat,
        }
    }
}

/// Validate one decoded line (terminator already stripped) into a [`Request`].
///
/// Checks, in order: minimum length, space separator, known command byte,
/// payload length, non-empty payload. Every command carries a payload; the
/// commands that need none (`EXIT`, `LEAVE_ROOM`, `LIST_ROOMS`) take dummy
/// content, which handlers ignore.
pub fn parse_request(line: &str) -> Result<Request, FrameError> {
    let bytes = line.as_bytes();

    if bytes.len() < 2 {
        return Err(FrameError::TooShort);
    }
    if bytes[1] != b' ' {
        return Err(FrameError::MissingSeparator);
    }
    let command = ClientCommand::from_byte(bytes[0]).ok_or(FrameError::UnknownCommand(bytes[0]))?;

    let content = &line[2..];
    if content.len() > MAX_CONTENT_LEN {
        return Err(FrameError::ContentTooLong(content.len()));
    }
    if content.trim().is_empty() {
        return Err(FrameError::EmptyContent);
    }

    Ok(Request {
        command,
        content: content.to_string(),
    })
}
