//! Unified error handling for parlord.
//!
//! Every rejected client command maps to exactly one error frame on the
//! wire. [`CommandError`] is the full taxonomy (capacity, validation,
//! protocol, not-found), with metric labels and frame rendering in one
//! place.

use parlor_proto::{ErrorCode, Frame, FrameError};
use thiserror::Error;

/// Reply text shared by the structural-format error frames.
const FORMAT_HINT: &str = "Correct format: [command char][space][message content][MSG_TERMINATOR]";

/// Errors produced while handling a client command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    // ------------------------------------------------------------------
    // Capacity
    // ------------------------------------------------------------------
    /// Global session limit reached; connection closes after the frame.
    #[error("server at session capacity")]
    ServerFull,

    /// Worker handoff failed; connection closes after the frame.
    #[error("no worker available for handoff")]
    WorkerUnavailable,

    /// The room table already holds the maximum number of rooms.
    #[error("room table full")]
    RoomTableFull,

    /// The target room is at member capacity.
    #[error("room {0} is full")]
    RoomFull(usize),

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------
    /// Username longer than the protocol limit.
    #[error("username too long: {0} bytes")]
    UsernameTooLong(usize),

    /// Room name length outside 1..=24.
    #[error("room name length invalid: {0} bytes")]
    RoomNameInvalid(usize),

    /// Room name collides with an active room.
    #[error("room name already exists: {0}")]
    RoomNameExists(String),

    // ------------------------------------------------------------------
    // Protocol
    // ------------------------------------------------------------------
    /// Command byte is valid but not allowed in the current session state.
    /// Carries the state name from `SessionState::name`.
    #[error("command not valid in {state} state")]
    InvalidStateCommand { state: &'static str },

    /// Structurally malformed frame.
    #[error(transparent)]
    Malformed(#[from] FrameError),

    // ------------------------------------------------------------------
    // Not found
    // ------------------------------------------------------------------
    /// No active room with the requested id.
    #[error("room not found")]
    RoomNotFound,

    /// Room id did not parse as a room number.
    #[error("room id unparsable")]
    RoomIdInvalid,
}

impl CommandError {
    /// Static label for metrics and log fields.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServerFull => "server_full",
            Self::WorkerUnavailable => "worker_unavailable",
            Self::RoomTableFull => "room_table_full",
            Self::RoomFull(_) => "room_full",
            Self::UsernameTooLong(_) => "username_too_long",
            Self::RoomNameInvalid(_) => "room_name_invalid",
            Self::RoomNameExists(_) => "room_name_exists",
            Self::InvalidStateCommand { .. } => "invalid_state",
            Self::Malformed(FrameError::EmptyContent) => "empty_content",
            Self::Malformed(_) => "invalid_format",
            Self::RoomNotFound => "room_not_found",
            Self::RoomIdInvalid => "room_id_invalid",
        }
    }

    /// The wire error code of the frame this error is reported with.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ServerFull => ErrorCode::ServerFull,
            Self::WorkerUnavailable => ErrorCode::Connecting,
            Self::RoomTableFull | Self::RoomFull(_) => ErrorCode::RoomCapacityFull,
            Self::UsernameTooLong(_) => ErrorCode::UsernameLength,
            Self::RoomNameInvalid(_) => ErrorCode::RoomNameInvalid,
            Self::RoomNameExists(_) => ErrorCode::RoomNameExists,
            Self::InvalidStateCommand { .. } => ErrorCode::InvalidStateCommand,
            Self::Malformed(e) => e.error_code(),
            Self::RoomNotFound | Self::RoomIdInvalid => ErrorCode::RoomNotFound,
        }
    }

    /// Whether this error counts toward the protocol-violation strike limit.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self.code(), ErrorCode::InvalidFormat)
    }

    /// Render the single error frame reported to the requester.
    pub fn to_frame(&self) -> Frame {
        let text = match self {
            Self::ServerFull => {
                "Sorry, the server is currently at full capacity. Please try again later!"
                    .to_string()
            }
            Self::WorkerUnavailable => {
                "Sorry, there was an error connecting to the server. Please try again!".to_string()
            }
            Self::RoomTableFull => {
                "Room creation failed: Maximum number of rooms reached".to_string()
            }
            Self::RoomFull(_) => "Cannot join room: Room is full".to_string(),
            Self::UsernameTooLong(_) => "User name too long, must be less than 32".to_string(),
            Self::RoomNameInvalid(_) => "Room creation failed: Room name length invalid".to_string(),
            Self::RoomNameExists(_) => "Room creation failed: Room name already exists".to_string(),
            Self::InvalidStateCommand { state } => match *state {
                "awaiting_username" => {
                    "CMD not correct for client in awaiting username state".to_string()
                }
                "lobby" => "Invalid command for lobby state".to_string(),
                "in_room" => "Invalid command for in chat room state".to_string(),
                _ => "Invalid command for current connection state".to_string(),
            },
            Self::Malformed(e) => match e {
                FrameError::TooShort => format!("Message too short\n{FORMAT_HINT}"),
                FrameError::MissingSeparator => format!("Missing space after command.\n{FORMAT_HINT}"),
                FrameError::UnknownCommand(_) => format!("Command not found\n{FORMAT_HINT}"),
                FrameError::ContentTooLong(_) => {
                    format!("Invalid format: Message too long\n{FORMAT_HINT}")
                }
                FrameError::EmptyContent => format!("Content is Empty\n{FORMAT_HINT}"),
            },
            Self::RoomNotFound => "Room does not exist".to_string(),
            Self::RoomIdInvalid => {
                "Invalid room number format. Must be a number between 0-99".to_string()
            }
        };
        Frame::error(self.code(), text)
    }
}
