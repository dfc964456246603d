//! Wire-level size limits.
//!
//! These bound every frame in both directions and are part of the protocol
//! contract, not server configuration.

/// Frame terminator. Frames are split on this pair only; a bare `\n` inside
/// a payload is data.
pub const TERMINATOR: &[u8] = b"\r\n";

/// Maximum username length accepted by `USERNAME_SUBMIT`, in bytes.
pub const MAX_USERNAME_LEN: usize = 32;

/// Maximum room name length accepted by `ROOM_CREATE_REQUEST`, in bytes.
pub const MAX_ROOM_NAME_LEN: usize = 24;

/// Maximum payload length of a client frame, in bytes.
pub const MAX_CONTENT_LEN: usize = 128;

/// Maximum length of a complete inbound line including command byte, space,
/// payload, and terminator: `1 + 1 + MAX_CONTENT_LEN + 2`.
pub const MAX_INBOUND_LINE: usize = 2 + MAX_CONTENT_LEN + TERMINATOR.len();

/// Maximum payload length of a server frame, in bytes. Sized to fit a full
/// room listing with formatting.
pub const MAX_OUTBOUND_CONTENT: usize = 2700;
