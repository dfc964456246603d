//! Command byte tables for both directions of the wire protocol.

/// Commands a client may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClientCommand {
    /// Close the connection cleanly. Valid in every state.
    Exit = 0x01,
    /// Submit a username while awaiting one.
    SubmitUsername = 0x02,
    /// Create a room and join it as first member.
    CreateRoom = 0x03,
    /// Request the current room listing.
    ListRooms = 0x04,
    /// Join an existing room by id.
    JoinRoom = 0x05,
    /// Leave the current room and return to the lobby.
    LeaveRoom = 0x06,
    /// Broadcast a message to the current room.
    SendMessage = 0x07,
}

impl ClientCommand {
    /// Map a wire byte to a command, if it is one.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Exit),
            0x02 => Some(Self::SubmitUsername),
            0x03 => Some(Self::CreateRoom),
            0x04 => Some(Self::ListRooms),
            0x05 => Some(Self::JoinRoom),
            0x06 => Some(Self::LeaveRoom),
            0x07 => Some(Self::SendMessage),
            _ => None,
        }
    }

    /// The wire byte for this command.
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Stable lowercase name, used for log fields and metric labels.
    pub fn name(self) -> &'static str {
        match self {
            Self::Exit => "exit",
            Self::SubmitUsername => "submit_username",
            Self::CreateRoom => "create_room",
            Self::ListRooms => "list_rooms",
            Self::JoinRoom => "join_room",
            Self::LeaveRoom => "leave_room",
            Self::SendMessage => "send_message",
        }
    }
}

/// Frames the server sends on success paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServerCommand {
    /// Greeting sent once per connection; prompts for a username.
    Welcome = 0x16,
    /// Reserved: room-entry confirmation. Entry notifications are currently
    /// delivered to the other members as `RoomMessage` frames.
    RoomNotifyJoined = 0x17,
    /// Room created; creator is now its first member.
    RoomCreateOk = 0x18,
    /// Room listing snapshot.
    RoomList = 0x1a,
    /// Join confirmed.
    RoomJoinOk = 0x1b,
    /// A message broadcast inside a room.
    RoomMessage = 0x1c,
    /// Leave confirmed; sender is back in the lobby.
    RoomLeaveOk = 0x1d,
}

impl ServerCommand {
    /// The wire byte for this command.
    pub fn byte(self) -> u8 {
        self as u8
    }
}

/// Error frames the server sends. Each rejected command yields exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    /// Reserved by the protocol; not currently emitted.
    UsernameMissing = 0x20,
    /// Reserved by the protocol; not currently emitted.
    UsernameInvalid = 0x21,
    /// Room name collides with an active room.
    RoomNameExists = 0x23,
    /// Room name length outside 1..=24.
    RoomNameInvalid = 0x24,
    /// Room membership or room table at capacity.
    RoomCapacityFull = 0x25,
    /// No active room with the requested id.
    RoomNotFound = 0x26,
    /// Reserved by the protocol; not currently emitted.
    ServerRoomFull = 0x27,
    /// Command byte is valid but not allowed in the current session state.
    InvalidStateCommand = 0x28,
    /// Frame is structurally malformed.
    InvalidFormat = 0x29,
    /// Payload is empty or whitespace-only.
    EmptyContent = 0x2a,
    /// Global session limit reached; connection is closed after this frame.
    ServerFull = 0x2b,
    /// Worker handoff failed; connection is closed after this frame.
    Connecting = 0x2c,
    /// Username longer than 32 bytes.
    UsernameLength = 0x2d,
}

impl ErrorCode {
    /// The wire byte for this error code.
    pub fn byte(self) -> u8 {
        self as u8
    }
}
