//! In-room commands: broadcast a message, leave the room.

use parlor_proto::{Frame, Request, ServerCommand};
use tracing::{debug, info};

use super::{broadcast, Context, Flow};
use crate::error::CommandError;
use crate::state::{LeaveOutcome, RoomId, RoomRegistry, SessionDirectory, SessionId, SessionState};

/// Broadcast a chat message to the other members of the room.
///
/// The sender gets no echo; structural validation has already rejected
/// empty/whitespace-only content.
pub fn send(ctx: &mut Context<'_>, room: RoomId, request: &Request) -> Result<Flow, CommandError> {
    let username = ctx.username.as_deref().unwrap_or("*");
    let frame = Frame::server(
        ServerCommand::RoomMessage,
        format!("{username}: {}", request.content),
    );

    let peers = ctx.rooms.peers(room, ctx.session);
    let delivered = broadcast(ctx.directory, &peers, &frame);
    crate::metrics::message_sent();
    debug!(session = %ctx.session, room, delivered, "message broadcast");
    Ok(Flow::Continue)
}

/// Leave the current room and return to the lobby.
pub fn leave(ctx: &mut Context<'_>, room: RoomId) -> Result<Flow, CommandError> {
    let username = ctx.username.as_deref().unwrap_or("*").to_string();
    depart(ctx.rooms, ctx.directory, room, ctx.session, &username);

    *ctx.state = SessionState::Lobby;
    info!(session = %ctx.session, room, "left room");
    ctx.replies
        .push(Frame::server(ServerCommand::RoomLeaveOk, "You have left the room"));
    Ok(Flow::Continue)
}

/// Remove a session from a room and announce the departure to the remaining
/// members. Shared by `LEAVE_ROOM` and disconnect teardown (which sends no
/// reply to the closing socket).
pub(crate) fn depart(
    rooms: &RoomRegistry,
    directory: &SessionDirectory,
    room: RoomId,
    session: SessionId,
    username: &str,
) -> LeaveOutcome {
    let outcome = rooms.leave(room, session);
    if outcome.removed && !outcome.peers.is_empty() {
        let note = Frame::server(ServerCommand::RoomMessage, format!("{username} left the room"));
        broadcast(directory, &outcome.peers, &note);
    }
    if outcome.room_deleted {
        crate::metrics::room_closed();
        info!(room, "room empty, deleted");
    }
    outcome
}
