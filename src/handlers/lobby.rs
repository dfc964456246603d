//! Lobby commands: create a room, join a room, list rooms.

use parlor_proto::{Frame, Request, ServerCommand};
use tracing::info;

use super::{broadcast, Context, Flow};
use crate::error::CommandError;
use crate::state::{RoomId, RoomRegistry, SessionState};

/// Create a room and enter it as first member.
pub fn create(ctx: &mut Context<'_>, request: &Request) -> Result<Flow, CommandError> {
    let name = request.content.trim();
    let room = ctx.rooms.create(name, ctx.session)?;

    *ctx.state = SessionState::InRoom(room);
    crate::metrics::room_opened();
    info!(session = %ctx.session, room, name = %name, "room created");

    ctx.replies.push(Frame::server(
        ServerCommand::RoomCreateOk,
        format!("Room created successfully: {name}"),
    ));
    Ok(Flow::Continue)
}

/// Join an existing room by id.
pub fn join(ctx: &mut Context<'_>, request: &Request) -> Result<Flow, CommandError> {
    let room = parse_room_id(request.content.trim())?;
    let outcome = ctx.rooms.join(room, ctx.session)?;

    *ctx.state = SessionState::InRoom(room);
    let username = ctx.username.as_deref().unwrap_or("*");
    info!(session = %ctx.session, room, name = %outcome.room_name, "joined room");

    let note = Frame::server(
        ServerCommand::RoomMessage,
        format!("{username} has entered the room"),
    );
    broadcast(ctx.directory, &outcome.peers, &note);

    ctx.replies
        .push(Frame::server(ServerCommand::RoomJoinOk, "Successfully joined room"));
    Ok(Flow::Continue)
}

/// Send the current room listing.
pub fn list(ctx: &mut Context<'_>) -> Result<Flow, CommandError> {
    ctx.replies.push(room_list_frame(ctx.rooms));
    Ok(Flow::Continue)
}

/// Render the room-list frame: an ordered snapshot of active rooms, or the
/// empty-lobby hint.
pub(crate) fn room_list_frame(rooms: &RoomRegistry) -> Frame {
    use std::fmt::Write;

    let summaries = rooms.list();
    let mut text = String::from("=== Available Chat Rooms ===\n\n");
    if summaries.is_empty() {
        text.push_str(
            "No chat rooms available!\nUse the create room command to start your own chat room.\n",
        );
    } else {
        let capacity = rooms.room_capacity();
        for summary in &summaries {
            let _ = writeln!(
                text,
                "Room {}: {} ({}/{})",
                summary.id, summary.name, summary.members, capacity
            );
        }
    }
    Frame::server(ServerCommand::RoomList, text)
}

/// Parse the payload of a join request as a room number.
///
/// The wire format allows at most two digits; anything else is rejected
/// before the registry is consulted.
fn parse_room_id(content: &str) -> Result<RoomId, CommandError> {
    if content.is_empty() || content.len() > 2 || !content.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CommandError::RoomIdInvalid);
    }
    content.parse().map_err(|_| CommandError::RoomIdInvalid)
}
