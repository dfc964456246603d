//! Command handling.
//!
//! Handlers are synchronous: they mutate session state, update the room
//! registry, push reply frames into the context's buffer (flushed by the
//! connection loop in order), and enqueue fan-out frames on other sessions'
//! outbound queues. No handler performs socket I/O.

mod lobby;
mod room;
mod username;

pub(crate) use room::depart;

use parlor_proto::{ClientCommand, Frame, Request};
use tracing::debug;

use crate::error::CommandError;
use crate::state::{RoomRegistry, SessionDirectory, SessionId, SessionState};

/// What the connection loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Clean close requested (`EXIT`). No reply frame is sent.
    Disconnect,
}

/// Everything a handler may touch.
pub struct Context<'a> {
    pub session: SessionId,
    pub state: &'a mut SessionState,
    pub username: &'a mut Option<String>,
    pub rooms: &'a RoomRegistry,
    pub directory: &'a SessionDirectory,
    /// Frames to write to this session's own socket, in push order.
    pub replies: &'a mut Vec<Frame>,
}

/// Route one validated request through the session state machine.
///
/// `EXIT` is accepted in every state. Any other command outside its state
/// fails with an invalid-state error and leaves the session unchanged.
pub fn dispatch(ctx: &mut Context<'_>, request: &Request) -> Result<Flow, CommandError> {
    if request.command == ClientCommand::Exit {
        return Ok(Flow::Disconnect);
    }

    match (*ctx.state, request.command) {
        (SessionState::AwaitingUsername, ClientCommand::SubmitUsername) => {
            username::submit(ctx, request)
        }
        (SessionState::Lobby, ClientCommand::CreateRoom) => lobby::create(ctx, request),
        (SessionState::Lobby, ClientCommand::JoinRoom) => lobby::join(ctx, request),
        (SessionState::Lobby, ClientCommand::ListRooms) => lobby::list(ctx),
        (SessionState::InRoom(room), ClientCommand::SendMessage) => room::send(ctx, room, request),
        (SessionState::InRoom(room), ClientCommand::LeaveRoom) => room::leave(ctx, room),
        (state, command) => {
            debug!(session = %ctx.session, state = state.name(), command = command.name(),
                "command rejected for state");
            Err(CommandError::InvalidStateCommand { state: state.name() })
        }
    }
}

/// Enqueue a frame on every peer's outbound queue. Peers whose queue is
/// closed (disconnecting) are skipped silently. Returns the delivered count.
pub(crate) fn broadcast(directory: &SessionDirectory, peers: &[SessionId], frame: &Frame) -> usize {
    let mut delivered = 0;
    for &peer in peers {
        if directory.send_to(peer, frame.clone()) {
            delivered += 1;
        }
    }
    crate::metrics::record_fanout(delivered);
    delivered
}


#[cfg(test)]
mod tests {
    use super::fixtures::{run, Fixture};
    use super::*;

    #[test]
    fn exit_is_valid_in_every_state() {
        let fixture = Fixture::new(50, 40);
        for mut state in [
            SessionState::AwaitingUsername,
            SessionState::Lobby,
            SessionState::InRoom(0),
        ] {
            let (session, _rx) = fixture.session();
            let mut username = Some("alice".to_string());
            let (result, replies) =
                run(&fixture, session, &mut state, &mut username, ClientCommand::Exit, "bye");
            assert_eq!(result, Ok(Flow::Disconnect));
            assert!(replies.is_empty(), "EXIT sends no reply frame");
        }
    }

    #[test]
    fn lobby_commands_rejected_while_awaiting_username() {
        let fixture = Fixture::new(50, 40);
        let (session, _rx) = fixture.session();
        let mut state = SessionState::AwaitingUsername;
        let mut username = None;

        for command in [
            ClientCommand::CreateRoom,
            ClientCommand::JoinRoom,
            ClientCommand::ListRooms,
            ClientCommand::SendMessage,
            ClientCommand::LeaveRoom,
        ] {
            let (result, _) =
                run(&fixture, session, &mut state, &mut username, command, "x");
            assert_eq!(
                result,
                Err(CommandError::InvalidStateCommand {
                    state: "awaiting_username"
                })
            );
        }
        assert_eq!(state, SessionState::AwaitingUsername, "state unchanged on rejection");
    }

    #[test]
    fn room_commands_rejected_in_lobby() {
        let fixture = Fixture::new(50, 40);
        let (session, _rx) = fixture.session();
        let mut state = SessionState::Lobby;
        let mut username = Some("alice".to_string());

        for command in [ClientCommand::SendMessage, ClientCommand::LeaveRoom] {
            let (result, _) = run(&fixture, session, &mut state, &mut username, command, "x");
            assert_eq!(
                result,
                Err(CommandError::InvalidStateCommand { state: "lobby" })
            );
        }
    }

    #[test]
    fn lobby_commands_rejected_in_room() {
        let fixture = Fixture::new(50, 40);
        let (session, _rx) = fixture.session();
        let mut state = SessionState::Lobby;
        let mut username = Some("alice".to_string());
        let (result, _) = run(
            &fixture,
            session,
            &mut state,
            &mut username,
            ClientCommand::CreateRoom,
            "den",
        );
        assert!(result.is_ok());
        assert!(matches!(state, SessionState::InRoom(_)));

        for command in [
            ClientCommand::CreateRoom,
            ClientCommand::JoinRoom,
            ClientCommand::ListRooms,
            ClientCommand::SubmitUsername,
        ] {
            let (result, _) = run(&fixture, session, &mut state, &mut username, command, "x");
            assert_eq!(
                result,
                Err(CommandError::InvalidStateCommand { state: "in_room" })
            );
        }
    }
}
