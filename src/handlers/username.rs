//! Username submission: the one command accepted while awaiting a username.

use parlor_proto::limits::MAX_USERNAME_LEN;
use parlor_proto::Request;
use tracing::info;

use super::{lobby, Context, Flow};
use crate::error::CommandError;
use crate::state::SessionState;

/// Store the submitted username and move the session to the lobby.
///
/// The payload is trimmed; structural validation has already rejected
/// empty/whitespace-only content. Success is acknowledged with the room
/// listing, as the lobby entry screen.
pub fn submit(ctx: &mut Context<'_>, request: &Request) -> Result<Flow, CommandError> {
    let name = request.content.trim();
    if name.len() > MAX_USERNAME_LEN {
        return Err(CommandError::UsernameTooLong(name.len()));
    }

    *ctx.username = Some(name.to_string());
    *ctx.state = SessionState::Lobby;
    info!(session = %ctx.session, username = %name, "username accepted");

    ctx.replies.push(lobby::room_list_frame(ctx.rooms));
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::fixtures::{run, Fixture};
    use parlor_proto::ClientCommand;

    #[test]
    fn accepts_a_username_and_enters_the_lobby() {
        let fixture = Fixture::new(50, 40);
        let (session, _rx) = fixture.session();
        let mut state = SessionState::AwaitingUsername;
        let mut username = None;

        let (result, replies) = run(
            &fixture,
            session,
            &mut state,
            &mut username,
            ClientCommand::SubmitUsername,
            "alice",
        );
        assert_eq!(result, Ok(Flow::Continue));
        assert_eq!(state, SessionState::Lobby);
        assert_eq!(username.as_deref(), Some("alice"));

        // Reply is the room listing (lobby entry screen).
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].command_byte(), 0x1a);
        assert!(replies[0].payload().contains("Available Chat Rooms"));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let fixture = Fixture::new(50, 40);
        let (session, _rx) = fixture.session();
        let mut state = SessionState::AwaitingUsername;
        let mut username = None;

        let (result, _) = run(
            &fixture,
            session,
            &mut state,
            &mut username,
            ClientCommand::SubmitUsername,
            "  bob  ",
        );
        assert!(result.is_ok());
        assert_eq!(username.as_deref(), Some("bob"));
    }

    #[test]
    fn rejects_names_over_the_limit() {
        let fixture = Fixture::new(50, 40);
        let (session, _rx) = fixture.session();
        let mut state = SessionState::AwaitingUsername;
        let mut username = None;

        let long = "x".repeat(MAX_USERNAME_LEN + 1);
        let (result, replies) = run(
            &fixture,
            session,
            &mut state,
            &mut username,
            ClientCommand::SubmitUsername,
            &long,
        );
        assert_eq!(result, Err(CommandError::UsernameTooLong(MAX_USERNAME_LEN + 1)));
        assert_eq!(state, SessionState::AwaitingUsername, "state unchanged");
        assert!(username.is_none());
        assert!(replies.is_empty());
    }

    #[test]
    fn accepts_a_name_at_the_limit() {
        let fixture = Fixture::new(50, 40);
        let (session, _rx) = fixture.session();
        let mut state = SessionState::AwaitingUsername;
        let mut username = None;

        let max = "x".repeat(MAX_USERNAME_LEN);
        let (result, _) = run(
            &fixture,
            session,
            &mut state,
            &mut username,
            ClientCommand::SubmitUsername,
            &max,
        );
        assert!(result.is_ok());
        assert_eq!(username.as_deref(), Some(max.as_str()));
    }
}
