//! The per-session event loop.
//!
//! Runs as a local task on the worker that owns the session. One
//! `tokio::select!` multiplexes three sources: decoded frames from the
//! socket, the session's outbound queue (filled by room fan-out, possibly
//! from other workers), and the shutdown signal. All writes to the socket
//! happen here and nowhere else.

use futures_util::{SinkExt, StreamExt};
use parlor_proto::{
    parse_request, Decoded, ErrorCode, Frame, FrameCodec, FrameError, ServerCommand,
};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_util::codec::Framed;
use tracing::{debug, info, instrument, warn};

use super::worker::Handoff;
use crate::error::CommandError;
use crate::handlers::{self, Context, Flow};
use crate::state::{ServerState, SessionId, SessionState};

/// Consecutive malformed frames tolerated before the session is closed.
/// The counter resets on any well-formed frame.
const MAX_PROTOCOL_VIOLATIONS: u8 = 5;

/// Greeting sent once per connection; prompts for a username.
const WELCOME_TEXT: &str = "WELCOME TO THE SERVER: THIS IS A FAMILY FRIENDLY SPACE, NO CURSING\n\
                            Please enter Your User Name";

/// Run one session to completion: greet, serve, tear down.
///
/// Teardown always releases room membership (announcing the departure),
/// removes the session from the directory, and frees the admission seat via
/// the permit's drop. The permit is owned here and dropped exactly once, so
/// a read error racing an explicit `EXIT` cannot double-release.
#[instrument(skip_all, fields(session = %handoff.session, addr = %handoff.addr), name = "session")]
pub async fn run(
    handoff: Handoff,
    state: Arc<ServerState>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let Handoff {
        stream,
        addr: _,
        session,
        permit,
    } = handoff;

    // Re-register the socket with this worker's reactor.
    stream.set_nonblocking(true)?;
    let stream = TcpStream::from_std(stream)?;
    let mut framed = Framed::new(stream, FrameCodec::new());

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    state.sessions.register(session, outbound_tx);
    crate::metrics::session_connected();
    info!(worker = permit.worker(), "client connected");

    let mut session_state = SessionState::Connecting;
    let mut username: Option<String> = None;

    drive(
        &mut framed,
        &mut outbound_rx,
        &mut session_state,
        &mut username,
        &mut shutdown,
        &state,
        session,
    )
    .await;

    // Teardown: room membership first (the departure broadcast needs the
    // username), then the directory entry, then the admission seat.
    if let SessionState::InRoom(room) = session_state {
        handlers::depart(
            &state.rooms,
            &state.sessions,
            room,
            session,
            username.as_deref().unwrap_or("*"),
        );
    }
    state.sessions.unregister(session);
    crate::metrics::session_closed();
    info!("client disconnected");
    drop(permit);

    Ok(())
}

/// The active phase: welcome frame, then the select loop until the peer
/// leaves, errors, exits, or the server shuts down.
#[allow(clippy::too_many_arguments)]
async fn drive(
    framed: &mut Framed<TcpStream, FrameCodec>,
    outbound_rx: &mut mpsc::UnboundedReceiver<Frame>,
    session_state: &mut SessionState,
    username: &mut Option<String>,
    shutdown: &mut watch::Receiver<bool>,
    state: &ServerState,
    session: SessionId,
) {
    // A handoff can race shutdown; do not greet a session the server is
    // already draining.
    if *shutdown.borrow() {
        return;
    }

    if framed
        .send(Frame::server(ServerCommand::Welcome, WELCOME_TEXT))
        .await
        .is_err()
    {
        warn!("failed to send welcome frame");
        return;
    }
    *session_state = SessionState::AwaitingUsername;

    let mut violations: u8 = 0;

    loop {
        tokio::select! {
            result = framed.next() => match result {
                Some(Ok(Decoded::Line(line))) => match parse_request(&line) {
                    Ok(request) => {
                        violations = 0;
                        crate::metrics::record_command(request.command.name());

                        let mut replies = Vec::new();
                        let outcome = {
                            let mut ctx = Context {
                                session,
                                state: &mut *session_state,
                                username: &mut *username,
                                rooms: &state.rooms,
                                directory: &state.sessions,
                                replies: &mut replies,
                            };
                            handlers::dispatch(&mut ctx, &request)
                        };

                        match outcome {
                            Ok(Flow::Continue) => {
                                let mut write_failed = false;
                                for frame in replies {
                                    if framed.send(frame).await.is_err() {
                                        write_failed = true;
                                        break;
                                    }
                                }
                                if write_failed {
                                    warn!("write error");
                                    break;
                                }
                            }
                            Ok(Flow::Disconnect) => {
                                info!("client requested exit");
                                break;
                            }
                            Err(error) => {
                                crate::metrics::record_command_error(
                                    request.command.name(),
                                    error.error_code(),
                                );
                                debug!(error = %error, "command rejected");
                                if framed.send(error.to_frame()).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Err(frame_error) => {
                        let error = CommandError::from(frame_error);
                        crate::metrics::record_command_error("invalid", error.error_code());
                        if error.is_protocol_violation() {
                            violations += 1;
                        }
                        warn!(violations, error = %error, "malformed frame");
                        if framed.send(error.to_frame()).await.is_err() {
                            break;
                        }
                        if violations >= MAX_PROTOCOL_VIOLATIONS {
                            warn!("protocol violation strike limit reached - disconnecting");
                            break;
                        }
                    }
                },
                Some(Ok(violation)) => {
                    violations += 1;
                    crate::metrics::record_command_error("invalid", "invalid_format");
                    warn!(violations, ?violation, "unreadable line");
                    if framed.send(violation_reply(&violation)).await.is_err() {
                        break;
                    }
                    if violations >= MAX_PROTOCOL_VIOLATIONS {
                        warn!("protocol violation strike limit reached - disconnecting");
                        break;
                    }
                }
                Some(Err(read_error)) => {
                    debug!(error = %read_error, "read error");
                    break;
                }
                None => {
                    info!("peer closed the connection");
                    break;
                }
            },

            maybe = outbound_rx.recv() => {
                if let Some(frame) = maybe {
                    if framed.send(frame).await.is_err() {
                        warn!("write error on broadcast");
                        break;
                    }
                }
            }

            _ = shutdown.changed() => {
                info!("shutdown - closing session");
                break;
            }
        }
    }
}

/// Map a line-level violation to the single error frame it is reported
/// with. The decoder has already consumed the offending input.
fn violation_reply(violation: &Decoded) -> Frame {
    match violation {
        Decoded::OverlongLine { length } => {
            CommandError::Malformed(FrameError::ContentTooLong(*length)).to_frame()
        }
        Decoded::InvalidUtf8 | Decoded::Line(_) => Frame::error(
            ErrorCode::InvalidFormat,
            "Invalid format: Message is not valid UTF-8",
        ),
    }
}
