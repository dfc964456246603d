//! Test chat client.
//!
//! A raw-socket client that frames on `\r\n` (payloads may embed bare
//! `\n`), with helpers for the common protocol flows.

use anyhow::{bail, ensure, Context as _};
use parlor_proto::{ClientCommand, ServerCommand};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A test client.
pub struct TestClient {
    stream: TcpStream,
    buffer: Vec<u8>,
}

impl TestClient {
    /// Connect to a test server.
    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            stream,
            buffer: Vec::new(),
        })
    }

    /// Send one frame: command byte, space, content, terminator.
    pub async fn send_frame(&mut self, command: u8, content: &str) -> anyhow::Result<()> {
        let mut wire = Vec::with_capacity(content.len() + 4);
        wire.push(command);
        wire.push(b' ');
        wire.extend_from_slice(content.as_bytes());
        wire.extend_from_slice(b"\r\n");
        self.send_raw(&wire).await
    }

    /// Send raw bytes, unframed. For malformed-input and partial-frame tests.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Receive the next frame as `(command byte, content)`.
    pub async fn recv_frame(&mut self) -> anyhow::Result<(u8, String)> {
        self.recv_frame_timeout(RECV_TIMEOUT).await
    }

    /// Receive a frame, waiting at most `dur` per socket read.
    pub async fn recv_frame_timeout(&mut self, dur: Duration) -> anyhow::Result<(u8, String)> {
        loop {
            if let Some(pos) = find_terminator(&self.buffer) {
                let line: Vec<u8> = self.buffer.drain(..pos + 2).collect();
                let line = &line[..pos];
                ensure!(
                    line.len() >= 2 && line[1] == b' ',
                    "malformed frame from server: {line:?}"
                );
                let content = String::from_utf8(line[2..].to_vec())
                    .context("frame content is not UTF-8")?;
                return Ok((line[0], content));
            }

            let mut chunk = [0u8; 4096];
            let n = timeout(dur, self.stream.read(&mut chunk))
                .await
                .context("timed out waiting for a frame")??;
            ensure!(n > 0, "connection closed by server");
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Receive frames until one has the wanted command byte, returning its
    /// content. Frames of other types (interleaved broadcasts) are skipped,
    /// matching how the original protocol suite reads responses.
    pub async fn expect(&mut self, command: u8) -> anyhow::Result<String> {
        for _ in 0..100 {
            let (got, content) = self.recv_frame().await?;
            if got == command {
                return Ok(content);
            }
        }
        bail!("frame 0x{command:02x} not received within 100 frames");
    }

    /// Assert the server closes the connection (EOF or reset), draining any
    /// frames still in flight.
    pub async fn expect_closed(&mut self) -> anyhow::Result<()> {
        loop {
            let mut chunk = [0u8; 4096];
            match timeout(RECV_TIMEOUT, self.stream.read(&mut chunk)).await {
                Ok(Ok(0)) => return Ok(()),
                Ok(Ok(_)) => continue,
                Ok(Err(_)) => return Ok(()), // reset counts as closed
                Err(_) => bail!("connection not closed within {RECV_TIMEOUT:?}"),
            }
        }
    }

    /// Consume the welcome frame, returning its text.
    pub async fn handshake(&mut self) -> anyhow::Result<String> {
        self.expect(ServerCommand::Welcome.byte()).await
    }

    /// Welcome + username submission + room-list acknowledgement.
    pub async fn login(&mut self, username: &str) -> anyhow::Result<()> {
        self.handshake().await?;
        self.submit_username(username).await?;
        self.expect(ServerCommand::RoomList.byte()).await?;
        Ok(())
    }

    pub async fn submit_username(&mut self, username: &str) -> anyhow::Result<()> {
        self.send_frame(ClientCommand::SubmitUsername.byte(), username).await
    }

    pub async fn create_room(&mut self, name: &str) -> anyhow::Result<()> {
        self.send_frame(ClientCommand::CreateRoom.byte(), name).await
    }

    pub async fn join_room(&mut self, id: &str) -> anyhow::Result<()> {
        self.send_frame(ClientCommand::JoinRoom.byte(), id).await
    }

    pub async fn list_rooms(&mut self) -> anyhow::Result<()> {
        self.send_frame(ClientCommand::ListRooms.byte(), "list").await
    }

    pub async fn send_message(&mut self, text: &str) -> anyhow::Result<()> {
        self.send_frame(ClientCommand::SendMessage.byte(), text).await
    }

    pub async fn leave_room(&mut self) -> anyhow::Result<()> {
        self.send_frame(ClientCommand::LeaveRoom.byte(), "leave").await
    }

    /// Send `EXIT`. The server closes without a reply frame.
    pub async fn exit(&mut self) -> anyhow::Result<()> {
        self.send_frame(ClientCommand::Exit.byte(), "bye").await
    }
}

/// Position of the first `\r\n` pair.
fn find_terminator(buffer: &[u8]) -> Option<usize> {
    if buffer.len() < 2 {
        return None;
    }
    (0..buffer.len() - 1).find(|&i| buffer[i] == b'\r' && buffer[i + 1] == b'\n')
}
