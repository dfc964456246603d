//! Tokio codec for `\r\n`-terminated frames.
//!
//! Decoding splits the inbound stream on the two-byte terminator only: a
//! bare `\n` inside a payload is data. Partial lines are buffered across
//! reads; every complete line in a read is emitted in arrival order.
//!
//! Bad input must not kill the stream (`Framed` treats a decoder error as
//! terminal), so recoverable line problems are decoded as [`Decoded`]
//! violation items: the offending bytes are consumed (or discarded up to
//! the next terminator) and the connection keeps reading. Only I/O errors
//! are surfaced as stream errors.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::frame::Frame;
use crate::limits::{MAX_INBOUND_LINE, MAX_OUTBOUND_CONTENT};

/// One decoding outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A complete line, terminator stripped.
    Line(String),
    /// A line exceeded the inbound limit. It has been discarded (up to its
    /// terminator); `length` is the size seen when the limit tripped.
    OverlongLine { length: usize },
    /// A complete line was not valid UTF-8 and has been discarded.
    InvalidUtf8,
}

/// Frame codec: decodes raw lines (terminator stripped), encodes [`Frame`]s.
pub struct FrameCodec {
    /// Index of the next byte to check for a terminator, so already-scanned
    /// input is not rescanned on the next read.
    next_index: usize,
    /// Maximum inbound line length including terminator.
    max_line: usize,
    /// Set after an oversized unterminated line is reported; input is
    /// dropped until the next terminator.
    discarding: bool,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::with_max_line(MAX_INBOUND_LINE)
    }

    /// Create a codec with a custom inbound line limit (tests mostly).
    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            next_index: 0,
            max_line,
            discarding: false,
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the `\r\n` pair at or after `from`, returning the index of the `\r`.
fn find_terminator(buf: &[u8], from: usize) -> Option<usize> {
    if buf.len() < 2 {
        return None;
    }
    (from..buf.len() - 1).find(|&i| buf[i] == b'\r' && buf[i + 1] == b'\n')
}

impl Decoder for FrameCodec {
    type Item = Decoded;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Decoded>, ProtocolError> {
        // Resume one byte early: a trailing `\r` from the previous read may
        // pair with a `\n` at the start of this one.
        let search_from = self.next_index.saturating_sub(1);
        let term = find_terminator(src, search_from);

        if self.discarding {
            match term {
                Some(pos) => {
                    src.advance(pos + 2);
                    self.discarding = false;
                    self.next_index = 0;
                    // The oversized line was already reported; scan what
                    // follows it.
                    return self.decode(src);
                }
                None => {
                    // Keep the final byte in case it is half a terminator.
                    if src.len() > 1 {
                        src.advance(src.len() - 1);
                    }
                    self.next_index = src.len();
                    return Ok(None);
                }
            }
        }

        match term {
            Some(pos) => {
                let line_len = pos + 2;
                self.next_index = 0;
                if line_len > self.max_line {
                    src.advance(line_len);
                    return Ok(Some(Decoded::OverlongLine { length: line_len }));
                }
                let line = src.split_to(line_len);
                match String::from_utf8(line[..pos].to_vec()) {
                    Ok(text) => Ok(Some(Decoded::Line(text))),
                    Err(_) => Ok(Some(Decoded::InvalidUtf8)),
                }
            }
            None => {
                if src.len() > self.max_line {
                    // Report once, then silently discard to the next
                    // terminator.
                    let length = src.len();
                    self.discarding = true;
                    self.next_index = 0;
                    if src.len() > 1 {
                        src.advance(src.len() - 1);
                    }
                    return Ok(Some(Decoded::OverlongLine { length }));
                }
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Decoded>, ProtocolError> {
        // Emit any complete frames still buffered; a trailing partial frame
        // at EOF is dropped (the peer is gone, nothing to report to).
        self.decode(src)
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let payload = frame.payload().as_bytes();
        if payload.len() > MAX_OUTBOUND_CONTENT {
            return Err(ProtocolError::PayloadTooLong {
                actual: payload.len(),
                limit: MAX_OUTBOUND_CONTENT,
            });
        }
        dst.reserve(payload.len() + 4);
        dst.put_u8(frame.command_byte());
        dst.put_u8(b' ');
        dst.put_slice(payload);
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
