//! Codec-level errors.

use thiserror::Error;

/// Fatal errors surfaced while reading or writing the byte stream.
///
/// Recoverable input problems (oversized or non-UTF-8 lines) are not errors
/// at this layer: the decoder reports them as [`crate::codec::Decoded`]
/// items so the stream keeps going. What remains here ends the connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// An outbound payload exceeded the server-side frame limit. This is a
    /// local bug guard; nothing is sent to the peer.
    #[error("outbound payload exceeds {limit} bytes (got {actual})")]
    PayloadTooLong { actual: usize, limit: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_too_long_names_both_sizes() {
        let err = ProtocolError::PayloadTooLong {
            actual: 3000,
            limit: 2700,
        };
        let text = err.to_string();
        assert!(text.contains("3000"));
        assert!(text.contains("2700"));
    }
}
