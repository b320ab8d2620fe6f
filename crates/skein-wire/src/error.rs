//! Protocol-level error type.

/// Errors raised while encoding or decoding the binary protocol.
///
/// Codec errors propagate to the caller as-is; the codec never retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The reader requested more bytes than the input holds.
    #[error("expected {expected} bytes but got {got}")]
    EndOfInput { expected: usize, got: usize },

    /// A type code outside the closed TType set showed up during dispatch.
    #[error("unknown type code {0}")]
    UnknownTType(i8),

    /// A strict envelope whose version nibble is not 1.
    #[error("unsupported envelope version {0} (expected 1)")]
    UnsupportedVersion(i32),

    /// A message envelope carried an unrecognized message kind.
    #[error("unknown message kind {0}")]
    UnknownMessageKind(i8),
}
