/// Errors decoding frames received from the session socket.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed server message: {reason}")]
    Malformed { reason: String },

    #[error("unexpected binary frame ({len} bytes)")]
    UnexpectedBinary { len: usize },
}
