use query_builder::QueryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The command lock deadline expired or the caller cancelled while
    /// waiting.
    #[error("cancelled or timed out while waiting for the command lock")]
    CancelledOrTimedOut,

    /// The server's argument codec is neither null nor an object codec.
    #[error("server returned a malformed argument codec")]
    MalformedArgumentCodec,

    /// Query construction failed before anything reached the wire.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// An error reported by the server, passed through untouched.
    #[error("server error: {0}")]
    Server(String),
}
