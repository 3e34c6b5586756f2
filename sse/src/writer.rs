use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use std::fmt;
use std::io;

/// Response side of one HTTP exchange, as seen by [`crate::Hub::serve`].
///
/// Implementations adapt a concrete server transport. Headers set with
/// [`set_header`](ResponseWriter::set_header) must be committed together with
/// the first `write`, `flush` or `write_error`.
#[async_trait]
pub trait ResponseWriter: Send {
    /// Whether written bytes can be pushed to the client before the response
    /// is complete. Streaming is refused when this is `false`.
    fn supports_flush(&self) -> bool {
        true
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    async fn write(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Push everything written so far to the client.
    async fn flush(&mut self) -> io::Result<()>;

    /// Send a complete non-streaming error response.
    async fn write_error(&mut self, status: StatusCode, body: &str) -> io::Result<()>;

    /// Resolves once the client is known to be gone. Transports that cannot
    /// tell rely on the next failed write instead.
    async fn closed(&mut self) {
        std::future::pending::<()>().await
    }
}

/// Why a streaming connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// The transport cannot flush; a 500 was sent and nothing subscribed.
    StreamingUnsupported,
    /// The subscriber queue was closed from the hub side.
    Closed,
    /// Writing or flushing to the client failed.
    WriteFailed,
    /// The transport reported the client gone.
    ClientGone,
}

impl fmt::Display for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Disconnect::StreamingUnsupported => write!(f, "streaming unsupported"),
            Disconnect::Closed => write!(f, "queue closed"),
            Disconnect::WriteFailed => write!(f, "write failed"),
            Disconnect::ClientGone => write!(f, "client gone"),
        }
    }
}
