use async_stream::stream;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use std::convert::Infallible;
use std::io;
use tokio::sync::{mpsc, oneshot};

/// Status line and headers, committed once per response.
struct Head {
    status: StatusCode,
    headers: HeaderMap,
}

/// [`::sse::ResponseWriter`] over a streaming axum response body.
///
/// Writes accumulate in a buffer; each flush hands the buffer to the body as
/// one chunk. The head travels separately so the handler can return the
/// response as soon as it is committed.
pub(crate) struct BodyWriter {
    head: Option<oneshot::Sender<Head>>,
    headers: HeaderMap,
    buffer: BytesMut,
    chunks: mpsc::Sender<Bytes>,
}

/// Handler side of a [`BodyWriter`]: resolves into the response once the
/// writer commits its head.
pub(crate) struct PendingResponse {
    head: oneshot::Receiver<Head>,
    chunks: mpsc::Receiver<Bytes>,
}

impl BodyWriter {
    pub(crate) fn new() -> (Self, PendingResponse) {
        let (head_tx, head_rx) = oneshot::channel();
        // One chunk in flight: a slow client stalls its own writer, never the hub.
        let (chunk_tx, chunk_rx) = mpsc::channel(1);

        let writer = Self {
            head: Some(head_tx),
            headers: HeaderMap::new(),
            buffer: BytesMut::new(),
            chunks: chunk_tx,
        };
        let pending = PendingResponse {
            head: head_rx,
            chunks: chunk_rx,
        };

        (writer, pending)
    }

    fn commit(&mut self, status: StatusCode) -> io::Result<()> {
        let Some(head) = self.head.take() else {
            return Ok(());
        };

        head.send(Head {
            status,
            headers: std::mem::take(&mut self.headers),
        })
        .map_err(|_| disconnected())
    }

    async fn send_chunk(&mut self, chunk: Bytes) -> io::Result<()> {
        self.chunks.send(chunk).await.map_err(|_| disconnected())
    }
}

#[async_trait]
impl ::sse::ResponseWriter for BodyWriter {
    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    async fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.buffer.extend_from_slice(buf);
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.commit(StatusCode::OK)?;

        if self.buffer.is_empty() {
            return Ok(());
        }
        let chunk = self.buffer.split().freeze();
        self.send_chunk(chunk).await
    }

    async fn write_error(&mut self, status: StatusCode, body: &str) -> io::Result<()> {
        self.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.commit(status)?;
        self.send_chunk(Bytes::copy_from_slice(body.as_bytes())).await
    }

    async fn closed(&mut self) {
        self.chunks.closed().await
    }
}

impl PendingResponse {
    pub(crate) async fn into_response(self) -> Response {
        let PendingResponse { head, mut chunks } = self;

        let Ok(head) = head.await else {
            // The writer went away without ever answering.
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };

        let body = Body::from_stream(stream! {
            while let Some(chunk) = chunks.recv().await {
                yield Ok::<_, Infallible>(chunk);
            }
        });

        let mut response = Response::new(body);
        *response.status_mut() = head.status;
        *response.headers_mut() = head.headers;
        response
    }
}

fn disconnected() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "client disconnected")
}
