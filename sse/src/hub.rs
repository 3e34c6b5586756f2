use crate::connection::{Registry, SubscriberId, Subscription};
use crate::message::{self, STREAMING_UNSUPPORTED};
use crate::writer::{Disconnect, ResponseWriter};
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use log::*;
use std::sync::Arc;

/// Number of undelivered messages a subscriber may fall behind by before new
/// messages are dropped for it.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Broadcast hub: fans every published message out to all connected
/// subscribers. Cloning is cheap; all clones share one registry.
#[derive(Clone)]
pub struct Hub {
    registry: Arc<Registry>,
}

impl Hub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Hub whose subscriber queues hold `capacity` messages (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry::new(capacity)),
        }
    }

    /// Register a new subscriber queue.
    pub fn subscribe(&self) -> Subscription {
        Subscription::new(self.registry.clone())
    }

    /// Remove a subscriber. Unknown or already removed ids are ignored.
    pub fn unsubscribe(&self, id: &SubscriberId) {
        self.registry.unregister(id);
    }

    /// Send a message to all connected subscribers.
    ///
    /// Never blocks: a subscriber whose queue is full simply misses this
    /// message.
    pub fn publish(&self, message: impl AsRef<[u8]>) {
        let payload = message::prepare(message.as_ref());
        self.registry.broadcast(&payload);
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.registry.capacity()
    }

    /// Close every subscriber queue. Connected streams deliver what is
    /// already queued and then end.
    ///
    /// Closing is final: subscriptions taken afterwards end immediately, so a
    /// connection accepted during shutdown cannot hold the server open.
    pub fn close(&self) {
        let closed = self.registry.close();
        info!("Closed {closed} SSE subscriber(s)");
    }

    /// Stream published messages to one client until it goes away.
    ///
    /// The subscription is released on every return path.
    pub async fn serve<W: ResponseWriter>(&self, mut writer: W) -> Disconnect {
        if !writer.supports_flush() {
            if let Err(e) = writer
                .write_error(StatusCode::INTERNAL_SERVER_ERROR, STREAMING_UNSUPPORTED)
                .await
            {
                debug!("Failed to send streaming error response: {e}");
            }
            return Disconnect::StreamingUnsupported;
        }

        writer.set_header(
            CONTENT_TYPE,
            HeaderValue::from_static(message::CONTENT_TYPE_EVENT_STREAM),
        );
        writer.set_header(
            CACHE_CONTROL,
            HeaderValue::from_static(message::CACHE_CONTROL_NO_CACHE),
        );
        writer.set_header(
            CONNECTION,
            HeaderValue::from_static(message::CONNECTION_KEEP_ALIVE),
        );

        let mut subscription = self.subscribe();
        let reason = Self::stream(&mut subscription, &mut writer).await;

        debug!("SSE subscriber {} disconnected: {reason}", subscription.id());
        reason
    }

    async fn stream<W: ResponseWriter>(
        subscription: &mut Subscription,
        writer: &mut W,
    ) -> Disconnect {
        // Commit the head right away so the client sees the stream open.
        if let Err(e) = writer.flush().await {
            debug!("Failed to send SSE response head: {e}");
            return Disconnect::WriteFailed;
        }

        loop {
            let payload = tokio::select! {
                biased;
                _ = writer.closed() => return Disconnect::ClientGone,
                payload = subscription.recv() => payload,
            };

            let Some(payload) = payload else {
                return Disconnect::Closed;
            };

            if let Err(e) = writer.write(&message::encode_event(&payload)).await {
                debug!("Failed to write SSE event: {e}");
                return Disconnect::WriteFailed;
            }

            if let Err(e) = writer.flush().await {
                debug!("Failed to flush SSE event: {e}");
                return Disconnect::WriteFailed;
            }
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
