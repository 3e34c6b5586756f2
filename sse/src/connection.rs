use bytes::Bytes;
use log::*;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};

/// Unique identifier for a subscriber (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberId(uuid::Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Default)]
struct Subscribers {
    senders: HashMap<SubscriberId, Sender<Bytes>>,
    closed: bool,
}

/// Subscriber registry: one bounded queue sender per live subscriber, all
/// behind a single lock so a broadcast never sees a half-updated set.
pub(crate) struct Registry {
    subscribers: Mutex<Subscribers>,
    capacity: usize,
}

impl Registry {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Subscribers::default()),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Create a queue and register its sending half.
    ///
    /// Once the registry is closed the sender is dropped right away, so the
    /// returned queue is already closed and empty.
    pub(crate) fn register(&self) -> (SubscriberId, Receiver<Bytes>) {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = SubscriberId::new();

        let mut subscribers = self.subscribers.lock();
        if subscribers.closed {
            debug!("Registry closed, subscriber {id} ends immediately");
            return (id, receiver);
        }
        subscribers.senders.insert(id.clone(), sender);
        drop(subscribers);

        debug!("Registered subscriber {id}");
        (id, receiver)
    }

    /// Remove a subscriber. Removing an absent id is a no-op.
    ///
    /// Dropping the sender closes the queue, so the receiving side sees the
    /// end of the stream once it has drained what was already queued.
    pub(crate) fn unregister(&self, id: &SubscriberId) {
        if self.subscribers.lock().senders.remove(id).is_some() {
            debug!("Unregistered subscriber {id}");
        }
    }

    /// Offer one payload to every registered queue without waiting.
    pub(crate) fn broadcast(&self, payload: &Bytes) {
        let subscribers = self.subscribers.lock();

        for (id, sender) in subscribers.senders.iter() {
            match sender.try_send(payload.clone()) {
                Ok(()) => {}
                // Flooded or dead client, discard.
                Err(TrySendError::Full(_)) => {
                    trace!("Subscriber {id} queue is full, dropping message");
                }
                Err(TrySendError::Closed(_)) => {
                    trace!("Subscriber {id} receiver is gone, skipping");
                }
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.lock().senders.len()
    }

    /// Drop every sender, closing all queues at once. Later registrations
    /// are closed on arrival.
    pub(crate) fn close(&self) -> usize {
        let drained: Vec<_> = {
            let mut subscribers = self.subscribers.lock();
            subscribers.closed = true;
            subscribers.senders.drain().collect()
        };
        drained.len()
    }
}

/// Receiving end of one subscriber queue.
///
/// The registry entry lives exactly as long as this handle: dropping it
/// unsubscribes, whichever way the owning connection ends.
pub struct Subscription {
    id: SubscriberId,
    receiver: Receiver<Bytes>,
    registry: Arc<Registry>,
}

impl Subscription {
    pub(crate) fn new(registry: Arc<Registry>) -> Self {
        let (id, receiver) = registry.register();
        Self {
            id,
            receiver,
            registry,
        }
    }

    pub fn id(&self) -> &SubscriberId {
        &self.id
    }

    /// Wait for the next framed payload.
    ///
    /// Returns `None` once the queue has been closed and drained, which
    /// happens when the subscriber is removed out-of-band or the hub closes.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.receiver.recv().await
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unregister(&self.id);
    }
}
