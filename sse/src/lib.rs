//! Server-Sent Events (SSE) broadcast hub.
//!
//! A [`Hub`] accepts arbitrary byte messages from any number of publishers
//! and streams each one, framed as a `text/event-stream` event, to every
//! currently connected client.
//!
//! # Architecture
//!
//! - **Single-lock registry**: every subscriber owns a bounded queue; the
//!   sending halves live in one map behind one mutex, so a publish sees
//!   either all or none of a concurrent registration.
//! - **Drop-on-full**: publishing never waits. A subscriber that has fallen
//!   [`DEFAULT_QUEUE_CAPACITY`] messages behind silently misses new ones.
//! - **Scoped subscriptions**: a [`Subscription`] removes its registry entry
//!   when dropped, so every way a connection can end releases it.
//! - **Ephemeral messages**: nothing is stored; clients that connect later
//!   only see what is published after they subscribed.
//!
//! # Message Flow
//!
//! 1. An HTTP server hands each inbound request to [`Hub::serve`] through a
//!    [`ResponseWriter`] adapter
//! 2. `serve` sets the event-stream headers, subscribes and commits the head
//! 3. [`Hub::publish`] trims the message, continues embedded lines as extra
//!    `data:` lines and offers it to every queue
//! 4. Each connection writes `data: <payload>\n\n` and flushes, until its
//!    queue closes, a write fails or the client goes away
//!
//! # Example: Publishing
//!
//! ```rust,ignore
//! let hub = sse::Hub::new();
//! // mount `hub.serve(writer)` behind an HTTP route, then:
//! hub.publish("build finished\nall green");
//! ```
//!
//! # Modules
//!
//! - `connection`: Registry, SubscriberId and the scoped Subscription handle
//! - `hub`: Publish, subscribe and the per-connection streaming loop
//! - `message`: Wire framing and protocol constants
//! - `writer`: The transport seam implemented by HTTP adapters

pub mod connection;
pub mod hub;
pub mod message;
pub mod writer;

pub use connection::{SubscriberId, Subscription};
pub use hub::{Hub, DEFAULT_QUEUE_CAPACITY};
pub use writer::{Disconnect, ResponseWriter};
