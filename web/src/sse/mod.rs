//! SSE HTTP surface for the web layer.
//!
//! This module adapts axum requests to the hub's streaming loop. The hub
//! itself (registry, publish, framing) lives in the `sse` crate.

mod body_writer;
pub mod handler;
