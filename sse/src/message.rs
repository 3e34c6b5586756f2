//! `text/event-stream` framing.
//!
//! A published message becomes one event carrying one or more `data:` lines.
//! Framing happens in two steps: [`prepare`] runs once per publish, and
//! [`encode_event`] wraps the prepared payload when a connection writes it.

use bytes::{BufMut, Bytes, BytesMut};

/// Prefix of every `data:` line.
pub const DATA_PREFIX: &[u8] = b"data: ";

/// Blank line terminating one event.
pub const EVENT_TERMINATOR: &[u8] = b"\n\n";

pub const CONTENT_TYPE_EVENT_STREAM: &str = "text/event-stream";
pub const CACHE_CONTROL_NO_CACHE: &str = "no-cache";
pub const CONNECTION_KEEP_ALIVE: &str = "keep-alive";

/// Body of the response sent when the transport cannot flush incrementally.
pub const STREAMING_UNSUPPORTED: &str = "streaming unsupported";

/// Trim surrounding white space and continue every embedded line as a
/// further `data:` line of the same event.
pub fn prepare(message: &[u8]) -> Bytes {
    let trimmed = trim(message);
    let newlines = trimmed.iter().filter(|&&b| b == b'\n').count();

    let mut framed = BytesMut::with_capacity(trimmed.len() + newlines * DATA_PREFIX.len());
    for (index, line) in trimmed.split(|&b| b == b'\n').enumerate() {
        if index > 0 {
            framed.put_u8(b'\n');
            framed.put_slice(DATA_PREFIX);
        }
        framed.put_slice(line);
    }

    framed.freeze()
}

/// Wrap a prepared payload as a single event: `data: <payload>\n\n`.
pub fn encode_event(payload: &[u8]) -> Bytes {
    let mut event =
        BytesMut::with_capacity(DATA_PREFIX.len() + payload.len() + EVENT_TERMINATOR.len());
    event.put_slice(DATA_PREFIX);
    event.put_slice(payload);
    event.put_slice(EVENT_TERMINATOR);
    event.freeze()
}

// Strips leading and trailing Unicode white space. Bytes that are not valid
// UTF-8 count as content, never as white space.
fn trim(message: &[u8]) -> &[u8] {
    let mut start = None;
    let mut end = 0;
    let mut offset = 0;

    for chunk in message.utf8_chunks() {
        for (index, c) in chunk.valid().char_indices() {
            if !c.is_whitespace() {
                start.get_or_insert(offset + index);
                end = offset + index + c.len_utf8();
            }
        }
        offset += chunk.valid().len();

        if !chunk.invalid().is_empty() {
            start.get_or_insert(offset);
            offset += chunk.invalid().len();
            end = offset;
        }
    }

    match start {
        Some(start) => &message[start..end],
        None => &[],
    }
}
