use anyhow::Result;
use eventsource_client::{self as es, Client};
use futures_util::stream::StreamExt;
use log::*;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct Event {
    /// `data:` lines of the event, joined with `\n`.
    pub data: String,
}

pub struct Connection {
    pub label: String,
    event_rx: mpsc::UnboundedReceiver<Event>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Connection {
    pub fn establish(url: &str, label: String) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let client = es::ClientBuilder::for_url(url)?.build();

        let task_label = label.clone();
        let handle = tokio::spawn(async move {
            let mut stream = client.stream();

            loop {
                match stream.next().await {
                    Some(Ok(es::SSE::Event(event))) => {
                        let sse_event = Event { data: event.data };

                        if tx.send(sse_event).is_err() {
                            debug!("SSE receiver dropped for {}", task_label);
                            break;
                        }
                    }
                    Some(Ok(_)) => {
                        // Comments carry nothing for us
                    }
                    Some(Err(e)) => {
                        warn!("SSE error for {}: {}", task_label, e);
                    }
                    None => {
                        debug!("SSE stream ended for {}", task_label);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            label,
            event_rx: rx,
            _handle: handle,
        })
    }

    /// Wait for an event whose data equals `expected`, skipping any others.
    pub async fn wait_for_data(&mut self, expected: &str, timeout: Duration) -> Result<Event> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                anyhow::bail!("Timeout waiting for event: {:?}", expected);
            }

            match tokio::time::timeout(remaining, self.event_rx.recv()).await {
                Ok(Some(event)) if event.data == expected => {
                    return Ok(event);
                }
                Ok(Some(event)) => {
                    trace!("{} skipping event {:?}", self.label, event.data);
                    continue;
                }
                Ok(None) => {
                    anyhow::bail!("SSE connection closed");
                }
                Err(_) => {
                    anyhow::bail!("Timeout waiting for event: {:?}", expected);
                }
            }
        }
    }

    /// Wait for the next event, whatever it carries.
    pub async fn next_event(&mut self, timeout: Duration) -> Result<Event> {
        match tokio::time::timeout(timeout, self.event_rx.recv()).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => anyhow::bail!("SSE connection closed"),
            Err(_) => anyhow::bail!("Timeout waiting for next event"),
        }
    }
}
