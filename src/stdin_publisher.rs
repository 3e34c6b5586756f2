use log::*;
use sse::Hub;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};

/// Publishes every line of standard input until it is closed.
pub async fn run(hub: Hub) {
    publish_lines(BufReader::new(io::stdin()), &hub).await;
}

async fn publish_lines<R: AsyncBufRead + Unpin>(reader: R, hub: &Hub) {
    let mut lines = reader.lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => hub.publish(line),
            Ok(None) => {
                info!("Standard input closed, no longer publishing from it");
                return;
            }
            Err(e) => {
                warn!("Failed to read from standard input: {e}");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_each_line_is_published_as_one_event() {
        let hub = Hub::new();
        let mut subscription = hub.subscribe();

        publish_lines(&b"first\n  second  \n"[..], &hub).await;

        assert_eq!(subscription.recv().await, Some(Bytes::from_static(b"first")));
        assert_eq!(subscription.recv().await, Some(Bytes::from_static(b"second")));
    }
}
