use anyhow::Result;
use colored::*;
use std::time::{Duration, Instant};

use crate::api_client::ApiClient;
use crate::output::{print_event, TestResult};
use crate::sse_client::Connection;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);
const PROBE_TIMEOUT: Duration = Duration::from_millis(250);
const PROBE_ATTEMPTS: usize = 40;

/// Publish probes until every connection has received one, proving all
/// streams are subscribed.
pub async fn test_connection(
    api_client: &ApiClient,
    connections: &mut [Connection],
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Connection ===".bright_cyan().bold());

    let mut ready = vec![false; connections.len()];

    for attempt in 0..PROBE_ATTEMPTS {
        let probe = format!("probe {attempt}");
        api_client.publish(&probe).await?;

        for (connection, ready) in connections.iter_mut().zip(ready.iter_mut()) {
            if !*ready && connection.wait_for_data(&probe, PROBE_TIMEOUT).await.is_ok() {
                println!("{} {} is receiving events", "✓".green(), connection.label);
                *ready = true;
            }
        }

        if ready.iter().all(|r| *r) {
            return Ok(TestResult::pass("connection", start.elapsed()));
        }
    }

    let missing: Vec<_> = connections
        .iter()
        .zip(&ready)
        .filter(|(_, ready)| !**ready)
        .map(|(connection, _)| connection.label.clone())
        .collect();

    println!("{} Some connections never received a probe", "✗".red());
    Ok(TestResult::fail(
        "connection",
        format!("No probe received by: {}", missing.join(", ")),
        start.elapsed(),
    ))
}

pub async fn test_broadcast(
    api_client: &ApiClient,
    connections: &mut [Connection],
) -> Result<TestResult> {
    expect_everywhere(
        "broadcast",
        api_client,
        connections,
        "hello from the hub",
        "hello from the hub",
    )
    .await
}

/// Embedded newlines become extra `data:` lines, surrounding white space is trimmed.
pub async fn test_multiline(
    api_client: &ApiClient,
    connections: &mut [Connection],
) -> Result<TestResult> {
    expect_everywhere(
        "multiline",
        api_client,
        connections,
        "  first line\nsecond line  \n",
        "first line\nsecond line",
    )
    .await
}

pub async fn test_ordering(
    api_client: &ApiClient,
    connections: &mut [Connection],
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Ordering ===".bright_cyan().bold());

    let messages: Vec<String> = (0..10).map(|i| format!("sequence {i}")).collect();
    for message in &messages {
        api_client.publish(message).await?;
    }
    println!("{} Published {} messages", "✓".green(), messages.len());

    for connection in connections.iter_mut() {
        // Anything left over from earlier scenarios arrives before the first message.
        if let Err(e) = connection.wait_for_data(&messages[0], EVENT_TIMEOUT).await {
            println!("{} {}: {}", "✗".red(), connection.label, e);
            return Ok(TestResult::fail(
                "ordering",
                format!("{}: {}", connection.label, e),
                start.elapsed(),
            ));
        }

        for expected in &messages[1..] {
            match connection.next_event(EVENT_TIMEOUT).await {
                Ok(event) if &event.data == expected => {}
                Ok(event) => {
                    println!("{} {} received out of order", "✗".red(), connection.label);
                    return Ok(TestResult::fail(
                        "ordering",
                        format!(
                            "{} expected {:?}, got {:?}",
                            connection.label, expected, event.data
                        ),
                        start.elapsed(),
                    ));
                }
                Err(e) => {
                    println!("{} {}: {}", "✗".red(), connection.label, e);
                    return Ok(TestResult::fail(
                        "ordering",
                        format!("{}: {}", connection.label, e),
                        start.elapsed(),
                    ));
                }
            }
        }
        println!("{} {} received all messages in order", "✓".green(), connection.label);
    }

    Ok(TestResult::pass("ordering", start.elapsed()))
}

async fn expect_everywhere(
    scenario: &str,
    api_client: &ApiClient,
    connections: &mut [Connection],
    message: &str,
    expected: &str,
) -> Result<TestResult> {
    let start = Instant::now();

    println!(
        "\n{}",
        format!("=== TEST: {scenario} ===").bright_cyan().bold()
    );

    println!("{} Publishing {:?}...", "→".blue(), message);
    api_client.publish(message).await?;

    for connection in connections.iter_mut() {
        match connection.wait_for_data(expected, EVENT_TIMEOUT).await {
            Ok(event) => print_event(&connection.label, &event),
            Err(e) => {
                println!("{} {}: {}", "✗".red(), connection.label, e);
                return Ok(TestResult::fail(
                    scenario,
                    format!("{}: {}", connection.label, e),
                    start.elapsed(),
                ));
            }
        }
    }

    println!("{} Event data verified correctly", "✓".green());
    Ok(TestResult::pass(scenario, start.elapsed()))
}
