use anyhow::Result;
use clap::Parser;
use colored::*;

mod api_client;
mod output;
mod scenarios;
mod sse_client;

use api_client::ApiClient;
use output::print_test_summary;
use sse_client::Connection;

#[derive(Parser)]
#[command(name = "sse-test-client")]
#[command(about = "SSE Hub Integration Testing Tool")]
struct Cli {
    /// Base URL of the hub (e.g., http://localhost:4000)
    #[arg(long)]
    base_url: String,

    /// Path the event stream is mounted at
    #[arg(long, default_value = "/events")]
    events_path: String,

    /// Path accepting messages to publish
    #[arg(long, default_value = "/publish")]
    publish_path: String,

    /// Number of simultaneous SSE connections to open
    #[arg(long, default_value_t = 2)]
    connections: usize,

    /// Test scenario to run
    #[arg(long, value_enum)]
    scenario: ScenarioChoice,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum ScenarioChoice {
    /// Test that every connection is subscribed and receiving
    ConnectionTest,
    /// Test a single-line message reaches every connection
    Broadcast,
    /// Test multi-line framing and whitespace trimming
    Multiline,
    /// Test per-connection delivery order
    Ordering,
    /// Run all tests
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    println!("{}", "=== SETUP PHASE ===".bright_white().bold());

    let client = reqwest::Client::new();
    let api_client = ApiClient::new(client, cli.base_url.clone(), cli.publish_path.clone());

    println!("{} Checking hub health...", "→".blue());
    api_client.health_check().await?;
    println!("{} Hub is up", "✓".green());

    // Establish SSE connections
    println!("\n{} Establishing SSE connections...", "→".blue());
    let url = format!("{}{}", cli.base_url, cli.events_path);
    let mut connections = Vec::with_capacity(cli.connections);
    for i in 1..=cli.connections.max(1) {
        connections.push(Connection::establish(&url, format!("Client {i}"))?);
        println!("{} Client {} SSE connection started", "✓".green(), i);
    }

    // Run test scenarios
    println!("\n{}", "=== TEST PHASE ===".bright_white().bold());

    let mut results = Vec::new();

    // Every scenario needs subscribed streams first
    let connected = scenarios::test_connection(&api_client, &mut connections).await?;
    let ready = connected.passed;
    results.push(connected);

    if ready {
        match cli.scenario {
            ScenarioChoice::ConnectionTest => {}
            ScenarioChoice::Broadcast => {
                results.push(scenarios::test_broadcast(&api_client, &mut connections).await?);
            }
            ScenarioChoice::Multiline => {
                results.push(scenarios::test_multiline(&api_client, &mut connections).await?);
            }
            ScenarioChoice::Ordering => {
                results.push(scenarios::test_ordering(&api_client, &mut connections).await?);
            }
            ScenarioChoice::All => {
                results.push(scenarios::test_broadcast(&api_client, &mut connections).await?);
                results.push(scenarios::test_multiline(&api_client, &mut connections).await?);
                results.push(scenarios::test_ordering(&api_client, &mut connections).await?);
            }
        }
    }

    // Print summary
    println!("\n{}", "=== RESULTS ===".bright_white().bold());
    print_test_summary(&results);

    let all_passed = results.iter().all(|r| r.passed);

    if all_passed {
        println!("\n{}", "All tests passed! ✓".bright_green().bold());
    } else {
        println!("\n{}", "Some tests failed! ✗".bright_red().bold());
    }

    std::process::exit(if all_passed { 0 } else { 1 });
}
