use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that are allowed to open event streams and publish.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Route path the event stream is mounted at
    #[arg(long, env, default_value = "/events")]
    pub events_path: String,

    /// Route path accepting messages to broadcast (request body is the message)
    #[arg(long, env, default_value = "/publish")]
    pub publish_path: String,

    /// Number of undelivered messages kept per subscriber before new ones are dropped
    #[arg(long, env, default_value_t = sse::DEFAULT_QUEUE_CAPACITY)]
    pub subscriber_queue_capacity: usize,

    /// Publish every line read from standard input
    #[arg(long, env, default_value_t = false)]
    pub publish_stdin: bool,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn interface(&self) -> &str {
        self.interface.as_deref().unwrap_or("127.0.0.1")
    }

    /// `interface:port` to bind the listener to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.interface(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::parse_from(std::iter::once("eventsource-hub").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.interface(), "127.0.0.1");
        assert_eq!(config.events_path, "/events");
        assert_eq!(config.publish_path, "/publish");
        assert_eq!(config.subscriber_queue_capacity, 100);
        assert!(!config.publish_stdin);
        assert_eq!(config.log_level_filter, LevelFilter::Info);
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "https://localhost:3000"]
        );
    }

    #[test]
    fn test_bind_address() {
        let config = parse(&["--interface", "0.0.0.0", "--port", "8080"]);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_allowed_origins_are_comma_delimited() {
        let config = parse(&["--allowed-origins", "https://a.example,https://b.example"]);
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_log_level_filter_parses_upper_case_names() {
        let config = parse(&["--log-level-filter", "TRACE"]);
        assert_eq!(config.log_level_filter, LevelFilter::Trace);
    }

    #[test]
    fn test_stream_options() {
        let config = parse(&[
            "--events-path",
            "/stream",
            "--subscriber-queue-capacity",
            "8",
            "--publish-stdin",
        ]);
        assert_eq!(config.events_path, "/stream");
        assert_eq!(config.subscriber_queue_capacity, 8);
        assert!(config.publish_stdin);
    }
}
