use log::*;
use service::{config::Config, logging::Logger, AppState};

mod stdin_publisher;

#[tokio::main]
async fn main() {
    let config = Config::new();

    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start logger: {e}");
    }

    info!("Starting up SSE hub server");

    let hub = service::init_hub(&config);

    if config.publish_stdin {
        info!("Publishing lines read from standard input");
        tokio::spawn(stdin_publisher::run(hub.clone()));
    }

    let app_state = AppState::new(config, hub);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server failed: {e}");
        std::process::exit(1);
    }

    info!("Server stopped");
}
