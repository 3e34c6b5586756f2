use config::Config;
use log::info;
use sse::Hub;

pub mod config;
pub mod logging;

/// Builds the hub sized according to the configured subscriber queue capacity.
pub fn init_hub(config: &Config) -> Hub {
    let hub = Hub::with_capacity(config.subscriber_queue_capacity);
    info!(
        "SSE hub ready: subscriber_queue_capacity={}",
        hub.queue_capacity()
    );
    hub
}

// Service-level state shared by every route.
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub hub: Hub,
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config, hub: Hub) -> Self {
        Self {
            hub,
            config: app_config,
        }
    }
}
