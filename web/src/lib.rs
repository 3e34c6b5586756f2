use ::sse::Hub;
use log::*;
use service::AppState;
use tokio::net::TcpListener;

mod controller;
pub mod router;
mod sse;

/// Binds the configured address and serves until Ctrl-C.
///
/// On shutdown every open event stream is closed so the server can drain.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let address = app_state.config.bind_address();
    let listener = TcpListener::bind(&address).await?;

    info!("Server starting... listening for connections on http://{address}");

    let hub = app_state.hub.clone();
    axum::serve(listener, router::define_routes(app_state))
        .with_graceful_shutdown(shutdown_signal(hub))
        .await
}

async fn shutdown_signal(hub: Hub) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl-C handler: {e}");
        std::future::pending::<()>().await;
    }

    info!("Shutdown signal received, closing SSE streams");
    hub.close();
}
