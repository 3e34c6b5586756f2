use super::body_writer::BodyWriter;
use axum::extract::State;
use axum::response::Response;
use log::*;
use service::AppState;

/// SSE handler that keeps the connection open and streams every published
/// message. Method and body of the request are ignored.
pub(crate) async fn sse_handler(State(app_state): State<AppState>) -> Response {
    let (writer, pending) = BodyWriter::new();
    let hub = app_state.hub.clone();

    debug!("Establishing SSE connection");

    // One task per connection; it owns the subscription for its lifetime.
    tokio::spawn(async move {
        hub.serve(writer).await;
    });

    pending.into_response().await
}
