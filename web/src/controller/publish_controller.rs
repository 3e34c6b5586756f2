use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use log::*;
use service::AppState;

/// POST a message to every connected SSE client.
///
/// The raw request body is the message. Clients whose queue is full miss it;
/// the publisher is never told.
pub async fn publish(State(app_state): State<AppState>, body: Bytes) -> impl IntoResponse {
    debug!(
        "Publishing {} byte message to {} subscriber(s)",
        body.len(),
        app_state.hub.subscriber_count()
    );

    app_state.hub.publish(body);

    StatusCode::NO_CONTENT
}
