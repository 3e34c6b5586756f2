use crate::controller::{health_check_controller, publish_controller};
use crate::sse::handler::sse_handler;
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{any, get, post},
    Router,
};
use log::*;
use service::AppState;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config.allowed_origins);

    Router::new()
        .merge(event_stream_routes(app_state.clone()))
        .merge(publish_routes(app_state.clone()))
        .merge(health_routes())
        .layer(cors)
}

fn event_stream_routes(app_state: AppState) -> Router {
    let path = route_path(&app_state.config.events_path);
    info!("Mounting SSE event stream at {path}");

    Router::new()
        .route(&path, any(sse_handler))
        .with_state(app_state)
}

fn publish_routes(app_state: AppState) -> Router {
    let path = route_path(&app_state.config.publish_path);

    Router::new()
        .route(&path, post(publish_controller::publish))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

// Routes must be absolute.
fn route_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::sse::Hub;
    use axum::{
        body::{Body, BodyDataStream, Bytes},
        http::{
            header::{CACHE_CONTROL, CONNECTION},
            Request, StatusCode,
        },
    };
    use clap::Parser;
    use futures::StreamExt;
    use service::config::Config;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state(args: &[&str]) -> AppState {
        let config =
            Config::parse_from(std::iter::once("eventsource-hub").chain(args.iter().copied()));
        AppState::new(config, Hub::new())
    }

    async fn next_chunk(body: &mut BodyDataStream) -> Bytes {
        tokio::time::timeout(Duration::from_secs(5), body.next())
            .await
            .expect("timed out waiting for an event")
            .expect("event stream ended")
            .expect("event stream failed")
    }

    async fn wait_for_subscribers(hub: &Hub, expected: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while hub.subscriber_count() != expected {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("subscriber count not reached in time");
    }

    #[test]
    fn test_route_path_is_made_absolute() {
        assert_eq!(route_path("/events"), "/events");
        assert_eq!(route_path("events"), "/events");
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = define_routes(test_state(&[]));

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 64).await.unwrap();
        assert_eq!(body, Bytes::from_static(b"healthy"));
    }

    #[tokio::test]
    async fn test_event_stream_sets_headers_and_streams_events() {
        let app_state = test_state(&[]);
        let hub = app_state.hub.clone();
        let app = define_routes(app_state);

        let request = Request::builder()
            .uri("/events")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/event-stream");
        assert_eq!(response.headers()[CACHE_CONTROL], "no-cache");
        assert_eq!(response.headers()[CONNECTION], "keep-alive");
        assert_eq!(hub.subscriber_count(), 1);

        let mut body = response.into_body().into_data_stream();

        hub.publish("line1\nline2");
        assert_eq!(
            next_chunk(&mut body).await,
            Bytes::from_static(b"data: line1\ndata: line2\n\n")
        );

        hub.publish("  hello  \n");
        assert_eq!(
            next_chunk(&mut body).await,
            Bytes::from_static(b"data: hello\n\n")
        );
    }

    #[tokio::test]
    async fn test_event_stream_ignores_request_method() {
        let app_state = test_state(&[]);
        let hub = app_state.hub.clone();
        let app = define_routes(app_state);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/events")
            .body(Body::from("ignored"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/event-stream");
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_publish_route_broadcasts_request_body() {
        let app_state = test_state(&[]);
        let hub = app_state.hub.clone();
        let app = define_routes(app_state);

        let mut streams = Vec::new();
        for _ in 0..2 {
            let request = Request::builder()
                .uri("/events")
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            streams.push(response.into_body().into_data_stream());
        }
        assert_eq!(hub.subscriber_count(), 2);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/publish")
            .body(Body::from("deploy finished"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        for body in streams.iter_mut() {
            assert_eq!(
                next_chunk(body).await,
                Bytes::from_static(b"data: deploy finished\n\n")
            );
        }
    }

    #[tokio::test]
    async fn test_dropping_the_stream_unsubscribes() {
        let app_state = test_state(&[]);
        let hub = app_state.hub.clone();
        let app = define_routes(app_state);

        let request = Request::builder()
            .uri("/events")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(hub.subscriber_count(), 1);

        drop(response);
        wait_for_subscribers(&hub, 0).await;

        hub.publish("nobody left");
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_closing_the_hub_ends_streams() {
        let app_state = test_state(&[]);
        let hub = app_state.hub.clone();
        let app = define_routes(app_state);

        let request = Request::builder()
            .uri("/events")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let mut body = response.into_body().into_data_stream();

        hub.publish("goodbye");
        hub.close();

        assert_eq!(
            next_chunk(&mut body).await,
            Bytes::from_static(b"data: goodbye\n\n")
        );
        let end = tokio::time::timeout(Duration::from_secs(5), body.next())
            .await
            .expect("stream did not end");
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn test_streams_opened_after_close_end_immediately() {
        let app_state = test_state(&[]);
        let hub = app_state.hub.clone();
        let app = define_routes(app_state);

        hub.close();

        let request = Request::builder()
            .uri("/events")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut body = response.into_body().into_data_stream();
        let end = tokio::time::timeout(Duration::from_secs(5), body.next())
            .await
            .expect("stream did not end");
        assert!(end.is_none());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_configured_paths_are_used() {
        let app_state = test_state(&["--events-path", "stream", "--publish-path", "/send"]);
        let hub = app_state.hub.clone();
        let app = define_routes(app_state);

        let request = Request::builder()
            .uri("/stream")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let mut body = response.into_body().into_data_stream();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/send")
            .body(Body::from("routed"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            next_chunk(&mut body).await,
            Bytes::from_static(b"data: routed\n\n")
        );

        let request = Request::builder()
            .uri("/events")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let app = define_routes(test_state(&["--allowed-origins", "https://app.example"]));

        let request = Request::builder()
            .uri("/health")
            .header("origin", "https://app.example")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://app.example"
        );
    }
}
