//! Mama Food's Storefront library.
//!
//! This crate provides the public restaurant site as a library, allowing it
//! to be tested and reused. [`app`] assembles the full router with its
//! middleware stack; the binary only adds telemetry and the listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    http::{HeaderValue, header::CACHE_CONTROL},
    middleware::from_fn,
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::state::AppState;

/// Directory holding CSS, JS and images.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the storefront application.
///
/// The caller serves it with
/// `into_make_service_with_connect_info::<SocketAddr>()` so the rate limiter
/// can fall back to the peer address.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=31536000, immutable"),
        ))
        .service(ServeDir::new(STATIC_DIR));

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .nest_service("/static", static_files)
        .layer(session_layer)
        .layer(from_fn(middleware::csp_nonce_middleware))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. The storefront keeps no database,
/// so there is no separate readiness check.
async fn health() -> &'static str {
    "ok"
}
