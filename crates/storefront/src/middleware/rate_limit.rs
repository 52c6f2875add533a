//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `form_rate_limiter`: checkout and contact submissions (~10/min)
//! - `api_rate_limiter`: cart updates and field validation (~100/min)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Headers carrying the client IP when behind a proxy, most trusted first.
const CLIENT_IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-real-ip", "fly-client-ip"];

/// Key extractor that reads the client IP from proxy headers, then falls
/// back to the socket peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();
        let header_ip = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        };

        if let Some(ip) = CLIENT_IP_HEADERS.iter().find_map(|name| header_ip(name)) {
            return Ok(ip);
        }

        // First hop of X-Forwarded-For
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for form submissions: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. `per_second(6)` and `burst_size(5)` are
/// valid positive integers, always accepted by `GovernorConfigBuilder`.
#[must_use]
#[allow(clippy::expect_used)]
pub fn form_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for cart and field endpoints: ~100 requests per
/// minute per IP, with room for fast typing.
///
/// # Panics
///
/// This function will not panic. `per_second(1)` and `burst_size(50)` are
/// valid positive integers, always accepted by `GovernorConfigBuilder`.
#[must_use]
#[allow(clippy::expect_used)]
pub fn api_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(1)
        .burst_size(50)
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(50) is valid");
    GovernorLayer::new(Arc::new(config))
}
