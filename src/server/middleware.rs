//! Request middleware: HTTPS redirect and request timing

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::templates::GarnishData;

/// Per-request metadata stamped by [`garnish`]
#[derive(Debug, Clone)]
pub struct Garnish {
    started: Instant,
    region: Arc<str>,
}

impl Garnish {
    pub fn new(region: Arc<str>) -> Self {
        Self {
            started: Instant::now(),
            region,
        }
    }

    /// Footer data, timed up to the moment of the call
    pub fn data(&self) -> GarnishData {
        GarnishData {
            execution_time: format_latency(self.started.elapsed()),
            region: self.region.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Stamp every request with its start time and the serving region
pub async fn garnish(State(region): State<Arc<str>>, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(Garnish::new(region));
    next.run(request).await
}

/// Redirect requests that reached the proxy over plain HTTP
pub async fn redirect_to_https(request: Request, next: Next) -> Response {
    let forwarded_http = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("http"));
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok());

    if let (true, Some(host)) = (forwarded_http, host) {
        let path = request
            .uri()
            .path_and_query()
            .map(|p| p.as_str())
            .unwrap_or("/");
        let location = format!("https://{}{}", host, path);
        tracing::debug!("Redirecting to {}", location);
        return (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response();
    }

    next.run(request).await
}

/// Format a duration with the largest unit that keeps it above one
pub fn format_latency(duration: Duration) -> String {
    if duration >= Duration::from_millis(1) {
        format!("{}ms", duration.as_millis())
    } else if duration >= Duration::from_micros(1) {
        format!("{}µs", duration.as_micros())
    } else {
        format!("{}ns", duration.as_nanos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_latency() {
        assert_eq!(format_latency(Duration::from_nanos(250)), "250ns");
        assert_eq!(format_latency(Duration::from_micros(42)), "42µs");
        assert_eq!(format_latency(Duration::from_micros(1999)), "1ms");
        assert_eq!(format_latency(Duration::from_secs(2)), "2000ms");
    }

    #[test]
    fn test_garnish_data() {
        let data = Garnish::new(Arc::from("ams")).data();
        assert_eq!(data.region, "ams");
        assert_eq!(data.version, env!("CARGO_PKG_VERSION"));
        assert!(data.execution_time.ends_with('s'));
    }
}
