// SPDX-License-Identifier: Apache-2.0

use crate::AppState;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::fmt::Write as _;
use std::sync::atomic::Ordering;

const METRIC_VERSION: &str = env!("CARGO_PKG_VERSION");

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> Response {
    let mut body = String::new();
    let catalog = &state.catalog.metrics;
    let _ = writeln!(
        body,
        "tvplus_build_info{{version=\"{METRIC_VERSION}\"}} 1"
    );
    for (name, value) in [
        ("tvplus_catalog_cache_hits_total", &catalog.hits),
        ("tvplus_catalog_refresh_total", &catalog.refreshes),
        ("tvplus_catalog_not_modified_total", &catalog.not_modified),
        ("tvplus_catalog_refresh_failures_total", &catalog.refresh_failures),
        ("tvplus_catalog_stale_served_total", &catalog.stale_served),
        ("tvplus_catalog_channels", &catalog.channel_count),
    ] {
        let _ = writeln!(body, "{name} {}", value.load(Ordering::Relaxed));
    }
    let _ = writeln!(
        body,
        "tvplus_catalog_loaded {}",
        u8::from(state.catalog.has_catalog().await)
    );
    let _ = writeln!(
        body,
        "tvplus_accepting_requests {}",
        u8::from(state.accepting_requests.load(Ordering::Relaxed))
    );
    for ((route, status), count) in state.metrics.request_counts().await {
        let _ = writeln!(
            body,
            "tvplus_http_requests_total{{route=\"{route}\",status=\"{status}\"}} {count}"
        );
    }
    for (route, p95_ns) in state.metrics.latency_p95_ns().await {
        let _ = writeln!(
            body,
            "tvplus_http_request_latency_p95_seconds{{route=\"{route}\"}} {:.6}",
            p95_ns as f64 / 1e9
        );
    }

    let mut resp = (StatusCode::OK, body).into_response();
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    resp
}
