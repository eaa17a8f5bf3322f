// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! HTTP gateway that turns the Samsung TV Plus channel catalog into an M3U
//! playlist, proxies the matching XMLTV guide and serves a status page.

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use std::time::Duration;

mod catalog_cache;
mod config;
mod http;
mod middleware;
mod telemetry;
mod upstream;

pub use catalog_cache::{CatalogMetrics, ChannelCatalogCache};
pub use config::{
    validate_startup_config_contract, ServerConfig, UpstreamConfig, CONFIG_SCHEMA_VERSION,
    DEFAULT_APP_URL, DEFAULT_EPG_URL, DEFAULT_PORT,
};
pub use http::handlers::{EPG_PATH, FAVICON_PATH, PLAYLIST_PATH};
pub use http::status_page::{escape_html, quote, render_status_page, PAGE_TITLE};
pub use telemetry::logging::init_tracing;
pub use telemetry::RequestMetrics;
pub use upstream::fake::FakeChannelSource;
pub use upstream::http::{HttpChannelSource, RetryPolicy};
pub use upstream::{sha256_hex, CatalogFetch, ChannelSource, EpgStream, UpstreamError};

pub const CRATE_NAME: &str = "tvplus-server";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub catalog: Arc<ChannelCatalogCache>,
    pub source: Arc<dyn ChannelSource>,
    pub accepting_requests: Arc<AtomicBool>,
    pub(crate) metrics: Arc<RequestMetrics>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(source: Arc<dyn ChannelSource>, config: ServerConfig) -> Self {
        let catalog = ChannelCatalogCache::new(Arc::clone(&source), config.catalog_ttl);
        Self {
            config: Arc::new(config),
            catalog,
            source,
            accepting_requests: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Source built from the upstream section of `config`.
    #[must_use]
    pub fn from_config(config: ServerConfig) -> Self {
        let upstream = &config.upstream;
        let source: Arc<dyn ChannelSource> = Arc::new(HttpChannelSource::new(
            upstream.app_url.clone(),
            upstream.epg_url.clone(),
            upstream.timeout,
            RetryPolicy {
                max_attempts: upstream.retry_attempts.max(1),
                base_backoff_ms: upstream.retry_base_backoff_ms,
            },
        ));
        Self::new(source, config)
    }

    pub fn begin_shutdown_drain(&self) {
        self.accepting_requests
            .store(false, std::sync::atomic::Ordering::Relaxed);
    }

    #[must_use]
    pub fn shutdown_drain(&self) -> Duration {
        self.config.shutdown_drain
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::handlers::status_handler))
        .route(PLAYLIST_PATH, get(http::handlers::playlist_handler))
        .route(EPG_PATH, get(http::handlers::epg_handler))
        .route(FAVICON_PATH, get(http::handlers::favicon_handler))
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/readyz", get(http::handlers::readyz_handler))
        .route("/metrics", get(telemetry::metrics_endpoint::metrics_handler))
        .fallback(http::handlers::first_segment_handler)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .with_state(state)
}
