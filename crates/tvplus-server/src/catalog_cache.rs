// SPDX-License-Identifier: Apache-2.0

use crate::upstream::{CatalogFetch, ChannelSource, UpstreamError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};
use tvplus_model::AppCatalog;

#[derive(Default)]
pub struct CatalogMetrics {
    pub hits: AtomicU64,
    pub refreshes: AtomicU64,
    pub not_modified: AtomicU64,
    pub refresh_failures: AtomicU64,
    pub stale_served: AtomicU64,
    pub channel_count: AtomicU64,
}

struct CachedCatalog {
    etag: String,
    catalog: Arc<AppCatalog>,
    fetched_at: Instant,
}

/// Last known upstream catalog, refreshed with conditional requests.
///
/// A zero `ttl` refetches on every read. When a refresh fails and a copy is
/// held, the stale copy is served instead of failing the request.
pub struct ChannelCatalogCache {
    ttl: Duration,
    source: Arc<dyn ChannelSource>,
    state: Mutex<Option<CachedCatalog>>,
    refresh_lock: Mutex<()>,
    pub metrics: Arc<CatalogMetrics>,
}

impl ChannelCatalogCache {
    pub fn new(source: Arc<dyn ChannelSource>, ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            ttl,
            source,
            state: Mutex::new(None),
            refresh_lock: Mutex::new(()),
            metrics: Arc::new(CatalogMetrics::default()),
        })
    }

    pub fn source(&self) -> Arc<dyn ChannelSource> {
        Arc::clone(&self.source)
    }

    async fn fresh(&self) -> Option<Arc<AppCatalog>> {
        let state = self.state.lock().await;
        state
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
            .map(|c| Arc::clone(&c.catalog))
    }

    pub async fn current(&self) -> Result<Arc<AppCatalog>, UpstreamError> {
        if let Some(catalog) = self.fresh().await {
            self.metrics.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(catalog);
        }
        let _guard = self.refresh_lock.lock().await;
        // Another request may have refreshed while this one waited.
        if let Some(catalog) = self.fresh().await {
            self.metrics.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(catalog);
        }
        match self.refresh_locked().await {
            Ok(catalog) => Ok(catalog),
            Err(e) => {
                let stale = self
                    .state
                    .lock()
                    .await
                    .as_ref()
                    .map(|c| Arc::clone(&c.catalog));
                match stale {
                    Some(catalog) => {
                        warn!(error = %e, "catalog refresh failed, serving stale copy");
                        self.metrics.stale_served.fetch_add(1, Ordering::Relaxed);
                        Ok(catalog)
                    }
                    None => Err(e),
                }
            }
        }
    }

    pub async fn refresh(&self) -> Result<(), UpstreamError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await.map(|_| ())
    }

    async fn refresh_locked(&self) -> Result<Arc<AppCatalog>, UpstreamError> {
        let etag = { self.state.lock().await.as_ref().map(|c| c.etag.clone()) };
        let fetched = self.source.fetch_catalog(etag.as_deref()).await;
        let mut state = self.state.lock().await;
        match fetched {
            Ok(CatalogFetch::NotModified) => match state.as_mut() {
                Some(cached) => {
                    cached.fetched_at = Instant::now();
                    self.metrics.not_modified.fetch_add(1, Ordering::Relaxed);
                    Ok(Arc::clone(&cached.catalog))
                }
                None => Err(UpstreamError::Body(
                    "upstream reported not-modified without a cached catalog".to_string(),
                )),
            },
            Ok(CatalogFetch::Updated { etag, catalog }) => {
                let catalog = Arc::new(catalog);
                self.metrics.refreshes.fetch_add(1, Ordering::Relaxed);
                self.metrics
                    .channel_count
                    .store(catalog.channel_count() as u64, Ordering::Relaxed);
                info!(
                    etag = %etag,
                    regions = catalog.regions.len(),
                    channels = catalog.channel_count(),
                    source = self.source.source_tag(),
                    "catalog updated"
                );
                *state = Some(CachedCatalog {
                    etag,
                    catalog: Arc::clone(&catalog),
                    fetched_at: Instant::now(),
                });
                Ok(catalog)
            }
            Err(e) => {
                self.metrics.refresh_failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    pub async fn has_catalog(&self) -> bool {
        self.state.lock().await.is_some()
    }

    pub async fn catalog_etag(&self) -> Option<String> {
        self.state.lock().await.as_ref().map(|c| c.etag.clone())
    }

    pub fn spawn_refresh_loop(self: &Arc<Self>, every: Duration) {
        if every.is_zero() {
            return;
        }
        let me = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = me.refresh().await {
                    warn!(error = %e, "background catalog refresh failed");
                }
            }
        });
    }
}
