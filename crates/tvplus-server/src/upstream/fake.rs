// SPDX-License-Identifier: Apache-2.0

use super::{CatalogFetch, ChannelSource, EpgStream, UpstreamError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;
use tvplus_model::AppCatalog;

pub struct FakeChannelSource {
    pub catalog: Mutex<AppCatalog>,
    pub etag: Mutex<String>,
    pub epg_status: u16,
    pub epg_chunks: Mutex<Vec<Vec<u8>>>,
    pub fail_catalog: AtomicBool,
    pub catalog_calls: AtomicU64,
    pub epg_calls: AtomicU64,
}

impl Default for FakeChannelSource {
    fn default() -> Self {
        Self {
            catalog: Mutex::new(AppCatalog::default()),
            etag: Mutex::new("v1".to_string()),
            epg_status: 200,
            epg_chunks: Mutex::new(Vec::new()),
            fail_catalog: AtomicBool::new(false),
            catalog_calls: AtomicU64::new(0),
            epg_calls: AtomicU64::new(0),
        }
    }
}

impl FakeChannelSource {
    #[must_use]
    pub fn with_catalog(catalog: AppCatalog) -> Self {
        Self {
            catalog: Mutex::new(catalog),
            ..Self::default()
        }
    }

    pub async fn publish(&self, catalog: AppCatalog, etag: &str) {
        *self.catalog.lock().await = catalog;
        *self.etag.lock().await = etag.to_string();
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_catalog.store(failing, Ordering::Relaxed);
    }
}

#[async_trait]
impl ChannelSource for FakeChannelSource {
    fn source_tag(&self) -> &'static str {
        "fake"
    }

    async fn fetch_catalog(&self, if_none_match: Option<&str>) -> Result<CatalogFetch, UpstreamError> {
        self.catalog_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_catalog.load(Ordering::Relaxed) {
            return Err(UpstreamError::Status {
                url: "fake://catalog".to_string(),
                status: 503,
            });
        }
        let etag = self.etag.lock().await.clone();
        if if_none_match == Some(etag.as_str()) {
            return Ok(CatalogFetch::NotModified);
        }
        Ok(CatalogFetch::Updated {
            etag,
            catalog: self.catalog.lock().await.clone(),
        })
    }

    async fn open_epg(&self) -> Result<EpgStream, UpstreamError> {
        self.epg_calls.fetch_add(1, Ordering::Relaxed);
        let chunks: Vec<Result<Bytes, UpstreamError>> = self
            .epg_chunks
            .lock()
            .await
            .iter()
            .map(|c| Ok(Bytes::from(c.clone())))
            .collect();
        Ok(EpgStream {
            status: self.epg_status,
            content_type: Some("application/octet-stream".to_string()),
            body: futures::stream::iter(chunks).boxed(),
        })
    }
}
