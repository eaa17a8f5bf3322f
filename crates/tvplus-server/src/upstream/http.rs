// SPDX-License-Identifier: Apache-2.0

use super::{sha256_hex, CatalogFetch, ChannelSource, EpgStream, UpstreamError};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{instrument, warn};
use tvplus_model::AppCatalog;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 200,
        }
    }
}

pub struct HttpChannelSource {
    app_url: String,
    epg_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl HttpChannelSource {
    #[must_use]
    pub fn new(app_url: String, epg_url: String, timeout: Duration, retry: RetryPolicy) -> Self {
        // No client-wide total timeout: guide downloads stream for longer than
        // a catalog request is allowed to take.
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .user_agent(concat!("tvplus-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            app_url,
            epg_url,
            timeout,
            retry,
            client,
        }
    }

    async fn backoff(&self, attempt: usize) {
        tokio::time::sleep(Duration::from_millis(
            self.retry.base_backoff_ms.saturating_mul(attempt as u64),
        ))
        .await;
    }
}

#[async_trait]
impl ChannelSource for HttpChannelSource {
    fn source_tag(&self) -> &'static str {
        "http"
    }

    #[instrument(name = "upstream_fetch_catalog", skip(self))]
    async fn fetch_catalog(&self, if_none_match: Option<&str>) -> Result<CatalogFetch, UpstreamError> {
        let url = self.app_url.as_str();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut req = self.client.get(url).timeout(self.timeout);
            if let Some(tag) = if_none_match {
                req = req.header(IF_NONE_MATCH, tag);
            }
            match req.send().await {
                Ok(resp) if resp.status() == StatusCode::NOT_MODIFIED => {
                    return Ok(CatalogFetch::NotModified);
                }
                Ok(resp) if resp.status().is_success() => {
                    let header_etag = resp
                        .headers()
                        .get(ETAG)
                        .and_then(|v| v.to_str().ok())
                        .map(ToString::to_string);
                    let bytes = match resp.bytes().await {
                        Ok(bytes) => bytes,
                        Err(e) if attempt >= self.retry.max_attempts => {
                            return Err(UpstreamError::Body(e.to_string()));
                        }
                        Err(e) => {
                            warn!(attempt, error = %e, "catalog body read retry");
                            self.backoff(attempt).await;
                            continue;
                        }
                    };
                    let etag = header_etag.unwrap_or_else(|| sha256_hex(&bytes));
                    // Servers without ETag support answer 200 every time.
                    if if_none_match == Some(etag.as_str()) {
                        return Ok(CatalogFetch::NotModified);
                    }
                    let catalog = AppCatalog::from_slice(&bytes)?;
                    return Ok(CatalogFetch::Updated { etag, catalog });
                }
                Ok(resp) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(UpstreamError::Status {
                            url: url.to_string(),
                            status: resp.status().as_u16(),
                        });
                    }
                    warn!(attempt, status = resp.status().as_u16(), "catalog fetch retry");
                }
                Err(e) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(UpstreamError::Request {
                            url: url.to_string(),
                            message: e.to_string(),
                        });
                    }
                    warn!(attempt, error = %e, "catalog fetch retry");
                }
            }
            self.backoff(attempt).await;
        }
    }

    #[instrument(name = "upstream_open_epg", skip(self))]
    async fn open_epg(&self) -> Result<EpgStream, UpstreamError> {
        // Only the wait for response headers is bounded; the body may stream
        // for as long as the guide takes to download.
        let resp = tokio::time::timeout(self.timeout, self.client.get(&self.epg_url).send())
            .await
            .map_err(|_| UpstreamError::Request {
                url: self.epg_url.clone(),
                message: format!("no response within {}ms", self.timeout.as_millis()),
            })?
            .map_err(|e| UpstreamError::Request {
                url: self.epg_url.clone(),
                message: e.to_string(),
            })?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        Ok(EpgStream {
            status: resp.status().as_u16(),
            content_type,
            body: resp
                .bytes_stream()
                .map_err(|e| UpstreamError::Body(e.to_string()))
                .boxed(),
        })
    }
}
