// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tvplus_model::{AppCatalog, ValidationError};

pub(crate) mod fake;
pub(crate) mod http;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UpstreamError {
    #[error("upstream request failed url={url}: {message}")]
    Request { url: String, message: String },
    #[error("upstream returned status={status} url={url}")]
    Status { url: String, status: u16 },
    #[error("upstream body read failed: {0}")]
    Body(String),
    #[error(transparent)]
    Catalog(#[from] ValidationError),
}

pub enum CatalogFetch {
    NotModified,
    Updated { etag: String, catalog: AppCatalog },
}

/// An open guide download. The body is streamed straight to the client.
pub struct EpgStream {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: BoxStream<'static, Result<Bytes, UpstreamError>>,
}

#[async_trait]
pub trait ChannelSource: Send + Sync + 'static {
    fn source_tag(&self) -> &'static str;
    async fn fetch_catalog(&self, if_none_match: Option<&str>) -> Result<CatalogFetch, UpstreamError>;
    async fn open_epg(&self) -> Result<EpgStream, UpstreamError>;
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
