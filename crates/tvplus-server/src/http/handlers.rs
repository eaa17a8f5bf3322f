// SPDX-License-Identifier: Apache-2.0

use crate::http::response::{
    error_response, playlist_error_response, upstream_error_response, with_content_type,
};
use crate::http::status_page::render_status_page;
use crate::AppState;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use tracing::{info, warn};
use tvplus_playlist::{render_playlist, PlaylistRequest};

pub const PLAYLIST_PATH: &str = "/playlist.m3u8";
pub const EPG_PATH: &str = "/epg.xml.gz";
pub const FAVICON_PATH: &str = "/favicon.ico";

pub(crate) const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
pub(crate) const EPG_CONTENT_TYPE: &str = "application/gzip";

pub(crate) async fn playlist_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let request = match PlaylistRequest::from_params(&params, &state.config.playlist_defaults) {
        Ok(r) => r,
        Err(e) => return playlist_error_response(&e),
    };
    let catalog = match state.catalog.current().await {
        Ok(c) => c,
        Err(e) => return upstream_error_response(&e),
    };
    let playlist = render_playlist(&catalog, &request);
    info!(
        emitted = playlist.summary.emitted,
        skipped_unplayable = playlist.summary.skipped_unplayable,
        skipped_include_exclude = playlist.summary.skipped_include_exclude,
        skipped_group = playlist.summary.skipped_group,
        "playlist rendered"
    );
    with_content_type(
        (StatusCode::OK, playlist.body).into_response(),
        PLAYLIST_CONTENT_TYPE,
    )
}

pub(crate) async fn epg_handler(State(state): State<AppState>) -> Response {
    let epg = match state.source.open_epg().await {
        Ok(epg) => epg,
        Err(e) => return upstream_error_response(&e),
    };
    let status = StatusCode::from_u16(epg.status).unwrap_or(StatusCode::BAD_GATEWAY);
    if !status.is_success() {
        warn!(status = epg.status, "guide upstream returned non-success status");
    }
    let mut resp = Response::new(Body::from_stream(epg.body));
    *resp.status_mut() = status;
    with_content_type(resp, EPG_CONTENT_TYPE)
}

pub(crate) async fn status_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let catalog = match state.catalog.current().await {
        Ok(c) => c,
        Err(e) => return upstream_error_response(&e),
    };
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .unwrap_or("localhost");
    with_content_type(
        (StatusCode::OK, render_status_page(&catalog, host)).into_response(),
        "text/html; charset=utf-8",
    )
}

pub(crate) async fn favicon_handler(State(state): State<AppState>) -> Response {
    match tokio::fs::read(&state.config.favicon_path).await {
        Ok(bytes) => with_content_type((StatusCode::OK, bytes).into_response(), "image/x-icon"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

pub(crate) async fn healthz_handler() -> Response {
    (StatusCode::OK, "ok").into_response()
}

pub(crate) async fn readyz_handler(State(state): State<AppState>) -> Response {
    let accepting = state.accepting_requests.load(Ordering::Relaxed);
    let catalog_ready =
        !state.config.readiness_requires_catalog || state.catalog.has_catalog().await;
    if accepting && catalog_ready {
        (StatusCode::OK, "ready").into_response()
    } else {
        let mut resp = (StatusCode::SERVICE_UNAVAILABLE, "not-ready").into_response();
        resp.headers_mut()
            .insert("retry-after", HeaderValue::from_static("3"));
        resp
    }
}

/// Paths with extra segments are routed on their first segment, so
/// `/playlist.m3u8/` and `/epg.xml.gz/guide.xml.gz` still resolve.
pub(crate) async fn first_segment_handler(
    state: State<AppState>,
    query: Query<HashMap<String, String>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let first = uri.path().split('/').nth(1).unwrap_or("");
    match first {
        f if f == PLAYLIST_PATH.trim_start_matches('/') => playlist_handler(state, query).await,
        f if f == EPG_PATH.trim_start_matches('/') => epg_handler(state).await,
        "" => status_handler(state, headers).await,
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}
