// SPDX-License-Identifier: Apache-2.0

use crate::upstream::UpstreamError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tvplus_playlist::PlaylistError;

/// Plain-text failure body, `Error: <message>`.
#[must_use]
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    let mut resp = (status, format!("Error: {message}")).into_response();
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    resp
}

#[must_use]
pub(crate) fn upstream_error_response(err: &UpstreamError) -> Response {
    tracing::error!(error = %err, "upstream failure");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
}

#[must_use]
pub(crate) fn playlist_error_response(err: &PlaylistError) -> Response {
    match err {
        PlaylistError::InvalidParameter { .. } => {
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
        _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

#[must_use]
pub(crate) fn with_content_type(mut resp: Response, content_type: &'static str) -> Response {
    resp.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    resp
}
