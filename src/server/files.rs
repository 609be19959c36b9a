//! By-name artifact file serving.

use std::path::Path;

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use super::error::ApiError;

/// Content type for a served artifact, by extension.
pub fn content_type_of(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("wav") => "audio/wav",
        Some("mp4") => "video/mp4",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("srt") => "text/plain; charset=utf-8",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// Whether a caller-supplied filename is safe to resolve inside the
/// artifact directories.
///
/// Rejects separators and parent references outright; artifact names are
/// always `{hex key}.{ext}`-shaped, so anything fancier is hostile.
pub fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains("..")
}

/// Stream a named artifact from the first directory that has it.
pub async fn serve_from_dirs(dirs: &[&Path], filename: &str) -> Result<Response, ApiError> {
    if !is_safe_filename(filename) {
        return Err(ApiError::not_found("artifact not found"));
    }

    for dir in dirs {
        let path = dir.join(filename);
        if let Ok(file) = tokio::fs::File::open(&path).await {
            let stream = ReaderStream::new(file);
            return Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type_of(filename)),
                    (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
                ],
                Body::from_stream(stream),
            )
                .into_response());
        }
    }
    Err(ApiError::not_found(format!("artifact not found: {filename}")))
}
