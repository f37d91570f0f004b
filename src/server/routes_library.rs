//! Library, subtitle and caption file routes.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use cinecache_common::paths::caption_content_type;
use cinecache_common::Error;
use serde::Deserialize;
use tracing::debug;

use super::auth::AccessCodeQuery;
use super::AppContext;
use crate::library::{MovieEntry, SubtitleRecord};
use crate::subtitles::resolve_caption_file;

/// Create library routes.
pub fn library_routes() -> Router<AppContext> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/:id", get(get_movie))
        .route("/subtitles/:id", get(list_subtitles))
        .route("/subtitle-file", get(subtitle_file))
}

#[derive(Debug, Deserialize)]
pub struct SubtitleFileQuery {
    pub path: Option<String>,
}

async fn list_movies(State(ctx): State<AppContext>) -> Json<Vec<MovieEntry>> {
    Json(ctx.library.movies())
}

async fn get_movie(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<MovieEntry>, StatusCode> {
    ctx.library.movie(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Subtitle records for a title; an empty list when none are cached.
async fn list_subtitles(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Query(access): Query<AccessCodeQuery>,
) -> Json<Vec<SubtitleRecord>> {
    let mut records = ctx
        .library
        .subtitles(&id)
        .map(|entry| entry.records)
        .unwrap_or_default();

    if let Some(code) = access.code.as_deref().filter(|c| !c.is_empty()) {
        let encoded = urlencoding::encode(code);
        for record in &mut records {
            let sep = if record.url.contains('?') { '&' } else { '?' };
            record.url = format!("{}{}code={}", record.url, sep, encoded);
        }
    }

    Json(records)
}

async fn subtitle_file(
    State(ctx): State<AppContext>,
    Query(query): Query<SubtitleFileQuery>,
) -> Response {
    let requested = query.path.unwrap_or_default();
    let path = match resolve_caption_file(&ctx.config.library.subtitles_dir, &requested) {
        Ok(path) => path,
        Err(e) => {
            debug!(path = %requested, error = %e, "Rejected caption file request");
            return (error_status(&e), e.to_string()).into_response();
        }
    };

    let content_type = caption_content_type(&path).unwrap_or("text/srt");
    let disposition = content_disposition(&path);

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read caption file");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `inline; filename="<name>"`, or bare `inline` when the name is not a
/// valid header value.
fn content_disposition(path: &std::path::Path) -> HeaderValue {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| format!("inline; filename=\"{}\"", name.replace('"', "\\\"")))
        .and_then(|value| HeaderValue::from_str(&value).ok())
        .unwrap_or(HeaderValue::from_static("inline"))
}

fn error_status(error: &Error) -> StatusCode {
    match error {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::Forbidden(_) => StatusCode::FORBIDDEN,
        Error::Io(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(error_status(&Error::not_found("x")), StatusCode::NOT_FOUND);
        assert_eq!(error_status(&Error::invalid_input("x")), StatusCode::BAD_REQUEST);
        assert_eq!(error_status(&Error::forbidden("x")), StatusCode::FORBIDDEN);
        assert_eq!(
            error_status(&Error::internal("x")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_content_disposition_names_file() {
        assert_eq!(
            content_disposition(std::path::Path::new("/subs/Film/tt1.en.srt")),
            "inline; filename=\"tt1.en.srt\""
        );
        assert_eq!(
            content_disposition(std::path::Path::new("/subs/Film/say \"hi\".srt")),
            "inline; filename=\"say \\\"hi\\\".srt\""
        );
    }
}
