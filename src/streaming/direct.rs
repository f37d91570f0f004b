//! Direct streaming with HTTP range requests.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use std::io::SeekFrom;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::server::AppContext;

/// Outcome of interpreting a `Range` header against a file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// Inclusive byte range inside the file.
    Partial { start: u64, end: u64 },
    /// Start or end falls at or past the end of the file.
    Unsatisfiable,
}

/// Serve a cached title's media file with range request support.
pub async fn stream_title(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    let entry = ctx.library.movie(&id).ok_or(StatusCode::NOT_FOUND)?;
    let file_path = entry.path.as_path();

    let metadata = tokio::fs::metadata(file_path)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    let file_size = metadata.len();

    let range = headers
        .get(header::RANGE)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| parse_range_header(s, file_size));

    let content_type = determine_content_type(
        file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default(),
    );

    match range {
        Some(ByteRange::Unsatisfiable) => {
            debug!(id = %id, file_size, "Unsatisfiable range");
            Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{}", file_size))
                .body(Body::empty())
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
        }
        Some(ByteRange::Partial { start, end }) => {
            let length = end - start + 1;

            let mut file = File::open(file_path)
                .await
                .map_err(|_| StatusCode::NOT_FOUND)?;

            file.seek(SeekFrom::Start(start))
                .await
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

            let body = Body::from_stream(ReaderStream::new(file.take(length)));

            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, length.to_string())
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", start, end, file_size),
                )
                .header(header::ACCEPT_RANGES, "bytes")
                .body(body)
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
        }
        None => {
            let file = File::open(file_path)
                .await
                .map_err(|_| StatusCode::NOT_FOUND)?;

            let body = Body::from_stream(ReaderStream::new(file));

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, file_size.to_string())
                .header(header::ACCEPT_RANGES, "bytes")
                .body(body)
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Parse an HTTP `Range` header.
///
/// Supports `bytes=0-499`, `bytes=500-` and `bytes=-500` (last 500 bytes).
/// Returns `None` for headers that cannot be parsed, which callers treat as
/// a request for the whole file.
pub fn parse_range_header(header: &str, file_size: u64) -> Option<ByteRange> {
    let spec = header.trim().strip_prefix("bytes=")?;

    // Only the first range of a multi-range request is honoured.
    let spec = spec.split(',').next()?;
    let (start, end) = spec.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());

    match (start.is_empty(), end.is_empty()) {
        (true, false) => {
            let suffix_len: u64 = end.parse().ok()?;
            if suffix_len == 0 || file_size == 0 {
                return Some(ByteRange::Unsatisfiable);
            }
            Some(ByteRange::Partial {
                start: file_size.saturating_sub(suffix_len),
                end: file_size - 1,
            })
        }
        (false, true) => {
            let start: u64 = start.parse().ok()?;
            if start >= file_size {
                return Some(ByteRange::Unsatisfiable);
            }
            Some(ByteRange::Partial {
                start,
                end: file_size - 1,
            })
        }
        (false, false) => {
            let start: u64 = start.parse().ok()?;
            let end: u64 = end.parse().ok()?;
            if start > end {
                return None;
            }
            if start >= file_size || end >= file_size {
                return Some(ByteRange::Unsatisfiable);
            }
            Some(ByteRange::Partial { start, end })
        }
        (true, true) => None,
    }
}

/// Content type from a container extension.
pub fn determine_content_type(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(start: u64, end: u64) -> Option<ByteRange> {
        Some(ByteRange::Partial { start, end })
    }

    #[test]
    fn test_parse_range_header_full_range() {
        assert_eq!(parse_range_header("bytes=0-499", 1000), partial(0, 499));
        assert_eq!(parse_range_header("bytes=500-999", 1000), partial(500, 999));
    }

    #[test]
    fn test_parse_range_header_open_end() {
        assert_eq!(parse_range_header("bytes=500-", 1000), partial(500, 999));
    }

    #[test]
    fn test_parse_range_header_suffix() {
        assert_eq!(parse_range_header("bytes=-200", 1000), partial(800, 999));
        assert_eq!(parse_range_header("bytes=-5000", 1000), partial(0, 999));
    }

    #[test]
    fn test_parse_range_header_past_end() {
        assert_eq!(
            parse_range_header("bytes=1000-", 1000),
            Some(ByteRange::Unsatisfiable)
        );
        assert_eq!(
            parse_range_header("bytes=0-1000", 1000),
            Some(ByteRange::Unsatisfiable)
        );
        assert_eq!(
            parse_range_header("bytes=1500-1600", 1000),
            Some(ByteRange::Unsatisfiable)
        );
    }

    #[test]
    fn test_parse_range_header_invalid_format() {
        assert_eq!(parse_range_header("bytes=-", 1000), None);
        assert_eq!(parse_range_header("bytes=abc-def", 1000), None);
        assert_eq!(parse_range_header("items=0-10", 1000), None);
        assert_eq!(parse_range_header("bytes=10-5", 1000), None);
    }

    #[test]
    fn test_parse_range_header_multi_range_uses_first() {
        assert_eq!(parse_range_header("bytes=0-9, 20-29", 1000), partial(0, 9));
    }

    #[test]
    fn test_determine_content_type() {
        assert_eq!(determine_content_type("mp4"), "video/mp4");
        assert_eq!(determine_content_type("MKV"), "video/x-matroska");
        assert_eq!(determine_content_type("webm"), "video/webm");
        assert_eq!(determine_content_type("unknown"), "application/octet-stream");
    }
}
