//! Media streaming.
//!
//! # Routes
//!
//! - `GET /api/stream/{id}` - Direct file streaming with range support

mod direct;

pub use direct::{determine_content_type, parse_range_header, stream_title, ByteRange};

use axum::{routing::get, Router};

use crate::server::AppContext;

/// Create the direct streaming router.
pub fn stream_router() -> Router<AppContext> {
    Router::new().route("/:id", get(stream_title))
}
