//! Cinecache-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across cinecache:
//!
//! - **Cache IDs**: The [`CacheId`] key shared by the movie and subtitle caches
//! - **Core Types**: [`MediaType`] and [`EpisodeRef`]
//! - **Path Utilities**: Functions to detect media and caption files by extension
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use cinecache_common::{CacheId, EpisodeRef, Error, Result};
//! use cinecache_common::paths::is_media_file;
//! use std::path::Path;
//!
//! let id = CacheId::from_catalog("tt0944947").with_episode(EpisodeRef::new(2, 5));
//! assert_eq!(id.as_str(), "tt0944947:2:5");
//!
//! assert!(is_media_file(Path::new("movie.mkv")));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("title"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
