//! Concrete identification backends.
//!
//! Each submodule wraps a single external API and implements
//! [`NameResolver`](super::NameResolver) or
//! [`MetadataCatalog`](super::MetadataCatalog).

pub mod cinemeta;
pub mod imdb;

pub use cinemeta::CinemetaCatalog;
pub use imdb::ImdbSuggestResolver;
