//! Title identification against external catalogs.
//!
//! # Module layout
//!
//! - [`provider`] -- [`NameResolver`] and [`MetadataCatalog`] traits and the
//!   [`Metadata`] bag they produce.
//! - [`providers`] -- Concrete implementations (IMDb suggestions, Cinemeta).
//! - [`identify`] -- The [`Identifier`] combining both lookups into one
//!   best-effort operation.

pub mod identify;
pub mod provider;
pub mod providers;

pub use identify::{Identification, Identifier};
pub use provider::{Metadata, MetadataCatalog, NameResolver};
