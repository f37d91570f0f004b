//! cinecache - a self-hosted movie and subtitle cache
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod error;
pub mod http;
pub mod ingest;
pub mod library;
pub mod metadata;
pub mod server;
pub mod streaming;
pub mod subtitles;
pub mod tools;
pub mod watch;
