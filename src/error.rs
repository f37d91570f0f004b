//! Failure taxonomy for the ingestion pipeline.
//!
//! None of these are fatal: each is logged where it happens and the pipeline
//! continues with placeholders or the next fallback.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The title could not be resolved to a catalog id.
    #[error("identification failed for {title:?}: {reason}")]
    Identification { title: String, reason: String },

    /// The catalog lookup for a resolved id failed or returned nothing.
    #[error("metadata fetch failed for {catalog_id}: {reason}")]
    MetadataFetch { catalog_id: String, reason: String },

    /// Searching or downloading from the subtitle archive failed.
    #[error("subtitle fetch failed: {0}")]
    SubtitleFetch(String),

    /// The transcriber did not produce a caption file.
    #[error("transcription failed: {0}")]
    Transcription(String),

    /// A downloaded archive could not be unpacked.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Processing a queued path failed outright.
    #[error("failed to process {path}: {reason}")]
    QueueItem { path: String, reason: String },
}

impl IngestError {
    pub fn identification(title: &str, err: impl std::fmt::Display) -> Self {
        Self::Identification {
            title: title.to_string(),
            reason: err.to_string(),
        }
    }

    pub fn metadata_fetch(catalog_id: &str, err: impl std::fmt::Display) -> Self {
        Self::MetadataFetch {
            catalog_id: catalog_id.to_string(),
            reason: err.to_string(),
        }
    }

    /// Format an `anyhow` chain on one line, the way the pipeline logs it.
    pub(crate) fn chain(err: &anyhow::Error) -> String {
        format!("{err:#}")
    }
}
