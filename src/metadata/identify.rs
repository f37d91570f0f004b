//! Best-effort identification of a parsed file name.

use std::sync::Arc;

use cinecache_common::MediaType;
use cinecache_parser::ParsedName;
use tracing::{debug, warn};

use super::provider::{Metadata, MetadataCatalog, NameResolver};
use crate::error::IngestError;

/// Outcome of [`Identifier::identify`].
///
/// Always carries usable metadata. When a lookup failed, `error` says which
/// one and `meta` holds the placeholder bag.
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    pub catalog_id: Option<String>,
    pub meta: Metadata,
    pub media_type: MediaType,
    pub error: Option<IngestError>,
}

impl Identification {
    fn unresolved(title: &str, error: IngestError) -> Self {
        Self {
            catalog_id: None,
            meta: Metadata::placeholder(title),
            media_type: MediaType::Movie,
            error: Some(error),
        }
    }

    pub fn is_identified(&self) -> bool {
        self.catalog_id.is_some()
    }
}

/// Combines a [`NameResolver`] and a [`MetadataCatalog`].
#[derive(Clone)]
pub struct Identifier {
    resolver: Arc<dyn NameResolver>,
    catalog: Arc<dyn MetadataCatalog>,
}

impl Identifier {
    pub fn new(resolver: Arc<dyn NameResolver>, catalog: Arc<dyn MetadataCatalog>) -> Self {
        Self { resolver, catalog }
    }

    /// Resolve the title, then fetch metadata for the resolved id.
    ///
    /// Series are looked up when the name carried an episode marker. Never
    /// fails: errors degrade to the placeholder bag.
    pub async fn identify(&self, parsed: &ParsedName) -> Identification {
        let title = parsed.title.as_str();
        let media_type = if parsed.is_episode() {
            MediaType::Series
        } else {
            MediaType::Movie
        };

        let catalog_id = match self.resolver.resolve(title, media_type).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                let err = IngestError::identification(title, "no match");
                debug!(title, resolver = self.resolver.name(), "{err}");
                return Identification::unresolved(title, err);
            }
            Err(e) => {
                let err = IngestError::identification(title, IngestError::chain(&e));
                warn!(title, resolver = self.resolver.name(), "{err}");
                return Identification::unresolved(title, err);
            }
        };

        let (meta, error) = match self.catalog.fetch_meta(&catalog_id, media_type).await {
            Ok(Some(meta)) => (meta, None),
            Ok(None) => (
                Metadata::placeholder(title),
                Some(IngestError::metadata_fetch(&catalog_id, "no record")),
            ),
            Err(e) => (
                Metadata::placeholder(title),
                Some(IngestError::metadata_fetch(&catalog_id, IngestError::chain(&e))),
            ),
        };

        if let Some(err) = &error {
            warn!(title, catalog = self.catalog.name(), "{err}");
        }

        Identification {
            catalog_id: Some(catalog_id),
            meta,
            media_type,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cinecache_parser::parse;
    use std::sync::Mutex;

    struct FixedResolver(anyhow::Result<Option<String>>);

    #[async_trait]
    impl NameResolver for FixedResolver {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn resolve(&self, _title: &str, _kind: MediaType) -> anyhow::Result<Option<String>> {
            match &self.0 {
                Ok(id) => Ok(id.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    #[derive(Default)]
    struct RecordingCatalog {
        fail: bool,
        calls: Mutex<Vec<(String, MediaType)>>,
    }

    #[async_trait]
    impl MetadataCatalog for RecordingCatalog {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn fetch_meta(
            &self,
            catalog_id: &str,
            kind: MediaType,
        ) -> anyhow::Result<Option<Metadata>> {
            self.calls.lock().unwrap().push((catalog_id.to_string(), kind));
            if self.fail {
                anyhow::bail!("catalog down");
            }
            let mut meta = Metadata::placeholder("Catalog Name");
            meta.description = "From catalog".into();
            meta.media_type = kind;
            Ok(Some(meta))
        }
    }

    fn identifier(resolver: FixedResolver, catalog: Arc<RecordingCatalog>) -> Identifier {
        Identifier::new(Arc::new(resolver), catalog)
    }

    #[tokio::test]
    async fn episode_marker_selects_series_lookup() {
        let catalog = Arc::new(RecordingCatalog::default());
        let id = identifier(FixedResolver(Ok(Some("tt123".into()))), catalog.clone());

        let result = id.identify(&parse("Show.S01E01.1080p.WEB-DL.x264-GRP")).await;

        assert_eq!(result.catalog_id.as_deref(), Some("tt123"));
        assert_eq!(result.media_type, MediaType::Series);
        assert_eq!(result.meta.description, "From catalog");
        assert!(result.error.is_none());
        assert_eq!(
            catalog.calls.lock().unwrap().as_slice(),
            &[("tt123".to_string(), MediaType::Series)]
        );
    }

    #[tokio::test]
    async fn unresolved_title_gets_placeholder() {
        let catalog = Arc::new(RecordingCatalog::default());
        let id = identifier(FixedResolver(Ok(None)), catalog.clone());

        let result = id.identify(&parse("Unknown.Film.2001.720p")).await;

        assert_eq!(result.catalog_id, None);
        assert_eq!(result.meta, Metadata::placeholder("Unknown Film 2001"));
        assert!(matches!(result.error, Some(IngestError::Identification { .. })));
        assert!(catalog.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn resolver_error_degrades() {
        let catalog = Arc::new(RecordingCatalog::default());
        let id = identifier(FixedResolver(Err(anyhow::anyhow!("timeout"))), catalog);

        let result = id.identify(&parse("Film")).await;
        assert!(!result.is_identified());
        assert!(result.meta.is_placeholder());
        assert!(result.error.unwrap().to_string().contains("timeout"));
    }

    #[tokio::test]
    async fn catalog_failure_keeps_catalog_id() {
        let catalog = Arc::new(RecordingCatalog {
            fail: true,
            ..Default::default()
        });
        let id = identifier(FixedResolver(Ok(Some("tt9".into()))), catalog);

        let result = id.identify(&parse("Film.1999")).await;
        assert_eq!(result.catalog_id.as_deref(), Some("tt9"));
        assert_eq!(result.meta, Metadata::placeholder("Film 1999"));
        assert!(matches!(result.error, Some(IngestError::MetadataFetch { .. })));
    }
}
