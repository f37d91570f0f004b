//! Trait definitions and the metadata bag shared by catalog backends.

use async_trait::async_trait;
use cinecache_common::MediaType;
use serde::{Deserialize, Deserializer, Serialize};

/// Description text used when no catalog metadata is available.
pub const PLACEHOLDER_DESCRIPTION: &str = "not found";

/// Metadata for a title as returned by a catalog.
///
/// The display fields are always present (empty when unknown). Any other
/// fields the catalog returns (cast, genres, ratings, ...) are kept verbatim
/// in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,

    #[serde(rename = "type", default)]
    pub media_type: MediaType,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub poster: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub background: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub logo: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Metadata {
    /// The bag used when identification or the catalog lookup fails.
    pub fn placeholder(title: &str) -> Self {
        Self {
            name: title.to_string(),
            media_type: MediaType::Movie,
            description: PLACEHOLDER_DESCRIPTION.to_string(),
            poster: String::new(),
            background: String::new(),
            logo: String::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.description == PLACEHOLDER_DESCRIPTION && self.extra.is_empty()
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Resolves a clean title to an external catalog id.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Short, lowercase identifier (e.g. `"imdb"`).
    fn name(&self) -> &'static str;

    /// Return the best catalog id for `title`, or `None` when nothing matches.
    ///
    /// `kind` is a hint used to prefer results of the matching content type.
    async fn resolve(&self, title: &str, kind: MediaType) -> anyhow::Result<Option<String>>;
}

/// Fetches metadata for a catalog id.
#[async_trait]
pub trait MetadataCatalog: Send + Sync {
    fn name(&self) -> &'static str;

    /// Return metadata for `catalog_id`, or `None` when the catalog has no
    /// usable record.
    async fn fetch_meta(
        &self,
        catalog_id: &str,
        kind: MediaType,
    ) -> anyhow::Result<Option<Metadata>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_fields() {
        let meta = Metadata::placeholder("Show");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Show",
                "type": "movie",
                "description": "not found",
                "poster": "",
                "background": "",
                "logo": "",
            })
        );
        assert!(meta.is_placeholder());
    }

    #[test]
    fn deserialize_keeps_extra_fields_and_tolerates_nulls() {
        let meta: Metadata = serde_json::from_value(serde_json::json!({
            "name": "The Matrix",
            "type": "movie",
            "description": null,
            "poster": "https://img/poster.jpg",
            "cast": ["Keanu Reeves"],
            "imdbRating": "8.7",
        }))
        .unwrap();

        assert_eq!(meta.name, "The Matrix");
        assert_eq!(meta.description, "");
        assert_eq!(meta.logo, "");
        assert_eq!(meta.extra["cast"][0], "Keanu Reeves");
        assert!(!meta.is_placeholder());

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["imdbRating"], "8.7");
    }
}
