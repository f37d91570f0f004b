//! Cinemeta metadata catalog.
//!
//! `GET {base}/meta/{movie|series}/{id}.json` returns `{"meta": {...}}`; a
//! record is only accepted when it carries a name.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use cinecache_common::MediaType;
use serde::Deserialize;
use tracing::debug;

use crate::http::ApiClient;
use crate::metadata::provider::{Metadata, MetadataCatalog};

#[derive(Debug, Deserialize)]
struct MetaResponse {
    #[serde(default)]
    meta: Option<serde_json::Value>,
}

pub struct CinemetaCatalog {
    api: ApiClient,
    base_url: String,
}

impl CinemetaCatalog {
    pub fn new(base_url: impl Into<String>, timeout: Duration, per_second: u32) -> anyhow::Result<Self> {
        Ok(Self {
            api: ApiClient::new("cinemeta", timeout, per_second)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn meta_url(&self, catalog_id: &str, kind: MediaType) -> String {
        format!(
            "{}/meta/{}/{}.json",
            self.base_url,
            kind.as_str(),
            urlencoding::encode(catalog_id)
        )
    }
}

#[async_trait]
impl MetadataCatalog for CinemetaCatalog {
    fn name(&self) -> &'static str {
        "cinemeta"
    }

    async fn fetch_meta(
        &self,
        catalog_id: &str,
        kind: MediaType,
    ) -> anyhow::Result<Option<Metadata>> {
        let url = self.meta_url(catalog_id, kind);
        let resp: MetaResponse = self
            .api
            .get(&url)
            .await?
            .json()
            .await
            .context("Failed to parse Cinemeta response")?;

        let Some(meta) = resp.meta else {
            debug!(catalog_id, "Cinemeta returned no meta");
            return Ok(None);
        };

        let has_name = meta
            .get("name")
            .and_then(|n| n.as_str())
            .is_some_and(|n| !n.is_empty());
        if !has_name {
            debug!(catalog_id, "Cinemeta meta has no name");
            return Ok(None);
        }

        let meta: Metadata =
            serde_json::from_value(meta).context("Unexpected Cinemeta meta shape")?;
        Ok(Some(meta))
    }
}
