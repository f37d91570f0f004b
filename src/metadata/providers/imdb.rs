//! IMDb suggestion endpoint name resolver.
//!
//! Queries `GET {base}/{first letter}/{query}.json` and picks the best `tt`
//! id from the returned suggestions.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use cinecache_common::MediaType;
use serde::Deserialize;
use tracing::debug;

use crate::http::ApiClient;
use crate::metadata::provider::NameResolver;

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    #[serde(default)]
    d: Vec<Suggestion>,
}

#[derive(Debug, Clone, Deserialize)]
struct Suggestion {
    id: String,
    /// Display title.
    #[serde(default)]
    l: String,
    /// Content kind, e.g. `movie`, `tvSeries`.
    #[serde(default)]
    qid: Option<String>,
}

impl Suggestion {
    fn is_title(&self) -> bool {
        self.id.starts_with("tt")
    }

    fn matches_kind(&self, kind: MediaType) -> bool {
        match (self.qid.as_deref(), kind) {
            (Some("tvSeries" | "tvMiniSeries" | "tvEpisode"), MediaType::Series) => true,
            (Some("movie" | "tvMovie" | "video" | "short"), MediaType::Movie) => true,
            (None, _) => true,
            _ => false,
        }
    }
}

/// Resolver backed by the public IMDb suggestion JSON endpoint.
pub struct ImdbSuggestResolver {
    api: ApiClient,
    base_url: String,
}

impl ImdbSuggestResolver {
    pub fn new(base_url: impl Into<String>, timeout: Duration, per_second: u32) -> anyhow::Result<Self> {
        Ok(Self {
            api: ApiClient::new("imdb", timeout, per_second)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn suggest_url(&self, title: &str) -> Option<String> {
        let query = title.trim().to_lowercase();
        let first = query.chars().find(|c| c.is_alphanumeric())?;
        Some(format!(
            "{}/{}/{}.json",
            self.base_url,
            first,
            urlencoding::encode(&query)
        ))
    }
}

/// Prefer an exact title match of the right kind, then any result of the
/// right kind, then the first title result.
fn pick(suggestions: &[Suggestion], title: &str, kind: MediaType) -> Option<String> {
    let titles: Vec<&Suggestion> = suggestions.iter().filter(|s| s.is_title()).collect();

    titles
        .iter()
        .find(|s| s.matches_kind(kind) && s.l.eq_ignore_ascii_case(title))
        .or_else(|| titles.iter().find(|s| s.matches_kind(kind)))
        .or_else(|| titles.first())
        .map(|s| s.id.clone())
}

#[async_trait]
impl NameResolver for ImdbSuggestResolver {
    fn name(&self) -> &'static str {
        "imdb"
    }

    async fn resolve(&self, title: &str, kind: MediaType) -> anyhow::Result<Option<String>> {
        let Some(url) = self.suggest_url(title) else {
            return Ok(None);
        };

        let resp: SuggestResponse = self
            .api
            .get(&url)
            .await?
            .json()
            .await
            .context("Failed to parse IMDb suggestion response")?;

        let id = pick(&resp.d, title, kind);
        debug!(title, kind = %kind, id = ?id, candidates = resp.d.len(), "Resolved title");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn suggestion(id: &str, l: &str, qid: &str) -> Suggestion {
        Suggestion {
            id: id.into(),
            l: l.into(),
            qid: Some(qid.into()),
        }
    }

    #[test]
    fn pick_prefers_exact_title_of_matching_kind() {
        let list = vec![
            suggestion("nm0000206", "Keanu Reeves", "actor"),
            suggestion("tt0234215", "The Matrix Reloaded", "movie"),
            suggestion("tt0133093", "The Matrix", "movie"),
        ];
        assert_eq!(
            pick(&list, "the matrix", MediaType::Movie).as_deref(),
            Some("tt0133093")
        );
    }

    #[test]
    fn pick_prefers_kind_over_position() {
        let list = vec![
            suggestion("tt1", "Fargo", "movie"),
            suggestion("tt2", "Fargo", "tvSeries"),
        ];
        assert_eq!(pick(&list, "Fargo", MediaType::Series).as_deref(), Some("tt2"));
        assert_eq!(pick(&list, "Fargo", MediaType::Movie).as_deref(), Some("tt1"));
    }

    #[test]
    fn pick_falls_back_to_first_title() {
        let list = vec![suggestion("tt9", "Something", "podcastSeries")];
        assert_eq!(pick(&list, "x", MediaType::Movie).as_deref(), Some("tt9"));
        assert_eq!(pick(&[], "x", MediaType::Movie), None);
    }

    #[test]
    fn suggest_url_uses_first_alphanumeric() {
        let resolver =
            ImdbSuggestResolver::new("http://example.test/suggestion/", Duration::from_secs(1), 1)
                .unwrap();
        assert_eq!(
            resolver.suggest_url("The Matrix").as_deref(),
            Some("http://example.test/suggestion/t/the%20matrix.json")
        );
        assert_eq!(resolver.suggest_url("  "), None);
    }

    #[tokio::test]
    async fn resolve_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/s/show.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "d": [
                    {"id": "tt123", "l": "Show", "qid": "tvSeries", "y": 2019},
                ],
                "q": "show",
                "v": 1
            })))
            .mount(&server)
            .await;

        let resolver = ImdbSuggestResolver::new(server.uri(), Duration::from_secs(5), 100).unwrap();
        let id = resolver.resolve("Show", MediaType::Series).await.unwrap();
        assert_eq!(id.as_deref(), Some("tt123"));
    }

    #[tokio::test]
    async fn resolve_without_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"q": "zz"})))
            .mount(&server)
            .await;

        let resolver = ImdbSuggestResolver::new(server.uri(), Duration::from_secs(5), 100).unwrap();
        assert_eq!(resolver.resolve("zz", MediaType::Movie).await.unwrap(), None);
    }
}
