//! Rate-limited HTTP client shared by the catalog and archive adapters.
//!
//! - Token-bucket rate limiting via [`governor`].
//! - Automatic retry on HTTP 429 with `Retry-After` support (max 3 retries).

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use tracing::warn;

const MAX_RETRIES: u32 = 3;

pub struct ApiClient {
    client: reqwest::Client,
    rate_limiter: DefaultDirectRateLimiter,
    label: &'static str,
}

impl ApiClient {
    /// Build a client with a per-request timeout and a request rate ceiling.
    pub fn new(label: &'static str, timeout: Duration, per_second: u32) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cinecache/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        let per_second = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Ok(Self {
            client,
            rate_limiter,
            label,
        })
    }

    /// GET with rate limiting and 429 backoff. Non-success statuses are errors.
    pub async fn get(&self, url: &str) -> anyhow::Result<reqwest::Response> {
        self.get_with_timeout(url, None).await
    }

    /// Like [`get`](Self::get) with a timeout overriding the client default.
    pub async fn get_with_timeout(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> anyhow::Result<reqwest::Response> {
        let mut retries = 0u32;
        loop {
            self.rate_limiter.until_ready().await;

            let mut request = self.client.get(url);
            if let Some(timeout) = timeout {
                request = request.timeout(timeout);
            }

            let resp = request
                .send()
                .await
                .with_context(|| format!("{} request failed: {url}", self.label))?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                warn!(
                    service = self.label,
                    retry = retries,
                    wait_secs = wait,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            let resp = resp
                .error_for_status()
                .with_context(|| format!("{} request returned error: {url}", self.label))?;

            return Ok(resp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn retries_after_429() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = ApiClient::new("test", Duration::from_secs(5), 100).unwrap();
        let resp = client
            .get(&format!("{}/limited", server.uri()))
            .await
            .unwrap();
        assert_eq!(resp.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ApiClient::new("test", Duration::from_secs(5), 100).unwrap();
        let err = client.get(&format!("{}/x", server.uri())).await.unwrap_err();
        assert!(err.to_string().contains("test request returned error"));
    }
}
