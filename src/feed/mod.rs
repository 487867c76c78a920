//! Upstream feed fetchers and the watermark reconciliation they feed into.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::Quota;
use governor::RateLimiter;
use governor::clock::QuantaClock;
use governor::state::InMemoryState;
use governor::state::direct::NotKeyed;
use log::debug;
use log::info;
use wreq::Client;
use wreq::header::HeaderMap;
use wreq::header::HeaderValue;
use wreq::header::USER_AGENT;

use crate::feed::error::FeedError;

pub mod error;
pub mod jnovel_platform;
pub mod mangadex_platform;
pub mod nyaa_platform;
pub mod reconcile;
pub mod syndication;

/// An upstream item that can be compared against a stored watermark.
pub trait FeedEntry {
    /// Stable upstream identifier, stored as the subscription watermark.
    fn entry_id(&self) -> &str;
}

/// Whether every whitespace separated token of `query` occurs in `title`,
/// ignoring case.
pub fn matches_query(title: &str, query: &str) -> bool {
    let title = title.to_lowercase();
    query
        .split_whitespace()
        .all(|token| title.contains(&token.to_lowercase()))
}

#[derive(Clone, Debug)]
pub struct PlatformInfo {
    /// The name of the platform, e.g. "MangaDex"
    pub name: String,
    /// https://api.platform.tld
    pub api_url: String,
}

/// HTTP plumbing shared by every platform: one client, one rate limiter.
pub struct BasePlatform {
    pub info: PlatformInfo,
    client: Client,
    limiter: RateLimiter<NotKeyed, InMemoryState, QuantaClock>,
}

impl BasePlatform {
    pub fn new(
        info: PlatformInfo,
        requests_per_second: u32,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("clubhouse/", env!("CARGO_PKG_VERSION"))),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            info,
            client,
            limiter: RateLimiter::direct(Quota::per_second(rate)),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Sends a request once the rate limiter allows it and rejects non-2xx responses.
    pub async fn send(&self, request: wreq::RequestBuilder) -> Result<wreq::Response, FeedError> {
        if self.limiter.check().is_err() {
            info!("Source {} is ratelimited. Waiting...", self.info.name);
        }
        self.limiter.until_ready().await;

        let req = request.build()?;
        let url = req.url().to_string();
        debug!("Making request to: {url}");
        let response = self.client.execute(req).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response)
    }

    pub async fn get_text(&self, request: wreq::RequestBuilder) -> Result<String, FeedError> {
        Ok(self.send(request).await?.text().await?)
    }

    pub async fn get_bytes(&self, request: wreq::RequestBuilder) -> Result<Vec<u8>, FeedError> {
        Ok(self.send(request).await?.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_query_all_tokens_present() {
        assert!(matches_query("Show Name S01E02 1080p", "show name s01"));
    }

    #[test]
    fn test_matches_query_missing_token() {
        assert!(!matches_query("Show Name S01E02 1080p", "show name s02"));
    }

    #[test]
    fn test_matches_query_tokens_in_any_order() {
        assert!(matches_query("[Group] Show Name - 05 (1080p)", "1080p group show"));
    }

    #[test]
    fn test_matches_query_empty_query_matches_everything() {
        assert!(matches_query("Anything", "   "));
    }
}
