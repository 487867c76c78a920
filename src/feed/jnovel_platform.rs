//! J-Novel Club light-novel platform integration.

use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::feed::BasePlatform;
use crate::feed::PlatformInfo;
use crate::feed::error::FeedError;
use crate::feed::matches_query;
use crate::feed::syndication;
use crate::feed::syndication::SyndicationEntry;

const PAGE_SIZE: u32 = 100;

/// A series from the J-Novel catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Series {
    /// Legacy id, the one the per-series feed is keyed by.
    pub id: String,
    pub title: String,
    pub description: String,
    pub cover: Option<String>,
}

#[derive(Deserialize)]
struct SeriesPage {
    series: Vec<SeriesJson>,
    pagination: Pagination,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesJson {
    legacy_id: String,
    title: String,
    #[serde(default)]
    description: String,
    cover: Option<CoverJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoverJson {
    cover_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    last_page: bool,
}

pub struct JNovelPlatform {
    pub base: BasePlatform,
}

impl JNovelPlatform {
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        let info = PlatformInfo {
            name: "J-Novel Club".to_string(),
            api_url: "https://labs.j-novel.club".to_string(),
        };
        Ok(Self {
            base: BasePlatform::new(info, 5, timeout)?,
        })
    }

    async fn fetch_series_page(&self, page: u32) -> Result<SeriesPage, FeedError> {
        let skip = (page * PAGE_SIZE).to_string();
        let limit = PAGE_SIZE.to_string();
        let request = self
            .base
            .client()
            .get(format!("{}/app/v1/series", self.base.info.api_url))
            .query(&[
                ("format", "json"),
                ("skip", skip.as_str()),
                ("limit", limit.as_str()),
            ]);
        let body = self.base.get_text(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Walks every page of the catalog.
    pub async fn fetch_all_series(&self) -> Result<Vec<Series>, FeedError> {
        let mut results = Vec::new();
        let mut page = 0;

        loop {
            let data = self.fetch_series_page(page).await?;
            results.extend(data.series.into_iter().map(|s| Series {
                id: s.legacy_id,
                title: s.title,
                description: s.description,
                cover: s.cover.and_then(|c| c.cover_url),
            }));

            if data.pagination.last_page {
                debug!("Fetched {} series over {} pages", results.len(), page + 1);
                return Ok(results);
            }
            page += 1;
        }
    }

    /// Series whose title contains every token of `query`.
    pub async fn search(&self, query: &str) -> Result<Vec<Series>, FeedError> {
        Ok(self
            .fetch_all_series()
            .await?
            .into_iter()
            .filter(|s| matches_query(&s.title, query))
            .collect())
    }

    /// Entries of one series feed, newest first.
    pub async fn fetch_latest(&self, series: &str) -> Result<Vec<SyndicationEntry>, FeedError> {
        debug!("Fetching latest from {} for series: {series}", self.base.info.name);
        let request = self
            .base
            .client()
            .get(format!("{}/feed/series/{series}.rss", self.base.info.api_url));
        let body = self.base.get_text(request).await?;
        syndication::parse(&body)
    }
}
