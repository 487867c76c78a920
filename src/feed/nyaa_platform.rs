//! Nyaa torrent index integration.

use std::time::Duration;

use log::debug;
use rss::Item;

use crate::feed::BasePlatform;
use crate::feed::FeedEntry;
use crate::feed::PlatformInfo;
use crate::feed::error::FeedError;
use crate::feed::matches_query;
use crate::feed::syndication::read_channel;

const TRACKERS: [&str; 5] = [
    "http://nyaa.tracker.wf:7777/announce",
    "udp://open.stealth.si:80/announce",
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://exodus.desync.com:6969/announce",
    "udp://tracker.torrent.eu.org:451/announce",
];

/// One torrent entry of the Nyaa RSS feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TorrentItem {
    /// View page URL, also the RSS guid.
    pub id: String,
    pub title: String,
    /// Direct `.torrent` download link.
    pub link: String,
    pub info_hash: String,
    pub category: String,
    pub size: String,
}

impl FeedEntry for TorrentItem {
    fn entry_id(&self) -> &str {
        &self.id
    }
}

impl TorrentItem {
    pub fn magnet_link(&self) -> String {
        magnet_link(&self.info_hash, &self.title)
    }
}

/// Builds a magnet URI with the display name and the well-known Nyaa trackers.
pub fn magnet_link(info_hash: &str, title: &str) -> String {
    let name = url::form_urlencoded::byte_serialize(title.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    let mut magnet = format!("magnet:?xt=urn:btih:{info_hash}&dn={name}");
    for tracker in TRACKERS {
        magnet.push_str("&tr=");
        magnet.extend(url::form_urlencoded::byte_serialize(tracker.as_bytes()));
    }
    magnet
}

pub struct NyaaPlatform {
    pub base: BasePlatform,
}

impl NyaaPlatform {
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        let info = PlatformInfo {
            name: "Nyaa".to_string(),
            api_url: "https://nyaa.si".to_string(),
        };
        Ok(Self {
            base: BasePlatform::new(info, 1, timeout)?,
        })
    }

    /// Fetches the recent window of the index, newest first.
    pub async fn fetch_recent(&self) -> Result<Vec<TorrentItem>, FeedError> {
        debug!("Fetching recent torrents from {}", self.base.info.name);
        let request = self
            .base
            .client()
            .get(format!("{}/", self.base.info.api_url))
            .query(&[("page", "rss")]);
        let body = self.base.get_text(request).await?;
        parse_rss(&body)
    }
}

/// Keeps items whose title matches `query`, preserving order.
pub fn filter_matching(items: Vec<TorrentItem>, query: &str) -> Vec<TorrentItem> {
    items
        .into_iter()
        .filter(|item| matches_query(&item.title, query))
        .collect()
}

fn nyaa_extension(item: &Item, name: &str) -> Option<String> {
    item.extensions()
        .get("nyaa")
        .and_then(|ext| ext.get(name))
        .and_then(|values| values.first())
        .and_then(|value| value.value())
        .map(str::to_string)
}

pub fn parse_rss(body: &str) -> Result<Vec<TorrentItem>, FeedError> {
    let channel = read_channel(body)?;

    channel
        .items()
        .iter()
        .map(|item| {
            let id = item
                .guid()
                .map(|g| g.value().to_string())
                .ok_or_else(|| FeedError::MissingField {
                    field: "item.guid".to_string(),
                })?;
            let info_hash =
                nyaa_extension(item, "infoHash").ok_or_else(|| FeedError::MissingField {
                    field: "nyaa:infoHash".to_string(),
                })?;
            Ok(TorrentItem {
                id,
                title: item.title().unwrap_or_default().to_string(),
                link: item.link().unwrap_or_default().to_string(),
                info_hash,
                category: nyaa_extension(item, "category").unwrap_or_default(),
                size: nyaa_extension(item, "size").unwrap_or_default(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss xmlns:atom="http://www.w3.org/2005/Atom" xmlns:nyaa="https://nyaa.si/xmlns/nyaa" version="2.0">
  <channel>
    <title>Nyaa - Home - Torrent File RSS</title>
    <description>RSS Feed for Home</description>
    <link>https://nyaa.si/</link>
    <item>
      <title>[Group] Show Name - S01E02 (1080p)</title>
      <link>https://nyaa.si/download/2.torrent</link>
      <guid isPermaLink="true">https://nyaa.si/view/2</guid>
      <nyaa:infoHash>bbbb</nyaa:infoHash>
      <nyaa:category>Anime - English-translated</nyaa:category>
      <nyaa:size>1.4 GiB</nyaa:size>
    </item>
    <item>
      <title>Other Show - 01 (720p)</title>
      <link>https://nyaa.si/download/1.torrent</link>
      <guid isPermaLink="true">https://nyaa.si/view/1</guid>
      <nyaa:infoHash>aaaa</nyaa:infoHash>
      <nyaa:category>Anime - Raw</nyaa:category>
      <nyaa:size>300.0 MiB</nyaa:size>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss_reads_nyaa_extensions() {
        let items = parse_rss(FEED).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "https://nyaa.si/view/2");
        assert_eq!(items[0].link, "https://nyaa.si/download/2.torrent");
        assert_eq!(items[0].info_hash, "bbbb");
        assert_eq!(items[0].category, "Anime - English-translated");
        assert_eq!(items[0].size, "1.4 GiB");
    }

    #[test]
    fn test_filter_matching_keeps_order() {
        let items = parse_rss(FEED).unwrap();
        let matching = filter_matching(items, "show 1080p");
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, "https://nyaa.si/view/2");
    }

    #[test]
    fn test_magnet_link_encodes_name_and_trackers() {
        let magnet = magnet_link("abc123", "Show Name - 01");
        assert!(magnet.starts_with("magnet:?xt=urn:btih:abc123&dn=Show%20Name%20-%2001&tr="));
        assert!(magnet.contains("&tr=udp%3A%2F%2Ftracker.opentrackr.org%3A1337%2Fannounce"));
        assert_eq!(magnet.matches("&tr=").count(), TRACKERS.len());
    }
}
