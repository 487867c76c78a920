//! RSS and Atom documents flattened into one entry shape.

use std::io::BufReader;

use atom_syndication::Feed;
use rss::Channel;

use crate::feed::FeedEntry;
use crate::feed::error::FeedError;

/// One entry of a syndication feed, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyndicationEntry {
    pub id: String,
    pub title: String,
    pub link: String,
    /// Media enclosure, usually a cover image.
    pub enclosure: Option<String>,
}

impl FeedEntry for SyndicationEntry {
    fn entry_id(&self) -> &str {
        &self.id
    }
}

/// Parses `body` as RSS when it looks like RSS and as Atom otherwise.
pub fn parse(body: &str) -> Result<Vec<SyndicationEntry>, FeedError> {
    if body.contains("<rss") {
        parse_rss(body)
    } else {
        parse_atom(body)
    }
}

pub fn read_channel(body: &str) -> Result<Channel, FeedError> {
    Channel::read_from(BufReader::new(body.as_bytes())).map_err(|e| FeedError::FeedParseFailed {
        message: e.to_string(),
    })
}

fn parse_rss(body: &str) -> Result<Vec<SyndicationEntry>, FeedError> {
    let channel = read_channel(body)?;

    Ok(channel
        .items()
        .iter()
        .filter_map(|item| {
            let link = item.link().unwrap_or_default().to_string();
            let id = item
                .guid()
                .map(|g| g.value().to_string())
                .or_else(|| item.link().map(str::to_string))?;
            Some(SyndicationEntry {
                id,
                title: item.title().unwrap_or("untitled").to_string(),
                link,
                enclosure: item.enclosure().map(|e| e.url().to_string()),
            })
        })
        .collect())
}

fn parse_atom(body: &str) -> Result<Vec<SyndicationEntry>, FeedError> {
    let feed =
        Feed::read_from(BufReader::new(body.as_bytes())).map_err(|e| FeedError::FeedParseFailed {
            message: e.to_string(),
        })?;

    Ok(feed
        .entries()
        .iter()
        .map(|entry| {
            let link = entry
                .links()
                .iter()
                .find(|l| l.rel() == "alternate")
                .or_else(|| entry.links().first())
                .map(|l| l.href().to_string())
                .unwrap_or_default();
            let enclosure = entry
                .links()
                .iter()
                .find(|l| l.rel() == "enclosure")
                .map(|l| l.href().to_string());
            SyndicationEntry {
                id: entry.id().to_string(),
                title: entry.title().as_str().to_string(),
                link,
                enclosure,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rss_items_in_document_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <rss version="2.0">
          <channel>
            <title>Series</title>
            <link>https://example.com</link>
            <description>d</description>
            <item>
              <title>Part 3</title>
              <link>https://example.com/p3</link>
              <guid>urn:part:3</guid>
              <enclosure url="https://cdn.example.com/p3.jpg" length="0" type="image/jpeg"/>
            </item>
            <item>
              <title>Part 2</title>
              <link>https://example.com/p2</link>
            </item>
          </channel>
        </rss>"#;

        let entries = parse(xml).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "urn:part:3");
        assert_eq!(entries[0].title, "Part 3");
        assert_eq!(
            entries[0].enclosure.as_deref(),
            Some("https://cdn.example.com/p3.jpg")
        );
        // Falls back to the link when there is no guid
        assert_eq!(entries[1].id, "https://example.com/p2");
        assert_eq!(entries[1].enclosure, None);
    }

    #[test]
    fn test_parse_atom_entries() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom">
          <title>Series</title>
          <id>urn:series</id>
          <updated>2024-01-02T00:00:00Z</updated>
          <entry>
            <title>Part 2</title>
            <id>urn:part:2</id>
            <updated>2024-01-02T00:00:00Z</updated>
            <link rel="alternate" href="https://example.com/p2"/>
            <link rel="enclosure" href="https://cdn.example.com/p2.jpg"/>
          </entry>
        </feed>"#;

        let entries = parse(xml).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "urn:part:2");
        assert_eq!(entries[0].link, "https://example.com/p2");
        assert_eq!(
            entries[0].enclosure.as_deref(),
            Some("https://cdn.example.com/p2.jpg")
        );
    }

    #[test]
    fn test_parse_garbage_is_an_error() {
        assert!(matches!(
            parse("not a feed"),
            Err(FeedError::FeedParseFailed { .. })
        ));
    }
}
