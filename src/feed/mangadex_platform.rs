//! MangaDex manga platform integration.

use std::time::Duration;

use log::debug;
use log::warn;
use serde_json::Map;
use serde_json::Value;

use crate::feed::BasePlatform;
use crate::feed::FeedEntry;
use crate::feed::PlatformInfo;
use crate::feed::error::FeedError;

type Json<'a> = &'a Map<String, Value>;

const CONTENT_RATINGS: [&str; 4] = ["safe", "suggestive", "erotica", "pornographic"];

/// A manga returned by title search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MangaSearchResult {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Cover art file name, if the manga has one.
    pub cover: Option<String>,
}

/// The newest English chapter of a manga.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chapter {
    pub id: String,
    pub title: Option<String>,
    pub volume: Option<String>,
    pub chapter: Option<String>,
}

impl FeedEntry for Chapter {
    fn entry_id(&self) -> &str {
        &self.id
    }
}

/// MangaDex platform implementation.
pub struct MangaDexPlatform {
    pub base: BasePlatform,
    /// Cover CDN root, overridable for tests.
    pub uploads_url: String,
}

impl MangaDexPlatform {
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        let info = PlatformInfo {
            name: "MangaDex".to_string(),
            api_url: "https://api.mangadex.org".to_string(),
        };
        // See https://api.mangadex.org/docs/2-limitations/
        // Endpoints without a specific limit default to 5 requests per second.
        Ok(Self {
            base: BasePlatform::new(info, 5, timeout)?,
            uploads_url: "https://uploads.mangadex.org".to_string(),
        })
    }

    pub fn title_url(mangadex_id: &str) -> String {
        format!("https://mangadex.org/title/{mangadex_id}")
    }

    pub fn chapter_url(chapter_id: &str) -> String {
        format!("https://mangadex.org/chapter/{chapter_id}")
    }

    pub fn cover_url(&self, mangadex_id: &str, cover: &str) -> String {
        format!("{}/covers/{mangadex_id}/{cover}", self.uploads_url)
    }

    fn check_resp_errors(&self, resp: &Value) -> Result<(), FeedError> {
        if let Some(errors) = resp.get("errors")
            && let Some(error_array) = errors.as_array()
            && let Some(first_error) = error_array.first()
        {
            let message = first_error
                .get("detail")
                .and_then(|v| v.as_str())
                .or_else(|| first_error.get("title").and_then(|v| v.as_str()))
                .unwrap_or("Unknown API error")
                .to_string();

            return Err(FeedError::ApiError { message });
        }
        Ok(())
    }

    fn get_data_array<'a>(&self, resp: &'a Value) -> Result<&'a Vec<Value>, FeedError> {
        resp.get("data")
            .and_then(|v| v.as_array())
            .ok_or_else(|| FeedError::MissingField {
                field: "data".to_string(),
            })
    }

    fn get_attributes<'a>(&self, data: &'a Value) -> Result<Json<'a>, FeedError> {
        data.get("attributes")
            .and_then(|v| v.as_object())
            .ok_or_else(|| FeedError::MissingField {
                field: "data.attributes".to_string(),
            })
    }

    fn get_id(&self, data: &Value) -> Result<String, FeedError> {
        data.get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| FeedError::MissingField {
                field: "data.id".to_string(),
            })
    }

    /// Priority: title.en > altTitles.en > title.ja-ro > altTitles.ja-ro > title.ja > altTitles.ja,
    /// then whatever title comes first.
    fn get_title_from_attr(&self, attr: Json) -> Result<String, FeedError> {
        let langs = ["en", "ja-ro", "ja"];

        for lang in langs {
            if let Some(title) = attr
                .get("title")
                .and_then(|t| t.get(lang))
                .and_then(|v| v.as_str())
            {
                return Ok(title.to_string());
            }

            if let Some(alt_titles) = attr.get("altTitles").and_then(|v| v.as_array()) {
                for alt_title in alt_titles {
                    if let Some(title) = alt_title.get(lang).and_then(|v| v.as_str()) {
                        return Ok(title.to_string());
                    }
                }
            }
        }

        attr.get("title")
            .and_then(|t| t.as_object())
            .and_then(|t| t.values().next())
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| FeedError::MissingField {
                field: "attributes.title".to_string(),
            })
    }

    fn get_description_from_attr(&self, attr: Json) -> String {
        let description = attr.get("description").and_then(|d| d.as_object());
        description
            .and_then(|d| d.get("en").or_else(|| d.values().next()))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    }

    fn get_cover_filename(&self, data: &Value) -> Option<String> {
        data.get("relationships")
            .and_then(|v| v.as_array())?
            .iter()
            .find(|rel| rel.get("type").and_then(|v| v.as_str()) == Some("cover_art"))?
            .get("attributes")
            .and_then(|attr| attr.get("fileName"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn optional_str(attr: Json, key: &str) -> Option<String> {
        attr.get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn validate_uuid(&self, id: &str) -> Result<(), FeedError> {
        if uuid::Uuid::parse_str(id).is_err() {
            return Err(FeedError::InvalidSourceId {
                source_id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn send_get_json(&self, request: wreq::RequestBuilder) -> Result<Value, FeedError> {
        let body = self.base.get_text(request).await?;
        let resp: Value = serde_json::from_str(&body)?;
        self.check_resp_errors(&resp)?;
        Ok(resp)
    }

    /// Searches manga by title across every content rating.
    pub async fn search(&self, title: &str) -> Result<Vec<MangaSearchResult>, FeedError> {
        debug!("Searching {} for `{title}`", self.base.info.name);
        let mut params = vec![("title", title), ("includes[]", "cover_art")];
        params.extend(CONTENT_RATINGS.iter().map(|r| ("contentRating[]", *r)));

        let request = self
            .base
            .client()
            .get(format!("{}/manga", self.base.info.api_url))
            .query(&params);
        let resp = self.send_get_json(request).await?;

        self.get_data_array(&resp)?
            .iter()
            .map(|manga| {
                let attr = self.get_attributes(manga)?;
                Ok(MangaSearchResult {
                    id: self.get_id(manga)?,
                    title: self.get_title_from_attr(attr)?,
                    description: self.get_description_from_attr(attr),
                    cover: self.get_cover_filename(manga),
                })
            })
            .collect()
    }

    /// Returns the newest English chapter as a zero or one item list.
    pub async fn fetch_latest(&self, mangadex_id: &str) -> Result<Vec<Chapter>, FeedError> {
        debug!(
            "Fetching latest from {} for mangadex_id: {mangadex_id}",
            self.base.info.name
        );
        self.validate_uuid(mangadex_id)?;

        let request = self
            .base
            .client()
            .get(format!("{}/manga/{mangadex_id}/feed", self.base.info.api_url))
            .query(&[
                ("translatedLanguage[]", "en"),
                ("order[volume]", "desc"),
                ("order[chapter]", "desc"),
                ("order[publishAt]", "desc"),
            ]);
        let resp = self.send_get_json(request).await?;

        for chapter in self.get_data_array(&resp)? {
            if chapter.get("type").and_then(|v| v.as_str()) != Some("chapter") {
                continue;
            }
            let attr = self.get_attributes(chapter)?;
            if attr.get("translatedLanguage").and_then(|v| v.as_str()) != Some("en") {
                continue;
            }
            return Ok(vec![Chapter {
                id: self.get_id(chapter)?,
                title: Self::optional_str(attr, "title"),
                volume: Self::optional_str(attr, "volume"),
                chapter: Self::optional_str(attr, "chapter"),
            }]);
        }

        warn!("No English chapters found for mangadex_id: {mangadex_id}");
        Ok(vec![])
    }

    /// Downloads cover art bytes for attaching to a message.
    pub async fn fetch_cover(&self, mangadex_id: &str, cover: &str) -> Result<Vec<u8>, FeedError> {
        let request = self.base.client().get(self.cover_url(mangadex_id, cover));
        self.base.get_bytes(request).await
    }
}
