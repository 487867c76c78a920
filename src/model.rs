//! Database row models.
//!
//! Discord snowflakes are stored as SQLite `INTEGER` (i64) and surfaced as
//! `u64`. Synthetic row ids stay `i64`.

use serde::Deserialize;
use serde::Serialize;
use sqlx::FromRow;

/// A named group of guild members that can be pulled into a thread at once.
#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct ClubModel {
    pub id: i64,
    /// Always stored lowercase.
    pub name: String,
    #[sqlx(try_from = "i64")]
    pub guild_id: u64,
    #[sqlx(try_from = "i64")]
    pub creator_id: u64,
}

#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct ClubMemberModel {
    pub id: i64,
    pub club_id: i64,
    #[sqlx(try_from = "i64")]
    pub user_id: u64,
}

/// Club name together with its member count, used by listings.
#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct ClubSummary {
    pub name: String,
    pub members: i64,
}

/// A one-off countdown to a fixed point in time.
#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct CountdownModel {
    pub id: i64,
    #[sqlx(try_from = "i64")]
    pub guild_id: u64,
    #[sqlx(try_from = "i64")]
    pub creator_id: u64,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    pub lookup: String,
}

#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct CountdownImageModel {
    pub id: i64,
    pub countdown_id: i64,
    pub url: String,
}

/// A countdown that repeats on the same weekday and time every week.
///
/// Only the weekday and time of day of `timestamp` are meaningful; the next
/// occurrence is computed on lookup.
#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct WeeklyModel {
    pub id: i64,
    #[sqlx(try_from = "i64")]
    pub guild_id: u64,
    #[sqlx(try_from = "i64")]
    pub creator_id: u64,
    pub timestamp: i64,
    pub lookup: String,
}

/// Which pool a weekly gif is drawn from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, Default, PartialEq, Eq)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GifKind {
    /// Shown on the day of the weekly.
    #[default]
    Success,
    /// Shown on every other day.
    Failure,
}

impl GifKind {
    pub fn label(&self) -> &'static str {
        match self {
            GifKind::Success => "Success",
            GifKind::Failure => "Failure",
        }
    }
}

#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct WeeklyGifModel {
    pub id: i64,
    pub weekly_id: i64,
    pub kind: GifKind,
    pub url: String,
}

/// A per-user daily reminder. One row per user at most.
#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct DailyModel {
    pub id: i64,
    #[sqlx(try_from = "i64")]
    pub creator_id: u64,
    /// Start of the current 24 hour cycle, in Unix seconds.
    pub timestamp: i64,
    pub message: Option<String>,
}

/// Common view over the three feed subscription tables.
pub trait SubscriptionRecord: Send + Sync {
    fn id(&self) -> i64;
    fn guild_id(&self) -> u64;
    fn channel_id(&self) -> u64;
    /// Id of the last delivered upstream item, `None` if never polled.
    fn latest(&self) -> Option<&str>;
}

macro_rules! impl_subscription_record {
    ($model:ty) => {
        impl SubscriptionRecord for $model {
            fn id(&self) -> i64 {
                self.id
            }
            fn guild_id(&self) -> u64 {
                self.guild_id
            }
            fn channel_id(&self) -> u64 {
                self.channel_id
            }
            fn latest(&self) -> Option<&str> {
                self.latest.as_deref()
            }
        }
    };
}

/// A Nyaa torrent title match routed into a guild channel.
#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct NyaaModel {
    pub id: i64,
    /// Always stored lowercase.
    pub name: String,
    /// Whitespace separated tokens that must all appear in a torrent title.
    pub query: String,
    pub latest: Option<String>,
    #[sqlx(try_from = "i64")]
    pub guild_id: u64,
    #[sqlx(try_from = "i64")]
    pub channel_id: u64,
    #[sqlx(try_from = "i64")]
    pub creator_id: u64,
}

/// A MangaDex title followed in a guild channel.
#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct MangaModel {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub mangadex_id: String,
    /// Cover file name under `uploads.mangadex.org/covers/{mangadex_id}/`.
    pub cover: Option<String>,
    /// Latest delivered chapter id.
    pub latest: Option<String>,
    #[sqlx(try_from = "i64")]
    pub guild_id: u64,
    #[sqlx(try_from = "i64")]
    pub channel_id: u64,
    #[sqlx(try_from = "i64")]
    pub creator_id: u64,
}

/// A J-Novel Club series followed in a guild channel.
#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct JNovelModel {
    pub id: i64,
    /// J-Novel legacy series id, used by the per-series syndication feed.
    pub series: String,
    pub title: String,
    pub cover: Option<String>,
    pub latest: Option<String>,
    #[sqlx(try_from = "i64")]
    pub guild_id: u64,
    #[sqlx(try_from = "i64")]
    pub channel_id: u64,
    #[sqlx(try_from = "i64")]
    pub creator_id: u64,
}

impl_subscription_record!(NyaaModel);
impl_subscription_record!(MangaModel);
impl_subscription_record!(JNovelModel);

/// A user who opted into notifications for one subscription.
#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct FollowerModel {
    pub id: i64,
    pub subscription_id: i64,
    #[sqlx(try_from = "i64")]
    pub user_id: u64,
}
