//! Feed subscriptions per guild and the users opted into their notifications.

use std::collections::HashSet;
use std::sync::Arc;

use crate::feed::jnovel_platform::JNovelPlatform;
use crate::feed::jnovel_platform::Series;
use crate::feed::mangadex_platform::MangaDexPlatform;
use crate::feed::mangadex_platform::MangaSearchResult;
use crate::model::JNovelModel;
use crate::model::MangaModel;
use crate::model::NyaaModel;
use crate::repository::Repository;
use crate::repository::table::FollowerTable;
use crate::repository::table::SubscriptionTable;
use crate::repository::table::Table;
use crate::service::Caller;
use crate::service::error::ServiceError;
use crate::task::FeedKind;

/// One selectable entry of the notification menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationOption {
    pub subscription_id: i64,
    pub label: String,
    pub followed: bool,
}

pub struct SubscriptionService {
    pub db: Arc<Repository>,
    pub mangadex: Arc<MangaDexPlatform>,
    pub jnovel: Arc<JNovelPlatform>,
}

impl SubscriptionService {
    pub fn new(
        db: Arc<Repository>,
        mangadex: Arc<MangaDexPlatform>,
        jnovel: Arc<JNovelPlatform>,
    ) -> Self {
        Self {
            db,
            mangadex,
            jnovel,
        }
    }

    fn followers(&self, kind: FeedKind) -> &FollowerTable {
        match kind {
            FeedKind::Nyaa => &self.db.nyaa_follower,
            FeedKind::MangaDex => &self.db.manga_follower,
            FeedKind::JNovel => &self.db.jnovel_follower,
        }
    }

    // Nyaa

    /// Name is stored lowercased. Both name and query are unique per guild.
    pub async fn follow_nyaa(
        &self,
        caller: &Caller,
        name: &str,
        query: &str,
        channel_id: u64,
    ) -> Result<String, ServiceError> {
        let name = name.to_lowercase();
        if query.split_whitespace().next().is_none() {
            return Err(ServiceError::invalid("The match must contain at least one word"));
        }
        if self
            .db
            .nyaa
            .select_by_name(caller.guild_id, &name)
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists(
                "Nyaa.si feed match already exists with that name",
            ));
        }
        if self
            .db
            .nyaa
            .select_by_query(caller.guild_id, query)
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists(
                "Nyaa.si feed match already exists with that search term",
            ));
        }

        self.db
            .nyaa
            .insert(&NyaaModel {
                name: name.clone(),
                query: query.to_string(),
                guild_id: caller.guild_id,
                channel_id,
                creator_id: caller.user_id,
                ..Default::default()
            })
            .await?;
        Ok(name)
    }

    /// Creator or guild managers only. Followers go with the subscription.
    pub async fn unfollow_nyaa(&self, caller: &Caller, name: &str) -> Result<String, ServiceError> {
        let name = name.to_lowercase();
        let nyaa = self
            .db
            .nyaa
            .select_by_name(caller.guild_id, &name)
            .await?
            .ok_or_else(|| ServiceError::not_found("RSS feed does not exist"))?;
        if !caller.owns_or_manages(nyaa.creator_id) {
            return Err(ServiceError::not_owner(
                "You are not the creator of this RSS feed",
            ));
        }
        self.db.nyaa.delete(&nyaa.id).await?;
        Ok(name)
    }

    pub async fn list_nyaa(&self, guild_id: u64) -> Result<Vec<NyaaModel>, ServiceError> {
        Ok(self.db.nyaa.select_all_by_guild(guild_id).await?)
    }

    // MangaDex

    pub async fn search_manga(&self, title: &str) -> Result<Vec<MangaSearchResult>, ServiceError> {
        let results = self.mangadex.search(title).await?;
        if results.is_empty() {
            return Err(ServiceError::not_found("No manga found with that name."));
        }
        Ok(results)
    }

    pub async fn follow_manga(
        &self,
        caller: &Caller,
        manga: &MangaSearchResult,
        channel_id: u64,
    ) -> Result<String, ServiceError> {
        if self
            .db
            .manga
            .select_by_mangadex_id(caller.guild_id, &manga.id)
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists(
                "That manga is already in the list.",
            ));
        }

        self.db
            .manga
            .insert(&MangaModel {
                title: manga.title.clone(),
                description: manga.description.clone(),
                mangadex_id: manga.id.clone(),
                cover: manga.cover.clone(),
                guild_id: caller.guild_id,
                channel_id,
                creator_id: caller.user_id,
                ..Default::default()
            })
            .await?;
        Ok(manga.title.clone())
    }

    /// Matches the title case-insensitively. Creator or guild managers only.
    pub async fn unfollow_manga(
        &self,
        caller: &Caller,
        title: &str,
    ) -> Result<String, ServiceError> {
        let manga = self
            .db
            .manga
            .select_all_by_guild(caller.guild_id)
            .await?
            .into_iter()
            .find(|m| m.title.eq_ignore_ascii_case(title.trim()))
            .ok_or_else(|| ServiceError::not_found("That manga is not in the list."))?;
        if !caller.owns_or_manages(manga.creator_id) {
            return Err(ServiceError::not_owner(
                "You are not the one who added that manga.",
            ));
        }
        self.db.manga.delete(&manga.id).await?;
        Ok(manga.title)
    }

    pub async fn list_manga(&self, guild_id: u64) -> Result<Vec<MangaModel>, ServiceError> {
        Ok(self.db.manga.select_all_by_guild(guild_id).await?)
    }

    // J-Novel Club

    pub async fn search_series(&self, query: &str) -> Result<Vec<Series>, ServiceError> {
        let results = self.jnovel.search(query).await?;
        if results.is_empty() {
            return Err(ServiceError::not_found("No results found."));
        }
        Ok(results)
    }

    pub async fn follow_series(
        &self,
        caller: &Caller,
        series: &Series,
        channel_id: u64,
    ) -> Result<String, ServiceError> {
        if self
            .db
            .jnovel
            .select_by_series(caller.guild_id, &series.id)
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists(
                "That series is already in the follow list.",
            ));
        }

        self.db
            .jnovel
            .insert(&JNovelModel {
                series: series.id.clone(),
                title: series.title.clone(),
                cover: series.cover.clone(),
                guild_id: caller.guild_id,
                channel_id,
                creator_id: caller.user_id,
                ..Default::default()
            })
            .await?;
        Ok(series.title.clone())
    }

    /// Matches the title case-insensitively. Creator or guild managers only.
    pub async fn unfollow_series(
        &self,
        caller: &Caller,
        title: &str,
    ) -> Result<String, ServiceError> {
        let series = self
            .db
            .jnovel
            .select_all_by_guild(caller.guild_id)
            .await?
            .into_iter()
            .find(|s| s.title.eq_ignore_ascii_case(title.trim()))
            .ok_or_else(|| ServiceError::not_found("That series is not in the follow list."))?;
        if !caller.owns_or_manages(series.creator_id) {
            return Err(ServiceError::not_owner(
                "You are not the one who added that series.",
            ));
        }
        self.db.jnovel.delete(&series.id).await?;
        Ok(series.title)
    }

    pub async fn list_series(&self, guild_id: u64) -> Result<Vec<JNovelModel>, ServiceError> {
        Ok(self.db.jnovel.select_all_by_guild(guild_id).await?)
    }

    // Notifications

    /// Every subscription of the guild, marked with whether `user_id` follows it.
    pub async fn notification_options(
        &self,
        kind: FeedKind,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Vec<NotificationOption>, ServiceError> {
        let followed: HashSet<i64> = self
            .followers(kind)
            .select_subscription_ids_by_user(user_id)
            .await?
            .into_iter()
            .collect();

        let subscriptions: Vec<(i64, String)> = match kind {
            FeedKind::Nyaa => self
                .list_nyaa(guild_id)
                .await?
                .into_iter()
                .map(|s| (s.id, s.name))
                .collect(),
            FeedKind::MangaDex => self
                .list_manga(guild_id)
                .await?
                .into_iter()
                .map(|s| (s.id, s.title))
                .collect(),
            FeedKind::JNovel => self
                .list_series(guild_id)
                .await?
                .into_iter()
                .map(|s| (s.id, s.title))
                .collect(),
        };

        Ok(subscriptions
            .into_iter()
            .map(|(subscription_id, label)| NotificationOption {
                subscription_id,
                label,
                followed: followed.contains(&subscription_id),
            })
            .collect())
    }

    /// Makes the user follow exactly `selected` among the `shown` options.
    pub async fn apply_notifications(
        &self,
        kind: FeedKind,
        user_id: u64,
        shown: &[i64],
        selected: &[i64],
    ) -> Result<(), ServiceError> {
        if let Some(stray) = selected.iter().find(|id| !shown.contains(*id)) {
            return Err(ServiceError::invalid(format!(
                "Subscription {stray} was not offered"
            )));
        }
        self.followers(kind)
            .apply_selection(user_id, shown, selected)
            .await?;
        Ok(())
    }

    pub async fn followers_of(
        &self,
        kind: FeedKind,
        subscription_id: i64,
    ) -> Result<Vec<u64>, ServiceError> {
        Ok(self.followers(kind).select_user_ids(subscription_id).await?)
    }
}

pub fn format_nyaa_list(feeds: &[NyaaModel]) -> String {
    if feeds.is_empty() {
        return "No RSS feeds found".to_string();
    }
    let lines = feeds
        .iter()
        .map(|feed| format!("**{}**: `{}`", feed.name, feed.query))
        .collect::<Vec<_>>()
        .join("\n");
    format!("RSS feeds (**name**: `match`):\n{lines}")
}

pub fn format_title_list(heading: &str, empty: &str, titles: &[String]) -> String {
    if titles.is_empty() {
        return empty.to_string();
    }
    let lines = titles
        .iter()
        .map(|title| format!("- {title}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{heading}\n{lines}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_nyaa_list() {
        assert_eq!(format_nyaa_list(&[]), "No RSS feeds found");
        let feeds = vec![NyaaModel {
            name: "show".to_string(),
            query: "show 1080p".to_string(),
            ..Default::default()
        }];
        assert_eq!(
            format_nyaa_list(&feeds),
            "RSS feeds (**name**: `match`):\n**show**: `show 1080p`"
        );
    }

    #[test]
    fn test_format_title_list() {
        assert_eq!(format_title_list("Manga:", "None", &[]), "None");
        assert_eq!(
            format_title_list("Manga:", "None", &["A".to_string(), "B".to_string()]),
            "Manga:\n- A\n- B"
        );
    }
}
