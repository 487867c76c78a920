//! One-off guild countdowns and their images.

use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::model::CountdownImageModel;
use crate::model::CountdownModel;
use crate::repository::Repository;
use crate::repository::table::Table;
use crate::service::Caller;
use crate::service::capwords;
use crate::service::error::ServiceError;

pub const TIMESTAMP_HELPER_URL: &str = "https://www.timestamp-converter.com/";

/// What a countdown lookup renders.
#[derive(Debug, Clone)]
pub struct CountdownView {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
}

pub struct CountdownService {
    pub db: Arc<Repository>,
}

fn no_countdown() -> ServiceError {
    ServiceError::not_found("There is no countdown with that name.")
}

fn not_creator() -> ServiceError {
    ServiceError::not_owner("You are not the creator of that countdown.")
}

impl CountdownService {
    pub fn new(db: Arc<Repository>) -> Self {
        Self { db }
    }

    async fn get(&self, guild_id: u64, name: &str) -> Result<CountdownModel, ServiceError> {
        self.db
            .countdown
            .select_by_lookup(guild_id, name)
            .await?
            .ok_or_else(no_countdown)
    }

    pub async fn add(
        &self,
        caller: &Caller,
        name: &str,
        timestamp: i64,
    ) -> Result<String, ServiceError> {
        let name = name.to_lowercase();
        if self
            .db
            .countdown
            .select_by_lookup(caller.guild_id, &name)
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists(
                "There is already a countdown with that name.",
            ));
        }

        self.db
            .countdown
            .insert(&CountdownModel {
                guild_id: caller.guild_id,
                creator_id: caller.user_id,
                timestamp,
                lookup: name.clone(),
                ..Default::default()
            })
            .await?;
        Ok(name)
    }

    pub async fn remove(&self, caller: &Caller, name: &str) -> Result<String, ServiceError> {
        let name = name.to_lowercase();
        let countdown = self.get(caller.guild_id, &name).await?;
        if !caller.owns_or_manages(countdown.creator_id) {
            return Err(not_creator());
        }
        self.db.countdown.delete(&countdown.id).await?;
        Ok(name)
    }

    /// Picks a random image when the countdown has any.
    pub async fn lookup(&self, guild_id: u64, name: &str) -> Result<CountdownView, ServiceError> {
        let name = name.to_lowercase();
        let countdown = self
            .db
            .countdown
            .select_by_lookup(guild_id, &name)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("There is no countdown with the name {name}."))
            })?;
        let images = self
            .db
            .countdown_image
            .select_all_by_countdown(countdown.id)
            .await?;

        Ok(CountdownView {
            title: capwords(&name),
            description: format!(
                "Countdown ends <t:{ts}:R> on <t:{ts}>",
                ts = countdown.timestamp
            ),
            image: images
                .choose(&mut rand::thread_rng())
                .map(|image| image.url.clone()),
        })
    }

    /// Soonest first.
    pub async fn list(&self, guild_id: u64) -> Result<Vec<CountdownModel>, ServiceError> {
        Ok(self.db.countdown.select_all_by_guild(guild_id).await?)
    }

    /// Creator only.
    pub async fn add_image(
        &self,
        caller: &Caller,
        name: &str,
        url: &str,
    ) -> Result<String, ServiceError> {
        let name = name.to_lowercase();
        let countdown = self.get(caller.guild_id, &name).await?;
        if countdown.creator_id != caller.user_id {
            return Err(not_creator());
        }
        if self
            .db
            .countdown_image
            .select_by_url(countdown.id, url)
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists(
                "There is already an image with that URL for that countdown.",
            ));
        }

        self.db
            .countdown_image
            .insert(&CountdownImageModel {
                countdown_id: countdown.id,
                url: url.to_string(),
                ..Default::default()
            })
            .await?;
        Ok(name)
    }

    /// Creator only.
    pub async fn remove_image(
        &self,
        caller: &Caller,
        name: &str,
        url: &str,
    ) -> Result<String, ServiceError> {
        let name = name.to_lowercase();
        let countdown = self.get(caller.guild_id, &name).await?;
        if countdown.creator_id != caller.user_id {
            return Err(not_creator());
        }
        let image = self
            .db
            .countdown_image
            .select_by_url(countdown.id, url)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found("There is no image with that URL for that countdown.")
            })?;
        self.db.countdown_image.delete(&image.id).await?;
        Ok(name)
    }
}

/// Numbered listing lines, or `None` when the guild has no countdowns.
pub fn format_countdown_list(countdowns: &[CountdownModel]) -> Option<String> {
    if countdowns.is_empty() {
        return None;
    }
    Some(
        countdowns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                format!(
                    "{}) {} - <t:{ts}:R> on <t:{ts}>",
                    i + 1,
                    capwords(&c.lookup),
                    ts = c.timestamp
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_countdown_list() {
        assert_eq!(format_countdown_list(&[]), None);
        let countdowns = vec![CountdownModel {
            lookup: "new year".to_string(),
            timestamp: 100,
            ..Default::default()
        }];
        assert_eq!(
            format_countdown_list(&countdowns).unwrap(),
            "1) New Year - <t:100:R> on <t:100>"
        );
    }
}
