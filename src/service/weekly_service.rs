//! Weekly recurring countdowns with success and failure gif pools.

use std::sync::Arc;

use chrono::DateTime;
use chrono::Datelike;
use chrono::Days;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::TimeDelta;
use chrono::TimeZone;
use chrono::Timelike;
use chrono::Utc;
use chrono::Weekday;
use chrono_tz::Tz;
use rand::seq::SliceRandom;

use crate::model::GifKind;
use crate::model::WeeklyGifModel;
use crate::model::WeeklyModel;
use crate::repository::Repository;
use crate::repository::table::Table;
use crate::service::Caller;
use crate::service::capwords;
use crate::service::error::ServiceError;

/// Hours after the weekly time during which the same day still counts.
const ON_DAY_HOURS: u32 = 3;

/// The next occurrence of a weekly and whether today is its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextOccurrence {
    pub timestamp: i64,
    pub on_day: bool,
}

fn next_weekday_after(date: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let mut next = date.checked_add_days(Days::new(1))?;
    while next.weekday() != weekday {
        next = next.succ_opt()?;
    }
    Some(next)
}

/// Local wall time to Unix seconds, stepping over DST gaps.
fn resolve_local(tz: &Tz, local: NaiveDateTime) -> Option<i64> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(local + TimeDelta::hours(1)))
                .earliest()
        })
        .map(|dt| dt.timestamp())
}

/// Next time the weekday and wall clock time of `timestamp` come around in
/// `now`'s timezone.
///
/// On the weekly's own weekday the occurrence stays today until three hours
/// past its hour, and `on_day` is set for the whole day.
pub fn next_occurrence(timestamp: i64, now: DateTime<Tz>) -> Option<NextOccurrence> {
    let tz = now.timezone();
    let anchor = Utc.timestamp_opt(timestamp, 0).single()?.with_timezone(&tz);
    let time = NaiveTime::from_hms_opt(anchor.hour(), anchor.minute(), 0)?;
    let today = now.date_naive();

    let (date, on_day) = if now.weekday() == anchor.weekday() {
        if now.hour() > anchor.hour() + ON_DAY_HOURS {
            (next_weekday_after(today, anchor.weekday())?, true)
        } else {
            (today, true)
        }
    } else {
        (next_weekday_after(today, anchor.weekday())?, false)
    };

    Some(NextOccurrence {
        timestamp: resolve_local(&tz, date.and_time(time))?,
        on_day,
    })
}

/// What a weekly lookup renders.
#[derive(Debug, Clone)]
pub struct WeeklyView {
    pub title: String,
    pub description: String,
    pub on_day: bool,
    pub gif: Option<String>,
}

pub struct WeeklyService {
    pub db: Arc<Repository>,
    pub timezone: Tz,
}

impl WeeklyService {
    pub fn new(db: Arc<Repository>, timezone: Tz) -> Self {
        Self { db, timezone }
    }

    fn next(&self, timestamp: i64) -> Result<NextOccurrence, ServiceError> {
        next_occurrence(timestamp, Utc::now().with_timezone(&self.timezone))
            .ok_or_else(|| ServiceError::invalid(format!("Invalid timestamp {timestamp}")))
    }

    async fn get(&self, guild_id: u64, lookup: &str) -> Result<WeeklyModel, ServiceError> {
        self.db
            .weekly
            .select_by_lookup(guild_id, lookup)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("Weekly with lookup `{lookup}` does not exist."))
            })
    }

    async fn get_owned(&self, caller: &Caller, lookup: &str) -> Result<WeeklyModel, ServiceError> {
        let weekly = self.get(caller.guild_id, lookup).await?;
        if weekly.creator_id != caller.user_id {
            return Err(ServiceError::not_owner(format!(
                "Weekly with lookup `{lookup}` is not owned by you."
            )));
        }
        Ok(weekly)
    }

    pub async fn create(
        &self,
        caller: &Caller,
        lookup: &str,
        timestamp: i64,
    ) -> Result<String, ServiceError> {
        let lookup = lookup.to_lowercase();
        self.next(timestamp)?;
        if self
            .db
            .weekly
            .select_by_lookup(caller.guild_id, &lookup)
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists(format!(
                "Weekly with lookup `{lookup}` already exists."
            )));
        }

        self.db
            .weekly
            .insert(&WeeklyModel {
                guild_id: caller.guild_id,
                creator_id: caller.user_id,
                timestamp,
                lookup: lookup.clone(),
                ..Default::default()
            })
            .await?;
        Ok(lookup)
    }

    /// Creator or guild managers only.
    pub async fn delete(&self, caller: &Caller, lookup: &str) -> Result<String, ServiceError> {
        let lookup = lookup.to_lowercase();
        let weekly = self.get(caller.guild_id, &lookup).await?;
        if !caller.owns_or_manages(weekly.creator_id) {
            return Err(ServiceError::not_owner(format!(
                "Weekly with lookup `{lookup}` is not owned by you."
            )));
        }
        self.db.weekly.delete(&weekly.id).await?;
        Ok(lookup)
    }

    pub async fn lookup(&self, guild_id: u64, lookup: &str) -> Result<WeeklyView, ServiceError> {
        let lookup = lookup.to_lowercase();
        let weekly = self.get(guild_id, &lookup).await?;
        let next = self.next(weekly.timestamp)?;
        let kind = if next.on_day {
            GifKind::Success
        } else {
            GifKind::Failure
        };
        let gifs = self.db.weekly_gif.select_all_by_kind(weekly.id, kind).await?;
        let title = capwords(&lookup);

        Ok(WeeklyView {
            description: format!(
                "Next {title} <t:{ts}:R> on <t:{ts}>",
                ts = next.timestamp
            ),
            title: format!("Weekly to {title}"),
            on_day: next.on_day,
            gif: gifs.choose(&mut rand::thread_rng()).map(|g| g.url.clone()),
        })
    }

    /// Weeklies paired with their next occurrence, soonest first.
    pub async fn list(&self, guild_id: u64) -> Result<Vec<(WeeklyModel, i64)>, ServiceError> {
        let mut weeklies = self
            .db
            .weekly
            .select_all_by_guild(guild_id)
            .await?
            .into_iter()
            .map(|w| {
                let next = self.next(w.timestamp)?;
                Ok((w, next.timestamp))
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;
        weeklies.sort_by_key(|(_, ts)| *ts);
        Ok(weeklies)
    }

    /// Creator only.
    pub async fn add_gif(
        &self,
        caller: &Caller,
        lookup: &str,
        kind: GifKind,
        url: &str,
    ) -> Result<String, ServiceError> {
        let lookup = lookup.to_lowercase();
        let weekly = self.get_owned(caller, &lookup).await?;
        if self
            .db
            .weekly_gif
            .select_by_url(weekly.id, kind, url)
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists(format!(
                "{} gif with URL `{url}` already exists.",
                kind.label()
            )));
        }

        self.db
            .weekly_gif
            .insert(&WeeklyGifModel {
                weekly_id: weekly.id,
                kind,
                url: url.to_string(),
                ..Default::default()
            })
            .await?;
        Ok(lookup)
    }

    pub async fn list_gifs(
        &self,
        guild_id: u64,
        lookup: &str,
        kind: GifKind,
    ) -> Result<Vec<String>, ServiceError> {
        let lookup = lookup.to_lowercase();
        let weekly = self.get(guild_id, &lookup).await?;
        let gifs = self.db.weekly_gif.select_all_by_kind(weekly.id, kind).await?;
        if gifs.is_empty() {
            return Err(ServiceError::not_found(format!(
                "No {} gifs for countdown `{lookup}`.",
                kind.label().to_lowercase()
            )));
        }
        Ok(gifs.into_iter().map(|g| g.url).collect())
    }

    /// Creator only.
    pub async fn remove_gif(
        &self,
        caller: &Caller,
        lookup: &str,
        kind: GifKind,
        url: &str,
    ) -> Result<String, ServiceError> {
        let lookup = lookup.to_lowercase();
        let weekly = self.get_owned(caller, &lookup).await?;
        let gif = self
            .db
            .weekly_gif
            .select_by_url(weekly.id, kind, url)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!(
                    "{} gif with URL `{url}` does not exist.",
                    kind.label()
                ))
            })?;
        self.db.weekly_gif.delete(&gif.id).await?;
        Ok(lookup)
    }
}

pub fn format_weekly_list(weeklies: &[(WeeklyModel, i64)]) -> Option<String> {
    if weeklies.is_empty() {
        return None;
    }
    Some(
        weeklies
            .iter()
            .enumerate()
            .map(|(i, (w, ts))| {
                format!(
                    "{}) {} - <t:{ts}:R> on <t:{ts}>",
                    i + 1,
                    capwords(&w.lookup)
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

pub fn format_gif_list(kind: GifKind, urls: &[String]) -> String {
    let lines = urls
        .iter()
        .map(|url| format!("<{url}>"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{} gifs:\n{lines}", kind.label())
}
