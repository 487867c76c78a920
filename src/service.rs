//! Business logic for clubs, countdowns, reminders and feed subscriptions.

use std::sync::Arc;

use chrono_tz::Tz;

use crate::feed::jnovel_platform::JNovelPlatform;
use crate::feed::mangadex_platform::MangaDexPlatform;
use crate::repository::Repository;
use crate::service::club_service::ClubService;
use crate::service::countdown_service::CountdownService;
use crate::service::daily_service::DailyService;
use crate::service::subscription_service::SubscriptionService;
use crate::service::weekly_service::WeeklyService;
use crate::task::daily_scheduler::DailyScheduler;

pub mod club_service;
pub mod countdown_service;
pub mod daily_service;
pub mod error;
pub mod subscription_service;
pub mod weekly_service;

/// Who invoked an operation and with which guild authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub guild_id: u64,
    pub user_id: u64,
    /// Holds the Manage Server permission.
    pub can_manage: bool,
}

impl Caller {
    pub fn owns_or_manages(&self, creator_id: u64) -> bool {
        self.user_id == creator_id || self.can_manage
    }
}

/// Uppercases the first letter of each space separated word and lowercases
/// the rest.
pub fn capwords(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Container for all application services.
pub struct Services {
    pub club: Arc<ClubService>,
    pub countdown: Arc<CountdownService>,
    pub weekly: Arc<WeeklyService>,
    pub daily: Arc<DailyService>,
    pub subscription: Arc<SubscriptionService>,
}

impl Services {
    pub fn new(
        db: Arc<Repository>,
        scheduler: Arc<DailyScheduler>,
        mangadex: Arc<MangaDexPlatform>,
        jnovel: Arc<JNovelPlatform>,
        timezone: Tz,
    ) -> Self {
        Self {
            club: Arc::new(ClubService::new(db.clone())),
            countdown: Arc::new(CountdownService::new(db.clone())),
            weekly: Arc::new(WeeklyService::new(db.clone(), timezone)),
            daily: Arc::new(DailyService::new(db.clone(), scheduler)),
            subscription: Arc::new(SubscriptionService::new(db, mangadex, jnovel)),
        }
    }
}
