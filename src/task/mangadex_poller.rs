//! Manga chapter poller with a consecutive failure breaker.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use log::error;
use log::info;
use log::warn;

use crate::feed::error::FeedError;
use crate::feed::mangadex_platform::Chapter;
use crate::feed::mangadex_platform::MangaDexPlatform;
use crate::feed::reconcile::reconcile;
use crate::model::MangaModel;
use crate::repository::Repository;
use crate::repository::table::SubscriptionTable;
use crate::repository::table::Table;
use crate::subscriber::Notifier;
use crate::subscriber::fanout::DeliveryOutcome;
use crate::subscriber::fanout::DeliveryTarget;
use crate::subscriber::fanout::MANGA_ROLE;
use crate::subscriber::fanout::deliver_to;
use crate::subscriber::fanout::resolve_target;
use crate::subscriber::message_builder::chapter_message;
use crate::task::poll_task::FailureStreak;
use crate::task::poll_task::PollControl;
use crate::task::poll_task::Poller;

pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Cover bytes for one catalog id, downloaded at most once per tick.
enum CoverCache {
    Unfetched,
    Fetched(Option<Vec<u8>>),
}

pub struct MangaDexPoller {
    repository: Arc<Repository>,
    platform: Arc<MangaDexPlatform>,
    notifier: Arc<dyn Notifier>,
    failures: FailureStreak,
}

impl MangaDexPoller {
    pub fn new(
        repository: Arc<Repository>,
        platform: Arc<MangaDexPlatform>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repository,
            platform,
            notifier,
            failures: FailureStreak::new(MAX_CONSECUTIVE_FAILURES),
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures.count()
    }

    async fn cover(&self, sub: &MangaModel, cache: &mut CoverCache) -> Option<Vec<u8>> {
        if let CoverCache::Fetched(bytes) = cache {
            return bytes.clone();
        }
        let bytes = match &sub.cover {
            Some(cover) => match self.platform.fetch_cover(&sub.mangadex_id, cover).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Failed to fetch cover for {}: {e}", sub.mangadex_id);
                    None
                }
            },
            None => None,
        };
        *cache = CoverCache::Fetched(bytes.clone());
        bytes
    }

    /// Drops a follow whose channel is gone, otherwise delivers what is new.
    async fn process(
        &self,
        sub: &MangaModel,
        chapters: &[Chapter],
        cover_cache: &mut CoverCache,
    ) -> anyhow::Result<()> {
        let Some(channel_id) =
            resolve_target(self.notifier.as_ref(), sub.guild_id, sub.channel_id).await?
        else {
            info!(
                "Channel for manga `{}` in guild {} is gone, removing subscription.",
                sub.title, sub.guild_id
            );
            self.repository.manga.delete(&sub.id).await?;
            return Ok(());
        };

        let reconciliation = reconcile(sub.latest.as_deref(), chapters.to_vec());
        let Some(watermark) = reconciliation.watermark.as_deref() else {
            return Ok(());
        };
        if reconciliation.is_empty() {
            return Ok(());
        }

        let committed = self
            .repository
            .manga
            .compare_and_set_latest(sub.id, sub.latest.as_deref(), watermark)
            .await?;
        if !committed {
            debug!("Watermark of manga `{}` moved concurrently, skipping.", sub.title);
            return Ok(());
        }

        let cover = self.cover(sub, cover_cache).await;
        let target = DeliveryTarget {
            guild_id: sub.guild_id,
            channel_id: sub.channel_id,
            role_name: MANGA_ROLE,
            followers: self.repository.manga_follower.select_user_ids(sub.id).await?,
        };
        let DeliveryOutcome { sent, failed } =
            deliver_to(self.notifier.as_ref(), channel_id, &target, |mention| {
                reconciliation
                    .new_items
                    .iter()
                    .map(|chapter| chapter_message(mention, sub, chapter, cover.as_deref()))
                    .collect()
            })
            .await?;
        info!(
            "Delivered {sent} new chapters for manga `{}` ({failed} failed).",
            sub.title
        );
        Ok(())
    }
}

#[async_trait]
impl Poller for MangaDexPoller {
    fn name(&self) -> &'static str {
        "mangadex"
    }

    async fn poll(&self) -> anyhow::Result<PollControl> {
        let ids = self.repository.manga.select_distinct_mangadex_ids().await?;

        for mangadex_id in ids {
            let chapters = match self.platform.fetch_latest(&mangadex_id).await {
                Ok(chapters) => {
                    self.failures.record_success();
                    chapters
                }
                Err(FeedError::InvalidSourceId { source_id }) => {
                    warn!("Skipping manga with malformed id `{source_id}`.");
                    continue;
                }
                Err(e) => {
                    warn!("Failed to fetch latest chapter for {mangadex_id}: {e}");
                    if self.failures.record_failure() {
                        error!(
                            "MangaDex failed {} times in a row, halting the poller.",
                            self.failures.count()
                        );
                        return Ok(PollControl::Halt);
                    }
                    continue;
                }
            };
            let subs = self
                .repository
                .manga
                .select_all_by_mangadex_id(&mangadex_id)
                .await?;
            let mut cover_cache = CoverCache::Unfetched;
            for sub in &subs {
                if let Err(e) = self.process(sub, &chapters, &mut cover_cache).await {
                    error!("Error processing manga id `{}` ({}): {e:?}", sub.id, sub.title);
                }
            }
        }
        Ok(PollControl::Continue)
    }
}
