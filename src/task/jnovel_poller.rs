//! Light novel part poller.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use log::error;
use log::info;
use log::warn;

use crate::feed::jnovel_platform::JNovelPlatform;
use crate::feed::reconcile::reconcile;
use crate::feed::syndication::SyndicationEntry;
use crate::model::JNovelModel;
use crate::repository::Repository;
use crate::repository::table::SubscriptionTable;
use crate::subscriber::Notifier;
use crate::subscriber::fanout::DeliveryOutcome;
use crate::subscriber::fanout::DeliveryTarget;
use crate::subscriber::fanout::NOVEL_ROLE;
use crate::subscriber::fanout::deliver_to;
use crate::subscriber::fanout::resolve_target;
use crate::subscriber::message_builder::novel_message;
use crate::task::poll_task::PollControl;
use crate::task::poll_task::Poller;

pub struct JNovelPoller {
    repository: Arc<Repository>,
    platform: Arc<JNovelPlatform>,
    notifier: Arc<dyn Notifier>,
}

impl JNovelPoller {
    pub fn new(
        repository: Arc<Repository>,
        platform: Arc<JNovelPlatform>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repository,
            platform,
            notifier,
        }
    }

    async fn process(&self, sub: &JNovelModel, entries: &[SyndicationEntry]) -> anyhow::Result<()> {
        let reconciliation = reconcile(sub.latest.as_deref(), entries.to_vec());
        let Some(watermark) = reconciliation.watermark.as_deref() else {
            return Ok(());
        };
        if reconciliation.is_empty() {
            return Ok(());
        }

        let Some(channel_id) =
            resolve_target(self.notifier.as_ref(), sub.guild_id, sub.channel_id).await?
        else {
            debug!("Novel `{}` has no reachable channel, skipping.", sub.title);
            return Ok(());
        };

        let committed = self
            .repository
            .jnovel
            .compare_and_set_latest(sub.id, sub.latest.as_deref(), watermark)
            .await?;
        if !committed {
            debug!("Watermark of novel `{}` moved concurrently, skipping.", sub.title);
            return Ok(());
        }

        let target = DeliveryTarget {
            guild_id: sub.guild_id,
            channel_id: sub.channel_id,
            role_name: NOVEL_ROLE,
            followers: self.repository.jnovel_follower.select_user_ids(sub.id).await?,
        };
        let DeliveryOutcome { sent, failed } =
            deliver_to(self.notifier.as_ref(), channel_id, &target, |mention| {
                reconciliation
                    .new_items
                    .iter()
                    .map(|entry| novel_message(mention, &sub.title, entry))
                    .collect()
            })
            .await?;
        info!(
            "Delivered {sent} new parts for novel `{}` ({failed} failed).",
            sub.title
        );
        Ok(())
    }
}

#[async_trait]
impl Poller for JNovelPoller {
    fn name(&self) -> &'static str {
        "jnovel"
    }

    async fn poll(&self) -> anyhow::Result<PollControl> {
        for series in self.repository.jnovel.select_distinct_series().await? {
            let entries = match self.platform.fetch_latest(&series).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Skipping novel series {series}, fetch failed: {e}");
                    continue;
                }
            };
            if entries.is_empty() {
                continue;
            }

            for sub in self.repository.jnovel.select_all_by_series(&series).await? {
                if let Err(e) = self.process(&sub, &entries).await {
                    error!("Error processing novel id `{}` ({}): {e:?}", sub.id, sub.title);
                }
            }
        }
        Ok(PollControl::Continue)
    }
}
