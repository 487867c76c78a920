//! Torrent index poller.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use log::error;
use log::info;
use log::warn;

use crate::feed::nyaa_platform::NyaaPlatform;
use crate::feed::nyaa_platform::TorrentItem;
use crate::feed::nyaa_platform::filter_matching;
use crate::feed::reconcile::reconcile;
use crate::model::NyaaModel;
use crate::repository::Repository;
use crate::repository::table::SubscriptionTable;
use crate::repository::table::Table;
use crate::subscriber::Notifier;
use crate::subscriber::fanout::DeliveryOutcome;
use crate::subscriber::fanout::DeliveryTarget;
use crate::subscriber::fanout::NYAA_ROLE;
use crate::subscriber::fanout::deliver_to;
use crate::subscriber::fanout::resolve_target;
use crate::subscriber::message_builder::torrent_message;
use crate::task::poll_task::PollControl;
use crate::task::poll_task::Poller;

pub struct NyaaPoller {
    repository: Arc<Repository>,
    platform: Arc<NyaaPlatform>,
    notifier: Arc<dyn Notifier>,
}

impl NyaaPoller {
    pub fn new(
        repository: Arc<Repository>,
        platform: Arc<NyaaPlatform>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repository,
            platform,
            notifier,
        }
    }

    async fn process(&self, sub: &NyaaModel, recent: &[TorrentItem]) -> anyhow::Result<()> {
        let matching = filter_matching(recent.to_vec(), &sub.query);
        let reconciliation = reconcile(sub.latest.as_deref(), matching);
        let Some(watermark) = reconciliation.watermark.as_deref() else {
            return Ok(());
        };
        if reconciliation.is_empty() {
            return Ok(());
        }

        let Some(channel_id) =
            resolve_target(self.notifier.as_ref(), sub.guild_id, sub.channel_id).await?
        else {
            debug!("Nyaa `{}` has no reachable channel, skipping.", sub.name);
            return Ok(());
        };

        let committed = self
            .repository
            .nyaa
            .compare_and_set_latest(sub.id, sub.latest.as_deref(), watermark)
            .await?;
        if !committed {
            debug!("Watermark of nyaa `{}` moved concurrently, skipping.", sub.name);
            return Ok(());
        }

        let target = DeliveryTarget {
            guild_id: sub.guild_id,
            channel_id: sub.channel_id,
            role_name: NYAA_ROLE,
            followers: self.repository.nyaa_follower.select_user_ids(sub.id).await?,
        };
        let DeliveryOutcome { sent, failed } =
            deliver_to(self.notifier.as_ref(), channel_id, &target, |mention| {
                reconciliation
                    .new_items
                    .iter()
                    .map(|item| torrent_message(mention, &sub.name, item))
                    .collect()
            })
            .await?;
        info!(
            "Delivered {sent} new seeds for nyaa `{}` ({failed} failed).",
            sub.name
        );
        Ok(())
    }
}

#[async_trait]
impl Poller for NyaaPoller {
    fn name(&self) -> &'static str {
        "nyaa"
    }

    async fn poll(&self) -> anyhow::Result<PollControl> {
        let subs = self.repository.nyaa.select_all().await?;
        if subs.is_empty() {
            return Ok(PollControl::Continue);
        }

        let recent = match self.platform.fetch_recent().await {
            Ok(recent) => recent,
            Err(e) => {
                warn!("Skipping nyaa cycle, fetch failed: {e}");
                return Ok(PollControl::Continue);
            }
        };

        for sub in &subs {
            if let Err(e) = self.process(sub, &recent).await {
                error!("Error processing nyaa id `{}` ({}): {e:?}", sub.id, sub.name);
            }
        }
        Ok(PollControl::Continue)
    }
}
