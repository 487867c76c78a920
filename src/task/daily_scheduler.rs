//! Per-user daily reminder timers.
//!
//! Each reminder row owns at most one live timer. [`DailyScheduler::schedule`]
//! reconciles the timer map against the table: timers of deleted rows are
//! aborted and rows without a live timer get one.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use futures::future::BoxFuture;
use log::debug;
use log::error;
use log::info;
use log::warn;
use tokio::task::JoinHandle;

use crate::model::DailyModel;
use crate::repository::Repository;
use crate::repository::table::Table;
use crate::subscriber::Notifier;
use crate::subscriber::message_builder::daily_reminder_message;

pub const DAY_SECS: i64 = 86_400;
/// Provisional delay set on fire so an unanswered reminder still comes back.
pub const GRACE_SECS: i64 = 300;

/// Time left until `timestamp + 1 day`, clamped at zero.
pub fn sleep_duration(timestamp: i64, now: i64) -> Duration {
    Duration::from_secs((timestamp + DAY_SECS - now).max(0) as u64)
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

struct ScheduledTimer {
    generation: u64,
    wake_at: i64,
    handle: JoinHandle<()>,
}

pub struct DailyScheduler {
    repository: Arc<Repository>,
    notifier: Arc<dyn Notifier>,
    timers: Mutex<HashMap<u64, ScheduledTimer>>,
    next_generation: AtomicU64,
    reconcile_lock: tokio::sync::Mutex<()>,
}

impl DailyScheduler {
    pub fn new(repository: Arc<Repository>, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        Arc::new(Self {
            repository,
            notifier,
            timers: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            reconcile_lock: tokio::sync::Mutex::new(()),
        })
    }

    fn timers(&self) -> MutexGuard<'_, HashMap<u64, ScheduledTimer>> {
        // A poisoned map still holds valid handles.
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Brings the timer map in line with the reminder table.
    ///
    /// Boxed because timers call back into it after firing.
    pub fn schedule(self: &Arc<Self>) -> BoxFuture<'static, anyhow::Result<()>> {
        let this = self.clone();
        Box::pin(async move {
            let _guard = this.reconcile_lock.lock().await;
            let rows = this.repository.daily.select_all().await?;
            this.reconcile_timers(rows, now());
            Ok(())
        })
    }

    fn reconcile_timers(self: &Arc<Self>, rows: Vec<DailyModel>, now: i64) {
        let users: HashSet<u64> = rows.iter().map(|row| row.creator_id).collect();
        let mut timers = self.timers();

        timers.retain(|user_id, timer| {
            if !users.contains(user_id) {
                debug!("Cancelling daily timer of user {user_id}");
                timer.handle.abort();
                return false;
            }
            !timer.handle.is_finished()
        });

        for row in rows {
            if timers.contains_key(&row.creator_id) {
                continue;
            }
            let timer = self.spawn_timer(&row, now);
            debug!(
                "Scheduled daily reminder of user {} at {}",
                row.creator_id, timer.wake_at
            );
            timers.insert(row.creator_id, timer);
        }
    }

    fn spawn_timer(self: &Arc<Self>, row: &DailyModel, now: i64) -> ScheduledTimer {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let delay = sleep_duration(row.timestamp, now);
        let user_id = row.creator_id;
        let this = self.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = this.fire(user_id, generation).await {
                error!("Error firing daily reminder of user {user_id}: {e:?}");
            }
        });

        ScheduledTimer {
            generation,
            wake_at: now + delay.as_secs() as i64,
            handle,
        }
    }

    /// Drops the map entry only if it still belongs to the given timer.
    fn forget(&self, user_id: u64, generation: u64) {
        let mut timers = self.timers();
        if timers
            .get(&user_id)
            .is_some_and(|timer| timer.generation == generation)
        {
            timers.remove(&user_id);
        }
    }

    fn abort_timer(&self, user_id: u64) {
        if let Some(timer) = self.timers().remove(&user_id) {
            timer.handle.abort();
        }
    }

    async fn fire(self: Arc<Self>, user_id: u64, generation: u64) -> anyhow::Result<()> {
        let Some(row) = self.repository.daily.select_by_creator(user_id).await? else {
            self.forget(user_id, generation);
            return Ok(());
        };

        let exists = match self.notifier.user_exists(user_id).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Could not check user {user_id}, assuming reachable: {e}");
                true
            }
        };
        if !exists {
            info!("User {user_id} is gone, removing their daily reminder.");
            self.repository.daily.delete_by_creator(user_id).await?;
            self.forget(user_id, generation);
            return Ok(());
        }

        self.repository
            .daily
            .update_timestamp_by_creator(user_id, now() + GRACE_SECS)
            .await?;
        let message = daily_reminder_message(user_id, row.message.as_deref());
        if let Err(e) = self.notifier.send_dm(user_id, &message).await {
            warn!("Failed to send daily reminder to user {user_id}: {e}");
        }

        self.forget(user_id, generation);
        self.schedule().await
    }

    /// Restarts the 24 hour cycle from now. Returns `false` if the user has
    /// no reminder.
    pub async fn acknowledge(self: &Arc<Self>, user_id: u64) -> anyhow::Result<bool> {
        let updated = self
            .repository
            .daily
            .update_timestamp_by_creator(user_id, now())
            .await?;
        if updated {
            self.abort_timer(user_id);
            self.schedule().await?;
        }
        Ok(updated)
    }

    /// Deletes the reminder. Returns `false` if the user had none.
    pub async fn cancel(self: &Arc<Self>, user_id: u64) -> anyhow::Result<bool> {
        let deleted = self.repository.daily.delete_by_creator(user_id).await?;
        self.schedule().await?;
        Ok(deleted)
    }

    pub fn is_scheduled(&self, user_id: u64) -> bool {
        self.timers()
            .get(&user_id)
            .is_some_and(|timer| !timer.handle.is_finished())
    }

    /// Unix time the user's live timer wakes at.
    pub fn wake_at(&self, user_id: u64) -> Option<i64> {
        self.timers().get(&user_id).map(|timer| timer.wake_at)
    }

    /// Aborts every timer.
    pub fn shutdown(&self) {
        let mut timers = self.timers();
        info!("Stopping {} daily reminder timers.", timers.len());
        for (_, timer) in timers.drain() {
            timer.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_duration_counts_down_a_day() {
        assert_eq!(sleep_duration(1_000, 1_000), Duration::from_secs(86_400));
        assert_eq!(sleep_duration(1_000, 1_000 + 86_000), Duration::from_secs(400));
    }

    #[test]
    fn test_sleep_duration_clamps_overdue() {
        assert_eq!(sleep_duration(0, 90_000), Duration::ZERO);
    }
}
