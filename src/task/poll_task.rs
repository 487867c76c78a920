//! Fixed-period polling loop shared by every feed type.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use log::error;
use log::info;
use log::warn;
use tokio::task::JoinHandle;

/// What the loop should do after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollControl {
    Continue,
    /// Stop polling until the task is started again.
    Halt,
}

/// One feed type's fetch, reconcile and deliver cycle.
#[async_trait]
pub trait Poller: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs one cycle. Errors are logged by the caller and do not stop the
    /// loop; return [`PollControl::Halt`] for that.
    async fn poll(&self) -> anyhow::Result<PollControl>;
}

/// Counts back-to-back failures and trips once `threshold` is reached.
#[derive(Debug)]
pub struct FailureStreak {
    threshold: u32,
    count: AtomicU32,
}

impl FailureStreak {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            count: AtomicU32::new(0),
        }
    }

    /// Records a failure and returns `true` if the streak has tripped.
    pub fn record_failure(&self) -> bool {
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        count >= self.threshold
    }

    pub fn record_success(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

/// Drives a [`Poller`] on a tokio interval.
pub struct PollTask {
    poller: Arc<dyn Poller>,
    poll_interval: Duration,
    running: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PollTask {
    pub fn new(poller: Arc<dyn Poller>, poll_interval: Duration) -> Arc<Self> {
        info!(
            "Initializing {} poller with poll interval {:?}",
            poller.name(),
            poll_interval
        );
        Arc::new(Self {
            poller,
            poll_interval,
            running: AtomicBool::new(false),
            handle: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &'static str {
        self.poller.name()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Starts the polling loop. Does nothing if it is already running.
    pub fn start(self: &Arc<Self>) -> anyhow::Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("Starting {} poll loop.", self.name());
        let handle = self.clone().spawn_poll_loop();
        let mut slot = self
            .handle
            .lock()
            .map_err(|_| anyhow::anyhow!("{} task handle lock poisoned", self.name()))?;
        *slot = Some(handle);
        Ok(())
    }

    /// Stops the loop, aborting any poll in flight.
    pub fn stop(&self) -> anyhow::Result<()> {
        info!("Stopping {} poll loop.", self.name());
        self.running.store(false, Ordering::SeqCst);
        let mut slot = self
            .handle
            .lock()
            .map_err(|_| anyhow::anyhow!("{} task handle lock poisoned", self.name()))?;
        if let Some(handle) = slot.take() {
            handle.abort();
        }
        Ok(())
    }

    fn spawn_poll_loop(self: Arc<Self>) -> JoinHandle<()> {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::spawn(async move {
            loop {
                interval.tick().await;
                if !self.is_running() {
                    info!("Stopping {} poll loop.", self.name());
                    break;
                }
                if self.tick().await == PollControl::Halt {
                    break;
                }
            }
        })
    }

    /// Runs a single poll and applies its control decision.
    pub async fn tick(&self) -> PollControl {
        match self.poller.poll().await {
            Ok(PollControl::Continue) => PollControl::Continue,
            Ok(PollControl::Halt) => {
                warn!("{} poller halted. It stays off until restarted.", self.name());
                self.running.store(false, Ordering::SeqCst);
                PollControl::Halt
            }
            Err(e) => {
                error!("Error polling {}: {e:?}", self.name());
                PollControl::Continue
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_streak_trips_at_threshold() {
        let streak = FailureStreak::new(3);
        assert!(!streak.record_failure());
        assert!(!streak.record_failure());
        assert!(streak.record_failure());
    }

    #[test]
    fn test_failure_streak_resets_on_success() {
        let streak = FailureStreak::new(2);
        assert!(!streak.record_failure());
        streak.record_success();
        assert_eq!(streak.count(), 0);
        assert!(!streak.record_failure());
    }

    struct Halting;

    #[async_trait]
    impl Poller for Halting {
        fn name(&self) -> &'static str {
            "halting"
        }
        async fn poll(&self) -> anyhow::Result<PollControl> {
            Ok(PollControl::Halt)
        }
    }

    #[tokio::test]
    async fn test_halt_stops_running() {
        let task = PollTask::new(Arc::new(Halting), Duration::from_millis(10));
        task.start().unwrap();
        assert_eq!(task.tick().await, PollControl::Halt);
        assert!(!task.is_running());
        task.stop().unwrap();
    }
}
