//! Background tasks: feed pollers and daily reminder timers.

use std::collections::HashMap;
use std::sync::Arc;

use log::error;

use crate::task::poll_task::PollTask;

pub mod daily_scheduler;
pub mod jnovel_poller;
pub mod mangadex_poller;
pub mod nyaa_poller;
pub mod poll_task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Nyaa,
    MangaDex,
    JNovel,
}

/// Owns the poll loop of each feed type.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<FeedKind, Arc<PollTask>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces and stops any task already registered for `kind`.
    pub fn register(&mut self, kind: FeedKind, task: Arc<PollTask>) {
        if let Some(old) = self.tasks.insert(kind, task)
            && let Err(e) = old.stop()
        {
            error!("Failed to stop replaced {kind:?} task: {e}");
        }
    }

    pub fn get(&self, kind: FeedKind) -> Option<&Arc<PollTask>> {
        self.tasks.get(&kind)
    }

    pub fn start_all(&self) -> anyhow::Result<()> {
        for task in self.tasks.values() {
            task.start()?;
        }
        Ok(())
    }

    pub fn stop_all(&self) {
        for (kind, task) in &self.tasks {
            if let Err(e) = task.stop() {
                error!("Failed to stop {kind:?} task: {e}");
            }
        }
    }
}
