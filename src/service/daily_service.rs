//! Per-user daily reminders. Timers are owned by the daily scheduler.

use std::sync::Arc;

use crate::model::DailyModel;
use crate::repository::Repository;
use crate::repository::error::DatabaseError;
use crate::repository::table::Table;
use crate::service::error::ServiceError;
use crate::task::daily_scheduler::DailyScheduler;

pub struct DailyService {
    pub db: Arc<Repository>,
    pub scheduler: Arc<DailyScheduler>,
}

impl DailyService {
    pub fn new(db: Arc<Repository>, scheduler: Arc<DailyScheduler>) -> Self {
        Self { db, scheduler }
    }

    /// Starts a 24 hour cycle from now.
    pub async fn create(&self, user_id: u64, message: Option<String>) -> Result<(), ServiceError> {
        if self.db.daily.select_by_creator(user_id).await?.is_some() {
            return Err(ServiceError::already_exists(
                "You already have a daily counter setup, you can only have one per person.",
            ));
        }

        self.db
            .daily
            .insert(&DailyModel {
                creator_id: user_id,
                timestamp: chrono::Utc::now().timestamp(),
                message,
                ..Default::default()
            })
            .await?;
        self.reschedule().await
    }

    pub async fn delete(&self, user_id: u64) -> Result<(), ServiceError> {
        if !self.db.daily.delete_by_creator(user_id).await? {
            return Err(no_daily());
        }
        self.reschedule().await
    }

    /// The reminder's Done button.
    pub async fn acknowledge(&self, user_id: u64) -> Result<(), ServiceError> {
        match self.scheduler.acknowledge(user_id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(no_daily()),
            Err(e) => Err(scheduler_error(e)),
        }
    }

    /// The reminder's Cancel button.
    pub async fn cancel(&self, user_id: u64) -> Result<(), ServiceError> {
        match self.scheduler.cancel(user_id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(no_daily()),
            Err(e) => Err(scheduler_error(e)),
        }
    }

    async fn reschedule(&self) -> Result<(), ServiceError> {
        self.scheduler.schedule().await.map_err(scheduler_error)
    }
}

fn no_daily() -> ServiceError {
    ServiceError::not_found("You do not have a daily counter setup.")
}

fn scheduler_error(e: anyhow::Error) -> ServiceError {
    match e.downcast::<DatabaseError>() {
        Ok(db) => ServiceError::DatabaseError(db),
        Err(e) => ServiceError::DatabaseError(DatabaseError::InternalError {
            message: e.to_string(),
        }),
    }
}
