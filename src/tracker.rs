//! Per-user cycle service.
//!
//! # Responsibility
//! - Hold the latest period records fetched for one user.
//! - Keep them current from a realtime change feed between `start` and `stop`.
//! - Answer calendar and home-screen queries through [`CycleCalculator`].
//!
//! # Invariants
//! - Queries never mutate records; month navigation only changes the cursor.
//! - Changes for other users are ignored.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::calendar::{CycleCalculator, CycleError};
use crate::models::{CycleStats, MonthPhases, NextPeriodPrediction, PeriodRecord};
use crate::navigation::MonthCursor;
use crate::prediction;

pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordChange {
    Upserted(PeriodRecord),
    Deleted(Uuid),
}

/// Backend query for a user's period rows, newest first.
pub trait RecordSource {
    fn fetch_records(&self, user_id: Uuid) -> Result<Vec<PeriodRecord>, SourceError>;
}

pub trait RecordListener: Send + Sync {
    fn on_change(&self, change: RecordChange);
}

/// Realtime change feed for period rows.
pub trait RecordFeed {
    fn subscribe(
        &self,
        user_id: Uuid,
        listener: Arc<dyn RecordListener>,
    ) -> Result<SubscriptionId, SourceError>;

    fn unsubscribe(&self, id: SubscriptionId);
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("record source failed: {0}")]
    Source(SourceError),
    #[error("change feed failed: {0}")]
    Feed(SourceError),
    #[error("tracker state poisoned")]
    Poisoned,
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Cycle(#[from] CycleError),
}

pub struct CycleTracker {
    user_id: Uuid,
    calculator: CycleCalculator,
    records: Mutex<Vec<PeriodRecord>>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl CycleTracker {
    pub fn new(user_id: Uuid, calculator: CycleCalculator) -> Self {
        Self {
            user_id,
            calculator,
            records: Mutex::new(Vec::new()),
            subscription: Mutex::new(None),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn calculator(&self) -> &CycleCalculator {
        &self.calculator
    }

    /// Replace the held history with a fresh fetch.
    pub fn load(&self, source: &dyn RecordSource) -> Result<usize, TrackerError> {
        let fetched = source
            .fetch_records(self.user_id)
            .map_err(TrackerError::Source)?;
        let mut records = self.records()?;
        *records = fetched
            .into_iter()
            .filter(|r| r.user_id == self.user_id)
            .collect();
        log::info!(
            "event=records_load module=tracker status=ok count={}",
            records.len()
        );
        Ok(records.len())
    }

    pub fn apply_change(&self, change: RecordChange) -> Result<(), TrackerError> {
        let mut records = self.records()?;
        match change {
            RecordChange::Upserted(record) => {
                if record.user_id != self.user_id {
                    return Ok(());
                }
                log::debug!(
                    "event=record_change module=tracker kind=upsert record={}",
                    record.id
                );
                match records.iter_mut().find(|r| r.id == record.id) {
                    Some(existing) => *existing = record,
                    None => records.insert(0, record),
                }
            }
            RecordChange::Deleted(id) => {
                log::debug!("event=record_change module=tracker kind=delete record={id}");
                records.retain(|r| r.id != id);
            }
        }
        Ok(())
    }

    /// Subscribe to the change feed. A second call while running is a no-op.
    pub fn start(self: &Arc<Self>, feed: &dyn RecordFeed) -> Result<(), TrackerError> {
        let mut subscription = self.subscription.lock().map_err(|_| TrackerError::Poisoned)?;
        if subscription.is_some() {
            return Ok(());
        }
        let listener: Arc<dyn RecordListener> = self.clone();
        let id = feed
            .subscribe(self.user_id, listener)
            .map_err(TrackerError::Feed)?;
        *subscription = Some(id);
        log::info!("event=feed_start module=tracker status=ok subscription={}", id.0);
        Ok(())
    }

    pub fn stop(&self, feed: &dyn RecordFeed) -> Result<(), TrackerError> {
        let mut subscription = self.subscription.lock().map_err(|_| TrackerError::Poisoned)?;
        if let Some(id) = subscription.take() {
            feed.unsubscribe(id);
            log::info!("event=feed_stop module=tracker status=ok subscription={}", id.0);
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.subscription
            .lock()
            .map(|s| s.is_some())
            .unwrap_or(false)
    }

    /// Most recent record, the anchor for every prediction.
    pub fn current_record(&self) -> Result<Option<PeriodRecord>, TrackerError> {
        let records = self.records()?;
        Ok(prediction::latest_record(&records).cloned())
    }

    pub fn month(&self, cursor: MonthCursor, today: NaiveDate) -> Result<MonthPhases, TrackerError> {
        let current = self.current_record()?;
        Ok(self.calculator.month_phases(current.as_ref(), cursor, today))
    }

    pub fn next_period(
        &self,
        today: NaiveDate,
    ) -> Result<Option<NextPeriodPrediction>, TrackerError> {
        let current = self.current_record()?;
        Ok(self.calculator.next_period(current.as_ref(), today))
    }

    pub fn days_until_next_period(&self, today: NaiveDate) -> Result<Option<i64>, TrackerError> {
        Ok(self.next_period(today)?.map(|p| p.days_until))
    }

    pub fn stats(&self) -> Result<CycleStats, TrackerError> {
        let records = self.records()?;
        Ok(prediction::cycle_stats(&records, self.calculator.settings()))
    }

    pub fn export_json(&self) -> Result<String, TrackerError> {
        let records = self.records()?;
        Ok(serde_json::to_string_pretty(&*records)?)
    }

    fn records(&self) -> Result<MutexGuard<'_, Vec<PeriodRecord>>, TrackerError> {
        self.records.lock().map_err(|_| TrackerError::Poisoned)
    }
}

impl RecordListener for CycleTracker {
    fn on_change(&self, change: RecordChange) {
        if let Err(err) = self.apply_change(change) {
            log::error!("event=record_change module=tracker status=error error={err}");
        }
    }
}
