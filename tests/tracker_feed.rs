use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use fitfemme_cycle::{
    CycleCalculator, CycleTracker, MonthCursor, PeriodRecord, PhaseStatus, RecordChange,
    RecordFeed, RecordListener, SourceError, SubscriptionId,
};
use uuid::Uuid;

#[derive(Default)]
struct InMemoryFeed {
    next_id: Mutex<u64>,
    listeners: Mutex<HashMap<u64, (Uuid, Arc<dyn RecordListener>)>>,
}

impl InMemoryFeed {
    fn publish(&self, user_id: Uuid, change: RecordChange) {
        let listeners = self.listeners.lock().unwrap();
        for (owner, listener) in listeners.values() {
            if *owner == user_id {
                listener.on_change(change.clone());
            }
        }
    }

    fn subscriber_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

impl RecordFeed for InMemoryFeed {
    fn subscribe(
        &self,
        user_id: Uuid,
        listener: Arc<dyn RecordListener>,
    ) -> Result<SubscriptionId, SourceError> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        self.listeners
            .lock()
            .unwrap()
            .insert(*next_id, (user_id, listener));
        Ok(SubscriptionId(*next_id))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.lock().unwrap().remove(&id.0);
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn feed_updates_reach_calendar_until_stopped() {
    let user = Uuid::new_v4();
    let feed = InMemoryFeed::default();
    let tracker = Arc::new(CycleTracker::new(user, CycleCalculator::default()));

    tracker.start(&feed).unwrap();
    tracker.start(&feed).unwrap();
    assert!(tracker.is_running());
    assert_eq!(feed.subscriber_count(), 1);

    let record = PeriodRecord::new(user, date(2024, 1, 10)).with_lengths(28, 5);
    feed.publish(user, RecordChange::Upserted(record.clone()));

    let today = date(2024, 1, 20);
    let jan = tracker.month(MonthCursor::new(2024, 1).unwrap(), today).unwrap();
    assert_eq!(jan.status_on(date(2024, 1, 10)), Some(PhaseStatus::Period));
    assert_eq!(tracker.days_until_next_period(today).unwrap(), Some(18));

    tracker.stop(&feed).unwrap();
    assert!(!tracker.is_running());
    assert_eq!(feed.subscriber_count(), 0);

    feed.publish(user, RecordChange::Deleted(record.id));
    assert_eq!(tracker.current_record().unwrap(), Some(record));
}

#[test]
fn other_users_changes_are_ignored() {
    let user = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let tracker = CycleTracker::new(user, CycleCalculator::default());

    tracker
        .apply_change(RecordChange::Upserted(PeriodRecord::new(
            stranger,
            date(2024, 3, 1),
        )))
        .unwrap();
    assert_eq!(tracker.current_record().unwrap(), None);
}

#[test]
fn new_period_log_moves_the_anchor() {
    let user = Uuid::new_v4();
    let feed = InMemoryFeed::default();
    let tracker = Arc::new(CycleTracker::new(user, CycleCalculator::default()));
    tracker.start(&feed).unwrap();

    feed.publish(
        user,
        RecordChange::Upserted(PeriodRecord::new(user, date(2024, 1, 10))),
    );
    feed.publish(
        user,
        RecordChange::Upserted(PeriodRecord::new(user, date(2024, 2, 9))),
    );

    let prediction = tracker.next_period(date(2024, 2, 10)).unwrap().unwrap();
    assert_eq!(prediction.predicted_start, date(2024, 3, 8));
    assert_eq!(prediction.predicted_end, date(2024, 3, 12));
    assert_eq!(prediction.days_until, 27);

    let feb = tracker.month(MonthCursor::new(2024, 2).unwrap(), date(2024, 2, 10)).unwrap();
    assert_eq!(feb.status_on(date(2024, 2, 9)), Some(PhaseStatus::Period));
    assert_eq!(feb.status_on(date(2024, 2, 7)), Some(PhaseStatus::Fertile));
    assert_eq!(feb.status_on(date(2024, 2, 1)), Some(PhaseStatus::Normal));

    tracker.stop(&feed).unwrap();
}
