use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the `period_records` table as delivered by the backend.
///
/// Every computed field is optional on the wire; missing lengths fall back to
/// the configured defaults, a missing start date makes the record unusable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub period_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub period_length: Option<i64>,
    #[serde(default)]
    pub cycle_length: Option<i64>,
    /// Observed end of bleeding. Phase math ignores it.
    #[serde(default)]
    pub period_end_date: Option<NaiveDate>,
}

impl PeriodRecord {
    pub fn new(user_id: Uuid, period_start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            period_start_date: Some(period_start_date),
            period_length: None,
            cycle_length: None,
            period_end_date: None,
        }
    }

    pub fn with_lengths(mut self, cycle_length: i64, period_length: i64) -> Self {
        self.cycle_length = Some(cycle_length);
        self.period_length = Some(period_length);
        self
    }

    pub fn with_end_date(mut self, end: NaiveDate) -> Self {
        self.period_end_date = Some(end);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseStatus {
    Period,
    PredictedPeriod,
    Ovulation,
    Fertile,
    Normal,
}

impl PhaseStatus {
    /// Tie-break rank when windows overlap. Higher wins.
    pub fn rank(self) -> u8 {
        match self {
            PhaseStatus::Period => 4,
            PhaseStatus::PredictedPeriod => 3,
            PhaseStatus::Ovulation => 2,
            PhaseStatus::Fertile => 1,
            PhaseStatus::Normal => 0,
        }
    }

    pub fn is_bleeding(self) -> bool {
        matches!(self, PhaseStatus::Period | PhaseStatus::PredictedPeriod)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayPhase {
    pub date: NaiveDate,
    pub day_number: u32,
    pub status: PhaseStatus,
    /// Presentation hint only, never folded into `status`.
    pub is_today: bool,
}

/// Data returned to the calendar for a month view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthPhases {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DayPhase>,
}

impl MonthPhases {
    pub fn status_on(&self, date: NaiveDate) -> Option<PhaseStatus> {
        self.days.iter().find(|d| d.date == date).map(|d| d.status)
    }
}

/// One recorded or projected cycle, all bounds as calendar dates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleWindow {
    /// Multiple of the cycle length from the recorded start. Zero is the recorded cycle.
    pub offset: i64,
    pub period_start: NaiveDate,
    /// Exclusive.
    pub period_end: NaiveDate,
    pub ovulation_day: NaiveDate,
    pub fertile_start: NaiveDate,
    pub fertile_end: NaiveDate,
    pub recorded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NextPeriodPrediction {
    pub predicted_start: NaiveDate,
    pub predicted_end: NaiveDate,
    pub days_until: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleStats {
    pub total_cycles: usize,
    pub avg_cycle_length: Option<f32>,
    pub avg_period_length: Option<f32>,
    pub shortest_cycle: Option<i64>,
    pub longest_cycle: Option<i64>,
    pub last_period_start: Option<NaiveDate>,
    pub last_period_end: Option<NaiveDate>,
}

impl CycleStats {
    pub fn empty() -> Self {
        Self {
            total_cycles: 0,
            avg_cycle_length: None,
            avg_period_length: None,
            shortest_cycle: None,
            longest_cycle: None,
            last_period_start: None,
            last_period_end: None,
        }
    }
}
