use chrono::NaiveDate;

use crate::calendar::{shift, CycleCalculator, CycleError};
use crate::models::{CycleStats, NextPeriodPrediction, PeriodRecord};
use crate::settings::CalculatorSettings;

impl CycleCalculator {
    /// Start of the next period: `period_start_date + cycle_length`.
    pub fn try_next_period(&self, record: &PeriodRecord) -> Result<NaiveDate, CycleError> {
        let params = self.resolve(record)?;
        params
            .window(1)
            .map(|w| w.period_start)
            .ok_or(CycleError::OutOfRange)
    }

    /// Next period with its bleeding span and a countdown from `today`.
    /// `None` when there is no usable record yet.
    pub fn next_period(
        &self,
        record: Option<&PeriodRecord>,
        today: NaiveDate,
    ) -> Option<NextPeriodPrediction> {
        let record = record?;
        let window = match self.resolve(record).map(|p| p.window(1)) {
            Ok(Some(window)) => window,
            Ok(None) => return None,
            Err(err) => {
                log::debug!(
                    "event=next_period module=prediction status=skipped record={} error={}",
                    record.id,
                    err
                );
                return None;
            }
        };

        Some(NextPeriodPrediction {
            predicted_start: window.period_start,
            predicted_end: shift(window.period_end, -1)?,
            days_until: days_until(today, window.period_start),
        })
    }
}

/// Next period start with default settings. `None` for an absent or invalid record.
pub fn compute_next_period(record: Option<&PeriodRecord>) -> Option<NaiveDate> {
    CycleCalculator::default().try_next_period(record?).ok()
}

/// Whole days from `today` until `date`, never negative.
pub fn days_until(today: NaiveDate, date: NaiveDate) -> i64 {
    (date - today).num_days().max(0)
}

/// The record with the latest start date.
///
/// Ties go to the earliest entry, which is the newest row when the store
/// returns rows most-recent-first.
pub fn latest_record(records: &[PeriodRecord]) -> Option<&PeriodRecord> {
    records
        .iter()
        .rev()
        .filter(|r| r.period_start_date.is_some())
        .max_by_key(|r| r.period_start_date)
}

/// Compute cycle statistics over a user's record history.
pub fn cycle_stats(records: &[PeriodRecord], settings: &CalculatorSettings) -> CycleStats {
    let mut dated: Vec<(&PeriodRecord, NaiveDate)> = records
        .iter()
        .filter_map(|r| r.period_start_date.map(|start| (r, start)))
        .collect();
    dated.sort_by_key(|(_, start)| *start);
    // Same start logged twice is one cycle, not a zero-length one
    dated.dedup_by_key(|(_, start)| *start);

    let Some(&(last, last_start)) = dated.last() else {
        return CycleStats::empty();
    };

    let period_lengths: Vec<f64> = dated
        .iter()
        .map(|(r, start)| period_length(r, *start, settings) as f64)
        .collect();

    let cycle_lengths: Vec<i64> = dated
        .windows(2)
        .map(|w| (w[1].1 - w[0].1).num_days())
        .collect();

    CycleStats {
        total_cycles: dated.len(),
        avg_cycle_length: if cycle_lengths.is_empty() {
            None
        } else {
            Some(cycle_lengths.iter().sum::<i64>() as f32 / cycle_lengths.len() as f32)
        },
        avg_period_length: Some(mean(&period_lengths) as f32),
        shortest_cycle: cycle_lengths.iter().copied().min(),
        longest_cycle: cycle_lengths.iter().copied().max(),
        last_period_start: Some(last_start),
        last_period_end: last.period_end_date,
    }
}

/// Observed bleeding days when an end date was logged, the recorded length otherwise.
fn period_length(record: &PeriodRecord, start: NaiveDate, settings: &CalculatorSettings) -> i64 {
    match record.period_end_date {
        Some(end) if end >= start => (end - start).num_days() + 1,
        _ => record
            .period_length
            .filter(|len| *len > 0)
            .unwrap_or(settings.default_period_length),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
