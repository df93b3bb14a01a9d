//! Per-day cycle phase derivation.
//!
//! Every day gets exactly one [`PhaseStatus`]. When a day falls into several
//! windows the highest [`PhaseStatus::rank`] wins, so the tie-break does not
//! depend on the order windows are visited in.

use chrono::{Datelike, Days, NaiveDate};

use crate::models::{CycleWindow, DayPhase, MonthPhases, PeriodRecord, PhaseStatus};
use crate::navigation::MonthCursor;
use crate::settings::{CalculatorSettings, SettingsError};

/// Ovulation sits this many days before the midpoint-based cycle offset.
const LUTEAL_PHASE_DAYS: i64 = 14;
const FERTILE_DAYS_BEFORE_OVULATION: i64 = 5;
const FERTILE_DAYS_AFTER_OVULATION: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecordProblem {
    #[error("period start date is missing")]
    MissingStartDate,
    #[error("cycle length must be positive, got {0}")]
    NonPositiveCycleLength(i64),
    #[error("period length must be positive, got {0}")]
    NonPositivePeriodLength(i64),
    #[error("cycle of {cycle_length} days with {period_length} bleeding days does not fit the calendar")]
    LengthOutOfRange { cycle_length: i64, period_length: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    #[error("invalid period record: {0}")]
    InvalidRecord(#[from] RecordProblem),
    #[error("invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("invalid month {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("date arithmetic left the supported calendar range")]
    OutOfRange,
}

/// Record fields after default substitution and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleParams {
    pub anchor: NaiveDate,
    pub cycle_length: i64,
    pub period_length: i64,
}

impl CycleParams {
    /// The only place absent lengths are replaced by defaults.
    pub fn resolve(
        record: &PeriodRecord,
        settings: &CalculatorSettings,
    ) -> Result<Self, CycleError> {
        let anchor = record
            .period_start_date
            .ok_or(RecordProblem::MissingStartDate)?;
        let cycle_length = record.cycle_length.unwrap_or(settings.default_cycle_length);
        let period_length = record
            .period_length
            .unwrap_or(settings.default_period_length);

        if cycle_length <= 0 {
            return Err(RecordProblem::NonPositiveCycleLength(cycle_length).into());
        }
        if period_length <= 0 {
            return Err(RecordProblem::NonPositivePeriodLength(period_length).into());
        }

        let params = Self {
            anchor,
            cycle_length,
            period_length,
        };
        // The recorded cycle must be fully representable; projections may still fall off the calendar
        if params.window(0).is_none() {
            return Err(RecordProblem::LengthOutOfRange {
                cycle_length,
                period_length,
            }
            .into());
        }
        Ok(params)
    }

    /// Ovulation relative to cycle start: `floor(cycle_length / 2) - 14`.
    ///
    /// Lands on the start day at 28 and before it for shorter cycles. Kept as
    /// is until product confirms the intended formula.
    pub fn ovulation_offset(&self) -> i64 {
        self.cycle_length.div_euclid(2) - LUTEAL_PHASE_DAYS
    }

    /// The cycle `offset` whole cycles away from the recorded one.
    pub fn window(&self, offset: i64) -> Option<CycleWindow> {
        let period_start = shift(self.anchor, offset.checked_mul(self.cycle_length)?)?;
        let ovulation_day = shift(period_start, self.ovulation_offset())?;
        Some(CycleWindow {
            offset,
            period_start,
            period_end: shift(period_start, self.period_length)?,
            ovulation_day,
            fertile_start: shift(ovulation_day, -FERTILE_DAYS_BEFORE_OVULATION)?,
            fertile_end: shift(ovulation_day, FERTILE_DAYS_AFTER_OVULATION)?,
            recorded: offset == 0,
        })
    }
}

impl CycleWindow {
    /// Status of `day` with respect to this window alone.
    pub fn status_on(&self, day: NaiveDate) -> PhaseStatus {
        if day >= self.period_start && day < self.period_end {
            if self.recorded {
                PhaseStatus::Period
            } else {
                PhaseStatus::PredictedPeriod
            }
        } else if day == self.ovulation_day {
            PhaseStatus::Ovulation
        } else if day >= self.fertile_start && day <= self.fertile_end {
            PhaseStatus::Fertile
        } else {
            PhaseStatus::Normal
        }
    }
}

/// Highest-ranked status across `windows`.
pub fn classify(windows: &[CycleWindow], day: NaiveDate) -> PhaseStatus {
    windows
        .iter()
        .map(|w| w.status_on(day))
        .max_by_key(|s| s.rank())
        .unwrap_or(PhaseStatus::Normal)
}

/// Stateless calculator. Holds only the immutable settings that control
/// default substitution and projection reach.
#[derive(Debug, Clone, Default)]
pub struct CycleCalculator {
    settings: CalculatorSettings,
}

impl CycleCalculator {
    pub fn new(settings: CalculatorSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &CalculatorSettings {
        &self.settings
    }

    pub fn resolve(&self, record: &PeriodRecord) -> Result<CycleParams, CycleError> {
        CycleParams::resolve(record, &self.settings)
    }

    /// Recorded cycle plus projections on each side.
    ///
    /// At least one cycle is projected each way, and enough of them that the
    /// projections reach `projection_days` past the recorded start in both
    /// directions. Days beyond that reach stay `normal`.
    pub fn windows(&self, params: &CycleParams) -> Vec<CycleWindow> {
        let reach = self.settings.projection_days.max(1);
        let cycle = params.cycle_length;
        let count = (reach / cycle + i64::from(reach % cycle != 0)).max(1);
        (-count..=count)
            .filter_map(|k| {
                let window = params.window(k);
                if window.is_none() {
                    log::warn!(
                        "event=cycle_window module=calendar status=dropped offset={} anchor={} cycle_length={}",
                        k,
                        params.anchor,
                        params.cycle_length
                    );
                }
                window
            })
            .collect()
    }

    pub fn range_phases(
        &self,
        record: &PeriodRecord,
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    ) -> Result<Vec<DayPhase>, CycleError> {
        if start > end {
            return Err(CycleError::InvalidRange { start, end });
        }
        let params = self.resolve(record)?;
        let windows = self.windows(&params);
        Ok(day_phases(start, end, today, |day| classify(&windows, day)))
    }

    pub fn try_month_phases(
        &self,
        record: &PeriodRecord,
        month: MonthCursor,
        today: NaiveDate,
    ) -> Result<MonthPhases, CycleError> {
        let days = self.range_phases(record, month.first_day(), month.last_day(), today)?;
        Ok(MonthPhases {
            year: month.year(),
            month: month.month(),
            days,
        })
    }

    /// Month view that never fails: no record or an unusable one renders as
    /// a full month of `normal` days.
    pub fn month_phases(
        &self,
        record: Option<&PeriodRecord>,
        month: MonthCursor,
        today: NaiveDate,
    ) -> MonthPhases {
        if let Some(record) = record {
            match self.try_month_phases(record, month, today) {
                Ok(phases) => return phases,
                Err(CycleError::InvalidRecord(RecordProblem::MissingStartDate)) => {
                    log::debug!(
                        "event=month_phases module=calendar status=no_data record={}",
                        record.id
                    );
                }
                Err(err) => {
                    log::warn!(
                        "event=month_phases module=calendar status=invalid record={} error={}",
                        record.id,
                        err
                    );
                }
            }
        }
        MonthPhases {
            year: month.year(),
            month: month.month(),
            days: day_phases(month.first_day(), month.last_day(), today, |_| {
                PhaseStatus::Normal
            }),
        }
    }
}

/// Month phases with default settings. `month_day` picks the month; its day is ignored.
pub fn compute_month_phases(
    record: Option<&PeriodRecord>,
    month_day: NaiveDate,
    today: NaiveDate,
) -> MonthPhases {
    CycleCalculator::default().month_phases(record, MonthCursor::from_date(month_day), today)
}

/// Today's date in the device's local time zone.
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn day_phases(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
    status_of: impl Fn(NaiveDate) -> PhaseStatus,
) -> Vec<DayPhase> {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|date| DayPhase {
            date,
            day_number: date.day(),
            status: status_of(date),
            is_today: date == today,
        })
        .collect()
}

/// Calendar-day offset without overflow panics.
pub(crate) fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}
