use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::CycleError;

/// A displayed calendar month. Moving it never touches period data.
///
/// Always holds a representable first-of-month date, including after
/// deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMonth", into = "RawMonth")]
pub struct MonthCursor {
    first: NaiveDate,
}

/// Wire shape of a cursor: `{"year": 2024, "month": 2}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawMonth {
    year: i32,
    month: u32,
}

impl TryFrom<RawMonth> for MonthCursor {
    type Error = CycleError;

    fn try_from(raw: RawMonth) -> Result<Self, Self::Error> {
        MonthCursor::new(raw.year, raw.month)
    }
}

impl From<MonthCursor> for RawMonth {
    fn from(cursor: MonthCursor) -> Self {
        RawMonth {
            year: cursor.year(),
            month: cursor.month(),
        }
    }
}

impl MonthCursor {
    pub fn new(year: i32, month: u32) -> Result<Self, CycleError> {
        let first =
            NaiveDate::from_ymd_opt(year, month, 1).ok_or(CycleError::InvalidMonth { year, month })?;
        Ok(Self { first })
    }

    /// The month containing `date`; the day component is ignored.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    /// Following month; stays put at the end of the supported calendar.
    pub fn next(self) -> Self {
        self.shift(1).unwrap_or(self)
    }

    /// Preceding month; stays put at the start of the supported calendar.
    pub fn previous(self) -> Self {
        self.shift(-1).unwrap_or(self)
    }

    /// `None` when the target month is outside the supported calendar.
    pub fn shift(self, delta_months: i32) -> Option<Self> {
        let months = Months::new(delta_months.unsigned_abs());
        let first = if delta_months >= 0 {
            self.first.checked_add_months(months)?
        } else {
            self.first.checked_sub_months(months)?
        };
        Some(Self { first })
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }
}
