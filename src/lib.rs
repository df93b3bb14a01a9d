//! Menstrual cycle phases and next-period prediction for FitFemme.
//!
//! All computation is pure date arithmetic over a [`PeriodRecord`] fetched by
//! the caller. [`CycleTracker`] wraps the calculator for screens that follow a
//! user's records through the backend's change feed.

pub mod calendar;
pub mod logging;
pub mod models;
pub mod navigation;
pub mod prediction;
pub mod settings;
pub mod tracker;

pub use calendar::{
    compute_month_phases, local_today, CycleCalculator, CycleError, CycleParams, RecordProblem,
};
pub use logging::{default_log_dir, init_from_settings, init_logging, logging_status, LoggingError};
pub use models::{
    CycleStats, CycleWindow, DayPhase, MonthPhases, NextPeriodPrediction, PeriodRecord,
    PhaseStatus,
};
pub use navigation::MonthCursor;
pub use prediction::{compute_next_period, cycle_stats, days_until, latest_record};
pub use settings::{CalculatorSettings, SettingsError};
pub use tracker::{
    CycleTracker, RecordChange, RecordFeed, RecordListener, RecordSource, SourceError,
    SubscriptionId, TrackerError,
};
