//! Error taxonomy for the scheduling engine.

use chrono::NaiveDate;
use thiserror::Error;

use crate::selector::BatchOutcome;
use crate::store::StoreError;
use crate::time::ClockTime;

/// Errors surfaced by engine operations.
///
/// `InvalidTimeFormat` and `InvalidDuration` are contract violations raised
/// before any store access. `SlotUnavailable` and `DayClosed` are ordinary
/// business outcomes meant for user messaging.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// A time string was not in `HH:MM` form.
    #[error("invalid time format: {value:?} (expected HH:MM)")]
    InvalidTimeFormat { value: String },

    /// A duration was zero, negative or longer than a day.
    #[error("invalid duration: {minutes} minutes (must be between 1 and 1440)")]
    InvalidDuration { minutes: i64 },

    /// The requested interval collides with a reservation or a block.
    #[error("slot {date} {time} is not available")]
    SlotUnavailable { date: NaiveDate, time: ClockTime },

    /// The whole date carries an all-day block.
    #[error("{date} is closed")]
    DayClosed { date: NaiveDate },

    /// The service name is not in the catalog.
    #[error("unknown service: {name}")]
    UnknownService { name: String },

    /// Caller-supplied input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The duration warning was shown and not confirmed.
    #[error(
        "booking cancelled: requested {requested_minutes} minutes, service takes {catalog_minutes}"
    )]
    ConfirmationDeclined {
        requested_minutes: i64,
        catalog_minutes: i64,
    },

    /// The external store could not complete a call.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    /// Some cells of a bulk block failed; committed cells stay committed.
    #[error(
        "bulk block partially failed: {} blocked, {} failed",
        .0.blocked.len(),
        .0.failed.len()
    )]
    PartialBatchFailure(Box<BatchOutcome>),
}

impl ScheduleError {
    /// Returns true for expected business outcomes that should not be logged as errors.
    pub const fn is_business_outcome(&self) -> bool {
        matches!(self, Self::SlotUnavailable { .. } | Self::DayClosed { .. })
    }
}

/// Validation errors for core value types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Unknown reservation status string.
    #[error("invalid reservation status: {value}")]
    InvalidStatus { value: String },
}

impl From<ValidationError> for ScheduleError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
