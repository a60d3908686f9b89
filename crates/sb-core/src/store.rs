//! The read-through repository the engine runs against.
//!
//! The engine owns no durable state. Every oracle check, registry mutation
//! and view projection reads the store again through [`ScheduleStore`], so
//! writes made by other collaborators are visible on the next call.

use chrono::NaiveDate;
use thiserror::Error;

use crate::records::{BlockedSlot, NewReservation, Reservation, ServiceCatalog};
use crate::time::{ClockTime, DateRange};
use crate::types::BlockId;

/// Failure of a store round trip.
#[derive(Debug, Error)]
#[error("store unavailable: {message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// List/create/delete access to reservations and blocked slots.
///
/// Implementations do not need to enforce uniqueness of blocks; the engine
/// checks before it inserts.
pub trait ScheduleStore {
    /// Reservations of any status whose date falls in `range`.
    fn list_reservations(&self, range: DateRange) -> Result<Vec<Reservation>, StoreError>;

    /// Day-level and slot-level blocks whose date falls in `range`.
    fn list_blocked_slots(&self, range: DateRange) -> Result<Vec<BlockedSlot>, StoreError>;

    /// Persists a block; `time == None` blocks the whole day.
    fn create_blocked_slot(
        &mut self,
        date: NaiveDate,
        time: Option<ClockTime>,
        reason: &str,
    ) -> Result<BlockedSlot, StoreError>;

    fn delete_blocked_slot(&mut self, id: &BlockId) -> Result<(), StoreError>;

    fn create_reservation(&mut self, fields: NewReservation) -> Result<Reservation, StoreError>;

    fn service_catalog(&self) -> Result<ServiceCatalog, StoreError>;
}

/// Both collections for one date range, read in a single pass.
///
/// Lives for one operation only; never hold on to it across mutations.
#[derive(Debug, Clone, Default)]
pub struct CalendarSnapshot {
    pub reservations: Vec<Reservation>,
    pub blocks: Vec<BlockedSlot>,
}

impl CalendarSnapshot {
    pub fn fetch<S: ScheduleStore + ?Sized>(
        store: &S,
        range: DateRange,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            reservations: store.list_reservations(range)?,
            blocks: store.list_blocked_slots(range)?,
        })
    }

    /// Confirmed reservations on `date`, the only ones that occupy time.
    pub fn confirmed_on(&self, date: NaiveDate) -> impl Iterator<Item = &Reservation> {
        self.reservations
            .iter()
            .filter(move |r| r.date == date && r.status.occupies_calendar())
    }

    /// Reservations on `date` that count towards summaries.
    pub fn counted_on(&self, date: NaiveDate) -> usize {
        self.reservations
            .iter()
            .filter(|r| r.date == date && r.status.is_counted())
            .count()
    }

    pub fn all_day_block(&self, date: NaiveDate) -> Option<&BlockedSlot> {
        self.blocks.iter().find(|b| b.targets(date, None))
    }

    pub fn slot_block(&self, date: NaiveDate, time: ClockTime) -> Option<&BlockedSlot> {
        self.blocks.iter().find(|b| b.targets(date, Some(time)))
    }

    /// Slot-level blocks on `date`.
    pub fn slot_blocks_on(&self, date: NaiveDate) -> impl Iterator<Item = &BlockedSlot> {
        self.blocks
            .iter()
            .filter(move |b| b.date == date && !b.all_day())
    }
}
