//! Slot availability and scheduling engine.
//!
//! This crate contains the domain logic for a single-resource appointment
//! calendar:
//! - Time arithmetic: the fixed 09:00-23:00 half-hour grid
//! - Availability: buffered overlap checks against reservations and blocks
//! - Block registry: idempotent day/slot blocking
//! - Range selection: the drag-gesture state machine
//! - Views: day, week, month and year projections
//! - Intake: validated reservation creation with preparation buffers
//!
//! Storage is behind [`ScheduleStore`]; [`MemoryStore`] is the in-memory
//! implementation used by tests.

pub mod error;
pub mod intake;
mod memory;
pub mod oracle;
mod records;
pub mod registry;
pub mod selector;
mod store;
pub mod time;
mod types;
pub mod views;

pub use error::{ScheduleError, ValidationError};
pub use intake::{DurationWarning, ReservationRequest, request_reservation};
pub use memory::MemoryStore;
pub use oracle::{Availability, Conflict, is_available};
pub use records::{BlockedSlot, Client, NewReservation, Reservation, Service, ServiceCatalog};
pub use registry::{ToggleOutcome, toggle_block};
pub use selector::{
    BatchOutcome, Cell, DragSurface, GestureEvent, GestureOutcome, Mode, RangeSelector, Selection,
};
pub use store::{CalendarSnapshot, ScheduleStore, StoreError};
pub use time::{ClockTime, DateRange};
pub use types::{BlockId, ReservationId, ReservationStatus};
pub use views::{CellKind, DaySummary, Granularity, GridCell, get_cell_state, get_day_summary};
