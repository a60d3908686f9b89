//! In-memory store implementation.
//!
//! Keeps everything in `Vec`s with sequential IDs, which makes it suitable
//! for unit tests and dry runs. It can also be switched to an unhealthy
//! state, or told to fail writes for particular cells, to exercise the
//! `StoreUnavailable` paths.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::records::{BlockedSlot, NewReservation, Reservation, Service, ServiceCatalog};
use crate::store::{ScheduleStore, StoreError};
use crate::time::{ClockTime, DateRange};
use crate::types::{BlockId, ReservationId};

/// In-memory [`ScheduleStore`].
#[derive(Debug)]
pub struct MemoryStore {
    reservations: Vec<Reservation>,
    blocks: Vec<BlockedSlot>,
    services: Vec<Service>,
    next_id: u64,
    healthy: bool,
    failing_writes: HashSet<(NaiveDate, Option<ClockTime>)>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            reservations: Vec::new(),
            blocks: Vec::new(),
            services: Vec::new(),
            next_id: 1,
            healthy: true,
            failing_writes: HashSet::new(),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with a service catalog.
    pub fn with_services(services: impl IntoIterator<Item = Service>) -> Self {
        Self {
            services: services.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Simulates an outage; every call fails while unhealthy.
    pub fn set_healthy(&mut self, healthy: bool) {
        self.healthy = healthy;
    }

    /// Makes block creation fail for one target cell.
    pub fn fail_writes_for(&mut self, date: NaiveDate, time: Option<ClockTime>) {
        self.failing_writes.insert((date, time));
    }

    /// Inserts a reservation as-is, the way an external collaborator would.
    pub fn insert_reservation(
        &mut self,
        fields: NewReservation,
    ) -> Result<Reservation, StoreError> {
        let id = self.next_id("res");
        let id = ReservationId::new(id)
            .map_err(|e| StoreError::with_source("bad reservation id", e))?;
        let reservation = fields.with_id(id);
        self.reservations.push(reservation.clone());
        Ok(reservation)
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn blocked_slots(&self) -> &[BlockedSlot] {
        &self.blocks
    }

    fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}-{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn check_health(&self) -> Result<(), StoreError> {
        if self.healthy {
            Ok(())
        } else {
            Err(StoreError::new("memory store is offline"))
        }
    }
}

impl ScheduleStore for MemoryStore {
    fn list_reservations(&self, range: DateRange) -> Result<Vec<Reservation>, StoreError> {
        self.check_health()?;
        Ok(self
            .reservations
            .iter()
            .filter(|r| range.contains(r.date))
            .cloned()
            .collect())
    }

    fn list_blocked_slots(&self, range: DateRange) -> Result<Vec<BlockedSlot>, StoreError> {
        self.check_health()?;
        Ok(self
            .blocks
            .iter()
            .filter(|b| range.contains(b.date))
            .cloned()
            .collect())
    }

    fn create_blocked_slot(
        &mut self,
        date: NaiveDate,
        time: Option<ClockTime>,
        reason: &str,
    ) -> Result<BlockedSlot, StoreError> {
        self.check_health()?;
        if self.failing_writes.contains(&(date, time)) {
            return Err(StoreError::new(format!("write rejected for {date}")));
        }
        let id = self.next_id("blk");
        let block = BlockedSlot {
            id: BlockId::new(id).map_err(|e| StoreError::with_source("bad block id", e))?,
            date,
            time,
            reason: reason.to_string(),
        };
        self.blocks.push(block.clone());
        Ok(block)
    }

    fn delete_blocked_slot(&mut self, id: &BlockId) -> Result<(), StoreError> {
        self.check_health()?;
        self.blocks.retain(|b| &b.id != id);
        Ok(())
    }

    fn create_reservation(&mut self, fields: NewReservation) -> Result<Reservation, StoreError> {
        self.check_health()?;
        self.insert_reservation(fields)
    }

    fn service_catalog(&self) -> Result<ServiceCatalog, StoreError> {
        self.check_health()?;
        Ok(ServiceCatalog::new(self.services.iter().cloned()))
    }
}
