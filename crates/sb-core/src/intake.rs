//! Reservation intake.
//!
//! Validates a proposed booking against the catalog and the oracle,
//! persists it as confirmed, then blocks the slot right after it for
//! preparation. The two writes are not atomic: if the buffer block fails
//! the reservation stands and the failure is only logged. The oracle
//! derives each reservation's buffered interval on its own, so a missing
//! buffer block never makes a conflicting booking possible.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ScheduleError;
use crate::oracle::{Availability, check_availability, validate_duration};
use crate::records::{Client, NewReservation, Reservation};
use crate::registry::block_slot;
use crate::selector::Selection;
use crate::store::{CalendarSnapshot, ScheduleStore};
use crate::time::{CLOSING_MINUTES, ClockTime, DateRange};
use crate::types::ReservationStatus;

/// Reason recorded on the block placed after each new reservation.
pub const PREP_BLOCK_REASON: &str = "post-service preparation";

/// Deviation from the catalog duration that needs explicit confirmation.
pub const DURATION_TOLERANCE_MINUTES: i64 = 30;

/// A proposed booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRequest {
    pub date: NaiveDate,
    pub time: ClockTime,
    pub service_name: String,
    pub client: Client,
    /// Length chosen by a multi-slot selection; falls back to the catalog.
    pub requested_minutes: Option<i64>,
}

impl ReservationRequest {
    /// Builds a request from a resolved slot selection.
    pub fn from_selection(
        selection: &Selection,
        service_name: &str,
        client: Client,
    ) -> Option<Self> {
        let (date, time, minutes) = selection.booking_window()?;
        Some(Self {
            date,
            time,
            service_name: service_name.to_string(),
            client,
            requested_minutes: Some(minutes),
        })
    }
}

/// Raised when the requested length strays too far from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationWarning {
    pub requested_minutes: i64,
    pub catalog_minutes: i64,
}

/// Books `request`; `confirm` is asked only when a [`DurationWarning`] applies.
pub fn request_reservation<S, F>(
    store: &mut S,
    request: &ReservationRequest,
    confirm: F,
) -> Result<Reservation, ScheduleError>
where
    S: ScheduleStore + ?Sized,
    F: FnOnce(&DurationWarning) -> bool,
{
    if request.client.name.trim().is_empty() {
        return Err(ScheduleError::InvalidInput("client name is required".to_string()));
    }
    if request.client.email.trim().is_empty() {
        return Err(ScheduleError::InvalidInput("client email is required".to_string()));
    }

    let catalog = store.service_catalog()?;
    let service = catalog
        .get(&request.service_name)
        .ok_or_else(|| ScheduleError::UnknownService {
            name: request.service_name.clone(),
        })?;

    let requested = request.requested_minutes.unwrap_or(service.duration_minutes);
    validate_duration(requested)?;

    if (requested - service.duration_minutes).abs() > DURATION_TOLERANCE_MINUTES {
        let warning = DurationWarning {
            requested_minutes: requested,
            catalog_minutes: service.duration_minutes,
        };
        tracing::debug!(?warning, "requested duration deviates from catalog");
        if !confirm(&warning) {
            return Err(ScheduleError::ConfirmationDeclined {
                requested_minutes: requested,
                catalog_minutes: service.duration_minutes,
            });
        }
    }

    let date = request.date;
    let snapshot = CalendarSnapshot::fetch(&*store, DateRange::day(date))?;
    if snapshot.all_day_block(date).is_some() {
        tracing::debug!(%date, "booking refused, day closed");
        return Err(ScheduleError::DayClosed { date });
    }
    match check_availability(&snapshot, date, request.time, requested)? {
        Availability::Free => {}
        Availability::Busy(conflict) => {
            tracing::debug!(
                %date,
                time = %request.time,
                ?conflict,
                "booking refused, slot unavailable"
            );
            return Err(ScheduleError::SlotUnavailable {
                date,
                time: request.time,
            });
        }
    }

    let reservation = store.create_reservation(NewReservation {
        date,
        time: request.time,
        status: ReservationStatus::Confirmed,
        service_name: service.name.clone(),
        service_duration_minutes: requested,
        client_name: request.client.name.clone(),
        client_email: request.client.email.clone(),
        total_price: service.price,
    })?;
    tracing::debug!(id = %reservation.id, %date, time = %reservation.time, "reservation created");

    place_prep_block(store, &reservation);
    Ok(reservation)
}

fn place_prep_block<S: ScheduleStore + ?Sized>(store: &mut S, reservation: &Reservation) {
    let prep_start = reservation
        .starts_at()
        .saturating_add(reservation.service_duration_minutes);
    let Some(time) = ClockTime::from_minutes(prep_start).filter(|_| prep_start < CLOSING_MINUTES)
    else {
        tracing::debug!(
            id = %reservation.id,
            prep_start,
            "preparation buffer past closing, skipped"
        );
        return;
    };
    if let Err(err) = block_slot(store, reservation.date, time, PREP_BLOCK_REASON) {
        tracing::warn!(
            id = %reservation.id,
            date = %reservation.date,
            time = %time,
            error = %err,
            "reservation saved without preparation block"
        );
    }
}
