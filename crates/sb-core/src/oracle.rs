//! Availability oracle.
//!
//! Decides whether `[start, start + duration + PREP_BUFFER)` on a date is
//! free. Confirmed reservations conflict when their own buffered interval
//! overlaps; slot blocks conflict when their start falls inside the
//! requested interval; an all-day block closes the date outright.

use chrono::NaiveDate;

use crate::error::ScheduleError;
use crate::store::{CalendarSnapshot, ScheduleStore};
use crate::time::{ClockTime, DateRange, MAX_DURATION_MINUTES, PREP_BUFFER_MINUTES};
use crate::types::ReservationId;

/// Outcome of an availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Free,
    Busy(Conflict),
}

impl Availability {
    pub const fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }
}

/// What made a requested interval busy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// Overlaps a confirmed reservation's buffered interval.
    Reservation(ReservationId),
    /// A slot-level block starts inside the requested interval.
    Block(ClockTime),
    /// The date has an all-day block.
    DayClosed,
}

/// Returns whether `duration_minutes` starting at `start_time` is free on `date`.
pub fn is_available<S: ScheduleStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    start_time: &str,
    duration_minutes: i64,
) -> Result<bool, ScheduleError> {
    let start = ClockTime::parse(start_time)?;
    Ok(availability(store, date, start, duration_minutes)?.is_free())
}

/// Like [`is_available`], but reports the first conflict found.
pub fn availability<S: ScheduleStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    start: ClockTime,
    duration_minutes: i64,
) -> Result<Availability, ScheduleError> {
    validate_duration(duration_minutes)?;
    let snapshot = CalendarSnapshot::fetch(store, DateRange::day(date))?;
    check_availability(&snapshot, date, start, duration_minutes)
}

/// Evaluates availability against an already-fetched snapshot.
pub fn check_availability(
    snapshot: &CalendarSnapshot,
    date: NaiveDate,
    start: ClockTime,
    duration_minutes: i64,
) -> Result<Availability, ScheduleError> {
    validate_duration(duration_minutes)?;
    let start = start.minutes();
    // Both terms are bounded by a day, so this cannot overflow.
    let end = start + duration_minutes + PREP_BUFFER_MINUTES;

    if let Some(reservation) = snapshot
        .confirmed_on(date)
        .find(|r| start < r.occupied_until() && end > r.starts_at())
    {
        return Ok(Availability::Busy(Conflict::Reservation(
            reservation.id.clone(),
        )));
    }

    let blocked_time = snapshot.slot_blocks_on(date).find_map(|b| {
        b.time
            .filter(|t| start <= t.minutes() && t.minutes() < end)
    });
    if let Some(time) = blocked_time {
        return Ok(Availability::Busy(Conflict::Block(time)));
    }

    if snapshot.all_day_block(date).is_some() {
        return Ok(Availability::Busy(Conflict::DayClosed));
    }

    Ok(Availability::Free)
}

pub(crate) fn validate_duration(duration_minutes: i64) -> Result<(), ScheduleError> {
    if !(1..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
        return Err(ScheduleError::InvalidDuration {
            minutes: duration_minutes,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::memory::MemoryStore;
    use crate::records::NewReservation;
    use crate::time::{minutes_to_time, parse_date};
    use crate::types::ReservationStatus;

    fn booking(date: &str, time: &str, minutes: i64, status: ReservationStatus) -> NewReservation {
        NewReservation {
            date: parse_date(date).unwrap(),
            time: ClockTime::parse(time).unwrap(),
            status,
            service_name: "Facial".to_string(),
            service_duration_minutes: minutes,
            client_name: "Ada".to_string(),
            client_email: "ada@example.com".to_string(),
            total_price: 6000,
        }
    }

    fn store_with(bookings: &[NewReservation]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for b in bookings {
            store.insert_reservation(b.clone()).unwrap();
        }
        store
    }

    #[test]
    fn conflict_scenario_around_morning_reservation() {
        let store = store_with(&[booking("2025-03-10", "09:00", 60, ReservationStatus::Confirmed)]);
        let date = parse_date("2025-03-10").unwrap();

        assert!(!is_available(&store, date, "09:30", 30).unwrap());
        assert!(is_available(&store, date, "10:20", 30).unwrap());
    }

    #[test]
    fn overlap_window_matches_buffered_interval() {
        let store = store_with(&[booking("2025-03-10", "09:00", 60, ReservationStatus::Confirmed)]);
        let date = parse_date("2025-03-10").unwrap();

        // Starts from 09:00 up to (not including) 10:15 collide.
        for minutes in (540..615).step_by(5) {
            let time = minutes_to_time(minutes);
            assert!(
                !is_available(&store, date, &time, 30).unwrap(),
                "{time} should be busy"
            );
        }
        for minutes in (615..1380).step_by(15) {
            let time = minutes_to_time(minutes);
            assert!(
                is_available(&store, date, &time, 30).unwrap(),
                "{time} should be free"
            );
        }
    }

    #[test]
    fn earlier_booking_running_into_reservation_is_busy() {
        let store = store_with(&[booking("2025-03-10", "11:00", 30, ReservationStatus::Confirmed)]);
        let date = parse_date("2025-03-10").unwrap();

        // 10:00 + 60 + 15 = 11:15 > 11:00
        assert!(!is_available(&store, date, "10:00", 60).unwrap());
        // 09:30 + 60 + 15 = 10:45 <= 11:00
        assert!(is_available(&store, date, "09:30", 60).unwrap());
    }

    #[test]
    fn only_confirmed_reservations_conflict() {
        let store = store_with(&[
            booking("2025-03-10", "09:00", 60, ReservationStatus::Pending),
            booking("2025-03-10", "12:00", 60, ReservationStatus::Cancelled),
            booking("2025-03-10", "14:00", 60, ReservationStatus::Completed),
        ]);
        let date = parse_date("2025-03-10").unwrap();
        for time in ["09:00", "12:00", "14:00"] {
            assert!(is_available(&store, date, time, 60).unwrap());
        }
    }

    #[test]
    fn slot_block_inside_interval_is_busy() {
        let mut store = MemoryStore::new();
        let date = parse_date("2025-03-10").unwrap();
        store
            .create_blocked_slot(date, Some(ClockTime::parse("15:00").unwrap()), "blocked")
            .unwrap();

        assert_eq!(
            availability(&store, date, ClockTime::parse("14:00").unwrap(), 60).unwrap(),
            Availability::Busy(Conflict::Block(ClockTime::parse("15:00").unwrap()))
        );
        assert!(!is_available(&store, date, "15:00", 30).unwrap());
        // Block at 15:00 is before the interval.
        assert!(is_available(&store, date, "15:30", 30).unwrap());
        // 13:30 + 60 + 15 = 14:45, block not reached.
        assert!(is_available(&store, date, "13:30", 60).unwrap());
    }

    #[test]
    fn all_day_block_dominates() {
        let mut store =
            store_with(&[booking("2025-03-10", "09:00", 60, ReservationStatus::Confirmed)]);
        let date = parse_date("2025-03-10").unwrap();
        store.create_blocked_slot(date, None, "closed").unwrap();

        for time in ["09:00", "12:00", "18:30", "22:45"] {
            assert!(!is_available(&store, date, time, 30).unwrap());
        }
        let other_day = parse_date("2025-03-11").unwrap();
        assert!(is_available(&store, other_day, "09:00", 30).unwrap());
    }

    #[test]
    fn bookings_may_run_past_the_grid() {
        let store = MemoryStore::new();
        let date = parse_date("2025-03-10").unwrap();
        assert!(is_available(&store, date, "22:45", 60).unwrap());
    }

    #[test]
    fn invalid_inputs_fail_fast() {
        let mut store = MemoryStore::new();
        store.set_healthy(false);
        let date = parse_date("2025-03-10").unwrap();

        assert!(matches!(
            is_available(&store, date, "9am", 30),
            Err(ScheduleError::InvalidTimeFormat { .. })
        ));
        assert!(matches!(
            is_available(&store, date, "09:00", 0),
            Err(ScheduleError::InvalidDuration { minutes: 0 })
        ));
        assert!(matches!(
            is_available(&store, date, "09:00", -30),
            Err(ScheduleError::InvalidDuration { minutes: -30 })
        ));
        assert!(matches!(
            is_available(&store, date, "09:00", 30),
            Err(ScheduleError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn durations_longer_than_a_day_are_rejected() {
        let store = store_with(&[booking("2025-03-10", "09:00", 60, ReservationStatus::Confirmed)]);
        let date = parse_date("2025-03-10").unwrap();

        assert!(matches!(
            is_available(&store, date, "09:00", i64::MAX),
            Err(ScheduleError::InvalidDuration { minutes: i64::MAX })
        ));
        assert!(matches!(
            is_available(&store, date, "09:00", 1441),
            Err(ScheduleError::InvalidDuration { minutes: 1441 })
        ));
        assert!(!is_available(&store, date, "09:00", 1440).unwrap());
        assert!(is_available(&store, date, "10:30", 1440).unwrap());
    }
}
