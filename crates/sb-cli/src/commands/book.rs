//! `sb book`: reservation intake.

use std::io::Write;

use anyhow::Result;

use sb_core::{DurationWarning, Reservation, ReservationRequest, ScheduleStore, request_reservation};

use super::util::{format_minutes, format_price};

pub fn run<W, S, F>(
    writer: &mut W,
    store: &mut S,
    request: &ReservationRequest,
    confirm: F,
) -> Result<Reservation>
where
    W: Write,
    S: ScheduleStore + ?Sized,
    F: FnOnce(&DurationWarning) -> bool,
{
    let reservation = request_reservation(store, request, confirm)?;
    writeln!(
        writer,
        "Booked {} for {} on {} at {} ({}, {})",
        reservation.service_name,
        reservation.client_name,
        reservation.date,
        reservation.time,
        format_minutes(reservation.service_duration_minutes),
        format_price(reservation.total_price)
    )?;
    writeln!(writer, "Reservation: {}", reservation.id)?;
    Ok(reservation)
}
