//! `sb check`: ask the availability oracle about one interval.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;

use sb_core::oracle::availability;
use sb_core::{Availability, ClockTime, Conflict, ScheduleStore};

use super::util::format_minutes;

pub fn run<W: Write, S: ScheduleStore + ?Sized>(
    writer: &mut W,
    store: &S,
    date: NaiveDate,
    time: &str,
    duration_minutes: i64,
) -> Result<()> {
    let start = ClockTime::parse(time)?;
    let result = availability(store, date, start, duration_minutes)?;

    let prefix = format!("{date} {start} ({})", format_minutes(duration_minutes));
    match result {
        Availability::Free => writeln!(writer, "{prefix}: available")?,
        Availability::Busy(Conflict::Reservation(id)) => {
            writeln!(writer, "{prefix}: unavailable, overlaps reservation {id}")?;
        }
        Availability::Busy(Conflict::Block(at)) => {
            writeln!(writer, "{prefix}: unavailable, slot {at} is blocked")?;
        }
        Availability::Busy(Conflict::DayClosed) => {
            writeln!(writer, "{prefix}: unavailable, day is closed")?;
        }
    }
    Ok(())
}
