//! `sb drag`: replays a pointer gesture through the range selector.
//!
//! The gesture is pointer-down on the first cell, pointer-enter on the
//! last, then pointer-up. A normal-mode slot drag can go straight into a
//! booking when service and client details are given.

use std::io::Write;

use anyhow::Result;

use sb_core::selector::{CellFailure, Rejection};
use sb_core::time::{SLOT_MINUTES, minutes_to_time};
use sb_core::{
    BatchOutcome, Cell, Client, DurationWarning, GestureEvent, GestureOutcome, Mode,
    RangeSelector, ReservationRequest, ScheduleError, ScheduleStore, Selection,
};

use super::book;
use super::util::format_minutes;

fn describe_cell(cell: &Cell) -> String {
    match cell {
        Cell::Slot { date, time } => format!("{date} {time}"),
        Cell::Day { date } => date.to_string(),
    }
}

fn describe_selection(selection: &Selection) -> String {
    match selection {
        Selection::Slots { date, times } => {
            let (Some(first), Some(last)) = (times.first(), times.last()) else {
                return format!("nothing on {date}");
            };
            format!(
                "{date} {first}-{} ({} slots, {})",
                minutes_to_time(last.minutes() + SLOT_MINUTES),
                times.len(),
                format_minutes(selection.duration_minutes())
            )
        }
        Selection::Days { dates } => {
            let list = dates
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} days: {list}", dates.len())
        }
    }
}

fn write_batch<W: Write>(writer: &mut W, outcome: &BatchOutcome) -> Result<()> {
    writeln!(
        writer,
        "Blocked {}, already blocked {}, failed {}",
        outcome.blocked.len(),
        outcome.skipped.len(),
        outcome.failed.len()
    )?;
    for CellFailure { cell, message } in &outcome.failed {
        writeln!(writer, "  {}: {message}", describe_cell(cell))?;
    }
    Ok(())
}

const fn rejection_message(rejection: Rejection) -> &'static str {
    match rejection {
        Rejection::CellReserved => "the first cell is taken by a reservation",
        Rejection::DayClosed => "the day is closed",
    }
}

/// Runs a drag from `from` to `to` and reports how it resolved.
///
/// `booking` turns a normal-mode slot proposal into a reservation.
pub fn run<W, S, F>(
    writer: &mut W,
    store: &mut S,
    selector: &mut RangeSelector,
    from: Cell,
    to: Cell,
    booking: Option<(String, Client)>,
    confirm: F,
) -> Result<()>
where
    W: Write,
    S: ScheduleStore + ?Sized,
    F: FnOnce(&DurationWarning) -> bool,
{
    if selector.mode() == Mode::Block && booking.is_some() {
        anyhow::bail!("--block cannot be combined with booking details");
    }
    if let GestureOutcome::Rejected(rejection) =
        selector.on_gesture(store, GestureEvent::PointerDown(from))?
    {
        anyhow::bail!("cannot start selection: {}", rejection_message(rejection));
    }
    selector.on_gesture(store, GestureEvent::PointerEnter(to))?;

    let outcome = match selector.on_gesture(store, GestureEvent::PointerUp) {
        Ok(outcome) => outcome,
        Err(ScheduleError::PartialBatchFailure(outcome)) => {
            write_batch(writer, &outcome)?;
            anyhow::bail!("{} cells could not be blocked", outcome.failed.len());
        }
        Err(err) => return Err(err.into()),
    };

    match outcome {
        GestureOutcome::Blocked(batch) => write_batch(writer, &batch)?,
        GestureOutcome::Proposed(selection) => {
            writeln!(writer, "Selected {}", describe_selection(&selection))?;
            if let Some((service, client)) = booking {
                let Some(request) = ReservationRequest::from_selection(&selection, &service, client)
                else {
                    anyhow::bail!("only a slot selection can be booked");
                };
                book::run(writer, store, &request, confirm)?;
            }
        }
        other => tracing::debug!(?other, "drag ended without resolving"),
    }
    Ok(())
}
