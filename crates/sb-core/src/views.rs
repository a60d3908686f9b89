//! Day, week, month and year projections over the same two collections.
//!
//! Every projection fetches a fresh [`CalendarSnapshot`] for its own range
//! and throws it away when it returns. Nothing here caches across calls.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::ScheduleError;
use crate::records::{BlockedSlot, Reservation};
use crate::registry::{ToggleOutcome, toggle_day};
use crate::selector::{Cell, DragSurface, Mode, Selection};
use crate::store::{CalendarSnapshot, ScheduleStore};
use crate::time::{ClockTime, DateRange, SLOT_GRID, first_of_month};

/// Zoom level of a calendar view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    /// The surface a drag runs over in this view; the year view has none.
    pub const fn drag_surface(self) -> Option<DragSurface> {
        match self {
            Self::Day | Self::Week => Some(DragSurface::Slots),
            Self::Month => Some(DragSurface::Days),
            Self::Year => None,
        }
    }
}

/// Classification of one grid cell, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// A confirmed reservation starts here.
    Reserved,
    /// Inside a confirmed reservation's buffered interval.
    Buffer,
    Blocked,
    /// Part of the in-flight drag selection.
    Selected,
    Available,
}

/// One classified slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub date: NaiveDate,
    pub time: ClockTime,
    pub kind: CellKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation: Option<Reservation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockedSlot>,
}

/// Per-date counts shared by the week header and month cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub reservation_count: usize,
    pub blocked_all_day: bool,
    pub blocked_slot_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayView {
    pub summary: DaySummary,
    pub cells: Vec<GridCell>,
}

/// Seven day columns starting on Monday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekView {
    pub start: NaiveDate,
    pub days: Vec<DayView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthCell {
    /// False for the leading/trailing days of neighbouring months.
    pub in_month: bool,
    #[serde(flatten)]
    pub summary: DaySummary,
}

/// A 6x7 Monday-start month calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthView {
    pub first: NaiveDate,
    pub cells: Vec<MonthCell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub first: NaiveDate,
    pub reservation_count: usize,
    pub blocked_day_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearView {
    pub year: i32,
    pub months: Vec<MonthSummary>,
}

/// Where a click navigates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Day(NaiveDate),
    Month(NaiveDate),
}

impl Navigation {
    pub const fn granularity(self) -> Granularity {
        match self {
            Self::Day(_) => Granularity::Day,
            Self::Month(_) => Granularity::Month,
        }
    }
}

/// Result of clicking a week column header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderAction {
    Navigate(Navigation),
    Toggled(ToggleOutcome),
}

/// Classifies one slot.
pub fn get_cell_state<S: ScheduleStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    time: ClockTime,
) -> Result<GridCell, ScheduleError> {
    let snapshot = CalendarSnapshot::fetch(store, DateRange::day(date))?;
    Ok(classify(&snapshot, date, time, None))
}

pub fn get_day_summary<S: ScheduleStore + ?Sized>(
    store: &S,
    date: NaiveDate,
) -> Result<DaySummary, ScheduleError> {
    let snapshot = CalendarSnapshot::fetch(store, DateRange::day(date))?;
    Ok(summarize(&snapshot, date))
}

/// The 29 slots of one date.
pub fn day_view<S: ScheduleStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    selection: Option<&Selection>,
) -> Result<DayView, ScheduleError> {
    let snapshot = CalendarSnapshot::fetch(store, DateRange::day(date))?;
    Ok(build_day(&snapshot, date, selection))
}

/// The Monday-start week containing `date`.
pub fn week_view<S: ScheduleStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    selection: Option<&Selection>,
) -> Result<WeekView, ScheduleError> {
    let range = DateRange::week(date);
    let snapshot = CalendarSnapshot::fetch(store, range)?;
    Ok(WeekView {
        start: range.start,
        days: range
            .days()
            .map(|day| build_day(&snapshot, day, selection))
            .collect(),
    })
}

/// The month starting at `first`, padded to 42 cells.
pub fn month_view<S: ScheduleStore + ?Sized>(
    store: &S,
    first: NaiveDate,
) -> Result<MonthView, ScheduleError> {
    let first = first.with_day(1).unwrap_or(first);
    let range = DateRange::month_grid(first);
    let snapshot = CalendarSnapshot::fetch(store, range)?;
    let cells = range
        .days()
        .map(|day| MonthCell {
            in_month: day.month() == first.month() && day.year() == first.year(),
            summary: summarize(&snapshot, day),
        })
        .collect();
    Ok(MonthView { first, cells })
}

/// Twelve month summaries.
pub fn year_view<S: ScheduleStore + ?Sized>(
    store: &S,
    year: i32,
) -> Result<YearView, ScheduleError> {
    let snapshot = CalendarSnapshot::fetch(store, DateRange::year(year)?)?;
    let months = (1..=12)
        .map(|month| {
            let first = first_of_month(year, month)?;
            let range = DateRange::month(first);
            let reservation_count = range.days().map(|d| snapshot.counted_on(d)).sum();
            let blocked_day_count = snapshot
                .blocks
                .iter()
                .filter(|b| b.all_day() && range.contains(b.date))
                .map(|b| b.date)
                .collect::<BTreeSet<_>>()
                .len();
            Ok(MonthSummary {
                first,
                reservation_count,
                blocked_day_count,
            })
        })
        .collect::<Result<_, ScheduleError>>()?;
    Ok(YearView { year, months })
}

/// Week header click: open the day in normal mode, toggle the whole day in block mode.
pub fn week_header_click<S: ScheduleStore + ?Sized>(
    store: &mut S,
    mode: Mode,
    date: NaiveDate,
    closed_reason: &str,
) -> Result<HeaderAction, ScheduleError> {
    match mode {
        Mode::Normal => Ok(HeaderAction::Navigate(Navigation::Day(date))),
        Mode::Block => Ok(HeaderAction::Toggled(toggle_day(store, date, closed_reason)?)),
    }
}

/// Year view click on month `month` (1-12).
pub fn year_month_click(year: i32, month: u32) -> Result<Navigation, ScheduleError> {
    Ok(Navigation::Month(first_of_month(year, month)?))
}

fn build_day(
    snapshot: &CalendarSnapshot,
    date: NaiveDate,
    selection: Option<&Selection>,
) -> DayView {
    DayView {
        summary: summarize(snapshot, date),
        cells: SLOT_GRID
            .iter()
            .map(|time| classify(snapshot, date, *time, selection))
            .collect(),
    }
}

fn classify(
    snapshot: &CalendarSnapshot,
    date: NaiveDate,
    time: ClockTime,
    selection: Option<&Selection>,
) -> GridCell {
    let mut cell = GridCell {
        date,
        time,
        kind: CellKind::Available,
        reservation: None,
        block: None,
    };

    if let Some(starting) = snapshot.confirmed_on(date).find(|r| r.time == time) {
        cell.kind = CellKind::Reserved;
        cell.reservation = Some(starting.clone());
        return cell;
    }
    if let Some(covering) = snapshot.confirmed_on(date).find(|r| r.covers(time.minutes())) {
        cell.kind = CellKind::Buffer;
        cell.reservation = Some(covering.clone());
        return cell;
    }
    if let Some(block) = snapshot
        .slot_block(date, time)
        .or_else(|| snapshot.all_day_block(date))
    {
        cell.kind = CellKind::Blocked;
        cell.block = Some(block.clone());
        return cell;
    }
    if selection.is_some_and(|s| s.contains(&Cell::Slot { date, time })) {
        cell.kind = CellKind::Selected;
    }
    cell
}

fn summarize(snapshot: &CalendarSnapshot, date: NaiveDate) -> DaySummary {
    let blocked_slot_count = snapshot
        .slot_blocks_on(date)
        .filter_map(|b| b.time)
        .collect::<BTreeSet<_>>()
        .len();
    DaySummary {
        date,
        reservation_count: snapshot.counted_on(date),
        blocked_all_day: snapshot.all_day_block(date).is_some(),
        blocked_slot_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::memory::MemoryStore;
    use crate::records::NewReservation;
    use crate::registry::{block_day, block_slot};
    use crate::time::parse_date;
    use crate::types::ReservationStatus;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn at(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    fn book(
        store: &mut MemoryStore,
        day: &str,
        time: &str,
        minutes: i64,
        status: ReservationStatus,
    ) {
        store
            .insert_reservation(NewReservation {
                date: date(day),
                time: at(time),
                status,
                service_name: "Facial".to_string(),
                service_duration_minutes: minutes,
                client_name: "Ada".to_string(),
                client_email: "ada@example.com".to_string(),
                total_price: 6000,
            })
            .unwrap();
    }

    fn kinds(view: &DayView) -> Vec<(String, CellKind)> {
        view.cells
            .iter()
            .filter(|c| c.kind != CellKind::Available)
            .map(|c| (c.time.to_string(), c.kind))
            .collect()
    }

    #[test]
    fn day_view_classifies_by_priority() {
        let mut store = MemoryStore::new();
        book(&mut store, "2025-03-10", "09:00", 60, ReservationStatus::Confirmed);
        book(&mut store, "2025-03-10", "16:00", 60, ReservationStatus::Pending);
        block_slot(&mut store, date("2025-03-10"), at("10:00"), "prep").unwrap();
        block_slot(&mut store, date("2025-03-10"), at("12:00"), "lunch").unwrap();
        let selection = Selection::Slots {
            date: date("2025-03-10"),
            times: vec![at("12:00"), at("12:30"), at("13:00")],
        };

        let view = day_view(&store, date("2025-03-10"), Some(&selection)).unwrap();

        assert_eq!(view.cells.len(), 29);
        assert_eq!(
            kinds(&view),
            vec![
                ("09:00".to_string(), CellKind::Reserved),
                ("09:30".to_string(), CellKind::Buffer),
                ("10:00".to_string(), CellKind::Buffer),
                ("12:00".to_string(), CellKind::Blocked),
                ("12:30".to_string(), CellKind::Selected),
                ("13:00".to_string(), CellKind::Selected),
            ]
        );
        assert_eq!(view.summary.reservation_count, 2);
        assert_eq!(view.summary.blocked_slot_count, 2);
        assert!(!view.summary.blocked_all_day);
    }

    #[test]
    fn all_day_block_marks_every_free_cell_blocked() {
        let mut store = MemoryStore::new();
        book(&mut store, "2025-03-10", "09:00", 30, ReservationStatus::Confirmed);
        block_day(&mut store, date("2025-03-10"), "closed").unwrap();

        let view = day_view(&store, date("2025-03-10"), None).unwrap();
        assert_eq!(view.cells[0].kind, CellKind::Reserved);
        assert!(view.cells[2..].iter().all(|c| c.kind == CellKind::Blocked));
        assert!(view.summary.blocked_all_day);
    }

    #[test]
    fn cell_state_carries_the_reservation() {
        let mut store = MemoryStore::new();
        book(&mut store, "2025-03-10", "14:00", 90, ReservationStatus::Confirmed);

        let cell = get_cell_state(&store, date("2025-03-10"), at("15:00")).unwrap();
        assert_eq!(cell.kind, CellKind::Buffer);
        assert_eq!(cell.reservation.unwrap().time, at("14:00"));

        let cell = get_cell_state(&store, date("2025-03-10"), at("15:30")).unwrap();
        assert_eq!(cell.kind, CellKind::Buffer);
        let cell = get_cell_state(&store, date("2025-03-10"), at("16:00")).unwrap();
        assert_eq!(cell.kind, CellKind::Available);
    }

    #[test]
    fn week_view_has_seven_columns_with_counts() {
        let mut store = MemoryStore::new();
        book(&mut store, "2025-03-12", "09:00", 60, ReservationStatus::Confirmed);
        book(&mut store, "2025-03-12", "13:00", 60, ReservationStatus::Confirmed);
        book(&mut store, "2025-03-12", "15:00", 60, ReservationStatus::Cancelled);
        book(&mut store, "2025-03-17", "09:00", 60, ReservationStatus::Confirmed);

        let week = week_view(&store, date("2025-03-13"), None).unwrap();
        assert_eq!(week.start, date("2025-03-10"));
        assert_eq!(week.days.len(), 7);
        assert!(week.days.iter().all(|d| d.cells.len() == 29));
        let counts: Vec<_> = week.days.iter().map(|d| d.summary.reservation_count).collect();
        assert_eq!(counts, [0, 0, 2, 0, 0, 0, 0]);
    }

    #[test]
    fn week_header_click_depends_on_mode() {
        let mut store = MemoryStore::new();
        let day = date("2025-03-12");

        let action = week_header_click(&mut store, Mode::Normal, day, "closed").unwrap();
        assert_eq!(action, HeaderAction::Navigate(Navigation::Day(day)));
        assert!(store.blocked_slots().is_empty());

        let action = week_header_click(&mut store, Mode::Block, day, "closed").unwrap();
        assert!(matches!(action, HeaderAction::Toggled(ToggleOutcome::Blocked(_))));
        let action = week_header_click(&mut store, Mode::Block, day, "closed").unwrap();
        assert!(matches!(action, HeaderAction::Toggled(ToggleOutcome::Unblocked(_))));
        assert!(store.blocked_slots().is_empty());
    }

    #[test]
    fn month_view_aggregates_counts_and_blocks() {
        let mut store = MemoryStore::new();
        for time in ["09:00", "11:00", "14:00"] {
            book(&mut store, "2025-03-10", time, 60, ReservationStatus::Confirmed);
        }
        block_day(&mut store, date("2025-03-11"), "closed").unwrap();
        block_slot(&mut store, date("2025-03-12"), at("10:00"), "blocked").unwrap();
        block_slot(&mut store, date("2025-03-12"), at("10:30"), "blocked").unwrap();

        let month = month_view(&store, date("2025-03-01")).unwrap();
        assert_eq!(month.cells.len(), 42);
        assert_eq!(month.cells[0].summary.date, date("2025-02-24"));
        assert!(!month.cells[0].in_month);

        let cell = |d: &str| {
            month
                .cells
                .iter()
                .find(|c| c.summary.date == date(d))
                .copied()
                .unwrap()
        };
        let tenth = cell("2025-03-10");
        assert_eq!(tenth.summary.reservation_count, 3);
        assert!(!tenth.summary.blocked_all_day);
        assert!(cell("2025-03-11").summary.blocked_all_day);
        assert_eq!(cell("2025-03-12").summary.blocked_slot_count, 2);
        assert!(cell("2025-03-31").in_month);
    }

    #[test]
    fn year_view_sums_per_month() {
        let mut store = MemoryStore::new();
        book(&mut store, "2025-03-10", "09:00", 60, ReservationStatus::Confirmed);
        book(&mut store, "2025-03-20", "09:00", 60, ReservationStatus::Completed);
        book(&mut store, "2025-07-01", "09:00", 60, ReservationStatus::Confirmed);
        book(&mut store, "2026-01-01", "09:00", 60, ReservationStatus::Confirmed);
        block_day(&mut store, date("2025-03-11"), "closed").unwrap();
        block_day(&mut store, date("2025-12-25"), "holiday").unwrap();

        let year = year_view(&store, 2025).unwrap();
        assert_eq!(year.months.len(), 12);
        assert_eq!(year.months[2].reservation_count, 2);
        assert_eq!(year.months[2].blocked_day_count, 1);
        assert_eq!(year.months[6].reservation_count, 1);
        assert_eq!(year.months[11].blocked_day_count, 1);
        assert_eq!(year.months[0].reservation_count, 0);

        let nav = year_month_click(2025, 3).unwrap();
        assert_eq!(nav, Navigation::Month(date("2025-03-01")));
        assert_eq!(nav.granularity(), Granularity::Month);
        assert!(year_month_click(2025, 13).is_err());
    }

    #[test]
    fn views_read_through_after_mutations() {
        let mut store = MemoryStore::new();
        let day = date("2025-03-10");
        assert_eq!(get_day_summary(&store, day).unwrap().blocked_slot_count, 0);

        block_slot(&mut store, day, at("10:00"), "blocked").unwrap();
        assert_eq!(get_day_summary(&store, day).unwrap().blocked_slot_count, 1);

        store.create_blocked_slot(day, None, "closed").unwrap();
        let month = month_view(&store, date("2025-03-01")).unwrap();
        assert!(month.cells.iter().any(|c| c.summary.date == day && c.summary.blocked_all_day));
    }

    #[test]
    fn granularity_drag_surfaces() {
        assert_eq!(Granularity::Week.drag_surface(), Some(DragSurface::Slots));
        assert_eq!(Granularity::Month.drag_surface(), Some(DragSurface::Days));
        assert_eq!(Granularity::Year.drag_surface(), None);
    }
}
