//! Calendar views: `sb day`, `sb week`, `sb month` and `sb year`.
//!
//! Each command renders one projection as a plain-text grid, or as the
//! serialized projection with `--json`.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use sb_core::time::minutes_to_time;
use sb_core::views::{
    DayView, MonthCell, MonthView, WeekView, YearView, day_view, month_view, week_view, year_view,
};
use sb_core::{CellKind, GridCell, ScheduleStore};

use super::util::format_minutes;

// ========== Day ==========

const fn kind_label(kind: CellKind) -> &'static str {
    match kind {
        CellKind::Reserved => "reserved",
        CellKind::Buffer => "buffer",
        CellKind::Blocked => "blocked",
        CellKind::Selected => "selected",
        CellKind::Available => "available",
    }
}

const fn kind_code(kind: CellKind) -> char {
    match kind {
        CellKind::Reserved => 'R',
        CellKind::Buffer => 'b',
        CellKind::Blocked => 'x',
        CellKind::Selected => '*',
        CellKind::Available => '.',
    }
}

fn cell_detail(cell: &GridCell) -> String {
    match (cell.kind, &cell.reservation, &cell.block) {
        (CellKind::Reserved, Some(r), _) => format!(
            "{} - {} ({})",
            r.service_name,
            r.client_name,
            format_minutes(r.service_duration_minutes)
        ),
        (CellKind::Buffer, Some(r), _) => {
            format!("{} until {}", r.service_name, minutes_to_time(r.occupied_until()))
        }
        (CellKind::Blocked, _, Some(block)) => block.reason.clone(),
        _ => String::new(),
    }
}

/// Format one day as a slot list.
pub fn format_day(view: &DayView) -> String {
    let mut output = String::new();
    let summary = &view.summary;

    writeln!(output, "{}", summary.date.format("%A %Y-%m-%d")).unwrap();
    if summary.blocked_all_day {
        writeln!(output, "Reservations: {} | Closed all day", summary.reservation_count).unwrap();
    } else {
        writeln!(
            output,
            "Reservations: {} | Blocked slots: {}",
            summary.reservation_count, summary.blocked_slot_count
        )
        .unwrap();
    }

    for cell in &view.cells {
        let line = format!(
            "{}  {:<9}  {}",
            cell.time,
            kind_label(cell.kind),
            cell_detail(cell)
        );
        writeln!(output, "{}", line.trim_end()).unwrap();
    }

    output
}

// ========== Week ==========

/// Format a week as a slot-by-day grid.
pub fn format_week(view: &WeekView) -> String {
    let mut output = String::new();

    writeln!(output, "Week of {}", view.start.format("%Y-%m-%d")).unwrap();

    let mut header = String::from("time ");
    for day in &view.days {
        write!(header, "  {:<5}", day.summary.date.format("%a%d").to_string()).unwrap();
    }
    writeln!(output, "{}", header.trim_end()).unwrap();

    let rows = view.days.first().map_or(0, |d| d.cells.len());
    for row in 0..rows {
        let mut line = String::new();
        if let Some(cell) = view.days.first().and_then(|d| d.cells.get(row)) {
            write!(line, "{}", cell.time).unwrap();
        }
        for day in &view.days {
            let code = day.cells.get(row).map_or(' ', |c| kind_code(c.kind));
            write!(line, "  {code:<5}").unwrap();
        }
        writeln!(output, "{}", line.trim_end()).unwrap();
    }

    let mut counts = String::from("resv ");
    for day in &view.days {
        let count = if day.summary.blocked_all_day {
            "closed".to_string()
        } else {
            day.summary.reservation_count.to_string()
        };
        write!(counts, "  {count:<5}").unwrap();
    }
    writeln!(output, "{}", counts.trim_end()).unwrap();
    writeln!(output, "R reserved, b buffer, x blocked, . free").unwrap();

    output
}

// ========== Month ==========

fn month_cell_text(cell: &MonthCell) -> String {
    if !cell.in_month {
        return ".".to_string();
    }
    let summary = &cell.summary;
    let mut text = summary.date.format("%-d").to_string();
    if summary.reservation_count > 0 {
        write!(text, "+{}", summary.reservation_count).unwrap();
    }
    if summary.blocked_all_day {
        text.push('x');
    } else if summary.blocked_slot_count > 0 {
        text.push('~');
    }
    text
}

/// Format a month as a Monday-start calendar.
pub fn format_month(view: &MonthView) -> String {
    let mut output = String::new();

    writeln!(output, "{}", view.first.format("%B %Y")).unwrap();
    writeln!(output, "Mon    Tue    Wed    Thu    Fri    Sat    Sun").unwrap();

    for week in view.cells.chunks(7) {
        let line = week
            .iter()
            .map(|cell| format!("{:<6}", month_cell_text(cell)))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(output, "{}", line.trim_end()).unwrap();
    }
    writeln!(output, "+N reservations, x closed, ~ blocked slots").unwrap();

    output
}

// ========== Year ==========

/// Format per-month totals for a year.
pub fn format_year(view: &YearView) -> String {
    let mut output = String::new();

    writeln!(output, "{}", view.year).unwrap();
    for month in &view.months {
        writeln!(
            output,
            "{:<3}  {:>3} reservations  {:>3} closed days",
            month.first.format("%b").to_string(),
            month.reservation_count,
            month.blocked_day_count
        )
        .unwrap();
    }
    let reservations: usize = view.months.iter().map(|m| m.reservation_count).sum();
    let closed: usize = view.months.iter().map(|m| m.blocked_day_count).sum();
    writeln!(output, "Total: {reservations} reservations, {closed} closed days").unwrap();

    output
}

// ========== Entry Points ==========

fn emit<W: Write, T: Serialize>(
    writer: &mut W,
    value: &T,
    json: bool,
    text: impl FnOnce(&T) -> String,
) -> Result<()> {
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(value)?)?;
    } else {
        write!(writer, "{}", text(value))?;
    }
    Ok(())
}

pub fn run_day<W: Write, S: ScheduleStore + ?Sized>(
    writer: &mut W,
    store: &S,
    date: NaiveDate,
    json: bool,
) -> Result<()> {
    let view = day_view(store, date, None)?;
    emit(writer, &view, json, format_day)
}

pub fn run_week<W: Write, S: ScheduleStore + ?Sized>(
    writer: &mut W,
    store: &S,
    date: NaiveDate,
    json: bool,
) -> Result<()> {
    let view = week_view(store, date, None)?;
    emit(writer, &view, json, format_week)
}

pub fn run_month<W: Write, S: ScheduleStore + ?Sized>(
    writer: &mut W,
    store: &S,
    first: NaiveDate,
    json: bool,
) -> Result<()> {
    let view = month_view(store, first)?;
    emit(writer, &view, json, format_month)
}

pub fn run_year<W: Write, S: ScheduleStore + ?Sized>(
    writer: &mut W,
    store: &S,
    year: i32,
    json: bool,
) -> Result<()> {
    let view = year_view(store, year)?;
    emit(writer, &view, json, format_year)
}
