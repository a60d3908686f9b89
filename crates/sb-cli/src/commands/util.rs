//! Shared utilities for CLI commands.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};

use sb_core::time::{parse_date, parse_month};
use sb_core::{Client, DurationWarning};

use crate::BookingFlags;

/// Parses an optional `YYYY-MM-DD` argument, falling back to `today`.
pub fn date_or_today(value: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    value.map_or(Ok(today), |s| Ok(parse_date(s)?))
}

/// Parses an optional `YYYY-MM` argument into the first of the month.
pub fn month_or_current(value: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    match value {
        Some(s) => Ok(parse_month(s)?),
        None => today
            .with_day(1)
            .context("failed to compute first day of month"),
    }
}

/// Formats minor currency units as `units.cents`.
pub fn format_price(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Formats minutes as `1h 30m`, `45m` or `2h`.
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Service name and client from booking flags, if all three were given.
pub fn booking_details(flags: &BookingFlags) -> Result<Option<(String, Client)>> {
    match (&flags.service, &flags.client_name, &flags.client_email) {
        (None, None, None) => Ok(None),
        (Some(service), Some(name), Some(email)) => Ok(Some((
            service.clone(),
            Client {
                name: name.clone(),
                email: email.clone(),
            },
        ))),
        _ => anyhow::bail!("--service, --client-name and --client-email must be given together"),
    }
}

/// Asks on `input` whether to accept a duration warning. Anything but `y`/`yes` declines.
pub fn confirm_duration<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    warning: &DurationWarning,
) -> bool {
    let asked = write!(
        output,
        "Requested {} but the service normally takes {}. Book anyway? [y/N] ",
        format_minutes(warning.requested_minutes),
        format_minutes(warning.catalog_minutes)
    )
    .and_then(|()| output.flush());
    if asked.is_err() {
        return false;
    }

    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
