//! `sb block`, `sb unblock` and `sb toggle`.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;

use sb_core::registry::{block_day, block_slot, unblock_day, unblock_slot};
use sb_core::{ClockTime, ScheduleStore, ToggleOutcome, toggle_block};

/// A day or a single slot on it.
#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub date: NaiveDate,
    pub time: Option<ClockTime>,
}

impl Target {
    pub fn parse(date: NaiveDate, time: Option<&str>) -> Result<Self> {
        let time = time.map(ClockTime::parse).transpose()?;
        Ok(Self { date, time })
    }

    fn describe(self) -> String {
        match self.time {
            Some(time) => format!("{} {time}", self.date),
            None => format!("{} (all day)", self.date),
        }
    }
}

pub fn run_block<W: Write, S: ScheduleStore + ?Sized>(
    writer: &mut W,
    store: &mut S,
    target: Target,
    reason: &str,
) -> Result<()> {
    let block = match target.time {
        Some(time) => block_slot(store, target.date, time, reason)?,
        None => block_day(store, target.date, reason)?,
    };
    writeln!(writer, "Blocked {}: {}", target.describe(), block.reason)?;
    Ok(())
}

pub fn run_unblock<W: Write, S: ScheduleStore + ?Sized>(
    writer: &mut W,
    store: &mut S,
    target: Target,
) -> Result<()> {
    let removed = match target.time {
        Some(time) => unblock_slot(store, target.date, time)?,
        None => unblock_day(store, target.date)?,
    };
    if removed.is_empty() {
        writeln!(writer, "{} was not blocked", target.describe())?;
    } else {
        writeln!(writer, "Unblocked {}", target.describe())?;
    }
    Ok(())
}

pub fn run_toggle<W: Write, S: ScheduleStore + ?Sized>(
    writer: &mut W,
    store: &mut S,
    target: Target,
    reason: &str,
) -> Result<()> {
    match toggle_block(store, target.date, target.time, reason)? {
        ToggleOutcome::Blocked(block) => {
            writeln!(writer, "Blocked {}: {}", target.describe(), block.reason)?;
        }
        ToggleOutcome::Unblocked(_) => writeln!(writer, "Unblocked {}", target.describe())?,
    }
    Ok(())
}
