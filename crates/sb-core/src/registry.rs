//! Block registry: idempotent create/remove of blocked days and slots.
//!
//! The store has no uniqueness constraint, so every mutation reads the
//! current state for the target first. Two sessions toggling the same cell
//! can still race; the last write wins. Unblocking removes every matching
//! record, which also cleans up duplicates left behind by such a race.

use chrono::NaiveDate;

use crate::error::ScheduleError;
use crate::records::BlockedSlot;
use crate::store::ScheduleStore;
use crate::time::{ClockTime, DateRange};

/// Result of a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The target was free and is now blocked.
    Blocked(BlockedSlot),
    /// The target was blocked; these records were removed.
    Unblocked(Vec<BlockedSlot>),
}

impl ToggleOutcome {
    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }
}

/// Blocks the whole day, returning the existing record if there is one.
pub fn block_day<S: ScheduleStore + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    reason: &str,
) -> Result<BlockedSlot, ScheduleError> {
    block(store, date, None, reason)
}

/// Removes the all-day block, if any.
pub fn unblock_day<S: ScheduleStore + ?Sized>(
    store: &mut S,
    date: NaiveDate,
) -> Result<Vec<BlockedSlot>, ScheduleError> {
    unblock(store, date, None)
}

/// Blocks one slot, returning the existing record if there is one.
pub fn block_slot<S: ScheduleStore + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    time: ClockTime,
    reason: &str,
) -> Result<BlockedSlot, ScheduleError> {
    block(store, date, Some(time), reason)
}

/// Removes the block on one slot, if any.
pub fn unblock_slot<S: ScheduleStore + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    time: ClockTime,
) -> Result<Vec<BlockedSlot>, ScheduleError> {
    unblock(store, date, Some(time))
}

pub fn toggle_slot<S: ScheduleStore + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    time: ClockTime,
    reason: &str,
) -> Result<ToggleOutcome, ScheduleError> {
    toggle_block(store, date, Some(time), reason)
}

pub fn toggle_day<S: ScheduleStore + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    reason: &str,
) -> Result<ToggleOutcome, ScheduleError> {
    toggle_block(store, date, None, reason)
}

/// Inverts the block state of a slot (`Some(time)`) or a whole day (`None`).
pub fn toggle_block<S: ScheduleStore + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    time: Option<ClockTime>,
    reason: &str,
) -> Result<ToggleOutcome, ScheduleError> {
    if existing(store, date, time)?.is_empty() {
        let created = create(store, date, time, reason)?;
        Ok(ToggleOutcome::Blocked(created))
    } else {
        Ok(ToggleOutcome::Unblocked(unblock(store, date, time)?))
    }
}

/// Whether the slot (or day, for `None`) currently carries its own block.
pub fn is_blocked<S: ScheduleStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    time: Option<ClockTime>,
) -> Result<bool, ScheduleError> {
    Ok(!existing(store, date, time)?.is_empty())
}

fn block<S: ScheduleStore + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    time: Option<ClockTime>,
    reason: &str,
) -> Result<BlockedSlot, ScheduleError> {
    ensure_blocked(store, date, time, reason).map(|(block, _)| block)
}

/// Blocks the target unless already blocked; the flag is true when a record was created.
pub(crate) fn ensure_blocked<S: ScheduleStore + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    time: Option<ClockTime>,
    reason: &str,
) -> Result<(BlockedSlot, bool), ScheduleError> {
    if let Some(found) = existing(store, date, time)?.into_iter().next() {
        tracing::debug!(%date, time = ?time.map(|t| t.to_string()), "already blocked");
        return Ok((found, false));
    }
    create(store, date, time, reason).map(|block| (block, true))
}

fn unblock<S: ScheduleStore + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    time: Option<ClockTime>,
) -> Result<Vec<BlockedSlot>, ScheduleError> {
    let matching = existing(store, date, time)?;
    for block in &matching {
        store.delete_blocked_slot(&block.id)?;
        tracing::debug!(%date, id = %block.id, "removed block");
    }
    Ok(matching)
}

fn create<S: ScheduleStore + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    time: Option<ClockTime>,
    reason: &str,
) -> Result<BlockedSlot, ScheduleError> {
    let created = store.create_blocked_slot(date, time, reason)?;
    tracing::debug!(%date, id = %created.id, all_day = created.all_day(), reason, "created block");
    Ok(created)
}

fn existing<S: ScheduleStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    time: Option<ClockTime>,
) -> Result<Vec<BlockedSlot>, ScheduleError> {
    Ok(store
        .list_blocked_slots(DateRange::day(date))?
        .into_iter()
        .filter(|b| b.targets(date, time))
        .collect())
}
