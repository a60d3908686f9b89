//! Range selector: the drag-gesture state machine.
//!
//! A gesture starts on pointer-down, grows a contiguous selection while the
//! pointer moves, and resolves exactly once on pointer-up. Leaving the
//! surface mid-drag resolves the same way as pointer-up; there is no
//! discard path.
//!
//! Day and week views drag over the slots of a single date. The month view
//! drags over whole days of a single month and skips days that already
//! carry an all-day block.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::ScheduleError;
use crate::records::BlockedSlot;
use crate::registry::ensure_blocked;
use crate::store::{CalendarSnapshot, ScheduleStore};
use crate::time::{ClockTime, DateRange, SLOT_GRID, SLOT_MINUTES};

/// What a resolved gesture does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Propose a reservation covering the selection.
    Normal,
    /// Block every cell in the selection.
    Block,
}

/// Which kind of cell the gesture runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSurface {
    /// Time slots of one date (day and week views).
    Slots,
    /// Whole days of one month (month view).
    Days,
}

/// A grid cell addressed by a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Cell {
    Slot { date: NaiveDate, time: ClockTime },
    Day { date: NaiveDate },
}

impl Cell {
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::Slot { date, .. } | Self::Day { date } => *date,
        }
    }

    /// The slot time, or `None` for a whole-day cell.
    pub const fn time(&self) -> Option<ClockTime> {
        match self {
            Self::Slot { time, .. } => Some(*time),
            Self::Day { .. } => None,
        }
    }
}

/// Pointer input fed to the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    PointerDown(Cell),
    PointerEnter(Cell),
    PointerUp,
    /// The pointer left the interactive surface.
    PointerLeave,
}

/// An ordered, contiguous run of cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Selection {
    Slots { date: NaiveDate, times: Vec<ClockTime> },
    Days { dates: Vec<NaiveDate> },
}

impl Selection {
    fn single(cell: Cell) -> Self {
        match cell {
            Cell::Slot { date, time } => Self::Slots {
                date,
                times: vec![time],
            },
            Cell::Day { date } => Self::Days { dates: vec![date] },
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Slots { times, .. } => times.len(),
            Self::Days { dates } => dates.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, cell: &Cell) -> bool {
        match (self, cell) {
            (Self::Slots { date, times }, Cell::Slot { date: d, time }) => {
                date == d && times.contains(time)
            }
            (Self::Days { dates }, Cell::Day { date }) => dates.contains(date),
            _ => false,
        }
    }

    pub fn cells(&self) -> Vec<Cell> {
        match self {
            Self::Slots { date, times } => times
                .iter()
                .map(|time| Cell::Slot {
                    date: *date,
                    time: *time,
                })
                .collect(),
            Self::Days { dates } => dates.iter().map(|date| Cell::Day { date: *date }).collect(),
        }
    }

    /// Requested length of a reservation built from this selection.
    pub fn duration_minutes(&self) -> i64 {
        i64::try_from(self.len()).unwrap_or(i64::MAX) * SLOT_MINUTES
    }

    /// `(date, start, minutes)` for a slot selection.
    pub fn booking_window(&self) -> Option<(NaiveDate, ClockTime, i64)> {
        match self {
            Self::Slots { date, times } => times
                .first()
                .map(|start| (*date, *start, self.duration_minutes())),
            Self::Days { .. } => None,
        }
    }
}

/// Why a pointer-down did not start a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    CellReserved,
    DayClosed,
}

/// A cell that could not be blocked during a bulk block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellFailure {
    pub cell: Cell,
    pub message: String,
}

/// Per-cell results of a bulk block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Records created by this batch.
    pub blocked: Vec<BlockedSlot>,
    /// Cells that were already blocked.
    pub skipped: Vec<Cell>,
    pub failed: Vec<CellFailure>,
}

/// What a gesture event produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// The event had no effect in the current state.
    Ignored,
    /// Pointer-down refused to start a drag.
    Rejected(Rejection),
    /// The drag is in progress with this selection.
    Selecting(Selection),
    /// Block mode resolved; every cell succeeded or was already blocked.
    Blocked(BatchOutcome),
    /// Normal mode resolved into a reservation proposal for the selection.
    Proposed(Selection),
}

/// Selector state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { anchor: Cell, selection: Selection },
}

/// Drag-gesture state machine for one view.
#[derive(Debug, Clone)]
pub struct RangeSelector {
    mode: Mode,
    surface: DragSurface,
    block_reason: String,
    state: DragState,
}

impl RangeSelector {
    pub fn new(surface: DragSurface, mode: Mode, block_reason: impl Into<String>) -> Self {
        Self {
            mode,
            surface,
            block_reason: block_reason.into(),
            state: DragState::Idle,
        }
    }

    pub const fn mode(&self) -> Mode {
        self.mode
    }

    pub const fn state(&self) -> &DragState {
        &self.state
    }

    /// The in-flight selection, if dragging.
    pub const fn selection(&self) -> Option<&Selection> {
        match &self.state {
            DragState::Dragging { selection, .. } => Some(selection),
            DragState::Idle => None,
        }
    }

    /// Feeds one pointer event through the state machine.
    ///
    /// Block-mode resolution returns `PartialBatchFailure` when any cell
    /// failed; cells blocked before the failure stay blocked.
    pub fn on_gesture<S: ScheduleStore + ?Sized>(
        &mut self,
        store: &mut S,
        event: GestureEvent,
    ) -> Result<GestureOutcome, ScheduleError> {
        match event {
            GestureEvent::PointerDown(cell) => self.pointer_down(store, cell),
            GestureEvent::PointerEnter(cell) => self.pointer_enter(store, cell),
            GestureEvent::PointerUp | GestureEvent::PointerLeave => self.release(store),
        }
    }

    fn pointer_down<S: ScheduleStore + ?Sized>(
        &mut self,
        store: &S,
        cell: Cell,
    ) -> Result<GestureOutcome, ScheduleError> {
        if !matches!(self.state, DragState::Idle) {
            return Ok(GestureOutcome::Ignored);
        }
        self.check_surface(cell)?;

        let date = cell.date();
        let snapshot = CalendarSnapshot::fetch(store, DateRange::day(date))?;
        if snapshot.all_day_block(date).is_some() {
            return Ok(GestureOutcome::Rejected(Rejection::DayClosed));
        }
        if let Some(time) = cell.time() {
            if snapshot.confirmed_on(date).any(|r| r.covers(time.minutes())) {
                return Ok(GestureOutcome::Rejected(Rejection::CellReserved));
            }
        }

        let selection = Selection::single(cell);
        self.state = DragState::Dragging {
            anchor: cell,
            selection: selection.clone(),
        };
        Ok(GestureOutcome::Selecting(selection))
    }

    fn pointer_enter<S: ScheduleStore + ?Sized>(
        &mut self,
        store: &S,
        cell: Cell,
    ) -> Result<GestureOutcome, ScheduleError> {
        let DragState::Dragging { anchor, selection } = &mut self.state else {
            return Ok(GestureOutcome::Ignored);
        };
        let next = match (*anchor, cell) {
            (Cell::Slot { date, time: from }, Cell::Slot { date: d, time: to }) if d == date => {
                Some(slot_range(date, grid_index(from)?, grid_index(to)?))
            }
            (Cell::Day { date: from }, Cell::Day { date: to }) if same_month(from, to) => {
                Some(day_range(store, from, to)?)
            }
            _ => None,
        };
        match next {
            Some(next) => {
                *selection = next;
                Ok(GestureOutcome::Selecting(selection.clone()))
            }
            None => Ok(GestureOutcome::Ignored),
        }
    }

    fn release<S: ScheduleStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<GestureOutcome, ScheduleError> {
        let DragState::Dragging { selection, .. } = std::mem::take(&mut self.state) else {
            return Ok(GestureOutcome::Ignored);
        };
        match self.mode {
            Mode::Normal => {
                tracing::debug!(cells = selection.len(), "drag resolved into proposal");
                Ok(GestureOutcome::Proposed(selection))
            }
            Mode::Block => {
                let outcome = block_cells(store, &selection, &self.block_reason);
                if outcome.failed.is_empty() {
                    Ok(GestureOutcome::Blocked(outcome))
                } else {
                    Err(ScheduleError::PartialBatchFailure(Box::new(outcome)))
                }
            }
        }
    }

    fn check_surface(&self, cell: Cell) -> Result<(), ScheduleError> {
        match (self.surface, cell) {
            (DragSurface::Slots, Cell::Slot { time, .. }) => grid_index(time).map(|_| ()),
            (DragSurface::Days, Cell::Day { .. }) => Ok(()),
            _ => Err(ScheduleError::InvalidInput(
                "cell does not belong to this view".to_string(),
            )),
        }
    }
}

/// Best-effort per-cell block; failures are collected, never rolled back.
fn block_cells<S: ScheduleStore + ?Sized>(
    store: &mut S,
    selection: &Selection,
    reason: &str,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for cell in selection.cells() {
        match ensure_blocked(store, cell.date(), cell.time(), reason) {
            Ok((block, true)) => outcome.blocked.push(block),
            Ok((_, false)) => outcome.skipped.push(cell),
            Err(err) => {
                tracing::warn!(
                    date = %cell.date(),
                    time = ?cell.time().map(|t| t.to_string()),
                    error = %err,
                    "failed to block cell"
                );
                outcome.failed.push(CellFailure {
                    cell,
                    message: err.to_string(),
                });
            }
        }
    }
    tracing::debug!(
        blocked = outcome.blocked.len(),
        skipped = outcome.skipped.len(),
        failed = outcome.failed.len(),
        "bulk block finished"
    );
    outcome
}

fn grid_index(time: ClockTime) -> Result<usize, ScheduleError> {
    time.slot_index()
        .ok_or_else(|| ScheduleError::InvalidInput(format!("{time} is not a grid slot")))
}

fn slot_range(date: NaiveDate, a: usize, b: usize) -> Selection {
    Selection::Slots {
        date,
        times: SLOT_GRID[a.min(b)..=a.max(b)].to_vec(),
    }
}

fn day_range<S: ScheduleStore + ?Sized>(
    store: &S,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Selection, ScheduleError> {
    let (start, end) = if from <= to { (from, to) } else { (to, from) };
    let range = DateRange::new(start, end + chrono::Duration::days(1));
    let blocks = store.list_blocked_slots(range)?;
    let dates = range
        .days()
        .filter(|d| !blocks.iter().any(|b| b.targets(*d, None)))
        .collect();
    Ok(Selection::Days { dates })
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
