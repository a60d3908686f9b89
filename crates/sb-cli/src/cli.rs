//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Appointment calendar for a single bookable resource.
///
/// Shows day, week, month and year views over a 09:00-23:00 half-hour grid,
/// checks availability, maintains blocked days and slots, and books
/// reservations with an automatic preparation buffer.
#[derive(Debug, Parser)]
#[command(name = "sb", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the slots of one day.
    Day {
        /// Date (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the Monday-start week containing a date.
    Week {
        /// Any date in the week (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a month calendar with per-day counts.
    Month {
        /// Month (YYYY-MM); defaults to the current month.
        #[arg(long)]
        month: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show per-month totals for a year.
    Year {
        /// Year; defaults to the current year.
        #[arg(long)]
        year: Option<i32>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check whether an interval is free.
    Check {
        #[arg(long)]
        date: String,

        /// Start time (HH:MM).
        #[arg(long)]
        time: String,

        /// Service length in minutes.
        #[arg(long)]
        duration: i64,
    },

    /// Block a slot, or the whole day when no time is given.
    Block(BlockArgs),

    /// Remove a slot or all-day block.
    Unblock(BlockArgs),

    /// Flip the block state of a slot or day.
    Toggle(BlockArgs),

    /// Book a reservation.
    Book(BookArgs),

    /// Simulate a drag gesture over the calendar.
    #[command(subcommand)]
    Drag(DragAction),

    /// Manage the service catalog.
    #[command(subcommand)]
    Services(ServicesAction),

    /// Show database location and record counts.
    Status,
}

/// Target of a block command.
#[derive(Debug, Args)]
pub struct BlockArgs {
    /// Date (YYYY-MM-DD).
    #[arg(long)]
    pub date: String,

    /// Slot time (HH:MM); omit to target the whole day.
    #[arg(long)]
    pub time: Option<String>,

    /// Reason stored on new blocks.
    #[arg(long)]
    pub reason: Option<String>,
}

/// Booking details.
#[derive(Debug, Args)]
pub struct BookArgs {
    /// Date (YYYY-MM-DD).
    #[arg(long)]
    pub date: String,

    /// Start time (HH:MM).
    #[arg(long)]
    pub time: String,

    #[command(flatten)]
    pub booking: BookingFlags,

    /// Length in minutes; defaults to the catalog duration.
    #[arg(long)]
    pub duration: Option<i64>,
}

/// Service and client fields shared by `book` and `drag slots`.
#[derive(Debug, Args)]
pub struct BookingFlags {
    /// Service name from the catalog.
    #[arg(long)]
    pub service: Option<String>,

    #[arg(long)]
    pub client_name: Option<String>,

    #[arg(long)]
    pub client_email: Option<String>,

    /// Accept a duration warning without asking.
    #[arg(long, short)]
    pub yes: bool,
}

/// Drag surfaces.
#[derive(Debug, Subcommand)]
pub enum DragAction {
    /// Drag across the slots of one day.
    Slots {
        #[arg(long)]
        date: String,

        /// Slot where the pointer goes down (HH:MM).
        #[arg(long)]
        from: String,

        /// Slot where the pointer is released (HH:MM).
        #[arg(long)]
        to: String,

        /// Block the selected slots instead of booking them.
        #[arg(long)]
        block: bool,

        #[command(flatten)]
        booking: BookingFlags,
    },

    /// Drag across whole days of one month.
    Days {
        /// First day (YYYY-MM-DD).
        #[arg(long)]
        from: String,

        /// Last day (YYYY-MM-DD).
        #[arg(long)]
        to: String,

        /// Block the selected days.
        #[arg(long)]
        block: bool,
    },
}

/// Service catalog actions.
#[derive(Debug, Subcommand)]
pub enum ServicesAction {
    /// List services.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add or update a service.
    Add {
        #[arg(long)]
        name: String,

        /// Price in minor currency units (e.g. cents).
        #[arg(long)]
        price: i64,

        /// Duration in minutes.
        #[arg(long)]
        duration: i64,
    },

    /// Remove a service.
    Remove {
        #[arg(long)]
        name: String,
    },
}
