use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sb_cli::commands::block::Target;
use sb_cli::commands::{block, book, check, drag, services, status, util, views};
use sb_cli::{Cli, Commands, Config, DragAction, ServicesAction};
use sb_core::time::parse_date;
use sb_core::{
    Cell, ClockTime, DragSurface, DurationWarning, Mode, RangeSelector, ReservationRequest, Service,
};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(sb_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = sb_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Accepts duration warnings outright with `--yes`, otherwise asks on stdin.
fn confirm_on_stdin(yes: bool) -> impl FnOnce(&DurationWarning) -> bool {
    move |warning: &DurationWarning| {
        yes || util::confirm_duration(&mut io::stdin().lock(), &mut io::stderr(), warning)
    }
}

const fn drag_mode(block: bool) -> Mode {
    if block { Mode::Block } else { Mode::Normal }
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut out = io::stdout().lock();
    let config_path = cli.config.as_deref();

    match &cli.command {
        Some(Commands::Day { date, json }) => {
            let (db, _config) = open_database(config_path)?;
            let date = util::date_or_today(date.as_deref(), today())?;
            views::run_day(&mut out, &db, date, *json)?;
        }
        Some(Commands::Week { date, json }) => {
            let (db, _config) = open_database(config_path)?;
            let date = util::date_or_today(date.as_deref(), today())?;
            views::run_week(&mut out, &db, date, *json)?;
        }
        Some(Commands::Month { month, json }) => {
            let (db, _config) = open_database(config_path)?;
            let first = util::month_or_current(month.as_deref(), today())?;
            views::run_month(&mut out, &db, first, *json)?;
        }
        Some(Commands::Year { year, json }) => {
            let (db, _config) = open_database(config_path)?;
            let year = year.unwrap_or_else(|| today().year());
            views::run_year(&mut out, &db, year, *json)?;
        }
        Some(Commands::Check {
            date,
            time,
            duration,
        }) => {
            let (db, _config) = open_database(config_path)?;
            check::run(&mut out, &db, parse_date(date)?, time, *duration)?;
        }
        Some(Commands::Block(args)) => {
            let (mut db, config) = open_database(config_path)?;
            let target = Target::parse(parse_date(&args.date)?, args.time.as_deref())?;
            let reason = args
                .reason
                .as_deref()
                .unwrap_or_else(|| config.reason_for(target.time.is_some()));
            block::run_block(&mut out, &mut db, target, reason)?;
        }
        Some(Commands::Unblock(args)) => {
            let (mut db, _config) = open_database(config_path)?;
            let target = Target::parse(parse_date(&args.date)?, args.time.as_deref())?;
            block::run_unblock(&mut out, &mut db, target)?;
        }
        Some(Commands::Toggle(args)) => {
            let (mut db, config) = open_database(config_path)?;
            let target = Target::parse(parse_date(&args.date)?, args.time.as_deref())?;
            let reason = args
                .reason
                .as_deref()
                .unwrap_or_else(|| config.reason_for(target.time.is_some()));
            block::run_toggle(&mut out, &mut db, target, reason)?;
        }
        Some(Commands::Book(args)) => {
            let Some((service_name, client)) = util::booking_details(&args.booking)? else {
                anyhow::bail!("book requires --service, --client-name and --client-email");
            };
            let request = ReservationRequest {
                date: parse_date(&args.date)?,
                time: ClockTime::parse(&args.time)?,
                service_name,
                client,
                requested_minutes: args.duration,
            };
            let (mut db, _config) = open_database(config_path)?;
            book::run(&mut out, &mut db, &request, confirm_on_stdin(args.booking.yes))?;
        }
        Some(Commands::Drag(action)) => {
            let (mut db, config) = open_database(config_path)?;
            match action {
                DragAction::Slots {
                    date,
                    from,
                    to,
                    block,
                    booking,
                } => {
                    let date = parse_date(date)?;
                    let from = Cell::Slot {
                        date,
                        time: ClockTime::parse(from)?,
                    };
                    let to = Cell::Slot {
                        date,
                        time: ClockTime::parse(to)?,
                    };
                    let mut selector = RangeSelector::new(
                        DragSurface::Slots,
                        drag_mode(*block),
                        config.block_reason.clone(),
                    );
                    drag::run(
                        &mut out,
                        &mut db,
                        &mut selector,
                        from,
                        to,
                        util::booking_details(booking)?,
                        confirm_on_stdin(booking.yes),
                    )?;
                }
                DragAction::Days { from, to, block } => {
                    let from = Cell::Day {
                        date: parse_date(from)?,
                    };
                    let to = Cell::Day {
                        date: parse_date(to)?,
                    };
                    let mut selector = RangeSelector::new(
                        DragSurface::Days,
                        drag_mode(*block),
                        config.closed_reason.clone(),
                    );
                    drag::run(&mut out, &mut db, &mut selector, from, to, None, |_| false)?;
                }
            }
        }
        Some(Commands::Services(action)) => {
            let (db, _config) = open_database(config_path)?;
            match action {
                ServicesAction::List { json } => services::list(&mut out, &db, *json)?,
                ServicesAction::Add {
                    name,
                    price,
                    duration,
                } => services::add(
                    &mut out,
                    &db,
                    &Service {
                        name: name.clone(),
                        price: *price,
                        duration_minutes: *duration,
                    },
                )?,
                ServicesAction::Remove { name } => services::remove(&mut out, &db, name)?,
            }
        }
        Some(Commands::Status) => {
            let (db, config) = open_database(config_path)?;
            status::run(&mut out, &db, &config.database_path)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
