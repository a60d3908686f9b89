//! Slot scheduling CLI library.
//!
//! This crate provides the `sb` command-line interface over the scheduling engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{BlockArgs, BookArgs, BookingFlags, Cli, Commands, DragAction, ServicesAction};
pub use config::Config;
