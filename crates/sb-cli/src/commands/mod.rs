//! CLI subcommand implementations.

pub mod block;
pub mod book;
pub mod check;
pub mod drag;
pub mod services;
pub mod status;
pub mod util;
pub mod views;
