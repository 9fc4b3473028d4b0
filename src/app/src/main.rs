#![warn(clippy::pedantic)]

mod cli;

use crate::cli::commands::Cli;
use api::error::RfidError;
use api::platform;
use clap::Parser;
use colorful::{Color, Colorful};
use std::process;

fn main() -> Result<(), RfidError> {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = platform::check_serial_permissions() {
        eprintln!(
            "{}",
            format!("Serial permission check failed: {e}").color(Color::Red)
        );
        platform::print_permission_instructions();
        process::exit(1);
    }

    cli::run(&cli)
}
