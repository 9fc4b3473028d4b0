//! CLI module for the SM-6210 RFID command-line application

use api::error::RfidError;
use commands::{Cli, Commands};

pub mod commands;
mod handlers;

pub fn run(cli: &Cli) -> Result<(), RfidError> {
    match &cli.command {
        Commands::ListPorts => handlers::list::ports(),
        Commands::ListBauds => handlers::list::bauds(),
        Commands::ListModels => handlers::list::models(),
        Commands::Watch(args) => handlers::watch::handle(args),
        Commands::WriteEpc(args) => handlers::write::handle(handlers::write::Bank::Epc, args),
        Commands::WriteRfu(args) => handlers::write::handle(handlers::write::Bank::Rfu, args),
        Commands::WriteUser(args) => handlers::write::handle(handlers::write::Bank::User, args),
        Commands::Erase(args) => handlers::erase::handle(args),
        Commands::Kill(args) => handlers::kill_lock::handle(handlers::kill_lock::Operation::Kill, args),
        Commands::Lock(args) => handlers::kill_lock::handle(handlers::kill_lock::Operation::Lock, args),
        Commands::Dump(args) => handlers::dump::handle(args),
        Commands::Csv(args) => handlers::csv::handle(args),
    }
}
