use crate::cli::commands::WriteArgs;
use crate::cli::handlers::utils;
use api::error::RfidError;
use api::facade::{FacadeEvent, PendingOperation};
use colorful::{Color, Colorful};
use std::time::Duration;

/// Which bank a `write-*` subcommand targets.
pub enum Bank {
    Epc,
    Rfu,
    User,
}

impl Bank {
    fn label(&self) -> &'static str {
        match self {
            Self::Epc => "EPC",
            Self::Rfu => "RFU",
            Self::User => "user",
        }
    }
}

pub fn handle(bank: Bank, args: &WriteArgs) -> Result<(), RfidError> {
    println!(
        "{}",
        format!("Connecting to port {}...", args.connect.port).color(Color::Cyan)
    );
    let mut facade = utils::connect(&args.connect)?;

    println!(
        "{}",
        format!("Waiting up to {}s for a tag...", args.connect.seconds).color(Color::Cyan)
    );
    utils::wait_for_tag(&mut facade, Duration::from_secs(args.connect.seconds))?;

    if facade.current_tag().is_none() {
        println!(
            "{}",
            "No tag found in range. Aborting.".color(Color::Yellow)
        );
        facade.toggle_connection()?;
        return Ok(());
    }

    let prompt = format!(
        "About to write {} bytes to the {} bank. Continue? (y/n):",
        args.data.len(),
        bank.label()
    );
    if !utils::confirm(&prompt, args.force)? {
        println!("{}", "Operation cancelled.".color(Color::Yellow));
        facade.toggle_connection()?;
        return Ok(());
    }

    let event = match bank {
        Bank::Epc => facade.request_write_epc(args.data.clone()),
        Bank::Rfu => facade.request_write_rfu(args.data.clone()),
        Bank::User => facade.request_write_user(args.data.clone()),
    };
    debug_assert!(matches!(event, FacadeEvent::ConfirmationRequested(_)));

    let events = facade.confirm(true)?;
    match events.iter().find_map(|event| match event {
        FacadeEvent::OperationCompleted {
            operation: PendingOperation::WriteEpc(_) | PendingOperation::WriteRfu(_) | PendingOperation::WriteUser(_),
            success,
        } => Some(*success),
        _ => None,
    }) {
        Some(true) => println!("{}", "Write successful!".color(Color::Green).bold()),
        Some(false) => println!(
            "{}",
            "Write failed: not every repetition reached the reader.".color(Color::Red)
        ),
        None => println!("{}", "Write did not complete.".color(Color::Red)),
    }

    facade.toggle_connection()?;
    Ok(())
}
