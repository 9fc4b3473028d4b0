use crate::cli::commands::ConfirmArgs;
use crate::cli::handlers::utils;
use api::error::RfidError;
use api::facade::{FacadeEvent, PendingOperation};
use colorful::{Color, Colorful};
use std::time::Duration;

pub fn handle(args: &ConfirmArgs) -> Result<(), RfidError> {
    let mut facade = utils::connect(&args.connect)?;
    utils::wait_for_tag(&mut facade, Duration::from_secs(args.connect.seconds))?;

    if facade.current_tag().is_none() {
        println!(
            "{}",
            "No tag found in range. Aborting.".color(Color::Yellow)
        );
        facade.toggle_connection()?;
        return Ok(());
    }

    if !utils::confirm(
        "This zeroes the tag's EPC, user and RFU banks. Continue? (y/n):",
        args.force,
    )? {
        println!("{}", "Operation cancelled.".color(Color::Yellow));
        facade.toggle_connection()?;
        return Ok(());
    }

    facade.request_erase_tag();
    let events = facade.confirm(true)?;
    match events.iter().find_map(|event| match event {
        FacadeEvent::OperationCompleted {
            operation: PendingOperation::EraseTag,
            success,
        } => Some(*success),
        _ => None,
    }) {
        Some(true) => println!("{}", "Erase successful!".color(Color::Green).bold()),
        Some(false) => println!("{}", "Erase failed.".color(Color::Red)),
        None => println!("{}", "Erase did not complete.".color(Color::Red)),
    }

    facade.toggle_connection()?;
    Ok(())
}
