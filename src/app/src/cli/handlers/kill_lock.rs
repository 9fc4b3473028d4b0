//! `kill`/`lock` handlers. The SM-6210 driver never implements either
//! operation; these exist so the command surface stays uniform across
//! reader models per the facade contract.

use crate::cli::commands::ConfirmArgs;
use crate::cli::handlers::utils;
use api::error::RfidError;
use api::facade::FacadeEvent;
use colorful::{Color, Colorful};
use std::time::Duration;

pub enum Operation {
    Kill,
    Lock,
}

pub fn handle(op: Operation, args: &ConfirmArgs) -> Result<(), RfidError> {
    let mut facade = utils::connect(&args.connect)?;
    utils::wait_for_tag(&mut facade, Duration::from_secs(args.connect.seconds))?;

    let name = match op {
        Operation::Kill => "kill",
        Operation::Lock => "lock",
    };
    if !utils::confirm(&format!("Attempt to {name} the current tag? (y/n):"), args.force)? {
        println!("{}", "Operation cancelled.".color(Color::Yellow));
        facade.toggle_connection()?;
        return Ok(());
    }

    let requested = match op {
        Operation::Kill => facade.request_kill_tag(),
        Operation::Lock => facade.request_lock_tag(),
    };
    debug_assert!(matches!(requested, FacadeEvent::ConfirmationRequested(_)));

    let succeeded = matches!(facade.confirm(true), Ok(events) if events.iter().any(|event| {
        matches!(event, FacadeEvent::OperationCompleted { success: true, .. })
    }));
    if succeeded {
        println!("{}", format!("{name} succeeded.").color(Color::Green));
    } else {
        println!(
            "{}",
            format!("{name} is not supported by the {} driver.", facade.driver_model_name())
                .color(Color::Yellow)
        );
    }

    facade.toggle_connection()?;
    Ok(())
}
