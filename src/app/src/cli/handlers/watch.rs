use crate::cli::commands::ConnectArgs;
use crate::cli::handlers::utils;
use api::error::RfidError;
use colorful::{Color, Colorful};
use std::time::Duration;

pub fn handle(args: &ConnectArgs) -> Result<(), RfidError> {
    println!(
        "{}",
        format!("Connecting to port {}...", args.port).color(Color::Cyan)
    );
    let mut facade = utils::connect(args)?;
    println!(
        "{}",
        format!(
            "Connected with the {} driver. Watching for {} seconds...",
            facade.driver_model_name(),
            args.seconds
        )
        .color(Color::Green)
    );

    utils::pump(
        &mut facade,
        Duration::from_secs(args.seconds),
        |_| false,
        utils::log_event,
    )?;

    println!(
        "{} {} {}",
        "Observed".color(Color::Cyan),
        facade.history().len().to_string().color(Color::White).bold(),
        "distinct tags.".color(Color::Cyan)
    );
    facade.toggle_connection()?;
    Ok(())
}
