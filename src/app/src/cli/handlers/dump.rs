use crate::cli::commands::ConnectArgs;
use crate::cli::handlers::utils;
use api::aggregator::Aggregator;
use api::error::RfidError;
use colorful::{Color, Colorful};
use std::time::Duration;

pub fn handle(args: &ConnectArgs) -> Result<(), RfidError> {
    let mut facade = utils::connect(args)?;
    utils::wait_for_tag(&mut facade, Duration::from_secs(args.seconds))?;

    match facade.current_tag() {
        Some(tag) => {
            println!("{}", Aggregator::memory_map(tag));
        }
        None => println!(
            "{}",
            "No tag found in range within the timeout.".color(Color::Yellow)
        ),
    }

    facade.toggle_connection()?;
    Ok(())
}
