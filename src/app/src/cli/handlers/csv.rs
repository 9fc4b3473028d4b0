use crate::cli::commands::CsvArgs;
use crate::cli::handlers::utils;
use api::aggregator::Aggregator;
use api::error::RfidError;
use colorful::{Color, Colorful};
use std::fs;
use std::time::Duration;

pub fn handle(args: &CsvArgs) -> Result<(), RfidError> {
    println!(
        "{}",
        format!(
            "Watching for {} seconds before exporting...",
            args.connect.seconds
        )
        .color(Color::Cyan)
    );
    let mut facade = utils::connect(&args.connect)?;
    utils::pump(
        &mut facade,
        Duration::from_secs(args.connect.seconds),
        |_| false,
        utils::log_event,
    )?;

    let mut csv = String::from(Aggregator::csv_header());
    csv.push('\n');
    for tag in facade.history() {
        csv.push_str(&Aggregator::csv_row(tag));
        csv.push('\n');
    }

    match &args.output {
        Some(path) => {
            fs::write(path, &csv).map_err(RfidError::Io)?;
            println!(
                "{}",
                format!("Wrote {} rows to {}", facade.history().len(), path.display())
                    .color(Color::Green)
            );
        }
        None => print!("{csv}"),
    }

    facade.toggle_connection()?;
    Ok(())
}
