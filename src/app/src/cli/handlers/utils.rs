//! Shared helpers: building a connected facade, pumping its event loop, and
//! rendering the events it raises.

use api::config::{DEVICE_POLL_PERIOD, DRIVER_TICK_PERIOD};
use api::error::RfidError;
use api::facade::{CommandFacade, FacadeEvent};
use colorful::{Color, Colorful};
use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::cli::commands::ConnectArgs;

/// Build a facade, select the requested port/baud and open the connection.
///
/// # Errors
/// Returns whatever error `toggle_connection` surfaces (stale port index,
/// I/O failure opening the serial device).
pub fn connect(args: &ConnectArgs) -> Result<CommandFacade, RfidError> {
    let mut facade = CommandFacade::new(api::config::FacadeConfig::default());
    facade.set_baud_rate(args.baud)?;
    facade.set_port(args.port);
    facade.toggle_connection()?;
    Ok(facade)
}

/// Drive the facade's three cooperative timers (device poll, watchdog,
/// driver tick) for up to `timeout`, calling `on_event` for everything it
/// raises, and stopping early if `stop_when` returns `true`.
///
/// # Errors
/// Returns a transport error if the driver's scheduled write fails in a way
/// that isn't a recoverable short write.
pub fn pump(
    facade: &mut CommandFacade,
    timeout: Duration,
    mut stop_when: impl FnMut(&CommandFacade) -> bool,
    mut on_event: impl FnMut(&FacadeEvent),
) -> Result<(), RfidError> {
    let start = Instant::now();
    let mut last_poll = start;
    let mut last_tick = start;

    loop {
        let now = Instant::now();

        if now.duration_since(last_tick) >= DRIVER_TICK_PERIOD {
            for event in facade.tick_driver(now)? {
                on_event(&event);
            }
            for event in facade.poll_watchdog(now) {
                on_event(&event);
            }
            last_tick = now;
        }

        if now.duration_since(last_poll) >= DEVICE_POLL_PERIOD {
            for event in facade.poll_devices() {
                on_event(&event);
            }
            last_poll = now;
        }

        if stop_when(facade) || now.duration_since(start) >= timeout {
            return Ok(());
        }

        std::thread::sleep(Duration::from_millis(5));
    }
}

/// Wait until a tag is current, or the timeout elapses.
pub fn wait_for_tag(facade: &mut CommandFacade, timeout: Duration) -> Result<(), RfidError> {
    pump(
        facade,
        timeout,
        |f| f.current_tag().is_some(),
        |event| log_event(event),
    )
}

/// Print a one-line rendering of a facade event, matching the CLI's color
/// conventions.
pub fn log_event(event: &FacadeEvent) {
    match event {
        FacadeEvent::Aggregator(e) => println!("{}", format!("{e:?}").color(Color::DarkGray)),
        FacadeEvent::Transport(e) => println!("{}", format!("{e:?}").color(Color::DarkGray)),
        FacadeEvent::ConnectionStateChanged(s) => {
            println!("{}", format!("connection: {s:?}").color(Color::Cyan));
        }
        FacadeEvent::FrameTooLarge => {
            println!("{}", "ingress buffer overflowed, discarding".color(Color::Red));
        }
        FacadeEvent::ConfirmationRequested(_) | FacadeEvent::OperationCompleted { .. } => {}
    }
}

/// Ask the operator to confirm a destructive operation unless `force` is set.
///
/// # Errors
/// Returns an I/O error if flushing the prompt or reading stdin fails.
pub fn confirm(prompt: &str, force: bool) -> io::Result<bool> {
    if force {
        return Ok(true);
    }
    print!("{} ", prompt.color(Color::Yellow));
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
