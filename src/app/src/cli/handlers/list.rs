use api::error::RfidError;
use api::facade::CommandFacade;
use colorful::{Color, Colorful};

pub fn ports() -> Result<(), RfidError> {
    let facade = CommandFacade::new(api::config::FacadeConfig::default());
    let ports = facade.list_ports();
    if ports.is_empty() {
        println!("{}", "No serial ports found.".color(Color::Yellow));
        return Ok(());
    }
    for (i, port) in ports.iter().enumerate() {
        println!(
            "{} {} {}",
            format!("[{i}]").color(Color::Green).bold(),
            port.port_name.clone().color(Color::White),
            format!("({})", port.description).color(Color::DarkGray)
        );
    }
    Ok(())
}

pub fn bauds() -> Result<(), RfidError> {
    let facade = CommandFacade::new(api::config::FacadeConfig::default());
    for rate in facade.list_baud_rates() {
        println!("{rate}");
    }
    Ok(())
}

pub fn models() -> Result<(), RfidError> {
    let facade = CommandFacade::new(api::config::FacadeConfig::default());
    for model in facade.list_driver_models() {
        println!("{model}");
    }
    Ok(())
}
