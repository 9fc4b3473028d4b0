//! Advertises available baud rates, ports, and driver models, and
//! instantiates the selected driver behind the [`ReaderDriver`] trait.

use crate::driver::sm6210::Sm6210Driver;
use crate::driver::ReaderDriver;
use crate::transport::{PortDescriptor, SerialTransport, BAUD_RATES};

/// Reader models this build knows how to drive. Adding a new model means
/// adding a match arm here and a `ReaderDriver` implementation under
/// `driver/` — nothing else in this crate references a concrete driver type.
pub const DRIVER_MODELS: &[&str] = &["sm6210"];

/// Enumerate currently available serial ports.
#[must_use]
pub fn list_ports() -> Vec<PortDescriptor> {
    SerialTransport::list_devices()
}

/// The platform's standard baud-rate set.
#[must_use]
pub fn list_baud_rates() -> &'static [u32] {
    BAUD_RATES
}

/// The reader driver model names this build supports.
#[must_use]
pub fn list_driver_models() -> &'static [&'static str] {
    DRIVER_MODELS
}

/// Instantiate the named driver model.
#[must_use]
pub fn instantiate_driver(model: &str) -> Option<Box<dyn ReaderDriver>> {
    match model {
        "sm6210" => Some(Box::new(Sm6210Driver::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_advertised_model_instantiates() {
        for model in DRIVER_MODELS {
            assert!(instantiate_driver(model).is_some());
        }
    }

    #[test]
    fn unknown_model_is_rejected() {
        assert!(instantiate_driver("does-not-exist").is_none());
    }
}
