//! Tunables the spec fixes as constants, plus the host-adjustable knobs
//! the Command Facade exposes.

use std::time::Duration;

/// How long a tag may go without a bank update before it's considered gone.
pub const CURRENT_TAG_TIMEOUT: Duration = Duration::from_millis(1000);

/// Cap on the driver's ingress buffer; overflow discards everything buffered.
pub const MAX_BUFFER_SIZE: usize = 16 * 1024;

/// Maximum EPC/TID bank payload length, in bytes.
pub const EPC_LENGTH: usize = 12;
/// Maximum RFU bank payload length, in bytes.
pub const RFU_LENGTH: usize = 8;
/// Maximum user bank payload length (all datagrams), in bytes.
pub const USER_LENGTH: usize = 64;
/// Number of 16-byte sub-blocks the user bank is split into.
pub const NUM_USER_DATAGRAMS: usize = 4;

/// The only baud rate at which the SM-6210 driver reports itself loaded.
pub const MANDATORY_BAUD_RATE: u32 = 9600;

/// Period at which the Command Facade ticks the driver.
pub const DRIVER_TICK_PERIOD: Duration = Duration::from_millis(20);

/// Period at which the Command Facade polls for device list changes.
pub const DEVICE_POLL_PERIOD: Duration = Duration::from_secs(1);

/// Number of times a write frame is retransmitted; the protocol's only
/// reliability primitive against a lossy link.
pub const WRITE_REPEAT_COUNT: usize = 10;

/// Consecutive unproductive ticks before the driver gives up and resets the
/// scan with `STOP_SEARCH`.
pub const SHIT_COUNT_RESET_THRESHOLD: u32 = 10;

/// Host-adjustable knobs collected for the Command Facade. Populated from
/// CLI arguments or left at their defaults.
#[derive(Debug, Clone)]
pub struct FacadeConfig {
    /// Index into the last `listDevices()` snapshot to open on startup, if any.
    pub port_index: Option<usize>,
    /// Baud rate to open the connection at.
    pub baud_rate: u32,
    /// Name of the reader driver model to instantiate.
    pub driver_model: String,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            port_index: None,
            baud_rate: MANDATORY_BAUD_RATE,
            driver_model: "sm6210".to_string(),
        }
    }
}
