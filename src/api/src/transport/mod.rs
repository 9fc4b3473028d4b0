//! Serial transport: device enumeration and one owned connection.

mod serial_transport;

use crate::error::RfidError;

pub use serial_transport::{PortDescriptor, SerialTransport, TransportEvent, BAUD_RATES};

/// The slice of transport behaviour a [`crate::driver::ReaderDriver`] needs:
/// submit bytes, and check the preconditions [`crate::driver::ReaderDriver::loaded`]
/// gates on. Kept separate from [`SerialTransport`] itself so drivers can be
/// unit-tested against a fake without opening a real serial port.
pub trait Transport {
    /// Submit bytes for transmission. See [`SerialTransport::write`].
    ///
    /// # Errors
    /// Returns an error if no connection is open or the write fails.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, RfidError>;

    /// Whether a connection is currently open.
    fn is_connected(&self) -> bool;

    /// Baud rate currently in effect.
    fn baud_rate(&self) -> u32;
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, RfidError> {
        SerialTransport::write(self, bytes)
    }

    fn is_connected(&self) -> bool {
        SerialTransport::is_connected(self)
    }

    fn baud_rate(&self) -> u32 {
        SerialTransport::baud_rate(self)
    }
}

/// Records every frame it's asked to write, accepting it in full. Lets
/// driver tests assert on transmitted bytes without a real serial port.
#[cfg(test)]
pub(crate) struct FakeTransport {
    pub connected: bool,
    pub baud: u32,
    pub sent: Vec<Vec<u8>>,
}

#[cfg(test)]
impl FakeTransport {
    pub fn new(connected: bool, baud: u32) -> Self {
        Self {
            connected,
            baud,
            sent: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Transport for FakeTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, RfidError> {
        self.sent.push(bytes.to_vec());
        Ok(bytes.len())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn baud_rate(&self) -> u32 {
        self.baud
    }
}
