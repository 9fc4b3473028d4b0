//! Owns the one live serial connection and pumps bytes in and out of it.
//!
//! No framing happens here; raw bytes flow straight from the OS into
//! [`TransportEvent::DataReceived`] and the Reader Driver does all the
//! parsing. Mirrors the struct-wraps-a-handle shape of the vendored USB
//! device wrapper this crate grew out of, pointed at `serialport` instead.

use crate::config::MANDATORY_BAUD_RATE;
use crate::error::RfidError;
use serialport::{SerialPort, SerialPortType};
use std::io;
use std::time::Duration;

/// Standard baud rates offered to the host for manual selection. 9600 is the
/// only one the SM-6210 driver considers itself loaded at.
pub const BAUD_RATES: &[u32] = &[1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

/// One discovered serial port, as presented to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescriptor {
    /// Human-readable description (USB product string, or the raw port name).
    pub description: String,
    /// OS-level port name (`/dev/ttyUSB0`, `COM3`, ...).
    pub port_name: String,
}

/// Notifications the transport raises in response to a tick or an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The set of enumerated devices changed since the last poll.
    DevicesChanged(Vec<PortDescriptor>),
    /// The connection was opened (`true`) or closed (`false`).
    ConnectionChanged(bool),
    /// The baud rate in effect changed.
    BaudRateChanged(u32),
    /// Bytes arrived from the device.
    DataReceived(Vec<u8>),
    /// A `write()` call successfully submitted this slice to the port
    /// (truncated to whatever the kernel actually accepted).
    DataSent(Vec<u8>),
}

fn describe(info: &serialport::SerialPortInfo) -> String {
    match &info.port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb
                .product
                .clone()
                .unwrap_or_else(|| "USB serial device".to_string());
            format!("{product} ({:04x}:{:04x})", usb.vid, usb.pid)
        }
        _ => info.port_name.clone(),
    }
}

/// Serial transport: enumerates ports and owns at most one open connection.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    port_name: Option<String>,
    baud_rate: u32,
    known_ports: Vec<PortDescriptor>,
    sent: Vec<TransportEvent>,
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialTransport {
    /// Build a transport with no connection open yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            port: None,
            port_name: None,
            baud_rate: MANDATORY_BAUD_RATE,
            known_ports: Vec::new(),
            sent: Vec::new(),
        }
    }

    /// Enumerate currently available serial ports.
    #[must_use]
    pub fn list_devices() -> Vec<PortDescriptor> {
        match serialport::available_ports() {
            Ok(ports) => ports
                .into_iter()
                .map(|p| PortDescriptor {
                    description: describe(&p),
                    port_name: p.port_name,
                })
                .collect(),
            Err(e) => {
                log::warn!("failed to enumerate serial ports: {e}");
                Vec::new()
            }
        }
    }

    /// The platform's standard baud-rate set.
    #[must_use]
    pub fn list_baud_rates() -> &'static [u32] {
        BAUD_RATES
    }

    /// Poll device enumeration; returns `DevicesChanged` only when the
    /// snapshot differs from the previous call. Intended to be called on a
    /// one-second cadence by the facade.
    pub fn poll_devices(&mut self) -> Option<TransportEvent> {
        let current = Self::list_devices();
        if current == self.known_ports {
            return None;
        }
        self.known_ports = current.clone();
        Some(TransportEvent::DevicesChanged(current))
    }

    /// Open a connection to the device at `device_index` in the last
    /// enumerated snapshot, at `baud_rate`.
    ///
    /// # Errors
    /// Returns [`RfidError::PortUnavailable`] if `device_index` is stale, or
    /// [`RfidError::OpenFailed`] on an I/O error opening the port.
    pub fn open(&mut self, device_index: usize, baud_rate: u32) -> Result<TransportEvent, RfidError> {
        self.close(true);
        let descriptor = self
            .known_ports
            .get(device_index)
            .ok_or(RfidError::PortUnavailable(device_index))?
            .clone();
        let port = serialport::new(&descriptor.port_name, baud_rate)
            .timeout(Duration::from_millis(5))
            .open()?;
        self.port = Some(port);
        self.port_name = Some(descriptor.port_name.clone());
        self.baud_rate = baud_rate;
        log::info!(
            "opened serial port {} at {baud_rate} baud",
            descriptor.port_name
        );
        Ok(TransportEvent::ConnectionChanged(true))
    }

    /// Close any open connection. Idempotent. `silent` only affects whether
    /// the host is expected to surface a user-visible notice; it does not
    /// change the emitted event.
    pub fn close(&mut self, silent: bool) -> Option<TransportEvent> {
        if self.port.take().is_none() {
            return None;
        }
        log::info!(
            "closed serial port{}",
            if silent { "" } else { " (user requested)" }
        );
        self.port_name = None;
        Some(TransportEvent::ConnectionChanged(false))
    }

    /// Apply a new baud rate, to the live connection if one is open.
    ///
    /// # Errors
    /// Returns [`RfidError::Io`] if applying the rate to a live port fails.
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<TransportEvent, RfidError> {
        if let Some(port) = self.port.as_mut() {
            port.set_baud_rate(baud_rate)
                .map_err(|e| RfidError::Io(io::Error::new(io::ErrorKind::Other, e)))?;
        }
        self.baud_rate = baud_rate;
        log::debug!("baud rate set to {baud_rate}");
        Ok(TransportEvent::BaudRateChanged(baud_rate))
    }

    /// Baud rate currently in effect.
    #[must_use]
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Whether a connection is currently open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    /// Submit bytes for transmission.
    ///
    /// # Errors
    /// Returns [`RfidError::NotConnected`] if no port is open,
    /// [`RfidError::WriteShort`] if the kernel accepted fewer bytes than
    /// submitted, or [`RfidError::Io`] on a harder write failure (which also
    /// drops the connection).
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, RfidError> {
        let port = self.port.as_mut().ok_or(RfidError::NotConnected)?;
        match port.write(bytes) {
            Ok(n) => {
                self.sent.push(TransportEvent::DataSent(bytes[..n].to_vec()));
                if n < bytes.len() {
                    Err(RfidError::WriteShort {
                        expected: bytes.len(),
                        actual: n,
                    })
                } else {
                    Ok(n)
                }
            }
            Err(e) => {
                self.port = None;
                Err(RfidError::Io(e))
            }
        }
    }

    /// Drain the `DataSent` events accumulated since the last drain.
    pub fn drain_sent_events(&mut self) -> Vec<TransportEvent> {
        std::mem::take(&mut self.sent)
    }

    /// Drain whatever bytes are currently available without blocking.
    /// Returns `None` if nothing arrived. A hard read error drops the
    /// connection and reports it via `ConnectionChanged(false)`.
    pub fn poll_incoming(&mut self) -> Option<TransportEvent> {
        let port = self.port.as_mut()?;
        let mut buf = [0u8; 1024];
        match port.read(&mut buf) {
            Ok(0) => None,
            Ok(n) => Some(TransportEvent::DataReceived(buf[..n].to_vec())),
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => None,
            Err(e) => {
                log::warn!("serial read failed, dropping connection: {e}");
                self.port = None;
                Some(TransportEvent::ConnectionChanged(false))
            }
        }
    }
}
