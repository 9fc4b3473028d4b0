//! Error taxonomy for the high-level RFID API.

use protocol::types::ProtocolError;
use thiserror::Error;

/// High-level application errors for RFID operations.
#[derive(Error, Debug)]
pub enum RfidError {
    /// The selected port index no longer matches the last enumerated snapshot.
    #[error("port index {0} is no longer available")]
    PortUnavailable(usize),

    /// Opening the serial connection failed.
    #[error("failed to open serial port: {0}")]
    OpenFailed(#[from] serialport::Error),

    /// A read or write against an already-open port failed at the OS level.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A write placed fewer bytes on the wire than were submitted.
    #[error("write accepted only {actual} of {expected} bytes")]
    WriteShort {
        /// Bytes the caller asked to send.
        expected: usize,
        /// Bytes the kernel actually accepted.
        actual: usize,
    },

    /// An operation was attempted while the driver's load preconditions
    /// (connected, correct baud rate) are not met.
    #[error("driver not loaded: port not connected at the mandatory baud rate")]
    NotLoaded,

    /// No serial connection is currently open.
    #[error("no serial connection is open")]
    NotConnected,

    /// A payload failed size or hex-decoding constraints.
    #[error("encoding error: {0}")]
    EncodingError(String),

    /// The selected driver model does not implement this operation.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// The driver's ingress buffer exceeded its size cap and was discarded.
    #[error("ingress buffer exceeded its size cap and was discarded")]
    FrameTooLarge,

    /// Wrapped wire-framing error from the protocol crate.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
