//! Reader driver abstraction: a per-model state machine that schedules
//! requests and classifies replies. New reader models plug in behind
//! [`ReaderDriver`] without the Aggregator or Command Facade changing.

pub mod sm6210;

use crate::error::RfidError;
use crate::transport::Transport;

/// A bank payload lifted out of the wire protocol, ready for the Tag
/// Aggregator to fuse into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankEvent {
    /// Electronic Product Code bytes.
    Epc(Vec<u8>),
    /// Transponder ID bytes.
    Tid(Vec<u8>),
    /// Reserved/access password bank bytes.
    Rfu(Vec<u8>),
    /// One user-bank datagram.
    User {
        /// Index in `[0, NUM_USER_DATAGRAMS)`.
        datagram: usize,
        /// The datagram's bytes.
        payload: Vec<u8>,
    },
}

/// State machine owned by one reader model. The Command Facade ticks it and
/// forwards whatever raw bytes the transport delivers; the driver schedules
/// requests and turns recognised replies into [`BankEvent`]s. Talks to the
/// transport only through the [`Transport`] seam, so a driver's scheduling
/// and write-repeat logic can be unit-tested against a fake.
pub trait ReaderDriver {
    /// Name identifying the reader model this driver targets.
    fn model_name(&self) -> &'static str;

    /// Whether preconditions for talking to the reader are currently met
    /// (connected, correct baud rate). Reads are dropped and writes refused
    /// otherwise.
    fn loaded(&self, transport: &dyn Transport) -> bool;

    /// Perform one scheduling decision: request a single-tag session if no
    /// tag is current, or cycle through bank reads if one is.
    ///
    /// # Errors
    /// Returns an error if the transport write fails in a way that isn't a
    /// recoverable short write (e.g. the port has disconnected).
    fn tick(&mut self, transport: &mut dyn Transport, has_current_tag: bool) -> Result<(), RfidError>;

    /// Feed newly arrived bytes into the ingress buffer and run the decoder
    /// priority chain until nothing more matches. Returns every bank event
    /// recognised this batch, in arrival order, plus an error if the ingress
    /// buffer overflowed and had to be discarded.
    fn ingest(
        &mut self,
        bytes: &[u8],
        transport: &mut dyn Transport,
    ) -> (Vec<BankEvent>, Option<RfidError>);

    /// Write the EPC bank, repeating the frame per the reliability budget.
    ///
    /// # Errors
    /// Returns [`RfidError::EncodingError`] if `payload` exceeds the bank's
    /// size, or a transport error if the connection drops mid-write.
    fn write_epc(&mut self, transport: &mut dyn Transport, payload: &[u8]) -> Result<bool, RfidError>;

    /// Write the RFU (reserved/access) bank.
    ///
    /// # Errors
    /// See [`ReaderDriver::write_epc`].
    fn write_rfu(&mut self, transport: &mut dyn Transport, payload: &[u8]) -> Result<bool, RfidError>;

    /// Write the user bank, split across its four datagrams.
    ///
    /// # Errors
    /// See [`ReaderDriver::write_epc`].
    fn write_user(&mut self, transport: &mut dyn Transport, payload: &[u8]) -> Result<bool, RfidError>;

    /// Zero out the tag's banks.
    ///
    /// # Errors
    /// See [`ReaderDriver::write_epc`].
    fn erase(&mut self, transport: &mut dyn Transport) -> Result<bool, RfidError>;

    /// Kill the current tag. Not implemented by any driver model shipped
    /// here; always returns [`RfidError::Unsupported`].
    ///
    /// # Errors
    /// Always returns [`RfidError::Unsupported`].
    fn kill(&mut self) -> Result<(), RfidError>;

    /// Lock the current tag. Not implemented by any driver model shipped
    /// here; always returns [`RfidError::Unsupported`].
    ///
    /// # Errors
    /// Always returns [`RfidError::Unsupported`].
    fn lock(&mut self) -> Result<(), RfidError>;
}
