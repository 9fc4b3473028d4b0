//! Wire-level framing for the SM-6210 UHF RFID reader's serial protocol.
//!
//! This crate is transport-agnostic: it only knows how to turn requests into
//! bytes and bytes back into frames. Pairing it with an actual serial port
//! and driving the reader's state machine is the `api` crate's job.

pub mod codec;
pub mod types;
