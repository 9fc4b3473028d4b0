//! Wire-level vocabulary for the SM-6210 UHF RFID reader's serial protocol.
//!
//! The frame shape is `[Header][Length][Opcode][payload...][Checksum]`, but
//! `Length` is not counted the same way in every frame: control frames
//! (`STOP_SEARCH`, `GET_SINGLE_PARAM`, the `READ_SINGLE_TAG` ack) count the
//! length byte, the opcode, and the body; bank-addressed frames (`READ_BANK`,
//! `WRITE_BANK`, the `READ_SINGLE_TAG` inventory reply) count only the body
//! after the opcode. See [`crate::codec::FrameFamily`] for the two conventions
//! and the scanner that turns buffered bytes into frames and back.

use std::fmt;
use thiserror::Error;

/// Start code of a host-to-reader request frame.
pub const HEADER_REQUEST: u8 = 0xA0;
/// Start code of a reader-to-host response frame.
pub const HEADER_RESPONSE: u8 = 0xE0;
/// Start code of a reader-to-host result frame.
pub const HEADER_RESULT: u8 = 0xE4;

/// Parameter value identifying the "add usercode" single-tag session request.
pub const ADD_USERCODE: u8 = 0x64;

/// Maximum length, in bytes, of an EPC or TID bank payload.
pub const EPC_LENGTH: usize = 12;
/// Maximum length, in bytes, of the reserved/access (RFU) bank payload.
pub const RFU_LENGTH: usize = 8;
/// Maximum length, in bytes, of the full user bank payload (all datagrams).
pub const USER_LENGTH: usize = 64;
/// Number of 16-byte sub-blocks ("datagrams") the user bank is split into.
pub const NUM_USER_DATAGRAMS: usize = 4;
/// Length, in bytes, of a single user bank datagram.
pub const USER_DATAGRAM_LENGTH: usize = USER_LENGTH / NUM_USER_DATAGRAMS;
/// Word stride between successive user bank datagram requests (8 words = 16 bytes).
pub const USER_WORD_STRIDE: u8 = 8;

/// Opcodes exchanged with the SM-6210 reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Stop/reset the current scan.
    StopSearch = 0xA8,
    /// Write a payload into a labelled bank.
    WriteBank = 0xAB,
    /// Acquire a single-tag session.
    GetSingleParam = 0x61,
    /// Single-tag inventory response.
    ReadSingleTag = 0x82,
    /// Read a labelled bank.
    ReadBank = 0x80,
}

impl Opcode {
    /// Attempt to recover an opcode from its raw wire value.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0xA8 => Some(Self::StopSearch),
            0xAB => Some(Self::WriteBank),
            0x61 => Some(Self::GetSingleParam),
            0x82 => Some(Self::ReadSingleTag),
            0x80 => Some(Self::ReadBank),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StopSearch => "STOP_SEARCH",
            Self::WriteBank => "WRITE_BANK",
            Self::GetSingleParam => "GET_SINGLE_PARAM",
            Self::ReadSingleTag => "READ_SINGLE_TAG",
            Self::ReadBank => "READ_BANK",
        };
        write!(f, "{name}")
    }
}

/// Two-byte memory bank label used by `READ_BANK`/`WRITE_BANK` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bank {
    /// Reserved/access password bank.
    Rfu,
    /// Electronic Product Code bank.
    Epc,
    /// Transponder ID bank.
    Tid,
    /// User data bank.
    Usr,
}

impl Bank {
    /// Encode the bank label as its two-byte wire representation.
    #[must_use]
    pub fn to_bytes(self) -> [u8; 2] {
        match self {
            Self::Rfu => [0x00, 0x00],
            Self::Epc => [0x00, 0x01],
            Self::Tid => [0x00, 0x02],
            Self::Usr => [0x00, 0x03],
        }
    }

    /// Decode a bank label from its two-byte wire representation.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 2]) -> Option<Self> {
        match bytes {
            [0x00, 0x00] => Some(Self::Rfu),
            [0x00, 0x01] => Some(Self::Epc),
            [0x00, 0x02] => Some(Self::Tid),
            [0x00, 0x03] => Some(Self::Usr),
            _ => None,
        }
    }

    /// Maximum payload length this bank accepts without padding.
    #[must_use]
    pub fn max_len(self) -> usize {
        match self {
            Self::Rfu => RFU_LENGTH,
            Self::Epc | Self::Tid => EPC_LENGTH,
            Self::Usr => USER_LENGTH,
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rfu => "RFU",
            Self::Epc => "EPC",
            Self::Tid => "TID",
            Self::Usr => "USR",
        };
        write!(f, "{name}")
    }
}

/// A decoded bank-addressed frame: the result of `READ_BANK`, a `READ_SINGLE_TAG`
/// response carrying an EPC, or the request side of `WRITE_BANK`/`READ_BANK`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankFrame {
    /// Opcode the frame was decoded under.
    pub opcode: Opcode,
    /// Memory bank the frame addresses.
    pub bank: Bank,
    /// Starting word address.
    pub word_start: u8,
    /// Word count requested or carried.
    pub word_count: u8,
    /// Bank payload bytes.
    pub payload: Vec<u8>,
}

impl BankFrame {
    /// The datagram index a USER bank frame's `word_start` refers to.
    #[must_use]
    pub fn datagram(&self) -> usize {
        (self.word_start / USER_WORD_STRIDE) as usize
    }
}

/// Errors raised while encoding or decoding wire frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A write/erase payload exceeded the bank's maximum size.
    #[error("payload of {len} bytes exceeds the {bank} bank's {max} byte limit")]
    PayloadTooLarge {
        /// Offending bank.
        bank: Bank,
        /// Payload length supplied.
        len: usize,
        /// Bank's maximum length.
        max: usize,
    },
}
