//! SM-6210 reader driver: the one concrete [`ReaderDriver`] this crate ships.

use super::{BankEvent, ReaderDriver};
use crate::config::{
    EPC_LENGTH, MANDATORY_BAUD_RATE, MAX_BUFFER_SIZE, NUM_USER_DATAGRAMS, RFU_LENGTH,
    SHIT_COUNT_RESET_THRESHOLD, USER_LENGTH, WRITE_REPEAT_COUNT,
};
use crate::error::RfidError;
use crate::transport::Transport;
use protocol::codec::{self, DecodeOutcome};
use protocol::types::{Bank, Opcode, ADD_USERCODE, USER_WORD_STRIDE};
use std::collections::VecDeque;
use strum::EnumIter;
use strum::IntoEnumIterator;

/// Cyclic bank-read schedule used while a tag is current: TID → RFU → USER → EPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
enum BankSelector {
    Tid,
    Rfu,
    Usr,
    Epc,
}

impl BankSelector {
    fn next(self) -> Self {
        let variants: Vec<Self> = Self::iter().collect();
        let idx = variants.iter().position(|v| *v == self).expect("self is a variant of its own enum");
        variants[(idx + 1) % variants.len()]
    }

    fn to_bank(self) -> Bank {
        match self {
            Self::Tid => Bank::Tid,
            Self::Rfu => Bank::Rfu,
            Self::Usr => Bank::Usr,
            Self::Epc => Bank::Epc,
        }
    }
}

/// Driver state for the SM-6210. Cooperative: `tick`/`ingest` perform at
/// most one transmit decision and one decode pass respectively, so the host
/// can drive it at whatever cadence it wants.
pub struct Sm6210Driver {
    buffer: VecDeque<u8>,
    bank_selector: BankSelector,
    shit_count: u32,
    user_word_cursor: u8,
}

impl Default for Sm6210Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Sm6210Driver {
    /// Build a fresh driver with an empty ingress buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::new(),
            bank_selector: BankSelector::Tid,
            shit_count: 0,
            user_word_cursor: 0,
        }
    }

    fn advance_user_cursor(&mut self) {
        self.user_word_cursor = if self.user_word_cursor >= 24 {
            0
        } else {
            self.user_word_cursor + USER_WORD_STRIDE
        };
    }

    /// Run each decoder once, in priority order, against the current
    /// buffer. Returns whether any of them consumed a frame.
    fn try_decoders(&mut self, transport: &mut dyn Transport, events: &mut Vec<BankEvent>) -> bool {
        if matches!(codec::decode_ack(&mut self.buffer), DecodeOutcome::Frame(())) {
            let ack = codec::encode_ack_single();
            if let Err(e) = transport.write(&ack) {
                log::warn!("failed to acknowledge single-tag session: {e}");
            }
            return true;
        }

        if let DecodeOutcome::Frame(frame) =
            codec::decode_bank_read(&mut self.buffer, Opcode::ReadSingleTag, Bank::Epc, false)
        {
            log::debug!("epc from single-tag read ({} bytes)", frame.payload.len());
            events.push(BankEvent::Epc(frame.payload));
            return true;
        }

        if let DecodeOutcome::Frame(frame) =
            codec::decode_bank_read(&mut self.buffer, Opcode::ReadBank, Bank::Epc, true)
        {
            log::debug!("epc from bank read ({} bytes)", frame.payload.len());
            events.push(BankEvent::Epc(frame.payload));
            return true;
        }

        if let DecodeOutcome::Frame(frame) =
            codec::decode_bank_read(&mut self.buffer, Opcode::ReadBank, Bank::Tid, true)
        {
            events.push(BankEvent::Tid(frame.payload));
            return true;
        }

        if let DecodeOutcome::Frame(frame) =
            codec::decode_bank_read(&mut self.buffer, Opcode::ReadBank, Bank::Rfu, true)
        {
            events.push(BankEvent::Rfu(frame.payload));
            return true;
        }

        if let DecodeOutcome::Frame(frame) =
            codec::decode_bank_read(&mut self.buffer, Opcode::ReadBank, Bank::Usr, true)
        {
            let datagram = frame.datagram();
            if datagram < NUM_USER_DATAGRAMS {
                events.push(BankEvent::User {
                    datagram,
                    payload: frame.payload,
                });
            } else {
                log::warn!("dropping user bank event with out-of-range datagram {datagram}");
            }
            return true;
        }

        if matches!(codec::decode_response_short(&mut self.buffer), DecodeOutcome::Frame(())) {
            return true;
        }

        if matches!(codec::decode_result_short(&mut self.buffer), DecodeOutcome::Frame(())) {
            return true;
        }

        false
    }

    fn write_bank_repeated(
        &mut self,
        transport: &mut dyn Transport,
        bank: Bank,
        word_start: u8,
        word_count: u8,
        payload: &[u8],
        declared_len: usize,
    ) -> Result<bool, RfidError> {
        if payload.len() > declared_len {
            return Err(RfidError::EncodingError(format!(
                "payload of {} bytes exceeds the {declared_len} byte limit for this write",
                payload.len()
            )));
        }
        let mut padded = payload.to_vec();
        padded.resize(declared_len, 0);
        let frame = codec::encode_write(bank, word_start, word_count, &padded)?;

        let mut all_ok = true;
        for _ in 0..WRITE_REPEAT_COUNT {
            match transport.write(&frame) {
                Ok(n) if n == frame.len() => {}
                Ok(_) | Err(RfidError::WriteShort { .. }) => all_ok = false,
                Err(e) => return Err(e),
            }
        }
        Ok(all_ok)
    }
}

impl ReaderDriver for Sm6210Driver {
    fn model_name(&self) -> &'static str {
        "SM-6210"
    }

    fn loaded(&self, transport: &dyn Transport) -> bool {
        transport.is_connected() && transport.baud_rate() == MANDATORY_BAUD_RATE
    }

    fn tick(&mut self, transport: &mut dyn Transport, has_current_tag: bool) -> Result<(), RfidError> {
        if !self.loaded(transport) {
            return Ok(());
        }

        if !has_current_tag {
            if self.shit_count > SHIT_COUNT_RESET_THRESHOLD {
                log::debug!("resetting scan after {} unproductive ticks", self.shit_count);
                let frame = codec::encode_stop();
                transport.write(&frame)?;
                self.shit_count = 0;
            } else {
                let frame = codec::encode_get_single_param(ADD_USERCODE);
                transport.write(&frame)?;
            }
            return Ok(());
        }

        match self.bank_selector {
            BankSelector::Usr => {
                let frame = codec::encode_read(Bank::Usr, self.user_word_cursor, USER_WORD_STRIDE);
                transport.write(&frame)?;
                self.advance_user_cursor();
            }
            other => {
                let bank = other.to_bank();
                let word_count = match bank {
                    Bank::Epc | Bank::Tid => 6,
                    Bank::Rfu => 4,
                    Bank::Usr => unreachable!("handled above"),
                };
                let frame = codec::encode_read(bank, 0, word_count);
                transport.write(&frame)?;
            }
        }
        self.bank_selector = self.bank_selector.next();
        Ok(())
    }

    fn ingest(
        &mut self,
        bytes: &[u8],
        transport: &mut dyn Transport,
    ) -> (Vec<BankEvent>, Option<RfidError>) {
        if !self.loaded(transport) {
            return (Vec::new(), None);
        }
        self.buffer.extend(bytes.iter().copied());

        let mut events = Vec::new();
        let mut any_matched = false;
        while self.try_decoders(transport, &mut events) {
            any_matched = true;
        }

        if any_matched {
            self.shit_count = 0;
        } else {
            self.shit_count += 1;
        }

        let mut overflow = None;
        if self.buffer.len() > MAX_BUFFER_SIZE {
            log::warn!("ingress buffer exceeded {MAX_BUFFER_SIZE} bytes, discarding");
            self.buffer.clear();
            overflow = Some(RfidError::FrameTooLarge);
        }

        (events, overflow)
    }

    fn write_epc(&mut self, transport: &mut dyn Transport, payload: &[u8]) -> Result<bool, RfidError> {
        self.write_bank_repeated(transport, Bank::Epc, 0, 6, payload, EPC_LENGTH)
    }

    fn write_rfu(&mut self, transport: &mut dyn Transport, payload: &[u8]) -> Result<bool, RfidError> {
        self.write_bank_repeated(transport, Bank::Rfu, 0, 4, payload, RFU_LENGTH)
    }

    fn write_user(&mut self, transport: &mut dyn Transport, payload: &[u8]) -> Result<bool, RfidError> {
        if payload.len() > USER_LENGTH {
            return Err(RfidError::EncodingError(format!(
                "user payload of {} bytes exceeds the {USER_LENGTH} byte bank",
                payload.len()
            )));
        }
        let mut padded = payload.to_vec();
        padded.resize(USER_LENGTH, 0);

        let mut all_ok = true;
        for datagram in 0..NUM_USER_DATAGRAMS {
            let word_start = u8::try_from(datagram * usize::from(USER_WORD_STRIDE)).expect("fits in a byte");
            let chunk = &padded[datagram * 16..(datagram + 1) * 16];
            if !self.write_bank_repeated(transport, Bank::Usr, word_start, USER_WORD_STRIDE, chunk, 16)? {
                all_ok = false;
            }
        }
        Ok(all_ok)
    }

    fn erase(&mut self, transport: &mut dyn Transport) -> Result<bool, RfidError> {
        let epc_zero = vec![0u8; EPC_LENGTH];
        // Sic: the source writes 13 zero bytes to the 64-byte USER bank,
        // leaving most of it untouched. Reproduced verbatim, not "fixed".
        let user_zero = vec![0u8; 13];
        let rfu_zero = vec![0u8; RFU_LENGTH];

        let epc_ok = self.write_bank_repeated(transport, Bank::Epc, 0, 6, &epc_zero, EPC_LENGTH)?;
        let user_ok = self.write_bank_repeated(transport, Bank::Usr, 0, 7, &user_zero, 13)?;
        let rfu_ok = self.write_bank_repeated(transport, Bank::Rfu, 0, 4, &rfu_zero, RFU_LENGTH)?;
        Ok(epc_ok && user_ok && rfu_ok)
    }

    fn kill(&mut self) -> Result<(), RfidError> {
        Err(RfidError::Unsupported("kill is not implemented by the SM-6210 driver"))
    }

    fn lock(&mut self) -> Result<(), RfidError> {
        Err(RfidError::Unsupported("lock is not implemented by the SM-6210 driver"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FakeTransport;

    fn checksum_ok(bytes: &[u8]) -> bool {
        bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)) == 0
    }

    fn frame(bytes: &[u8]) -> VecDeque<u8> {
        bytes.iter().copied().collect()
    }

    #[test]
    fn bank_selector_cycles_tid_rfu_usr_epc() {
        let mut s = BankSelector::Tid;
        let order = [BankSelector::Rfu, BankSelector::Usr, BankSelector::Epc, BankSelector::Tid];
        for expected in order {
            s = s.next();
            assert_eq!(s, expected);
        }
    }

    #[test]
    fn ack_handshake_empties_buffer_and_replies() {
        let mut driver = Sm6210Driver::new();
        let mut transport = FakeTransport::new(false, 0);
        let body = [0x00u8, 0x00, 0x64, 0x00];
        let mut frame_bytes = vec![0xE0u8, 0x06, 0x61];
        frame_bytes.extend_from_slice(&body);
        let chk = (!frame_bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))).wrapping_add(1);
        frame_bytes.push(chk);
        assert!(checksum_ok(&frame_bytes));

        driver.buffer = frame(&frame_bytes);
        let mut events = Vec::new();
        // loaded() requires a connected transport; directly exercise the
        // decode step instead of going through ingest()'s loaded() gate.
        assert!(driver.try_decoders(&mut transport, &mut events));
        assert!(driver.buffer.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn user_word_cursor_wraps_after_24() {
        let mut driver = Sm6210Driver::new();
        assert_eq!(driver.user_word_cursor, 0);
        driver.advance_user_cursor();
        assert_eq!(driver.user_word_cursor, 8);
        driver.advance_user_cursor();
        assert_eq!(driver.user_word_cursor, 16);
        driver.advance_user_cursor();
        assert_eq!(driver.user_word_cursor, 24);
        driver.advance_user_cursor();
        assert_eq!(driver.user_word_cursor, 0);
    }

    #[test]
    fn out_of_range_user_datagram_is_dropped() {
        let mut driver = Sm6210Driver::new();
        let mut transport = FakeTransport::new(false, 0);
        // word_start = 40 -> datagram 5, outside [0, NUM_USER_DATAGRAMS).
        let body = [0x00u8, 0x03, 40, 8, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
        // Bank family: Length counts only the body after the opcode.
        let mut frame_bytes = vec![0xE0u8, u8::try_from(body.len()).unwrap(), 0x80];
        frame_bytes.extend_from_slice(&body);
        let chk = (!frame_bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))).wrapping_add(1);
        frame_bytes.push(chk);

        driver.buffer = frame(&frame_bytes);
        let mut events = Vec::new();
        assert!(driver.try_decoders(&mut transport, &mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn write_epc_repeats_ten_times_with_zero_padding() {
        let mut driver = Sm6210Driver::new();
        let mut transport = FakeTransport::new(true, MANDATORY_BAUD_RATE);

        let ok = driver.write_epc(&mut transport, &[0x01, 0x02]).unwrap();

        assert!(ok);
        assert_eq!(transport.sent.len(), WRITE_REPEAT_COUNT);
        for frame_bytes in &transport.sent {
            assert!(checksum_ok(frame_bytes));
            let payload = &frame_bytes[frame_bytes.len() - 1 - EPC_LENGTH..frame_bytes.len() - 1];
            let mut expected = vec![0x01, 0x02];
            expected.resize(EPC_LENGTH, 0);
            assert_eq!(payload, expected.as_slice());
        }
    }
}
