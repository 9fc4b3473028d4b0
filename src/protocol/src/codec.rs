//! Encoder/decoder for SM-6210 wire frames.
//!
//! The codec itself is stateless: it borrows the driver's ingress buffer
//! (a [`VecDeque<u8>`]) for the duration of a single decode attempt and only
//! mutates it (draining consumed bytes from the front) when a frame is
//! actually recognised. A `NoMatch` or `NeedMore` outcome never touches the
//! buffer, so callers can try several decoders against the same bytes in
//! priority order.

use crate::types::{
    Bank, BankFrame, Opcode, ProtocolError, ADD_USERCODE, HEADER_REQUEST, HEADER_RESPONSE,
    HEADER_RESULT,
};
use std::collections::VecDeque;

/// Result of attempting to decode one frame kind out of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome<T> {
    /// A complete, matching frame was found and consumed.
    Frame(T),
    /// A candidate frame is still arriving; try again once more bytes land.
    NeedMore,
    /// Either no frame of the expected header is present yet, or one is
    /// present but doesn't match this decoder's opcode/bank/checksum
    /// expectations. The buffer is left untouched either way.
    NoMatch,
}

/// Two's-complement checksum: negated sum of bytes, modulo 256.
#[must_use]
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    (!sum).wrapping_add(1)
}

/// Verify that `bytes` (frame body *and* trailing checksum byte) sum to zero
/// modulo 256.
#[must_use]
pub fn verify_checksum(framed_bytes_with_checksum: &[u8]) -> bool {
    framed_bytes_with_checksum
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b))
        == 0
}

/// The two incompatible `Length`-byte conventions the reader uses.
///
/// Control frames declare a `Length` that counts the length byte itself, the
/// opcode, and the body (so `total = Length + 2`). Bank-addressed frames
/// declare a `Length` that counts only the body after the opcode (so
/// `total = Length + 4`). Mixing the two up silently desyncs the frame
/// scanner: a control frame read as a bank frame looks two bytes short, and a
/// bank frame read as a control frame looks two bytes long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFamily {
    /// `STOP_SEARCH`, `GET_SINGLE_PARAM`, and the `READ_SINGLE_TAG` ack.
    Control,
    /// `READ_BANK`/`WRITE_BANK`, and the `READ_SINGLE_TAG` inventory reply.
    Bank,
}

impl FrameFamily {
    fn length_byte(self, body_len: usize) -> u8 {
        let n = match self {
            Self::Control => 2 + body_len,
            Self::Bank => body_len,
        };
        u8::try_from(n).unwrap_or(u8::MAX)
    }

    /// `total_len = declared_length + offset` gives the full frame size
    /// (header through checksum, inclusive) for this family.
    fn offset(self) -> usize {
        match self {
            Self::Control => 2,
            Self::Bank => 4,
        }
    }
}

fn build_frame(header: u8, opcode: u8, body: &[u8], family: FrameFamily) -> Vec<u8> {
    let length = family.length_byte(body.len());
    let mut out = Vec::with_capacity(3 + body.len() + 1);
    out.push(header);
    out.push(length);
    out.push(opcode);
    out.extend_from_slice(body);
    let chk = checksum(&out);
    out.push(chk);
    out
}

/// Build a `STOP_SEARCH` request frame.
#[must_use]
pub fn encode_stop() -> Vec<u8> {
    build_frame(HEADER_REQUEST, Opcode::StopSearch as u8, &[], FrameFamily::Control)
}

/// Build a `GET_SINGLE_PARAM` request frame carrying the given parameter
/// (the driver only ever uses [`ADD_USERCODE`]).
#[must_use]
pub fn encode_get_single_param(param: u8) -> Vec<u8> {
    build_frame(
        HEADER_REQUEST,
        Opcode::GetSingleParam as u8,
        &[param],
        FrameFamily::Control,
    )
}

/// Build the fixed acknowledgement frame sent in reply to a single-tag
/// session offer.
#[must_use]
pub fn encode_ack_single() -> Vec<u8> {
    build_frame(
        HEADER_REQUEST,
        Opcode::ReadSingleTag as u8,
        &[0x00],
        FrameFamily::Control,
    )
}

/// Build a `READ_BANK` request frame.
#[must_use]
pub fn encode_read(bank: Bank, word_start: u8, word_count: u8) -> Vec<u8> {
    let bank_bytes = bank.to_bytes();
    let body = [bank_bytes[0], bank_bytes[1], word_start, word_count];
    build_frame(HEADER_REQUEST, Opcode::ReadBank as u8, &body, FrameFamily::Bank)
}

/// Build a `WRITE_BANK` request frame.
///
/// # Errors
/// Returns [`ProtocolError::PayloadTooLarge`] if `payload` exceeds the
/// addressed bank's maximum length.
pub fn encode_write(
    bank: Bank,
    word_start: u8,
    word_count: u8,
    payload: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    if payload.len() > bank.max_len() {
        return Err(ProtocolError::PayloadTooLarge {
            bank,
            len: payload.len(),
            max: bank.max_len(),
        });
    }
    let bank_bytes = bank.to_bytes();
    let mut body = Vec::with_capacity(4 + payload.len());
    body.extend_from_slice(&bank_bytes);
    body.push(word_start);
    body.push(word_count);
    body.extend_from_slice(payload);
    Ok(build_frame(
        HEADER_REQUEST,
        Opcode::WriteBank as u8,
        &body,
        FrameFamily::Bank,
    ))
}

/// Locate the earliest occurrence of `header` in `buf` that is followed by a
/// complete frame body (length byte present and enough trailing bytes
/// buffered, including the checksum byte), interpreting the length byte
/// according to `family`.
///
/// Returns `(start_index, total_len)` on success. Returns `None` if no such
/// complete frame exists yet — either there's no occurrence of `header` at
/// all, or the earliest one hasn't finished arriving.
fn find_frame(buf: &VecDeque<u8>, header: u8, family: FrameFamily) -> Option<(usize, usize)> {
    let len = buf.len();
    for start in 0..len {
        if buf[start] != header {
            continue;
        }
        if start + 1 >= len {
            return None;
        }
        let length = buf[start + 1];
        let total_len = length as usize + family.offset();
        if start + total_len > len {
            return None;
        }
        return Some((start, total_len));
    }
    None
}

fn extract(buf: &VecDeque<u8>, start: usize, total_len: usize) -> Vec<u8> {
    buf.iter().skip(start).take(total_len).copied().collect()
}

/// Decode the single-tag session offer (`GET_SINGLE_PARAM` ack, param
/// [`ADD_USERCODE`]) the reader sends to hand off a tag to the host.
pub fn decode_ack(buf: &mut VecDeque<u8>) -> DecodeOutcome<()> {
    match find_frame(buf, HEADER_RESPONSE, FrameFamily::Control) {
        None => DecodeOutcome::NeedMore,
        Some((start, total_len)) => {
            // A stray header byte paired with a small, coincidental length
            // byte can produce a `total_len` too short to hold an opcode and
            // the 4-byte ack body; bail out to NoMatch instead of indexing
            // or slicing past the end of `bytes`.
            if total_len < 4 {
                return DecodeOutcome::NoMatch;
            }
            let bytes = extract(buf, start, total_len);
            if bytes[2] != Opcode::GetSingleParam as u8 {
                return DecodeOutcome::NoMatch;
            }
            let body = &bytes[3..total_len - 1];
            if body.len() != 4 || body[2] != ADD_USERCODE {
                return DecodeOutcome::NoMatch;
            }
            if !verify_checksum(&bytes) {
                return DecodeOutcome::NoMatch;
            }
            buf.drain(..start + total_len);
            DecodeOutcome::Frame(())
        }
    }
}

/// Decode a bank-addressed response: `READ_BANK` replies and the
/// `READ_SINGLE_TAG` reply that carries an EPC. `verify` controls whether the
/// trailing checksum is validated (the single-tag EPC reply disables it per
/// the reader's behaviour).
pub fn decode_bank_read(
    buf: &mut VecDeque<u8>,
    opcode: Opcode,
    bank: Bank,
    verify: bool,
) -> DecodeOutcome<BankFrame> {
    match find_frame(buf, HEADER_RESPONSE, FrameFamily::Bank) {
        None => DecodeOutcome::NeedMore,
        Some((start, total_len)) => {
            let bytes = extract(buf, start, total_len);
            if bytes[2] != opcode as u8 {
                return DecodeOutcome::NoMatch;
            }
            let body = &bytes[3..total_len - 1];
            if body.len() < 4 {
                return DecodeOutcome::NoMatch;
            }
            let Some(frame_bank) = Bank::from_bytes([body[0], body[1]]) else {
                return DecodeOutcome::NoMatch;
            };
            if frame_bank != bank {
                return DecodeOutcome::NoMatch;
            }
            if verify && !verify_checksum(&bytes) {
                return DecodeOutcome::NoMatch;
            }
            let word_start = body[2];
            let word_count = body[3];
            let payload = body[4..].to_vec();
            buf.drain(..start + total_len);
            DecodeOutcome::Frame(BankFrame {
                opcode,
                bank: frame_bank,
                word_start,
                word_count,
                payload,
            })
        }
    }
}

/// Drop any `0xE4`-led result frame, regardless of its declared length. These
/// carry no information the driver acts on, and are never bank-addressed, so
/// their `Length` byte is read with the control-frame convention.
pub fn decode_result_short(buf: &mut VecDeque<u8>) -> DecodeOutcome<()> {
    match find_frame(buf, HEADER_RESULT, FrameFamily::Control) {
        None => DecodeOutcome::NeedMore,
        Some((start, total_len)) => {
            buf.drain(..start + total_len);
            DecodeOutcome::Frame(())
        }
    }
}

/// Drop a short, unrecognised `0xE0`-led status response (declared length
/// under 6 bytes, control-frame convention — anything bank-addressed is
/// caught by [`decode_bank_read`] first).
pub fn decode_response_short(buf: &mut VecDeque<u8>) -> DecodeOutcome<()> {
    match find_frame(buf, HEADER_RESPONSE, FrameFamily::Control) {
        None => DecodeOutcome::NeedMore,
        Some((start, total_len)) => {
            let length_byte = buf[start + 1];
            if length_byte >= 6 {
                return DecodeOutcome::NoMatch;
            }
            buf.drain(..start + total_len);
            DecodeOutcome::Frame(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bank;

    fn to_buf(bytes: &[u8]) -> VecDeque<u8> {
        bytes.iter().copied().collect()
    }

    #[test]
    fn checksum_makes_frame_sum_to_zero() {
        let frame = encode_stop();
        let sum = frame.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        assert_eq!(sum, 0);
    }

    #[test]
    fn encode_read_round_trips_through_decode_bank_read() {
        let frame = encode_read(Bank::Epc, 0, 6);
        // Flip the request into a "response" by swapping the header, the way
        // the reader would echo it back with payload appended.
        let mut response = frame.clone();
        response[0] = HEADER_RESPONSE;
        response[2] = Opcode::ReadBank as u8;
        let mut payload = vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
        // Rebuild with payload using the encoder directly instead of patching
        // the raw bytes, which is simpler and exercises encode_write's sibling
        // path through decode_bank_read.
        let body_without_checksum = &response[..response.len() - 1];
        let mut rebuilt = body_without_checksum[..3].to_vec();
        rebuilt.extend_from_slice(&Bank::Epc.to_bytes());
        rebuilt.push(0);
        rebuilt.push(6);
        rebuilt.append(&mut payload);
        // Bank family: Length counts only the body after the opcode.
        rebuilt[1] = u8::try_from(rebuilt.len() - 3).unwrap();
        let chk = checksum(&rebuilt);
        rebuilt.push(chk);

        let mut buf = to_buf(&rebuilt);
        match decode_bank_read(&mut buf, Opcode::ReadBank, Bank::Epc, true) {
            DecodeOutcome::Frame(f) => {
                assert_eq!(f.bank, Bank::Epc);
                assert_eq!(f.word_start, 0);
                assert_eq!(f.word_count, 6);
                assert_eq!(f.payload, vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
            }
            other => panic!("expected Frame, got {other:?}"),
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn leading_garbage_is_dropped_with_the_frame() {
        let mut bytes = vec![0xFF, 0xFF, 0xFF];
        bytes.extend(build_frame(
            HEADER_RESPONSE,
            Opcode::ReadBank as u8,
            &{
                let mut b = Bank::Tid.to_bytes().to_vec();
                b.push(0);
                b.push(6);
                b.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
                b
            },
            FrameFamily::Bank,
        ));
        let trailing_garbage = [0x11, 0x22];
        bytes.extend_from_slice(&trailing_garbage);

        let mut buf = to_buf(&bytes);
        match decode_bank_read(&mut buf, Opcode::ReadBank, Bank::Tid, true) {
            DecodeOutcome::Frame(f) => assert_eq!(f.payload, vec![1, 2, 3, 4, 5, 6]),
            other => panic!("expected Frame, got {other:?}"),
        }
        assert_eq!(buf, to_buf(&trailing_garbage));
    }

    #[test]
    fn bad_checksum_is_not_consumed() {
        let mut frame = encode_read(Bank::Rfu, 0, 4);
        let last = frame.len() - 1;
        frame[last] ^= 0xFF; // corrupt the checksum
        let mut response = frame;
        response[0] = HEADER_RESPONSE;

        let mut buf = to_buf(&response);
        let before = buf.clone();
        assert_eq!(
            decode_bank_read(&mut buf, Opcode::ReadBank, Bank::Rfu, true),
            DecodeOutcome::NoMatch
        );
        assert_eq!(buf, before);
    }

    #[test]
    fn incomplete_frame_reports_need_more() {
        let frame = encode_stop();
        let mut buf = to_buf(&frame[..frame.len() - 1]);
        assert_eq!(decode_result_short(&mut buf), DecodeOutcome::NeedMore);
    }

    #[test]
    fn short_response_is_dropped() {
        let body = vec![Opcode::GetSingleParam as u8, 0x00];
        let mut frame = vec![HEADER_RESPONSE, u8::try_from(body.len() + 1).unwrap()];
        frame.extend_from_slice(&body);
        frame.push(checksum(&frame));

        let mut buf = to_buf(&frame);
        assert_eq!(decode_response_short(&mut buf), DecodeOutcome::Frame(()));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_ack_does_not_panic_on_short_noise_frame() {
        // [0xE0, 0x00] looks like a response header with a zero length byte;
        // under the control-frame offset that's a 2-byte "frame", too short
        // to hold an opcode byte let alone the 4-byte ack body.
        let mut buf = to_buf(&[0xE0, 0x00]);
        assert_eq!(decode_ack(&mut buf), DecodeOutcome::NoMatch);

        // length=1 -> total_len=3, long enough for bytes[2] but too short for
        // the subsequent `bytes[3..total_len - 1]` slice.
        let mut buf = to_buf(&[0xE0, 0x01, Opcode::GetSingleParam as u8]);
        assert_eq!(decode_ack(&mut buf), DecodeOutcome::NoMatch);
    }

    #[test]
    fn encode_write_rejects_oversized_payload() {
        let payload = vec![0u8; 100];
        let err = encode_write(Bank::Rfu, 0, 50, &payload).unwrap_err();
        assert!(matches!(err, ProtocolError::PayloadTooLarge { .. }));
    }
}
