//! Persisted record codec.
//!
//! The settings survive power cycles as one tiny record:
//!
//! ```text
//! <mode id, decimal>\n<payload bytes, verbatim>
//! ```
//!
//! The payload is the remainder of the record after the first line break,
//! so embedded newlines are preserved as-is and never corrupt the mode
//! line. There is no trailing terminator and no escaping.

use crate::state::{DeviceState, Mode, Payload, PAYLOAD_CAP};

/// Largest record [`encode`] can produce ("7" + newline + payload).
pub const RECORD_CAP: usize = PAYLOAD_CAP + 4;

/// Error type for record encoding/decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Mode line is empty, non-numeric, or names no catalog entry.
    BadMode,
    /// Payload bytes are not valid UTF-8.
    BadPayload,
    /// Payload exceeds [`PAYLOAD_CAP`].
    PayloadTooLong,
    /// Output buffer cannot hold the encoded record.
    BufferTooSmall,
}

/// Encode `state` into `buf`, returning the number of bytes written.
///
/// The whole record is produced in one pass; callers overwrite any prior
/// record in full rather than appending.
pub fn encode(state: &DeviceState, buf: &mut [u8]) -> Result<usize, RecordError> {
    let payload = state.payload.as_bytes();

    let mut pos = write_decimal(state.mode.id(), buf).ok_or(RecordError::BufferTooSmall)?;
    if buf.len() < pos + 1 + payload.len() {
        return Err(RecordError::BufferTooSmall);
    }
    buf[pos] = b'\n';
    pos += 1;
    buf[pos..pos + payload.len()].copy_from_slice(payload);
    Ok(pos + payload.len())
}

/// Decode a record.
///
/// A record with no line break at all is a bare mode line with an empty
/// payload (a truncated write can produce one; it still names a valid
/// mode, so it is not treated as corruption).
pub fn decode(bytes: &[u8]) -> Result<DeviceState, RecordError> {
    let (mode_line, payload_bytes) = match bytes.iter().position(|&b| b == b'\n') {
        Some(split) => (&bytes[..split], &bytes[split + 1..]),
        None => (bytes, &[][..]),
    };

    let mode = parse_mode_id(mode_line).ok_or(RecordError::BadMode)?;

    if payload_bytes.len() > PAYLOAD_CAP {
        return Err(RecordError::PayloadTooLong);
    }
    let payload_str = core::str::from_utf8(payload_bytes).map_err(|_| RecordError::BadPayload)?;
    let payload = Payload::try_from(payload_str).map_err(|_| RecordError::PayloadTooLong)?;

    Ok(DeviceState { mode, payload })
}

/// Parse a decimal mode identifier: strictly digits naming a catalog entry.
///
/// Shared with the configuration protocol's `mode` parameter, which uses
/// the same wire identifiers.
pub(crate) fn parse_mode_id(digits: &[u8]) -> Option<Mode> {
    if digits.is_empty() || digits.len() > 3 {
        return None;
    }
    let mut value: u16 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + u16::from(b - b'0');
    }
    u8::try_from(value).ok().and_then(Mode::from_id)
}

/// Write `value` as decimal digits, returning the count, or `None` if the
/// buffer is too small.
fn write_decimal(value: u8, buf: &mut [u8]) -> Option<usize> {
    let mut temp = [0u8; 3];
    let mut n = value;
    let mut len = 0;
    loop {
        temp[len] = b'0' + n % 10;
        n /= 10;
        len += 1;
        if n == 0 {
            break;
        }
    }
    if buf.len() < len {
        return None;
    }
    for i in 0..len {
        buf[i] = temp[len - 1 - i];
    }
    Some(len)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    fn state(mode: Mode, payload: &str) -> DeviceState {
        DeviceState {
            mode,
            payload: Payload::try_from(payload).unwrap(),
        }
    }

    fn round_trip(s: &DeviceState) -> DeviceState {
        let mut buf = [0u8; RECORD_CAP];
        let len = encode(s, &mut buf).unwrap();
        decode(&buf[..len]).unwrap()
    }

    #[test]
    fn test_encode_layout() {
        let mut buf = [0u8; RECORD_CAP];
        let len = encode(&state(Mode::LockCombo, "Hello Budget-G"), &mut buf).unwrap();
        assert_eq!(&buf[..len], b"3\nHello Budget-G");
    }

    #[test]
    fn test_round_trip_all_modes() {
        for mode in Mode::ALL {
            let s = state(mode, "payload");
            assert_eq!(round_trip(&s), s);
        }
    }

    #[test]
    fn test_round_trip_empty_payload() {
        let s = state(Mode::Enter, "");
        let mut buf = [0u8; RECORD_CAP];
        let len = encode(&s, &mut buf).unwrap();
        assert_eq!(&buf[..len], b"4\n");
        assert_eq!(decode(&buf[..len]).unwrap(), s);
    }

    #[test]
    fn test_round_trip_multiline_payload() {
        let s = state(Mode::TypeText, "line one\nline two\n\nlast");
        assert_eq!(round_trip(&s), s);
    }

    #[test]
    fn test_decode_out_of_range_mode_is_bad() {
        assert_eq!(decode(b"99\nwhatever"), Err(RecordError::BadMode));
        assert_eq!(decode(b"8\n"), Err(RecordError::BadMode));
        assert_eq!(decode(b"256\n"), Err(RecordError::BadMode));
    }

    #[test]
    fn test_decode_non_numeric_mode_is_bad() {
        assert_eq!(decode(b"banana\ntext"), Err(RecordError::BadMode));
        assert_eq!(decode(b"-1\ntext"), Err(RecordError::BadMode));
        assert_eq!(decode(b"1 \ntext"), Err(RecordError::BadMode));
        assert_eq!(decode(b""), Err(RecordError::BadMode));
        assert_eq!(decode(b"\npayload"), Err(RecordError::BadMode));
    }

    #[test]
    fn test_decode_without_newline_has_empty_payload() {
        let s = decode(b"5").unwrap();
        assert_eq!(s.mode, Mode::Tab);
        assert_eq!(s.payload.as_str(), "");
    }

    #[test]
    fn test_decode_invalid_utf8_payload() {
        assert_eq!(decode(b"0\n\xff\xfe"), Err(RecordError::BadPayload));
    }

    #[test]
    fn test_decode_oversized_payload() {
        let mut record = std::vec::Vec::from(&b"0\n"[..]);
        record.extend(core::iter::repeat(b'a').take(PAYLOAD_CAP + 1));
        assert_eq!(decode(&record), Err(RecordError::PayloadTooLong));
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let s = state(Mode::TypeText, "hello");
        let mut buf = [0u8; 4];
        assert_eq!(encode(&s, &mut buf), Err(RecordError::BufferTooSmall));
    }
}
