// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The GEP binary request/response codec.
//!
//! A request is one message: an opcode byte, usually a register id, and for
//! writes the value bytes. A response is a status byte followed by the
//! payload (only on success). Numbers travel as a variable-length signed
//! encoding described at [`encode_number`].

use gep_core::error::ProtocolError;
use gep_core::types::RegisterId;

// =============================================================================
// Opcodes and status codes
// =============================================================================

/// Request: read the value of an integer register.
pub const READ_INT_REGISTER: u8 = 0x01;

/// Request: write a value to an integer register.
pub const WRITE_INT_REGISTER: u8 = 0x02;

/// Request: read the value of a binary register.
pub const READ_BIN_REGISTER: u8 = 0x03;

/// Request: write a value to a binary register.
pub const WRITE_BIN_REGISTER: u8 = 0x04;

/// Request: retrieve a change hint, optionally confirming a previous hint.
pub const GET_CHANGE_HINT: u8 = 0x05;

/// Response status: unknown or failed request.
pub const STATUS_FAILED: u8 = 0x00;

/// Response status: request completed.
pub const STATUS_OK: u8 = 0x01;

/// Response status: write refused, register is not writable.
pub const STATUS_UNWRITABLE: u8 = 0x02;

/// Request tags cycle within `0..TAG_MODULUS`.
pub const TAG_MODULUS: u16 = 1000;

// =============================================================================
// Variable-length signed integers
// =============================================================================

/// Encodes a numeric value as a variable-length byte sequence.
///
/// The first byte carries the sign (bit 6) and the most significant six
/// magnitude bits; every following byte carries seven magnitude bits. Bit 7
/// flags that another byte follows, so the terminating byte is the only one
/// with bit 7 clear. `i32::MIN` has no positive magnitude counterpart and is
/// encoded as the single byte `0x40` (sign set, magnitude zero, terminator).
///
/// The encoding of any `i32` fits in five bytes.
pub fn encode_number(value: i32) -> Vec<u8> {
    if value == i32::MIN {
        return vec![0x40];
    }

    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();

    // Base-128 digits, least significant first; the final (most significant)
    // digit stays below 64 to leave room for the sign bit.
    let mut digits = [0u32; 5];
    let mut length = 0;
    while magnitude > 63 {
        digits[length] = magnitude % 128;
        magnitude /= 128;
        length += 1;
    }
    digits[length] = magnitude;
    length += 1;

    if negative {
        digits[length - 1] |= 0x40;
    }

    let mut encoded = Vec::with_capacity(length);
    for digit in digits[1..length].iter().rev() {
        encoded.push((digit | 0x80) as u8);
    }
    encoded.push(digits[0] as u8);

    encoded
}

/// Decodes a variable-length number starting at `offset` in `data`.
///
/// Fails with an invalid-message error when the buffer ends before the
/// terminating byte or when the encoded magnitude does not fit an `i32`.
pub fn decode_number(data: &[u8], offset: usize) -> Result<i32, ProtocolError> {
    let mut index = offset;
    let first = next_byte(data, index)?;

    let negative = first & 0x40 != 0;
    let mut more = first & 0x80 != 0;
    let mut result = i64::from(first & 0x3F);

    if !more && negative && result == 0 {
        return Ok(i32::MIN);
    }

    while more {
        index += 1;
        let byte = next_byte(data, index)?;
        result = result * 128 + i64::from(byte & 0x7F);
        if result > i32::MAX as i64 {
            return Err(ProtocolError::invalid_message(
                "encoded number exceeds the 32-bit range",
            ));
        }
        more = byte & 0x80 != 0;
    }

    Ok(if negative { -result as i32 } else { result as i32 })
}

fn next_byte(data: &[u8], index: usize) -> Result<u8, ProtocolError> {
    data.get(index).copied().ok_or_else(|| {
        ProtocolError::invalid_message("encoded number runs past the end of the message")
    })
}

// =============================================================================
// Request construction
// =============================================================================

/// Appends the wire form of a register id: one byte below 128, otherwise two
/// bytes with the high bit set on the first.
fn push_register_id(request: &mut Vec<u8>, register: RegisterId) {
    let id = register.value();
    if id < 128 {
        request.push(id as u8);
    } else {
        request.push(((id >> 8) as u8) | 0x80);
        request.push((id & 0xFF) as u8);
    }
}

/// Builds a read request for an integer register.
pub fn read_integer_request(register: RegisterId) -> Vec<u8> {
    let mut request = vec![READ_INT_REGISTER];
    push_register_id(&mut request, register);
    request
}

/// Builds a write request for an integer register.
pub fn write_integer_request(register: RegisterId, value: i32) -> Vec<u8> {
    let mut request = vec![WRITE_INT_REGISTER];
    push_register_id(&mut request, register);
    request.extend_from_slice(&encode_number(value));
    request
}

/// Builds a read request for a binary register.
pub fn read_binary_request(register: RegisterId) -> Vec<u8> {
    let mut request = vec![READ_BIN_REGISTER];
    push_register_id(&mut request, register);
    request
}

/// Builds a write request for a binary register.
pub fn write_binary_request(register: RegisterId, value: &[u8]) -> Vec<u8> {
    let mut request = Vec::with_capacity(3 + value.len());
    request.push(WRITE_BIN_REGISTER);
    push_register_id(&mut request, register);
    request.extend_from_slice(value);
    request
}

/// Builds a change-hint request, optionally confirming a consumed hint so the
/// device can surface the next one.
pub fn change_hint_request(confirmed: Option<RegisterId>) -> Vec<u8> {
    let mut request = vec![GET_CHANGE_HINT];
    if let Some(register) = confirmed {
        push_register_id(&mut request, register);
    }
    request
}

// =============================================================================
// Response handling
// =============================================================================

/// Checks the status byte of a response and returns the payload on success.
pub fn ok_payload(response: &[u8]) -> Result<&[u8], ProtocolError> {
    let status = response
        .first()
        .copied()
        .ok_or(ProtocolError::TruncatedResponse {
            expected: 1,
            actual: 0,
        })?;

    match status {
        STATUS_OK => Ok(&response[1..]),
        STATUS_UNWRITABLE => Err(ProtocolError::UnwritableRegister),
        other => Err(ProtocolError::RequestFailed { status: other }),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn register(id: u16) -> RegisterId {
        RegisterId::new(id).unwrap()
    }

    #[test]
    fn test_encode_number_vectors() {
        assert_eq!(encode_number(0), vec![0x00]);
        assert_eq!(encode_number(63), vec![0x3F]);
        assert_eq!(encode_number(64), vec![0x80, 0x40]);
        assert_eq!(encode_number(-1), vec![0x41]);
        assert_eq!(encode_number(i32::MIN), vec![0x40]);
    }

    #[test]
    fn test_encode_number_length_and_flags() {
        for value in [
            0,
            1,
            -1,
            63,
            64,
            -64,
            8191,
            8192,
            1_000_000,
            i32::MAX,
            i32::MIN + 1,
            i32::MIN,
        ] {
            let encoded = encode_number(value);
            assert!(encoded.len() <= 5, "value {}", value);
            let (last, rest) = encoded.split_last().unwrap();
            assert_eq!(last & 0x80, 0, "terminator flag for {}", value);
            for byte in rest {
                assert_ne!(byte & 0x80, 0, "continuation flag for {}", value);
            }
        }
    }

    #[test]
    fn test_number_round_trip() {
        let samples = [
            0,
            1,
            -1,
            42,
            63,
            64,
            -63,
            -64,
            127,
            128,
            8191,
            8192,
            -8192,
            65535,
            1_048_575,
            -1_048_576,
            i32::MAX,
            i32::MIN + 1,
            i32::MIN,
        ];
        for value in samples {
            let encoded = encode_number(value);
            assert_eq!(decode_number(&encoded, 0).unwrap(), value, "value {}", value);
        }
    }

    #[test]
    fn test_decode_number_at_offset() {
        let mut data = vec![STATUS_OK];
        data.extend_from_slice(&encode_number(-12345));
        assert_eq!(decode_number(&data, 1).unwrap(), -12345);
    }

    #[test]
    fn test_decode_number_truncated() {
        assert!(decode_number(&[], 0).is_err());
        // Continuation flag set but no next byte.
        assert!(decode_number(&[0x80], 0).is_err());
        assert!(decode_number(&[0x81, 0x80], 0).is_err());
    }

    #[test]
    fn test_register_id_wire_forms() {
        assert_eq!(read_integer_request(register(0)), vec![0x01, 0x00]);
        assert_eq!(read_integer_request(register(127)), vec![0x01, 0x7F]);
        assert_eq!(read_integer_request(register(128)), vec![0x01, 0x80, 0x80]);
        assert_eq!(
            read_integer_request(register(0x1234)),
            vec![0x01, 0x92, 0x34]
        );
        assert_eq!(
            read_integer_request(register(32767)),
            vec![0x01, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_write_requests() {
        assert_eq!(
            write_integer_request(register(5), 64),
            vec![0x02, 0x05, 0x80, 0x40]
        );
        assert_eq!(
            write_binary_request(register(5), &[0xDE, 0xAD]),
            vec![0x04, 0x05, 0xDE, 0xAD]
        );
    }

    #[test]
    fn test_change_hint_request_forms() {
        assert_eq!(change_hint_request(None), vec![0x05]);
        assert_eq!(change_hint_request(Some(register(9))), vec![0x05, 0x09]);
        assert_eq!(
            change_hint_request(Some(register(300))),
            vec![0x05, 0x81, 0x2C]
        );
    }

    #[test]
    fn test_ok_payload() {
        assert_eq!(ok_payload(&[STATUS_OK, 0x41]).unwrap(), &[0x41]);
        assert_eq!(ok_payload(&[STATUS_OK]).unwrap(), &[] as &[u8]);
        assert!(matches!(
            ok_payload(&[STATUS_FAILED]),
            Err(ProtocolError::RequestFailed { status: 0x00 })
        ));
        assert!(matches!(
            ok_payload(&[STATUS_UNWRITABLE]),
            Err(ProtocolError::UnwritableRegister)
        ));
        assert!(matches!(
            ok_payload(&[]),
            Err(ProtocolError::TruncatedResponse { .. })
        ));
    }
}
