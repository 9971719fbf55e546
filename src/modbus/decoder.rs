//! Response validation and typed extraction.
//!
//! Responses are read positionally: bytes `[0..6]` are the MBAP header,
//! `[6]` the unit id, `[7]` the echoed function code and data starts at `[9]`.
//! A 9-byte response whose byte 7 is `function_code | 0x80` is a device
//! exception and is reported as such before anything else is looked at.

use bytes::Buf;
use log::debug;

use super::exception::ModbusException;
use super::protocol::{FunctionCode, EXCEPTION_FLAG};
use crate::utils::error::ProtocolError;

pub const FUNCTION_CODE_OFFSET: usize = 7;
pub const EXCEPTION_CODE_OFFSET: usize = 8;
pub const DATA_OFFSET: usize = 9;
pub const EXCEPTION_FRAME_LEN: usize = 9;
/// Register reads always ask for exactly one 16-bit register.
pub const REGISTER_DATA_BYTES: usize = 2;

/// Number of data bytes a coil read for `num_channels` returns.
pub fn coil_byte_count(num_channels: u16) -> usize {
    (num_channels as usize).div_ceil(8)
}

pub fn detect_exception(response: &[u8], function_code: u8) -> Option<ModbusException> {
    if response.len() == EXCEPTION_FRAME_LEN
        && response[FUNCTION_CODE_OFFSET] == function_code | EXCEPTION_FLAG
    {
        Some(ModbusException::from_code(response[EXCEPTION_CODE_OFFSET]))
    } else {
        None
    }
}

/// Checks for an exception frame, then for enough data bytes, and returns the
/// data section starting at offset 9.
pub fn validate_response(
    response: &[u8],
    function_code: u8,
    expected_data_bytes: usize,
) -> Result<&[u8], ProtocolError> {
    if let Some(exception) = detect_exception(response, function_code) {
        debug!("Device exception for function 0x{:02x}: {}", function_code, exception);
        return Err(exception.into());
    }

    let expected = DATA_OFFSET + expected_data_bytes;
    if response.len() < expected {
        return Err(ProtocolError::MalformedResponse {
            expected,
            actual: response.len(),
        });
    }

    Ok(&response[DATA_OFFSET..])
}

/// Unpacks status bits LSB-first per byte and drops the padding bits past `num_channels`.
pub fn decode_coil_status(response: &[u8], num_channels: u16) -> Result<Vec<bool>, ProtocolError> {
    let byte_count = coil_byte_count(num_channels);
    let data = validate_response(response, FunctionCode::ReadCoils.code(), byte_count)?;

    let status = data[..byte_count]
        .iter()
        .flat_map(|byte| (0..8).map(move |bit| (byte >> bit) & 1 == 1))
        .take(num_channels as usize)
        .collect();

    Ok(status)
}

/// The board reports its address in the first data byte only; the second
/// byte of the register is deliberately not consulted.
pub fn decode_device_address(response: &[u8]) -> Result<u8, ProtocolError> {
    let data = validate_response(
        response,
        FunctionCode::ReadHoldingRegisters.code(),
        REGISTER_DATA_BYTES,
    )?;
    Ok(data[0])
}

pub fn decode_firmware_version(response: &[u8]) -> Result<String, ProtocolError> {
    let mut data = validate_response(
        response,
        FunctionCode::ReadHoldingRegisters.code(),
        REGISTER_DATA_BYTES,
    )?;
    Ok(format_firmware_version(data.get_u16()))
}

/// Renders the raw version register as `V<value/100>` with two decimals, e.g. 400 -> "V4.00".
pub fn format_firmware_version(raw: u16) -> String {
    format!("V{}.{:02}", raw / 100, raw % 100)
}

/// A relay write carries no data back; only exceptions and truncated frames are rejected.
pub fn decode_relay_ack(response: &[u8]) -> Result<(), ProtocolError> {
    validate_response(response, FunctionCode::WriteRelay.code(), 0).map(|_| ())
}
