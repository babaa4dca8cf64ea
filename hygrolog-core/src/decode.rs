//! Binary Decoder for GATT Characteristic Payloads
//!
//! ## Wire Format
//!
//! The supported device exposes the standard Environmental Sensing and
//! Battery services, so payloads follow the Bluetooth SIG characteristic
//! encodings:
//!
//! ```text
//! Temperature (0x2A6E): sint16, little-endian, 0.01 °C resolution
//! Humidity    (0x2A6F): uint16, little-endian, 0.01 %  resolution
//! Battery     (0x2A19): uint8, 1 % resolution
//! ```
//!
//! Example: `[0xE8, 0x09]` is 2536 hundredths, decoded as 25.36 °C.
//!
//! Decoders are pure and deterministic: no I/O, no state, no retries. A
//! payload that is too short is a permanent decode failure for that payload.
//! Bytes beyond the required prefix are ignored - some firmwares pad the
//! temperature characteristic to three bytes.

use crate::errors::DecodeError;

/// Decode a temperature payload into degrees Celsius
///
/// Interprets the first two bytes as a little-endian signed 16-bit integer
/// in hundredths of a degree.
///
/// # Errors
///
/// [`DecodeError::TooShort`] when fewer than two bytes are supplied.
pub fn decode_temperature(payload: &[u8]) -> Result<f64, DecodeError> {
    let raw = prefix::<2>(payload)?;
    Ok(f64::from(i16::from_le_bytes(raw)) / 100.0)
}

/// Decode a humidity payload into percent relative humidity
///
/// Interprets the first two bytes as a little-endian **unsigned** 16-bit
/// integer in hundredths of a percent.
///
/// # Errors
///
/// [`DecodeError::TooShort`] when fewer than two bytes are supplied.
pub fn decode_humidity(payload: &[u8]) -> Result<f64, DecodeError> {
    let raw = prefix::<2>(payload)?;
    Ok(f64::from(u16::from_le_bytes(raw)) / 100.0)
}

/// Decode a battery payload into a percentage level
///
/// Returns the first byte verbatim. The encoding allows 0-255; devices
/// conventionally report 0-100.
///
/// # Errors
///
/// [`DecodeError::TooShort`] when the payload is empty.
pub fn decode_battery(payload: &[u8]) -> Result<u8, DecodeError> {
    let raw = prefix::<1>(payload)?;
    Ok(raw[0])
}

/// First `N` bytes of the payload, or the length that was missing
fn prefix<const N: usize>(payload: &[u8]) -> Result<[u8; N], DecodeError> {
    payload
        .get(..N)
        .and_then(|bytes| <[u8; N]>::try_from(bytes).ok())
        .ok_or(DecodeError::TooShort {
            needed: N,
            got: payload.len(),
        })
}
