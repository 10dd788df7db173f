//! UID extraction from an open card session

use crate::transport::CardTransport;

/// GET DATA status-query APDU returning the card UID
pub const GET_UID_COMMAND: [u8; 5] = [0xFF, 0xCA, 0x00, 0x00, 0x00];

/// Success status word
const SW_SUCCESS: [u8; 2] = [0x90, 0x00];

/// Read the card UID over an already-open session
///
/// Returns the UID as uppercase hex with no separators. Any transport
/// failure, short response, non-success status word, or empty payload yields
/// `None`; an unreadable UID is "no identity", never an error.
pub fn read_uid<T: CardTransport + ?Sized>(transport: &mut T) -> Option<String> {
    let response = transport.transmit(&GET_UID_COMMAND).ok()?;
    let payload_len = response.len().checked_sub(2)?;
    let (data, status) = response.split_at(payload_len);

    if status != SW_SUCCESS || data.is_empty() {
        return None;
    }

    Some(hex::encode_upper(data))
}
