//! Datagram assembly for senders and test harnesses.
//!
//! A datagram is the 5-byte header immediately followed by exactly
//! `expected_payload_bytes` of row-major pixel data. The receiver never
//! builds datagrams; these helpers exist for senders, simulators and tests.

use heapless::Vec;

use crate::header::{BandHeader, HeaderError, HEADER_LEN, MAX_PAYLOAD_LEN};

/// Largest datagram any valid header can describe
pub const MAX_DATAGRAM_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LEN;

/// Encode `header` and `payload` into `buffer`
///
/// Returns the number of bytes written. The payload length must match
/// [`BandHeader::expected_payload_bytes`].
pub fn encode_datagram(
    header: &BandHeader,
    payload: &[u8],
    buffer: &mut [u8],
) -> Result<usize, HeaderError> {
    if payload.len() != header.expected_payload_bytes() {
        return Err(HeaderError::PayloadLength);
    }

    let len = HEADER_LEN + payload.len();
    if buffer.len() < len {
        return Err(HeaderError::BufferTooSmall);
    }

    buffer[..HEADER_LEN].copy_from_slice(&header.encode());
    buffer[HEADER_LEN..len].copy_from_slice(payload);

    Ok(len)
}

/// Encode `header` and `payload` into a heapless Vec
pub fn encode_to_vec(
    header: &BandHeader,
    payload: &[u8],
) -> Result<Vec<u8, MAX_DATAGRAM_LEN>, HeaderError> {
    if payload.len() != header.expected_payload_bytes() {
        return Err(HeaderError::PayloadLength);
    }

    let mut vec = Vec::new();
    vec.extend_from_slice(&header.encode())
        .map_err(|_| HeaderError::BufferTooSmall)?;
    vec.extend_from_slice(payload)
        .map_err(|_| HeaderError::BufferTooSmall)?;
    Ok(vec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{ColorMode, Resolution, MAX_LINE_COUNT};

    #[test]
    fn test_encode_datagram() {
        let header = BandHeader::new(7, 3, Resolution::Side120, ColorMode::Rgb332, 1).unwrap();
        let payload = [0x5Au8; 120];
        let mut buffer = [0u8; 200];

        let len = encode_datagram(&header, &payload, &mut buffer).unwrap();

        assert_eq!(len, 125);
        assert_eq!(&buffer[..HEADER_LEN], &header.encode());
        assert!(buffer[HEADER_LEN..len].iter().all(|&b| b == 0x5A));
    }

    #[test]
    fn test_encode_datagram_payload_mismatch() {
        let header = BandHeader::new(0, 0, Resolution::Side240, ColorMode::Rgb565, 1).unwrap();
        let mut buffer = [0u8; 600];

        let result = encode_datagram(&header, &[0u8; 479], &mut buffer);
        assert_eq!(result, Err(HeaderError::PayloadLength));
    }

    #[test]
    fn test_encode_datagram_buffer_too_small() {
        let header = BandHeader::new(0, 0, Resolution::Side240, ColorMode::Rgb565, 1).unwrap();
        let mut buffer = [0u8; 100];

        let result = encode_datagram(&header, &[0u8; 480], &mut buffer);
        assert_eq!(result, Err(HeaderError::BufferTooSmall));
    }

    #[test]
    fn test_encode_to_vec_largest_band() {
        let header = BandHeader::new(
            0xFFFF,
            225,
            Resolution::Side240,
            ColorMode::Rgb565,
            MAX_LINE_COUNT,
        )
        .unwrap();
        let payload = [0xA5u8; MAX_PAYLOAD_LEN];

        let datagram = encode_to_vec(&header, &payload).unwrap();

        assert_eq!(datagram.len(), MAX_DATAGRAM_LEN);
        let decoded = BandHeader::decode(&datagram, MAX_LINE_COUNT).unwrap();
        assert_eq!(decoded, header);
    }
}
