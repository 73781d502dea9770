//! Band header encoding and decoding.
//!
//! Header format (5 bytes, multi-byte fields big-endian):
//! - FRAME_ID (2 bytes): sender-assigned frame counter, wraps at 0xFFFF
//! - Y_START (2 bytes): first source row covered by the band
//! - FLAGS (1 byte): `resolution:2 | color_mode:2 | line_count:4`
//!
//! The layout is a serialization contract only; [`BandHeader`] is never
//! reinterpreted from memory.

use crate::{OUTPUT_BYTES_PER_PIXEL, OUTPUT_SIDE};

/// Encoded header length in bytes
pub const HEADER_LEN: usize = 5;

/// Largest line count the 4-bit field can carry
pub const MAX_LINE_COUNT: u8 = 15;

/// Largest payload any valid header can announce (240 wide, 15 lines, RGB565)
pub const MAX_PAYLOAD_LEN: usize =
    OUTPUT_SIDE as usize * MAX_LINE_COUNT as usize * OUTPUT_BYTES_PER_PIXEL;

const RESOLUTION_SHIFT: u8 = 6;
const COLOR_MODE_SHIFT: u8 = 4;
const LINE_COUNT_MASK: u8 = 0x0F;
const TWO_BIT_MASK: u8 = 0x03;

/// Errors that can occur while decoding or encoding a band header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeaderError {
    /// Fewer than [`HEADER_LEN`] bytes available
    Truncated,
    /// Resolution code 3 is reserved
    ReservedResolution,
    /// Color mode codes 2 and 3 are reserved
    ReservedColorMode,
    /// Line count of zero
    EmptyBand,
    /// Line count above the configured maximum band height
    BandTooTall,
    /// Payload length does not match the header
    PayloadLength,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Source raster resolution class
///
/// The source raster is square; the side length doubles as the row width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    /// 240 × 240, displayed 1:1
    Side240,
    /// 180 × 180, upscaled 4:3
    Side180,
    /// 120 × 120, upscaled 2:1
    Side120,
}

impl Resolution {
    /// Parse a resolution from its 2-bit wire code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Resolution::Side240),
            1 => Some(Resolution::Side180),
            2 => Some(Resolution::Side120),
            _ => None,
        }
    }

    /// Convert to the 2-bit wire code
    pub fn code(self) -> u8 {
        match self {
            Resolution::Side240 => 0,
            Resolution::Side180 => 1,
            Resolution::Side120 => 2,
        }
    }

    /// Side length of the source raster in pixels
    pub fn side(self) -> u16 {
        match self {
            Resolution::Side240 => 240,
            Resolution::Side180 => 180,
            Resolution::Side120 => 120,
        }
    }
}

/// Pixel encoding of the band payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorMode {
    /// Full depth: 16-bit RGB565 in the byte order of the destination raster
    Rgb565,
    /// Reduced depth: 8-bit RGB332
    Rgb332,
}

impl ColorMode {
    /// Parse a color mode from its 2-bit wire code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ColorMode::Rgb565),
            1 => Some(ColorMode::Rgb332),
            _ => None,
        }
    }

    /// Convert to the 2-bit wire code
    pub fn code(self) -> u8 {
        match self {
            ColorMode::Rgb565 => 0,
            ColorMode::Rgb332 => 1,
        }
    }

    /// Bytes per source sample
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorMode::Rgb565 => 2,
            ColorMode::Rgb332 => 1,
        }
    }
}

/// A decoded band header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BandHeader {
    /// Sender frame counter
    pub frame_id: u16,
    /// First source row covered by this band
    pub y_start: u16,
    /// Source raster resolution
    pub resolution: Resolution,
    /// Payload pixel encoding
    pub color_mode: ColorMode,
    /// Number of source rows in the band (1-15)
    pub line_count: u8,
}

impl BandHeader {
    /// Create a header, validating the line count against the 4-bit field
    pub fn new(
        frame_id: u16,
        y_start: u16,
        resolution: Resolution,
        color_mode: ColorMode,
        line_count: u8,
    ) -> Result<Self, HeaderError> {
        if line_count == 0 {
            return Err(HeaderError::EmptyBand);
        }
        if line_count > MAX_LINE_COUNT {
            return Err(HeaderError::BandTooTall);
        }

        Ok(Self {
            frame_id,
            y_start,
            resolution,
            color_mode,
            line_count,
        })
    }

    /// Decode a header from the first [`HEADER_LEN`] bytes of `bytes`
    ///
    /// `max_band_lines` is the receiver's configured maximum band height;
    /// bands announcing more rows are rejected.
    pub fn decode(bytes: &[u8], max_band_lines: u8) -> Result<Self, HeaderError> {
        if bytes.len() < HEADER_LEN {
            return Err(HeaderError::Truncated);
        }

        let frame_id = u16::from_be_bytes([bytes[0], bytes[1]]);
        let y_start = u16::from_be_bytes([bytes[2], bytes[3]]);
        let flags = bytes[4];

        let resolution = Resolution::from_code((flags >> RESOLUTION_SHIFT) & TWO_BIT_MASK)
            .ok_or(HeaderError::ReservedResolution)?;
        let color_mode = ColorMode::from_code((flags >> COLOR_MODE_SHIFT) & TWO_BIT_MASK)
            .ok_or(HeaderError::ReservedColorMode)?;

        let line_count = flags & LINE_COUNT_MASK;
        if line_count == 0 {
            return Err(HeaderError::EmptyBand);
        }
        if line_count > max_band_lines {
            return Err(HeaderError::BandTooTall);
        }

        Ok(Self {
            frame_id,
            y_start,
            resolution,
            color_mode,
            line_count,
        })
    }

    /// Encode this header into its 5-byte wire form
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let [id_hi, id_lo] = self.frame_id.to_be_bytes();
        let [y_hi, y_lo] = self.y_start.to_be_bytes();
        [id_hi, id_lo, y_hi, y_lo, self.flags()]
    }

    /// Packed FLAGS byte
    pub fn flags(&self) -> u8 {
        (self.resolution.code() << RESOLUTION_SHIFT)
            | (self.color_mode.code() << COLOR_MODE_SHIFT)
            | (self.line_count & LINE_COUNT_MASK)
    }

    /// Source row width in pixels
    pub fn source_width(&self) -> u16 {
        self.resolution.side()
    }

    /// Bytes per source sample
    pub fn bytes_per_pixel(&self) -> usize {
        self.color_mode.bytes_per_pixel()
    }

    /// True for 16-bit payloads, which are copied without conversion
    pub fn is_full_depth(&self) -> bool {
        self.color_mode == ColorMode::Rgb565
    }

    /// Number of payload bytes that must follow this header
    pub fn expected_payload_bytes(&self) -> usize {
        self.source_width() as usize * self.line_count as usize * self.bytes_per_pixel()
    }
}
