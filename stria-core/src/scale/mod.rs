//! Band normalization to the 240 × 240 RGB565 output raster
//!
//! Three branches, selected by the source side length:
//!
//! | Source | Method | Destination rows |
//! |--------|--------|------------------|
//! | 240 | copy / convert | `[y, y + n)` |
//! | 180 | nearest-neighbor through [`ScaleMaps`] | `[(240y + 120) / 180, … + ceil(4n / 3))` |
//! | 120 | 2×2 block replication | `[2y, 2y + 2n)` |
//!
//! Every source sample is converted at most once; replicated output pixels
//! are copied from already converted data. Bands starting below the raster
//! are rejected, bands running past its bottom edge are clipped, and bands
//! taller than the destination buffer are rejected.

mod maps;

pub use maps::{map_index, ScaleMaps};

use stria_hal::Area;
use stria_protocol::{BandHeader, Resolution, OUTPUT_BYTES_PER_PIXEL, OUTPUT_SIDE};

use crate::pixel::{expand_lut, expand_row};

/// Bytes in one output row
pub const OUTPUT_ROW_BYTES: usize = OUTPUT_SIDE as usize * OUTPUT_BYTES_PER_PIXEL;

/// Reasons a band cannot be normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScaleError {
    /// Destination start row lies at or below the raster bottom
    OutsideRaster,
    /// Scaled band is taller than the destination buffer
    Overflow,
    /// Payload shorter than the header announces
    PayloadLength,
}

/// Destination row range of a normalized band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DstBand {
    /// First output row
    pub y0: u16,
    /// Number of output rows
    pub lines: u16,
}

impl DstBand {
    /// Full-width panel rectangle covered by the band
    pub fn area(&self) -> Area {
        Area::band(OUTPUT_SIDE, self.y0, self.lines)
    }

    /// Bytes of output rows the band occupies
    pub fn byte_len(&self) -> usize {
        self.lines as usize * OUTPUT_ROW_BYTES
    }
}

/// Compute where a band lands, clipped to the raster
///
/// `capacity_lines` is the height of the destination buffer.
pub fn destination(header: &BandHeader, capacity_lines: u16) -> Result<DstBand, ScaleError> {
    let y = header.y_start as u32;
    let n = header.line_count as u32;
    let side = OUTPUT_SIDE as u32;

    let (y0, lines) = match header.resolution {
        Resolution::Side240 => (y, n),
        Resolution::Side180 => ((y * 240 + 120) / 180, (n * 240 + 179) / 180),
        Resolution::Side120 => (y * 2, n * 2),
    };

    if y0 >= side {
        return Err(ScaleError::OutsideRaster);
    }
    let lines = lines.min(side - y0);
    if lines > capacity_lines as u32 {
        return Err(ScaleError::Overflow);
    }

    Ok(DstBand {
        y0: y0 as u16,
        lines: lines as u16,
    })
}

/// Normalize a band payload into `dst`
///
/// `dst` is a whole number of output rows; its row count is the capacity
/// used for the overflow check. On success the first
/// [`DstBand::byte_len`] bytes of `dst` hold the band in native-order
/// RGB565.
pub fn normalize(
    header: &BandHeader,
    payload: &[u8],
    maps: &ScaleMaps,
    dst: &mut [u8],
) -> Result<DstBand, ScaleError> {
    if payload.len() < header.expected_payload_bytes() {
        return Err(ScaleError::PayloadLength);
    }
    let capacity = (dst.len() / OUTPUT_ROW_BYTES).min(u16::MAX as usize) as u16;
    let band = destination(header, capacity)?;
    let dst = &mut dst[..band.byte_len()];

    match header.resolution {
        Resolution::Side240 => identity(header, payload, dst),
        Resolution::Side180 => upscale_4_3(header, payload, maps, dst),
        Resolution::Side120 => upscale_2x(header, payload, dst),
    }

    Ok(band)
}

/// Native-order RGB565 bytes of source sample `index`
#[inline(always)]
fn sample(payload: &[u8], index: usize, full_depth: bool) -> [u8; 2] {
    if full_depth {
        [payload[2 * index], payload[2 * index + 1]]
    } else {
        expand_lut(payload[index]).to_ne_bytes()
    }
}

fn identity(header: &BandHeader, payload: &[u8], dst: &mut [u8]) {
    let src_row_bytes = OUTPUT_SIDE as usize * header.bytes_per_pixel();

    for (src_row, dst_row) in payload
        .chunks_exact(src_row_bytes)
        .zip(dst.chunks_exact_mut(OUTPUT_ROW_BYTES))
    {
        if header.is_full_depth() {
            dst_row.copy_from_slice(src_row);
        } else {
            expand_row(src_row, dst_row);
        }
    }
}

fn upscale_4_3(header: &BandHeader, payload: &[u8], maps: &ScaleMaps, dst: &mut [u8]) {
    let width = header.source_width() as usize;
    let full_depth = header.is_full_depth();
    let last_row = header.line_count as usize - 1;

    // One converted source row
    let mut converted = [[0u8; 2]; 180];
    let mut previous: Option<usize> = None;

    for dy in 0..dst.len() / OUTPUT_ROW_BYTES {
        let sy = (maps.vertical[dy] as usize).min(last_row);

        if previous == Some(sy) {
            // Vertical map is non-decreasing; repeat the row above
            let (done, rest) = dst.split_at_mut(dy * OUTPUT_ROW_BYTES);
            rest[..OUTPUT_ROW_BYTES].copy_from_slice(&done[(dy - 1) * OUTPUT_ROW_BYTES..]);
            continue;
        }

        let base = sy * width;
        for (x, px) in converted.iter_mut().enumerate() {
            *px = sample(payload, base + x, full_depth);
        }

        let row = &mut dst[dy * OUTPUT_ROW_BYTES..(dy + 1) * OUTPUT_ROW_BYTES];
        for (out, &sx) in row.chunks_exact_mut(2).zip(maps.horizontal.iter()) {
            out.copy_from_slice(&converted[sx as usize]);
        }
        previous = Some(sy);
    }
}

fn upscale_2x(header: &BandHeader, payload: &[u8], dst: &mut [u8]) {
    let width = header.source_width() as usize;
    let full_depth = header.is_full_depth();
    let lines = dst.len() / OUTPUT_ROW_BYTES;

    for sy in 0..header.line_count as usize {
        let dy = 2 * sy;
        if dy >= lines {
            break;
        }

        let row = &mut dst[dy * OUTPUT_ROW_BYTES..(dy + 1) * OUTPUT_ROW_BYTES];
        for (x, block) in row.chunks_exact_mut(4).enumerate() {
            let px = sample(payload, sy * width + x, full_depth);
            block[..2].copy_from_slice(&px);
            block[2..].copy_from_slice(&px);
        }

        if dy + 1 < lines {
            dst.copy_within(
                dy * OUTPUT_ROW_BYTES..(dy + 1) * OUTPUT_ROW_BYTES,
                (dy + 1) * OUTPUT_ROW_BYTES,
            );
        }
    }
}
