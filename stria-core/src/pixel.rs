//! RGB332 to RGB565 conversion
//!
//! Each channel is widened by bit replication: the source bits are repeated
//! until the destination width is filled, so black stays black, white
//! becomes `0xFFFF` and intermediate levels are spread evenly.

/// Expand one RGB332 sample to RGB565
#[inline]
pub const fn expand(sample: u8) -> u16 {
    let r3 = (sample >> 5) as u16;
    let g3 = ((sample >> 2) & 0x07) as u16;
    let b2 = (sample & 0x03) as u16;

    let r5 = (r3 << 2) | (r3 >> 1);
    let g6 = (g3 << 3) | g3;
    let b5 = (b2 << 3) | (b2 << 1) | (b2 >> 1);

    (r5 << 11) | (g6 << 5) | b5
}

/// Lookup table form of [`expand`], built at compile time
pub static EXPAND_LUT: [u16; 256] = build_lut();

const fn build_lut() -> [u16; 256] {
    let mut lut = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        lut[i] = expand(i as u8);
        i += 1;
    }
    lut
}

/// Table-driven expansion, bit-identical to [`expand`]
#[inline(always)]
pub fn expand_lut(sample: u8) -> u16 {
    EXPAND_LUT[sample as usize]
}

/// Convert a row of RGB332 samples into RGB565 bytes in native order
///
/// `dst` must hold at least `2 * src.len()` bytes.
#[inline]
pub fn expand_row(src: &[u8], dst: &mut [u8]) {
    for (&sample, out) in src.iter().zip(dst.chunks_exact_mut(2)) {
        out.copy_from_slice(&expand_lut(sample).to_ne_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes() {
        assert_eq!(expand(0x00), 0x0000);
        assert_eq!(expand(0xFF), 0xFFFF);
    }

    #[test]
    fn test_primaries() {
        // Pure red, green, blue at full intensity
        assert_eq!(expand(0b111_000_00), 0xF800);
        assert_eq!(expand(0b000_111_00), 0x07E0);
        assert_eq!(expand(0b000_000_11), 0x001F);
    }

    #[test]
    fn test_midtones() {
        // r3=4 -> 0b10010, g3=2 -> 0b010010, b2=1 -> 0b01010
        let expected = (0b10010 << 11) | (0b010010 << 5) | 0b01010;
        assert_eq!(expand(0b100_010_01), expected);
    }

    #[test]
    fn test_lut_matches_closed_form() {
        for sample in 0..=255u8 {
            assert_eq!(expand_lut(sample), expand(sample), "sample {sample:#04x}");
        }
    }

    #[test]
    fn test_channels_monotonic() {
        for r in 0..7u8 {
            assert!(expand(r << 5) >> 11 < expand((r + 1) << 5) >> 11);
        }
        for g in 0..7u8 {
            assert!((expand(g << 2) >> 5) & 0x3F < (expand((g + 1) << 2) >> 5) & 0x3F);
        }
        for b in 0..3u8 {
            assert!(expand(b) & 0x1F < expand(b + 1) & 0x1F);
        }
    }

    #[test]
    fn test_expand_row() {
        let src = [0x00, 0xFF, 0b111_000_00];
        let mut dst = [0u8; 6];
        expand_row(&src, &mut dst);

        assert_eq!(u16::from_ne_bytes([dst[0], dst[1]]), 0x0000);
        assert_eq!(u16::from_ne_bytes([dst[2], dst[3]]), 0xFFFF);
        assert_eq!(u16::from_ne_bytes([dst[4], dst[5]]), 0xF800);
    }
}
