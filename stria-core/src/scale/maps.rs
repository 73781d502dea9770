//! Nearest-neighbor index maps for the 180 → 240 upscale

use stria_protocol::OUTPUT_SIDE;

const OUT: usize = OUTPUT_SIDE as usize;
const SRC: u32 = 180;

/// Source index for output index `i`, rounded to nearest and clamped to 179
pub const fn map_index(i: usize) -> u8 {
    let src = (i as u32 * SRC + OUT as u32 / 2) / OUT as u32;
    if src > SRC - 1 {
        (SRC - 1) as u8
    } else {
        src as u8
    }
}

const fn build_map() -> [u8; OUT] {
    let mut map = [0u8; OUT];
    let mut i = 0;
    while i < OUT {
        map[i] = map_index(i);
        i += 1;
    }
    map
}

/// Horizontal and vertical output-to-source maps
///
/// Built once at startup and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleMaps {
    /// Source column for each output column
    pub horizontal: [u8; OUT],
    /// Source row offset for each output row offset within a band
    pub vertical: [u8; OUT],
}

impl ScaleMaps {
    pub const fn new() -> Self {
        Self {
            horizontal: build_map(),
            vertical: build_map(),
        }
    }
}

impl Default for ScaleMaps {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_map_endpoints() {
        let maps = ScaleMaps::new();
        assert_eq!(maps.horizontal[0], 0);
        assert_eq!(maps.horizontal[1], 1); // (180 + 120) / 240
        assert_eq!(maps.horizontal[2], 2); // (360 + 120) / 240
        assert_eq!(maps.horizontal[3], 2); // (540 + 120) / 240
        assert_eq!(maps.horizontal[239], 179);
        assert_eq!(maps.horizontal, maps.vertical);
    }

    #[test]
    fn test_every_source_column_used() {
        let maps = ScaleMaps::new();
        let mut seen = [false; 180];
        for &src in maps.horizontal.iter() {
            seen[src as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_maps_bounded_and_monotonic_everywhere() {
        let maps = ScaleMaps::new();
        for map in [&maps.horizontal, &maps.vertical] {
            assert!(map.iter().all(|&src| src <= 179));
            for i in 0..239 {
                assert!(map[i] <= map[i + 1], "map decreases at {i}");
            }
        }
    }

    proptest! {
        #[test]
        fn prop_maps_bounded_and_monotonic(i in 0usize..239) {
            let maps = ScaleMaps::new();
            prop_assert!(maps.horizontal[i] <= 179);
            prop_assert!(maps.vertical[i] <= 179);
            prop_assert!(maps.horizontal[i] <= maps.horizontal[i + 1]);
            prop_assert!(maps.vertical[i] <= maps.vertical[i + 1]);
            prop_assert!(maps.horizontal[i + 1] <= 179);
        }
    }
}
