//! Pipeline configuration
//!
//! Configuration is fixed at startup. Pool capacity and per-slot buffer size
//! are const generics of [`crate::pool::SlotPool`]; everything else lives in
//! [`PipelineConfig`] and is checked once by [`PipelineConfig::validate`].

use stria_protocol::{MAX_LINE_COUNT, OUTPUT_SIDE};

use crate::scale::OUTPUT_ROW_BYTES;
use crate::select::SelectionPolicy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default maximum source rows per band
pub const DEFAULT_MAX_BAND_LINES: u8 = 12;

/// Default output buffer height in rows (room for a 2× upscaled band)
pub const DEFAULT_OUTPUT_LINES: u16 = 2 * DEFAULT_MAX_BAND_LINES as u16;

/// Which context converts and scales bands to the output raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NormalizeStage {
    /// Slots hold the raw payload; the consumer normalizes into the output buffer
    #[default]
    Consumer,
    /// The producer normalizes into the slot; the consumer copies
    Producer,
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `max_band_lines` outside 1..=15
    BandLinesOutOfRange,
    /// `output_lines` outside 1..=240
    OutputLinesOutOfRange,
    /// `output_lines` cannot hold a 2× upscaled band of `max_band_lines` rows
    OutputTooShortForBand,
    /// Pool has no slots
    EmptyPool,
    /// Slot buffer cannot hold the largest band for the chosen stage
    SlotTooSmall,
    /// Output buffer cannot hold `output_lines` rows
    OutputBufferTooSmall,
    /// Producer staging buffer cannot hold the largest raw band
    ScratchTooSmall,
}

/// Receiver pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineConfig {
    /// Largest accepted `line_count`; taller bands are malformed
    pub max_band_lines: u8,
    /// Height of each output buffer in rows
    pub output_lines: u16,
    /// Where conversion and scaling happen
    pub stage: NormalizeStage,
    /// How the consumer picks among ready slots
    pub selection: SelectionPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_band_lines: DEFAULT_MAX_BAND_LINES,
            output_lines: DEFAULT_OUTPUT_LINES,
            stage: NormalizeStage::default(),
            selection: SelectionPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Bytes a slot needs to hold the largest band this configuration accepts
    ///
    /// Raw slots must fit a full-width, full-depth band of `max_band_lines`
    /// rows. Normalized slots hold up to `output_lines` output rows.
    pub fn slot_bytes_required(&self) -> usize {
        match self.stage {
            NormalizeStage::Consumer => {
                OUTPUT_SIDE as usize * self.max_band_lines as usize * 2
            }
            NormalizeStage::Producer => self.output_buffer_bytes(),
        }
    }

    /// Bytes of raw staging the producer needs
    ///
    /// Only producer-side normalization stages the payload outside the slot.
    pub fn scratch_bytes_required(&self) -> usize {
        match self.stage {
            NormalizeStage::Consumer => 0,
            NormalizeStage::Producer => OUTPUT_SIDE as usize * self.max_band_lines as usize * 2,
        }
    }

    /// Tallest destination band any accepted header can produce
    pub fn max_scaled_lines(&self) -> u16 {
        2 * self.max_band_lines as u16
    }

    /// Size of each output buffer in bytes
    pub fn output_buffer_bytes(&self) -> usize {
        self.output_lines as usize * OUTPUT_ROW_BYTES
    }

    /// Check the configuration against a slot buffer of `SLOT_BYTES`
    pub fn validate<const SLOT_BYTES: usize>(&self) -> Result<(), ConfigError> {
        if self.max_band_lines == 0 || self.max_band_lines > MAX_LINE_COUNT {
            return Err(ConfigError::BandLinesOutOfRange);
        }
        if self.output_lines == 0 || self.output_lines > OUTPUT_SIDE {
            return Err(ConfigError::OutputLinesOutOfRange);
        }
        if self.output_lines < self.max_scaled_lines() {
            return Err(ConfigError::OutputTooShortForBand);
        }
        if SLOT_BYTES < self.slot_bytes_required() {
            return Err(ConfigError::SlotTooSmall);
        }
        Ok(())
    }
}
