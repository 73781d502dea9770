//! Producer/consumer pipeline
//!
//! [`Pipeline`] is the one shared context: slot pool, counters, scale maps
//! and configuration, built once at startup. The network context drives a
//! [`Producer`], the display context a [`Consumer`]; both borrow the same
//! pipeline and coordinate only through slot states.
//!
//! ```text
//!  DatagramSource ─▶ Producer ─▶ SlotPool ─▶ Consumer ─▶ TransferPump ─▶ DisplaySink
//!                       │                       │
//!                       └─────────▶ Stats ◀─────┘
//! ```

mod consumer;
mod producer;

pub use consumer::{Consumer, ConsumerEvent};
pub use producer::{Producer, ProducerEvent};

use stria_hal::{DatagramSource, DisplaySink};

use crate::config::{ConfigError, PipelineConfig};
use crate::fmt::{error, info};
use crate::pool::SlotPool;
use crate::pump::TransferPump;
use crate::scale::ScaleMaps;
use crate::stats::Stats;

/// Shared receiver state
pub struct Pipeline<const N: usize, const BYTES: usize> {
    pool: SlotPool<N, BYTES>,
    stats: Stats,
    maps: ScaleMaps,
    config: PipelineConfig,
}

impl<const N: usize, const BYTES: usize> Pipeline<N, BYTES> {
    /// Validate `config` and build the pool and scale maps
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        if N == 0 {
            error!("slot pool has no slots");
            return Err(ConfigError::EmptyPool);
        }
        if let Err(e) = config.validate::<BYTES>() {
            error!("invalid pipeline configuration: {}", e);
            return Err(e);
        }

        info!(
            "pipeline: {} slots of {} bytes, {} output lines",
            N, BYTES, config.output_lines
        );
        Ok(Self {
            pool: SlotPool::new(),
            stats: Stats::new(),
            maps: ScaleMaps::new(),
            config,
        })
    }

    pub fn pool(&self) -> &SlotPool<N, BYTES> {
        &self.pool
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn maps(&self) -> &ScaleMaps {
        &self.maps
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Network side, reading from `source`
    ///
    /// `scratch` stages raw payloads for producer-side normalization and must
    /// hold `max_band_lines` full-depth rows; consumer-side normalization
    /// never touches it, so an empty slice will do.
    pub fn producer<'s, S: DatagramSource>(
        &self,
        source: S,
        scratch: &'s mut [u8],
    ) -> Result<Producer<'_, 's, S, N, BYTES>, ConfigError> {
        if scratch.len() < self.config.scratch_bytes_required() {
            error!("producer scratch buffer too small");
            return Err(ConfigError::ScratchTooSmall);
        }
        Ok(Producer::new(self, source, scratch))
    }

    /// Display side, drawing into `sink` through the `front`/`back` buffer pair
    ///
    /// Fails when the buffers cannot hold `output_lines` rows each.
    pub fn consumer<'b, D: DisplaySink>(
        &self,
        sink: D,
        front: &'b mut [u8],
        back: &'b mut [u8],
    ) -> Result<Consumer<'_, 'b, D, N, BYTES>, ConfigError> {
        let pump = TransferPump::new(sink, front, back, self.config.output_lines)?;
        Ok(Consumer::new(self, pump))
    }
}
