//! Network-side ingestion
//!
//! One `poll` handles at most one datagram: decode the header, claim a slot,
//! read exactly the announced payload, commit. Nothing here ever waits for a
//! slot; a full pool means the band is dropped.

use stria_hal::DatagramSource;
use stria_protocol::{BandHeader, HeaderError, HEADER_LEN};

use crate::config::NormalizeStage;
use crate::fmt::{debug, trace, warn};
use crate::pool::{FillingSlot, PayloadLayout, SlotMeta};
use crate::scale::{self, ScaleError};

use super::Pipeline;

/// Outcome of one [`Producer::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProducerEvent {
    /// No datagram pending
    Idle,
    /// Band stored in the slot with this index
    Committed(usize),
    /// Header failed to decode; no slot touched
    Malformed(HeaderError),
    /// No free slot; band dropped
    Dropped,
    /// Payload shorter than announced; slot returned to `Free`
    ShortRead,
    /// Band cannot be placed in the output raster (producer-side normalization)
    Rejected(ScaleError),
}

/// Producer context state
pub struct Producer<'p, 's, S, const N: usize, const BYTES: usize> {
    pipeline: &'p Pipeline<N, BYTES>,
    source: S,
    /// Raw payload staging for producer-side normalization; empty otherwise
    scratch: &'s mut [u8],
}

impl<'p, 's, S, const N: usize, const BYTES: usize> Producer<'p, 's, S, N, BYTES>
where
    S: DatagramSource,
{
    pub(super) fn new(
        pipeline: &'p Pipeline<N, BYTES>,
        source: S,
        scratch: &'s mut [u8],
    ) -> Self {
        Self {
            pipeline,
            source,
            scratch,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Process the next pending datagram, if any
    ///
    /// Only transport failures are returned as errors; every rejection is
    /// reported as an event and counted.
    pub fn poll(&mut self) -> Result<ProducerEvent, S::Error> {
        if self.source.poll_datagram()?.is_none() {
            return Ok(ProducerEvent::Idle);
        }
        let stats = self.pipeline.stats();
        stats.record_datagram();

        let event = self.ingest();
        // Trailing bytes beyond the announced payload are ignored
        self.source.discard();
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!("datagram read failed");
                stats.record_read_error();
                return Err(e);
            }
        };

        match event {
            ProducerEvent::Malformed(_) => stats.record_malformed(),
            ProducerEvent::Dropped => stats.record_dropped(),
            ProducerEvent::ShortRead => stats.record_short_read(),
            ProducerEvent::Rejected(_) => stats.record_rejected(),
            ProducerEvent::Idle | ProducerEvent::Committed(_) => {}
        }
        Ok(event)
    }

    fn ingest(&mut self) -> Result<ProducerEvent, S::Error> {
        let config = self.pipeline.config();

        let mut raw = [0u8; HEADER_LEN];
        let n = read_full(&mut self.source, &mut raw)?;
        let header = match BandHeader::decode(&raw[..n], config.max_band_lines) {
            Ok(header) => header,
            Err(e) => {
                debug!("malformed header: {}", e);
                return Ok(ProducerEvent::Malformed(e));
            }
        };

        let Some(mut slot) = self.pipeline.pool().acquire_free() else {
            debug!("pool exhausted, dropping frame {}", header.frame_id);
            return Ok(ProducerEvent::Dropped);
        };

        let expected = header.expected_payload_bytes();
        match config.stage {
            NormalizeStage::Consumer => {
                let Some(payload) = slot.payload_mut().get_mut(..expected) else {
                    return Ok(ProducerEvent::Rejected(ScaleError::Overflow));
                };
                if read_full(&mut self.source, payload)? < expected {
                    return Ok(short_read(slot));
                }
                Ok(commit(slot, header, PayloadLayout::Raw))
            }
            NormalizeStage::Producer => {
                let Some(payload) = self.scratch.get_mut(..expected) else {
                    return Ok(ProducerEvent::Rejected(ScaleError::Overflow));
                };
                if read_full(&mut self.source, payload)? < expected {
                    return Ok(short_read(slot));
                }
                let rows = config.output_lines as usize * scale::OUTPUT_ROW_BYTES;
                let Some(dst) = slot.payload_mut().get_mut(..rows) else {
                    return Ok(ProducerEvent::Rejected(ScaleError::Overflow));
                };
                let maps = self.pipeline.maps();
                match scale::normalize(&header, payload, maps, dst) {
                    Ok(band) => Ok(commit(slot, header, PayloadLayout::Normalized(band))),
                    Err(e) => {
                        debug!("band rejected: {}", e);
                        slot.abort();
                        Ok(ProducerEvent::Rejected(e))
                    }
                }
            }
        }
    }
}

fn short_read<const BYTES: usize>(slot: FillingSlot<'_, BYTES>) -> ProducerEvent {
    debug!("short payload, aborting slot {}", slot.index());
    slot.abort();
    ProducerEvent::ShortRead
}

fn commit<const BYTES: usize>(
    slot: FillingSlot<'_, BYTES>,
    header: BandHeader,
    layout: PayloadLayout,
) -> ProducerEvent {
    let index = slot.index();
    trace!("frame {} y={} -> slot {}", header.frame_id, header.y_start, index);
    slot.commit(SlotMeta { header, layout });
    ProducerEvent::Committed(index)
}

/// Read until `buf` is full or the datagram runs out
fn read_full<S: DatagramSource>(source: &mut S, buf: &mut [u8]) -> Result<usize, S::Error> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
