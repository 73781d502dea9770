//! Display-side drain

use stria_hal::DisplaySink;

use crate::fmt::{debug, warn};
use crate::pool::DisplayingSlot;
use crate::pump::{PumpError, TransferPump};
use crate::scale::{DstBand, ScaleError};

use super::Pipeline;

/// Outcome of one [`Consumer::poll`] or [`Consumer::next`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConsumerEvent {
    /// No slot ready
    Idle,
    /// Band sent to the display
    Drawn(DstBand),
    /// Band discarded without display
    Rejected(ScaleError),
}

/// Consumer context state
pub struct Consumer<'p, 'b, D: DisplaySink, const N: usize, const BYTES: usize> {
    pipeline: &'p Pipeline<N, BYTES>,
    pump: TransferPump<'b, D>,
}

impl<'p, 'b, D: DisplaySink, const N: usize, const BYTES: usize> Consumer<'p, 'b, D, N, BYTES> {
    pub(super) fn new(pipeline: &'p Pipeline<N, BYTES>, pump: TransferPump<'b, D>) -> Self {
        Self { pipeline, pump }
    }

    pub fn pump(&self) -> &TransferPump<'b, D> {
        &self.pump
    }

    /// Drain the next ready slot, if any, without waiting for one
    pub fn poll(&mut self) -> Result<ConsumerEvent, D::Error> {
        let policy = self.pipeline.config().selection;
        match self.pipeline.pool().select_next_ready(policy) {
            Some(slot) => self.drain(slot),
            None => Ok(ConsumerEvent::Idle),
        }
    }

    /// Wait for a ready slot and drain it
    pub async fn next(&mut self) -> Result<ConsumerEvent, D::Error> {
        let policy = self.pipeline.config().selection;
        let slot = self.pipeline.pool().wait_ready(policy).await;
        self.drain(slot)
    }

    /// Wait for the last transfer to retire
    pub fn flush(&mut self) -> Result<(), D::Error> {
        self.pump.flush()
    }

    fn drain(&mut self, slot: DisplayingSlot<'p, BYTES>) -> Result<ConsumerEvent, D::Error> {
        let stats = self.pipeline.stats();
        match self.pump.drain(slot, self.pipeline.maps()) {
            Ok(band) => {
                stats.record_drawn();
                Ok(ConsumerEvent::Drawn(band))
            }
            Err(PumpError::Scale(e)) => {
                debug!("band rejected: {}", e);
                stats.record_rejected();
                Ok(ConsumerEvent::Rejected(e))
            }
            Err(PumpError::Sink(e)) => {
                warn!("display sink error");
                stats.record_sink_error();
                Err(e)
            }
        }
    }
}
