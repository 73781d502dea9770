//! Double-buffered hand-off to the display sink
//!
//! The pump owns two output buffers. One is the source of the transfer in
//! flight; the other is written with the next band. Each drain waits for the
//! previous transfer to retire, fills the idle buffer, releases the slot and
//! starts the next transfer from the freshly filled buffer.

use stria_hal::DisplaySink;

use crate::config::ConfigError;
use crate::fmt::{trace, warn};
use crate::pool::{DisplayingSlot, PayloadLayout};
use crate::scale::{self, DstBand, ScaleError, ScaleMaps, OUTPUT_ROW_BYTES};

/// Pump failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PumpError<E> {
    /// The band cannot be placed in the output buffer; nothing was sent
    Scale(ScaleError),
    /// The display sink failed
    Sink(E),
}

/// Output buffer pair and transfer bookkeeping
pub struct TransferPump<'b, D: DisplaySink> {
    sink: D,
    buffers: [&'b mut [u8]; 2],
    active: usize,
    in_flight: bool,
    lines: u16,
}

impl<'b, D: DisplaySink> TransferPump<'b, D> {
    /// Build a pump over two buffers of at least `lines` output rows each
    ///
    /// Fails when either buffer is too small; the caller must not run with
    /// a partial buffer pair.
    pub fn new(
        sink: D,
        front: &'b mut [u8],
        back: &'b mut [u8],
        lines: u16,
    ) -> Result<Self, ConfigError> {
        let needed = lines as usize * OUTPUT_ROW_BYTES;
        if lines == 0 || front.len() < needed || back.len() < needed {
            return Err(ConfigError::OutputBufferTooSmall);
        }

        Ok(Self {
            sink,
            buffers: [&mut front[..needed], &mut back[..needed]],
            active: 0,
            in_flight: false,
            lines,
        })
    }

    /// Output rows per buffer
    pub fn lines(&self) -> u16 {
        self.lines
    }

    /// Index of the buffer the last transfer was issued from
    pub fn active_buffer(&self) -> usize {
        self.active
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut D {
        &mut self.sink
    }

    /// Copy or normalize `slot` into the idle buffer and send it
    ///
    /// The slot is released as soon as its content has been copied out,
    /// before the transfer starts. On [`PumpError::Scale`] the slot is
    /// released and no transfer is issued.
    pub fn drain<const BYTES: usize>(
        &mut self,
        slot: DisplayingSlot<'_, BYTES>,
        maps: &ScaleMaps,
    ) -> Result<DstBand, PumpError<D::Error>> {
        let target = self.active ^ 1;

        if self.in_flight {
            self.sink.wait_transfer_complete().map_err(PumpError::Sink)?;
            self.in_flight = false;
        }

        let meta = *slot.meta();
        let dst = &mut *self.buffers[target];
        let band = match meta.layout {
            PayloadLayout::Raw => scale::normalize(&meta.header, slot.payload(), maps, dst),
            PayloadLayout::Normalized(band) => copy_rows(band, slot.payload(), dst),
        };
        slot.release();
        let band = band.map_err(PumpError::Scale)?;

        self.sink.begin_transfer().map_err(PumpError::Sink)?;
        let pushed = self
            .sink
            .push_async(band.area(), &self.buffers[target][..band.byte_len()]);
        if let Err(e) = pushed {
            warn!("push_async failed, closing transaction");
            // The push error is the one worth reporting
            let _ = self.sink.end_transfer();
            return Err(PumpError::Sink(e));
        }
        self.in_flight = true;
        self.active = target;
        self.sink.end_transfer().map_err(PumpError::Sink)?;

        trace!("band y0={} lines={} from buffer {}", band.y0, band.lines, target);
        Ok(band)
    }

    /// Wait for the last transfer to retire
    pub fn flush(&mut self) -> Result<(), D::Error> {
        if self.in_flight {
            self.sink.wait_transfer_complete()?;
            self.in_flight = false;
        }
        Ok(())
    }
}

fn copy_rows(band: DstBand, payload: &[u8], dst: &mut [u8]) -> Result<DstBand, ScaleError> {
    let len = band.byte_len();
    if len > dst.len() {
        return Err(ScaleError::Overflow);
    }
    if len > payload.len() {
        return Err(ScaleError::PayloadLength);
    }
    dst[..len].copy_from_slice(&payload[..len]);
    Ok(band)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{SlotMeta, SlotPool};
    use crate::select::SelectionPolicy;
    use stria_hal::mock::{MemoryDisplay, MockError};
    use stria_hal::Area;
    use stria_protocol::{BandHeader, ColorMode, Resolution};

    const ROWS: u16 = 4;
    const BUF: usize = ROWS as usize * OUTPUT_ROW_BYTES;

    fn fill_slot(pool: &SlotPool<2, BUF>, y_start: u16, value: u8) {
        let mut slot = pool.acquire_free().unwrap();
        slot.payload_mut().fill(value);
        slot.commit(SlotMeta {
            header: BandHeader::new(1, y_start, Resolution::Side240, ColorMode::Rgb565, 2)
                .unwrap(),
            layout: PayloadLayout::Raw,
        });
    }

    #[test]
    fn test_new_rejects_small_buffers() {
        let mut front = [0u8; BUF];
        let mut back = [0u8; BUF - 1];
        let result = TransferPump::new(MemoryDisplay::new(240), &mut front, &mut back, ROWS);
        assert!(matches!(result, Err(ConfigError::OutputBufferTooSmall)));
    }

    #[test]
    fn test_drain_alternates_buffers() {
        let pool = SlotPool::<2, BUF>::new();
        let maps = ScaleMaps::new();
        let (mut front, mut back) = ([0u8; BUF], [0u8; BUF]);
        let mut pump =
            TransferPump::new(MemoryDisplay::new(240), &mut front, &mut back, ROWS).unwrap();

        fill_slot(&pool, 0, 0x11);
        let slot = pool.select_next_ready(SelectionPolicy::FirstReady).unwrap();
        let band = pump.drain(slot, &maps).unwrap();
        assert_eq!(band, DstBand { y0: 0, lines: 2 });
        assert_eq!(pump.active_buffer(), 1);
        // Slot is free as soon as the copy is done
        assert_eq!(pool.occupancy(), 0);
        assert!(pump.sink().is_busy());

        fill_slot(&pool, 100, 0x22);
        let slot = pool.select_next_ready(SelectionPolicy::FirstReady).unwrap();
        pump.drain(slot, &maps).unwrap();
        assert_eq!(pump.active_buffer(), 0);

        pump.flush().unwrap();
        let transfers = pump.sink().transfers();
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].area, Area::band(240, 0, 2));
        assert!(transfers[0].pixels.iter().all(|&b| b == 0x11));
        assert_eq!(transfers[1].area, Area::band(240, 100, 2));
        assert!(transfers[1].pixels.iter().all(|&b| b == 0x22));
    }

    #[test]
    fn test_scale_reject_releases_slot_without_transfer() {
        let pool = SlotPool::<2, BUF>::new();
        let (mut front, mut back) = ([0u8; BUF], [0u8; BUF]);
        let mut pump =
            TransferPump::new(MemoryDisplay::new(240), &mut front, &mut back, ROWS).unwrap();

        fill_slot(&pool, 240, 0x33);
        let slot = pool.select_next_ready(SelectionPolicy::FirstReady).unwrap();
        assert_eq!(
            pump.drain(slot, &ScaleMaps::new()),
            Err(PumpError::Scale(ScaleError::OutsideRaster))
        );
        assert_eq!(pool.occupancy(), 0);
        assert_eq!(pump.active_buffer(), 0);
        assert!(!pump.sink().is_busy());
        pump.flush().unwrap();
        assert!(pump.sink().transfers().is_empty());
    }

    #[test]
    fn test_normalized_slot_is_copied() {
        let pool = SlotPool::<2, BUF>::new();
        let (mut front, mut back) = ([0u8; BUF], [0u8; BUF]);
        let mut pump =
            TransferPump::new(MemoryDisplay::new(240), &mut front, &mut back, ROWS).unwrap();

        let band = DstBand { y0: 8, lines: 3 };
        let mut slot = pool.acquire_free().unwrap();
        slot.payload_mut().fill(0x5A);
        slot.commit(SlotMeta {
            header: BandHeader::new(1, 4, Resolution::Side120, ColorMode::Rgb332, 2).unwrap(),
            layout: PayloadLayout::Normalized(band),
        });

        let slot = pool.select_next_ready(SelectionPolicy::FirstReady).unwrap();
        assert_eq!(pump.drain(slot, &ScaleMaps::new()), Ok(band));
        pump.flush().unwrap();

        let transfer = &pump.sink().transfers()[0];
        assert_eq!(transfer.area, Area::band(240, 8, 3));
        assert_eq!(transfer.pixels.len(), 3 * OUTPUT_ROW_BYTES);
    }

    #[test]
    fn test_sink_error_surfaces() {
        struct FailingDisplay;

        impl DisplaySink for FailingDisplay {
            type Error = MockError;

            fn begin_transfer(&mut self) -> Result<(), Self::Error> {
                Ok(())
            }

            fn end_transfer(&mut self) -> Result<(), Self::Error> {
                Ok(())
            }

            fn push_async(&mut self, _area: Area, _pixels: &[u8]) -> Result<(), Self::Error> {
                Err(MockError::Busy)
            }

            fn wait_transfer_complete(&mut self) -> Result<(), Self::Error> {
                Ok(())
            }
        }

        let pool = SlotPool::<2, BUF>::new();
        let (mut front, mut back) = ([0u8; BUF], [0u8; BUF]);
        let mut pump = TransferPump::new(FailingDisplay, &mut front, &mut back, ROWS).unwrap();

        fill_slot(&pool, 0, 0);
        let slot = pool.select_next_ready(SelectionPolicy::FirstReady).unwrap();
        assert_eq!(
            pump.drain(slot, &ScaleMaps::new()),
            Err(PumpError::Sink(MockError::Busy))
        );
        assert_eq!(pool.occupancy(), 0);
    }
}
