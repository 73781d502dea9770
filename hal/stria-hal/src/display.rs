//! Display sink abstraction
//!
//! Models a panel driver with a single asynchronous transfer engine (DMA).
//! At most one transfer is in flight; the caller must wait for it to retire
//! before starting the next.

/// Destination rectangle of a transfer, in panel pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Area {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Area {
    /// Full-width band starting at row `y`
    pub fn band(width: u16, y: u16, height: u16) -> Self {
        Self {
            x: 0,
            y,
            width,
            height,
        }
    }

    /// Number of pixels covered
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Panel with an asynchronous transfer engine
///
/// Pixels are RGB565, two bytes each, in the panel's native byte order.
pub trait DisplaySink {
    /// Error type for sink operations
    type Error;

    /// Open a transfer transaction (chip select, bus lock)
    fn begin_transfer(&mut self) -> Result<(), Self::Error>;

    /// Close the transaction opened by [`DisplaySink::begin_transfer`]
    fn end_transfer(&mut self) -> Result<(), Self::Error>;

    /// Start writing `pixels` into `area` and return without waiting
    ///
    /// `pixels` holds exactly `area.pixel_count() * 2` bytes. The caller
    /// does not modify `pixels` until [`DisplaySink::wait_transfer_complete`]
    /// returns, and never calls `push_async` twice without waiting in between.
    fn push_async(&mut self, area: Area, pixels: &[u8]) -> Result<(), Self::Error>;

    /// Block until the transfer started by the last `push_async` has retired
    ///
    /// Returns immediately when no transfer is in flight.
    fn wait_transfer_complete(&mut self) -> Result<(), Self::Error>;
}
