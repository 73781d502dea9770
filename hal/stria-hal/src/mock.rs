//! In-memory collaborators for host-side runs and tests
//!
//! [`MemorySource`] replays queued datagrams; [`MemoryDisplay`] emulates a
//! panel with a single-transfer DMA engine and rejects any call sequence
//! that would violate the [`DisplaySink`] contract.

use std::collections::VecDeque;

use crate::display::{Area, DisplaySink};
use crate::net::DatagramSource;

/// Datagram source fed from a queue
#[derive(Debug, Default)]
pub struct MemorySource {
    queue: VecDeque<Vec<u8>>,
    current: Vec<u8>,
    pos: usize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a datagram for delivery
    pub fn push(&mut self, datagram: &[u8]) {
        self.queue.push_back(datagram.to_vec());
    }

    /// Number of datagrams not yet polled
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl DatagramSource for MemorySource {
    type Error = core::convert::Infallible;

    fn poll_datagram(&mut self) -> Result<Option<usize>, Self::Error> {
        match self.queue.pop_front() {
            Some(datagram) => {
                self.current = datagram;
                self.pos = 0;
                Ok(Some(self.current.len()))
            }
            None => {
                self.discard();
                Ok(None)
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.current.len() - self.pos);
        buf[..n].copy_from_slice(&self.current[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn discard(&mut self) {
        self.pos = self.current.len();
    }
}

/// Contract violations detected by [`MemoryDisplay`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// `push_async` while a transfer is still in flight
    Busy,
    /// `push_async` or `end_transfer` outside a transaction
    NoTransaction,
    /// Transfer rectangle leaves the panel
    OutOfBounds,
    /// Pixel slice length does not match the rectangle
    LengthMismatch,
}

/// A retired transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub area: Area,
    pub pixels: Vec<u8>,
}

/// Panel emulation with a square RGB565 framebuffer
#[derive(Debug)]
pub struct MemoryDisplay {
    side: u16,
    framebuffer: Vec<u8>,
    in_transaction: bool,
    in_flight: Option<Transfer>,
    transfers: Vec<Transfer>,
}

impl MemoryDisplay {
    pub fn new(side: u16) -> Self {
        Self {
            side,
            framebuffer: vec![0u8; side as usize * side as usize * 2],
            in_transaction: false,
            in_flight: None,
            transfers: Vec::new(),
        }
    }

    /// Transfers that have retired, oldest first
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// True while a pushed transfer has not been waited on
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Panel contents, row-major, two bytes per pixel
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    /// Pixel at (`x`, `y`) in native byte order
    pub fn pixel(&self, x: u16, y: u16) -> u16 {
        let offset = (y as usize * self.side as usize + x as usize) * 2;
        u16::from_ne_bytes([self.framebuffer[offset], self.framebuffer[offset + 1]])
    }

    fn retire(&mut self, transfer: Transfer) {
        let row_bytes = transfer.area.width as usize * 2;
        for row in 0..transfer.area.height as usize {
            let y = transfer.area.y as usize + row;
            let start = (y * self.side as usize + transfer.area.x as usize) * 2;
            self.framebuffer[start..start + row_bytes]
                .copy_from_slice(&transfer.pixels[row * row_bytes..(row + 1) * row_bytes]);
        }
        self.transfers.push(transfer);
    }
}

impl DisplaySink for MemoryDisplay {
    type Error = MockError;

    fn begin_transfer(&mut self) -> Result<(), Self::Error> {
        self.in_transaction = true;
        Ok(())
    }

    fn end_transfer(&mut self) -> Result<(), Self::Error> {
        if !self.in_transaction {
            return Err(MockError::NoTransaction);
        }
        self.in_transaction = false;
        Ok(())
    }

    fn push_async(&mut self, area: Area, pixels: &[u8]) -> Result<(), Self::Error> {
        if !self.in_transaction {
            return Err(MockError::NoTransaction);
        }
        if self.in_flight.is_some() {
            return Err(MockError::Busy);
        }
        if area.x as u32 + area.width as u32 > self.side as u32
            || area.y as u32 + area.height as u32 > self.side as u32
        {
            return Err(MockError::OutOfBounds);
        }
        if pixels.len() != area.pixel_count() * 2 {
            return Err(MockError::LengthMismatch);
        }

        self.in_flight = Some(Transfer {
            area,
            pixels: pixels.to_vec(),
        });
        Ok(())
    }

    fn wait_transfer_complete(&mut self) -> Result<(), Self::Error> {
        if let Some(transfer) = self.in_flight.take() {
            self.retire(transfer);
        }
        Ok(())
    }
}
