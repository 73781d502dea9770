//! Datagram transport abstraction
//!
//! Mirrors a UDP socket used in polling mode: check for a pending datagram,
//! read it piecewise, discard whatever is left.

/// Non-blocking datagram receiver
///
/// The network interface is already up when a source is handed to the
/// receiver; sources never manage reconnection.
pub trait DatagramSource {
    /// Error type for receive operations
    type Error;

    /// Make the next pending datagram current, if any
    ///
    /// Returns `Ok(Some(len))` with the datagram length, or `Ok(None)` when
    /// nothing is pending. Any unread remainder of the previous datagram is
    /// discarded. Never blocks.
    fn poll_datagram(&mut self) -> Result<Option<usize>, Self::Error>;

    /// Read up to `buf.len()` bytes of the current datagram
    ///
    /// Returns the number of bytes copied; fewer than requested means the
    /// datagram ran out.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Drop the unread remainder of the current datagram
    fn discard(&mut self);
}
