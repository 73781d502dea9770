//! Pipeline counters
//!
//! Each rejection cause has its own counter. Pool exhaustion is the only
//! cause counted as `dropped`; short reads are tracked separately.

use core::sync::atomic::Ordering;

use portable_atomic::AtomicU32;

/// Live counters, updated by both contexts
#[derive(Debug, Default)]
pub struct Stats {
    datagrams: AtomicU32,
    malformed: AtomicU32,
    dropped: AtomicU32,
    short_reads: AtomicU32,
    rejected: AtomicU32,
    drawn: AtomicU32,
    sink_errors: AtomicU32,
    read_errors: AtomicU32,
}

/// Point-in-time copy of [`Stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatsSnapshot {
    /// Datagrams received
    pub datagrams: u32,
    /// Headers that failed to decode
    pub malformed: u32,
    /// Bands dropped because no slot was free
    pub dropped: u32,
    /// Payloads shorter than their header announced
    pub short_reads: u32,
    /// Bands that could not be placed in the output raster
    pub rejected: u32,
    /// Bands handed to the display
    pub drawn: u32,
    /// Display sink failures
    pub sink_errors: u32,
    /// Datagrams abandoned on a transport read failure
    pub read_errors: u32,
}

impl Stats {
    pub const fn new() -> Self {
        Self {
            datagrams: AtomicU32::new(0),
            malformed: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            short_reads: AtomicU32::new(0),
            rejected: AtomicU32::new(0),
            drawn: AtomicU32::new(0),
            sink_errors: AtomicU32::new(0),
            read_errors: AtomicU32::new(0),
        }
    }

    pub(crate) fn record_datagram(&self) {
        self.datagrams.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_short_read(&self) {
        self.short_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_drawn(&self) {
        self.drawn.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sink_error(&self) {
        self.sink_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            datagrams: self.datagrams.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            short_reads: self.short_reads.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            drawn: self.drawn.load(Ordering::Relaxed),
            sink_errors: self.sink_errors.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
        }
    }
}
