//! Slot storage and ownership handles
//!
//! A slot's `state` is the only synchronization between producer and
//! consumer. Whoever moves a slot into `Filling` or `Displaying` with a
//! compare-and-swap holds exclusive access to its metadata and payload until
//! it stores the next state with `Release`; the other side observes that
//! store with `Acquire` before touching the cells.
//!
//! ```text
//!  Free ──acquire_free──▶ Filling ──commit──▶ Ready ──select──▶ Displaying
//!   ▲                        │                                      │
//!   └────────abort───────────┘                                      │
//!   └──────────────────────────release──────────────────────────────┘
//! ```

use core::cell::UnsafeCell;
use core::sync::atomic::Ordering;

use embassy_sync::waitqueue::AtomicWaker;
use portable_atomic::{AtomicU32, AtomicU8};
use stria_protocol::{BandHeader, ColorMode, Resolution};

use crate::scale::DstBand;

/// Lifecycle state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SlotState {
    /// Available to the producer
    Free = 0,
    /// Claimed by the producer, payload being written
    Filling = 1,
    /// Complete band waiting for the consumer
    Ready = 2,
    /// Claimed by the consumer, payload being copied out
    Displaying = 3,
}

impl SlotState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SlotState::Filling,
            2 => SlotState::Ready,
            3 => SlotState::Displaying,
            _ => SlotState::Free,
        }
    }
}

/// What the payload buffer holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadLayout {
    /// The band's raw wire payload
    Raw,
    /// Output-raster rows, already converted and scaled
    Normalized(DstBand),
}

/// Metadata committed alongside the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotMeta {
    pub header: BandHeader,
    pub layout: PayloadLayout,
}

impl SlotMeta {
    const EMPTY: Self = Self {
        header: BandHeader {
            frame_id: 0,
            y_start: 0,
            resolution: Resolution::Side240,
            color_mode: ColorMode::Rgb565,
            line_count: 1,
        },
        layout: PayloadLayout::Raw,
    };
}

pub(crate) struct Slot<const BYTES: usize> {
    state: AtomicU8,
    /// `frame_id << 16 | y_start`, readable without owning the slot
    order: AtomicU32,
    meta: UnsafeCell<SlotMeta>,
    payload: UnsafeCell<[u8; BYTES]>,
}

// SAFETY: the cells are only accessed by the holder of a `FillingSlot` or
// `DisplayingSlot`, and at most one such handle exists per slot because each
// is created by a successful compare-and-swap on `state`.
unsafe impl<const BYTES: usize> Sync for Slot<BYTES> {}

impl<const BYTES: usize> Slot<BYTES> {
    pub(crate) const fn new() -> Self {
        Self {
            state: AtomicU8::new(SlotState::Free as u8),
            order: AtomicU32::new(0),
            meta: UnsafeCell::new(SlotMeta::EMPTY),
            payload: UnsafeCell::new([0; BYTES]),
        }
    }

    pub(crate) fn state(&self) -> SlotState {
        SlotState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// `(frame_id, y_start)` of the last committed band
    ///
    /// Only meaningful while the slot is `Ready`; a stale value is harmless
    /// because claiming still goes through `claim_ready`.
    pub(crate) fn order(&self) -> (u16, u16) {
        let packed = self.order.load(Ordering::Relaxed);
        ((packed >> 16) as u16, packed as u16)
    }

    fn transition(&self, from: SlotState, to: SlotState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    pub(crate) fn claim_free<'a>(
        &'a self,
        index: usize,
        waker: &'a AtomicWaker,
    ) -> Option<FillingSlot<'a, BYTES>> {
        self.transition(SlotState::Free, SlotState::Filling)
            .then(|| FillingSlot {
                slot: self,
                index,
                waker,
            })
    }

    pub(crate) fn claim_ready(&self, index: usize) -> Option<DisplayingSlot<'_, BYTES>> {
        self.transition(SlotState::Ready, SlotState::Displaying)
            .then(|| DisplayingSlot { slot: self, index })
    }
}

/// Producer-owned slot (`Filling`)
///
/// Dropping the handle without committing aborts it back to `Free`.
#[must_use]
pub struct FillingSlot<'a, const BYTES: usize> {
    slot: &'a Slot<BYTES>,
    index: usize,
    waker: &'a AtomicWaker,
}

impl<'a, const BYTES: usize> FillingSlot<'a, BYTES> {
    /// Pool index of the slot
    pub fn index(&self) -> usize {
        self.index
    }

    /// Writable payload buffer
    pub fn payload_mut(&mut self) -> &mut [u8; BYTES] {
        // SAFETY: state is Filling and this handle is its only owner.
        unsafe { &mut *self.slot.payload.get() }
    }

    /// Publish the slot as `Ready`
    ///
    /// The payload must already hold everything `meta` describes.
    pub fn commit(self, meta: SlotMeta) {
        // SAFETY: state is Filling and this handle is its only owner.
        unsafe { *self.slot.meta.get() = meta };
        let order = ((meta.header.frame_id as u32) << 16) | meta.header.y_start as u32;
        self.slot.order.store(order, Ordering::Relaxed);
        self.slot
            .state
            .store(SlotState::Ready as u8, Ordering::Release);
        self.waker.wake();
        core::mem::forget(self);
    }

    /// Return the slot to `Free` without producing output
    pub fn abort(self) {
        // Drop does the work
    }
}

impl<const BYTES: usize> Drop for FillingSlot<'_, BYTES> {
    fn drop(&mut self) {
        self.slot
            .state
            .store(SlotState::Free as u8, Ordering::Release);
    }
}

/// Consumer-owned slot (`Displaying`)
///
/// Dropping the handle releases it back to `Free`.
#[must_use]
pub struct DisplayingSlot<'a, const BYTES: usize> {
    slot: &'a Slot<BYTES>,
    index: usize,
}

impl<'a, const BYTES: usize> DisplayingSlot<'a, BYTES> {
    /// Pool index of the slot
    pub fn index(&self) -> usize {
        self.index
    }

    /// Metadata written by the producer
    pub fn meta(&self) -> &SlotMeta {
        // SAFETY: state is Displaying; only this handle reads the cell and
        // the producer's writes happened before its Release store of Ready.
        unsafe { &*self.slot.meta.get() }
    }

    /// Payload written by the producer
    pub fn payload(&self) -> &[u8; BYTES] {
        // SAFETY: as for `meta`.
        unsafe { &*self.slot.payload.get() }
    }

    /// Hand the slot back to the producer
    ///
    /// Call once the payload has been copied out; the display transfer does
    /// not need to have completed.
    pub fn release(self) {
        // Drop does the work
    }
}

impl<const BYTES: usize> Drop for DisplayingSlot<'_, BYTES> {
    fn drop(&mut self) {
        self.slot
            .state
            .store(SlotState::Free as u8, Ordering::Release);
    }
}
