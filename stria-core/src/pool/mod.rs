//! Fixed-capacity frame-slot pool
//!
//! The pool is the single point of coordination between the producer and
//! the consumer. It never grows: when every slot is taken,
//! [`SlotPool::acquire_free`] returns `None` and the caller drops the band.

#[allow(unsafe_code)]
mod slot;

pub use slot::{DisplayingSlot, FillingSlot, PayloadLayout, SlotMeta, SlotState};

use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::waitqueue::AtomicWaker;

use crate::select::SelectionPolicy;
use slot::Slot;

/// `N` slots of `BYTES` payload bytes each
pub struct SlotPool<const N: usize, const BYTES: usize> {
    pub(crate) slots: [Slot<BYTES>; N],
    ready: AtomicWaker,
}

impl<const N: usize, const BYTES: usize> Default for SlotPool<N, BYTES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const BYTES: usize> SlotPool<N, BYTES> {
    /// Create a pool with every slot `Free`
    pub const fn new() -> Self {
        Self {
            slots: [const { Slot::new() }; N],
            ready: AtomicWaker::new(),
        }
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Payload bytes per slot
    pub const fn slot_bytes(&self) -> usize {
        BYTES
    }

    /// Claim the lowest-index `Free` slot for filling
    pub fn acquire_free(&self) -> Option<FillingSlot<'_, BYTES>> {
        self.slots
            .iter()
            .enumerate()
            .find_map(|(index, slot)| slot.claim_free(index, &self.ready))
    }

    /// Count of slots that are not `Free`
    pub fn occupancy(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state() != SlotState::Free)
            .count()
    }

    /// State of every slot at one instant (per slot, not globally atomic)
    pub fn snapshot(&self) -> [SlotState; N] {
        core::array::from_fn(|i| self.slots[i].state())
    }

    /// Wait until a slot is `Ready` and claim it according to `policy`
    ///
    /// Only one task may wait at a time; a second waiter displaces the first
    /// one's waker.
    pub async fn wait_ready(&self, policy: SelectionPolicy) -> DisplayingSlot<'_, BYTES> {
        poll_fn(|cx| {
            if let Some(slot) = self.select_next_ready(policy) {
                return Poll::Ready(slot);
            }
            self.ready.register(cx.waker());
            // A commit may have landed between the scan and the register
            match self.select_next_ready(policy) {
                Some(slot) => Poll::Ready(slot),
                None => Poll::Pending,
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stria_protocol::{BandHeader, ColorMode, Resolution};

    type Pool = SlotPool<3, 64>;

    fn meta(frame_id: u16, y_start: u16) -> SlotMeta {
        SlotMeta {
            header: BandHeader::new(frame_id, y_start, Resolution::Side240, ColorMode::Rgb565, 1)
                .unwrap(),
            layout: PayloadLayout::Raw,
        }
    }

    #[test]
    fn test_new_pool_is_free() {
        let pool = Pool::new();
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.slot_bytes(), 64);
        assert_eq!(pool.occupancy(), 0);
        assert_eq!(pool.snapshot(), [SlotState::Free; 3]);
    }

    #[test]
    fn test_acquire_until_exhausted() {
        let pool = Pool::new();
        let a = pool.acquire_free().unwrap();
        let b = pool.acquire_free().unwrap();
        let c = pool.acquire_free().unwrap();
        assert_eq!((a.index(), b.index(), c.index()), (0, 1, 2));

        assert!(pool.acquire_free().is_none());
        assert_eq!(pool.occupancy(), 3);

        b.abort();
        assert_eq!(pool.occupancy(), 2);
        assert_eq!(pool.acquire_free().map(|s| s.index()), Some(1));
        drop((a, c));
    }

    #[test]
    fn test_full_lifecycle() {
        let pool = Pool::new();

        let mut filling = pool.acquire_free().unwrap();
        filling.payload_mut()[..4].copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(pool.snapshot()[0], SlotState::Filling);
        filling.commit(meta(7, 30));
        assert_eq!(pool.snapshot()[0], SlotState::Ready);

        let displaying = pool.select_next_ready(SelectionPolicy::FirstReady).unwrap();
        assert_eq!(pool.snapshot()[0], SlotState::Displaying);
        assert_eq!(displaying.meta().header.frame_id, 7);
        assert_eq!(&displaying.payload()[..4], &[1, 2, 3, 4]);

        displaying.release();
        assert_eq!(pool.snapshot()[0], SlotState::Free);
    }

    #[test]
    fn test_dropped_handles_return_slots() {
        let pool = Pool::new();
        {
            let _filling = pool.acquire_free().unwrap();
            assert_eq!(pool.occupancy(), 1);
        }
        assert_eq!(pool.occupancy(), 0);

        pool.acquire_free().unwrap().commit(meta(1, 0));
        {
            let _displaying = pool.select_next_ready(SelectionPolicy::FirstReady).unwrap();
        }
        assert_eq!(pool.occupancy(), 0);
    }

    #[test]
    fn test_ready_slot_not_reclaimed_by_producer() {
        let pool = SlotPool::<1, 16>::new();
        pool.acquire_free().unwrap().commit(meta(1, 0));
        assert!(pool.acquire_free().is_none());
    }

    #[test]
    fn test_wait_ready_returns_committed_slot() {
        let pool = Pool::new();
        pool.acquire_free().unwrap().commit(meta(3, 12));

        let slot = embassy_futures::block_on(pool.wait_ready(SelectionPolicy::default()));
        assert_eq!(slot.meta().header.y_start, 12);
    }
}
