//! Frame selection among ready slots
//!
//! The datagram transport reorders bands. The weighted policy approximates
//! top-to-bottom order within the newest frame by draining the slot with the
//! smallest `y_start + weight * frame_id`. It is a heuristic: `frame_id`
//! wraps at `u16::MAX` and arbitrary delay patterns can still defeat it.

use crate::pool::{DisplayingSlot, SlotPool, SlotState};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Weight of `frame_id` in the default policy
pub const DEFAULT_FRAME_WEIGHT: u16 = 2;

/// Rule for picking the next slot to drain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SelectionPolicy {
    /// Lowest-index ready slot
    FirstReady,
    /// Smallest `y_start + weight * frame_id`, ties to the lowest index
    Weighted { weight: u16 },
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::Weighted {
            weight: DEFAULT_FRAME_WEIGHT,
        }
    }
}

impl SelectionPolicy {
    /// Ordering key of a band; smaller drains first
    pub fn key(&self, frame_id: u16, y_start: u16) -> u32 {
        match self {
            SelectionPolicy::FirstReady => 0,
            SelectionPolicy::Weighted { weight } => {
                y_start as u32 + *weight as u32 * frame_id as u32
            }
        }
    }
}

impl<const N: usize, const BYTES: usize> SlotPool<N, BYTES> {
    /// Claim the ready slot `policy` ranks first, moving it to `Displaying`
    ///
    /// Returns `None` when no slot is ready. The choice depends only on the
    /// slot states and committed headers, so it is deterministic for a given
    /// pool snapshot.
    pub fn select_next_ready(&self, policy: SelectionPolicy) -> Option<DisplayingSlot<'_, BYTES>> {
        loop {
            let mut best: Option<(u32, usize)> = None;
            for (index, slot) in self.slots.iter().enumerate() {
                if slot.state() != SlotState::Ready {
                    continue;
                }
                let (frame_id, y_start) = slot.order();
                let key = policy.key(frame_id, y_start);
                // Strict comparison keeps the lowest index on ties
                if best.map_or(true, |(best_key, _)| key < best_key) {
                    best = Some((key, index));
                }
                if policy == SelectionPolicy::FirstReady {
                    break;
                }
            }

            let (_, index) = best?;
            if let Some(slot) = self.slots[index].claim_ready(index) {
                return Some(slot);
            }
            // Lost the slot to another consumer; rescan
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{PayloadLayout, SlotMeta};
    use stria_protocol::{BandHeader, ColorMode, Resolution};

    fn commit<const N: usize>(pool: &SlotPool<N, 8>, frame_id: u16, y_start: u16) -> usize {
        let slot = pool.acquire_free().unwrap();
        let index = slot.index();
        slot.commit(SlotMeta {
            header: BandHeader::new(frame_id, y_start, Resolution::Side240, ColorMode::Rgb565, 1)
                .unwrap(),
            layout: PayloadLayout::Raw,
        });
        index
    }

    #[test]
    fn test_empty_pool_selects_nothing() {
        let pool = SlotPool::<4, 8>::new();
        assert!(pool.select_next_ready(SelectionPolicy::default()).is_none());
    }

    #[test]
    fn test_first_ready_takes_lowest_index() {
        let pool = SlotPool::<4, 8>::new();
        let _held = pool.acquire_free().unwrap();
        commit(&pool, 9, 100);
        commit(&pool, 1, 0);

        let slot = pool.select_next_ready(SelectionPolicy::FirstReady).unwrap();
        assert_eq!(slot.index(), 1);
    }

    #[test]
    fn test_weighted_minimizes_key() {
        let pool = SlotPool::<4, 8>::new();
        commit(&pool, 10, 0); // 20
        commit(&pool, 5, 12); // 22
        commit(&pool, 5, 0); // 10
        commit(&pool, 6, 4); // 16

        let policy = SelectionPolicy::default();
        let order: Vec<u16> = (0..4)
            .map(|_| pool.select_next_ready(policy).unwrap().meta().header.y_start)
            .collect();
        assert_eq!(order, vec![0, 4, 0, 12]);
    }

    #[test]
    fn test_weighted_tie_takes_lowest_index() {
        let pool = SlotPool::<3, 8>::new();
        commit(&pool, 1, 4); // 6
        commit(&pool, 2, 2); // 6
        commit(&pool, 3, 0); // 6

        let slot = pool.select_next_ready(SelectionPolicy::default()).unwrap();
        assert_eq!(slot.index(), 0);
    }

    #[test]
    fn test_selected_slot_is_displaying() {
        let pool = SlotPool::<2, 8>::new();
        commit(&pool, 1, 0);
        let slot = pool.select_next_ready(SelectionPolicy::default()).unwrap();
        assert_eq!(pool.snapshot(), [SlotState::Displaying, SlotState::Free]);
        assert!(pool.select_next_ready(SelectionPolicy::default()).is_none());
        drop(slot);
    }

    #[test]
    fn test_key_wide_enough_for_extremes() {
        let policy = SelectionPolicy::Weighted { weight: u16::MAX };
        assert_eq!(
            policy.key(u16::MAX, u16::MAX),
            u16::MAX as u32 + u16::MAX as u32 * u16::MAX as u32
        );
    }
}
