//! The EPS map: a dense grid of 5-minute slots over a configured window.
//!
//! Mirrors the original `epsmap` module closely: `reserve_exact`'s
//! backward walk that tolerates (but flags) overlap, `reserve_fixed`'s
//! backward walk that skips occupied slots and flags insufficiency,
//! `reserve`'s forward single-pass cursor, and `end_of_day_adjusted`'s
//! snap-then-offset logic.

use formalizer_core::{day_start_time, Config, NodeId, DAY};

const SLOT_SECONDS: i64 = 300;

/// Per-Node diagnostic flags recorded by the EPS passes, grounded on
/// `EPS_flags` in `epsmap.hpp`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpsFlags {
    bits: u8,
}

impl EpsFlags {
    pub const OVERLAP: u8 = 0b0000_0001;
    pub const INSUFFICIENT: u8 = 0b0000_0010;
    pub const TREAT_GROUPABLE: u8 = 0b0000_0100;
    pub const EXACT: u8 = 0b0000_1000;
    pub const FIXED: u8 = 0b0001_0000;
    pub const EPS_GROUP_MEMBER: u8 = 0b0010_0000;
    pub const PERIODIC_LT_YEAR: u8 = 0b0100_0000;

    pub const fn new() -> Self {
        EpsFlags { bits: 0 }
    }

    pub fn set(&mut self, flag: u8) {
        self.bits |= flag;
    }

    pub const fn is_set(self, flag: u8) -> bool {
        self.bits & flag != 0
    }

    pub const fn overlap(self) -> bool {
        self.is_set(Self::OVERLAP)
    }

    pub const fn insufficient(self) -> bool {
        self.is_set(Self::INSUFFICIENT)
    }

    pub const fn treat_groupable(self) -> bool {
        self.is_set(Self::TREAT_GROUPABLE)
    }
}

/// A contiguous grid of 5-minute slots spanning `[first_slot, t_beyond)`,
/// each holding at most one Node (an overlap flag, tracked by the
/// caller, is the only exception).
pub struct EpsMap {
    first_slot: i64,
    t_beyond: i64,
    slots_per_chunk: u32,
    slots: Vec<Option<NodeId>>,
    next_slot_idx: usize,
    overrun_cursor: i64,
}

impl EpsMap {
    /// Build a map over `days` days starting strictly after `t_start`, with
    /// `chunk_minutes`-minute reservation chunks.
    pub fn new(t_start: i64, days: u32, chunk_minutes: u32, tz_offset_hours: i32) -> Self {
        let first_slot = ((t_start.div_euclid(SLOT_SECONDS)) + 1) * SLOT_SECONDS;
        let window_start_day = day_start_time(t_start, tz_offset_hours);
        let t_beyond = window_start_day + i64::from(days) * DAY;
        let num_slots = if t_beyond > first_slot {
            ((t_beyond - first_slot) / SLOT_SECONDS) as usize
        } else {
            0
        };
        EpsMap {
            first_slot,
            t_beyond,
            slots_per_chunk: (chunk_minutes / 5).max(1),
            slots: vec![None; num_slots],
            next_slot_idx: 0,
            overrun_cursor: t_beyond,
        }
    }

    pub const fn t_beyond(&self) -> i64 {
        self.t_beyond
    }

    fn slot_time(&self, idx: usize) -> i64 {
        self.first_slot + idx as i64 * SLOT_SECONDS
    }

    /// The index of the first slot whose time is `>= td` (a lower bound),
    /// clamped to the map's bounds.
    fn lower_bound_index(&self, td: i64) -> usize {
        if td <= self.first_slot {
            return 0;
        }
        let diff = td - self.first_slot;
        let idx = diff.div_ceil(SLOT_SECONDS);
        (idx as usize).min(self.slots.len())
    }

    /// Reserve `chunks` chunks backward from (just before) `td`. A slot
    /// already occupied by another Node is walked over — not
    /// overwritten — and sets the returned overlap flag; the walk still
    /// consumes that slot against the required count, matching
    /// `EPS_map::reserve_exact`.
    pub fn reserve_exact(&mut self, node: NodeId, chunks: u32, td: i64) -> bool {
        let required = (chunks * self.slots_per_chunk) as usize;
        let mut overlap = false;
        let mut idx = self.lower_bound_index(td);
        for _ in 0..required {
            if idx == 0 {
                break;
            }
            idx -= 1;
            match self.slots[idx] {
                Some(_) => overlap = true,
                None => self.slots[idx] = Some(node),
            }
        }
        if overlap {
            tracing::warn!(node = %node, td, "reserve_exact overlapped another node's slots");
        }
        overlap
    }

    /// Reserve `chunks` chunks backward from `td`, skipping already
    /// occupied slots (never flagged as overlap) and filling only free
    /// ones. Returns `true` (insufficient) if the window start is reached
    /// before the requirement is met, matching `EPS_map::reserve_fixed`.
    pub fn reserve_fixed(&mut self, node: NodeId, chunks: u32, td: i64) -> bool {
        let mut remaining = (chunks * self.slots_per_chunk) as usize;
        let mut idx = self.lower_bound_index(td);
        while remaining > 0 && idx > 0 {
            idx -= 1;
            if self.slots[idx].is_none() {
                self.slots[idx] = Some(node);
                remaining -= 1;
            }
        }
        let insufficient = remaining > 0;
        if insufficient {
            tracing::warn!(node = %node, td, remaining, "reserve_fixed ran out of room before window start");
        }
        insufficient
    }

    /// Reserve `chunks` chunks forward from the map's persistent cursor,
    /// filling only free slots and never re-examining earlier slots
    /// across calls (`EPS_map::reserve`'s "avoid checking slots more than
    /// once"). Returns the time of the last slot filled, or `None` if the
    /// map is exhausted before the requirement is met.
    pub fn reserve(&mut self, node: NodeId, chunks: u32) -> Option<i64> {
        let mut remaining = (chunks * self.slots_per_chunk) as usize;
        let mut last_filled = None;
        while remaining > 0 {
            if self.next_slot_idx >= self.slots.len() {
                tracing::debug!(node = %node, remaining, "reserve exhausted the map before placing all chunks");
                return None;
            }
            if self.slots[self.next_slot_idx].is_none() {
                self.slots[self.next_slot_idx] = Some(node);
                last_filled = Some(self.next_slot_idx);
                remaining -= 1;
            }
            self.next_slot_idx += 1;
        }
        last_filled.map(|idx| self.slot_time(idx))
    }

    /// Advance the overrun cursor by `config.pack_interval_beyond_secs` and
    /// return its new value, used to assign target dates to movable-group
    /// overruns in the third scheduling pass.
    pub fn advance_overrun(&mut self, config: &Config) -> i64 {
        self.overrun_cursor += config.pack_interval_beyond_secs;
        self.overrun_cursor
    }

    /// Snap `t_raw` forward to the configured end-of-day time, then offset
    /// forward by `eps_group_offset_mins` if it would collide with
    /// `previous_group_td`, matching `EPS_map::end_of_day_adjusted`.
    pub fn end_of_day_adjust(t_raw: i64, config: &Config, urgent: bool, previous_group_td: i64) -> i64 {
        let snap_secs = i64::from(if urgent {
            config.doearlier_endofday_secs
        } else {
            config.dolater_endofday_secs
        });
        let day_start = day_start_time(t_raw, config.timezone_offset_hours);
        let mut td_new = day_start + snap_secs;
        if t_raw > td_new {
            td_new += DAY;
        }
        if td_new <= previous_group_td {
            td_new += i64::from(config.eps_group_offset_mins) * 60;
        }
        td_new
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formalizer_core::NodeId;
    use pretty_assertions::assert_eq;

    fn nid(minor: u8) -> NodeId {
        NodeId::new(2024, 1, 1, 0, 0, 0, minor).unwrap()
    }

    #[test]
    fn first_slot_is_strictly_after_t_start_and_slot_aligned() {
        let map = EpsMap::new(1_000, 1, 20, 0);
        assert!(map.first_slot > 1_000);
        assert_eq!(map.first_slot % SLOT_SECONDS, 0);
    }

    #[test]
    fn reserve_exact_tolerates_overlap_without_overwriting() {
        let mut map = EpsMap::new(0, 1, 20, 0);
        let a = nid(1);
        let b = nid(2);
        let td = map.first_slot + 3600; // one hour in
        let overlap_a = map.reserve_exact(a, 1, td); // 20 min = 4 slots
        assert!(!overlap_a);
        // B overlaps the same region.
        let overlap_b = map.reserve_exact(b, 1, td);
        assert!(overlap_b);
    }

    #[test]
    fn reserve_fixed_skips_occupied_and_flags_insufficient_at_window_start() {
        let mut map = EpsMap::new(0, 1, 20, 0);
        let a = nid(1);
        // Reserve almost the entire map from the front end so little room
        // remains before window start.
        let near_start = map.first_slot + SLOT_SECONDS * 2;
        let insufficient = map.reserve_fixed(a, 1, near_start); // needs 4 slots, only ~2 available
        assert!(insufficient);
    }

    #[test]
    fn reserve_forward_cursor_advances_monotonically() {
        let mut map = EpsMap::new(0, 1, 20, 0);
        let a = nid(1);
        let b = nid(2);
        let first = map.reserve(a, 1).unwrap();
        let second = map.reserve(b, 1).unwrap();
        assert!(second > first);
    }

    #[test]
    fn reserve_forward_returns_none_when_exhausted() {
        let mut map = EpsMap::new(0, 1, 1440, 0); // one giant chunk = whole day
        let a = nid(1);
        let b = nid(2);
        assert!(map.reserve(a, 1).is_some());
        assert!(map.reserve(b, 1).is_none());
    }

    #[test]
    fn end_of_day_adjust_offsets_on_collision() {
        let config = Config {
            dolater_endofday_secs: 22 * 3600,
            eps_group_offset_mins: 1,
            ..Config::default()
        };
        let t_raw = 1_700_000_000;
        let first = EpsMap::end_of_day_adjust(t_raw, &config, false, i64::MIN);
        let second = EpsMap::end_of_day_adjust(t_raw, &config, false, first);
        assert_eq!(second, first + 60);
    }
}
