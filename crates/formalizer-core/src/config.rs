//! Explicit scheduling configuration, passed into every scheduler call
//! rather than read from process-wide singleton state.
//!
//! Field list mirrors the tunable parameters the original fzupdate tool
//! exposed as command-line switches.

/// Configuration recognized by the EPS map/scheduler and the day-packing
/// scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Work quantum in minutes; the unit EPS reservations are made in.
    pub chunk_minutes: u32,
    /// Multiplier applied when estimating how many days of EPS map to build
    /// per Node considered (capacity-planning hint, not itself a day count).
    pub map_multiplier: u32,
    /// Width in days of the EPS map window built per update pass.
    pub map_days: u32,
    /// Time-of-day (seconds since local midnight) that exact/fixed Nodes
    /// snap to when `endofday_priorities` is enabled and the Node is not
    /// marked urgent.
    pub dolater_endofday_secs: u32,
    /// As above, for Nodes marked urgent. The original tool has no
    /// Node-level selector for this path; `Node::urgent` adds one.
    pub doearlier_endofday_secs: u32,
    /// Whether end-of-day snapping is applied at all.
    pub endofday_priorities: bool,
    /// Minutes added to a snapped end-of-day time that collides with the
    /// previous EPS group's target date, to preserve group ordering.
    pub eps_group_offset_mins: u32,
    /// Whether a variable/unspecified Node's new target date may move
    /// earlier than its prior effective target date.
    pub update_to_earlier_allowed: bool,
    /// Days fetched beyond the configured day-pack horizon when topping
    /// up, applied repeatedly up to the 150-day cap.
    pub fetch_days_beyond_t_limit: u32,
    /// Emit a policy warning when a repeating Node's required chunks do not
    /// fit between successive repeat iterations.
    pub warn_repeating_too_tight: bool,
    /// Fixed offset from UTC, in hours, used for all local-time
    /// computations (day boundaries, end-of-day snapping).
    pub timezone_offset_hours: i32,
    /// Whether movable-group overruns are still assigned target dates
    /// beyond the EPS map window (rather than being marked `insufficient`
    /// and left unplaced).
    pub pack_moveable: bool,
    /// Seconds added to the window boundary per overrun movable group when
    /// `pack_moveable` is enabled.
    pub pack_interval_beyond_secs: i64,
    /// Minimum contiguous block, in minutes, the day-packing scheduler will
    /// place as a single unit.
    pub min_block_size_minutes: u32,
    /// Day-packing horizon, in days, before top-up is attempted.
    pub horizon_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chunk_minutes: 20,
            map_multiplier: 3,
            map_days: 30,
            dolater_endofday_secs: 22 * 3600,
            doearlier_endofday_secs: 18 * 3600,
            endofday_priorities: false,
            eps_group_offset_mins: 1,
            update_to_earlier_allowed: true,
            fetch_days_beyond_t_limit: 15,
            warn_repeating_too_tight: true,
            timezone_offset_hours: 0,
            pack_moveable: true,
            pack_interval_beyond_secs: 15 * 86_400,
            min_block_size_minutes: 20,
            horizon_days: 7,
        }
    }
}

impl Config {
    pub const fn slots_per_chunk(&self) -> u32 {
        self.chunk_minutes / 5
    }

    /// The maximum number of 15-day top-ups the day-packing scheduler may
    /// perform, capped at 150 days total beyond the initial horizon.
    pub const MAX_TOPUP_DAYS: u32 = 150;
}
