//! The day-packing scheduler: three placement strategies (exact, fixed,
//! variable) over a graph assumed already consistent, returning a
//! result struct rather than mutating in place. The grid itself (a
//! dense `Vec<Option<NodeId>>` indexed by minute) is the
//! minute-resolution analogue of `formalizer_eps::EpsMap`'s 5-minute
//! slot grid.

use std::collections::HashMap;

use formalizer_core::{day_start_time, effective_targetdate, Config, GraphStore, NodeId, TdProperty, Warning};

/// Per-Node diagnostic flags recorded while packing (mirrors
/// `formalizer_eps::EpsFlags`'s bitmask shape).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackFlags {
    bits: u8,
}

impl PackFlags {
    pub const OVERLAP: u8 = 0b0000_0001;
    pub const INSUFFICIENT: u8 = 0b0000_0010;

    pub const fn new() -> Self {
        PackFlags { bits: 0 }
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
}

/// The three exit codes a day-packing run can report. Distinct from
/// `formalizer_core::ExitCode`'s wider taxonomy:
/// `MissingData` here is only ever produced by a caller that could not
/// obtain a `GraphStore` at all — `run` below, which is always handed one,
/// never returns it itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackStatus {
    Ok,
    InsufficientTime,
    MissingData,
}

/// A dense, minute-resolution schedule grid spanning `[grid_start,
/// grid_start + minutes.len() * 60)`.
#[derive(Debug, Clone)]
pub struct PackGrid {
    grid_start: i64,
    minutes: Vec<Option<NodeId>>,
}

impl PackGrid {
    fn new(grid_start: i64, total_minutes: usize) -> Self {
        PackGrid {
            grid_start,
            minutes: vec![None; total_minutes],
        }
    }

    pub const fn grid_start(&self) -> i64 {
        self.grid_start
    }

    pub fn len(&self) -> usize {
        self.minutes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
    }

    pub fn minute_time(&self, idx: usize) -> i64 {
        self.grid_start + idx as i64 * 60
    }

    /// The minute index covering `t`, clamped to `[0, len]` (an index equal
    /// to `len` means "at or beyond the grid's end").
    fn index_for(&self, t: i64) -> usize {
        if t <= self.grid_start {
            return 0;
        }
        (((t - self.grid_start) / 60) as usize).min(self.minutes.len())
    }

    fn is_free_range(&self, start: usize, len: usize) -> bool {
        start + len <= self.minutes.len() && self.minutes[start..start + len].iter().all(Option::is_none)
    }

    fn any_occupied(&self, start: usize, len: usize) -> bool {
        let end = (start + len).min(self.minutes.len());
        start < end && self.minutes[start..end].iter().any(Option::is_some)
    }

    fn fill_range(&mut self, node: NodeId, start: usize, len: usize) {
        let end = (start + len).min(self.minutes.len());
        for slot in &mut self.minutes[start..end] {
            if slot.is_none() {
                *slot = Some(node);
            }
        }
    }

    fn extend_by_minutes(&mut self, extra: usize) {
        self.minutes.resize(self.minutes.len() + extra, None);
    }

    /// Every `(start_time, node)` pair marking the start of a contiguous
    /// run assigned to one Node, in grid order. Used for rendering and for
    /// the "filled minutes" testable property.
    pub fn assignments(&self) -> Vec<(i64, NodeId)> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < self.minutes.len() {
            if let Some(node) = self.minutes[i] {
                out.push((self.minute_time(i), node));
                while i < self.minutes.len() && self.minutes[i] == Some(node) {
                    i += 1;
                }
            } else {
                i += 1;
            }
        }
        out
    }

    pub fn filled_minute_count(&self) -> usize {
        self.minutes.iter().filter(|s| s.is_some()).count()
    }
}

/// The outcome of a day-packing run.
#[derive(Debug, Clone)]
pub struct PackResult {
    pub grid: PackGrid,
    pub flags: HashMap<NodeId, PackFlags>,
    pub status: PackStatus,
    pub warnings: Vec<Warning>,
}

enum PackCategory {
    Exact,
    Fixed,
    Variable,
}

fn categorize(own: TdProperty, origin: TdProperty) -> Option<PackCategory> {
    match own {
        TdProperty::Exact => Some(PackCategory::Exact),
        TdProperty::Fixed => Some(PackCategory::Fixed),
        TdProperty::Variable | TdProperty::Unspecified => Some(PackCategory::Variable),
        TdProperty::Inherit => match origin {
            TdProperty::Fixed | TdProperty::Exact => Some(PackCategory::Fixed),
            TdProperty::Variable | TdProperty::Unspecified => Some(PackCategory::Variable),
            TdProperty::Inherit => None,
        },
    }
}

struct Candidate {
    id: NodeId,
    category: PackCategory,
    eff_td: i64,
    total_minutes: usize,
    remaining_minutes: usize,
    partially_complete: bool,
}

fn minutes_for(effort_secs: u64, fraction: f64) -> usize {
    let minutes = (effort_secs as f64 / 60.0) * fraction;
    if minutes <= 0.0 {
        0
    } else {
        minutes.ceil() as usize
    }
}

/// Emit a `Warning::RepeatingTooTight` for every repeating Node whose
/// remaining effort does not fit within the interval until its next
/// occurrence, gated on
/// `config.warn_repeating_too_tight`. Mirrors
/// `formalizer_eps::scheduler::check_repeating_tightness`, against
/// minute-granularity effort rather than chunk counts.
fn check_repeating_tightness(graph: &GraphStore, config: &Config) -> Vec<Warning> {
    let mut out = Vec::new();
    for node in graph.nodes() {
        if node.is_complete() || !node.repeats {
            continue;
        }
        let Some(td) = node.target_date else { continue };
        let fraction_remaining = if node.completion_ratio < 0.0 {
            1.0
        } else {
            1.0 - node.completion_ratio
        };
        let remaining_minutes = minutes_for(node.effort_secs, fraction_remaining);
        if remaining_minutes == 0 {
            continue;
        }
        let required_secs = remaining_minutes as i64 * 60;
        let Ok(next) = formalizer_core::add_to_date(td, node.td_pattern, node.td_every) else {
            continue;
        };
        let interval_secs = next - td;
        if required_secs > interval_secs {
            out.push(Warning::RepeatingTooTight {
                node: node.id,
                required_secs,
                interval_secs,
            });
        }
    }
    out
}

fn collect_candidates(graph: &GraphStore) -> Vec<Candidate> {
    let mut out = Vec::new();
    for node in graph.nodes() {
        if node.is_complete() {
            continue;
        }
        let fraction_remaining = if node.completion_ratio < 0.0 {
            1.0
        } else {
            1.0 - node.completion_ratio
        };
        let remaining_minutes = minutes_for(node.effort_secs, fraction_remaining);
        if remaining_minutes == 0 {
            continue;
        }
        let eff = effective_targetdate(graph, node.id);
        if eff.epoch == formalizer_core::T_MAX {
            continue;
        }
        let origin_property = graph
            .node_by_id(eff.origin)
            .map_or(TdProperty::Unspecified, |n| n.td_property);
        let Some(category) = categorize(node.td_property, origin_property) else {
            continue;
        };
        out.push(Candidate {
            id: node.id,
            category,
            eff_td: eff.epoch,
            total_minutes: minutes_for(node.effort_secs, 1.0),
            remaining_minutes,
            partially_complete: node.completion_ratio > 0.0,
        });
    }
    out
}

/// Place `candidate`'s exact window: the window ends at its own
/// effective target date; if partially
/// complete and `now` has passed the window's start, the remaining block
/// shifts to the end of the window instead of the start. The start is
/// clamped forward to `now` if it would otherwise precede it.
fn place_exact(grid: &mut PackGrid, now_idx: usize, c: &Candidate, flags: &mut HashMap<NodeId, PackFlags>) {
    let window_end = grid.index_for(c.eff_td);
    let window_start = window_end.saturating_sub(c.total_minutes);
    let mut start = if c.partially_complete && now_idx > window_start {
        window_end.saturating_sub(c.remaining_minutes)
    } else {
        window_start
    };
    if start < now_idx {
        start = now_idx;
    }
    let mut f = PackFlags::new();
    if grid.any_occupied(start, c.remaining_minutes) {
        f.set(PackFlags::OVERLAP);
        tracing::warn!(node = %c.id, "exact node's window overlaps another node's placement");
    }
    grid.fill_range(c.id, start, c.remaining_minutes);
    flags.insert(c.id, f);
}

/// Backward min-block placement for the `Fixed` strategy: starting
/// from the latest allowed minute, repeatedly try a block of
/// `min_block` (or the remainder, if smaller); on success the block is
/// filled and the walk continues from its start; on failure the cursor
/// steps back by one minute and retries.
fn place_fixed(
    grid: &mut PackGrid,
    now_idx: usize,
    min_block: usize,
    c: &Candidate,
    flags: &mut HashMap<NodeId, PackFlags>,
) {
    let mut cursor = grid.index_for(c.eff_td);
    let mut remaining = c.remaining_minutes;
    let mut f = PackFlags::new();
    while remaining > 0 {
        let block = min_block.min(remaining);
        if cursor < now_idx + block {
            f.set(PackFlags::INSUFFICIENT);
            tracing::warn!(node = %c.id, remaining, "fixed node could not fit a block before its deadline");
            break;
        }
        let start = cursor - block;
        if grid.is_free_range(start, block) {
            grid.fill_range(c.id, start, block);
            remaining -= block;
            cursor = start;
        } else {
            cursor -= 1;
        }
    }
    flags.insert(c.id, f);
}

/// Forward min-block placement for the `Variable` strategy: the same
/// min-block-available-then-fill logic as `place_fixed`, walking
/// forward from `now` instead of backward from a deadline. Extends `grid`
/// in `topup_minutes`-sized increments (capped at `max_topup_minutes`
/// beyond the horizon) when the current window is exhausted before the
/// requirement is met.
fn place_variable(
    grid: &mut PackGrid,
    now_idx: usize,
    min_block: usize,
    topup_minutes: usize,
    max_topup_minutes: usize,
    c: &Candidate,
    flags: &mut HashMap<NodeId, PackFlags>,
) -> bool {
    let mut cursor = now_idx;
    let mut remaining = c.remaining_minutes;
    let mut topped_up = 0usize;
    let mut f = PackFlags::new();
    let mut insufficient = false;
    while remaining > 0 {
        let block = min_block.min(remaining);
        if cursor + block > grid.len() {
            if topup_minutes == 0 || topped_up >= max_topup_minutes {
                insufficient = true;
                f.set(PackFlags::INSUFFICIENT);
                tracing::warn!(node = %c.id, remaining, "variable node did not fit within horizon plus top-up");
                break;
            }
            grid.extend_by_minutes(topup_minutes);
            topped_up += topup_minutes;
            tracing::warn!(node = %c.id, topped_up_minutes = topped_up, "topped up horizon beyond initial window");
            continue;
        }
        if grid.is_free_range(cursor, block) {
            grid.fill_range(c.id, cursor, block);
            remaining -= block;
            cursor += block;
        } else {
            cursor += 1;
        }
    }
    flags.insert(c.id, f);
    insufficient
}

/// Run the day-packing scheduler over every incomplete Node with minutes
/// remaining in `graph`, building a grid over `config.horizon_days` days
/// starting at the local midnight containing `now`.
pub fn run(graph: &GraphStore, config: &Config, now: i64) -> PackResult {
    let grid_start = day_start_time(now, config.timezone_offset_hours);
    let horizon_minutes = config.horizon_days as usize * 24 * 60;
    let mut grid = PackGrid::new(grid_start, horizon_minutes);
    let now_idx = grid.index_for(now);

    let mut candidates = collect_candidates(graph);
    candidates.sort_by(|a, b| a.eff_td.cmp(&b.eff_td).then(a.id.cmp(&b.id)));

    let mut flags: HashMap<NodeId, PackFlags> = HashMap::new();

    for c in candidates.iter().filter(|c| matches!(c.category, PackCategory::Exact)) {
        place_exact(&mut grid, now_idx, c, &mut flags);
    }

    let mut fixed: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| matches!(c.category, PackCategory::Fixed))
        .collect();
    fixed.sort_by(|a, b| b.eff_td.cmp(&a.eff_td).then(a.id.cmp(&b.id)));
    for c in fixed {
        place_fixed(&mut grid, now_idx, config.min_block_size_minutes as usize, c, &mut flags);
    }

    let topup_minutes = config.fetch_days_beyond_t_limit as usize * 24 * 60;
    let max_topup_minutes = Config::MAX_TOPUP_DAYS as usize * 24 * 60;
    let mut any_insufficient = false;
    let variable: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| matches!(c.category, PackCategory::Variable))
        .collect();
    for c in variable {
        let insufficient = place_variable(
            &mut grid,
            now_idx,
            config.min_block_size_minutes as usize,
            topup_minutes,
            max_topup_minutes,
            c,
            &mut flags,
        );
        any_insufficient |= insufficient;
    }

    let status = if any_insufficient {
        PackStatus::InsufficientTime
    } else {
        PackStatus::Ok
    };

    let warnings = if config.warn_repeating_too_tight {
        check_repeating_tightness(graph, config)
    } else {
        Vec::new()
    };

    PackResult {
        grid,
        flags,
        status,
        warnings,
    }
}
