//! The three-pass EPS scheduler.
//!
//! Mirrors the original `place_exact`/`place_fixed`/
//! `group_and_place_movable`/`get_eps_update_nodes` pipeline, reshaped
//! into a multi-phase function that returns a structured result (a
//! struct, rather than in-place mutation) plus an accumulated warnings
//! collection.

use std::collections::HashMap;

use formalizer_core::{effective_targetdate, Config, GraphStore, NodeId, TdPattern, TdProperty, Warning, T_MAX};

use crate::map::{EpsFlags, EpsMap};

/// The outcome of one EPS scheduling pass: the proposed new target
/// dates for variable/unspecified Nodes, the diagnostic flags recorded
/// for every Node considered (overlaps, insufficiency), and the
/// accumulated policy warnings (these never abort the run).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpsUpdateResult {
    pub target_dates: Vec<(NodeId, i64)>,
    pub flags: HashMap<NodeId, EpsFlags>,
    pub warnings: Vec<Warning>,
}

/// How many minutes of work remain for a Node: effort minutes scaled by
/// its remaining (non-complete) fraction. A negative `completion_ratio`
/// ("other" special state) is treated as zero complete — the full
/// estimated effort remains.
fn chunks_required(node: &formalizer_core::Node, chunk_minutes: u32) -> u32 {
    if node.is_complete() {
        return 0;
    }
    let fraction_remaining = if node.completion_ratio < 0.0 {
        1.0
    } else {
        1.0 - node.completion_ratio
    };
    let remaining_minutes = (node.effort_secs as f64 / 60.0) * fraction_remaining;
    if remaining_minutes <= 0.0 {
        return 0;
    }
    (remaining_minutes / f64::from(chunk_minutes)).ceil() as u32
}

/// `true` when `pattern`'s declared order is earlier than `Yearly`
/// (`patt_yearly` in the reference enum), used for the
/// `periodic_lt_year` diagnostic flag.
fn pattern_lt_yearly(pattern: TdPattern) -> bool {
    matches!(
        pattern,
        TdPattern::Daily
            | TdPattern::Workdays
            | TdPattern::Weekly
            | TdPattern::Biweekly
            | TdPattern::Monthly
            | TdPattern::EndOfMonthOffset
    )
}

/// Emit a `Warning::RepeatingTooTight` for every repeating Node whose
/// required chunks do not fit within the interval until its next
/// occurrence, gated on `config.warn_repeating_too_tight`.
fn check_repeating_tightness(graph: &GraphStore, config: &Config) -> Vec<Warning> {
    let mut out = Vec::new();
    for node in graph.nodes() {
        if node.is_complete() || !node.repeats {
            continue;
        }
        let Some(td) = node.target_date else { continue };
        let chunks = chunks_required(node, config.chunk_minutes);
        if chunks == 0 {
            continue;
        }
        let required_secs = i64::from(chunks) * i64::from(config.chunk_minutes) * 60;
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

struct Candidate {
    id: NodeId,
    chunks: u32,
    eff_td: i64,
    origin: NodeId,
    origin_property: TdProperty,
    own_property: TdProperty,
    urgent: bool,
}

fn collect_candidates(graph: &GraphStore, config: &Config) -> Vec<Candidate> {
    let mut out = Vec::new();
    for node in graph.nodes() {
        if node.is_complete() {
            continue;
        }
        let chunks = chunks_required(node, config.chunk_minutes);
        if chunks == 0 {
            continue;
        }
        let eff = effective_targetdate(graph, node.id);
        if eff.epoch == T_MAX {
            continue;
        }
        let origin_property = graph
            .node_by_id(eff.origin)
            .map_or(TdProperty::Unspecified, |n| n.td_property);
        out.push(Candidate {
            id: node.id,
            chunks,
            eff_td: eff.epoch,
            origin: eff.origin,
            origin_property,
            own_property: node.td_property,
            urgent: node.urgent,
        });
    }
    out.sort_by(|a, b| a.eff_td.cmp(&b.eff_td).then(a.id.cmp(&b.id)));
    out
}

/// Run the three EPS passes over every incomplete Node with `chunks_req >
/// 0` in `graph`, building a map of `map_days` days starting at `now`.
/// Returns the proposed target-date updates for variable/unspecified
/// Nodes.
pub fn run(graph: &GraphStore, config: &Config, now: i64) -> EpsUpdateResult {
    let mut map = EpsMap::new(now, config.map_days, config.chunk_minutes, config.timezone_offset_hours);
    let candidates = collect_candidates(graph, config);
    let mut flags: HashMap<NodeId, EpsFlags> = HashMap::new();
    let mut group_td_by_node: HashMap<NodeId, i64> = HashMap::new();
    let mut new_td_by_node: HashMap<NodeId, i64> = HashMap::new();

    // Pass 1 — exact. Gates on the Node's own td_property: exactness does
    // not inherit (epsmap.cpp's place_exact checks the Node itself, not
    // its origin).
    for c in &candidates {
        if c.own_property != TdProperty::Exact {
            continue;
        }
        let overlap = map.reserve_exact(c.id, c.chunks, c.eff_td);
        let mut f = EpsFlags::new();
        f.set(EpsFlags::EXACT);
        if overlap {
            f.set(EpsFlags::OVERLAP);
        }
        if pattern_lt_yearly(
            graph
                .node_by_id(c.id)
                .map_or(TdPattern::NonPeriodic, |n| n.td_pattern),
        ) && graph.node_by_id(c.id).is_some_and(|n| n.td_span == 0)
        {
            f.set(EpsFlags::PERIODIC_LT_YEAR);
        }
        flags.insert(c.id, f);
    }

    // Pass 2 — fixed. Gates on the origin's td_property: fixedness does
    // inherit (epsmap.cpp's place_fixed checks the origin), so an
    // inheriting member is marked treat_groupable rather than reserved.
    for c in &candidates {
        if c.origin_property != TdProperty::Fixed {
            continue;
        }
        let mut f = flags.remove(&c.id).unwrap_or_default();
        if c.id == c.origin {
            let insufficient = map.reserve_fixed(c.id, c.chunks, c.eff_td);
            f.set(EpsFlags::FIXED);
            if insufficient {
                f.set(EpsFlags::INSUFFICIENT);
                tracing::warn!(node = %c.id, "fixed node could not reserve enough chunks before window start");
            }
        } else {
            f.set(EpsFlags::TREAT_GROUPABLE);
        }
        if pattern_lt_yearly(
            graph
                .node_by_id(c.id)
                .map_or(TdPattern::NonPeriodic, |n| n.td_pattern),
        ) && graph.node_by_id(c.id).is_some_and(|n| n.td_span == 0)
        {
            f.set(EpsFlags::PERIODIC_LT_YEAR);
        }
        flags.insert(c.id, f);
    }

    // Pass 3 — group and place movable.
    let mut group: Vec<usize> = Vec::new();
    let mut group_td: i64 = i64::MIN;
    let mut previous_group_td = i64::MIN;

    // Every candidate not already placed by pass 1 (own td_property exact)
    // or pass 2's own-origin branch (fixed origin, node is the origin) is
    // eligible for grouping here: Nodes whose origin is variable/
    // unspecified (including those that themselves inherit from one),
    // Nodes inheriting an exact origin (own td_property is inherit, so
    // pass 1 skipped them), and Nodes explicitly marked `treat_groupable`
    // in pass 2 (inheriting a fixed TD from a superior, per
    // `epsmap.cpp`'s `place_fixed`).
    let is_movable = |c: &Candidate, flags: &HashMap<NodeId, EpsFlags>| -> bool {
        matches!(
            c.origin_property,
            TdProperty::Variable | TdProperty::Unspecified | TdProperty::Exact
        ) || flags.get(&c.id).is_some_and(|f| f.treat_groupable())
    };

    let mut group_offset_warnings: Vec<Warning> = Vec::new();

    let mut finalize = |group: &mut Vec<usize>,
                        group_td: i64,
                        map: &mut EpsMap,
                        config: &Config,
                        candidates: &[Candidate],
                        flags: &mut HashMap<NodeId, EpsFlags>,
                        new_td_by_node: &mut HashMap<NodeId, i64>,
                        group_td_by_node: &mut HashMap<NodeId, i64>,
                        previous_group_td: &mut i64,
                        offset_warnings: &mut Vec<Warning>| {
        if group.is_empty() {
            return;
        }
        tracing::debug!(group_td, size = group.len(), "placing movable group");
        let mut last_result = None;
        let any_urgent = group.iter().any(|&i| candidates[i].urgent);
        for &idx in group.iter() {
            let c = &candidates[idx];
            let mut f = flags.remove(&c.id).unwrap_or_default();
            f.set(EpsFlags::EPS_GROUP_MEMBER);
            flags.insert(c.id, f);
            last_result = map.reserve(c.id, c.chunks);
        }
        let final_td = match last_result {
            Some(raw) => {
                if config.endofday_priorities {
                    let adjusted = EpsMap::end_of_day_adjust(raw, config, any_urgent, *previous_group_td);
                    let day_start = formalizer_core::day_start_time(raw, config.timezone_offset_hours);
                    if adjusted - day_start >= formalizer_core::DAY {
                        offset_warnings.push(Warning::GroupOffsetExceedsEndOfDay {
                            node: candidates[group[0]].id,
                            new_td: adjusted,
                        });
                    }
                    adjusted
                } else {
                    raw
                }
            }
            None => {
                if config.pack_moveable {
                    map.advance_overrun(config)
                } else {
                    i64::MIN // sentinel: insufficient, no td assigned
                }
            }
        };
        if last_result.is_none() && !config.pack_moveable {
            for &idx in group.iter() {
                let c = &candidates[idx];
                let mut f = flags.remove(&c.id).unwrap_or_default();
                f.set(EpsFlags::INSUFFICIENT);
                flags.insert(c.id, f);
            }
        } else {
            for &idx in group.iter() {
                let c = &candidates[idx];
                new_td_by_node.insert(c.id, final_td);
                group_td_by_node.insert(c.id, group_td);
            }
            *previous_group_td = final_td;
        }
        group.clear();
    };

    for (idx, c) in candidates.iter().enumerate() {
        if c.own_property == TdProperty::Exact {
            finalize(
                &mut group,
                group_td,
                &mut map,
                config,
                &candidates,
                &mut flags,
                &mut new_td_by_node,
                &mut group_td_by_node,
                &mut previous_group_td,
                &mut group_offset_warnings,
            );
            continue;
        }
        if c.origin_property == TdProperty::Fixed && c.id == c.origin {
            finalize(
                &mut group,
                group_td,
                &mut map,
                config,
                &candidates,
                &mut flags,
                &mut new_td_by_node,
                &mut group_td_by_node,
                &mut previous_group_td,
                &mut group_offset_warnings,
            );
            continue;
        }
        if !is_movable(c, &flags) {
            finalize(
                &mut group,
                group_td,
                &mut map,
                config,
                &candidates,
                &mut flags,
                &mut new_td_by_node,
                &mut group_td_by_node,
                &mut previous_group_td,
                &mut group_offset_warnings,
            );
            continue;
        }
        if !group.is_empty() && c.eff_td != group_td {
            finalize(
                &mut group,
                group_td,
                &mut map,
                config,
                &candidates,
                &mut flags,
                &mut new_td_by_node,
                &mut group_td_by_node,
                &mut previous_group_td,
                &mut group_offset_warnings,
            );
        }
        if group.is_empty() {
            group_td = c.eff_td;
        }
        group.push(idx);
    }
    finalize(
        &mut group,
        group_td,
        &mut map,
        config,
        &candidates,
        &mut flags,
        &mut new_td_by_node,
        &mut group_td_by_node,
        &mut previous_group_td,
        &mut group_offset_warnings,
    );

    let mut target_dates = Vec::new();
    for c in &candidates {
        if !matches!(c.own_property, TdProperty::Variable | TdProperty::Unspecified) {
            continue;
        }
        let Some(&new_td) = new_td_by_node.get(&c.id) else {
            continue;
        };
        let old_group_td = group_td_by_node.get(&c.id).copied().unwrap_or(c.eff_td);
        if config.update_to_earlier_allowed || new_td > old_group_td {
            target_dates.push((c.id, new_td));
        }
    }

    let mut warnings = group_offset_warnings;
    if config.warn_repeating_too_tight {
        warnings.extend(check_repeating_tightness(graph, config));
    }

    EpsUpdateResult {
        target_dates,
        flags,
        warnings,
    }
}

/// Spread every `variable`-property Node whose effective target date
/// equals `t` downward in 2-minute steps so the group dissolves (spec
/// §4.F "Break-group"). Ordering among the group follows Node ID.
pub fn break_group(graph: &GraphStore, t: i64) -> Vec<(NodeId, i64)> {
    let mut members: Vec<NodeId> = graph
        .nodes()
        .filter(|n| n.td_property == TdProperty::Variable)
        .filter(|n| effective_targetdate(graph, n.id).epoch == t)
        .map(|n| n.id)
        .collect();
    members.sort();
    members
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id, t - i as i64 * 120))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use formalizer_core::{Node, TdPattern};
    use pretty_assertions::assert_eq;

    fn nid(minor: u8) -> NodeId {
        NodeId::new(2024, 1, 1, 0, 0, 0, minor).unwrap()
    }

    fn make_node(store: &mut GraphStore, minor: u8, property: TdProperty, td: i64, minutes: u64) -> NodeId {
        let topic = store.register_topic("t");
        let mut n = Node::new(nid(minor), "n");
        n.topics.insert(topic, 1.0);
        n.td_property = property;
        n.target_date = Some(td);
        n.effort_secs = minutes * 60;
        store.add_node(n).unwrap();
        nid(minor)
    }

    #[test]
    fn scenario_exact_placement_flags_overlap_on_second_node() {
        let mut store = GraphStore::new();
        let now = 1_700_000_000;
        let td_a = now + 3600 * 5; // "today 14:00"-ish relative offset
        let td_b = td_a + 1800;
        make_node(&mut store, 1, TdProperty::Exact, td_a, 20);
        make_node(&mut store, 2, TdProperty::Exact, td_b, 40);

        let config = Config::default();
        let result = run(&store, &config, now);
        let flags_a = result.flags.get(&nid(1)).unwrap();
        let flags_b = result.flags.get(&nid(2)).unwrap();
        assert!(flags_a.is_set(EpsFlags::EXACT));
        assert!(flags_b.is_set(EpsFlags::EXACT));
        // B's window overlaps A's.
        assert!(flags_b.overlap());
    }

    #[test]
    fn scenario_movable_grouping_shares_one_new_td() {
        let mut store = GraphStore::new();
        let now = 1_700_000_000;
        let shared_td = now + 3600 * 14; // "23:00"-ish, well beyond now
        make_node(&mut store, 1, TdProperty::Variable, shared_td, 60);
        make_node(&mut store, 2, TdProperty::Variable, shared_td, 60);
        make_node(&mut store, 3, TdProperty::Variable, shared_td, 60);

        let config = Config::default();
        let result = run(&store, &config, now);
        let tds: HashMap<NodeId, i64> = result.target_dates.into_iter().collect();
        let td1 = tds[&nid(1)];
        assert_eq!(td1, tds[&nid(2)]);
        assert_eq!(td1, tds[&nid(3)]);
    }

    #[test]
    fn fixed_node_that_is_its_own_origin_is_placed_via_reserve_fixed() {
        let mut store = GraphStore::new();
        let now = 1_700_000_000;
        let td = now + 3600 * 10;
        make_node(&mut store, 1, TdProperty::Fixed, td, 60);
        let config = Config::default();
        let result = run(&store, &config, now);
        let f = result.flags.get(&nid(1)).unwrap();
        assert!(f.is_set(EpsFlags::FIXED));
    }

    #[test]
    fn output_excludes_fixed_and_exact_property_nodes() {
        let mut store = GraphStore::new();
        let now = 1_700_000_000;
        make_node(&mut store, 1, TdProperty::Exact, now + 3600, 20);
        make_node(&mut store, 2, TdProperty::Fixed, now + 7200, 20);
        make_node(&mut store, 3, TdProperty::Variable, now + 3600 * 20, 20);
        let config = Config::default();
        let result = run(&store, &config, now);
        let ids: Vec<NodeId> = result.target_dates.iter().map(|(id, _)| *id).collect();
        assert!(!ids.contains(&nid(1)));
        assert!(!ids.contains(&nid(2)));
        assert!(ids.contains(&nid(3)));
    }

    #[test]
    fn chunks_req_zero_nodes_are_omitted() {
        let mut store = GraphStore::new();
        let now = 1_700_000_000;
        let id = make_node(&mut store, 1, TdProperty::Variable, now + 3600, 0);
        store.node_by_id_mut(id).unwrap().effort_secs = 0;
        let config = Config::default();
        let result = run(&store, &config, now);
        assert!(!result.flags.contains_key(&id));
    }

    #[test]
    fn break_group_spreads_tds_by_two_minutes() {
        let mut store = GraphStore::new();
        let t = 1_700_000_000;
        make_node(&mut store, 1, TdProperty::Variable, t, 20);
        make_node(&mut store, 2, TdProperty::Variable, t, 20);
        let spread = break_group(&store, t);
        let mut spread = spread;
        spread.sort();
        assert_eq!(spread[0].1 - spread[1].1, 120);
    }

    #[test]
    fn periodic_lt_year_flag_set_for_sub_yearly_exact_repeats() {
        let mut store = GraphStore::new();
        let now = 1_700_000_000;
        let topic = store.register_topic("t");
        let mut n = Node::new(nid(1), "daily check-in");
        n.topics.insert(topic, 1.0);
        n.td_property = TdProperty::Exact;
        n.target_date = Some(now + 3600);
        n.effort_secs = 600;
        n.repeats = true;
        n.td_pattern = TdPattern::Daily;
        n.td_span = 0;
        store.add_node(n).unwrap();
        let config = Config::default();
        let result = run(&store, &config, now);
        let f = result.flags.get(&nid(1)).unwrap();
        assert!(f.is_set(EpsFlags::PERIODIC_LT_YEAR));
    }

    #[test]
    fn periodic_lt_year_flag_set_for_sub_yearly_fixed_repeats() {
        let mut store = GraphStore::new();
        let now = 1_700_000_000;
        let topic = store.register_topic("t");
        let mut n = Node::new(nid(1), "weekly standup");
        n.topics.insert(topic, 1.0);
        n.td_property = TdProperty::Fixed;
        n.target_date = Some(now + 3600);
        n.effort_secs = 600;
        n.repeats = true;
        n.td_pattern = TdPattern::Weekly;
        n.td_span = 0;
        store.add_node(n).unwrap();
        let config = Config::default();
        let result = run(&store, &config, now);
        let f = result.flags.get(&nid(1)).unwrap();
        assert!(f.is_set(EpsFlags::FIXED));
        assert!(f.is_set(EpsFlags::PERIODIC_LT_YEAR));
    }

    #[test]
    fn inherit_node_under_exact_superior_is_grouped_not_pinned() {
        use formalizer_core::{Edge, EdgeId};

        let mut store = GraphStore::new();
        let now = 1_700_000_000;
        let exact_td = now + 3600 * 8;
        let superior = make_node(&mut store, 1, TdProperty::Exact, exact_td, 20);
        let topic = store.register_topic("t");
        let mut leaf = Node::new(nid(2), "inherits from exact superior");
        leaf.topics.insert(topic, 1.0);
        leaf.td_property = TdProperty::Inherit;
        leaf.effort_secs = 40 * 60;
        store.add_node(leaf).unwrap();
        store.add_edge(Edge::new(EdgeId::new(nid(2), superior))).unwrap();

        let config = Config::default();
        let result = run(&store, &config, now);

        let superior_flags = result.flags.get(&superior).unwrap();
        assert!(superior_flags.is_set(EpsFlags::EXACT));

        let leaf_flags = result.flags.get(&nid(2)).unwrap();
        assert!(!leaf_flags.is_set(EpsFlags::EXACT));
        assert!(leaf_flags.is_set(EpsFlags::EPS_GROUP_MEMBER));
    }
}
