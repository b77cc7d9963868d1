//! The effective target-date engine: walks the `inherit` chain to find
//! a Node's fixed/exact/variable origin, the same lookup a day-packing
//! pass needs before it can place an inheriting Node.

use crate::graph::{GraphStore, TdProperty};
use crate::id::NodeId;
use crate::time::{add_to_date, T_MAX};

/// How deep an `inherit` chain may be followed before giving up. The
/// original tool does not detect cycles in `inherit` chains; this repo
/// caps traversal depth instead of forbidding cycles structurally.
pub const MAX_INHERIT_DEPTH: usize = 64;

/// The outcome of resolving a Node's effective target date: the epoch time
/// actually used for scheduling, and the id of the Node whose own
/// `td_property` determined it (the "origin").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveTargetDate {
    pub epoch: i64,
    pub origin: NodeId,
}

/// Resolve the effective target date of `id`:
/// - `exact`/`fixed`/`variable`/`unspecified` Nodes are their own origin.
/// - `inherit` Nodes follow their earliest-by-effective-TD superior whose
///   own origin is not `inherit`; with no qualifying superior, `T_MAX`.
/// - A completed Node always contributes `T_MAX`.
/// - Traversal is capped at `MAX_INHERIT_DEPTH`; hitting the cap also
///   yields `T_MAX` and is logged.
pub fn effective_targetdate(graph: &GraphStore, id: NodeId) -> EffectiveTargetDate {
    resolve(graph, id, 0)
}

fn resolve(graph: &GraphStore, id: NodeId, depth: usize) -> EffectiveTargetDate {
    let Some(node) = graph.node_by_id(id) else {
        return EffectiveTargetDate { epoch: T_MAX, origin: id };
    };

    if node.is_complete() {
        return EffectiveTargetDate { epoch: T_MAX, origin: id };
    }

    match node.td_property {
        TdProperty::Exact | TdProperty::Fixed | TdProperty::Variable | TdProperty::Unspecified => {
            EffectiveTargetDate {
                epoch: node.target_date.unwrap_or(T_MAX),
                origin: id,
            }
        }
        TdProperty::Inherit => {
            if depth >= MAX_INHERIT_DEPTH {
                tracing::warn!(node = %id, "inherit chain exceeded max depth, treating as T_MAX");
                return EffectiveTargetDate { epoch: T_MAX, origin: id };
            }
            // Recursing through every superior (whatever its own property)
            // naturally walks chains of `inherit` edges up to a concrete
            // fixed/exact/variable/unspecified origin.
            let mut best: Option<EffectiveTargetDate> = None;
            for edge in graph.dep_edges(id) {
                let sup_id = edge.id.sup;
                if graph.node_by_id(sup_id).is_none() {
                    continue;
                }
                let candidate = resolve(graph, sup_id, depth + 1);
                best = Some(match best {
                    Some(b) if b.epoch <= candidate.epoch => b,
                    _ => candidate,
                });
            }
            best.unwrap_or(EffectiveTargetDate { epoch: T_MAX, origin: id })
        }
    }
}

/// Generate the repeat-instance sequence for a repeating Node: the current
/// `target_date` plus subsequent instances advanced by `add_to_date` up to
/// `td_span` iterations (0 = unlimited) or until `horizon_epoch` is
/// exceeded.
pub fn repeating_instances(
    graph: &GraphStore,
    id: NodeId,
    horizon_epoch: i64,
) -> Vec<i64> {
    let Some(node) = graph.node_by_id(id) else {
        return Vec::new();
    };
    if !node.repeats {
        return Vec::new();
    }
    let Some(start) = node.target_date else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut t = start;
    let mut iterations = 0u32;
    loop {
        out.push(t);
        if node.td_span != 0 && iterations + 1 >= node.td_span {
            break;
        }
        let Ok(next) = add_to_date(t, node.td_pattern, node.td_every) else {
            break;
        };
        if next > horizon_epoch {
            break;
        }
        t = next;
        iterations += 1;
    }
    out
}
