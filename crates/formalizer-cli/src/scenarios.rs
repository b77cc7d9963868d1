//! Synthetic demo graphs used by the `eps-update`/`pack` subcommands.
//!
//! The real front-ends build their Graph from a persistent store this
//! repository does not implement; this crate is a thin demonstration
//! harness, so its subcommands operate on three worked scenarios rather
//! than on a loaded file.

use anyhow::{anyhow, Result};
use formalizer_core::{Edge, EdgeId, GraphStore, Node, NodeId, TdProperty};

fn node_at(graph: &mut GraphStore, topic: &str, minor: u8, now: i64, offset_secs: i64, desc: &str) -> Result<NodeId> {
    let topic_id = graph.register_topic(topic);
    let id = NodeId::from_epoch(now + offset_secs, minor, 0).map_err(|e| anyhow!("{e}"))?;
    let mut node = Node::new(id, desc);
    node.topics.insert(topic_id, 1.0);
    graph.add_node(node).map_err(|e| anyhow!("{e}"))?;
    Ok(id)
}

/// Scenario 1: two exact-TD Nodes A (20 min, TD today 14:00) and
/// B (40 min, TD today 14:30).
pub fn exact_placement(now: i64, today_14_00: i64, today_14_30: i64) -> Result<GraphStore> {
    let mut graph = GraphStore::new();
    let a = node_at(&mut graph, "appointments", 1, now, -3600, "meeting A")?;
    let b = node_at(&mut graph, "appointments", 2, now, -3600 * 2, "meeting B")?;

    if let Some(n) = graph.node_by_id_mut(a) {
        n.effort_secs = 20 * 60;
        n.td_property = TdProperty::Exact;
        n.target_date = Some(today_14_00);
    }
    if let Some(n) = graph.node_by_id_mut(b) {
        n.effort_secs = 40 * 60;
        n.td_property = TdProperty::Exact;
        n.target_date = Some(today_14_30);
    }
    Ok(graph)
}

/// Scenario 2: three variable Nodes P, Q, R sharing TD = today
/// 23:00, each requiring 60 minutes.
pub fn movable_grouping(now: i64, today_23_00: i64) -> Result<GraphStore> {
    let mut graph = GraphStore::new();
    for (i, label) in [(1u8, "P"), (2, "Q"), (3, "R")] {
        let id = node_at(&mut graph, "chores", i, now, -3600 * i as i64, label)?;
        if let Some(n) = graph.node_by_id_mut(id) {
            n.effort_secs = 60 * 60;
            n.td_property = TdProperty::Variable;
            n.target_date = Some(today_23_00);
        }
    }
    Ok(graph)
}

/// Scenario 3: exact Node X (20 min at tomorrow 10:00), fixed
/// Node Y (60 min, TD tomorrow 12:00), variable Node Z (180 min).
pub fn mixed_day_pack(now: i64, tomorrow_10_00: i64, tomorrow_12_00: i64) -> Result<GraphStore> {
    let mut graph = GraphStore::new();
    let x = node_at(&mut graph, "appointments", 1, now, -3600, "X")?;
    let y = node_at(&mut graph, "deadlines", 2, now, -3600 * 2, "Y")?;
    let z = node_at(&mut graph, "work", 3, now, -3600 * 3, "Z")?;

    if let Some(n) = graph.node_by_id_mut(x) {
        n.effort_secs = 20 * 60;
        n.td_property = TdProperty::Exact;
        n.target_date = Some(tomorrow_10_00);
    }
    if let Some(n) = graph.node_by_id_mut(y) {
        n.effort_secs = 60 * 60;
        n.td_property = TdProperty::Fixed;
        n.target_date = Some(tomorrow_12_00);
    }
    if let Some(n) = graph.node_by_id_mut(z) {
        n.effort_secs = 180 * 60;
        n.td_property = TdProperty::Variable;
    }
    Ok(graph)
}

/// A small dependency chain used to demonstrate `add-edge`/`effective_td`
/// inheritance: `leaf` inherits its target date from `root`, which carries
/// a fixed TD. `wire_edge` controls whether the dependency edge is
/// pre-created (so a caller can instead add it itself via `ADD_EDGE`).
pub fn inherit_chain(now: i64, deadline: i64, wire_edge: bool) -> Result<(GraphStore, NodeId, NodeId)> {
    let mut graph = GraphStore::new();
    let root = node_at(&mut graph, "project", 1, now, -3600, "root milestone")?;
    let leaf = node_at(&mut graph, "project", 2, now, -3600 * 2, "leaf task")?;

    if let Some(n) = graph.node_by_id_mut(root) {
        n.td_property = TdProperty::Fixed;
        n.target_date = Some(deadline);
    }
    if let Some(n) = graph.node_by_id_mut(leaf) {
        n.td_property = TdProperty::Inherit;
        n.effort_secs = 3600;
    }

    if wire_edge {
        let edge = Edge::new(EdgeId::new(leaf, root));
        graph.add_edge(edge).map_err(|e| anyhow!("{e}"))?;
    }
    Ok((graph, root, leaf))
}
