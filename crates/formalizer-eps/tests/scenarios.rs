//! End-to-end EPS scenarios: exact placement (scenario 1) and
//! movable-group placement (scenario 2).

use std::collections::HashMap;

use formalizer_core::{Config, GraphStore, Node, NodeId, TdProperty};
use formalizer_eps::{run, EpsFlags};

fn nid(minor: u8) -> NodeId {
    NodeId::new(2024, 1, 1, 0, 0, 0, minor).unwrap()
}

fn node(store: &mut GraphStore, minor: u8, property: TdProperty, td: i64, minutes: u64) -> NodeId {
    let topic = store.register_topic("work");
    let mut n = Node::new(nid(minor), "node");
    n.topics.insert(topic, 1.0);
    n.td_property = property;
    n.target_date = Some(td);
    n.effort_secs = minutes * 60;
    store.add_node(n).unwrap();
    nid(minor)
}

/// Scenario 1 — exact placement.
///
/// Two exact-TD Nodes: A (20 min, TD = 14:00), B (40 min, TD = 14:30). A's
/// window (13:40-14:00) is reserved first; B's window (13:50-14:30)
/// overlaps the last 10 minutes of A's window and is flagged accordingly.
#[test]
fn scenario_1_exact_placement() {
    let day_start: i64 = 0;
    let now = day_start + 9 * 3600; // today 09:00
    let td_a = day_start + 14 * 3600; // today 14:00
    let td_b = td_a + 1800; // today 14:30

    let mut store = GraphStore::new();
    let a = node(&mut store, 1, TdProperty::Exact, td_a, 20);
    let b = node(&mut store, 2, TdProperty::Exact, td_b, 40);

    let config = Config::default(); // chunk_minutes = 20
    let result = run(&store, &config, now);

    let flags_a = result.flags.get(&a).expect("A considered");
    let flags_b = result.flags.get(&b).expect("B considered");
    assert!(flags_a.is_set(EpsFlags::EXACT));
    assert!(flags_b.is_set(EpsFlags::EXACT));
    assert!(!flags_a.overlap(), "A is reserved first and should not overlap anything");
    assert!(flags_b.overlap(), "B's window overlaps A's last chunk");

    // Neither Node is variable/unspecified, so neither appears in the
    // output target-date map.
    assert!(result.target_dates.is_empty());
}

/// Scenario 2 — movable grouping.
///
/// Three variable-TD Nodes P, Q, R share an identical effective target
/// date and each require 60 minutes. They form one EPS group and receive
/// an identical new target date.
#[test]
fn scenario_2_movable_grouping() {
    let day_start: i64 = 0;
    let now = day_start + 9 * 3600; // today 09:00
    let shared_td = day_start + 23 * 3600; // today 23:00

    let mut store = GraphStore::new();
    let p = node(&mut store, 1, TdProperty::Variable, shared_td, 60);
    let q = node(&mut store, 2, TdProperty::Variable, shared_td, 60);
    let r = node(&mut store, 3, TdProperty::Variable, shared_td, 60);

    let config = Config {
        eps_group_offset_mins: 1,
        ..Config::default()
    };
    let result = run(&store, &config, now);

    let tds: HashMap<NodeId, i64> = result.target_dates.into_iter().collect();
    assert_eq!(tds.len(), 3, "all three Nodes should receive an updated TD");
    let td_p = tds[&p];
    assert_eq!(td_p, tds[&q]);
    assert_eq!(td_p, tds[&r]);
}

/// A second, later group at a different shared TD should be offset from
/// the first group once end-of-day snapping is enabled, via
/// `eps_group_offset_mins`.
#[test]
fn two_successive_groups_are_offset_when_they_collide_after_snapping() {
    let day_start: i64 = 0;
    let now = day_start + 9 * 3600;
    let first_group_td = day_start + 20 * 3600;
    let second_group_td = first_group_td + 60; // one minute later, same day

    let mut store = GraphStore::new();
    node(&mut store, 1, TdProperty::Variable, first_group_td, 20);
    node(&mut store, 2, TdProperty::Variable, second_group_td, 20);

    let config = Config {
        endofday_priorities: true,
        dolater_endofday_secs: 22 * 3600,
        eps_group_offset_mins: 1,
        ..Config::default()
    };
    let result = run(&store, &config, now);
    let tds: HashMap<NodeId, i64> = result.target_dates.into_iter().collect();
    let first_td = tds[&nid(1)];
    let second_td = tds[&nid(2)];
    assert_eq!(second_td - first_td, 60);
}
