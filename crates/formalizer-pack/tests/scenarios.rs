//! A mixed day-packing run with one exact, one fixed, and one variable
//! Node.

use formalizer_core::{Config, GraphStore, Node, NodeId, TdProperty};
use formalizer_pack::{run, PackStatus};

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

/// Exact Node X (20 min at tomorrow 10:00), fixed Node Y (60 min, TD
/// tomorrow 12:00), variable Node Z (180 min). Horizon = 2 days, min_block
/// = 20 min, now = today 15:00.
///
/// Expected: X lands at tomorrow 09:40-10:00; Y fills backward in
/// 20-minute blocks from tomorrow 12:00, landing at 11:00-12:00; Z
/// forward-fills the first contiguous free span starting today 15:00.
#[test]
fn scenario_3_mixed_day_packing() {
    let day_start: i64 = 0;
    let now = day_start + 15 * 3600; // today 15:00
    let tomorrow = day_start + 86_400;
    let td_x = tomorrow + 10 * 3600; // tomorrow 10:00
    let td_y = tomorrow + 12 * 3600; // tomorrow 12:00

    let mut store = GraphStore::new();
    let x = node(&mut store, 1, TdProperty::Exact, td_x, 20);
    let y = node(&mut store, 2, TdProperty::Fixed, td_y, 60);
    let z = node(&mut store, 3, TdProperty::Variable, tomorrow + 23 * 3600, 180);

    let config = Config {
        horizon_days: 2,
        min_block_size_minutes: 20,
        ..Config::default()
    };
    let result = run(&store, &config, now);
    assert_eq!(result.status, PackStatus::Ok);

    let assignments = result.grid.assignments();
    let x_start = assignments.iter().find(|(_, id)| *id == x).unwrap().0;
    let y_start = assignments.iter().find(|(_, id)| *id == y).unwrap().0;
    let z_start = assignments.iter().find(|(_, id)| *id == z).unwrap().0;

    assert_eq!(x_start, td_x - 20 * 60); // tomorrow 09:40
    assert_eq!(y_start, td_y - 60 * 60); // tomorrow 11:00
    assert_eq!(z_start, now); // today 15:00, first free span

    assert_eq!(result.grid.filled_minute_count(), 20 + 60 + 180);

    for (t, _) in &assignments {
        assert!(*t >= now - 60);
    }
}
