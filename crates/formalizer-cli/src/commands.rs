//! Subcommand implementations.
//!
//! Each subcommand is a `cmd_*` function: parse its arguments, do its
//! work against a fresh `GraphStore`, and print either a human-readable
//! report or a `serde_json::json!` document depending on `--format`.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use formalizer_core::{effective_targetdate, Config, EdgeId, ExitCode, Node, NodeId, TdPattern, TdProperty};
use formalizer_proto::{Batch, ModRequest};

use crate::diagnostics::{emit, report_error};
use crate::scenarios;

fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

fn parse_td_property(s: &str) -> Result<TdProperty> {
    Ok(match s {
        "unspecified" => TdProperty::Unspecified,
        "inherit" => TdProperty::Inherit,
        "variable" => TdProperty::Variable,
        "fixed" => TdProperty::Fixed,
        "exact" => TdProperty::Exact,
        other => return Err(anyhow!("unknown td-property '{other}'")),
    })
}

fn parse_td_pattern(s: &str) -> Result<TdPattern> {
    Ok(match s {
        "daily" => TdPattern::Daily,
        "workdays" => TdPattern::Workdays,
        "weekly" => TdPattern::Weekly,
        "biweekly" => TdPattern::Biweekly,
        "monthly" => TdPattern::Monthly,
        "endofmonthoffset" => TdPattern::EndOfMonthOffset,
        "yearly" => TdPattern::Yearly,
        "span" => TdPattern::Span,
        "nonperiodic" => TdPattern::NonPeriodic,
        other => return Err(anyhow!("unknown td-pattern '{other}'")),
    })
}

/// `formalizer add-node`: build a single `ADD_NODE` request, validate and
/// apply it against a fresh Graph, and report the result.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add_node(
    desc: &str,
    topic: &str,
    effort_hours: f64,
    property: &str,
    pattern: Option<&str>,
    every: u32,
    span: u32,
    repeats: bool,
    format: &str,
) -> Result<ExitCode> {
    let mut graph = formalizer_core::GraphStore::new();
    let topic_id = graph.register_topic(topic);

    let now = now_epoch();
    let id = NodeId::from_epoch(now, 1, 0).context("building node id from current time")?;
    let mut node = Node::new(id, desc);
    node.effort_secs = (effort_hours * 3600.0).max(0.0) as u64;
    node.td_property = parse_td_property(property)?;
    node.repeats = repeats;
    if let Some(p) = pattern {
        node.td_pattern = parse_td_pattern(p)?;
    }
    node.td_every = every.max(1);
    node.td_span = span;
    node.topics.insert(topic_id, 1.0);

    let mut batch = Batch::new();
    batch.push(ModRequest::AddNode(node));

    match batch.validate(&graph) {
        Ok(()) => {}
        Err(e) => {
            report_error(format, &e.to_string())?;
            return Ok(e.exit_code);
        }
    }
    let results = batch.apply(&mut graph).context("applying a validated batch should not fail")?;

    let doc = serde_json::json!({
        "node_id": id.to_string(),
        "results": results.iter().map(|r| r.kind).collect::<Vec<_>>(),
    });
    emit(format, doc, || println!("added node {id} ({desc})"))?;
    Ok(ExitCode::Ok)
}

/// `formalizer add-edge`: demonstrate the inherit-chain scenario, then
/// apply an additional `ADD_EDGE` request against it.
pub fn cmd_add_edge(dependency: f64, significance: f64, format: &str) -> Result<ExitCode> {
    let now = now_epoch();
    let deadline = now + 7 * formalizer_core::DAY;
    let (mut graph, root, leaf) = scenarios::inherit_chain(now, deadline, false)?;
    let edge_id = EdgeId::new(leaf, root);

    let mut batch = Batch::new();
    batch.push(ModRequest::AddEdge {
        id: edge_id,
        dependency,
        significance,
        importance: 0.0,
        urgency: 0.0,
        priority: 0.0,
    });
    match batch.validate(&graph) {
        Ok(()) => {}
        Err(e) => {
            report_error(format, &e.to_string())?;
            return Ok(e.exit_code);
        }
    }
    batch.apply(&mut graph).context("applying a validated batch should not fail")?;
    let eff = effective_targetdate(&graph, leaf);
    print_inherit_report(format, leaf, root, eff.epoch)
}

fn print_inherit_report(format: &str, leaf: NodeId, root: NodeId, eff_epoch: i64) -> Result<ExitCode> {
    let doc = serde_json::json!({
        "leaf": leaf.to_string(),
        "root": root.to_string(),
        "leaf_effective_target_date": eff_epoch,
    });
    emit(format, doc, || println!("leaf {leaf} inherits effective target date {eff_epoch} from root {root}"))?;
    Ok(ExitCode::Ok)
}

/// `formalizer eps-update --scenario <name>`: run the three-pass EPS
/// scheduler over one of the worked scenarios and print the proposed
/// `BATCH_TARGETDATES` updates.
pub fn cmd_eps_update(scenario: &str, format: &str) -> Result<ExitCode> {
    let now = now_epoch();
    let today_start = formalizer_core::day_start_time(now, 0);
    let config = Config::default();

    let graph = match scenario {
        "exact" => scenarios::exact_placement(now, today_start + 14 * 3600, today_start + 14 * 3600 + 30 * 60)?,
        "grouping" => {
            let mut cfg = config;
            cfg.endofday_priorities = true;
            cfg.dolater_endofday_secs = 22 * 3600;
            let graph = scenarios::movable_grouping(now, today_start + 23 * 3600)?;
            return run_eps(&graph, &cfg, now, format);
        }
        other => return Err(anyhow!("unknown scenario '{other}' (expected exact|grouping)")),
    };
    run_eps(&graph, &config, now, format)
}

fn run_eps(graph: &formalizer_core::GraphStore, config: &Config, now: i64, format: &str) -> Result<ExitCode> {
    let result = formalizer_eps::run(graph, config, now);
    let updates: Vec<_> = result
        .target_dates
        .iter()
        .map(|(id, td)| serde_json::json!({"node": id.to_string(), "new_target_date": td}))
        .collect();
    let doc = serde_json::json!({ "updates": updates });
    emit(format, doc, || {
        println!("EPS update ({} candidate Nodes considered):", result.flags.len());
        for (id, td) in &result.target_dates {
            println!("  {id} -> new target date {td}");
        }
    })?;
    Ok(ExitCode::Ok)
}

/// `formalizer pack`: run the day-packing scheduler over the mixed
/// scenario and print the filled-minute ranges.
pub fn cmd_pack(horizon_days: u32, format: &str) -> Result<ExitCode> {
    let now = now_epoch();
    let today_start = formalizer_core::day_start_time(now, 0);
    let tomorrow = today_start + formalizer_core::DAY;
    let graph = scenarios::mixed_day_pack(now, tomorrow + 10 * 3600, tomorrow + 12 * 3600)?;

    let mut config = Config::default();
    config.horizon_days = horizon_days.max(1);
    let result = formalizer_pack::run(&graph, &config, now);

    let assignments = result.grid.assignments();
    let doc = serde_json::json!({
        "status": format!("{:?}", result.status),
        "filled_minutes": result.grid.filled_minute_count(),
        "assignments": assignments.iter().map(|(t, id)| serde_json::json!({"minute_start": t, "node": id.to_string()})).collect::<Vec<_>>(),
    });
    emit(format, doc, || {
        println!("day-pack status: {:?}", result.status);
        println!("filled minutes: {}", result.grid.filled_minute_count());
        for (t, id) in &assignments {
            println!("  minute {t} -> {id}");
        }
    })?;
    Ok(if matches!(result.status, formalizer_pack::PackStatus::Ok) {
        ExitCode::Ok
    } else {
        ExitCode::GeneralError
    })
}
