//! Batch validation and application.
//!
//! Mirrors `Graphmod_error` (one exit code + message per rejected batch)
//! and `Graphmod_result`/`Graphmod_results` (one result record per
//! handled request). `ModRequestError`'s hand-rolled `Display`/`Error`
//! impls are a deliberate stylistic variation on `formalizer-core`'s
//! `thiserror` types.

use std::collections::HashSet;
use std::fmt;

use formalizer_core::{Edge, EdgeId, ExitCode, GraphStore, NodeId, TdPattern, TdProperty};

use crate::request::ModRequest;

/// The structured error returned when a batch fails validation: one exit
/// code plus a human message, matching `Graphmod_error`'s
/// `(exit_status_code, message)` pair. First failure aborts the whole
/// batch — nothing is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModRequestError {
    pub exit_code: ExitCode,
    pub message: String,
}

impl fmt::Display for ModRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.exit_code, self.message)
    }
}

impl std::error::Error for ModRequestError {}

impl ModRequestError {
    fn new(exit_code: ExitCode, message: impl Into<String>) -> Self {
        ModRequestError {
            exit_code,
            message: message.into(),
        }
    }
}

/// One result record per successfully-applied request, mirroring
/// `Graphmod_result`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModResult {
    pub kind: &'static str,
    pub node: Option<NodeId>,
    pub edge: Option<EdgeId>,
    pub name: Option<String>,
}

/// A staged, FIFO batch of modification requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    requests: Vec<ModRequest>,
}

impl Batch {
    pub fn new() -> Self {
        Batch::default()
    }

    pub fn push(&mut self, request: ModRequest) -> &mut Self {
        self.requests.push(request);
        self
    }

    pub fn requests(&self) -> &[ModRequest] {
        &self.requests
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Validate the entire batch against `graph` before any part of it is
    /// applied. Every `AddNode` id must be unused
    /// (neither already in the Graph nor duplicated earlier in this
    /// batch); every `AddEdge` endpoint must exist in the Graph or
    /// elsewhere in the batch; every `EditNode`/`EditEdge` target must
    /// exist in the Graph or have been added earlier in the batch.
    pub fn validate(&self, graph: &GraphStore) -> Result<(), ModRequestError> {
        let mut added_nodes: HashSet<NodeId> = HashSet::new();
        let mut added_edges: HashSet<EdgeId> = HashSet::new();

        for request in &self.requests {
            match request {
                ModRequest::AddNode(node) => {
                    if graph.contains_node(node.id) || added_nodes.contains(&node.id) {
                        return Err(ModRequestError::new(
                            ExitCode::BadRequestData,
                            format!("duplicate node id {}", node.id),
                        ));
                    }
                    if node.topics.is_empty() {
                        return Err(ModRequestError::new(
                            ExitCode::BadRequestData,
                            format!("node {} carries no topic tags", node.id),
                        ));
                    }
                    for &topic_id in node.topics.keys() {
                        if graph.topic_by_id(topic_id).is_none() {
                            return Err(ModRequestError::new(
                                ExitCode::BadRequestData,
                                format!("node {} references unknown topic id {}", node.id, topic_id),
                            ));
                        }
                    }
                    if node.repeats
                        && (node.td_pattern == TdPattern::NonPeriodic
                            || matches!(node.td_property, TdProperty::Variable | TdProperty::Unspecified))
                    {
                        return Err(ModRequestError::new(
                            ExitCode::BadRequestData,
                            format!(
                                "repeating node {} must have a periodic pattern and a fixed/exact/inherit property",
                                node.id
                            ),
                        ));
                    }
                    for (k, v) in &node.topics {
                        if !(0.0..=1.0).contains(v) {
                            return Err(ModRequestError::new(
                                ExitCode::BadRequestData,
                                format!("node {} topic {} relevance {} outside [0,1]", node.id, k, v),
                            ));
                        }
                    }
                    added_nodes.insert(node.id);
                }
                ModRequest::AddEdge { id, .. } => {
                    let dep_exists = graph.contains_node(id.dep) || added_nodes.contains(&id.dep);
                    let sup_exists = graph.contains_node(id.sup) || added_nodes.contains(&id.sup);
                    if !dep_exists {
                        return Err(ModRequestError::new(
                            ExitCode::BadRequestData,
                            format!("edge dependency endpoint {} missing", id.dep),
                        ));
                    }
                    if !sup_exists {
                        return Err(ModRequestError::new(
                            ExitCode::BadRequestData,
                            format!("edge superior endpoint {} missing", id.sup),
                        ));
                    }
                    if graph.edge_by_id(*id).is_some() || added_edges.contains(id) {
                        return Err(ModRequestError::new(
                            ExitCode::BadRequestData,
                            format!("duplicate edge {}", id),
                        ));
                    }
                    added_edges.insert(*id);
                }
                ModRequest::EditNode(id, _) => {
                    if !graph.contains_node(*id) && !added_nodes.contains(id) {
                        return Err(ModRequestError::new(
                            ExitCode::MissingData,
                            format!("edit target node {} not found", id),
                        ));
                    }
                }
                ModRequest::EditEdge(id, _) => {
                    if graph.edge_by_id(*id).is_none() && !added_edges.contains(id) {
                        return Err(ModRequestError::new(
                            ExitCode::MissingData,
                            format!("edit target edge {} not found", id),
                        ));
                    }
                }
                ModRequest::BatchTargetDates(pairs) => {
                    for (id, _) in pairs {
                        if !graph.contains_node(*id) && !added_nodes.contains(id) {
                            return Err(ModRequestError::new(
                                ExitCode::MissingData,
                                format!("target-date batch references missing node {}", id),
                            ));
                        }
                    }
                }
                ModRequest::BatchTPass(_) => {}
                ModRequest::ListAdd { node, .. } | ModRequest::ListRemove { node, .. } => {
                    if !graph.contains_node(*node) && !added_nodes.contains(node) {
                        return Err(ModRequestError::new(
                            ExitCode::MissingData,
                            format!("list operation references missing node {}", node),
                        ));
                    }
                }
                ModRequest::ListDelete(_) => {}
            }
        }
        Ok(())
    }

    /// Apply every request in order, assuming `validate` has already
    /// succeeded against the same `graph`. Returns one `ModResult` per
    /// request. A failure here (which should be unreachable after
    /// validation) is logged and aborts the remainder of the batch —
    /// the caller is expected to treat this as catastrophic.
    pub fn apply(&self, graph: &mut GraphStore) -> Result<Vec<ModResult>, ModRequestError> {
        let mut results = Vec::with_capacity(self.requests.len());
        for request in &self.requests {
            let result = self.apply_one(graph, request)?;
            results.push(result);
        }
        Ok(results)
    }

    fn apply_one(&self, graph: &mut GraphStore, request: &ModRequest) -> Result<ModResult, ModRequestError> {
        match request {
            ModRequest::AddNode(node) => {
                let id = node.id;
                graph.add_node(node.clone()).map_err(|e| {
                    tracing::error!(error = %e, "add_node failed after validation passed");
                    ModRequestError::new(ExitCode::GeneralError, e.to_string())
                })?;
                Ok(ModResult {
                    kind: "add_node",
                    node: Some(id),
                    edge: None,
                    name: None,
                })
            }
            ModRequest::AddEdge {
                id,
                dependency,
                significance,
                importance,
                urgency,
                priority,
            } => {
                let mut edge = Edge::new(*id);
                edge.dependency = *dependency;
                edge.significance = *significance;
                edge.importance = *importance;
                edge.urgency = *urgency;
                edge.priority = *priority;
                graph.add_edge(edge).map_err(|e| {
                    tracing::error!(error = %e, "add_edge failed after validation passed");
                    ModRequestError::new(ExitCode::GeneralError, e.to_string())
                })?;
                Ok(ModResult {
                    kind: "add_edge",
                    node: None,
                    edge: Some(*id),
                    name: None,
                })
            }
            ModRequest::EditNode(id, edit) => {
                graph.edit_node(*id, edit.clone()).map_err(|e| {
                    ModRequestError::new(ExitCode::GeneralError, e.to_string())
                })?;
                Ok(ModResult {
                    kind: "edit_node",
                    node: Some(*id),
                    edge: None,
                    name: None,
                })
            }
            ModRequest::EditEdge(id, edit) => {
                graph.edit_edge(*id, *edit).map_err(|e| {
                    ModRequestError::new(ExitCode::GeneralError, e.to_string())
                })?;
                Ok(ModResult {
                    kind: "edit_edge",
                    node: None,
                    edge: Some(*id),
                    name: None,
                })
            }
            ModRequest::BatchTargetDates(pairs) => {
                for (id, td) in pairs {
                    let edit = formalizer_core::NodeEdit {
                        target_date: Some(Some(*td)),
                        ..Default::default()
                    };
                    graph
                        .edit_node(*id, edit)
                        .map_err(|e| ModRequestError::new(ExitCode::GeneralError, e.to_string()))?;
                }
                Ok(ModResult {
                    kind: "batch_targetdates",
                    node: None,
                    edge: None,
                    name: Some(format!("{} nodes", pairs.len())),
                })
            }
            ModRequest::BatchTPass(t_pass) => {
                let count = apply_tpass(graph, *t_pass);
                Ok(ModResult {
                    kind: "batch_tpass",
                    node: None,
                    edge: None,
                    name: Some(format!("{} nodes advanced", count)),
                })
            }
            ModRequest::ListAdd { list, node } => {
                graph
                    .add_to_list(list, *node)
                    .map_err(|e| ModRequestError::new(ExitCode::GeneralError, e.to_string()))?;
                Ok(ModResult {
                    kind: "list_add",
                    node: Some(*node),
                    edge: None,
                    name: Some(list.clone()),
                })
            }
            ModRequest::ListRemove { list, node } => {
                graph
                    .remove_from_list(list, *node)
                    .map_err(|e| ModRequestError::new(ExitCode::GeneralError, e.to_string()))?;
                Ok(ModResult {
                    kind: "list_remove",
                    node: Some(*node),
                    edge: None,
                    name: Some(list.clone()),
                })
            }
            ModRequest::ListDelete(name) => {
                graph
                    .delete_list(name)
                    .map_err(|e| ModRequestError::new(ExitCode::GeneralError, e.to_string()))?;
                Ok(ModResult {
                    kind: "list_delete",
                    node: None,
                    edge: None,
                    name: Some(name.clone()),
                })
            }
        }
    }
}

/// Advance every repeating Node whose target date has passed `t_pass` by
/// one period of its pattern, capped by `td_span` when nonzero (spec
/// §4.F "Repeating update"). Returns the number of Nodes advanced.
fn apply_tpass(graph: &mut GraphStore, t_pass: i64) -> usize {
    let due: Vec<NodeId> = graph
        .nodes()
        .filter(|n| n.repeats && n.target_date.is_some_and(|td| td <= t_pass))
        .map(|n| n.id)
        .collect();
    let mut advanced = 0;
    for id in due {
        let Some(node) = graph.node_by_id(id) else { continue };
        let Some(td) = node.target_date else { continue };
        let pattern = node.td_pattern;
        let every = node.td_every;
        let span = node.td_span;
        let Ok(next) = formalizer_core::add_to_date(td, pattern, every) else {
            continue;
        };
        let new_span = if span > 0 { span - 1 } else { 0 };
        let edit = formalizer_core::NodeEdit {
            target_date: Some(Some(next)),
            td_span: Some(new_span),
            ..Default::default()
        };
        if graph.edit_node(id, edit).is_ok() {
            advanced += 1;
        }
    }
    advanced
}
