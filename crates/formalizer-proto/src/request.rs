//! The modification-request batch kinds.
//!
//! Mirrors the original `Graph_modification_request` enum
//! (`graphmod_add_node`, `graphmod_add_edge`, `namedlist_add`,
//! `namedlist_remove`, `namedlist_delete`), extended with `EditNode`/
//! `EditEdge`/`BatchTargetDates`/`BatchTPass` kinds that belong to the
//! wider `fzedit`/`fzupdate` tool family rather than the single core
//! header.

use formalizer_core::{EdgeEdit, EdgeId, Node, NodeEdit, NodeId};

/// One staged request within a modification batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ModRequest {
    AddNode(Node),
    AddEdge {
        id: EdgeId,
        dependency: f64,
        significance: f64,
        importance: f64,
        urgency: f64,
        priority: f64,
    },
    EditNode(NodeId, NodeEdit),
    EditEdge(EdgeId, EdgeEdit),
    /// Set target dates for the listed Nodes without other changes.
    BatchTargetDates(Vec<(NodeId, i64)>),
    /// Advance all repeating Nodes whose target date has passed `t_pass`
    /// by one period of their pattern.
    BatchTPass(i64),
    ListAdd { list: String, node: NodeId },
    ListRemove { list: String, node: NodeId },
    ListDelete(String),
}

impl ModRequest {
    /// A short tag naming the request kind, used in `ModResult` and in
    /// diagnostics.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            ModRequest::AddNode(_) => "add_node",
            ModRequest::AddEdge { .. } => "add_edge",
            ModRequest::EditNode(_, _) => "edit_node",
            ModRequest::EditEdge(_, _) => "edit_edge",
            ModRequest::BatchTargetDates(_) => "batch_targetdates",
            ModRequest::BatchTPass(_) => "batch_tpass",
            ModRequest::ListAdd { .. } => "list_add",
            ModRequest::ListRemove { .. } => "list_remove",
            ModRequest::ListDelete(_) => "list_delete",
        }
    }
}
