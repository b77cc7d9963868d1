//! Error types for the identifier, time, and graph-store layers:
//! `thiserror`-derived enums with one `#[error("...")]` message per
//! variant.

use thiserror::Error;

use crate::id::{EdgeId, NodeId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid node id: {0}")]
    InvalidId(String),
    #[error("malformed timestamp: {0}")]
    BadTimestamp(String),
    #[error("unknown target-date pattern")]
    UnknownPattern,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimeError {
    #[error("attempted to advance a non-periodic target date")]
    NonPeriodic,
    #[error("resulting timestamp is out of range")]
    BadTimestamp,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node id {0} already exists")]
    IdCollision(NodeId),
    #[error("edge endpoint missing: {0}")]
    EndpointMissing(NodeId),
    #[error("edge {0} already exists")]
    DuplicateEdge(EdgeId),
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),
    #[error("topic tag '{0}' is not registered")]
    UnknownTopic(String),
    #[error("node {0} carries no topic tags")]
    NoTopicTags(NodeId),
    #[error("named node list '{0}' not found")]
    ListNotFound(String),
    #[error("named node list '{0}' is full")]
    ListFull(String),
    #[error("node {0} is already a member of list '{1}'")]
    ListDuplicate(NodeId, String),
    #[error("repeating node {0} must have a periodic pattern and a fixed/exact/inherit property")]
    InvalidRepeatConfig(NodeId),
    #[error("scalar value {0} for node/edge field is outside [0, 1]")]
    ScalarOutOfRange(f64),
}
