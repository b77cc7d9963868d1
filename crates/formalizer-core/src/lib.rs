//! Identifiers, the Graph store, and the effective target-date engine for
//! the formalizer scheduling core.
//!
//! This crate holds Node/Edge identifiers and date arithmetic, the
//! in-memory Graph arena, and effective-target-date resolution. The
//! modification-request protocol lives in `formalizer-proto`; the EPS
//! map/scheduler in `formalizer-eps`; the day-packing scheduler in
//! `formalizer-pack`.

pub mod config;
pub mod effective_td;
pub mod error;
pub mod exit_code;
pub mod graph;
pub mod id;
pub mod time;
pub mod warning;

pub use config::Config;
pub use effective_td::{effective_targetdate, repeating_instances, EffectiveTargetDate, MAX_INHERIT_DEPTH};
pub use error::{GraphError, IdError, TimeError};
pub use exit_code::ExitCode;
pub use graph::{
    Edge, EdgeEdit, GraphStore, NamedNodeList, Node, NodeEdit, TdProperty, Topic, TopicId,
    LIST_INCOMPLETE, LIST_RECENT, LIST_SHORTLIST,
};
pub use id::{EdgeId, NodeId};
pub use time::{add_to_date, day_start_time, time_add_day, time_add_month, today_end_time, TdPattern, DAY, MINUTE, T_MAX};
pub use warning::Warning;
