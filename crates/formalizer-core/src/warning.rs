//! Policy warnings: conditions that should not abort a batch or a
//! scheduling pass but are worth surfacing to a caller or a log file.
//! They accumulate in a separate queue rather than aborting the run,
//! and are returned alongside the result for verbose callers.

use std::fmt;

use crate::id::NodeId;

/// One accumulated policy warning.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A repeating Node's required chunks do not fit within the interval
    /// between successive repeat occurrences (`config.warn_repeating_too_tight`).
    RepeatingTooTight {
        node: NodeId,
        required_secs: i64,
        interval_secs: i64,
    },
    /// An EPS group's end-of-day offset pushed its target date past the
    /// end of the day it was meant to land in.
    GroupOffsetExceedsEndOfDay { node: NodeId, new_td: i64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::RepeatingTooTight {
                node,
                required_secs,
                interval_secs,
            } => write!(
                f,
                "node {node} requires {required_secs}s per occurrence but repeats only every {interval_secs}s"
            ),
            Warning::GroupOffsetExceedsEndOfDay { node, new_td } => {
                write!(f, "node {node}'s end-of-day group offset pushed its target date to {new_td}, past end of day")
            }
        }
    }
}
