//! The EPS map and three-pass target-date update scheduler: the slot
//! reservation layer of the scheduling core.

pub mod map;
pub mod scheduler;

pub use map::{EpsFlags, EpsMap};
pub use scheduler::{break_group, run, EpsUpdateResult};
