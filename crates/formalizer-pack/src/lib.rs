//! The day-packing scheduler: produces a concrete minute-resolution
//! schedule from a post-EPS-update Graph.

pub mod pack;

pub use pack::{run, PackFlags, PackGrid, PackResult, PackStatus};
