//! Static domain knowledge: reference ranges and ITP thresholds.

pub mod itp;
mod ranges;

pub use ranges::*;
