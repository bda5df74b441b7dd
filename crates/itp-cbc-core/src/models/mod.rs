//! Domain models for the CBC engine.

mod classification;
mod indicator;
mod panel;
mod trend;

pub use classification::*;
pub use indicator::*;
pub use panel::*;
pub use trend::*;
