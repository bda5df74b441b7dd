//! Collaborators outside the engine: report history and narrative services.

mod history;
mod narrative;

pub use history::*;
pub use narrative::*;
