//! Lab-report recognition parsing.
//!
//! Turns the output of a vision/OCR recognizer (JSON from a model, or plain
//! report text) into a [`itp_cbc_core::PanelIntake`] ready for validation.

pub mod extraction;
pub mod prompts;

pub use extraction::*;
pub use prompts::*;
