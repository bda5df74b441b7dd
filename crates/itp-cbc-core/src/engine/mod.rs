//! Interpretation engine for CBC panels.
//!
//! Pipeline: Classification → Panel Evaluation → Trend Aggregation → Comparison

mod aggregator;
mod classifier;
mod comparison;
mod evaluator;
mod normalizer;

pub use aggregator::*;
pub use classifier::*;
pub use comparison::*;
pub use evaluator::*;
pub use normalizer::*;

use std::collections::BTreeMap;

use crate::config::AnalysisConfig;
use crate::models::{
    Classification, ComparisonResult, Indicator, Panel, PanelEvaluation, TrendSeries,
    ValidationResult,
};
use crate::reference::ReferenceTable;

/// Engine entry point holding the reference table and configuration.
///
/// Every operation is a pure function of its inputs; the analyzer only saves
/// passing the table and config around.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    table: ReferenceTable,
    config: AnalysisConfig,
}

impl Analyzer {
    /// Create an analyzer, rejecting an invalid configuration.
    pub fn new(table: ReferenceTable, config: AnalysisConfig) -> ValidationResult<Self> {
        config.validate()?;
        Ok(Self { table, config })
    }

    /// Standard adult reference table with default configuration.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Classify a single value.
    pub fn classify(&self, indicator: Indicator, value: f64) -> Classification {
        classify(&self.table, indicator, value)
    }

    /// Evaluate a whole panel.
    pub fn evaluate(&self, panel: &Panel) -> PanelEvaluation {
        evaluate(&self.table, panel)
    }

    /// Build trend series over one patient's panels.
    pub fn aggregate(&self, history: &[Panel]) -> BTreeMap<Indicator, TrendSeries> {
        aggregate(history, &self.config)
    }

    /// Compare a report against the patient's history.
    pub fn compare(&self, focal: &Panel, history: &[Panel]) -> ComparisonResult {
        compare(&self.table, &self.config, focal, history)
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}
