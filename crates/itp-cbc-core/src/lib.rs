//! ITP CBC Core Library
//!
//! Interpretation engine for complete-blood-count reports of patients with
//! immune thrombocytopenia (ITP).
//!
//! # Architecture
//!
//! ```text
//! Report image → Recognition (host app) → PanelIntake
//!                                             │
//!                                     Validation → Panel
//!                                             │
//!                     ┌───────────────────────┼───────────────────────┐
//!                     │                       │                       │
//!                     ▼                       ▼                       ▼
//!               Classification          Report Store          Narrative Service
//!               + ITP assessment          (SQLite)              (cross-check)
//!                     │                       │
//!                     └──────────┬────────────┘
//!                                ▼
//!                   Trend Aggregation → Comparison
//! ```
//!
//! # Core Principle
//!
//! **The engine never diagnoses.** It classifies values against reference
//! ranges and reports trends; every label is reproducible from the inputs.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Indicator, Panel, PanelEvaluation, TrendSeries, etc.)
//! - [`reference`]: Versioned reference ranges and ITP thresholds
//! - [`engine`]: Classifier, evaluator, trend aggregator, comparison and label normalizer
//! - [`config`]: Analysis configuration
//! - [`db`]: SQLite report store
//! - [`services`]: History source and narrative service seams

pub mod config;
pub mod db;
pub mod engine;
pub mod models;
pub mod reference;
pub mod services;

// Re-export commonly used types
pub use config::{AnalysisConfig, DuplicateDatePolicy};
pub use db::{Database, ReportStatistics};
pub use engine::{Analyzer, Normalizer};
pub use models::{
    Classification, ComparisonResult, Indicator, OverallStatus, Panel, PanelEvaluation,
    PanelIntake, Status, TrendDirection, TrendSeries,
};
pub use reference::ReferenceTable;
pub use services::{HistorySource, NarrativeService};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ItpCbcError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for ItpCbcError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(id) => ItpCbcError::NotFound(id),
            other => ItpCbcError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ItpCbcError {
    fn from(e: serde_json::Error) -> Self {
        ItpCbcError::SerializationError(e.to_string())
    }
}

impl From<models::ValidationError> for ItpCbcError {
    fn from(e: models::ValidationError) -> Self {
        ItpCbcError::InvalidInput(e.to_string())
    }
}

impl From<services::HistoryError> for ItpCbcError {
    fn from(e: services::HistoryError) -> Self {
        match e {
            services::HistoryError::NotFound(id) => ItpCbcError::NotFound(id),
            services::HistoryError::Database(db) => db.into(),
            other => ItpCbcError::DatabaseError(other.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for ItpCbcError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ItpCbcError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a report store at the given path.
#[uniffi::export]
pub fn open_report_store(path: String) -> Result<Arc<ItpCbcCore>, ItpCbcError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(ItpCbcCore::new(db, Analyzer::standard())))
}

/// Open a report store with a JSON analysis configuration.
#[uniffi::export]
pub fn open_report_store_with_config(
    path: String,
    config_json: String,
) -> Result<Arc<ItpCbcCore>, ItpCbcError> {
    let config = AnalysisConfig::from_json(&config_json)?;
    let analyzer = Analyzer::new(ReferenceTable::standard(), config)?;
    let db = Database::open(&path)?;
    Ok(Arc::new(ItpCbcCore::new(db, analyzer)))
}

/// Create an in-memory report store (for testing).
#[uniffi::export]
pub fn open_report_store_in_memory() -> Result<Arc<ItpCbcCore>, ItpCbcError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(ItpCbcCore::new(db, Analyzer::standard())))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe engine and store wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ItpCbcCore {
    db: Arc<Mutex<Database>>,
    analyzer: Analyzer,
}

impl ItpCbcCore {
    fn new(db: Database, analyzer: Analyzer) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            analyzer,
        }
    }

    fn load_report(&self, db: &Database, report_id: &str) -> Result<Panel, ItpCbcError> {
        db.get_report(report_id)?
            .ok_or_else(|| ItpCbcError::NotFound(report_id.to_string()))
    }
}

#[uniffi::export]
impl ItpCbcCore {
    // =========================================================================
    // Report Operations
    // =========================================================================

    /// Validate, store and evaluate a panel given in the JSON ingestion shape.
    pub fn submit_panel(&self, intake_json: String) -> Result<FfiSubmission, ItpCbcError> {
        let intake = PanelIntake::from_json(&intake_json)?;
        let panel = intake.into_panel(self.analyzer.table())?;

        let db = self.db.lock()?;
        let duplicate_of = db
            .find_by_fingerprint(&panel.fingerprint())?
            .map(|existing| existing.report_id().to_string());
        if let Some(existing) = &duplicate_of {
            tracing::warn!(report_id = panel.report_id(), duplicate_of = %existing, "report values already stored");
        }
        db.insert_report(&panel)?;

        let evaluation = self.analyzer.evaluate(&panel);
        Ok(FfiSubmission {
            report: panel.into(),
            evaluation: evaluation.into(),
            duplicate_of,
        })
    }

    /// Get a report by ID.
    pub fn get_report(&self, report_id: String) -> Result<Option<FfiReport>, ItpCbcError> {
        let db = self.db.lock()?;
        let report = db.get_report(&report_id)?;
        Ok(report.map(|r| r.into()))
    }

    /// A patient's reports, oldest first.
    pub fn list_patient_reports(&self, patient_id: String) -> Result<Vec<FfiReport>, ItpCbcError> {
        let db = self.db.lock()?;
        let reports = db.list_reports_for_patient(&patient_id)?;
        Ok(reports.into_iter().map(|r| r.into()).collect())
    }

    /// Search reports by patient name, hospital or notes.
    pub fn search_reports(&self, query: String) -> Result<Vec<FfiReport>, ItpCbcError> {
        let db = self.db.lock()?;
        let reports = db.search_reports(&query)?;
        Ok(reports.into_iter().map(|r| r.into()).collect())
    }

    /// Delete a report. Returns false if it did not exist.
    pub fn delete_report(&self, report_id: String) -> Result<bool, ItpCbcError> {
        let db = self.db.lock()?;
        Ok(db.delete_report(&report_id)?)
    }

    /// Store-wide statistics.
    pub fn report_statistics(&self) -> Result<FfiReportStatistics, ItpCbcError> {
        let db = self.db.lock()?;
        Ok(db.report_statistics()?.into())
    }

    // =========================================================================
    // Analysis Operations
    // =========================================================================

    /// Evaluate a stored report.
    pub fn evaluate_report(&self, report_id: String) -> Result<FfiEvaluation, ItpCbcError> {
        let db = self.db.lock()?;
        let panel = self.load_report(&db, &report_id)?;
        Ok(self.analyzer.evaluate(&panel).into())
    }

    /// Compare a stored report against the patient's other reports.
    pub fn compare_report(&self, report_id: String) -> Result<FfiComparison, ItpCbcError> {
        let db = self.db.lock()?;
        let result = services::compare_report(&*db, &report_id, &self.analyzer)?;
        Ok(result.into())
    }

    /// Classify a single value by ingestion key.
    pub fn classify_value(&self, indicator: String, value: f64) -> Result<FfiClassification, ItpCbcError> {
        let indicator = Indicator::from_key(&indicator)
            .ok_or_else(|| ItpCbcError::InvalidInput(format!("Unknown indicator: {}", indicator)))?;
        Ok(self.analyzer.classify(indicator, value).into())
    }

    /// The reference table in use.
    pub fn reference_ranges(&self) -> Vec<FfiReferenceRange> {
        self.analyzer
            .table()
            .entries()
            .into_iter()
            .map(|e| FfiReferenceRange {
                indicator: e.indicator.key().to_string(),
                abbreviation: e.indicator.abbreviation().to_string(),
                unit: e.unit.clone(),
                min: e.range.min,
                max: e.range.max,
            })
            .collect()
    }

    /// Version tag of the reference table in use.
    pub fn reference_version(&self) -> String {
        self.analyzer.table().version().to_string()
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe observation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiObservation {
    pub indicator: String,
    pub abbreviation: String,
    pub value: f64,
    pub unit: String,
    pub reference_min: Option<f64>,
    pub reference_max: Option<f64>,
}

impl From<&models::Observation> for FfiObservation {
    fn from(o: &models::Observation) -> Self {
        Self {
            indicator: o.indicator.key().to_string(),
            abbreviation: o.indicator.abbreviation().to_string(),
            value: o.value,
            unit: o.unit.clone(),
            reference_min: o.reference_range.map(|r| r.min),
            reference_max: o.reference_range.map(|r| r.max),
        }
    }
}

/// FFI-safe report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReport {
    pub report_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub hospital: String,
    /// YYYY-MM-DD
    pub test_date: String,
    /// RFC 3339
    pub collected_at: String,
    pub observations: Vec<FfiObservation>,
    pub notes: Option<String>,
    pub ignored_fields: Vec<String>,
}

impl From<Panel> for FfiReport {
    fn from(panel: Panel) -> Self {
        Self {
            report_id: panel.report_id().to_string(),
            patient_id: panel.patient_id().to_string(),
            patient_name: panel.patient_name().to_string(),
            hospital: panel.hospital().to_string(),
            test_date: panel.test_date().format("%Y-%m-%d").to_string(),
            collected_at: panel.collected_at().to_rfc3339(),
            observations: panel.observations().iter().map(|o| o.into()).collect(),
            notes: panel.notes().map(|n| n.to_string()),
            ignored_fields: panel.ignored_fields().to_vec(),
        }
    }
}

/// FFI-safe classification.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClassification {
    pub indicator: String,
    pub status: String,
    pub is_abnormal: bool,
}

impl From<Classification> for FfiClassification {
    fn from(c: Classification) -> Self {
        Self {
            indicator: c.indicator.key().to_string(),
            status: c.status.as_str().to_string(),
            is_abnormal: c.is_abnormal,
        }
    }
}

/// FFI-safe panel evaluation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiEvaluation {
    pub classifications: Vec<FfiClassification>,
    pub abnormal_count: u32,
    pub overall_status: String,
    pub plt_status: Option<String>,
    pub bleeding_risk: Option<String>,
}

impl From<PanelEvaluation> for FfiEvaluation {
    fn from(eval: PanelEvaluation) -> Self {
        Self {
            classifications: eval.classifications.into_values().map(|c| c.into()).collect(),
            abnormal_count: eval.abnormal_count as u32,
            overall_status: eval.overall_status.as_str().to_string(),
            plt_status: eval.itp_assessment.plt_status.map(|s| s.as_str().to_string()),
            bleeding_risk: eval.itp_assessment.bleeding_risk.map(|r| r.as_str().to_string()),
        }
    }
}

/// FFI-safe submission result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSubmission {
    pub report: FfiReport,
    pub evaluation: FfiEvaluation,
    /// Earlier report with identical patient, date and values
    pub duplicate_of: Option<String>,
}

/// FFI-safe trend series.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTrendSeries {
    pub indicator: String,
    pub values: Vec<f64>,
    pub dates: Vec<String>,
    pub trend: String,
}

impl From<TrendSeries> for FfiTrendSeries {
    fn from(series: TrendSeries) -> Self {
        Self {
            indicator: series.indicator.key().to_string(),
            values: series.values,
            dates: series
                .dates
                .iter()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect(),
            trend: series.trend.as_str().to_string(),
        }
    }
}

/// FFI-safe comparison result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiComparison {
    pub trends: Vec<FfiTrendSeries>,
    pub abnormal_changes: Vec<String>,
    pub comparison_summary: String,
    pub improved: u32,
    pub worsened: u32,
    pub unchanged: u32,
    pub flagged: u32,
    pub treatment_response: Option<String>,
}

impl From<ComparisonResult> for FfiComparison {
    fn from(result: ComparisonResult) -> Self {
        Self {
            trends: result.trends.into_values().map(|t| t.into()).collect(),
            abnormal_changes: result.abnormal_changes,
            comparison_summary: result.comparison_summary,
            improved: result.counts.improved as u32,
            worsened: result.counts.worsened as u32,
            unchanged: result.counts.unchanged as u32,
            flagged: result.counts.flagged as u32,
            treatment_response: result.treatment_response.map(|r| r.as_str().to_string()),
        }
    }
}

/// FFI-safe reference range.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReferenceRange {
    pub indicator: String,
    pub abbreviation: String,
    pub unit: String,
    pub min: f64,
    pub max: f64,
}

/// FFI-safe store statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReportStatistics {
    pub total_reports: u64,
    pub total_patients: u64,
    pub earliest_test_date: Option<String>,
    pub latest_test_date: Option<String>,
    pub abnormal_observations: u64,
}

impl From<ReportStatistics> for FfiReportStatistics {
    fn from(stats: ReportStatistics) -> Self {
        Self {
            total_reports: stats.total_reports,
            total_patients: stats.total_patients,
            earliest_test_date: stats.earliest_test_date.map(|d| d.format("%Y-%m-%d").to_string()),
            latest_test_date: stats.latest_test_date.map(|d| d.format("%Y-%m-%d").to_string()),
            abnormal_observations: stats.abnormal_observations,
        }
    }
}
