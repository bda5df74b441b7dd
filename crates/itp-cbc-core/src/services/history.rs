//! Report history access.

use thiserror::Error;

use crate::db::{Database, DbError};
use crate::engine::Analyzer;
use crate::models::{ComparisonResult, Panel};

/// History source errors.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Report not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("History source unavailable: {0}")]
    Unavailable(String),
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Read-only access to stored reports.
///
/// Each call is a snapshot; the engine never writes through a source.
pub trait HistorySource {
    /// Fetch a single report.
    fn fetch_report(&self, report_id: &str) -> HistoryResult<Option<Panel>>;

    /// All reports of a patient. Order is not significant.
    fn patient_history(&self, patient_id: &str) -> HistoryResult<Vec<Panel>>;
}

impl HistorySource for Database {
    fn fetch_report(&self, report_id: &str) -> HistoryResult<Option<Panel>> {
        Ok(self.get_report(report_id)?)
    }

    fn patient_history(&self, patient_id: &str) -> HistoryResult<Vec<Panel>> {
        Ok(self.list_reports_for_patient(patient_id)?)
    }
}

/// Compare a stored report against the rest of its patient's history.
pub fn compare_report<S>(source: &S, report_id: &str, analyzer: &Analyzer) -> HistoryResult<ComparisonResult>
where
    S: HistorySource + ?Sized,
{
    let focal = source
        .fetch_report(report_id)?
        .ok_or_else(|| HistoryError::NotFound(report_id.to_string()))?;
    let history = source.patient_history(focal.patient_id())?;

    Ok(analyzer.compare(&focal, &history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    use crate::engine::INSUFFICIENT_HISTORY_SUMMARY;
    use crate::models::{Indicator, PanelIntake, TrendDirection};
    use crate::reference::ReferenceTable;

    fn report(patient: &str, day: u32, plt: f64) -> Panel {
        PanelIntake::new(patient, NaiveDate::from_ymd_opt(2024, 8, day).unwrap())
            .with_value(Indicator::Plt, plt)
            .into_panel(&ReferenceTable::standard())
            .unwrap()
    }

    /// In-memory source keyed by report id.
    struct MapSource(HashMap<String, Panel>);

    impl HistorySource for MapSource {
        fn fetch_report(&self, report_id: &str) -> HistoryResult<Option<Panel>> {
            Ok(self.0.get(report_id).cloned())
        }

        fn patient_history(&self, patient_id: &str) -> HistoryResult<Vec<Panel>> {
            Ok(self
                .0
                .values()
                .filter(|p| p.patient_id() == patient_id)
                .cloned()
                .collect())
        }
    }

    #[test]
    fn test_compare_stored_report() {
        let db = Database::open_in_memory().unwrap();
        let focal = report("p", 20, 100.0);
        for panel in [report("p", 1, 300.0), report("p", 10, 250.0), focal.clone(), report("q", 5, 20.0)] {
            db.insert_report(&panel).unwrap();
        }

        let result = compare_report(&db, focal.report_id(), &Analyzer::standard()).unwrap();
        let plt = &result.trends[&Indicator::Plt];
        assert_eq!(plt.values, vec![300.0, 250.0, 100.0]);
        assert_eq!(plt.trend, TrendDirection::Falling);
        assert_eq!(result.abnormal_changes.len(), 1);
    }

    #[test]
    fn test_unknown_report() {
        let db = Database::open_in_memory().unwrap();
        let err = compare_report(&db, "missing", &Analyzer::standard()).unwrap_err();
        assert!(matches!(err, HistoryError::NotFound(ref id) if id == "missing"));
    }

    #[test]
    fn test_custom_source() {
        let only = report("p", 3, 40.0);
        let source = MapSource(HashMap::from([(only.report_id().to_string(), only.clone())]));

        let result = compare_report(&source, only.report_id(), &Analyzer::standard()).unwrap();
        assert_eq!(result.comparison_summary, INSUFFICIENT_HISTORY_SUMMARY);
    }
}
