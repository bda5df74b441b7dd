//! FFI facade integration tests.

use itp_cbc_core::{open_report_store, open_report_store_in_memory, open_report_store_with_config, ItpCbcError};

fn intake(report_id: &str, date: &str, plt: f64) -> String {
    format!(
        r#"{{"report_id": "{report_id}", "patient_id": "p-1", "patient_name": "Li Wei", "hospital": "Central Hospital", "test_date": "{date}", "plt": {plt}, "hgb": 128}}"#
    )
}

#[test]
fn test_submit_and_evaluate() {
    let core = open_report_store_in_memory().unwrap();

    let submission = core.submit_panel(intake("r1", "2024-04-01", 35.0)).unwrap();
    assert_eq!(submission.report.report_id, "r1");
    assert_eq!(submission.report.test_date, "2024-04-01");
    assert_eq!(submission.evaluation.overall_status, "abnormal");
    assert_eq!(submission.evaluation.plt_status.as_deref(), Some("severe"));
    assert_eq!(submission.evaluation.bleeding_risk.as_deref(), Some("high"));
    assert_eq!(submission.duplicate_of, None);

    let evaluation = core.evaluate_report("r1".into()).unwrap();
    assert_eq!(evaluation.abnormal_count, 1);
    assert_eq!(evaluation.classifications.len(), 2);
}

#[test]
fn test_invalid_submission() {
    let core = open_report_store_in_memory().unwrap();

    let err = core
        .submit_panel(r#"{"patient_id": "p-1", "test_date": "2024-04-01", "plt": "n/a"}"#.into())
        .unwrap_err();
    assert!(matches!(err, ItpCbcError::InvalidInput(_)));

    let err = core.submit_panel("{not json".into()).unwrap_err();
    assert!(matches!(err, ItpCbcError::SerializationError(_)));

    core.submit_panel(intake("r1", "2024-04-01", 35.0)).unwrap();
    let err = core.submit_panel(intake("r1", "2024-04-02", 40.0)).unwrap_err();
    assert!(matches!(err, ItpCbcError::DatabaseError(_)));
}

#[test]
fn test_duplicate_upload_detected() {
    let core = open_report_store_in_memory().unwrap();
    core.submit_panel(intake("r1", "2024-04-01", 35.0)).unwrap();

    let again = core.submit_panel(intake("r2", "2024-04-01", 35.0)).unwrap();
    assert_eq!(again.duplicate_of.as_deref(), Some("r1"));
}

#[test]
fn test_compare_report() {
    let core = open_report_store_in_memory().unwrap();
    core.submit_panel(intake("r1", "2024-01-01", 20.0)).unwrap();
    core.submit_panel(intake("r2", "2024-02-01", 45.0)).unwrap();
    core.submit_panel(intake("r3", "2024-03-01", 110.0)).unwrap();

    let comparison = core.compare_report("r3".into()).unwrap();
    let plt = comparison.trends.iter().find(|t| t.indicator == "plt").unwrap();
    assert_eq!(plt.values, vec![20.0, 45.0, 110.0]);
    assert_eq!(plt.dates, vec!["2024-01-01", "2024-02-01", "2024-03-01"]);
    assert_eq!(plt.trend, "rising");
    assert_eq!(comparison.improved, 1);
    assert_eq!(comparison.treatment_response.as_deref(), Some("complete_response"));

    let err = core.compare_report("missing".into()).unwrap_err();
    assert!(matches!(err, ItpCbcError::NotFound(_)));
}

#[test]
fn test_classify_value_and_ranges() {
    let core = open_report_store_in_memory().unwrap();

    let c = core.classify_value("plt".into(), 80.0).unwrap();
    assert_eq!(c.status, "low");
    assert!(c.is_abnormal);

    let err = core.classify_value("crp".into(), 5.0).unwrap_err();
    assert!(matches!(err, ItpCbcError::InvalidInput(_)));

    let ranges = core.reference_ranges();
    assert_eq!(ranges.len(), 22);
    let plt = ranges.iter().find(|r| r.indicator == "plt").unwrap();
    assert_eq!((plt.min, plt.max), (125.0, 350.0));
    assert_eq!(core.reference_version(), "cbc-adult-2024.1");
}

#[test]
fn test_listing_search_and_statistics() {
    let core = open_report_store_in_memory().unwrap();
    core.submit_panel(intake("r2", "2024-02-01", 60.0)).unwrap();
    core.submit_panel(intake("r1", "2024-01-01", 30.0)).unwrap();

    let reports = core.list_patient_reports("p-1".into()).unwrap();
    let ids: Vec<&str> = reports.iter().map(|r| r.report_id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r2"]);

    assert_eq!(core.search_reports("li wei".into()).unwrap().len(), 2);

    let stats = core.report_statistics().unwrap();
    assert_eq!(stats.total_reports, 2);
    assert_eq!(stats.total_patients, 1);
    assert_eq!(stats.earliest_test_date.as_deref(), Some("2024-01-01"));
    assert_eq!(stats.latest_test_date.as_deref(), Some("2024-02-01"));
    assert_eq!(stats.abnormal_observations, 2);

    assert!(core.delete_report("r1".into()).unwrap());
    assert!(core.get_report("r1".into()).unwrap().is_none());
}

#[test]
fn test_on_disk_store_with_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("itp.db").to_string_lossy().into_owned();

    {
        let core = open_report_store(path.clone()).unwrap();
        core.submit_panel(intake("r1", "2024-01-01", 100.0)).unwrap();
        core.submit_panel(intake("r2", "2024-02-01", 108.0)).unwrap();
        let comparison = core.compare_report("r2".into()).unwrap();
        let plt = comparison.trends.iter().find(|t| t.indicator == "plt").unwrap();
        assert_eq!(plt.trend, "rising");
    }

    let core = open_report_store_with_config(path.clone(), r#"{"trend_noise_threshold": 0.1}"#.into()).unwrap();
    let plt = core
        .compare_report("r2".into())
        .unwrap()
        .trends
        .into_iter()
        .find(|t| t.indicator == "plt")
        .unwrap();
    assert_eq!(plt.trend, "stable");

    let result = open_report_store_with_config(path, r#"{"trend_noise_threshold": -1}"#.into());
    assert!(matches!(result, Err(ItpCbcError::InvalidInput(_))));
}
