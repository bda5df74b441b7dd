//! End-to-end analysis scenarios.
//!
//! Panels enter through the JSON ingestion shape, exactly as the host app
//! submits them.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use itp_cbc_core::engine::{aggregate, compare, evaluate};
use itp_cbc_core::models::{BleedingRisk, Indicator, PltSeverity, TrendDirection};
use itp_cbc_core::{AnalysisConfig, Panel, PanelIntake, ReferenceTable};

fn panel_from_json(json: &str) -> Panel {
    PanelIntake::from_json(json)
        .unwrap()
        .into_panel(&ReferenceTable::standard())
        .unwrap()
}

fn platelet_history() -> Vec<Panel> {
    vec![
        panel_from_json(r#"{"report_id": "r1", "patient_id": "p-1", "test_date": "2024-01-05", "plt": 300}"#),
        panel_from_json(r#"{"report_id": "r2", "patient_id": "p-1", "test_date": "2024-02-05", "plt": 250}"#),
        panel_from_json(r#"{"report_id": "r3", "patient_id": "p-1", "test_date": "2024-03-05", "plt": 100}"#),
    ]
}

#[test]
fn test_platelet_series_falls() {
    let trends = aggregate(&platelet_history(), &AnalysisConfig::default());

    let plt = &trends[&Indicator::Plt];
    assert_eq!(plt.values, vec![300.0, 250.0, 100.0]);
    assert_eq!(
        plt.dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        ]
    );
    assert_eq!(plt.trend, TrendDirection::Falling);
}

#[test]
fn test_single_panel_has_no_trends() {
    let history = &platelet_history()[..1];
    assert!(aggregate(history, &AnalysisConfig::default()).is_empty());
}

#[test]
fn test_compare_with_empty_history() {
    let focal = panel_from_json(r#"{"patient_id": "p-1", "test_date": "2024-03-05", "plt": 100, "hgb": 98}"#);
    let result = compare(&ReferenceTable::standard(), &AnalysisConfig::default(), &focal, &[]);

    assert!(result.trends.is_empty());
    assert!(result.abnormal_changes.is_empty());
    assert!(!result.comparison_summary.is_empty());
}

#[test]
fn test_compare_latest_report() {
    let history = platelet_history();
    let focal = &history[2];
    let result = compare(&ReferenceTable::standard(), &AnalysisConfig::default(), focal, &history);

    assert_eq!(result.trends[&Indicator::Plt].len(), 3);
    assert_eq!(result.abnormal_changes, vec!["PLT falling: 250 -> 100 (-60.0%)".to_string()]);
    assert_eq!(result.counts.flagged, 1);
    assert!(result.comparison_summary.contains("1 worsened"));
}

#[test]
fn test_evaluate_is_idempotent() {
    let table = ReferenceTable::standard();
    let panel = panel_from_json(
        r#"{"patient_id": "p-1", "test_date": "2024-03-05", "plt": 42, "wbc": 2.9, "hgb": 101, "mpv": 13.1}"#,
    );

    let first = evaluate(&table, &panel);
    let second = evaluate(&table, &panel);

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_classification_keys_match_observations() {
    let table = ReferenceTable::standard();
    let panel = panel_from_json(
        r#"{"patient_id": "p-1", "test_date": "2024-03-05", "plt": 42, "neut_percent": 80, "rbc": 4.1, "p_lcr": 30, "esr": 12}"#,
    );

    let evaluation = evaluate(&table, &panel);
    let observed: BTreeSet<Indicator> = panel.observations().iter().map(|o| o.indicator).collect();
    let classified: BTreeSet<Indicator> = evaluation.classifications.keys().copied().collect();

    assert_eq!(observed, classified);
    assert_eq!(classified.len(), 4);
}

#[test]
fn test_platelet_assessment_scenarios() {
    let table = ReferenceTable::standard();

    let severe = evaluate(&table, &panel_from_json(r#"{"patient_id": "p", "test_date": "2024-01-01", "plt": 15}"#));
    assert_eq!(severe.itp_assessment.plt_status, Some(PltSeverity::Severe));
    assert_eq!(severe.itp_assessment.bleeding_risk, Some(BleedingRisk::High));

    let normal = evaluate(&table, &panel_from_json(r#"{"patient_id": "p", "test_date": "2024-01-01", "plt": 180}"#));
    assert_eq!(normal.itp_assessment.plt_status, Some(PltSeverity::Normal));
    assert_eq!(normal.itp_assessment.bleeding_risk, Some(BleedingRisk::Minimal));
}

#[test]
fn test_serialized_enums_are_identifiers() {
    let table = ReferenceTable::standard();
    let evaluation = evaluate(&table, &panel_from_json(r#"{"patient_id": "p", "test_date": "2024-01-01", "plt": 15}"#));
    let json = serde_json::to_value(&evaluation).unwrap();

    assert_eq!(json["overall_status"], "abnormal");
    assert_eq!(json["classifications"]["plt"]["status"], "low");
    assert_eq!(json["itp_assessment"]["plt_status"], "severe");
    assert_eq!(json["itp_assessment"]["bleeding_risk"], "high");
}
