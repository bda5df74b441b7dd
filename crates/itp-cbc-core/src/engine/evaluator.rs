//! Whole-panel evaluation and status rollup.

use std::collections::BTreeMap;

use crate::models::{Classification, Indicator, OverallStatus, Panel, PanelEvaluation, Status};
use crate::reference::ReferenceTable;

use super::classifier::{assess_platelets, classify};

/// Classify every observation of a panel and roll the results up.
pub fn evaluate(table: &ReferenceTable, panel: &Panel) -> PanelEvaluation {
    let classifications: BTreeMap<Indicator, Classification> = panel
        .observations()
        .iter()
        .map(|o| (o.indicator, classify(table, o.indicator, o.value)))
        .collect();

    let abnormal_count = classifications.values().filter(|c| c.is_abnormal).count();
    let overall_status = rollup(&classifications);

    tracing::debug!(
        report_id = panel.report_id(),
        observations = classifications.len(),
        abnormal_count,
        status = overall_status.as_str(),
        "evaluated panel"
    );

    PanelEvaluation {
        itp_assessment: assess_platelets(panel.value(Indicator::Plt)),
        classifications,
        abnormal_count,
        overall_status,
    }
}

/// Overall status of a set of classifications.
///
/// `abnormal` if any critical indicator is out of range, `attention` if only
/// non-critical ones are, `unknown` when nothing could be classified,
/// `normal` otherwise.
pub fn rollup(classifications: &BTreeMap<Indicator, Classification>) -> OverallStatus {
    if classifications.values().all(|c| c.status == Status::Unknown) {
        return OverallStatus::Unknown;
    }

    let abnormal = || classifications.values().filter(|c| c.is_abnormal);

    if abnormal().any(|c| c.indicator.is_critical()) {
        OverallStatus::Abnormal
    } else if abnormal().next().is_some() {
        OverallStatus::Attention
    } else {
        OverallStatus::Normal
    }
}
