//! Indicator classification against reference ranges and ITP bands.

use crate::models::{Classification, Indicator, ItpAssessment, Status, TreatmentResponse};
use crate::reference::{itp, ReferenceTable};

/// Classify a value against the indicator's reference range.
///
/// Indicators without a table entry are `unknown` rather than an error.
pub fn classify(table: &ReferenceTable, indicator: Indicator, value: f64) -> Classification {
    let status = match table.range(indicator) {
        None => Status::Unknown,
        Some(_) if !value.is_finite() => Status::Unknown,
        Some(range) if value < range.min => Status::Low,
        Some(range) if value > range.max => Status::High,
        Some(_) => Status::Normal,
    };

    Classification {
        indicator,
        status,
        is_abnormal: status.is_abnormal(),
    }
}

/// ITP severity and bleeding risk for a platelet count.
pub fn assess_platelets(plt: Option<f64>) -> ItpAssessment {
    match plt.filter(|v| v.is_finite()) {
        None => ItpAssessment::unassessed(),
        Some(value) => {
            let severity = itp::severity_for(value);
            ItpAssessment {
                plt_status: Some(severity),
                bleeding_risk: Some(itp::bleeding_risk_for(severity)),
                treatment_response: None,
            }
        }
    }
}

/// Treatment response between a baseline and a follow-up platelet count.
pub fn assess_treatment_response(baseline_plt: f64, current_plt: f64) -> TreatmentResponse {
    itp::treatment_response_for(baseline_plt, current_plt)
}
