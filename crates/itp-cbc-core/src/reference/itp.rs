//! ITP platelet thresholds and lookup tables.
//!
//! All counts are in 10^9/L.

use crate::models::{BleedingRisk, PltSeverity, TreatmentResponse};

/// Below this count the thrombocytopenia is severe.
pub const PLT_SEVERE_BELOW: f64 = 50.0;

/// Below this count the thrombocytopenia is moderate.
pub const PLT_MODERATE_BELOW: f64 = 100.0;

/// Below this count the thrombocytopenia is mild; at or above it is normal.
pub const PLT_MILD_BELOW: f64 = 150.0;

/// Severity bands ordered from the lowest upper bound.
pub const SEVERITY_BANDS: [(f64, PltSeverity); 3] = [
    (PLT_SEVERE_BELOW, PltSeverity::Severe),
    (PLT_MODERATE_BELOW, PltSeverity::Moderate),
    (PLT_MILD_BELOW, PltSeverity::Mild),
];

/// Bleeding risk per severity band.
pub const BLEEDING_RISK_TABLE: [(PltSeverity, BleedingRisk); 4] = [
    (PltSeverity::Normal, BleedingRisk::Minimal),
    (PltSeverity::Mild, BleedingRisk::Low),
    (PltSeverity::Moderate, BleedingRisk::Moderate),
    (PltSeverity::Severe, BleedingRisk::High),
];

/// Count at or above which a follow-up is a complete response.
pub const COMPLETE_RESPONSE_AT: f64 = 100.0;

/// Minimum count for a (partial) response.
pub const RESPONSE_AT: f64 = 30.0;

/// Required fold increase over baseline for a (partial) response.
pub const RESPONSE_FOLD: f64 = 2.0;

/// Map a platelet count onto its severity band.
pub fn severity_for(plt: f64) -> PltSeverity {
    SEVERITY_BANDS
        .iter()
        .find(|(below, _)| plt < *below)
        .map(|(_, severity)| *severity)
        .unwrap_or(PltSeverity::Normal)
}

/// Look up the bleeding risk for a severity band.
pub fn bleeding_risk_for(severity: PltSeverity) -> BleedingRisk {
    BLEEDING_RISK_TABLE
        .iter()
        .find(|(s, _)| *s == severity)
        .map(|(_, risk)| *risk)
        .unwrap_or(BleedingRisk::High)
}

/// Classify the response between a baseline and a follow-up platelet count.
pub fn treatment_response_for(baseline: f64, current: f64) -> TreatmentResponse {
    if current >= COMPLETE_RESPONSE_AT {
        TreatmentResponse::CompleteResponse
    } else if current >= RESPONSE_AT && current >= baseline * RESPONSE_FOLD {
        TreatmentResponse::Response
    } else {
        TreatmentResponse::NoResponse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(severity_for(0.0), PltSeverity::Severe);
        assert_eq!(severity_for(49.9), PltSeverity::Severe);
        assert_eq!(severity_for(50.0), PltSeverity::Moderate);
        assert_eq!(severity_for(99.9), PltSeverity::Moderate);
        assert_eq!(severity_for(100.0), PltSeverity::Mild);
        assert_eq!(severity_for(149.9), PltSeverity::Mild);
        assert_eq!(severity_for(150.0), PltSeverity::Normal);
        assert_eq!(severity_for(900.0), PltSeverity::Normal);
    }

    #[test]
    fn test_risk_table_covers_every_band() {
        for severity in [
            PltSeverity::Normal,
            PltSeverity::Mild,
            PltSeverity::Moderate,
            PltSeverity::Severe,
        ] {
            assert!(BLEEDING_RISK_TABLE.iter().any(|(s, _)| *s == severity));
        }
    }

    #[test]
    fn test_risk_table_is_monotonic() {
        for pair in BLEEDING_RISK_TABLE.windows(2) {
            assert!(pair[0].0 < pair[1].0);
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn test_treatment_response() {
        assert_eq!(treatment_response_for(20.0, 120.0), TreatmentResponse::CompleteResponse);
        assert_eq!(treatment_response_for(20.0, 45.0), TreatmentResponse::Response);
        // Above 30 but not doubled
        assert_eq!(treatment_response_for(25.0, 40.0), TreatmentResponse::NoResponse);
        // Doubled but still below 30
        assert_eq!(treatment_response_for(10.0, 25.0), TreatmentResponse::NoResponse);
    }
}
