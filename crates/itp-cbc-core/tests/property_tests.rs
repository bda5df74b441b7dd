//! Property tests for classification and ITP banding.

use itp_cbc_core::engine::{assess_platelets, classify, direction};
use itp_cbc_core::models::{Indicator, Status, TrendDirection};
use itp_cbc_core::reference::itp::{bleeding_risk_for, severity_for, PLT_MILD_BELOW};
use itp_cbc_core::ReferenceTable;
use proptest::prelude::*;
use proptest::sample::select;

fn any_indicator() -> impl Strategy<Value = Indicator> {
    select(Indicator::ALL.to_vec())
}

proptest! {
    #[test]
    fn values_inside_range_are_normal(indicator in any_indicator(), t in 0.0f64..=1.0) {
        let table = ReferenceTable::standard();
        let range = table.range(indicator).unwrap();
        let value = (range.min + (range.max - range.min) * t).clamp(range.min, range.max);

        let c = classify(&table, indicator, value);
        prop_assert_eq!(c.status, Status::Normal);
        prop_assert!(!c.is_abnormal);
    }

    #[test]
    fn values_outside_range_are_flagged(
        indicator in any_indicator(),
        below in 0.001f64..1000.0,
        above in 0.001f64..1000.0,
    ) {
        let table = ReferenceTable::standard();
        let range = table.range(indicator).unwrap();

        let low = classify(&table, indicator, range.min - below);
        prop_assert_eq!(low.status, Status::Low);
        prop_assert!(low.is_abnormal);

        let high = classify(&table, indicator, range.max + above);
        prop_assert_eq!(high.status, Status::High);
        prop_assert!(high.is_abnormal);
    }

    #[test]
    fn severity_is_monotonic(a in 0.0f64..PLT_MILD_BELOW, b in 0.0f64..PLT_MILD_BELOW) {
        let (p1, p2) = if a <= b { (a, b) } else { (b, a) };
        let (s1, s2) = (severity_for(p1), severity_for(p2));

        // Lower counts are at least as severe.
        prop_assert!(s1 >= s2);
        prop_assert!(bleeding_risk_for(s1) >= bleeding_risk_for(s2));
    }

    #[test]
    fn platelet_assessment_always_present(plt in 0.0f64..2000.0) {
        let assessment = assess_platelets(Some(plt));
        let severity = assessment.plt_status.unwrap();
        prop_assert_eq!(assessment.bleeding_risk, Some(bleeding_risk_for(severity)));
    }

    #[test]
    fn small_changes_are_stable(prev in 1.0f64..1000.0, t in -1.0f64..=1.0) {
        let latest = prev * (1.0 + 0.049 * t);
        prop_assert_eq!(direction(prev, latest, 0.05), TrendDirection::Stable);
    }
}
