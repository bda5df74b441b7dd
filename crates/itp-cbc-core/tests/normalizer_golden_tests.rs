//! Golden tests for report label normalization.
//!
//! Labels are taken from real printed reports and recognizer output.

use itp_cbc_core::engine::Normalizer;
use itp_cbc_core::models::Indicator;

/// Test case from golden file.
struct GoldenCase {
    id: &'static str,
    label: &'static str,
    expected: Option<Indicator>,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase { id: "plt-abbrev", label: "PLT", expected: Some(Indicator::Plt) },
        GoldenCase { id: "plt-zh", label: "血小板计数", expected: Some(Indicator::Plt) },
        GoldenCase { id: "plt-zh-with-abbrev", label: "血小板计数(PLT)", expected: Some(Indicator::Plt) },
        GoldenCase { id: "plt-typo", label: "Platlets", expected: Some(Indicator::Plt) },
        GoldenCase { id: "hgb-short", label: "Hb", expected: Some(Indicator::Hgb) },
        GoldenCase { id: "hgb-colloquial-zh", label: "血色素", expected: Some(Indicator::Hgb) },
        GoldenCase { id: "wbc-english", label: "White Blood Cells", expected: Some(Indicator::Wbc) },
        GoldenCase { id: "neut-percent", label: "NEUT%", expected: Some(Indicator::NeutPercent) },
        GoldenCase { id: "neut-count-zh", label: "中性粒细胞绝对值", expected: Some(Indicator::NeutCount) },
        GoldenCase { id: "lymph-percent-zh", label: "淋巴细胞百分比", expected: Some(Indicator::LymphPercent) },
        GoldenCase { id: "mchc-with-unit", label: "MCHC (g/L)", expected: Some(Indicator::Mchc) },
        GoldenCase { id: "mch-plain", label: "MCH", expected: Some(Indicator::Mch) },
        GoldenCase { id: "hct-zh", label: "红细胞比容", expected: Some(Indicator::Hct) },
        GoldenCase { id: "plcr", label: "P-LCR", expected: Some(Indicator::PLcr) },
        GoldenCase { id: "mpv-zh", label: "平均血小板体积：", expected: Some(Indicator::Mpv) },
        GoldenCase { id: "ingestion-key", label: "baso_count", expected: Some(Indicator::BasoCount) },
        GoldenCase { id: "mch-zh-short", label: "平均血红蛋白含量", expected: Some(Indicator::Mch) },
        GoldenCase { id: "mchc-zh-short", label: "平均血红蛋白浓度", expected: Some(Indicator::Mchc) },
        GoldenCase { id: "neut-percent-zh-variant", label: "中性粒细胞百分数", expected: Some(Indicator::NeutPercent) },
        GoldenCase { id: "eos-percent-zh-variant", label: "嗜酸性粒细胞百分数", expected: Some(Indicator::EosPercent) },
        GoldenCase { id: "pdw-zh-with-abbrev", label: "血小板分布宽度（PDW）", expected: Some(Indicator::Pdw) },
        GoldenCase { id: "rdw-zh", label: "红细胞分布宽度", expected: None },
        GoldenCase { id: "rdw-cv", label: "RDW-CV", expected: None },
        GoldenCase { id: "retic-zh", label: "网织红细胞", expected: None },
        GoldenCase { id: "retic-count-zh", label: "网织红细胞计数", expected: None },
        GoldenCase { id: "nrbc-zh", label: "有核红细胞", expected: None },
        GoldenCase { id: "not-a-cbc-item", label: "C-reactive protein", expected: None },
        GoldenCase { id: "blank", label: "", expected: None },
    ]
}

#[test]
fn test_golden_cases() {
    let normalizer = Normalizer::new();

    for case in get_golden_cases() {
        assert_eq!(
            normalizer.resolve(case.label),
            case.expected,
            "Case {}: label {:?}",
            case.id,
            case.label
        );
    }
}

#[test]
fn test_every_abbreviation_resolves_to_itself() {
    let normalizer = Normalizer::new();

    for indicator in Indicator::ALL {
        assert_eq!(
            normalizer.resolve(indicator.abbreviation()),
            Some(indicator),
            "abbreviation {}",
            indicator.abbreviation()
        );
        assert_eq!(normalizer.resolve(indicator.key()), Some(indicator));
    }
}
