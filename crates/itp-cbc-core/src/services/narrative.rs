//! Narrative interpretation of a panel.
//!
//! A narrative service (typically a language model behind the host app)
//! writes findings and recommendations. Its overall status is checked
//! against the engine's own rollup and never replaces it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::Analyzer;
use crate::models::{
    BleedingRisk, Indicator, OverallStatus, Panel, PanelEvaluation, PltSeverity, Status,
};

/// Narrative service errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NarrativeError {
    #[error("Narrative service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid narrative response: {0}")]
    InvalidResponse(String),
}

pub type NarrativeResult<T> = Result<T, NarrativeError>;

/// Free-text interpretation returned by a narrative service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NarrativeReport {
    /// `normal`, `attention`, `abnormal` or `unknown`
    pub overall_status: String,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl NarrativeReport {
    /// Parse a service response.
    pub fn from_json(json: &str) -> NarrativeResult<Self> {
        serde_json::from_str(json).map_err(|e| NarrativeError::InvalidResponse(e.to_string()))
    }
}

/// Produces a narrative for a panel.
pub trait NarrativeService {
    fn narrate(&self, panel: &Panel) -> NarrativeResult<NarrativeReport>;
}

/// Evaluation plus the optional narrative cross-check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NarratedEvaluation {
    pub evaluation: PanelEvaluation,
    pub narrative: Option<NarrativeReport>,
    /// Whether the narrative's overall status matches the engine's;
    /// `None` without a narrative
    pub status_agrees: Option<bool>,
}

/// Evaluate a panel and ask the service for a narrative.
///
/// A failing service degrades to `narrative = None`; the evaluation is
/// always returned.
pub fn analyze_with_narrative<N>(service: &N, analyzer: &Analyzer, panel: &Panel) -> NarratedEvaluation
where
    N: NarrativeService + ?Sized,
{
    let evaluation = analyzer.evaluate(panel);

    let narrative = match service.narrate(panel) {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::warn!(report_id = panel.report_id(), error = %e, "narrative unavailable");
            None
        }
    };

    let status_agrees = narrative.as_ref().map(|report| {
        let agrees = OverallStatus::parse(&report.overall_status) == Some(evaluation.overall_status);
        if !agrees {
            tracing::warn!(
                report_id = panel.report_id(),
                engine = evaluation.overall_status.as_str(),
                narrative = %report.overall_status,
                "narrative status disagrees with evaluation"
            );
        }
        agrees
    });

    NarratedEvaluation {
        evaluation,
        narrative,
        status_agrees,
    }
}

/// Deterministic narrative built from the engine's own evaluation.
///
/// Used when no external service is configured, and as a baseline the
/// host app can show next to a model-written narrative.
#[derive(Debug, Clone, Default)]
pub struct RuleNarrative {
    analyzer: Analyzer,
}

impl RuleNarrative {
    pub fn new(analyzer: Analyzer) -> Self {
        Self { analyzer }
    }
}

impl NarrativeService for RuleNarrative {
    fn narrate(&self, panel: &Panel) -> NarrativeResult<NarrativeReport> {
        let evaluation = self.analyzer.evaluate(panel);

        let key_findings = evaluation
            .classifications
            .values()
            .filter(|c| c.is_abnormal)
            .filter_map(|c| {
                let observation = panel.observation(c.indicator)?;
                let direction = if c.status == Status::Low { "low" } else { "high" };
                let range = observation
                    .reference_range
                    .map(|r| format!(", reference {r}"))
                    .unwrap_or_default();
                Some(format!(
                    "{} {}: {} {}{}",
                    c.indicator.abbreviation(),
                    direction,
                    observation.value,
                    observation.unit,
                    range
                ))
            })
            .collect();

        Ok(NarrativeReport {
            overall_status: evaluation.overall_status.as_str().to_string(),
            key_findings,
            recommendations: recommendations_for(&evaluation),
        })
    }
}

fn recommendations_for(evaluation: &PanelEvaluation) -> Vec<String> {
    let mut recommendations = Vec::new();

    match evaluation.overall_status {
        OverallStatus::Abnormal => {
            recommendations.push("See a physician promptly for further examination.".to_string())
        }
        OverallStatus::Attention => {
            recommendations.push("Repeat the test and keep watching the flagged values.".to_string())
        }
        OverallStatus::Normal | OverallStatus::Unknown => {}
    }

    match evaluation.itp_assessment.plt_status {
        Some(PltSeverity::Severe) => {
            recommendations.push(
                "Platelets severely reduced: seek care now and avoid strenuous activity or injury."
                    .to_string(),
            );
            recommendations.push(
                "Watch for bleeding signs such as petechiae, nosebleeds or gum bleeding.".to_string(),
            );
        }
        Some(PltSeverity::Moderate) => recommendations
            .push("Platelets moderately reduced: avoid strenuous activity and monitor regularly.".to_string()),
        Some(PltSeverity::Mild) => recommendations
            .push("Platelets mildly reduced: moderate exercise is fine, recheck regularly.".to_string()),
        Some(PltSeverity::Normal) | None => {}
    }

    if evaluation.itp_assessment.bleeding_risk == Some(BleedingRisk::High) {
        recommendations.push("Avoid aspirin and other antiplatelet drugs.".to_string());
        recommendations.push("Use a soft toothbrush and avoid hard foods.".to_string());
    }

    if !evaluation.classifications.contains_key(&Indicator::Plt) {
        recommendations.push("Platelet count missing: ITP status cannot be assessed.".to_string());
    }

    recommendations.push("Keep regular blood counts to build a complete history.".to_string());
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::models::PanelIntake;
    use crate::reference::ReferenceTable;

    fn panel(values: &[(Indicator, f64)]) -> Panel {
        let mut intake = PanelIntake::new("p", NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
        for (indicator, value) in values {
            intake = intake.with_value(*indicator, *value);
        }
        intake.into_panel(&ReferenceTable::standard()).unwrap()
    }

    struct Fixed(NarrativeResult<NarrativeReport>);

    impl NarrativeService for Fixed {
        fn narrate(&self, _panel: &Panel) -> NarrativeResult<NarrativeReport> {
            self.0.clone()
        }
    }

    #[test]
    fn test_agreeing_narrative() {
        let service = Fixed(NarrativeReport::from_json(
            r#"{"overall_status": "abnormal", "key_findings": ["PLT low"], "recommendations": []}"#,
        ));
        let result = analyze_with_narrative(&service, &Analyzer::standard(), &panel(&[(Indicator::Plt, 30.0)]));

        assert_eq!(result.evaluation.overall_status, OverallStatus::Abnormal);
        assert_eq!(result.status_agrees, Some(true));
        assert_eq!(result.narrative.unwrap().key_findings, vec!["PLT low".to_string()]);
    }

    #[test]
    fn test_disagreeing_narrative_keeps_engine_status() {
        let service = Fixed(Ok(NarrativeReport {
            overall_status: "normal".into(),
            ..Default::default()
        }));
        let result = analyze_with_narrative(&service, &Analyzer::standard(), &panel(&[(Indicator::Plt, 30.0)]));

        assert_eq!(result.evaluation.overall_status, OverallStatus::Abnormal);
        assert_eq!(result.status_agrees, Some(false));
    }

    #[test]
    fn test_failing_service_degrades() {
        let service = Fixed(Err(NarrativeError::Unavailable("timeout".into())));
        let result = analyze_with_narrative(&service, &Analyzer::standard(), &panel(&[(Indicator::Wbc, 5.0)]));

        assert_eq!(result.narrative, None);
        assert_eq!(result.status_agrees, None);
        assert_eq!(result.evaluation.overall_status, OverallStatus::Normal);
    }

    #[test]
    fn test_invalid_response() {
        let err = NarrativeReport::from_json("not json").unwrap_err();
        assert!(matches!(err, NarrativeError::InvalidResponse(_)));
    }

    #[test]
    fn test_rule_narrative() {
        let service = RuleNarrative::default();
        let report = service
            .narrate(&panel(&[(Indicator::Plt, 20.0), (Indicator::Hgb, 140.0)]))
            .unwrap();

        assert_eq!(report.overall_status, "abnormal");
        assert_eq!(report.key_findings, vec!["PLT low: 20 10^9/L, reference 125-350".to_string()]);
        assert!(report.recommendations.iter().any(|r| r.contains("aspirin")));

        // Its own narrative always agrees with the engine.
        let result = analyze_with_narrative(&service, &Analyzer::standard(), &panel(&[(Indicator::Mpv, 14.0)]));
        assert_eq!(result.status_agrees, Some(true));
    }
}
