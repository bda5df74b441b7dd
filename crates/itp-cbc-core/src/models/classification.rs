//! Derived classification results. None of these are persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::indicator::Indicator;

/// Position of a value relative to its reference range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Normal,
    High,
    Low,
    /// The indicator has no entry in the reference table in use.
    Unknown,
}

impl Status {
    pub fn is_abnormal(self) -> bool {
        matches!(self, Status::High | Status::Low)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Normal => "normal",
            Status::High => "high",
            Status::Low => "low",
            Status::Unknown => "unknown",
        }
    }
}

/// Classification of a single observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classification {
    pub indicator: Indicator,
    pub status: Status,
    pub is_abnormal: bool,
}

/// ITP platelet severity band. Declared from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PltSeverity {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl PltSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            PltSeverity::Normal => "normal",
            PltSeverity::Mild => "mild",
            PltSeverity::Moderate => "moderate",
            PltSeverity::Severe => "severe",
        }
    }
}

/// Bleeding-risk tier. Declared from lowest to highest risk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BleedingRisk {
    Minimal,
    Low,
    Moderate,
    High,
}

impl BleedingRisk {
    pub fn as_str(self) -> &'static str {
        match self {
            BleedingRisk::Minimal => "minimal",
            BleedingRisk::Low => "low",
            BleedingRisk::Moderate => "moderate",
            BleedingRisk::High => "high",
        }
    }
}

/// Platelet response to treatment between a baseline and a follow-up count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentResponse {
    CompleteResponse,
    Response,
    NoResponse,
}

impl TreatmentResponse {
    pub fn as_str(self) -> &'static str {
        match self {
            TreatmentResponse::CompleteResponse => "complete_response",
            TreatmentResponse::Response => "response",
            TreatmentResponse::NoResponse => "no_response",
        }
    }
}

/// ITP-specific assessment of a panel's platelet count.
///
/// `plt_status` and `bleeding_risk` are `None` when the panel carries no
/// platelet observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItpAssessment {
    pub plt_status: Option<PltSeverity>,
    pub bleeding_risk: Option<BleedingRisk>,
    pub treatment_response: Option<TreatmentResponse>,
}

impl ItpAssessment {
    /// Assessment for a panel without a platelet value.
    pub fn unassessed() -> Self {
        Self {
            plt_status: None,
            bleeding_risk: None,
            treatment_response: None,
        }
    }
}

/// Panel-level rollup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Normal,
    Attention,
    Abnormal,
    /// Nothing to evaluate.
    Unknown,
}

impl OverallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Normal => "normal",
            OverallStatus::Attention => "attention",
            OverallStatus::Abnormal => "abnormal",
            OverallStatus::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "normal" => Some(OverallStatus::Normal),
            "attention" => Some(OverallStatus::Attention),
            "abnormal" => Some(OverallStatus::Abnormal),
            "unknown" => Some(OverallStatus::Unknown),
            _ => None,
        }
    }
}

/// Result of evaluating a whole panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelEvaluation {
    pub classifications: BTreeMap<Indicator, Classification>,
    pub itp_assessment: ItpAssessment,
    pub abnormal_count: usize,
    pub overall_status: OverallStatus,
}

impl PanelEvaluation {
    /// Indicators classified as high or low, in indicator order.
    pub fn abnormal_indicators(&self) -> Vec<Indicator> {
        self.classifications
            .values()
            .filter(|c| c.is_abnormal)
            .map(|c| c.indicator)
            .collect()
    }
}
