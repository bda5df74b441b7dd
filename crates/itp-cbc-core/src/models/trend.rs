//! Longitudinal trend and comparison results.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::classification::TreatmentResponse;
use super::indicator::Indicator;

/// Direction of the most recent change of an indicator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Rising => "rising",
            TrendDirection::Falling => "falling",
            TrendDirection::Stable => "stable",
        }
    }
}

/// Date-ascending history of one indicator.
///
/// `values` and `dates` are parallel and always the same length (at least 2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendSeries {
    pub indicator: Indicator,
    pub values: Vec<f64>,
    pub dates: Vec<NaiveDate>,
    pub trend: TrendDirection,
}

impl TrendSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The two most recent values as `(previous, latest)`.
    pub fn latest_pair(&self) -> Option<(f64, f64)> {
        match self.values.as_slice() {
            [.., prev, last] => Some((*prev, *last)),
            _ => None,
        }
    }

    pub fn first(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

/// Counts the comparison summary is rendered from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeCounts {
    /// Latest value moved closer to (or into) the reference range
    pub improved: usize,
    /// Latest value moved further from the reference range
    pub worsened: usize,
    /// Stable, or moving within the reference range
    pub unchanged: usize,
    /// Number of abnormal-change lines emitted
    pub flagged: usize,
}

impl ChangeCounts {
    pub fn total(&self) -> usize {
        self.improved + self.worsened + self.unchanged
    }
}

/// Result of comparing a report against a patient's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonResult {
    pub trends: BTreeMap<Indicator, TrendSeries>,
    pub abnormal_changes: Vec<String>,
    pub comparison_summary: String,
    pub counts: ChangeCounts,
    /// Platelet response from the earliest count of the series to the latest.
    ///
    /// The baseline is the first platelet count in the compared history, not
    /// the previous report. Under `DuplicateDatePolicy::KeepLatestPerDate` the
    /// focal report's own count is dropped when another report of the same
    /// date was collected later, and that later count becomes the endpoint.
    pub treatment_response: Option<TreatmentResponse>,
}
