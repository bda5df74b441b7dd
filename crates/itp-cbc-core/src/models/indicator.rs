//! CBC indicator identities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A complete-blood-count indicator.
///
/// The serialized form is the ingestion key used by manual entry and by the
/// recognition service (`plt`, `neut_percent`, ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    // White cell series
    Wbc,
    NeutPercent,
    LymphPercent,
    MonoPercent,
    EosPercent,
    BasoPercent,
    NeutCount,
    LymphCount,
    MonoCount,
    EosCount,
    BasoCount,
    // Red cell series
    Rbc,
    Hgb,
    Hct,
    Mcv,
    Mch,
    Mchc,
    // Platelet series
    Plt,
    Mpv,
    Pdw,
    Pct,
    PLcr,
}

/// Indicator family, used to group panel output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorGroup {
    WhiteCell,
    RedCell,
    Platelet,
}

impl Indicator {
    /// Every indicator, in panel display order.
    pub const ALL: [Indicator; 22] = [
        Indicator::Wbc,
        Indicator::NeutPercent,
        Indicator::LymphPercent,
        Indicator::MonoPercent,
        Indicator::EosPercent,
        Indicator::BasoPercent,
        Indicator::NeutCount,
        Indicator::LymphCount,
        Indicator::MonoCount,
        Indicator::EosCount,
        Indicator::BasoCount,
        Indicator::Rbc,
        Indicator::Hgb,
        Indicator::Hct,
        Indicator::Mcv,
        Indicator::Mch,
        Indicator::Mchc,
        Indicator::Plt,
        Indicator::Mpv,
        Indicator::Pdw,
        Indicator::Pct,
        Indicator::PLcr,
    ];

    /// Indicators whose abnormality escalates a panel to `abnormal`.
    pub const CRITICAL: [Indicator; 3] = [Indicator::Plt, Indicator::Hgb, Indicator::Wbc];

    /// Ingestion key.
    pub fn key(self) -> &'static str {
        match self {
            Indicator::Wbc => "wbc",
            Indicator::NeutPercent => "neut_percent",
            Indicator::LymphPercent => "lymph_percent",
            Indicator::MonoPercent => "mono_percent",
            Indicator::EosPercent => "eos_percent",
            Indicator::BasoPercent => "baso_percent",
            Indicator::NeutCount => "neut_count",
            Indicator::LymphCount => "lymph_count",
            Indicator::MonoCount => "mono_count",
            Indicator::EosCount => "eos_count",
            Indicator::BasoCount => "baso_count",
            Indicator::Rbc => "rbc",
            Indicator::Hgb => "hgb",
            Indicator::Hct => "hct",
            Indicator::Mcv => "mcv",
            Indicator::Mch => "mch",
            Indicator::Mchc => "mchc",
            Indicator::Plt => "plt",
            Indicator::Mpv => "mpv",
            Indicator::Pdw => "pdw",
            Indicator::Pct => "pct",
            Indicator::PLcr => "p_lcr",
        }
    }

    /// Look up an indicator by its exact ingestion key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.key() == key)
    }

    /// Conventional lab abbreviation as printed on reports.
    pub fn abbreviation(self) -> &'static str {
        match self {
            Indicator::Wbc => "WBC",
            Indicator::NeutPercent => "NEUT%",
            Indicator::LymphPercent => "LYMPH%",
            Indicator::MonoPercent => "MONO%",
            Indicator::EosPercent => "EOS%",
            Indicator::BasoPercent => "BASO%",
            Indicator::NeutCount => "NEUT#",
            Indicator::LymphCount => "LYMPH#",
            Indicator::MonoCount => "MONO#",
            Indicator::EosCount => "EOS#",
            Indicator::BasoCount => "BASO#",
            Indicator::Rbc => "RBC",
            Indicator::Hgb => "HGB",
            Indicator::Hct => "HCT",
            Indicator::Mcv => "MCV",
            Indicator::Mch => "MCH",
            Indicator::Mchc => "MCHC",
            Indicator::Plt => "PLT",
            Indicator::Mpv => "MPV",
            Indicator::Pdw => "PDW",
            Indicator::Pct => "PCT",
            Indicator::PLcr => "P-LCR",
        }
    }

    pub fn group(self) -> IndicatorGroup {
        match self {
            Indicator::Wbc
            | Indicator::NeutPercent
            | Indicator::LymphPercent
            | Indicator::MonoPercent
            | Indicator::EosPercent
            | Indicator::BasoPercent
            | Indicator::NeutCount
            | Indicator::LymphCount
            | Indicator::MonoCount
            | Indicator::EosCount
            | Indicator::BasoCount => IndicatorGroup::WhiteCell,
            Indicator::Rbc
            | Indicator::Hgb
            | Indicator::Hct
            | Indicator::Mcv
            | Indicator::Mch
            | Indicator::Mchc => IndicatorGroup::RedCell,
            Indicator::Plt | Indicator::Mpv | Indicator::Pdw | Indicator::Pct | Indicator::PLcr => {
                IndicatorGroup::Platelet
            }
        }
    }

    /// Whether an abnormal value of this indicator makes the panel `abnormal`.
    pub fn is_critical(self) -> bool {
        Self::CRITICAL.contains(&self)
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Inclusive reference interval for an indicator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
}

impl ReferenceRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Check whether a value lies within `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Distance from the interval; zero when inside.
    pub fn distance(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

impl fmt::Display for ReferenceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}
