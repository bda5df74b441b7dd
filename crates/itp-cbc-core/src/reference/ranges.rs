//! Reference ranges and plausibility envelopes.
//!
//! Ranges follow the adult CBC reference intervals printed on the hospital
//! reports this engine ingests. The plausibility envelope is much wider and
//! only rejects values that cannot be a real measurement (negative counts,
//! percentages above 100, ...).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Indicator, ReferenceRange};

/// Version tag of the built-in table.
pub const STANDARD_TABLE_VERSION: &str = "cbc-adult-2024.1";

/// Reference data for one indicator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceEntry {
    pub indicator: Indicator,
    /// Canonical reporting unit
    pub unit: String,
    /// Normal interval
    pub range: ReferenceRange,
    /// Physically plausible interval; values outside are rejected at intake
    pub plausible: ReferenceRange,
}

/// Versioned lookup of reference data keyed by indicator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceTable {
    version: String,
    entries: HashMap<Indicator, ReferenceEntry>,
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl ReferenceTable {
    /// Create an empty table with the given version tag.
    pub fn empty(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            entries: HashMap::new(),
        }
    }

    /// The built-in adult reference table.
    pub fn standard() -> Self {
        let mut table = Self::empty(STANDARD_TABLE_VERSION);
        for (indicator, unit, min, max, plausible_max) in STANDARD_ROWS {
            table.insert(ReferenceEntry {
                indicator: *indicator,
                unit: (*unit).to_string(),
                range: ReferenceRange::new(*min, *max),
                plausible: ReferenceRange::new(0.0, *plausible_max),
            });
        }
        table
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, entry: ReferenceEntry) {
        self.entries.insert(entry.indicator, entry);
    }

    /// Remove an entry, returning it if present.
    pub fn remove(&mut self, indicator: Indicator) -> Option<ReferenceEntry> {
        self.entries.remove(&indicator)
    }

    pub fn get(&self, indicator: Indicator) -> Option<&ReferenceEntry> {
        self.entries.get(&indicator)
    }

    pub fn range(&self, indicator: Indicator) -> Option<ReferenceRange> {
        self.entries.get(&indicator).map(|e| e.range)
    }

    pub fn unit(&self, indicator: Indicator) -> Option<&str> {
        self.entries.get(&indicator).map(|e| e.unit.as_str())
    }

    /// Entries in indicator order.
    pub fn entries(&self) -> Vec<&ReferenceEntry> {
        let mut entries: Vec<&ReferenceEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.indicator);
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// (indicator, unit, min, max, plausible max)
const STANDARD_ROWS: &[(Indicator, &str, f64, f64, f64)] = &[
    // White cell series
    (Indicator::Wbc, "10^9/L", 3.5, 9.5, 500.0),
    (Indicator::NeutPercent, "%", 40.0, 75.0, 100.0),
    (Indicator::LymphPercent, "%", 20.0, 50.0, 100.0),
    (Indicator::MonoPercent, "%", 3.0, 10.0, 100.0),
    (Indicator::EosPercent, "%", 0.4, 8.0, 100.0),
    (Indicator::BasoPercent, "%", 0.0, 1.0, 100.0),
    (Indicator::NeutCount, "10^9/L", 1.8, 6.3, 400.0),
    (Indicator::LymphCount, "10^9/L", 1.1, 3.2, 400.0),
    (Indicator::MonoCount, "10^9/L", 0.1, 0.6, 100.0),
    (Indicator::EosCount, "10^9/L", 0.02, 0.52, 100.0),
    (Indicator::BasoCount, "10^9/L", 0.0, 0.06, 50.0),
    // Red cell series
    (Indicator::Rbc, "10^12/L", 3.8, 5.8, 15.0),
    (Indicator::Hgb, "g/L", 115.0, 175.0, 300.0),
    (Indicator::Hct, "%", 35.0, 50.0, 100.0),
    (Indicator::Mcv, "fL", 80.0, 100.0, 200.0),
    (Indicator::Mch, "pg", 27.0, 34.0, 80.0),
    (Indicator::Mchc, "g/L", 320.0, 360.0, 600.0),
    // Platelet series
    (Indicator::Plt, "10^9/L", 125.0, 350.0, 5000.0),
    (Indicator::Mpv, "fL", 7.4, 12.5, 40.0),
    (Indicator::Pdw, "%", 9.0, 17.0, 100.0),
    (Indicator::Pct, "%", 0.108, 0.282, 10.0),
    (Indicator::PLcr, "%", 13.0, 43.0, 100.0),
];
