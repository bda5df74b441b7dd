//! Panels (CBC lab reports) and their observations.
//!
//! A [`Panel`] can only be produced by validating a [`PanelIntake`] (or by
//! rehydrating one from the report store), so every observation it holds is
//! finite, plausible and tagged with the unit and reference range in force
//! when it was recorded.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::indicator::{Indicator, ReferenceRange};
use crate::reference::{ReferenceEntry, ReferenceTable};

/// Input validation errors. Each variant names the offending field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field `{field}` is not a number: {found}")]
    NotANumber { field: String, found: String },

    #[error("Field `{field}` is not a finite number")]
    NonFinite { field: String },

    #[error("Field `{field}` value {value} is outside the plausible range {min}-{max}")]
    Implausible {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Field `{field}` is not a valid date: {value}")]
    InvalidDate { field: String, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// A single indicator measurement within a panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub indicator: Indicator,
    pub value: f64,
    /// Reporting unit from the reference table (empty if the table has no entry)
    pub unit: String,
    /// Reference range in force when the value was recorded
    pub reference_range: Option<ReferenceRange>,
}

impl Observation {
    /// Validate a value and attach its reference data.
    pub fn new(indicator: Indicator, value: f64, table: &ReferenceTable) -> ValidationResult<Self> {
        let entry = table.get(indicator);
        check_value(indicator.key(), value, entry)?;

        Ok(Self {
            indicator,
            value,
            unit: entry.map(|e| e.unit.clone()).unwrap_or_default(),
            reference_range: entry.map(|e| e.range),
        })
    }
}

fn check_value(field: &str, value: f64, entry: Option<&ReferenceEntry>) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            field: field.to_string(),
        });
    }

    let plausible = entry
        .map(|e| e.plausible)
        .unwrap_or(ReferenceRange::new(0.0, f64::MAX));
    if !plausible.contains(value) {
        return Err(ValidationError::Implausible {
            field: field.to_string(),
            value,
            min: plausible.min,
            max: plausible.max,
        });
    }

    Ok(())
}

/// An immutable CBC report for one patient at one point in time.
///
/// Only built through [`PanelIntake::into_panel`] or rehydrated from the
/// store, so every observation has passed validation. It serializes for
/// export but never deserializes.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Panel {
    report_id: String,
    patient_id: String,
    patient_name: String,
    hospital: String,
    test_date: NaiveDate,
    collected_at: DateTime<Utc>,
    observations: Vec<Observation>,
    notes: Option<String>,
    ignored_fields: Vec<String>,
}

impl Panel {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_stored(
        report_id: String,
        patient_id: String,
        patient_name: String,
        hospital: String,
        test_date: NaiveDate,
        collected_at: DateTime<Utc>,
        observations: Vec<Observation>,
        notes: Option<String>,
        ignored_fields: Vec<String>,
    ) -> Self {
        Self {
            report_id,
            patient_id,
            patient_name,
            hospital,
            test_date,
            collected_at,
            observations,
            notes,
            ignored_fields,
        }
    }

    pub fn report_id(&self) -> &str {
        &self.report_id
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn hospital(&self) -> &str {
        &self.hospital
    }

    pub fn test_date(&self) -> NaiveDate {
        self.test_date
    }

    pub fn collected_at(&self) -> DateTime<Utc> {
        self.collected_at
    }

    /// Observations in intake order.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Intake keys that did not name a known indicator.
    pub fn ignored_fields(&self) -> &[String] {
        &self.ignored_fields
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Get the observation for an indicator, if measured.
    pub fn observation(&self, indicator: Indicator) -> Option<&Observation> {
        self.observations.iter().find(|o| o.indicator == indicator)
    }

    /// Get the measured value for an indicator.
    pub fn value(&self, indicator: Indicator) -> Option<f64> {
        self.observation(indicator).map(|o| o.value)
    }

    /// SHA-256 over patient, test date and the sorted observation values.
    ///
    /// Two uploads of the same report produce the same fingerprint even if
    /// their report ids, names or notes differ.
    pub fn fingerprint(&self) -> String {
        let mut values: Vec<String> = self
            .observations
            .iter()
            .map(|o| format!("{}={}", o.indicator.key(), o.value))
            .collect();
        values.sort();

        let canonical = format!(
            "{}|{}|{}",
            self.patient_id,
            self.test_date.format("%Y-%m-%d"),
            values.join(";")
        );
        hash_data(canonical.as_bytes())
    }
}

/// Hash data using SHA-256, hex encoded.
pub fn hash_data(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// The ingestion shape: `{ patient_id, test_date, <indicator_key>: number, ... }`.
///
/// Any indicator key that is absent (or `null`) means "not measured".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PanelIntake {
    /// Existing report id when re-importing; a new UUID is generated otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    pub patient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<String>,
    /// `YYYY-MM-DD` or an ISO 8601 date-time
    pub test_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Indicator values keyed by ingestion key, in submission order
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl PanelIntake {
    /// Create an intake for a patient and test date.
    pub fn new(patient_id: impl Into<String>, test_date: NaiveDate) -> Self {
        Self {
            patient_id: patient_id.into(),
            test_date: test_date.format("%Y-%m-%d").to_string(),
            ..Default::default()
        }
    }

    /// Parse an intake from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set an indicator value.
    pub fn with_value(mut self, indicator: Indicator, value: f64) -> Self {
        self.set_value(indicator.key(), value);
        self
    }

    /// Set a value by raw key. Non-finite values are kept as text so that
    /// validation reports them instead of dropping them.
    pub fn set_value(&mut self, key: &str, value: f64) {
        let json = Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.values.insert(key.to_string(), json);
    }

    /// Validate the intake and build an immutable panel.
    pub fn into_panel(self, table: &ReferenceTable) -> ValidationResult<Panel> {
        let patient_id = self.patient_id.trim().to_string();
        if patient_id.is_empty() {
            return Err(ValidationError::MissingField("patient_id".into()));
        }

        if self.test_date.trim().is_empty() {
            return Err(ValidationError::MissingField("test_date".into()));
        }
        let test_date =
            parse_test_date(&self.test_date).ok_or_else(|| ValidationError::InvalidDate {
                field: "test_date".into(),
                value: self.test_date.clone(),
            })?;

        let mut observations: Vec<Observation> = Vec::new();
        let mut ignored_fields = Vec::new();

        for (key, raw) in &self.values {
            let Some(indicator) = Indicator::from_key(&key.trim().to_lowercase()) else {
                tracing::warn!(field = %key, "ignoring unrecognized panel field");
                ignored_fields.push(key.clone());
                continue;
            };

            let Some(value) = json_value_to_f64(key, raw)? else {
                continue;
            };

            let observation = Observation::new(indicator, value, table).map_err(|e| match e {
                ValidationError::NonFinite { .. } => ValidationError::NonFinite { field: key.clone() },
                ValidationError::Implausible { value, min, max, .. } => ValidationError::Implausible {
                    field: key.clone(),
                    value,
                    min,
                    max,
                },
                other => other,
            })?;

            // Later keys naming the same indicator replace earlier ones.
            if let Some(existing) = observations.iter_mut().find(|o| o.indicator == indicator) {
                *existing = observation;
            } else {
                observations.push(observation);
            }
        }

        Ok(Panel {
            report_id: self
                .report_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            patient_id,
            patient_name: self.patient_name.unwrap_or_default(),
            hospital: self.hospital.unwrap_or_default(),
            test_date,
            collected_at: self.collected_at.unwrap_or_else(Utc::now),
            observations,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            ignored_fields,
        })
    }
}

/// Interpret an intake value. `null` is "not measured"; anything that is not a
/// JSON number is an error, including numeric-looking strings.
fn json_value_to_f64(field: &str, raw: &Value) -> ValidationResult<Option<f64>> {
    match raw {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(|| ValidationError::NotANumber {
            field: field.to_string(),
            found: n.to_string(),
        }),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(v) if !v.is_finite() => Err(ValidationError::NonFinite {
                field: field.to_string(),
            }),
            _ => Err(ValidationError::NotANumber {
                field: field.to_string(),
                found: format!("{:?}", s),
            }),
        },
        other => Err(ValidationError::NotANumber {
            field: field.to_string(),
            found: other.to_string(),
        }),
    }
}

/// Parse a test date given as `YYYY-MM-DD` or an ISO 8601 date-time.
pub fn parse_test_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }

    let naive = input.strip_suffix('Z').unwrap_or(input);
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .map(|dt| dt.date())
}
