//! CBC item extraction from recognizer output.

use std::sync::LazyLock;

use itp_cbc_core::engine::Normalizer;
use itp_cbc_core::models::Indicator;
use itp_cbc_core::PanelIntake;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Items at which extraction confidence saturates.
pub const FULL_CONFIDENCE_ITEMS: usize = 10;

/// Printed units that differ from the reference table's unit, with the factor
/// that converts them. Units are compared lowercase.
const UNIT_CONVERSIONS: &[(Indicator, &str, f64)] = &[
    (Indicator::Hct, "l/l", 100.0),
    (Indicator::Hgb, "g/dl", 10.0),
    (Indicator::Mchc, "g/dl", 10.0),
];

/// Convert a printed value into the reference table's unit.
pub fn convert_unit(indicator: Indicator, value: f64, unit: Option<&str>) -> f64 {
    let Some(unit) = unit.map(|u| u.trim().to_lowercase()) else {
        return value;
    };
    UNIT_CONVERSIONS
        .iter()
        .find(|(i, from, _)| *i == indicator && *from == unit)
        .map_or(value, |(_, _, factor)| value * factor)
}

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Structured recognizer output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecognitionOutput {
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub hospital: Option<String>,
    #[serde(default)]
    pub test_date: Option<String>,
    #[serde(default)]
    pub items: Vec<RecognizedItem>,
}

/// One printed report row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecognizedItem {
    /// Label as printed (`PLT`, `血小板计数`, ...)
    pub name: String,
    /// Number, or text such as `"45↓"` as some recognizers emit it
    pub value: Value,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub reference_range: Option<String>,
}

impl RecognizedItem {
    /// Numeric reading of the value, ignoring flags such as `↓` or `H`.
    pub fn numeric_value(&self) -> Option<f64> {
        match &self.value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => LEADING_NUMBER
                .captures(s)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok()),
            _ => None,
        }
    }
}

/// Intake built from recognizer output.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub intake: PanelIntake,
    /// `min(items / 10, 1)`
    pub confidence: f64,
    /// Labels that did not resolve to an indicator
    pub unresolved: Vec<String>,
}

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[↑↓<>]?\s*(\d+(?:\.\d+)?)").expect("valid number pattern"));

/// `NAME VALUE [FLAG] [UNIT] [MIN-MAX]`, optionally prefixed with a row number.
static REPORT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*(?:\d+[.、]?\s+)?",
        r"(?P<name>[^\d\s:：]+(?:\s+[^\d\s:：]+)*?)\s*[:：]?\s*",
        r"(?P<value>\d+(?:\.\d+)?)(?:\s*[↑↓])?",
        r"(?:\s+[HL](?:\s+|$))?",
        r"(?:\s*(?P<unit>10\^\d+/L|[^\s\d][^\s]*))?",
        r"(?:\s+(?P<range>\d+(?:\.\d+)?\s*[-~～]\s*\d+(?:\.\d+)?))?",
        r"(?:\s+.*)?$",
    ))
    .expect("valid report line pattern")
});

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*[-/.年]\s*(\d{1,2})\s*[-/.月]\s*(\d{1,2})").expect("valid date pattern")
});

const DATE_LABELS: &[&str] = &["date", "日期", "采样", "采集", "报告时间", "检验时间"];

/// Parse model output JSON into a recognition result.
pub fn parse_recognition_output(text: &str) -> ExtractionResult<RecognitionOutput> {
    // Try to find JSON in the response (in case the model adds extra text)
    let json_start = text.find('{').ok_or_else(|| {
        ExtractionError::InvalidFormat("No JSON object found in response".into())
    })?;
    let json_end = text.rfind('}').ok_or_else(|| {
        ExtractionError::InvalidFormat("No closing brace found in response".into())
    })?;
    if json_end < json_start {
        return Err(ExtractionError::InvalidFormat(
            "Closing brace precedes opening brace".into(),
        ));
    }

    let output: RecognitionOutput = serde_json::from_str(&text[json_start..=json_end])?;
    Ok(output)
}

/// Parse plain report text, one `NAME VALUE [UNIT] [MIN-MAX]` row per line.
///
/// A line carrying a date label sets `test_date` instead of producing an item.
pub fn parse_report_lines(text: &str) -> RecognitionOutput {
    let mut output = RecognitionOutput::default();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();
        if DATE_LABELS.iter().any(|label| lower.contains(label)) {
            if output.test_date.is_none() {
                output.test_date = normalize_date(line);
            }
            continue;
        }

        let Some(caps) = REPORT_LINE.captures(line) else {
            continue;
        };
        let (Some(name), Some(value)) = (caps.name("name"), caps.name("value")) else {
            continue;
        };
        let Ok(value) = value.as_str().parse::<f64>() else {
            continue;
        };

        output.items.push(RecognizedItem {
            name: name.as_str().trim().to_string(),
            value: Value::from(value),
            unit: caps.name("unit").map(|m| m.as_str().to_string()),
            reference_range: caps
                .name("range")
                .map(|m| m.as_str().split_whitespace().collect::<String>()),
        });
    }

    tracing::debug!(items = output.items.len(), "parsed report lines");
    output
}

/// Normalize `2024/3/1`, `2024.03.01` or `2024年3月1日` to `2024-03-01`.
pub fn normalize_date(text: &str) -> Option<String> {
    let caps = DATE.captures(text)?;
    let year: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let day: u32 = caps.get(3)?.as_str().parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some(format!("{year:04}-{month:02}-{day:02}"))
}

/// Build a panel intake from recognizer output.
///
/// Labels resolve through the normalizer; unresolved labels are kept as raw
/// keys so validation reports them as ignored fields. Items without a
/// readable value are skipped. Values printed in another unit (HCT in `L/L`)
/// are converted to the reference table's unit.
pub fn to_intake(output: &RecognitionOutput, patient_id: &str, normalizer: &Normalizer) -> Extraction {
    let mut intake = PanelIntake {
        patient_id: patient_id.to_string(),
        patient_name: output.patient_name.clone(),
        hospital: output.hospital.clone(),
        test_date: output
            .test_date
            .as_deref()
            .map(|d| normalize_date(d).unwrap_or_else(|| d.trim().to_string()))
            .unwrap_or_default(),
        ..Default::default()
    };

    let mut used = 0usize;
    let mut unresolved = Vec::new();

    for item in &output.items {
        let Some(value) = item.numeric_value() else {
            tracing::warn!(label = %item.name, value = %item.value, "skipping item without a numeric value");
            continue;
        };

        match normalizer.resolve(&item.name) {
            Some(indicator) => {
                let value = convert_unit(indicator, value, item.unit.as_deref());
                intake.set_value(indicator.key(), value);
            }
            None => {
                unresolved.push(item.name.clone());
                intake.set_value(item.name.trim(), value);
            }
        }
        used += 1;
    }

    Extraction {
        intake,
        confidence: (used as f64 / FULL_CONFIDENCE_ITEMS as f64).min(1.0),
        unresolved,
    }
}
