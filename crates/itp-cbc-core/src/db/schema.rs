//! SQLite schema definition.

/// Complete database schema for the report store.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- CBC Reports
-- ============================================================================

CREATE TABLE IF NOT EXISTS reports (
    report_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    patient_name TEXT NOT NULL DEFAULT '',
    hospital TEXT NOT NULL DEFAULT '',
    test_date TEXT NOT NULL,                      -- YYYY-MM-DD
    collected_at TEXT NOT NULL,                   -- RFC 3339
    observations TEXT NOT NULL DEFAULT '[]',      -- JSON array of observations
    notes TEXT,
    ignored_fields TEXT NOT NULL DEFAULT '[]',    -- JSON array of strings
    fingerprint TEXT NOT NULL,                    -- SHA-256 of patient, date and values
    abnormal_count INTEGER NOT NULL DEFAULT 0,    -- out-of-range observations at insert
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_reports_patient_date ON reports(patient_id, test_date);
CREATE INDEX IF NOT EXISTS idx_reports_test_date ON reports(test_date);
CREATE INDEX IF NOT EXISTS idx_reports_fingerprint ON reports(fingerprint);
"#;
