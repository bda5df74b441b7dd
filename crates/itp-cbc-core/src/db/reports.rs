//! Report database operations.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Params, Row};
use serde::{Deserialize, Serialize};

use super::{Database, DbError, DbResult};
use crate::models::{Observation, Panel, ValidationError};

const REPORT_COLUMNS: &str = "report_id, patient_id, patient_name, hospital, test_date, \
     collected_at, observations, notes, ignored_fields";

/// Aggregate figures over the whole store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportStatistics {
    pub total_reports: u64,
    pub total_patients: u64,
    pub earliest_test_date: Option<NaiveDate>,
    pub latest_test_date: Option<NaiveDate>,
    /// Out-of-range observations across all reports
    pub abnormal_observations: u64,
}

impl Database {
    /// Insert a new report. Fails if the report id is already stored.
    pub fn insert_report(&self, panel: &Panel) -> DbResult<()> {
        if self.report_exists(panel.report_id())? {
            return Err(DbError::Constraint(format!(
                "Report already exists: {}",
                panel.report_id()
            )));
        }

        let observations_json = serde_json::to_string(panel.observations())?;
        let ignored_json = serde_json::to_string(panel.ignored_fields())?;

        self.conn.execute(
            r#"
            INSERT INTO reports (
                report_id, patient_id, patient_name, hospital, test_date,
                collected_at, observations, notes, ignored_fields,
                fingerprint, abnormal_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                panel.report_id(),
                panel.patient_id(),
                panel.patient_name(),
                panel.hospital(),
                panel.test_date().format("%Y-%m-%d").to_string(),
                panel.collected_at().to_rfc3339(),
                observations_json,
                panel.notes(),
                ignored_json,
                panel.fingerprint(),
                abnormal_observations(panel) as i64,
            ],
        )?;

        tracing::debug!(
            report_id = panel.report_id(),
            patient_id = panel.patient_id(),
            observations = panel.observations().len(),
            "stored report"
        );
        Ok(())
    }

    /// Check whether a report id is stored.
    pub fn report_exists(&self, report_id: &str) -> DbResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM reports WHERE report_id = ?",
                [report_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Get a report by ID.
    pub fn get_report(&self, report_id: &str) -> DbResult<Option<Panel>> {
        self.conn
            .query_row(
                &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE report_id = ?"),
                [report_id],
                ReportRow::from_row,
            )
            .optional()?
            .map(Panel::try_from)
            .transpose()
    }

    /// All reports, newest test date first.
    pub fn list_reports(&self) -> DbResult<Vec<Panel>> {
        self.query_reports(
            &format!("SELECT {REPORT_COLUMNS} FROM reports ORDER BY test_date DESC, rowid DESC"),
            [],
        )
    }

    /// A patient's reports ordered by test date, then insertion order.
    pub fn list_reports_for_patient(&self, patient_id: &str) -> DbResult<Vec<Panel>> {
        self.query_reports(
            &format!(
                "SELECT {REPORT_COLUMNS} FROM reports WHERE patient_id = ? \
                 ORDER BY test_date ASC, rowid ASC"
            ),
            [patient_id],
        )
    }

    /// Reports whose patient name, hospital or notes contain `query`
    /// (ASCII case-insensitive), newest first.
    pub fn search_reports(&self, query: &str) -> DbResult<Vec<Panel>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        self.query_reports(
            &format!(
                "SELECT {REPORT_COLUMNS} FROM reports \
                 WHERE instr(lower(patient_name), lower(?1)) > 0 \
                    OR instr(lower(hospital), lower(?1)) > 0 \
                    OR instr(lower(COALESCE(notes, '')), lower(?1)) > 0 \
                 ORDER BY test_date DESC, rowid DESC"
            ),
            [query],
        )
    }

    /// Reports with a test date in `[from, to]`, oldest first.
    pub fn list_reports_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<Panel>> {
        self.query_reports(
            &format!(
                "SELECT {REPORT_COLUMNS} FROM reports \
                 WHERE test_date >= ?1 AND test_date <= ?2 \
                 ORDER BY test_date ASC, rowid ASC"
            ),
            params![
                from.format("%Y-%m-%d").to_string(),
                to.format("%Y-%m-%d").to_string()
            ],
        )
    }

    /// Find an earlier upload of the same report.
    pub fn find_by_fingerprint(&self, fingerprint: &str) -> DbResult<Option<Panel>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {REPORT_COLUMNS} FROM reports WHERE fingerprint = ? \
                     ORDER BY rowid ASC LIMIT 1"
                ),
                [fingerprint],
                ReportRow::from_row,
            )
            .optional()?
            .map(Panel::try_from)
            .transpose()
    }

    /// Delete a report.
    pub fn delete_report(&self, report_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM reports WHERE report_id = ?", [report_id])?;
        if rows_affected > 0 {
            tracing::debug!(report_id, "deleted report");
        }
        Ok(rows_affected > 0)
    }

    /// Totals, distinct patients, date range and abnormal observation count.
    pub fn report_statistics(&self) -> DbResult<ReportStatistics> {
        let (total, patients, earliest, latest, abnormal) = self.conn.query_row(
            r#"
            SELECT COUNT(*), COUNT(DISTINCT patient_id), MIN(test_date), MAX(test_date),
                   COALESCE(SUM(abnormal_count), 0)
            FROM reports
            "#,
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )?;

        Ok(ReportStatistics {
            total_reports: total.max(0) as u64,
            total_patients: patients.max(0) as u64,
            earliest_test_date: earliest.as_deref().map(parse_stored_date).transpose()?,
            latest_test_date: latest.as_deref().map(parse_stored_date).transpose()?,
            abnormal_observations: abnormal.max(0) as u64,
        })
    }

    fn query_reports<P: Params>(&self, sql: &str, params: P) -> DbResult<Vec<Panel>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, ReportRow::from_row)?;

        let mut reports: Vec<Panel> = Vec::new();
        for row in rows {
            reports.push(Panel::try_from(row?)?);
        }
        Ok(reports)
    }
}

/// Observations outside the reference range recorded with them.
fn abnormal_observations(panel: &Panel) -> usize {
    panel
        .observations()
        .iter()
        .filter(|o| o.reference_range.is_some_and(|r| !r.contains(o.value)))
        .count()
}

fn parse_stored_date(value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        DbError::Validation(ValidationError::InvalidDate {
            field: "test_date".into(),
            value: value.to_string(),
        })
    })
}

/// Intermediate row struct for database mapping.
struct ReportRow {
    report_id: String,
    patient_id: String,
    patient_name: String,
    hospital: String,
    test_date: String,
    collected_at: String,
    observations: String,
    notes: Option<String>,
    ignored_fields: String,
}

impl ReportRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            report_id: row.get(0)?,
            patient_id: row.get(1)?,
            patient_name: row.get(2)?,
            hospital: row.get(3)?,
            test_date: row.get(4)?,
            collected_at: row.get(5)?,
            observations: row.get(6)?,
            notes: row.get(7)?,
            ignored_fields: row.get(8)?,
        })
    }
}

impl TryFrom<ReportRow> for Panel {
    type Error = DbError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let observations: Vec<Observation> = serde_json::from_str(&row.observations)?;
        let ignored_fields: Vec<String> = serde_json::from_str(&row.ignored_fields)?;
        let test_date = parse_stored_date(&row.test_date)?;
        let collected_at = DateTime::parse_from_rfc3339(&row.collected_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| {
                DbError::Validation(ValidationError::InvalidDate {
                    field: "collected_at".into(),
                    value: row.collected_at.clone(),
                })
            })?;

        Ok(Panel::from_stored(
            row.report_id,
            row.patient_id,
            row.patient_name,
            row.hospital,
            test_date,
            collected_at,
            observations,
            row.notes,
            ignored_fields,
        ))
    }
}
