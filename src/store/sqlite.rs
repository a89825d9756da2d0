//! SQLite storage backend.

use super::Store;
use crate::error::StoreError;
use crate::models::{
    Assessment, Dimension, NewAssessment, Scores, Survey, SurveyId, DIMENSION_COUNT,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS survey_links (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  survey_id TEXT UNIQUE NOT NULL,
  survey_name TEXT NOT NULL,
  created_date TEXT NOT NULL,
  is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1))
);

CREATE TABLE IF NOT EXISTS assessments (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  survey_id TEXT NOT NULL,
  respondent_name TEXT NOT NULL,
  respondent_team TEXT NOT NULL,
  submission_date TEXT NOT NULL,
  project_progress_transparency INTEGER NOT NULL CHECK (project_progress_transparency BETWEEN 1 AND 5),
  requirement_response_speed INTEGER NOT NULL CHECK (requirement_response_speed BETWEEN 1 AND 5),
  team_collaboration_efficiency INTEGER NOT NULL CHECK (team_collaboration_efficiency BETWEEN 1 AND 5),
  delivery_quality_stability INTEGER NOT NULL CHECK (delivery_quality_stability BETWEEN 1 AND 5),
  issue_discovery_timeliness INTEGER NOT NULL CHECK (issue_discovery_timeliness BETWEEN 1 AND 5),
  resource_allocation_efficiency INTEGER NOT NULL CHECK (resource_allocation_efficiency BETWEEN 1 AND 5),
  continuous_improvement_ability INTEGER NOT NULL CHECK (continuous_improvement_ability BETWEEN 1 AND 5),
  information_transmission_effectiveness INTEGER NOT NULL CHECK (information_transmission_effectiveness BETWEEN 1 AND 5),
  overall_score REAL NOT NULL,
  notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_assessments_survey_date
  ON assessments(survey_id, submission_date);
";

/// Store backed by a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        debug!("Opening SQLite database at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp '{}': {}", raw, e)))
}

fn dimension_columns() -> String {
    Dimension::ALL
        .iter()
        .map(|d| d.column())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Survey columns exactly as read, before timestamp parsing.
struct SurveyRow {
    survey_id: String,
    survey_name: String,
    created_date: String,
    is_active: bool,
}

impl SurveyRow {
    const COLUMNS: &'static str = "survey_id, survey_name, created_date, is_active";

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            survey_id: row.get(0)?,
            survey_name: row.get(1)?,
            created_date: row.get(2)?,
            is_active: row.get(3)?,
        })
    }

    fn into_survey(self) -> Result<Survey, StoreError> {
        Ok(Survey {
            id: SurveyId::from(self.survey_id),
            name: self.survey_name,
            created_at: parse_timestamp(&self.created_date)?,
            active: self.is_active,
        })
    }
}

/// Assessment columns exactly as read, before range and timestamp checks.
struct AssessmentRow {
    id: i64,
    survey_id: String,
    respondent_name: String,
    respondent_team: String,
    submission_date: String,
    scores: [i64; DIMENSION_COUNT],
    overall_score: f64,
    notes: Option<String>,
}

impl AssessmentRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        let mut scores = [0i64; DIMENSION_COUNT];
        for (i, slot) in scores.iter_mut().enumerate() {
            *slot = row.get(5 + i)?;
        }
        Ok(Self {
            id: row.get(0)?,
            survey_id: row.get(1)?,
            respondent_name: row.get(2)?,
            respondent_team: row.get(3)?,
            submission_date: row.get(4)?,
            scores,
            overall_score: row.get(5 + DIMENSION_COUNT)?,
            notes: row.get(6 + DIMENSION_COUNT)?,
        })
    }

    fn into_assessment(self) -> Result<Assessment, StoreError> {
        let scores = Scores::from_stored(self.scores).ok_or_else(|| {
            StoreError::Corrupt(format!("assessment {} has out-of-range scores", self.id))
        })?;
        Ok(Assessment {
            id: self.id,
            survey_id: SurveyId::from(self.survey_id),
            respondent_name: self.respondent_name,
            respondent_team: self.respondent_team,
            submitted_at: parse_timestamp(&self.submission_date)?,
            scores,
            overall_score: self.overall_score,
            notes: self.notes,
        })
    }
}

impl Store for SqliteStore {
    fn insert_survey(&self, survey: &Survey) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO survey_links (survey_id, survey_name, created_date, is_active)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                survey.id.as_str(),
                survey.name,
                format_timestamp(&survey.created_at),
                survey.active
            ],
        )?;
        Ok(())
    }

    fn list_surveys(&self) -> Result<Vec<Survey>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM survey_links ORDER BY created_date DESC, id DESC",
            SurveyRow::COLUMNS
        ))?;
        let rows = stmt
            .query_map([], SurveyRow::read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(SurveyRow::into_survey).collect()
    }

    fn find_survey(&self, id: &SurveyId) -> Result<Option<Survey>, StoreError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM survey_links WHERE survey_id = ?1",
                    SurveyRow::COLUMNS
                ),
                params![id.as_str()],
                SurveyRow::read,
            )
            .optional()?;
        row.map(SurveyRow::into_survey).transpose()
    }

    fn set_survey_active(&self, id: &SurveyId, active: bool) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE survey_links SET is_active = ?1 WHERE survey_id = ?2",
            params![active, id.as_str()],
        )?;
        Ok(changed > 0)
    }

    fn insert_assessment(&self, assessment: NewAssessment) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        let s = assessment.scores.values();
        conn.execute(
            &format!(
                "INSERT INTO assessments (
                    survey_id, respondent_name, respondent_team, submission_date,
                    {}, overall_score, notes
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                dimension_columns()
            ),
            params![
                assessment.survey_id.as_str(),
                assessment.respondent_name,
                assessment.respondent_team,
                format_timestamp(&assessment.submitted_at),
                s[0],
                s[1],
                s[2],
                s[3],
                s[4],
                s[5],
                s[6],
                s[7],
                assessment.overall_score,
                assessment.notes
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn assessments_for(&self, id: &SurveyId) -> Result<Vec<Assessment>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, survey_id, respondent_name, respondent_team, submission_date,
                    {}, overall_score, notes
             FROM assessments
             WHERE survey_id = ?1
             ORDER BY submission_date DESC, id DESC",
            dimension_columns()
        ))?;
        let rows = stmt
            .query_map(params![id.as_str()], AssessmentRow::read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(AssessmentRow::into_assessment).collect()
    }
}
