//! Storage capability.
//!
//! The registry and the aggregator never reach a database directly; they
//! are handed a [`Store`] and work against that. Two backends exist:
//! [`SqliteStore`] for real deployments and [`MemoryStore`] for tests and
//! throwaway runs.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::StoreError;
use crate::models::{Assessment, NewAssessment, Survey, SurveyId};

/// Persistent state of surveys and assessments.
///
/// Assessments are append-only. Implementations must be safe to share
/// between request handlers.
pub trait Store: Send + Sync {
    /// Record a newly registered survey.
    fn insert_survey(&self, survey: &Survey) -> Result<(), StoreError>;

    /// All surveys, newest first.
    fn list_surveys(&self) -> Result<Vec<Survey>, StoreError>;

    /// Look up one survey by id.
    fn find_survey(&self, id: &SurveyId) -> Result<Option<Survey>, StoreError>;

    /// Set the active flag. Returns `false` when no such survey exists.
    fn set_survey_active(&self, id: &SurveyId, active: bool) -> Result<bool, StoreError>;

    /// Append an assessment and return its generated id.
    fn insert_assessment(&self, assessment: NewAssessment) -> Result<i64, StoreError>;

    /// Assessments referencing `id`, newest first. Empty for unknown ids.
    fn assessments_for(&self, id: &SurveyId) -> Result<Vec<Assessment>, StoreError>;
}

/// `storage.database` value selecting [`MemoryStore`].
pub const MEMORY_BACKEND: &str = "memory";

/// Open the backend named by a `storage.database` setting.
///
/// `memory` selects [`MemoryStore`], `:memory:` a process-local SQLite
/// database, and anything else is a SQLite file path.
pub fn open(database: &str) -> Result<Box<dyn Store>, StoreError> {
    match database {
        MEMORY_BACKEND => Ok(Box::new(MemoryStore::new())),
        ":memory:" => Ok(Box::new(SqliteStore::open_in_memory()?)),
        path => Ok(Box::new(SqliteStore::open(std::path::Path::new(path))?)),
    }
}
