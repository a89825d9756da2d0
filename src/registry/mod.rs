//! Survey registry and assessment recording.
//!
//! The registry is a thin layer over an injected [`Store`]. Survey
//! existence is advisory only: submissions and reads for an unknown survey
//! id go through, the former with a warning.

use crate::analysis::{self, overall_score};
use crate::error::{ServiceError, StoreError};
use crate::models::{Assessment, NewAssessment, SummaryAggregate, Survey, SurveyId};
use crate::store::Store;
use crate::validation::{validate_submission, validate_survey_name, RawSubmission};
use chrono::Utc;
use tracing::{info, warn};

/// Survey identity and assessment operations over a store.
pub struct SurveyRegistry<'a> {
    store: &'a dyn Store,
}

impl<'a> SurveyRegistry<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Register a new, active survey under a freshly generated id.
    pub fn create(&self, name: Option<&str>) -> Result<Survey, ServiceError> {
        let name = validate_survey_name(name)?;
        let survey = Survey {
            id: SurveyId::generate(),
            name,
            created_at: Utc::now(),
            active: true,
        };

        self.store.insert_survey(&survey)?;
        info!("Created survey {} ({:?})", survey.id, survey.name);
        Ok(survey)
    }

    /// All surveys, newest first.
    pub fn list(&self) -> Result<Vec<Survey>, StoreError> {
        self.store.list_surveys()
    }

    /// Look up one registered survey.
    pub fn find(&self, id: &SurveyId) -> Result<Option<Survey>, StoreError> {
        self.store.find_survey(id)
    }

    /// Flip the active flag. Returns the updated survey, or `None` if unknown.
    pub fn set_active(&self, id: &SurveyId, active: bool) -> Result<Option<Survey>, StoreError> {
        if !self.store.set_survey_active(id, active)? {
            return Ok(None);
        }
        info!("Survey {} active = {}", id, active);
        self.store.find_survey(id)
    }

    /// Validate and record one submission, returning the stored row.
    pub fn submit(&self, raw: RawSubmission) -> Result<Assessment, ServiceError> {
        let valid = validate_submission(raw)?;

        match self.store.find_survey(&valid.survey_id)? {
            None => warn!("Assessment submitted for unregistered survey {}", valid.survey_id),
            Some(survey) if !survey.active => {
                warn!("Assessment submitted for inactive survey {}", survey.id)
            }
            Some(_) => {}
        }

        let new = NewAssessment {
            overall_score: overall_score(&valid.scores),
            survey_id: valid.survey_id,
            respondent_name: valid.respondent_name,
            respondent_team: valid.respondent_team,
            scores: valid.scores,
            notes: valid.notes,
            submitted_at: Utc::now(),
        };

        let id = self.store.insert_assessment(new.clone())?;
        info!(
            "Recorded assessment {} for survey {} (overall {})",
            id, new.survey_id, new.overall_score
        );
        Ok(Assessment::from_new(id, new))
    }

    /// Stored assessments of a survey, newest first.
    pub fn assessments(&self, id: &SurveyId) -> Result<Vec<Assessment>, StoreError> {
        self.store.assessments_for(id)
    }

    /// Aggregate statistics of a survey.
    pub fn summary(&self, id: &SurveyId) -> Result<SummaryAggregate, StoreError> {
        analysis::summarize(self.store, id)
    }
}
