//! In-process storage backend.

use super::Store;
use crate::analysis::sort_newest_first;
use crate::error::StoreError;
use crate::models::{Assessment, NewAssessment, Survey, SurveyId};
use std::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    surveys: Vec<Survey>,
    assessments: Vec<Assessment>,
    next_id: i64,
}

/// Store that keeps everything in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn insert_survey(&self, survey: &Survey) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        if state.surveys.iter().any(|s| s.id == survey.id) {
            return Err(StoreError::Duplicate(survey.id.to_string()));
        }
        state.surveys.push(survey.clone());
        Ok(())
    }

    fn list_surveys(&self) -> Result<Vec<Survey>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        // Reverse first so that equal timestamps keep newest-inserted first.
        let mut surveys: Vec<Survey> = state.surveys.iter().rev().cloned().collect();
        surveys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(surveys)
    }

    fn find_survey(&self, id: &SurveyId) -> Result<Option<Survey>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.surveys.iter().find(|s| &s.id == id).cloned())
    }

    fn set_survey_active(&self, id: &SurveyId, active: bool) -> Result<bool, StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        match state.surveys.iter_mut().find(|s| &s.id == id) {
            Some(survey) => {
                survey.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn insert_assessment(&self, assessment: NewAssessment) -> Result<i64, StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        state.next_id += 1;
        let id = state.next_id;
        state.assessments.push(Assessment::from_new(id, assessment));
        Ok(id)
    }

    fn assessments_for(&self, id: &SurveyId) -> Result<Vec<Assessment>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        let mut rows: Vec<Assessment> = state
            .assessments
            .iter()
            .filter(|a| &a.survey_id == id)
            .cloned()
            .collect();
        sort_newest_first(&mut rows);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_scores;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn new_assessment(survey_id: &str, offset_secs: i64) -> NewAssessment {
        let scores = validate_scores(Some(&json!([3, 3, 3, 3, 3, 3, 3, 3]))).unwrap();
        NewAssessment {
            survey_id: SurveyId::from(survey_id),
            respondent_name: "Ada".to_string(),
            respondent_team: "Core".to_string(),
            scores,
            overall_score: 3.0,
            notes: None,
            submitted_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn test_ids_are_sequential() {
        let store = MemoryStore::new();
        assert_eq!(store.insert_assessment(new_assessment("s", 0)).unwrap(), 1);
        assert_eq!(store.insert_assessment(new_assessment("s", 1)).unwrap(), 2);
    }

    #[test]
    fn test_assessments_scoped_and_ordered() {
        let store = MemoryStore::new();
        store.insert_assessment(new_assessment("s", 0)).unwrap();
        store.insert_assessment(new_assessment("t", 5)).unwrap();
        store.insert_assessment(new_assessment("s", 10)).unwrap();

        let ids: Vec<i64> = store
            .assessments_for(&SurveyId::from("s"))
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_surveys_with_equal_timestamps_keep_insertion_order_reversed() {
        let store = MemoryStore::new();
        let created_at = Utc::now();
        for id in ["a", "b", "c"] {
            store
                .insert_survey(&Survey {
                    id: SurveyId::from(id),
                    name: id.to_uppercase(),
                    created_at,
                    active: true,
                })
                .unwrap();
        }

        let ids: Vec<String> = store
            .list_surveys()
            .unwrap()
            .into_iter()
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_duplicate_survey_rejected() {
        let store = MemoryStore::new();
        let survey = Survey {
            id: SurveyId::from("dup"),
            name: "Dup".to_string(),
            created_at: Utc::now(),
            active: true,
        };
        store.insert_survey(&survey).unwrap();
        assert!(store.insert_survey(&survey).is_err());
        assert!(store.set_survey_active(&survey.id, false).unwrap());
        assert!(!store.find_survey(&survey.id).unwrap().unwrap().active);
    }
}
