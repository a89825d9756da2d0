//! Submission and survey-name validation.
//!
//! Everything here is a pure check: inputs come in as loosely typed
//! request data and leave either as typed values or as a
//! [`ValidationError`].

use crate::error::ValidationError;
use crate::models::{Scores, SurveyId, DIMENSION_COUNT, MAX_SCORE, MIN_SCORE};
use serde::Deserialize;
use serde_json::Value;

/// Maximum survey name length, counted in characters of the untrimmed name.
pub const MAX_SURVEY_NAME_CHARS: usize = 100;

/// An assessment submission as received from a caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubmission {
    /// Required text fields are untyped so that a wrong type reads as missing.
    #[serde(default)]
    pub survey_id: Option<Value>,
    #[serde(default)]
    pub respondent_name: Option<Value>,
    #[serde(default)]
    pub respondent_team: Option<Value>,
    /// Kept untyped so shape and range faults can be told apart.
    #[serde(default)]
    pub scores: Option<Value>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A submission that passed every check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    pub survey_id: SurveyId,
    pub respondent_name: String,
    pub respondent_team: String,
    pub scores: Scores,
    pub notes: Option<String>,
}

/// Validate a full submission.
///
/// Required fields are checked before the scores, so a submission missing
/// both a name and valid scores reports [`ValidationError::MissingField`].
pub fn validate_submission(raw: RawSubmission) -> Result<ValidSubmission, ValidationError> {
    let survey_id = required(raw.survey_id)?;
    let respondent_name = required(raw.respondent_name)?;
    let respondent_team = required(raw.respondent_team)?;
    let scores = validate_scores(raw.scores.as_ref())?;

    Ok(ValidSubmission {
        survey_id: SurveyId::from(survey_id),
        respondent_name,
        respondent_team,
        scores,
        notes: raw.notes,
    })
}

fn required(field: Option<Value>) -> Result<String, ValidationError> {
    match field {
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value),
        _ => Err(ValidationError::MissingField),
    }
}

/// Validate the raw `scores` value of a submission.
///
/// The value must be an array of exactly eight elements. Numeric elements
/// are truncated toward zero (3.9 becomes 3) and then range-checked; any
/// element outside `[1, 5]` after truncation, or any non-numeric element,
/// rejects the whole array.
pub fn validate_scores(raw: Option<&Value>) -> Result<Scores, ValidationError> {
    let elements = match raw {
        Some(Value::Array(elements)) if elements.len() == DIMENSION_COUNT => elements,
        _ => return Err(ValidationError::Shape),
    };

    let mut values = [0u8; DIMENSION_COUNT];
    let mut in_range = true;

    for (slot, element) in values.iter_mut().zip(elements) {
        match element.as_f64().map(truncate_score) {
            Some(Some(score)) => *slot = score,
            _ => in_range = false,
        }
    }

    if in_range {
        Ok(Scores::from_validated(values))
    } else {
        Err(ValidationError::Range)
    }
}

/// Truncate toward zero and range-check a single numeric score.
pub fn truncate_score(value: f64) -> Option<u8> {
    let truncated = value.trunc();
    if truncated.is_finite() && (MIN_SCORE as f64..=MAX_SCORE as f64).contains(&truncated) {
        Some(truncated as u8)
    } else {
        None
    }
}

/// Validate a survey display name and return it unchanged.
///
/// Emptiness is judged after trimming; the length ceiling applies to the
/// name exactly as submitted.
pub fn validate_survey_name(name: Option<&str>) -> Result<String, ValidationError> {
    let name = name.ok_or(ValidationError::EmptyName)?;

    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > MAX_SURVEY_NAME_CHARS {
        return Err(ValidationError::NameTooLong);
    }

    Ok(name.to_string())
}
