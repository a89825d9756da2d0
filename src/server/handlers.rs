//! Request handlers.

use super::error::ApiError;
use super::AppState;
use crate::models::{Assessment, SummaryAggregate, Survey, SurveyId};
use crate::report::{export_filename, export_survey, XLSX_CONTENT_TYPE};
use crate::validation::RawSubmission;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurveyRequest {
    pub survey_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurveyResponse {
    pub survey_id: SurveyId,
    pub survey_name: String,
    pub survey_url: String,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: i64,
    pub message: &'static str,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn create_survey(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateSurveyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateSurveyResponse>), ApiError> {
    let Json(request) = payload?;

    let survey = state
        .with_registry(move |registry| registry.create(request.survey_name.as_deref()))
        .await?;

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());
    let survey_url = state.survey_url(host, &survey.id);

    Ok((
        StatusCode::CREATED,
        Json(CreateSurveyResponse {
            survey_id: survey.id,
            survey_name: survey.name,
            survey_url,
        }),
    ))
}

pub async fn list_surveys(State(state): State<AppState>) -> Result<Json<Vec<Survey>>, ApiError> {
    let surveys = state.with_registry(|registry| registry.list()).await?;
    debug!("Listing {} surveys", surveys.len());
    Ok(Json(surveys))
}

pub async fn set_survey_active(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<Survey>, ApiError> {
    let Json(request) = payload?;
    let id = SurveyId::from(survey_id);

    state
        .with_registry(move |registry| registry.set_active(&id, request.active))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub async fn submit_assessment(
    State(state): State<AppState>,
    payload: Result<Json<RawSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let Json(raw) = payload?;

    let stored = state
        .with_registry(move |registry| registry.submit(raw))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            id: stored.id,
            message: "assessment submitted",
        }),
    ))
}

pub async fn list_assessments(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
) -> Result<Json<Vec<Assessment>>, ApiError> {
    let id = SurveyId::from(survey_id);
    let rows = state
        .with_registry(move |registry| registry.assessments(&id))
        .await?;
    Ok(Json(rows))
}

pub async fn survey_summary(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
) -> Result<Json<SummaryAggregate>, ApiError> {
    let id = SurveyId::from(survey_id);
    let summary = state
        .with_registry(move |registry| registry.summary(&id))
        .await?;
    Ok(Json(summary))
}

pub async fn export_workbook(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = SurveyId::from(survey_id);
    let presenter = state.presenter();

    let filename = export_filename(&id);
    let bytes = state
        .with_registry(move |registry| -> Result<Vec<u8>, ApiError> {
            let rows = registry.assessments(&id)?;
            Ok(export_survey(&rows, &presenter)?)
        })
        .await?;
    debug!("Exported {} ({} bytes)", filename, bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
