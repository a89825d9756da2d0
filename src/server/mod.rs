//! HTTP service.
//!
//! Exposes survey creation, assessment submission and the read-side
//! summary and export over JSON. Handlers never touch the store on the
//! async runtime; each call runs on the blocking pool.

pub mod error;
pub mod handlers;

pub use error::ApiError;

use crate::config::Config;
use crate::error::StoreError;
use crate::models::SurveyId;
use crate::registry::SurveyRegistry;
use crate::report::SummaryPresenter;
use crate::store::Store;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;

/// Request-independent settings the handlers need.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_url: Option<String>,
    pub survey_page: String,
    pub decimal_places: u32,
}

impl ServerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_url: config.server.public_url.clone(),
            survey_page: config.server.survey_page.clone(),
            decimal_places: config.export.decimal_places,
        }
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
    settings: Arc<ServerSettings>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, settings: ServerSettings) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
        }
    }

    pub fn presenter(&self) -> SummaryPresenter {
        SummaryPresenter::new(self.settings.decimal_places)
    }

    /// Run a registry operation on the blocking thread pool.
    pub async fn with_registry<T, E, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(SurveyRegistry<'_>) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<ApiError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(SurveyRegistry::new(store.as_ref())).map_err(Into::into))
            .await
            .map_err(|e| ApiError::Store(StoreError::Task(e.to_string())))?
    }

    /// Shareable link for a survey.
    ///
    /// Uses the configured public URL, else the request's Host header.
    pub fn survey_url(&self, host: Option<&str>, id: &SurveyId) -> String {
        let base = match (&self.settings.public_url, host) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, Some(host)) => format!("http://{}", host),
            (None, None) => "http://localhost".to_string(),
        };
        format!(
            "{}/{}?survey={}",
            base,
            self.settings.survey_page.trim_start_matches('/'),
            id
        )
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/surveys",
            post(handlers::create_survey).get(handlers::list_surveys),
        )
        .route("/api/surveys/:survey_id/active", put(handlers::set_survey_active))
        .route("/api/assessments", post(handlers::submit_assessment))
        .route("/api/assessments/:survey_id", get(handlers::list_assessments))
        .route("/api/summary/:survey_id", get(handlers::survey_summary))
        .route("/api/export/:survey_id", get(handlers::export_workbook))
        .fallback(handlers::not_found)
        .with_state(state)
}

/// Resolve when the process receives Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, SqliteStore};
    use futures::future::join_all;
    use reqwest::{Client, StatusCode};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio_test::assert_ok;

    fn settings(public_url: Option<&str>) -> ServerSettings {
        ServerSettings {
            public_url: public_url.map(String::from),
            survey_page: "index.html".to_string(),
            decimal_places: 2,
        }
    }

    async fn spawn_app_with(store: Arc<dyn Store>, settings: ServerSettings) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(AppState::new(store, settings));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn spawn_app() -> String {
        spawn_app_with(Arc::new(MemoryStore::new()), settings(None)).await
    }

    fn assessment_body(survey_id: &str, scores: Value) -> Value {
        json!({
            "surveyId": survey_id,
            "respondentName": "John Doe",
            "respondentTeam": "Development Team",
            "scores": scores,
            "notes": "Test assessment notes"
        })
    }

    async fn create_survey(client: &Client, base: &str, name: &str) -> Value {
        let resp = assert_ok!(
            client
                .post(format!("{}/api/surveys", base))
                .json(&json!({ "surveyName": name }))
                .send()
                .await
        );
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_ok!(resp.json::<Value>().await)
    }

    #[test]
    fn test_survey_url_prefers_public_url() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let id = SurveyId::from("abc");

        let state = AppState::new(Arc::clone(&store), settings(Some("https://pulse.example.com/")));
        assert_eq!(
            state.survey_url(Some("internal:3000"), &id),
            "https://pulse.example.com/index.html?survey=abc"
        );

        let state = AppState::new(store, settings(None));
        assert_eq!(
            state.survey_url(Some("localhost:3000"), &id),
            "http://localhost:3000/index.html?survey=abc"
        );
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn_app().await;
        let resp = assert_ok!(reqwest::get(format!("{}/health", base)).await);
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = assert_ok!(resp.json().await);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_create_and_list_surveys() {
        let base = spawn_app().await;
        let client = Client::new();

        let created = create_survey(&client, &base, "Q3 Review").await;
        let id = created["surveyId"].as_str().unwrap().to_string();
        assert_eq!(created["surveyName"], "Q3 Review");
        let url = created["surveyUrl"].as_str().unwrap();
        assert!(url.ends_with(&format!("/index.html?survey={}", id)), "{}", url);

        let resp = assert_ok!(client.get(format!("{}/api/surveys", base)).send().await);
        assert_eq!(resp.status(), StatusCode::OK);
        let surveys: Value = assert_ok!(resp.json().await);
        assert_eq!(surveys[0]["survey_id"], id.as_str());
        assert_eq!(surveys[0]["survey_name"], "Q3 Review");
        assert_eq!(surveys[0]["is_active"], true);
        assert!(surveys[0]["created_date"].is_string());
    }

    #[tokio::test]
    async fn test_create_survey_rejects_bad_names() {
        let base = spawn_app().await;
        let client = Client::new();

        let resp = assert_ok!(
            client
                .post(format!("{}/api/surveys", base))
                .json(&json!({ "surveyName": "   " }))
                .send()
                .await
        );
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = assert_ok!(resp.json().await);
        assert_eq!(body["error"], "survey name must not be empty");

        let resp = assert_ok!(
            client
                .post(format!("{}/api/surveys", base))
                .json(&json!({ "surveyName": "x".repeat(101) }))
                .send()
                .await
        );
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = assert_ok!(resp.json().await);
        assert_eq!(body["error"], "survey name must not exceed 100 characters");
    }

    #[tokio::test]
    async fn test_surveys_listed_newest_first() {
        let base = spawn_app().await;
        let client = Client::new();
        for i in 0..5 {
            create_survey(&client, &base, &format!("n{}", i)).await;
        }

        let resp = assert_ok!(client.get(format!("{}/api/surveys", base)).send().await);
        let surveys: Value = assert_ok!(resp.json().await);
        let names: Vec<&str> = surveys
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["survey_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["n4", "n3", "n2", "n1", "n0"]);
    }

    #[tokio::test]
    async fn test_submit_and_summarize() {
        let base = spawn_app().await;
        let client = Client::new();
        let created = create_survey(&client, &base, "S2").await;
        let id = created["surveyId"].as_str().unwrap().to_string();

        for scores in [json!([5, 4, 5, 4, 5, 4, 5, 4]), json!([3, 3, 3, 3, 3, 3, 3, 3])] {
            let resp = assert_ok!(
                client
                    .post(format!("{}/api/assessments", base))
                    .json(&assessment_body(&id, scores))
                    .send()
                    .await
            );
            assert_eq!(resp.status(), StatusCode::CREATED);
            let body: Value = assert_ok!(resp.json().await);
            assert!(body["id"].is_i64());
            assert_eq!(body["message"], "assessment submitted");
        }

        let resp = assert_ok!(client.get(format!("{}/api/summary/{}", base, id)).send().await);
        let summary: Value = assert_ok!(resp.json().await);
        assert_eq!(summary["total_responses"], 2);
        assert_eq!(summary["average_overall_score"], 3.75);
        assert_eq!(summary["avg_project_progress"], 4.0);
        assert_eq!(summary["avg_requirement_response"], 3.5);

        let resp = assert_ok!(client.get(format!("{}/api/assessments/{}", base, id)).send().await);
        let rows: Value = assert_ok!(resp.json().await);
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["overall_score"], 3.0);
        assert_eq!(rows[0]["project_progress_transparency"], 3);
        assert_eq!(rows[1]["overall_score"], 4.5);
        assert_eq!(rows[1]["notes"], "Test assessment notes");
    }

    #[tokio::test]
    async fn test_submission_errors() {
        let base = spawn_app().await;
        let client = Client::new();
        let url = format!("{}/api/assessments", base);

        let resp = assert_ok!(
            client
                .post(&url)
                .json(&assessment_body("s", json!([1, 2, 3])))
                .send()
                .await
        );
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = assert_ok!(resp.json().await);
        assert_eq!(body["error"], "scores array must contain 8 elements");

        let resp = assert_ok!(
            client
                .post(&url)
                .json(&assessment_body("s", json!([0, 2, 3, 4, 5, 1, 2, 3])))
                .send()
                .await
        );
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = assert_ok!(resp.json().await);
        assert_eq!(body["error"], "scores must be between 1 and 5");

        let resp = assert_ok!(
            client
                .post(&url)
                .json(&json!({ "surveyId": "s", "scores": [3, 3, 3, 3, 3, 3, 3, 3] }))
                .send()
                .await
        );
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = assert_ok!(resp.json().await);
        assert_eq!(body["error"], "missing required fields");

        let mut wrong_type = assessment_body("s", json!([3, 3, 3, 3, 3, 3, 3, 3]));
        wrong_type["respondentName"] = json!(123);
        let resp = assert_ok!(client.post(&url).json(&wrong_type).send().await);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = assert_ok!(resp.json().await);
        assert_eq!(body["error"], "missing required fields");

        let resp = assert_ok!(
            client
                .post(&url)
                .header("content-type", "application/json")
                .body("{not json")
                .send()
                .await
        );
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = assert_ok!(resp.json().await);
        assert!(body["error"].is_string());

        let resp = assert_ok!(client.get(format!("{}/api/summary/s", base)).send().await);
        let summary: Value = assert_ok!(resp.json().await);
        assert_eq!(summary["total_responses"], 0);
    }

    #[tokio::test]
    async fn test_unknown_survey_reads_are_empty() {
        let base = spawn_app().await;
        let client = Client::new();

        let resp = assert_ok!(client.get(format!("{}/api/summary/ghost", base)).send().await);
        assert_eq!(resp.status(), StatusCode::OK);
        let summary: Value = assert_ok!(resp.json().await);
        assert_eq!(summary["total_responses"], 0);
        assert!(summary["average_overall_score"].is_null());
        assert!(summary["avg_information_transmission"].is_null());

        let resp = assert_ok!(client.get(format!("{}/api/assessments/ghost", base)).send().await);
        assert_eq!(resp.status(), StatusCode::OK);
        let rows: Value = assert_ok!(resp.json().await);
        assert_eq!(rows, json!([]));
    }

    #[tokio::test]
    async fn test_set_active() {
        let base = spawn_app().await;
        let client = Client::new();
        let created = create_survey(&client, &base, "Toggle").await;
        let id = created["surveyId"].as_str().unwrap().to_string();

        let resp = assert_ok!(
            client
                .put(format!("{}/api/surveys/{}/active", base, id))
                .json(&json!({ "active": false }))
                .send()
                .await
        );
        assert_eq!(resp.status(), StatusCode::OK);
        let survey: Value = assert_ok!(resp.json().await);
        assert_eq!(survey["is_active"], false);

        let resp = assert_ok!(
            client
                .put(format!("{}/api/surveys/ghost/active", base))
                .json(&json!({ "active": false }))
                .send()
                .await
        );
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_export_download() {
        let base = spawn_app().await;
        let client = Client::new();
        let created = create_survey(&client, &base, "Export").await;
        let id = created["surveyId"].as_str().unwrap().to_string();

        assert_ok!(
            client
                .post(format!("{}/api/assessments", base))
                .json(&assessment_body(&id, json!([5, 5, 5, 5, 5, 5, 5, 5])))
                .send()
                .await
        );

        let resp = assert_ok!(client.get(format!("{}/api/export/{}", base, id)).send().await);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()["content-type"],
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(
            resp.headers()["content-disposition"],
            format!("attachment; filename=assessment_{}.xlsx", id).as_str()
        );
        let bytes = assert_ok!(resp.bytes().await);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let base = spawn_app().await;
        let resp = assert_ok!(reqwest::get(format!("{}/api/nothing", base)).await);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = assert_ok!(resp.json().await);
        assert_eq!(body, json!({ "error": "not found" }));
    }

    #[tokio::test]
    async fn test_concurrent_submissions_all_counted() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("pulse.db")).unwrap();
        let base = spawn_app_with(Arc::new(store), settings(None)).await;
        let client = Client::new();

        let surveys = join_all((0..5).map(|i| {
            let client = client.clone();
            let base = base.clone();
            async move { create_survey(&client, &base, &format!("Survey {}", i)).await }
        }))
        .await;
        let mut ids: Vec<String> = surveys
            .iter()
            .map(|s| s["surveyId"].as_str().unwrap().to_string())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);

        let target = ids[0].clone();
        let responses = join_all((0..20).map(|_| {
            client
                .post(format!("{}/api/assessments", base))
                .json(&assessment_body(&target, json!([4, 4, 4, 4, 4, 4, 4, 4])))
                .send()
        }))
        .await;
        for resp in responses {
            assert_eq!(assert_ok!(resp).status(), StatusCode::CREATED);
        }

        let resp = assert_ok!(client.get(format!("{}/api/summary/{}", base, target)).send().await);
        let summary: Value = assert_ok!(resp.json().await);
        assert_eq!(summary["total_responses"], 20);
        assert_eq!(summary["average_overall_score"], 4.0);
    }
}
