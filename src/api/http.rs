//! HTTP surface: the interactive form page and its JSON twin.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Form, Json, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::common::error::{RiskCode, RiskError, RiskResult};
use crate::inference::service as inference_service;
use crate::inference::{Evidence, PatientForm, Posterior};
use crate::training::RiskModel;

use super::page::{self, Outcome};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<RiskModel>,
}

impl AppState {
    pub fn new(model: Arc<RiskModel>) -> Self {
        Self { model }
    }
}

fn status_for(code: RiskCode) -> StatusCode {
    match code {
        RiskCode::Ok => StatusCode::OK,
        RiskCode::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
        RiskCode::ModelMissing => StatusCode::SERVICE_UNAVAILABLE,
        RiskCode::Io | RiskCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error body for the API routes.
pub struct ApiError(RiskError);

impl From<RiskError> for ApiError {
    fn from(err: RiskError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let body = serde_json::json!({ "error": self.0.to_string(), "code": code.as_str() });
        (status_for(code), Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct PredictResponse {
    model_id: String,
    observed: usize,
    posterior: Posterior,
    prediction: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/predict", post(predict_json))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(page::render(&state.model, &PatientForm::default(), Outcome::Blank))
}

async fn predict_form(State(state): State<AppState>, Form(form): Form<PatientForm>) -> Response {
    match run_query(&state.model, &form) {
        Ok(posterior) => {
            Html(page::render(&state.model, &form, Outcome::Success(&posterior))).into_response()
        }
        Err(err) => {
            let message = err.to_string();
            let html = page::render(&state.model, &form, Outcome::Failure(&message));
            (status_for(err.code()), Html(html)).into_response()
        }
    }
}

async fn predict_json(
    State(state): State<AppState>,
    payload: Result<Json<PatientForm>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(form) = payload.map_err(|rejection| RiskError::invalid(rejection.body_text()))?;
    let evidence = Evidence::from_form(&form)?;
    let posterior = inference_service::query_risk(&state.model, &evidence)?;
    Ok(Json(PredictResponse {
        model_id: state.model.id.to_string(),
        observed: evidence.len(),
        prediction: posterior.most_likely().map(|row| row.state.clone()),
        posterior,
    }))
}

async fn health() -> &'static str {
    "ok"
}

fn run_query(model: &RiskModel, form: &PatientForm) -> RiskResult<Posterior> {
    let evidence = Evidence::from_form(form)?;
    inference_service::query_risk(model, &evidence)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, model_id = %state.model.id, "serving risk page");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await;
}

/// Resolve once `signal` fires. A signal that cannot be installed never resolves.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            warn!(error = %err, "cannot listen for shutdown signal, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    use super::*;
    use crate::testing;
    use crate::training::{service as training_service, TrainConfig};

    fn app() -> Router {
        let model = training_service::train(&testing::synthetic_dataset(300), &TrainConfig::default())
            .unwrap();
        router(AppState::new(Arc::new(model)))
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    const HIGH_RISK: &str = "Age=Adulte&Sexe=Homme&Tabagisme=Oui&Hypertension=Oui&Cholesterol_eleve=Oui\
&Antecedents_familiaux=Oui&Activite_physique=Non&Diabete=Oui&Stress_chronique=Oui";

    #[tokio::test]
    async fn index_renders_form_and_accuracy() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Accuracy (ensemble de test)"));
        assert!(html.contains("name=\"Cholesterol_eleve\""));
        assert!(html.contains("Tranche d&#x27;âge") || html.contains("Tranche d'âge"));
        assert!(!html.contains("Inférence réalisée"));
    }

    #[tokio::test]
    async fn form_post_renders_posterior_table() {
        let request = Request::post("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(HIGH_RISK))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("✅ Inférence réalisée avec succès"));
        assert!(html.contains("<td>Oui (1)</td>"));
        assert!(html.contains("<option value=\"Adulte\" selected>"));
    }

    #[tokio::test]
    async fn unknown_label_is_unprocessable() {
        let request = Request::post("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("Age=Vieux"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("Vieux"));
    }

    #[tokio::test]
    async fn json_endpoint_returns_posterior() {
        let request = Request::post("/api/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"Age":"Adulte","Sexe":"Homme","Tabagisme":"Oui","Hypertension":"Oui","Cholesterol_eleve":"Oui","Antecedents_familiaux":"Oui","Activite_physique":"Non","Diabete":"Oui","Stress_chronique":"Oui"}"#,
            ))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(value["observed"], 9);
        assert_eq!(value["prediction"], "Oui");
        assert_eq!(value["posterior"]["rows"].as_array().unwrap().len(), 2);

        let bad = Request::post("/api/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"Sexe":"Oui"}"#))
            .unwrap();
        let response = app().oneshot(bad).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let value: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(value["code"], "invalid_input");
    }

    #[tokio::test]
    async fn malformed_json_gets_error_body() {
        for (content_type, body) in [
            ("application/json", "{\"Age\":"),
            ("application/json", "[1, 2]"),
            ("text/plain", "{}"),
        ] {
            let request = Request::post("/api/predict")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap();
            let response = app().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{body}");
            let value: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
            assert_eq!(value["code"], "invalid_input");
            assert!(value["error"].as_str().unwrap().starts_with("invalid input"));
        }
    }

    #[tokio::test]
    async fn failed_signal_install_keeps_serving() {
        use std::time::Duration;

        let broken = async { Err::<(), _>(io::Error::other("no signal support")) };
        let waited = tokio::time::timeout(Duration::from_millis(50), wait_for_shutdown(broken)).await;
        assert!(waited.is_err(), "shutdown future resolved");

        let fired = async { Ok::<(), io::Error>(()) };
        tokio::time::timeout(Duration::from_millis(50), wait_for_shutdown(fired))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_text(response).await, "ok");
    }
}
