use crate::infra::AppState;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use displacement_predictor::catalog::{self, YearCheck};
use displacement_predictor::domain::{deserialize_optional_integer, RawInput};
use displacement_predictor::error::AppError;
use displacement_predictor::geo::{self, RegionInfo};
use displacement_predictor::models::ModelEntry;
use displacement_predictor::narrative::{self, NarrativeContext, NarrativeGenerator};
use displacement_predictor::pipeline::PipelineOutcome;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub(crate) struct PredictRequest {
    pub(crate) model: String,
    #[serde(flatten)]
    pub(crate) input: RawInput,
    #[serde(default)]
    pub(crate) explain: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictResponse {
    #[serde(flatten)]
    pub(crate) outcome: PipelineOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) range_warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct YearRequest {
    #[serde(default, deserialize_with = "deserialize_optional_integer")]
    pub(crate) year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModelsResponse {
    pub(crate) models: Vec<ModelEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DepartmentsResponse {
    pub(crate) departments: Vec<RegionInfo>,
}

pub(crate) fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/models", get(models_endpoint))
        .route("/api/variables", get(variables_endpoint))
        .route("/api/departments", get(departments_endpoint))
        .route("/api/department_geo/:name", get(department_geo_endpoint))
        .route("/api/validate_year", post(validate_year_endpoint))
        .route("/api/predict", post(predict_endpoint))
        .route("/api/random", get(random_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let registry = state.pipeline.registry();
    let ready =
        state.readiness.load(std::sync::atomic::Ordering::Relaxed) && registry.is_ready();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let label = if ready { "ready" } else { "initializing" };
    let payload = json!({
        "status": label,
        "models_loaded": registry.available(),
        "loaded_at": registry.loaded_at(),
    });

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn models_endpoint(Extension(state): Extension<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.pipeline.registry().catalog(),
    })
}

pub(crate) async fn variables_endpoint() -> Json<catalog::ValidValues> {
    Json(catalog::valid_values())
}

pub(crate) async fn departments_endpoint() -> Json<DepartmentsResponse> {
    Json(DepartmentsResponse {
        departments: geo::regions(),
    })
}

pub(crate) async fn department_geo_endpoint(
    Path(name): Path<String>,
) -> Result<Json<RegionInfo>, AppError> {
    geo::region_info(&name)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Department not found".to_string()))
}

pub(crate) async fn validate_year_endpoint(
    Json(request): Json<YearRequest>,
) -> (StatusCode, Json<YearCheck>) {
    match request.year {
        Some(year) => (StatusCode::OK, Json(catalog::check_year(year))),
        None => (
            StatusCode::BAD_REQUEST,
            Json(YearCheck {
                valid: false,
                warning: Some("Year is required".to_string()),
            }),
        ),
    }
}

pub(crate) async fn predict_endpoint(
    Extension(state): Extension<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, AppError> {
    let PredictRequest {
        model,
        input,
        explain,
    } = request;
    tracing::debug!(%model, region = %input.region, "dispatching prediction");

    let pipeline = state.pipeline.clone();
    let outcome = tokio::task::spawn_blocking(move || pipeline.run(&input, &model))
        .await
        .map_err(|err| AppError::Internal(err.to_string()))??;

    let range_warnings = narrative::range_warnings(&outcome.input);
    let explanation = if explain {
        let context = NarrativeContext::new(
            outcome.input.clone(),
            outcome.geo,
            outcome.prediction.clone(),
            outcome.validation.clone(),
        );
        match state.narrator.explain(&context) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::warn!(error = %err, "explanation unavailable");
                None
            }
        }
    } else {
        None
    };

    Ok(Json(PredictResponse {
        outcome,
        range_warnings,
        explanation,
    }))
}

pub(crate) async fn random_endpoint() -> Json<RawInput> {
    Json(random_input(&mut rand::thread_rng()))
}

/// A valid request drawn uniformly from the enumerated values, with the
/// department's derived distances filled in.
pub(crate) fn random_input<R: Rng + ?Sized>(rng: &mut R) -> RawInput {
    let values = catalog::valid_values();
    let mut pick = |column: &str| -> String {
        values
            .categorical
            .get(column)
            .and_then(|options| options.choose(rng))
            .map(|value| value.to_string())
            .unwrap_or_default()
    };

    let region = pick("ESTADO_DEPTO");
    let sex = pick("SEXO");
    let ethnicity = pick("ETNIA");
    let disability = pick("DISCAPACIDAD");
    let age_bracket = pick("CICLO_VITAL");
    let geo = geo::distances(&region);

    RawInput {
        region,
        sex,
        ethnicity,
        disability,
        age_bracket,
        reporting_year: rng.gen_range(values.year.min..=values.year.max),
        prior_events: rng.gen_range(1..=1000),
        north_south_km: Some(geo.north_south_km),
        east_west_km: Some(geo.east_west_km),
        total_km: Some(geo.total_km),
    }
}
