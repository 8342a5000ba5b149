//! # API REST
//!
//! REST API implementation for lab number issuance.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for wire types and `labnum-core` for the allocation logic.

#![warn(rust_2018_idioms)]

use api_shared::{
    CounterRes, ErrorRes, GenerateLabNumberReq, GenerateLabNumberRes, HealthRes, HealthService,
    ListCountersRes,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use labnum_core::{LabError, LabNumberService};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Message returned to clients when allocation fails for any storage reason.
pub const GENERATE_FAILED_MESSAGE: &str = "failed to generate lab number";

type ApiError = (StatusCode, Json<ErrorRes>);

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub lab_numbers: LabNumberService,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, generate_lab_number, list_counters, get_counter),
    components(schemas(
        HealthRes,
        GenerateLabNumberReq,
        GenerateLabNumberRes,
        CounterRes,
        ListCountersRes,
        ErrorRes
    ))
)]
pub struct ApiDoc;

/// Builds the REST router, including Swagger UI at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/lab-numbers", post(generate_lab_number))
        .route("/counters", get(list_counters))
        .route("/counters/:name", get(get_counter))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_response(err: &LabError, unavailable_message: &str) -> ApiError {
    match err {
        LabError::InvalidInput(_) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorRes {
                error: "invalid request".into(),
            }),
        ),
        LabError::CounterUnavailable { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorRes {
                error: unavailable_message.into(),
            }),
        ),
    }
}

fn join_error(err: tokio::task::JoinError, message: &str) -> ApiError {
    tracing::error!("blocking task failed: {:?}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorRes {
            error: message.into(),
        }),
    )
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/lab-numbers",
    request_body = GenerateLabNumberReq,
    responses(
        (status = 200, description = "Lab number issued", body = GenerateLabNumberRes),
        (status = 500, description = "Failed to generate lab number", body = ErrorRes)
    )
)]
/// Issue the next lab number for a patient
///
/// Classifies `medicalType` into a series and draws the next number from that series'
/// counter. Each successful call consumes exactly one number.
///
/// # Errors
/// Returns `500 Internal Server Error` with a generic message if the counter store could not
/// perform the increment. No number is issued in that case, so the client may retry.
#[axum::debug_handler]
async fn generate_lab_number(
    State(state): State<AppState>,
    Json(req): Json<GenerateLabNumberReq>,
) -> Result<Json<GenerateLabNumberRes>, ApiError> {
    let service = state.lab_numbers.clone();
    let result = tokio::task::spawn_blocking(move || {
        service.allocate(&req.medical_type, &req.passport_number)
    })
    .await
    .map_err(|e| join_error(e, GENERATE_FAILED_MESSAGE))?;

    match result {
        Ok(allocation) => Ok(Json(allocation.into())),
        Err(e) => {
            tracing::error!("Generate lab number error: {:?}", e);
            Err(error_response(&e, GENERATE_FAILED_MESSAGE))
        }
    }
}

#[utoipa::path(
    get,
    path = "/counters",
    responses(
        (status = 200, description = "All counters", body = ListCountersRes),
        (status = 500, description = "Counter store unavailable", body = ErrorRes)
    )
)]
/// List every counter and the last value issued from it.
#[axum::debug_handler]
async fn list_counters(
    State(state): State<AppState>,
) -> Result<Json<ListCountersRes>, ApiError> {
    let service = state.lab_numbers.clone();
    let result = tokio::task::spawn_blocking(move || service.counters().snapshot())
        .await
        .map_err(|e| join_error(e, "failed to read counters"))?;

    match result {
        Ok(counters) => Ok(Json(ListCountersRes {
            counters: counters.into_iter().map(CounterRes::from).collect(),
        })),
        Err(e) => {
            tracing::error!("List counters error: {:?}", e);
            Err(error_response(&e, "failed to read counters"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/counters/{name}",
    params(("name" = String, Path, description = "Counter name, e.g. S_SERIES")),
    responses(
        (status = 200, description = "Counter value; 0 if never used", body = CounterRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 500, description = "Counter store unavailable", body = ErrorRes)
    )
)]
/// Read a counter without incrementing it.
#[axum::debug_handler]
async fn get_counter(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CounterRes>, ApiError> {
    let service = state.lab_numbers.clone();
    let lookup = name.clone();
    let result = tokio::task::spawn_blocking(move || service.counters().current(&lookup))
        .await
        .map_err(|e| join_error(e, "failed to read counter"))?;

    match result {
        Ok(value) => Ok(Json(CounterRes { name, value })),
        Err(e) => {
            tracing::error!("Read counter error: {:?}", e);
            Err(error_response(&e, "failed to read counter"))
        }
    }
}
