//! HTTP routes over a shared [`Engines`]
//!
//! Handlers are thin: parse JSON, call the engine, map [`EngineError`] to a
//! status code with [`EngineError::is_client_error`].

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, ColumnAggregator, ColumnSummary, CsvOptions};
use crate::error::EngineError;
use crate::params::{SchemeKind, SchemeParams};
use crate::service::{Engines, OperationRequest, OperationResponse};

/// Shared server state
#[derive(Debug)]
pub struct AppState {
    pub engines: Engines,
    pub csv: CsvOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: EngineError) -> ApiError {
    (status_for(&err), Json(ErrorResponse { error: err.to_string() }))
}

fn status_for(err: &EngineError) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn default_scheme() -> SchemeKind {
    SchemeKind::Approximate
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct ParamsResponse {
    exact: SchemeParams,
    approximate: SchemeParams,
}

#[derive(Deserialize)]
struct SchemeQuery {
    #[serde(default = "default_scheme")]
    scheme: SchemeKind,
}

#[derive(Serialize, Deserialize)]
pub struct PublicKeyResponse {
    pub scheme: SchemeKind,
    pub public_key: String,
}

#[derive(Serialize, Deserialize)]
pub struct EncryptRequest {
    pub value: f64,
    #[serde(default = "default_scheme")]
    pub scheme: SchemeKind,
}

#[derive(Serialize, Deserialize)]
pub struct CiphertextResponse {
    pub ciphertext: String,
}

#[derive(Serialize, Deserialize)]
pub struct DecryptRequest {
    pub ciphertext: String,
    #[serde(default = "default_scheme")]
    pub scheme: SchemeKind,
}

#[derive(Serialize, Deserialize)]
pub struct ValueResponse {
    pub value: f64,
}

#[derive(Serialize, Deserialize)]
pub struct AddRequest {
    pub a: String,
    pub b: String,
    #[serde(default = "default_scheme")]
    pub scheme: SchemeKind,
}

#[derive(Serialize, Deserialize)]
pub struct CsvRequest {
    pub path: PathBuf,
    #[serde(default)]
    pub column: usize,
    /// Overrides the server's header setting
    #[serde(default)]
    pub has_header: Option<bool>,
    /// Encrypt under this scheme; plaintext aggregation when absent
    #[serde(default)]
    pub scheme: Option<SchemeKind>,
}

#[derive(Serialize, Deserialize)]
pub struct CsvReadResponse {
    pub values: Vec<f64>,
    pub count: usize,
}

impl AppState {
    fn aggregator(&self, req: &CsvRequest) -> ColumnAggregator {
        let mut options = self.csv;
        if let Some(has_header) = req.has_header {
            options.has_header = has_header;
        }
        ColumnAggregator::new(options)
    }
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_params(State(state): State<Arc<AppState>>) -> Json<ParamsResponse> {
    Json(ParamsResponse {
        exact: state.engines.params(SchemeKind::Exact).clone(),
        approximate: state.engines.params(SchemeKind::Approximate).clone(),
    })
}

async fn get_public_key(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SchemeQuery>,
) -> Result<Json<PublicKeyResponse>, ApiError> {
    let public_key = state
        .engines
        .export_public_key(query.scheme)
        .map_err(api_error)?;
    Ok(Json(PublicKeyResponse {
        scheme: query.scheme,
        public_key,
    }))
}

async fn handle_operation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OperationRequest>,
) -> (StatusCode, Json<OperationResponse>) {
    let outcome = state.engines.execute(&request);
    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(err) => status_for(err),
    };
    (status, Json(outcome.into()))
}

async fn handle_encrypt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EncryptRequest>,
) -> Result<Json<CiphertextResponse>, ApiError> {
    let ciphertext = state
        .engines
        .encrypt_text(req.scheme, req.value)
        .map_err(api_error)?;
    Ok(Json(CiphertextResponse { ciphertext }))
}

async fn handle_decrypt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DecryptRequest>,
) -> Result<Json<ValueResponse>, ApiError> {
    let value = state
        .engines
        .decrypt_text(req.scheme, &req.ciphertext)
        .map_err(api_error)?;
    Ok(Json(ValueResponse { value }))
}

async fn handle_add(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddRequest>,
) -> Result<Json<CiphertextResponse>, ApiError> {
    let ciphertext = state
        .engines
        .add_text(req.scheme, &req.a, &req.b)
        .map_err(api_error)?;
    Ok(Json(CiphertextResponse { ciphertext }))
}

async fn handle_csv_read(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CsvRequest>,
) -> Result<Json<CsvReadResponse>, ApiError> {
    // Reading reports a missing file; aggregation degrades to an empty column
    let values = state
        .aggregator(&req)
        .try_load_column(&req.path, req.column)
        .map_err(api_error)?;
    Ok(Json(CsvReadResponse {
        count: values.len(),
        values,
    }))
}

fn csv_summary(
    state: &AppState,
    req: &CsvRequest,
    aggregate: Aggregate,
) -> Result<Json<ColumnSummary>, ApiError> {
    let summary = state
        .engines
        .summarize_file(&state.aggregator(req), &req.path, req.column, aggregate, req.scheme)
        .map_err(api_error)?;
    Ok(Json(summary))
}

async fn handle_csv_sum(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CsvRequest>,
) -> Result<Json<ColumnSummary>, ApiError> {
    csv_summary(&state, &req, Aggregate::Sum)
}

async fn handle_csv_average(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CsvRequest>,
) -> Result<Json<ColumnSummary>, ApiError> {
    csv_summary(&state, &req, Aggregate::Average)
}

/// All routes, bound to `state`
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/params", get(get_params))
        .route("/public_key", get(get_public_key))
        .route("/operation", post(handle_operation))
        .route("/encrypt", post(handle_encrypt))
        .route("/decrypt", post(handle_decrypt))
        .route("/add_encrypted", post(handle_add))
        .route("/csv/read", post(handle_csv_read))
        .route("/csv/sum", post(handle_csv_sum))
        .route("/csv/average", post(handle_csv_average))
        .with_state(state)
}
