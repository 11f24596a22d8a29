use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Allocation, AnalysisConfig, AnalysisError, AnalysisReport, Conflict, Metrics, Portfolio,
    PortfolioMetadata, Resource, Suggestion, analyze,
};

#[derive(Clone)]
pub struct AppState {
    portfolio: Arc<RwLock<Portfolio>>,
}

impl AppState {
    pub fn new(portfolio: Portfolio) -> Self {
        Self {
            portfolio: Arc::new(RwLock::new(portfolio)),
        }
    }

    pub fn with_shared(portfolio: Arc<RwLock<Portfolio>>) -> Self {
        Self { portfolio }
    }

    fn portfolio(&self) -> Arc<RwLock<Portfolio>> {
        self.portfolio.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<AnalysisError> for ApiError {
    fn from(value: AnalysisError) -> Self {
        tracing::warn!(error = %value, "rejected analysis input");
        ApiError::Invalid(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

/// Stateless analysis request: everything needed travels in the body.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub allocations: Vec<Allocation>,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    #[serde(default)]
    pub config: Option<AnalysisConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub metrics: Metrics,
    pub conflicts: Vec<Conflict>,
    pub suggestions: Vec<Suggestion>,
}

impl From<AnalysisReport> for AnalyzeResponse {
    fn from(report: AnalysisReport) -> Self {
        Self {
            metrics: report.metrics,
            conflicts: report.conflicts,
            suggestions: report.suggestions,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PortfolioBody {
    pub metadata: PortfolioMetadata,
    #[serde(default)]
    pub config: Option<AnalysisConfig>,
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub allocations: Vec<Allocation>,
}

#[derive(Debug, Default, Deserialize)]
struct WindowPayload {
    range_start: Option<NaiveDate>,
    range_end: Option<NaiveDate>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze_snapshot))
        .route("/portfolio", get(get_portfolio).put(replace_portfolio))
        .route("/portfolio/analysis", post(analyze_portfolio))
        .route("/resources", get(list_resources).post(create_resource))
        .route("/resources/:id", delete(delete_resource))
        .route("/allocations", get(list_allocations).post(create_allocation))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, portfolio: Portfolio) -> std::io::Result<()> {
    let state = AppState::new(portfolio);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "capacity-tool HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn analyze_snapshot(
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let config = request.config.unwrap_or_default();
    config
        .validate()
        .map_err(|err| ApiError::invalid(err.to_string()))?;
    let report = analyze(
        &request.resources,
        &request.allocations,
        request.range_start,
        request.range_end,
        &config,
    )?;
    Ok(Json(report.into()))
}

async fn get_portfolio(State(state): State<AppState>) -> Json<PortfolioBody> {
    let portfolio = state.portfolio();
    let body = {
        let guard = portfolio.read();
        PortfolioBody {
            metadata: guard.metadata().clone(),
            config: Some(*guard.config()),
            resources: guard.resources().to_vec(),
            allocations: guard.allocations().to_vec(),
        }
    };
    Json(body)
}

async fn replace_portfolio(
    State(state): State<AppState>,
    Json(body): Json<PortfolioBody>,
) -> Result<StatusCode, ApiError> {
    let config = body.config.unwrap_or_default();
    config
        .validate()
        .map_err(|err| ApiError::invalid(err.to_string()))?;
    let replacement = Portfolio::from_parts(body.metadata, config, body.resources, body.allocations)?;
    let portfolio = state.portfolio();
    *portfolio.write() = replacement;
    Ok(StatusCode::NO_CONTENT)
}

async fn analyze_portfolio(
    State(state): State<AppState>,
    payload: Option<Json<WindowPayload>>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let window = payload.map(|Json(window)| window).unwrap_or_default();
    let portfolio = state.portfolio();
    let report = {
        let guard = portfolio.read();
        let start = window.range_start.unwrap_or(guard.metadata().range_start);
        let end = window.range_end.unwrap_or(guard.metadata().range_end);
        guard.analyze_range(start, end)?
    };
    Ok(Json(report))
}

async fn list_resources(State(state): State<AppState>) -> Json<Vec<Resource>> {
    let portfolio = state.portfolio();
    let resources = portfolio.read().resources().to_vec();
    Json(resources)
}

async fn create_resource(
    State(state): State<AppState>,
    Json(resource): Json<Resource>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    let portfolio = state.portfolio();
    {
        let mut guard = portfolio.write();
        if guard.find_resource(&resource.id).is_some() {
            return Err(ApiError::Conflict(format!(
                "resource {} already exists",
                resource.id
            )));
        }
        guard.add_resource(resource.clone())?;
    }
    Ok((StatusCode::CREATED, Json(resource)))
}

async fn delete_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let portfolio = state.portfolio();
    let removed = portfolio.write().remove_resource(&resource_id);
    if !removed {
        return Err(ApiError::not_found(format!(
            "resource {resource_id} not found"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_allocations(State(state): State<AppState>) -> Json<Vec<Allocation>> {
    let portfolio = state.portfolio();
    let allocations = portfolio.read().allocations().to_vec();
    Json(allocations)
}

async fn create_allocation(
    State(state): State<AppState>,
    Json(allocation): Json<Allocation>,
) -> Result<(StatusCode, Json<Allocation>), ApiError> {
    let portfolio = state.portfolio();
    portfolio.write().add_allocation(allocation.clone())?;
    Ok((StatusCode::CREATED, Json(allocation)))
}
