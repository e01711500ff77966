//! Query analysis handlers

use axum::extract::{Extension, Json, State};
use std::sync::Arc;
use validator::Validate;

use crate::AppState;
use crate::middleware::CurrentUser;
use crate::models::{AnalysisResponse, AnalyzeRequest, AnalyzeSchemaRequest, SchemaOverview};
use crate::utils::ApiResult;

/// Analyze a SELECT/CTE query against a target database
#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Metadata and advisor reports", body = AnalysisResponse),
        (status = 400, description = "Empty or unsafe query, or target unreachable"),
        (status = 404, description = "Vault profile not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Analysis"
)]
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalysisResponse>> {
    req.validate()?;

    let t0 = std::time::Instant::now();
    let response = state.analysis_service.analyze(user.user_id, req).await?;
    tracing::info!(
        "Analysis for user {} on {} finished in {}ms",
        user.user_id,
        response.database_used,
        t0.elapsed().as_millis()
    );

    Ok(Json(response))
}

/// Column overview of the whole target database
#[utoipa::path(
    post,
    path = "/api/analyze-schema",
    request_body = AnalyzeSchemaRequest,
    responses(
        (status = 200, description = "Columns grouped by table", body = SchemaOverview),
        (status = 400, description = "Target unreachable"),
    ),
    security(("bearer_auth" = [])),
    tag = "Analysis"
)]
pub async fn analyze_schema(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    body: Option<Json<AnalyzeSchemaRequest>>,
) -> ApiResult<Json<SchemaOverview>> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    req.validate()?;

    tracing::debug!("Schema overview requested by user {}", user.user_id);
    let overview = state.analysis_service.analyze_schema(user.user_id, req).await?;
    Ok(Json(overview))
}
