use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::AppState;
use crate::middleware::CurrentUser;
use crate::models::{CreateVaultItemRequest, VaultItemDetail, VaultItemSummary};
use crate::utils::ApiResult;

/// List the caller's connection profiles (no secrets)
#[utoipa::path(
    get,
    path = "/api/vault",
    responses(
        (status = 200, description = "Connection profiles", body = Vec<VaultItemSummary>)
    ),
    security(("bearer_auth" = [])),
    tag = "Vault"
)]
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<VaultItemSummary>>> {
    let items = state.vault_service.list_items(user.user_id).await?;
    tracing::debug!("Retrieved {} vault items for user {}", items.len(), user.user_id);
    Ok(Json(items))
}

/// Store an encrypted connection profile
#[utoipa::path(
    post,
    path = "/api/vault",
    request_body = CreateVaultItemRequest,
    responses(
        (status = 201, description = "Profile stored", body = VaultItemDetail),
        (status = 400, description = "Validation error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vault"
)]
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateVaultItemRequest>,
) -> ApiResult<(StatusCode, Json<VaultItemDetail>)> {
    req.validate()?;
    tracing::info!("Storing vault item '{}' for user {}", req.connection_name, user.user_id);
    let item = state.vault_service.create_item(user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Decrypted connection profile
#[utoipa::path(
    get,
    path = "/api/vault/{id}",
    params(("id" = i64, Path, description = "Vault item ID")),
    responses(
        (status = 200, description = "Profile detail", body = VaultItemDetail),
        (status = 404, description = "Profile not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vault"
)]
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(item_id): Path<i64>,
) -> ApiResult<Json<VaultItemDetail>> {
    let item = state.vault_service.get_item(user.user_id, item_id).await?;
    Ok(Json(item))
}

/// Delete a connection profile
#[utoipa::path(
    delete,
    path = "/api/vault/{id}",
    params(("id" = i64, Path, description = "Vault item ID")),
    responses(
        (status = 204, description = "Profile deleted"),
        (status = 404, description = "Profile not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vault"
)]
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(item_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.vault_service.delete_item(user.user_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
