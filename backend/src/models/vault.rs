use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::TargetConnection;

/// Stored row. `encrypted_config` holds the sealed `TargetConnection`;
/// host, port and database are kept in clear for listing.
#[derive(Debug, Clone, FromRow)]
pub struct VaultItem {
    pub id: i64,
    pub user_id: i64,
    pub connection_name: String,
    pub host: String,
    pub port: i64,
    pub database_name: String,
    pub encrypted_config: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVaultItemRequest {
    #[validate(length(min = 1, max = 100, message = "connection_name must be 1-100 characters"))]
    pub connection_name: String,
    #[validate(nested)]
    pub config: TargetConnection,
}

/// Listing entry, carries no secrets
#[derive(Debug, Serialize, ToSchema)]
pub struct VaultItemSummary {
    pub id: i64,
    pub connection_name: String,
    pub host: String,
    pub port: i64,
    pub database: String,
    pub created_at: DateTime<Utc>,
}

impl From<VaultItem> for VaultItemSummary {
    fn from(item: VaultItem) -> Self {
        Self {
            id: item.id,
            connection_name: item.connection_name,
            host: item.host,
            port: item.port,
            database: item.database_name,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VaultItemDetail {
    pub id: i64,
    pub connection_name: String,
    pub config: TargetConnection,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
