use sqlx::SqlitePool;

use crate::models::{
    CreateVaultItemRequest, TargetConnection, VaultItem, VaultItemDetail, VaultItemSummary,
};
use crate::utils::{ApiError, ApiResult, VaultCipher};

/// Per-user encrypted connection profiles
pub struct VaultService {
    pool: SqlitePool,
    cipher: VaultCipher,
}

impl VaultService {
    pub fn new(pool: SqlitePool, cipher: VaultCipher) -> Self {
        Self { pool, cipher }
    }

    pub async fn create_item(&self, user_id: i64, req: CreateVaultItemRequest) -> ApiResult<VaultItemDetail> {
        let sealed = self.cipher.encrypt_json(&req.config)?;

        let result = sqlx::query(
            "INSERT INTO vault_items (user_id, connection_name, host, port, database_name, encrypted_config) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(req.connection_name.trim())
        .bind(&req.config.host)
        .bind(req.config.port as i64)
        .bind(&req.config.database)
        .bind(&sealed)
        .execute(&self.pool)
        .await?;

        let item_id = result.last_insert_rowid();
        tracing::info!("Vault item {} created for user {}", item_id, user_id);

        self.get_item(user_id, item_id).await
    }

    pub async fn list_items(&self, user_id: i64) -> ApiResult<Vec<VaultItemSummary>> {
        let items: Vec<VaultItem> =
            sqlx::query_as("SELECT * FROM vault_items WHERE user_id = ? ORDER BY created_at DESC, id DESC")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(items.into_iter().map(Into::into).collect())
    }

    pub async fn get_item(&self, user_id: i64, item_id: i64) -> ApiResult<VaultItemDetail> {
        let item = self.fetch_item(user_id, item_id).await?;
        let config: TargetConnection = self.cipher.decrypt_json(&item.encrypted_config)?;

        Ok(VaultItemDetail {
            id: item.id,
            connection_name: item.connection_name,
            config,
            created_at: item.created_at,
            updated_at: item.updated_at,
        })
    }

    /// Decrypted connection of a profile, for analysis
    pub async fn get_connection(&self, user_id: i64, item_id: i64) -> ApiResult<TargetConnection> {
        Ok(self.get_item(user_id, item_id).await?.config)
    }

    pub async fn delete_item(&self, user_id: i64, item_id: i64) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM vault_items WHERE id = ? AND user_id = ?")
            .bind(item_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::profile_not_found(item_id));
        }

        tracing::info!("Vault item {} deleted for user {}", item_id, user_id);
        Ok(())
    }

    /// Another user's item is reported as missing
    async fn fetch_item(&self, user_id: i64, item_id: i64) -> ApiResult<VaultItem> {
        let item: Option<VaultItem> =
            sqlx::query_as("SELECT * FROM vault_items WHERE id = ? AND user_id = ?")
                .bind(item_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        item.ok_or_else(|| ApiError::profile_not_found(item_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::{create_test_db, create_user};

    fn request(name: &str) -> CreateVaultItemRequest {
        CreateVaultItemRequest {
            connection_name: name.to_string(),
            config: TargetConnection {
                host: "db.internal".into(),
                port: 3307,
                user: "reader".into(),
                password: "s3cret-pw".into(),
                database: "shop".into(),
                use_ssh: false,
                ssh_config: None,
            },
        }
    }

    #[tokio::test]
    async fn test_create_get_list_delete() {
        let pool = create_test_db().await;
        let user_id = create_user(&pool, "owner@example.com").await;
        let svc = VaultService::new(pool, VaultCipher::new("test-secret"));

        let created = svc.create_item(user_id, request("prod replica")).await.unwrap();
        assert_eq!(created.connection_name, "prod replica");
        assert_eq!(created.config.password, "s3cret-pw");

        let listed = svc.list_items(user_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].host, "db.internal");
        assert_eq!(listed[0].port, 3307);
        assert_eq!(listed[0].database, "shop");

        let conn = svc.get_connection(user_id, created.id).await.unwrap();
        assert_eq!(conn, request("x").config);

        svc.delete_item(user_id, created.id).await.unwrap();
        assert!(svc.list_items(user_id).await.unwrap().is_empty());
        assert!(matches!(
            svc.delete_item(user_id, created.id).await,
            Err(ApiError::ProfileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_secrets_are_not_stored_in_clear() {
        let pool = create_test_db().await;
        let user_id = create_user(&pool, "owner@example.com").await;
        let svc = VaultService::new(pool.clone(), VaultCipher::new("test-secret"));
        svc.create_item(user_id, request("prod")).await.unwrap();

        let (sealed,): (String,) = sqlx::query_as("SELECT encrypted_config FROM vault_items")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(!sealed.contains("s3cret-pw"));

        let summary = serde_json::to_string(&svc.list_items(user_id).await.unwrap()).unwrap();
        assert!(!summary.contains("s3cret-pw"));
    }

    #[tokio::test]
    async fn test_other_users_items_are_invisible() {
        let pool = create_test_db().await;
        let owner = create_user(&pool, "owner@example.com").await;
        let other = create_user(&pool, "other@example.com").await;
        let svc = VaultService::new(pool, VaultCipher::new("test-secret"));

        let item = svc.create_item(owner, request("prod")).await.unwrap();

        assert!(svc.list_items(other).await.unwrap().is_empty());
        assert!(matches!(svc.get_item(other, item.id).await, Err(ApiError::ProfileNotFound { .. })));
        assert!(svc.delete_item(other, item.id).await.is_err());
        assert!(svc.get_item(owner, item.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_vault_secret_cannot_decrypt() {
        let pool = create_test_db().await;
        let user_id = create_user(&pool, "owner@example.com").await;
        let item = VaultService::new(pool.clone(), VaultCipher::new("old-secret"))
            .create_item(user_id, request("prod"))
            .await
            .unwrap();

        let rotated = VaultService::new(pool, VaultCipher::new("new-secret"));
        assert!(matches!(rotated.get_item(user_id, item.id).await, Err(ApiError::VaultCrypto(_))));
    }
}
