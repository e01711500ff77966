use dashmap::DashMap;
use mysql_async::prelude::Queryable;
use mysql_async::{Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use crate::models::TargetConnection;
use crate::services::mysql_client::{MySQLClient, TargetError};

const DEFAULT_MAX_POOLS: usize = 32;
const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(600);

struct CachedPool {
    pool: Pool,
    last_used: Instant,
}

/// Caches one `mysql_async` pool per target connection identity.
///
/// Pools unused for `idle_ttl` are dropped whenever a new one is added, and
/// the least recently used pools go once the cache holds `max_pools`.
pub struct MySQLPoolManager {
    pools: DashMap<String, CachedPool>,
    connect_timeout: Duration,
    max_pools: usize,
    idle_ttl: Duration,
}

impl MySQLPoolManager {
    pub fn new(connect_timeout: Duration) -> Self {
        Self::with_limits(connect_timeout, DEFAULT_MAX_POOLS, DEFAULT_IDLE_TTL)
    }

    pub fn with_limits(connect_timeout: Duration, max_pools: usize, idle_ttl: Duration) -> Self {
        Self { pools: DashMap::new(), connect_timeout, max_pools: max_pools.max(1), idle_ttl }
    }

    /// `user@host:port/db#<password hash>`: a changed password gets a new pool
    fn pool_key(conn: &TargetConnection) -> String {
        let mut h = DefaultHasher::new();
        conn.password.hash(&mut h);
        format!("{}#{:x}", conn.display_name(), h.finish())
    }

    fn build_opts(conn: &TargetConnection) -> Opts {
        let constraints = PoolConstraints::new(0, 4).unwrap_or_default();
        let pool_opts = PoolOpts::default()
            .with_constraints(constraints)
            .with_inactive_connection_ttl(Duration::from_secs(300));

        OptsBuilder::default()
            .ip_or_hostname(conn.host.clone())
            .tcp_port(conn.port)
            .user(Some(conn.user.clone()))
            .pass(Some(conn.password.clone()))
            .db_name(Some(conn.database.clone()))
            .pool_opts(pool_opts)
            .into()
    }

    /// Get a verified pool for `conn`, creating it on first use
    pub async fn get_pool(&self, conn: &TargetConnection) -> Result<Pool, TargetError> {
        let key = Self::pool_key(conn);

        let cached = self.pools.get_mut(&key).map(|mut entry| {
            entry.last_used = Instant::now();
            entry.pool.clone()
        });
        if let Some(pool) = cached {
            if self.verify(&pool).await.is_ok() {
                tracing::debug!("Reusing pool for {}", conn.display_name());
                return Ok(pool);
            }
            self.evict(conn).await;
        }

        tracing::info!("Creating pool for {}", conn.display_name());
        let pool = Pool::new(Self::build_opts(conn));

        if let Err(e) = self.verify(&pool).await {
            tracing::warn!("Connection check failed for {}: {}", conn.display_name(), e);
            let _ = pool.disconnect().await;
            return Err(e);
        }

        self.prune(&key).await;

        // Another request may have raced us here; keep whichever landed first.
        let pool = self
            .pools
            .entry(key)
            .or_insert(CachedPool { pool, last_used: Instant::now() })
            .pool
            .clone();
        Ok(pool)
    }

    /// Make room for `incoming`: drop idle pools, then the least recently used
    async fn prune(&self, incoming: &str) {
        let now = Instant::now();
        let mut stale: Vec<String> = self
            .pools
            .iter()
            .filter(|e| now.duration_since(e.last_used) >= self.idle_ttl)
            .map(|e| e.key().clone())
            .collect();

        let live = self.pools.len().saturating_sub(stale.len());
        if live >= self.max_pools {
            let mut by_age: Vec<(String, Instant)> = self
                .pools
                .iter()
                .filter(|e| e.key() != incoming && !stale.contains(e.key()))
                .map(|e| (e.key().clone(), e.last_used))
                .collect();
            by_age.sort_by_key(|(_, used)| *used);
            stale.extend(by_age.into_iter().take(live + 1 - self.max_pools).map(|(k, _)| k));
        }

        for key in stale {
            if let Some((_, entry)) = self.pools.remove(&key) {
                tracing::info!("Dropping cached pool {}", key.split('#').next().unwrap_or_default());
                let _ = entry.pool.disconnect().await;
            }
        }
    }

    pub async fn get_client(&self, conn: &TargetConnection) -> Result<MySQLClient, TargetError> {
        let pool = self.get_pool(conn).await?;
        Ok(MySQLClient::from_pool(pool, conn.database.clone()))
    }

    /// One round-trip within the connect timeout
    async fn verify(&self, pool: &Pool) -> Result<(), TargetError> {
        let check = async {
            let mut c = pool.get_conn().await?;
            c.query_drop("SELECT 1").await
        };

        match tokio::time::timeout(self.connect_timeout, check).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TargetError::Connection(e.to_string())),
            Err(_) => Err(TargetError::Connection(format!(
                "connection timed out after {}s",
                self.connect_timeout.as_secs()
            ))),
        }
    }

    /// Drop the cached pool for `conn`, if any
    pub async fn evict(&self, conn: &TargetConnection) {
        if let Some((_, entry)) = self.pools.remove(&Self::pool_key(conn)) {
            tracing::info!("Evicting pool for {}", conn.display_name());
            let _ = entry.pool.disconnect().await;
        }
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(password: &str) -> TargetConnection {
        TargetConnection {
            host: "127.0.0.1".into(),
            port: 1,
            user: "reader".into(),
            password: password.into(),
            database: "testdb".into(),
            use_ssh: false,
            ssh_config: None,
        }
    }

    #[test]
    fn test_pool_key_tracks_password_without_exposing_it() {
        let a = MySQLPoolManager::pool_key(&conn("first"));
        let b = MySQLPoolManager::pool_key(&conn("second"));
        assert_ne!(a, b);
        assert!(a.starts_with("reader@127.0.0.1:1/testdb#"));
        assert!(!a.contains("first"));
    }

    #[tokio::test]
    async fn test_unreachable_target_is_not_cached() {
        let manager = MySQLPoolManager::new(Duration::from_secs(2));
        let result = manager.get_pool(&conn("pw")).await;
        assert!(matches!(result, Err(TargetError::Connection(_))));
        assert_eq!(manager.pool_count(), 0);
    }

    /// Cache a pool without connecting; `Pool::new` is lazy
    fn cache(manager: &MySQLPoolManager, db: &str) -> String {
        let mut c = conn("pw");
        c.database = db.into();
        let key = MySQLPoolManager::pool_key(&c);
        let pool = Pool::new(MySQLPoolManager::build_opts(&c));
        manager.pools.insert(key.clone(), CachedPool { pool, last_used: Instant::now() });
        key
    }

    #[tokio::test]
    async fn test_prune_drops_least_recently_used_at_capacity() {
        let manager = MySQLPoolManager::with_limits(Duration::from_secs(1), 2, Duration::from_secs(3600));
        let oldest = cache(&manager, "a");
        tokio::time::sleep(Duration::from_millis(5)).await;
        let newer = cache(&manager, "b");

        manager.prune("incoming").await;

        assert_eq!(manager.pool_count(), 1);
        assert!(!manager.pools.contains_key(&oldest));
        assert!(manager.pools.contains_key(&newer));
    }

    #[tokio::test]
    async fn test_prune_drops_idle_pools() {
        let manager = MySQLPoolManager::with_limits(Duration::from_secs(1), 8, Duration::ZERO);
        cache(&manager, "a");
        cache(&manager, "b");

        manager.prune("incoming").await;
        assert_eq!(manager.pool_count(), 0);
    }

    #[tokio::test]
    async fn test_prune_keeps_pools_under_limits() {
        let manager = MySQLPoolManager::with_limits(Duration::from_secs(1), 8, Duration::from_secs(3600));
        cache(&manager, "a");
        cache(&manager, "b");

        manager.prune("incoming").await;
        assert_eq!(manager.pool_count(), 2);
    }
}
