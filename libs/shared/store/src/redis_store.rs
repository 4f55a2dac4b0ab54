use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;
use tracing::info;

use crate::{SecurityStore, StoreError};

/// Shared-cache backend so that rate limits, sessions and velocity state are
/// consistent across API instances.
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let cfg = Config::from_url(url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Backend(format!("failed to create redis pool: {}", e)))?;

        // Probe the connection up front so a bad URL fails at startup, not on
        // the first request.
        let mut conn = pool
            .get()
            .await
            .map_err(|e| StoreError::Backend(format!("failed to connect to redis: {}", e)))?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        info!("redis security store initialized");
        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<Connection, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Backend(format!("redis pool exhausted: {}", e)))
    }
}

#[async_trait]
impl SecurityStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        match ttl {
            Some(d) => {
                let _: () = conn
                    .set_ex(key, value, d.as_secs().max(1) as u64)
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
            }
            None => {
                let _: () = conn
                    .set(key, value)
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let _: () = conn
            .del(key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn push(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let _: () = conn
            .rpush(key, value)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        if let Some(d) = ttl {
            let _: () = conn
                .expire(key, d.as_secs().max(1) as i64)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        Ok(())
    }

    async fn list(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn().await?;
        let values: Vec<String> = conn
            .lrange(key, 0, -1)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(values)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn().await?;
        let pattern = format!("{}*", prefix);
        let mut keys = Vec::new();
        let mut iter = conn
            .scan_match::<_, String>(pattern)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }

    async fn sweep_expired(&self) -> Result<u64, StoreError> {
        // Redis evicts expired keys natively.
        Ok(0)
    }
}
