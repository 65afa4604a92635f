//! Redis service for per-session visit counters

use redis::{AsyncCommands, Client};

use crate::error::{AppError, AppResult};

/// Sessions expire after two weeks without a visit
const SESSION_TTL_SECONDS: i64 = 14 * 24 * 3600;

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    /// Create a new Redis service. No connection is made until first use.
    pub fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;
        Ok(Self { client })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }

    /// Test the connection
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;
        Ok(())
    }

    /// Record a visit for a session and return how many visits preceded it
    pub async fn record_visit(&self, session_id: &str) -> AppResult<i64> {
        let mut conn = self.connection().await?;

        let key = format!("visits:{}", session_id);
        let count: i64 = conn
            .incr(&key, 1)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to count visit in Redis: {}", e)))?;
        conn.expire::<_, ()>(&key, SESSION_TTL_SECONDS)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to refresh session in Redis: {}", e)))?;

        Ok(count - 1)
    }
}
