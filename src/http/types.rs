use std::sync::Arc;

use rusqlite::Connection;
use serde_json::{Map, Value};

use super::auth::TokenService;
use super::error::AppError;
use crate::config::Config;
use crate::db::DbPool;

pub type Body = Map<String, Value>;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);
        Self {
            pool,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        }
    }

    /// Runs `f` on a pooled connection off the async runtime. The connection
    /// goes back to the pool when the closure returns, whatever the outcome.
    pub async fn with_conn<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Connection) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await
        .map_err(|e| AppError::Internal(format!("database task failed: {e}")))?
    }
}

/// Request bodies that are not JSON objects read as empty.
pub fn parse_body(raw: &[u8]) -> Body {
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
