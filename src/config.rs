use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub db_path: PathBuf,
    pub pool_size: u32,
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let jwt_secret = match var("NOTEFINDER_JWT_SECRET") {
            Some(secret) if !secret.trim().is_empty() => secret,
            _ => {
                warn!("NOTEFINDER_JWT_SECRET not set, tokens will not survive a restart");
                format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
            }
        };

        Ok(Self {
            bind: try_load("NOTEFINDER_BIND", "127.0.0.1:5000")?,
            db_path: try_load("NOTEFINDER_DB_PATH", "notefinder.sqlite3")?,
            pool_size: try_load("NOTEFINDER_POOL_SIZE", "8")?,
            jwt_secret,
            token_ttl: Duration::from_secs(try_load("NOTEFINDER_TOKEN_TTL_SECS", "86400")?),
        })
    }

    /// Configuration for a throwaway database, used by tests and local tooling.
    pub fn for_database(db_path: impl Into<PathBuf>) -> Self {
        Self {
            bind: "127.0.0.1:0".to_string(),
            db_path: db_path.into(),
            pool_size: 4,
            jwt_secret: "notefinder-test-secret".to_string(),
            token_ttl: Duration::from_secs(3600),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value: {raw}"))
}
