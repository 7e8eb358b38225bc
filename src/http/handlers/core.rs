use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::http::error::AppError;
use crate::http::types::AppState;

async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let tables: i64 = state
        .with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |r| r.get(0),
            )?)
        })
        .await?;

    Ok(Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "database": {
            "path": state.config.db_path.to_string_lossy(),
            "tables": tables,
        },
    })))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}
