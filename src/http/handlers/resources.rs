use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::http::error::{AppError, Reply};
use crate::http::resource::Resource;
use crate::http::types::{parse_body, AppState};

async fn list(state: AppState, resource: &'static Resource) -> Result<Json<Vec<Value>>, AppError> {
    let rows = state.with_conn(move |conn| resource.list(conn)).await?;
    Ok(Json(rows))
}

async fn get_one(
    state: AppState,
    resource: &'static Resource,
    raw_key: String,
) -> Result<Json<Value>, AppError> {
    let key = resource.parse_key(&raw_key)?;
    let row = state.with_conn(move |conn| resource.get(conn, &key)).await?;
    Ok(Json(row))
}

async fn create(
    state: AppState,
    resource: &'static Resource,
    raw: Bytes,
) -> Result<Reply, AppError> {
    let body = parse_body(&raw);
    state
        .with_conn(move |conn| resource.create(conn, &body))
        .await
}

async fn update(
    state: AppState,
    resource: &'static Resource,
    raw_key: String,
    raw: Bytes,
) -> Result<Reply, AppError> {
    let key = resource.parse_key(&raw_key)?;
    let body = parse_body(&raw);
    state
        .with_conn(move |conn| resource.update(conn, &key, &body))
        .await
}

async fn delete(
    state: AppState,
    resource: &'static Resource,
    raw_key: String,
) -> Result<Reply, AppError> {
    let key = resource.parse_key(&raw_key)?;
    state
        .with_conn(move |conn| resource.delete(conn, &key))
        .await
}

/// `GET|POST /api/<path>` and `GET|PUT|DELETE /api/<path>/:key`.
pub fn routes(resource: &'static Resource) -> Router<AppState> {
    let collection = format!("/api/{}", resource.path);
    let item = format!("{collection}/:key");

    Router::new()
        .route(
            &collection,
            get(move |State(state): State<AppState>| list(state, resource)).post(
                move |State(state): State<AppState>, raw: Bytes| create(state, resource, raw),
            ),
        )
        .route(
            &item,
            get(
                move |State(state): State<AppState>, Path(key): Path<String>| {
                    get_one(state, resource, key)
                },
            )
            .put(
                move |State(state): State<AppState>, Path(key): Path<String>, raw: Bytes| {
                    update(state, resource, key, raw)
                },
            )
            .delete(
                move |State(state): State<AppState>, Path(key): Path<String>| {
                    delete(state, resource, key)
                },
            ),
        )
}
