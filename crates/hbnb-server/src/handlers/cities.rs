//! City handlers; cities are listed and created under their State

use super::{create_from, fetch, parse_body, render};
use crate::error::ApiResult;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::{Entity, EntityKind};
use serde_json::Value;

/// Cities of one state
pub async fn list(
    State(state): State<AppState>,
    Path(state_id): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let storage = state.storage.as_ref();
    fetch(storage, EntityKind::State, &state_id).await?;

    let cities = storage
        .all(Some(EntityKind::City))
        .await?
        .into_values()
        .filter(|e| matches!(e, Entity::City(city) if city.state_id == state_id));
    render(cities)
}

pub async fn create(
    State(state): State<AppState>,
    Path(state_id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let storage = state.storage.as_ref();
    fetch(storage, EntityKind::State, &state_id).await?;

    let payload = parse_body(&body)?;
    create_from(
        storage,
        EntityKind::City,
        &payload,
        &[("state_id", state_id.as_str())],
    )
    .await
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    super::show(state.storage.as_ref(), EntityKind::City, &id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    super::update(state.storage.as_ref(), EntityKind::City, &id, &body).await
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    super::destroy(state.storage.as_ref(), EntityKind::City, &id).await
}
