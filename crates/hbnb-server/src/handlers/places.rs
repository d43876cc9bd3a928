//! Place handlers; places are listed and created under their City

use super::{create_from, fetch, parse_body, render, required_str};
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

pub async fn list(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let storage = state.storage.as_ref();
    fetch(storage, EntityKind::City, &city_id).await?;

    let places = storage
        .all(Some(EntityKind::Place))
        .await?
        .into_values()
        .filter(|e| matches!(e, Entity::Place(place) if place.city_id == city_id));
    render(places)
}

/// The owner named by `user_id` must exist; it is checked before `name`
pub async fn create(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let storage = state.storage.as_ref();
    fetch(storage, EntityKind::City, &city_id).await?;

    let payload = parse_body(&body)?;
    let user_id = required_str(&payload, "user_id")?;
    fetch(storage, EntityKind::User, user_id).await?;

    create_from(
        storage,
        EntityKind::Place,
        &payload,
        &[("city_id", city_id.as_str()), ("user_id", user_id)],
    )
    .await
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    super::show(state.storage.as_ref(), EntityKind::Place, &id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    super::update(state.storage.as_ref(), EntityKind::Place, &id, &body).await
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    super::destroy(state.storage.as_ref(), EntityKind::Place, &id).await
}
