//! Review handlers; reviews are listed and created under their Place

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
    Path(place_id): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let storage = state.storage.as_ref();
    fetch(storage, EntityKind::Place, &place_id).await?;

    let reviews = storage
        .all(Some(EntityKind::Review))
        .await?
        .into_values()
        .filter(|e| matches!(e, Entity::Review(review) if review.place_id == place_id));
    render(reviews)
}

pub async fn create(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let storage = state.storage.as_ref();
    fetch(storage, EntityKind::Place, &place_id).await?;

    let payload = parse_body(&body)?;
    let user_id = required_str(&payload, "user_id")?;
    fetch(storage, EntityKind::User, user_id).await?;

    create_from(
        storage,
        EntityKind::Review,
        &payload,
        &[("place_id", place_id.as_str()), ("user_id", user_id)],
    )
    .await
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    super::show(state.storage.as_ref(), EntityKind::Review, &id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    super::update(state.storage.as_ref(), EntityKind::Review, &id, &body).await
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    super::destroy(state.storage.as_ref(), EntityKind::Review, &id).await
}
