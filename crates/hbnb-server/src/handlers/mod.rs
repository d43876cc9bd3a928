//! HTTP handlers
//!
//! One module per resource. The helpers here carry the steps every resource
//! shares: parse the body, look up by id, persist, render.

pub mod amenities;
pub mod cities;
pub mod index;
pub mod place_amenities;
pub mod places;
pub mod reviews;
pub mod states;
pub mod users;

#[cfg(test)]
mod tests;

use crate::error::{ApiError, ApiResult};
use crate::services::seal_password;
use axum::{http::StatusCode, response::IntoResponse, Json};
use hbnb_core::{Entity, EntityKind, Storage};
use serde_json::{json, Map, Value};
use tracing::info;

/// Unknown route
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

/// The request body as a JSON object
pub(crate) fn parse_body(body: &[u8]) -> ApiResult<Map<String, Value>> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ApiError::not_a_json()),
    }
}

/// A required string field, checked before the entity is built
pub(crate) fn required_str<'a>(
    payload: &'a Map<String, Value>,
    field: &'static str,
) -> ApiResult<&'a str> {
    match payload.get(field) {
        None => Err(ApiError::missing(field)),
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(ApiError::BadRequest(format!("Invalid {}", field))),
    }
}

pub(crate) async fn fetch(storage: &dyn Storage, kind: EntityKind, id: &str) -> ApiResult<Entity> {
    storage.get(kind, id).await?.ok_or(ApiError::NotFound)
}

pub(crate) fn render(
    entities: impl IntoIterator<Item = Entity>,
) -> ApiResult<Json<Vec<Value>>> {
    let rendered = entities
        .into_iter()
        .map(|e| e.to_json())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rendered))
}

pub(crate) async fn list_kind(storage: &dyn Storage, kind: EntityKind) -> ApiResult<Json<Vec<Value>>> {
    render(storage.all(Some(kind)).await?.into_values())
}

pub(crate) async fn show(storage: &dyn Storage, kind: EntityKind, id: &str) -> ApiResult<Json<Value>> {
    Ok(Json(fetch(storage, kind, id).await?.to_json()?))
}

pub(crate) async fn destroy(
    storage: &dyn Storage,
    kind: EntityKind,
    id: &str,
) -> ApiResult<Json<Value>> {
    let entity = fetch(storage, kind, id).await?;
    storage.delete(Some(&entity)).await?;
    storage.save().await?;
    info!("Deleted {}", entity.key());
    Ok(Json(json!({})))
}

/// Register and persist a freshly built entity
pub(crate) async fn insert(
    storage: &dyn Storage,
    entity: Entity,
) -> ApiResult<(StatusCode, Json<Value>)> {
    storage.new(entity.clone()).await?;
    storage.save().await?;
    info!("Created {}", entity.key());
    Ok((StatusCode::CREATED, Json(entity.to_json()?)))
}

/// Build a new entity from a client payload and persist it
pub(crate) async fn create_from(
    storage: &dyn Storage,
    kind: EntityKind,
    payload: &Map<String, Value>,
    links: &[(&str, &str)],
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut entity = Entity::create(kind, payload, links)?;
    seal_password(&mut entity, payload)?;
    insert(storage, entity).await
}

/// Apply an update body to a stored entity and persist it
pub(crate) async fn update(
    storage: &dyn Storage,
    kind: EntityKind,
    id: &str,
    body: &[u8],
) -> ApiResult<Json<Value>> {
    let mut entity = fetch(storage, kind, id).await?;
    let payload = parse_body(body)?;
    entity.apply_update(&payload)?;
    seal_password(&mut entity, &payload)?;

    storage.new(entity.clone()).await?;
    storage.save().await?;
    Ok(Json(entity.to_json()?))
}
