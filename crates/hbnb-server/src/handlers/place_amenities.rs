//! Links between a Place and its Amenities

use super::{fetch, render};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::{Entity, EntityKind, Place, Storage};
use serde_json::{json, Value};
use tracing::info;

async fn fetch_place(storage: &dyn Storage, id: &str) -> ApiResult<Place> {
    match fetch(storage, EntityKind::Place, id).await? {
        Entity::Place(place) => Ok(place),
        _ => Err(ApiError::NotFound),
    }
}

async fn store_place(storage: &dyn Storage, mut place: Place) -> ApiResult<()> {
    place.base.touch();
    storage.new(Entity::Place(place)).await?;
    storage.save().await?;
    Ok(())
}

/// Linked amenities in link order; links to deleted amenities are skipped
pub async fn list(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let storage = state.storage.as_ref();
    let place = fetch_place(storage, &place_id).await?;

    let mut amenities = Vec::with_capacity(place.amenity_ids.len());
    for amenity_id in &place.amenity_ids {
        if let Some(amenity) = storage.get(EntityKind::Amenity, amenity_id).await? {
            amenities.push(amenity);
        }
    }
    render(amenities)
}

/// 201 when the link is new, 200 when it already existed
pub async fn link(
    State(state): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let storage = state.storage.as_ref();
    let mut place = fetch_place(storage, &place_id).await?;
    let amenity = fetch(storage, EntityKind::Amenity, &amenity_id).await?;

    if place.amenity_ids.contains(&amenity_id) {
        return Ok((StatusCode::OK, Json(amenity.to_json()?)));
    }

    place.amenity_ids.push(amenity_id);
    store_place(storage, place).await?;
    info!("Linked {} to Place.{}", amenity.key(), place_id);
    Ok((StatusCode::CREATED, Json(amenity.to_json()?)))
}

pub async fn unlink(
    State(state): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let storage = state.storage.as_ref();
    let mut place = fetch_place(storage, &place_id).await?;
    fetch(storage, EntityKind::Amenity, &amenity_id).await?;

    let position = place
        .amenity_ids
        .iter()
        .position(|id| *id == amenity_id)
        .ok_or(ApiError::NotFound)?;
    place.amenity_ids.remove(position);
    store_place(storage, place).await?;
    info!("Unlinked Amenity.{} from Place.{}", amenity_id, place_id);
    Ok(Json(json!({})))
}
