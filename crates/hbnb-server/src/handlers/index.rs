//! Service status and object counts

use crate::error::ApiResult;
use crate::AppState;
use axum::{extract::State, Json};
use hbnb_core::EntityKind;
use serde_json::{json, Map, Value};

pub async fn status() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// Number of stored objects per collection
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let mut counts = Map::new();
    for kind in EntityKind::ALL {
        let count = state.storage.count(Some(kind)).await?;
        counts.insert(kind.collection().to_string(), Value::from(count));
    }
    Ok(Json(Value::Object(counts)))
}
