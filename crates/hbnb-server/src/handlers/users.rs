//! User handlers
//!
//! `password` is hashed before it is stored and never rendered.

use super::{create_from, destroy as destroy_one, list_kind, parse_body, show as show_one};
use crate::error::ApiResult;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::EntityKind;
use serde_json::Value;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    list_kind(state.storage.as_ref(), EntityKind::User).await
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    show_one(state.storage.as_ref(), EntityKind::User, &id).await
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    destroy_one(state.storage.as_ref(), EntityKind::User, &id).await
}

pub async fn create(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let payload = parse_body(&body)?;
    create_from(state.storage.as_ref(), EntityKind::User, &payload, &[]).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    super::update(state.storage.as_ref(), EntityKind::User, &id, &body).await
}
