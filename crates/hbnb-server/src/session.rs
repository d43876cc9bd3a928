//! Request-scoped storage session
//!
//! Every API request holds the session gate for its whole lifetime and
//! closes the storage session when it finishes, so two requests never share
//! a database transaction or interleave writes to the file store.

use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

pub async fn request_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let _gate = state.session_gate.lock().await;

    let response = next.run(request).await;

    if let Err(e) = state.storage.close().await {
        warn!("Failed to close storage session: {}", e);
    }
    response
}
