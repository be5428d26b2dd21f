use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State as AxumState},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;

use super::{error::AppError, state::State};
use crate::domain::QuoteInput;
use crate::util::version::version_label;

pub async fn quote_handler(
    AxumState(state): AxumState<Arc<State>>,
    payload: Result<Json<QuoteInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = payload?;
    let outcome = state.quotes.quote(input).await?;
    Ok((StatusCode::OK, Json(outcome)))
}

pub async fn clear_cache_handler(AxumState(state): AxumState<Arc<State>>) -> impl IntoResponse {
    let entries = state.quotes.clear_cache();
    (
        StatusCode::OK,
        Json(json!({ "cleared": true, "entries": entries })),
    )
}

pub async fn tracking_handler(
    AxumState(state): AxumState<Arc<State>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    info!(%code, "tracking lookup");
    let tracking = state.quotes.gateway().track(code.trim()).await?;
    Ok((StatusCode::OK, Json(tracking)))
}

pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": version_label() })),
    )
}
