use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::pipeline::{OperationResult, RequestContext, ValidateFn};
use crate::server::AppState;
use crate::services::{Forecast, ForecastInput};

/// GET /api/forecasts/:id - one forecast, 204 when unknown
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>, ctx: RequestContext) -> Response {
    let store = state.store.clone();
    state
        .pipeline
        .read(&ctx, "forecast", || async move { Ok(OperationResult::from(store.get(id).await)) })
        .await
}

/// PUT /api/forecasts/:id - replace a forecast
pub async fn put(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(input): Json<ForecastInput>,
) -> Response {
    let store = state.store.clone();
    let validate: ValidateFn<Forecast> = Box::new(Forecast::validate);

    state
        .pipeline
        .update(
            &ctx,
            "forecast",
            || async move { Ok(OperationResult::from(store.update(id, input).await)) },
            Some(validate),
        )
        .await
}

/// DELETE /api/forecasts/:id - 404 for unknown ids, otherwise 202
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>, ctx: RequestContext) -> Response {
    // Existence is checked ahead of the auth gate: unknown ids are 404 for every caller.
    if !state.store.contains(id).await {
        return ApiError::not_found(format!("forecast {} not found", id)).into_response();
    }

    let store = state.store.clone();
    state
        .pipeline
        .delete(&ctx, || async move { Ok(store.remove(id).await) })
        .await
}
