use axum::{
    extract::State,
    response::{Json, Response},
};

use crate::pipeline::{OperationResult, RequestContext, ValidateFn};
use crate::server::AppState;
use crate::services::{Forecast, ForecastInput};

/// GET /api/forecasts - every forecast, in order
pub async fn get(State(state): State<AppState>, ctx: RequestContext) -> Response {
    let store = state.store.clone();
    state
        .pipeline
        .read(&ctx, "forecasts", || async move {
            Ok(OperationResult::Sequence(store.all().await))
        })
        .await
}

/// POST /api/forecasts - create a forecast
pub async fn post(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<ForecastInput>,
) -> Response {
    let store = state.store.clone();
    let validate: ValidateFn<Forecast> = Box::new(Forecast::validate);

    state
        .pipeline
        .create(
            &ctx,
            || async move { Ok(OperationResult::Scalar(store.insert(input).await)) },
            Some(validate),
        )
        .await
}
