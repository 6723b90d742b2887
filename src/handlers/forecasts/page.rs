use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;

use crate::pagination::{PageCursor, PageRequest};
use crate::pipeline::RequestContext;
use crate::server::AppState;

use super::NEXT_PAGE_PATH;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstPageQuery {
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextPageQuery {
    pub page_size: Option<i64>,
    /// 1-based page number; takes precedence over the token's offset
    pub page_offset: Option<i64>,
    pub token: Option<String>,
}

/// GET /api/forecasts/page?pageSize=N - first page
pub async fn first(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<FirstPageQuery>,
) -> Response {
    let request = PageRequest {
        page_size: query.page_size,
        cursor: PageCursor::Initial,
    };
    read(state, ctx, request).await
}

/// GET /api/forecasts/page/next?token=T&pageOffset=K&pageSize=N - continuation
pub async fn next(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<NextPageQuery>,
) -> Response {
    let request = PageRequest {
        page_size: query.page_size,
        cursor: PageCursor::Next {
            token: query.token,
            page_offset: query.page_offset,
        },
    };
    read(state, ctx, request).await
}

async fn read(state: AppState, ctx: RequestContext, request: PageRequest) -> Response {
    let store = state.store.clone();
    state
        .pipeline
        .read_page(&ctx, "forecasts", NEXT_PAGE_PATH, &request, || async move {
            Ok(store.all().await)
        })
        .await
}
