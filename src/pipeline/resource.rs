// Resource operation pipeline: the single funnel for read/create/update/delete.
//
// Every entry point runs the auth gate first, invokes the callback exactly once
// inside a catch-all boundary, and converts any failure into a response.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use futures::FutureExt;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::pagination::PageRequest;
use crate::pipeline::auth::{AuthGate, AuthOutcome};
use crate::pipeline::context::RequestContext;
use crate::pipeline::envelope::{self, apply_request_id, CommonHeaders};
use crate::pipeline::error::PipelineError;
use crate::pipeline::outcome::{OperationResult, ValidateFn};
use crate::pipeline::size_guard::SizeGuard;

/// Operation kinds, used for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    ReadPage,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::ReadPage => "read_page",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

#[derive(Clone)]
pub struct ResourcePipeline {
    auth: Arc<dyn AuthGate>,
    size_guard: SizeGuard,
    max_page_size: usize,
    headers: CommonHeaders,
}

impl ResourcePipeline {
    pub fn new(config: &AppConfig, auth: Arc<dyn AuthGate>) -> Result<Self, header::InvalidHeaderValue> {
        Ok(Self {
            auth,
            size_guard: SizeGuard::new(config.api.max_payload_bytes),
            max_page_size: config.api.max_page_size,
            headers: CommonHeaders::from_config(config)?,
        })
    }

    /// Read: 200 with an envelope, or 204 when the callback has nothing
    pub async fn read<T, F, Fut>(&self, ctx: &RequestContext, node_name: &str, produce: F) -> Response
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<OperationResult<T>>>,
    {
        let work = async {
            self.authorize(ctx).await?;
            let result = invoke(produce).await?;
            if result.is_empty() {
                return Ok(StatusCode::NO_CONTENT.into_response());
            }

            self.size_guard.check(&result)?;
            let envelope = envelope::build(node_name, &result)?;
            Ok::<_, PipelineError>(self.enveloped(StatusCode::OK, ctx, envelope))
        };

        self.run(Operation::Read, ctx, node_name, work).await
    }

    /// Paged read: validates paging input before the collection is produced,
    /// then slices it and links to the next page
    pub async fn read_page<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        node_name: &str,
        link_base: &str,
        request: &PageRequest,
        produce: F,
    ) -> Response
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Vec<T>>>,
    {
        let work = async {
            self.authorize(ctx).await?;
            let plan = request.plan(self.max_page_size)?;
            let collection = invoke(produce).await?;

            let page = plan.slice(collection, link_base);
            self.size_guard.check_value(&page.items)?;
            let envelope = envelope::build_page(node_name, &page)?;
            Ok::<_, PipelineError>(self.enveloped(StatusCode::OK, ctx, envelope))
        };

        self.run(Operation::ReadPage, ctx, node_name, work).await
    }

    /// Create: 201 with the raw result and a Location header
    pub async fn create<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        produce: F,
        validate: Option<ValidateFn<T>>,
    ) -> Response
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<OperationResult<T>>>,
    {
        let work = async {
            self.authorize(ctx).await?;
            let result = invoke(produce).await?;
            if result.is_empty() {
                return Err(PipelineError::BadRequest("failed to create".to_string()));
            }
            check_validation(&result, validate.as_ref())?;

            let location = format!("{}/{}", ctx.path.trim_end_matches('/'), Uuid::new_v4());
            let body = serde_json::to_value(&result)?;

            let mut response = (StatusCode::CREATED, Json(body)).into_response();
            if let Ok(value) = HeaderValue::from_str(&location) {
                response.headers_mut().insert(header::LOCATION, value);
            }
            apply_request_id(response.headers_mut(), &ctx.request_id);
            Ok::<_, PipelineError>(response)
        };

        self.run(Operation::Create, ctx, "", work).await
    }

    /// Update: 202 with an envelope; the pipeline makes no durability promise
    pub async fn update<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        node_name: &str,
        produce: F,
        validate: Option<ValidateFn<T>>,
    ) -> Response
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<OperationResult<T>>>,
    {
        let work = async {
            self.authorize(ctx).await?;
            let result = invoke(produce).await?;
            if result.is_empty() {
                return Err(PipelineError::BadRequest("failed to update".to_string()));
            }
            check_validation(&result, validate.as_ref())?;

            let envelope = envelope::build(node_name, &result)?;
            Ok::<_, PipelineError>(self.enveloped(StatusCode::ACCEPTED, ctx, envelope))
        };

        self.run(Operation::Update, ctx, node_name, work).await
    }

    /// Delete: 202 with the callback's completion indicator.
    ///
    /// Whether the target exists is the caller's concern and is checked
    /// before the pipeline is entered.
    pub async fn delete<F, Fut>(&self, ctx: &RequestContext, remove: F) -> Response
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<bool>>,
    {
        let work = async {
            self.authorize(ctx).await?;
            let done = invoke(remove).await?;

            let mut response = (StatusCode::ACCEPTED, Json(done)).into_response();
            apply_request_id(response.headers_mut(), &ctx.request_id);
            Ok::<_, PipelineError>(response)
        };

        self.run(Operation::Delete, ctx, "", work).await
    }

    async fn authorize(&self, ctx: &RequestContext) -> Result<(), PipelineError> {
        match self.auth.check(ctx).await {
            AuthOutcome::Allowed => Ok(()),
            AuthOutcome::Denied { challenge } => Err(PipelineError::AuthDenied {
                challenge: challenge.or_else(|| self.headers.challenge().to_str().ok().map(str::to_string)),
            }),
        }
    }

    fn enveloped(&self, status: StatusCode, ctx: &RequestContext, envelope: serde_json::Value) -> Response {
        let mut response = (status, Json(envelope)).into_response();
        self.headers.apply(response.headers_mut(), &ctx.request_id);
        response
    }

    /// The catch-all boundary: nothing below this point escapes as anything but a response
    async fn run<W>(&self, op: Operation, ctx: &RequestContext, node_name: &str, work: W) -> Response
    where
        W: Future<Output = Result<Response, PipelineError>>,
    {
        let span = tracing::info_span!(
            "pipeline",
            op = op.as_str(),
            node = node_name,
            path = %ctx.path,
            request_id = %ctx.request_id,
        );

        async move {
            match work.await {
                Ok(response) => {
                    tracing::info!(status = response.status().as_u16(), "operation completed");
                    response
                }
                Err(err) => self.reject(ctx, err),
            }
        }
        .instrument(span)
        .await
    }

    fn reject(&self, ctx: &RequestContext, err: PipelineError) -> Response {
        match &err {
            PipelineError::AuthDenied { .. } => tracing::warn!("request denied by auth gate"),
            PipelineError::CallbackFault(msg) => tracing::error!("callback failed: {}", msg),
            PipelineError::EncodingFailure(_) => {}
            other => tracing::info!(kind = other.kind(), "request rejected: {}", other),
        }

        let api_error = ApiError::from(err);
        tracing::debug!(
            code = api_error.error_code(),
            status = api_error.status_code().as_u16(),
            "error response"
        );
        let mut response = api_error.into_response();
        apply_request_id(response.headers_mut(), &ctx.request_id);
        response
    }
}

fn check_validation<T>(result: &OperationResult<T>, validate: Option<&ValidateFn<T>>) -> Result<(), PipelineError> {
    if let Some(validate) = validate {
        let outcome = result.validate_with(validate);
        if !outcome.pass {
            return Err(PipelineError::ValidationFailed(outcome.message));
        }
    }
    Ok(())
}

/// Run a business callback once, turning errors and panics into `CallbackFault`
async fn invoke<R, F, Fut>(callback: F) -> Result<R, PipelineError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<R>>,
{
    match AssertUnwindSafe(async move { callback().await }).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(PipelineError::callback_fault(err)),
        Err(panic) => Err(PipelineError::CallbackFault(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "callback panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{encode_cursor, PageCursor};
    use crate::pipeline::auth::{AllowAll, BearerPresence};
    use crate::pipeline::outcome::ValidationOutcome;
    use axum::body::to_bytes;
    use axum::http::HeaderMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pipeline(auth: Arc<dyn AuthGate>) -> ResourcePipeline {
        ResourcePipeline::new(&AppConfig::default(), auth).unwrap()
    }

    fn ctx() -> RequestContext {
        RequestContext::new("/api/forecasts", HeaderMap::new())
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn denied_request_never_runs_callback() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let p = pipeline(Arc::new(BearerPresence::new("Bearer realm=\"t\"")));

        let response = p
            .read(&ctx(), "forecast", move || async move {
                let calls = counter;
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(OperationResult::Scalar(1))
            })
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer realm=\"t\"");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn absent_create_result_skips_validation() {
        let validations = Arc::new(AtomicUsize::new(0));
        let counter = validations.clone();
        let validate: ValidateFn<i32> = Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            ValidationOutcome::pass()
        });

        let response = pipeline(Arc::new(AllowAll))
            .create(&ctx(), || async { Ok(OperationResult::<i32>::Empty) }, Some(validate))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validations.load(Ordering::SeqCst), 0);
        assert_eq!(body_text(response).await, "failed to create");
    }

    #[tokio::test]
    async fn failed_validation_sets_no_location() {
        let validate: ValidateFn<i32> = Box::new(|_| ValidationOutcome::fail("Temperature is too high."));
        let response = pipeline(Arc::new(AllowAll))
            .create(&ctx(), || async { Ok(OperationResult::Scalar(99)) }, Some(validate))
            .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.headers().get(header::LOCATION).is_none());
        assert_eq!(body_text(response).await, "Temperature is too high.");
    }

    #[tokio::test]
    async fn callback_error_becomes_marked_500() {
        let response = pipeline(Arc::new(AllowAll))
            .update(
                &ctx(),
                "forecast",
                || async { Err::<OperationResult<i32>, _>(anyhow::anyhow!("store offline")) },
                None,
            )
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal failure: store offline");
    }

    #[tokio::test]
    async fn callback_panic_is_contained() {
        let response = pipeline(Arc::new(AllowAll))
            .delete(&ctx(), || async {
                if ctx().path.is_empty() {
                    return Ok(true);
                }
                panic!("index corrupted")
            })
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal failure: index corrupted");
    }

    #[tokio::test]
    async fn errors_still_carry_request_id() {
        let mut headers = HeaderMap::new();
        headers.insert("request-id", HeaderValue::from_static("trace-7"));
        let ctx = RequestContext::new("/api/forecasts", headers);

        let response = pipeline(Arc::new(AllowAll))
            .update(&ctx, "forecast", || async { Ok(OperationResult::<i32>::Empty) }, None)
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["request-id"], "trace-7");
    }

    #[tokio::test]
    async fn bad_page_size_never_touches_collection() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let p = pipeline(Arc::new(AllowAll));
        let max = AppConfig::default().api.max_page_size as i64;

        let cursors = [
            PageCursor::Initial,
            PageCursor::Next {
                token: Some(encode_cursor(10)),
                page_offset: None,
            },
            PageCursor::Next {
                token: None,
                page_offset: Some(2),
            },
        ];

        for cursor in cursors {
            for size in [0, -3, max + 1] {
                let request = PageRequest {
                    page_size: Some(size),
                    cursor: cursor.clone(),
                };
                let response = p
                    .read_page(&ctx(), "forecasts", "/api/forecasts/page/next", &request, move || async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(vec![1, 2, 3])
                    })
                    .await;
                assert_eq!(response.status(), StatusCode::BAD_REQUEST, "size {} {:?}", size, request.cursor);
            }
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_sequence_is_ok_not_no_content() {
        let response = pipeline(Arc::new(AllowAll))
            .read(&ctx(), "forecasts", || async { Ok(OperationResult::<i32>::Sequence(vec![])) })
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"{"data":{"forecasts":[]}}"#);
    }
}
