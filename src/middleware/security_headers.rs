//! Stamps the fixed security-header policy onto every response.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::header::{
    HeaderName, HeaderValue, InvalidHeaderValue, CACHE_CONTROL, CONTENT_SECURITY_POLICY,
    STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use axum::http::{Request, Response};
use tower::{Layer, Service};

use crate::config::SecurityConfig;

/// Tower layer applying the security-header policy.
#[derive(Clone)]
pub struct SecurityHeadersLayer {
    headers: Arc<[(HeaderName, HeaderValue)]>,
}

impl SecurityHeadersLayer {
    pub fn from_config(security: &SecurityConfig) -> Result<Self, InvalidHeaderValue> {
        let headers = vec![
            (CONTENT_SECURITY_POLICY, HeaderValue::from_str(&security.content_security_policy)?),
            (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_str(&security.content_type_options)?),
            (X_FRAME_OPTIONS, HeaderValue::from_str(&security.frame_options)?),
            (STRICT_TRANSPORT_SECURITY, HeaderValue::from_str(&security.strict_transport_security)?),
            (CACHE_CONTROL, HeaderValue::from_str(&security.cache_control)?),
        ];
        Ok(Self {
            headers: headers.into(),
        })
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeaders<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeaders {
            inner,
            headers: self.headers.clone(),
        }
    }
}

/// Security-header middleware service.
#[derive(Clone)]
pub struct SecurityHeaders<S> {
    inner: S,
    headers: Arc<[(HeaderName, HeaderValue)]>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for SecurityHeaders<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // Take the service that was driven to readiness, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let headers = self.headers.clone();

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            for (name, value) in headers.iter() {
                response.headers_mut().insert(name.clone(), value.clone());
            }
            Ok(response)
        })
    }
}
