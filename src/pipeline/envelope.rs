use axum::http::header::{
    HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, EXPIRES, REFERRER_POLICY, WWW_AUTHENTICATE,
};
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::AppConfig;
use crate::pagination::Page;
use crate::pipeline::context::{RequestId, REQUEST_ID_HEADER};
use crate::pipeline::error::PipelineError;
use crate::pipeline::outcome::OperationResult;

pub const FEATURE_POLICY: HeaderName = HeaderName::from_static("feature-policy");

/// Wrap a payload as `{ "data": { <node_name>: payload } }`.
///
/// An absent payload has no place in an envelope and is reported as not found.
pub fn build<T: Serialize>(node_name: &str, payload: &OperationResult<T>) -> Result<Value, PipelineError> {
    let value = match payload {
        OperationResult::Sequence(items) => serde_json::to_value(items)?,
        OperationResult::Scalar(item) => serde_json::to_value(item)?,
        OperationResult::Empty => {
            return Err(PipelineError::NotFound(format!("no {} found", node_name)));
        }
    };
    Ok(wrap(node_name, value))
}

/// Envelope for a page: the items plus `meta` and `links`
pub fn build_page<T: Serialize>(node_name: &str, page: &Page<T>) -> Result<Value, PipelineError> {
    let mut envelope = wrap(node_name, serde_json::to_value(&page.items)?);
    envelope["meta"] = serde_json::to_value(&page.meta)?;
    envelope["links"] = serde_json::to_value(&page.links)?;
    Ok(envelope)
}

fn wrap(node_name: &str, value: Value) -> Value {
    let mut data = Map::new();
    data.insert(node_name.to_string(), value);
    json!({ "data": Value::Object(data) })
}

/// Headers attached to every enveloped response, taken from static configuration
#[derive(Debug, Clone)]
pub struct CommonHeaders {
    challenge: HeaderValue,
    allowed_origin: HeaderValue,
    feature_policy: HeaderValue,
    referrer_policy: HeaderValue,
    expiry: Duration,
}

impl CommonHeaders {
    pub fn from_config(config: &AppConfig) -> Result<Self, axum::http::header::InvalidHeaderValue> {
        let security = &config.security;
        Ok(Self {
            challenge: HeaderValue::from_str(&security.challenge)?,
            allowed_origin: HeaderValue::from_str(&security.allowed_origin)?,
            feature_policy: HeaderValue::from_str(&security.feature_policy)?,
            referrer_policy: HeaderValue::from_str(&security.referrer_policy)?,
            expiry: Duration::seconds(config.response.expiry_secs),
        })
    }

    pub fn challenge(&self) -> &HeaderValue {
        &self.challenge
    }

    pub fn apply(&self, headers: &mut HeaderMap, request_id: &RequestId) {
        headers.insert(WWW_AUTHENTICATE, self.challenge.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allowed_origin.clone());
        headers.insert(FEATURE_POLICY, self.feature_policy.clone());
        headers.insert(REFERRER_POLICY, self.referrer_policy.clone());

        let expires = (Utc::now() + self.expiry).format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        if let Ok(value) = HeaderValue::from_str(&expires) {
            headers.insert(EXPIRES, value);
        }

        apply_request_id(headers, request_id);
    }
}

pub fn apply_request_id(headers: &mut HeaderMap, request_id: &RequestId) {
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{Link, PageMeta};

    #[derive(Serialize)]
    struct Forecast {
        summary: &'static str,
    }

    #[test]
    fn scalar_is_placed_under_node_name() {
        let env = build("forecast", &OperationResult::Scalar(Forecast { summary: "Mild" })).unwrap();
        assert_eq!(env, json!({ "data": { "forecast": { "summary": "Mild" } } }));
    }

    #[test]
    fn sequence_is_placed_under_node_name() {
        let items = vec![Forecast { summary: "Hot" }, Forecast { summary: "Cold" }];
        let env = build("forecasts", &OperationResult::Sequence(items)).unwrap();
        assert_eq!(env["data"]["forecasts"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn absent_payload_is_not_found() {
        let err = build("forecast", &OperationResult::<Forecast>::Empty).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[test]
    fn page_envelope_carries_meta_and_links() {
        let page = Page {
            items: vec![1, 2],
            meta: PageMeta { page_offset: 1, page_size: 2, total: 2 },
            links: vec![Link::next("/api/forecasts/page/next?token=AgAAAA%3D%3D&pageSize=2")],
        };
        let env = build_page("forecasts", &page).unwrap();
        assert_eq!(env["data"]["forecasts"], json!([1, 2]));
        assert_eq!(env["meta"], json!({ "pageOffset": 1, "pageSize": 2, "total": 2 }));
        assert_eq!(env["links"][0]["rel"], "next");
    }

    #[test]
    fn common_headers_include_request_id_and_expiry() {
        let headers_cfg = CommonHeaders::from_config(&AppConfig::default()).unwrap();
        let mut headers = HeaderMap::new();
        headers_cfg.apply(&mut headers, &RequestId("req-1".into()));

        assert_eq!(headers.get(REQUEST_ID_HEADER).unwrap(), "req-1");
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert!(headers.get(EXPIRES).unwrap().to_str().unwrap().ends_with("GMT"));
        assert!(headers.contains_key(WWW_AUTHENTICATE));
        assert!(headers.contains_key(FEATURE_POLICY));
        assert!(headers.contains_key(REFERRER_POLICY));
    }
}
