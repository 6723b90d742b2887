use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{AuthMode, SecurityConfig};
use crate::pipeline::context::RequestContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Allowed,
    Denied { challenge: Option<String> },
}

impl AuthOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthOutcome::Allowed)
    }
}

/// Capability check run before any resource operation executes.
///
/// Implementations decide policy; the pipeline only looks at allowed/denied.
#[async_trait]
pub trait AuthGate: Send + Sync {
    async fn check(&self, ctx: &RequestContext) -> AuthOutcome;
}

/// Lets every request through
#[derive(Debug, Clone, Default)]
pub struct AllowAll;

#[async_trait]
impl AuthGate for AllowAll {
    async fn check(&self, _ctx: &RequestContext) -> AuthOutcome {
        AuthOutcome::Allowed
    }
}

/// Allows any request that presents a non-empty bearer token
#[derive(Debug, Clone)]
pub struct BearerPresence {
    challenge: String,
}

impl BearerPresence {
    pub fn new(challenge: impl Into<String>) -> Self {
        Self {
            challenge: challenge.into(),
        }
    }
}

#[async_trait]
impl AuthGate for BearerPresence {
    async fn check(&self, ctx: &RequestContext) -> AuthOutcome {
        match ctx.bearer_token() {
            Some(_) => AuthOutcome::Allowed,
            None => AuthOutcome::Denied {
                challenge: Some(self.challenge.clone()),
            },
        }
    }
}

/// Claims carried by tokens accepted by [`JwtGate`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// Validates HS256 bearer tokens against a shared secret
pub struct JwtGate {
    key: DecodingKey,
    validation: Validation,
    challenge: String,
}

impl JwtGate {
    pub fn new(secret: &str, challenge: impl Into<String>) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            challenge: challenge.into(),
        }
    }

    fn denied(&self, reason: &str) -> AuthOutcome {
        tracing::debug!("JWT rejected: {}", reason);
        AuthOutcome::Denied {
            challenge: Some(format!("{}, error=\"invalid_token\"", self.challenge)),
        }
    }
}

#[async_trait]
impl AuthGate for JwtGate {
    async fn check(&self, ctx: &RequestContext) -> AuthOutcome {
        let Some(token) = ctx.bearer_token() else {
            return AuthOutcome::Denied {
                challenge: Some(self.challenge.clone()),
            };
        };

        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(_) => AuthOutcome::Allowed,
            Err(e) => self.denied(&e.to_string()),
        }
    }
}

/// Build the gate selected by configuration
pub fn gate_from_config(security: &SecurityConfig) -> Arc<dyn AuthGate> {
    match security.auth_mode {
        AuthMode::AllowAll => Arc::new(AllowAll),
        AuthMode::Bearer => Arc::new(BearerPresence::new(security.challenge.clone())),
        AuthMode::Jwt => {
            if security.jwt_secret.is_empty() {
                tracing::warn!("JWT auth selected without a secret; every token will be rejected");
            }
            Arc::new(JwtGate::new(&security.jwt_secret, security.challenge.clone()))
        }
    }
}
