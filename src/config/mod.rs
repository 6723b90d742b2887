use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub response: ResponseConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    /// Upper bound on the encoded size of an outbound payload
    pub max_payload_bytes: usize,
    pub max_page_size: usize,
    /// Number of demo forecasts generated at startup
    pub seed_records: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    AllowAll,
    Bearer,
    Jwt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub auth_mode: AuthMode,
    pub jwt_secret: String,
    /// Value of the WWW-Authenticate challenge
    pub challenge: String,
    pub allowed_origin: String,
    pub feature_policy: String,
    pub referrer_policy: String,
    pub content_security_policy: String,
    pub content_type_options: String,
    pub frame_options: String,
    pub strict_transport_security: String,
    pub cache_control: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Seconds added to the current time for the Expires header
    pub expiry_secs: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        Self::for_environment(environment).with_env_overrides()
    }

    /// Load a complete configuration from a YAML file, then apply env overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let config: AppConfig = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
            path: display,
            source,
        })?;
        Ok(config.with_env_overrides())
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_MAX_PAYLOAD_BYTES") {
            self.api.max_payload_bytes = v.parse().unwrap_or(self.api.max_payload_bytes);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Ok(v) = env::var("API_SEED_RECORDS") {
            self.api.seed_records = v.parse().unwrap_or(self.api.seed_records);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_AUTH_MODE") {
            self.security.auth_mode = match v.as_str() {
                "allow_all" => AuthMode::AllowAll,
                "bearer" => AuthMode::Bearer,
                "jwt" => AuthMode::Jwt,
                _ => self.security.auth_mode,
            };
        }
        if let Ok(v) = env::var("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_CHALLENGE") {
            self.security.challenge = v;
        }
        if let Ok(v) = env::var("SECURITY_ALLOWED_ORIGIN") {
            self.security.allowed_origin = v;
        }

        // Response overrides
        if let Ok(v) = env::var("RESPONSE_EXPIRY_SECS") {
            self.response.expiry_secs = v.parse().unwrap_or(self.response.expiry_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                port: 3000,
                max_payload_bytes: 10 * 1024 * 1024, // 10MB
                max_page_size: 100,
                seed_records: 100,
            },
            security: SecurityConfig {
                auth_mode: AuthMode::AllowAll,
                jwt_secret: String::new(),
                allowed_origin: "*".to_string(),
                ..SecurityConfig::baseline()
            },
            response: ResponseConfig { expiry_secs: 60 },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                port: 8080,
                max_payload_bytes: 5 * 1024 * 1024, // 5MB
                max_page_size: 50,
                seed_records: 100,
            },
            security: SecurityConfig {
                auth_mode: AuthMode::Bearer,
                allowed_origin: "https://staging.example.com".to_string(),
                ..SecurityConfig::baseline()
            },
            response: ResponseConfig { expiry_secs: 300 },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                port: 8080,
                max_payload_bytes: 1024 * 1024, // 1MB
                max_page_size: 50,
                seed_records: 0,
            },
            security: SecurityConfig {
                auth_mode: AuthMode::Jwt,
                allowed_origin: "https://app.example.com".to_string(),
                ..SecurityConfig::baseline()
            },
            response: ResponseConfig { expiry_secs: 3600 },
        }
    }
}

impl SecurityConfig {
    fn baseline() -> Self {
        Self {
            auth_mode: AuthMode::Jwt,
            jwt_secret: String::new(),
            challenge: "Bearer realm=\"resource-pipeline\"".to_string(),
            allowed_origin: "*".to_string(),
            feature_policy: "geolocation 'none'; camera 'none'; microphone 'none'".to_string(),
            referrer_policy: "no-referrer".to_string(),
            content_security_policy: "default-src 'none'; frame-ancestors 'none'".to_string(),
            content_type_options: "nosniff".to_string(),
            frame_options: "DENY".to_string(),
            strict_transport_security: "max-age=31536000; includeSubDomains".to_string(),
            cache_control: "no-store".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}
