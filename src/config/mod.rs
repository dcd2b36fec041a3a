//! Configuration management for Flock Core

use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Session store configuration
    pub session: SessionConfig,
    /// How callers are identified on inbound requests
    pub auth: AuthConfig,
    /// View-as configuration
    pub view_as: ViewAsConfig,
    /// Platform metrics aggregation
    pub aggregator: AggregatorConfig,
    /// Logging and metrics
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub redis: RedisConfig,
    /// Sliding session lifetime, refreshed on every write
    pub ttl_secs: u64,
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Memory,
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
            },
            ttl_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Header carrying the principal id set by the upstream authenticator
    pub principal_header: String,
    /// Cookie carrying the opaque session id
    pub session_cookie: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            principal_header: "x-principal-id".to_string(),
            session_cookie: "flock_session".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewAsConfig {
    /// Lifetime of a view-as context; `None` keeps it for the whole session
    pub ttl_secs: Option<u64>,
}

impl ViewAsConfig {
    pub fn ttl(&self) -> Option<chrono::Duration> {
        self.ttl_secs
            .and_then(|secs| chrono::Duration::try_seconds(secs as i64))
    }
}

impl Default for ViewAsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: Some(3600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Number of tenants computed concurrently
    pub concurrency: usize,
    /// Time bound for one tenant's computation
    pub tenant_timeout_ms: u64,
    /// Size of the top-N rankings
    pub top_n: usize,
}

impl AggregatorConfig {
    pub fn tenant_timeout(&self) -> Duration {
        Duration::from_millis(self.tenant_timeout_ms)
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            tenant_timeout_ms: 5000,
            top_n: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `pretty` or `json`
    pub log_format: String,
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
            metrics_enabled: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let backend = match env::var("SESSION_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .as_str()
        {
            "memory" => SessionBackend::Memory,
            "redis" => SessionBackend::Redis,
            other => bail!("Invalid SESSION_BACKEND: {}", other),
        };

        let view_as_ttl: u64 = env::var("VIEW_AS_TTL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .context("Invalid VIEW_AS_TTL_SECS")?;

        let config = Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("Invalid DATABASE_MAX_CONNECTIONS")?,
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()
                    .context("Invalid DATABASE_MIN_CONNECTIONS")?,
            },
            session: SessionConfig {
                backend,
                redis: RedisConfig {
                    url: env::var("REDIS_URL")
                        .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
                },
                ttl_secs: env::var("SESSION_TTL_SECS")
                    .unwrap_or_else(|_| "86400".to_string())
                    .parse()
                    .context("Invalid SESSION_TTL_SECS")?,
            },
            auth: AuthConfig {
                principal_header: env::var("PRINCIPAL_HEADER")
                    .unwrap_or_else(|_| "x-principal-id".to_string())
                    .to_ascii_lowercase(),
                session_cookie: env::var("SESSION_COOKIE_NAME")
                    .unwrap_or_else(|_| "flock_session".to_string()),
            },
            view_as: ViewAsConfig {
                ttl_secs: (view_as_ttl > 0).then_some(view_as_ttl),
            },
            aggregator: AggregatorConfig {
                concurrency: env::var("AGGREGATOR_CONCURRENCY")
                    .unwrap_or_else(|_| "8".to_string())
                    .parse()
                    .context("Invalid AGGREGATOR_CONCURRENCY")?,
                tenant_timeout_ms: env::var("AGGREGATOR_TENANT_TIMEOUT_MS")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .context("Invalid AGGREGATOR_TENANT_TIMEOUT_MS")?,
                top_n: env::var("AGGREGATOR_TOP_N")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("Invalid AGGREGATOR_TOP_N")?,
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
                metrics_enabled: env::var("METRICS_ENABLED")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(false),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.aggregator.concurrency == 0 {
            bail!("AGGREGATOR_CONCURRENCY must be at least 1");
        }
        if self.aggregator.tenant_timeout_ms == 0 {
            bail!("AGGREGATOR_TENANT_TIMEOUT_MS must be at least 1");
        }
        if self.session.ttl_secs == 0 {
            bail!("SESSION_TTL_SECS must be at least 1");
        }
        if self.auth.session_cookie.is_empty() || self.auth.principal_header.is_empty() {
            bail!("SESSION_COOKIE_NAME and PRINCIPAL_HEADER must not be empty");
        }
        Ok(())
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
