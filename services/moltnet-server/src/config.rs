//! Server configuration: environment variables, an optional config file,
//! and CLI overrides, layered over each domain crate's own config.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use moltnet_auth::AuthConfig;
use moltnet_db::DatabaseConfig;
use moltnet_recovery::RecoveryConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub external: ExternalServices,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), shutdown_timeout_secs: default_shutdown_timeout() }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port).parse().expect("invalid socket address")
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// URLs for the external collaborators named in spec §6's environment
/// table (`<AS>_ADMIN_URL`, `<AS>_PUBLIC_URL`, `<IS>_ADMIN_URL`,
/// `<POLICY>_{READ,WRITE}_URL`): the Ory-family identity store, OAuth2
/// authorization server, and policy engine. None of these are implemented
/// by MoltNet itself (spec §1 non-goals) — the server only holds the URLs
/// to reach them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalServices {
    /// Identity store admin API, used by the registration orchestrator to
    /// create identities and by recovery to mint recovery codes.
    #[serde(default)]
    pub identity_admin_url: String,
    /// Identity store admin API key (`ORY_ACTION_API_KEY`).
    #[serde(default)]
    pub identity_admin_api_key: String,
    /// OAuth2 authorization server admin API, used to mint the
    /// `client_credentials` pair a newly registered agent receives.
    #[serde(default)]
    pub oauth_admin_url: String,
    #[serde(default)]
    pub oauth_admin_api_key: String,
    /// OAuth2 authorization server public token endpoint, reverse-proxied
    /// by `POST /oauth2/token`.
    #[serde(default)]
    pub oauth_public_token_url: String,
    /// Relationship-engine read/write endpoints. Empty means "use the
    /// in-DB `SqlRelationshipEngine` fallback" (Design Notes 4.3(b))
    /// instead of a real Keto-compatible service.
    #[serde(default)]
    pub policy_read_url: String,
    #[serde(default)]
    pub policy_write_url: String,
}

impl Default for ExternalServices {
    fn default() -> Self {
        Self {
            identity_admin_url: String::new(),
            identity_admin_api_key: String::new(),
            oauth_admin_url: String::new(),
            oauth_admin_api_key: String::new(),
            oauth_public_token_url: String::new(),
            policy_read_url: String::new(),
            policy_write_url: String::new(),
        }
    }
}

impl ExternalServices {
    pub fn from_env() -> Self {
        Self {
            identity_admin_url: std::env::var("IS_ADMIN_URL").unwrap_or_default(),
            identity_admin_api_key: std::env::var("ORY_ACTION_API_KEY").unwrap_or_default(),
            oauth_admin_url: std::env::var("AS_ADMIN_URL").unwrap_or_default(),
            oauth_admin_api_key: std::env::var("AS_ADMIN_API_KEY").unwrap_or_default(),
            oauth_public_token_url: std::env::var("AS_PUBLIC_URL")
                .map(|base| format!("{}/oauth2/token", base.trim_end_matches('/')))
                .unwrap_or_default(),
            policy_read_url: std::env::var("POLICY_READ_URL").unwrap_or_default(),
            policy_write_url: std::env::var("POLICY_WRITE_URL").unwrap_or_default(),
        }
    }

    pub fn uses_sql_policy_fallback(&self) -> bool {
        self.policy_read_url.is_empty() || self.policy_write_url.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_true")]
    pub enable_cors: bool,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_true")]
    pub enable_compression: bool,
    #[serde(default = "default_true")]
    pub enable_tracing: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            enable_cors: true,
            cors_origins: default_cors_origins(),
            enable_compression: true,
            enable_tracing: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: default_log_format() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true, port: default_metrics_port() }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_shutdown_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
fn default_metrics_port() -> u16 {
    9090
}

impl ServerConfig {
    /// Layer an optional config file under environment variables, then
    /// fold in the sub-configs each domain crate already knows how to read
    /// from `env` (`DatabaseConfig`, `AuthConfig`, `RecoveryConfig`).
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("MOLTNET").separator("__").try_parsing(true));

        let raw = builder.build()?;
        let mut server_config: ServerConfig = raw.try_deserialize().unwrap_or_else(|_| ServerConfig::default());

        // Domain crates own their own `from_env` precedence; let them
        // override whatever the generic file/prefix layer produced.
        if std::env::var("DATABASE_URL").is_ok() {
            server_config.database = DatabaseConfig::from_env();
        }
        server_config.auth = AuthConfig::from_env();
        server_config.recovery = RecoveryConfig::from_env();
        server_config.external = ExternalServices::from_env();

        Ok(server_config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            recovery: RecoveryConfig::default(),
            external: ExternalServices::default(),
            api: ApiSettings::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}
