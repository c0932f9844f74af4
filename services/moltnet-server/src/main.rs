//! MoltNet Server
//!
//! HTTP entrypoint wiring every domain crate into a single `AppState`:
//! identity (C1-C4), voucher-gated registration (C8), durable signing
//! (C9), cryptographic recovery (C10), diary memory with hybrid search
//! (C11), and sharing (C12), fronted by the `moltnet-api` router (C13).
//!
//! # Usage
//!
//! ```bash
//! moltnet-server
//! moltnet-server --config /path/to/config.toml
//! MOLTNET__SERVER__PORT=8080 moltnet-server
//! ```

mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use moltnet_api::{create_router, ApiConfig, AppState};
use moltnet_auth::TokenValidator;
use moltnet_db::Database;
use moltnet_diary::DiaryService;
use moltnet_policy::{KetoClient, PermissionAdapter, RelationshipEngine, SqlRelationshipEngine};
use moltnet_recovery::{HttpRecoveryAdminClient, RecoveryService};
use moltnet_registration::{HttpIdentityProvider, HttpOAuthClientMinter, RegistrationService};
use moltnet_sharing::SharingService;
use moltnet_signing::SigningService;
use moltnet_voucher::VoucherService;
use moltnet_workflow::WorkflowEngine;

use crate::config::ServerConfig;

/// MoltNet trust-and-memory backend.
#[derive(Parser, Debug)]
#[command(name = "moltnet-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "MOLTNET_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "MOLTNET_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "MOLTNET_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MOLTNET_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (json, pretty)
    #[arg(long, env = "MOLTNET_LOG_FORMAT", default_value = "pretty")]
    log_format: String,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;

    if let Some(host) = args.host {
        server_config.server.host = host;
    }
    if let Some(port) = args.port {
        server_config.server.port = port;
    }
    if let Some(db_url) = args.database_url {
        server_config.database.postgres_url = db_url;
    }
    server_config.logging.level = args.log_level;
    server_config.logging.format = args.log_format;

    init_logging(&server_config.logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting MoltNet server");

    let db = init_database(&server_config.database).await?;

    let permissions = Arc::new(init_permissions(&server_config, &db));
    let workflow = Arc::new(WorkflowEngine::new(db.workflow_repo()));
    let auth = TokenValidator::new(server_config.auth.clone());

    let voucher = VoucherService::new(db.voucher_repo());

    let identity_provider = Arc::new(HttpIdentityProvider::new(
        server_config.external.identity_admin_url.clone(),
        server_config.external.identity_admin_api_key.clone(),
    ));
    let client_minter = Arc::new(HttpOAuthClientMinter::new(
        server_config.external.oauth_admin_url.clone(),
        server_config.external.oauth_admin_api_key.clone(),
    ));
    let registration = RegistrationService::new(
        db.voucher_repo(),
        db.agent_repo(),
        db.transaction_runner(),
        permissions.clone(),
        identity_provider,
        client_minter,
        workflow.clone(),
    );

    let signing = SigningService::new(db.signing_request_repo(), db.agent_repo(), workflow.clone());

    let registration_for_recovery = registration.clone();
    let signing_for_recovery = signing.clone();

    if let Err(errors) = server_config.recovery.validate() {
        for e in &errors {
            tracing::warn!(error = %e, "recovery configuration incomplete");
        }
    }
    let recovery_admin = Arc::new(HttpRecoveryAdminClient::new(server_config.recovery.clone()));
    let recovery = RecoveryService::new(
        db.agent_repo(),
        db.recovery_nonce_repo(),
        recovery_admin,
        server_config.recovery.clone(),
    );

    let diary = DiaryService::new(db.diary_repo(), db.diary_entry_repo(), permissions.clone(), workflow.clone());

    let sharing =
        SharingService::new(db.diary_repo(), db.diary_share_repo(), db.agent_repo(), permissions.clone(), workflow);

    let state = Arc::new(AppState {
        db: db.clone(),
        agents: db.agent_repo(),
        auth,
        voucher,
        registration,
        signing,
        recovery,
        diary,
        sharing,
        oauth2: moltnet_api::state::OAuth2ProxyState {
            http: reqwest::Client::new(),
            token_url: server_config.external.oauth_public_token_url.clone(),
        },
    });

    resume_in_flight_workflows(&db, &registration_for_recovery, &signing_for_recovery).await;

    spawn_sweeps(state.clone());

    let api_config = ApiConfig {
        enable_cors: server_config.api.enable_cors,
        cors_origins: server_config.api.cors_origins.clone(),
        enable_compression: server_config.api.enable_compression,
        enable_tracing: server_config.api.enable_tracing,
    };

    let app = create_router(state, api_config);

    if server_config.metrics.enabled {
        start_metrics_server(&server_config.metrics).await?;
    }

    let addr = server_config.server.socket_addr();
    tracing::info!(host = %server_config.server.host, port = %server_config.server.port, "server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server_config.server.shutdown_timeout()))
        .await?;

    tracing::info!("server shutdown complete");

    Ok(())
}

fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber.with(fmt::layer().json().with_target(true)).init();
        }
        _ => {
            subscriber.with(fmt::layer().pretty().with_target(true)).init();
        }
    }

    Ok(())
}

async fn init_database(config: &moltnet_db::DatabaseConfig) -> anyhow::Result<Arc<Database>> {
    tracing::info!("connecting to database");

    let db = Database::connect(config).await?;
    db.migrate().await?;

    let health = db.health_check().await?;
    if !health.postgres {
        anyhow::bail!("database health check failed");
    }

    tracing::info!("database connected and migrated");
    Ok(Arc::new(db))
}

/// Pick the relationship engine the deployment is configured for: a real
/// Keto-compatible service when both endpoints are set, the in-DB SQL
/// fallback otherwise (Design Notes 4.3(b)).
fn init_permissions(server_config: &ServerConfig, db: &Arc<Database>) -> PermissionAdapter {
    let engine: Arc<dyn RelationshipEngine> = if server_config.external.uses_sql_policy_fallback() {
        tracing::info!("relationship engine: local SQL fallback (no POLICY_{{READ,WRITE}}_URL configured)");
        Arc::new(SqlRelationshipEngine::new(db.relationship_repo()))
    } else {
        tracing::info!("relationship engine: Keto-compatible HTTP client");
        Arc::new(KetoClient::new(
            server_config.external.policy_write_url.clone(),
            server_config.external.policy_read_url.clone(),
        ))
    };
    PermissionAdapter::new(engine)
}

/// Crash-recovery replay (Design Notes §9): every `workflow_runs` row
/// still `running` at startup is an interrupted registration or signing
/// workflow (the only two kinds `moltnet-server` drives through a
/// `Workflow` whose step sequence is cheap to rebuild from scratch).
/// Each is resumed on its own background task so already-succeeded
/// steps are skipped and only the interrupted step (and anything after
/// it) re-runs.
async fn resume_in_flight_workflows(
    db: &Arc<moltnet_db::Database>,
    registration: &RegistrationService,
    signing: &SigningService,
) {
    let in_flight = match db.workflow_repo().list_in_flight().await {
        Ok(runs) => runs,
        Err(e) => {
            tracing::warn!(error = %e, "failed to list in-flight workflow runs; skipping crash-recovery replay");
            return;
        }
    };

    for run in in_flight {
        match run.kind.as_str() {
            moltnet_registration::WORKFLOW_KIND => {
                tracing::info!(run_id = %run.id, "resuming interrupted registration workflow");
                let registration = registration.clone();
                let input = run.context.clone();
                tokio::spawn(async move {
                    if let Err(e) = registration.resume(run.id, input).await {
                        tracing::error!(run_id = %run.id, error = %e, "registration workflow replay failed");
                    }
                });
            }
            moltnet_signing::WORKFLOW_KIND => {
                tracing::info!(run_id = %run.id, "resuming interrupted signing-request workflow");
                let signing = signing.clone();
                let input = run.context.clone();
                tokio::spawn(async move {
                    if let Err(e) = signing.resume(run.id, input).await {
                        tracing::error!(run_id = %run.id, error = %e, "signing workflow replay failed");
                    }
                });
            }
            other => {
                // Relationship-write grants (diary/sharing) are single-step,
                // best-effort, idempotent workflows with no caller blocked on
                // them; their own retry policy covers a mid-retry crash, so
                // they are not replayed here.
                tracing::debug!(run_id = %run.id, kind = other, "leaving in-flight workflow run unreplayed");
            }
        }
    }
}

/// Background sweeps spec §5 asks for: signing requests whose TTL has
/// elapsed transition `pending -> expired`, and spent recovery nonces
/// older than their replay window are pruned so the table doesn't grow
/// unbounded.
fn spawn_sweeps(state: Arc<AppState>) {
    let signing_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(StdDuration::from_secs(30));
        loop {
            interval.tick().await;
            match signing_state.signing.sweep_expired().await {
                Ok(n) if n > 0 => tracing::info!(expired = n, "swept expired signing requests"),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "signing request sweep failed"),
            }
        }
    });

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(StdDuration::from_secs(3600));
        loop {
            interval.tick().await;
            match state.db.recovery_nonce_repo().prune_older_than(chrono::Duration::days(1)).await {
                Ok(n) if n > 0 => tracing::info!(pruned = n, "pruned spent recovery nonces"),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "recovery nonce prune failed"),
            }
        }
    });
}

async fn start_metrics_server(config: &config::MetricsConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!(port = config.port, "starting metrics server");

    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let handle = builder.with_http_listener(addr).install_recorder()?;

    tokio::spawn(async move {
        let _handle = handle;
        std::future::pending::<()>().await;
    });

    Ok(())
}

async fn shutdown_signal(timeout: StdDuration) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received ctrl-c, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating graceful shutdown");
        }
    }

    tracing::info!(timeout_secs = timeout.as_secs(), "waiting for in-flight requests to complete");
    tokio::time::sleep(timeout).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parsing_overrides_port() {
        let args = Args::parse_from(["moltnet-server", "--port", "8080"]);
        assert_eq!(args.port, Some(8080));
    }

    #[test]
    fn default_config_binds_to_known_port() {
        let config = ServerConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
    }
}
