//! # Initialization
//!
//! Operator startup: rustls setup, tracing, metrics, server startup, and
//! Kubernetes client setup.

use crate::config::{ControllerConfig, LogFormat, ServerConfig};
use crate::constants::DEFAULT_LOG_FILTER;
use crate::controller::reconciler::{ControllerContext, KubeResourceStore, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::crd::KafkaUser;
use crate::observability;
use crate::provider::InMemoryKafka;
use anyhow::{Context, Result};
use kube::{api::Api, Client};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Everything the watch loop needs to run
pub struct InitializationResult {
    pub client: Client,
    /// `KafkaUser` API scoped to the watched namespace (or all namespaces)
    pub users: Api<KafkaUser>,
    pub context: Arc<ControllerContext>,
    pub server_state: Arc<ServerState>,
    pub controller_config: ControllerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .field("controller_config", &self.controller_config)
            .finish_non_exhaustive()
    }
}

/// Initialize the operator runtime
pub async fn initialize() -> Result<InitializationResult> {
    // Must run before anything touches rustls; a second install is harmless
    let _ = rustls::crypto::ring::default_provider().install_default();

    let controller_config = ControllerConfig::from_env();
    let server_config = ServerConfig::from_env();

    init_tracing(&controller_config)?;

    info!("Starting KafkaUser operator");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::new());
    let server_state_clone = Arc::clone(&server_state);
    let server_port = server_config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let users: Api<KafkaUser> = match controller_config.watch_namespace.as_deref() {
        Some(namespace) => {
            info!("Watching KafkaUser resources in namespace '{}'", namespace);
            Api::namespaced(client.clone(), namespace)
        }
        None => {
            info!("Watching KafkaUser resources in all namespaces");
            Api::all(client.clone())
        }
    };

    let reconciler = Reconciler::new(
        Arc::new(KubeResourceStore::new(client.clone())),
        Arc::new(InMemoryKafka::new()),
    );
    let context = Arc::new(ControllerContext::new(
        reconciler,
        controller_config.backoff_min_secs,
        controller_config.backoff_max_secs,
    ));

    info!("Operator initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        users,
        context,
        server_state,
        controller_config,
    })
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `LOG_LEVEL`, which wins over the built-in default.
fn init_tracing(config: &ControllerConfig) -> Result<()> {
    let fallback = config
        .log_level
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.with_ansi(config.log_enable_color).try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = server_config.startup_timeout();
    let poll_interval = server_config.poll_interval();
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}
