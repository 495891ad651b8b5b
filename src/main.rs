//! # KafkaUser Operator
//!
//! Watches `KafkaUser` resources and keeps the matching Kafka users in place.
//!
//! ## Configuration
//!
//! - `RUST_LOG` / `LOG_LEVEL` - tracing filter
//! - `LOG_FORMAT` - `text` (default) or `json`
//! - `WATCH_NAMESPACE` - restrict the watch to one namespace
//! - `METRICS_PORT` - port for `/metrics`, `/healthz`, `/readyz` (default 8080)
//! - `BACKOFF_MIN_SECS` / `BACKOFF_MAX_SECS` - retry backoff bounds
//! - `MAX_CONCURRENT_RECONCILIATIONS` - parallelism across distinct objects

use anyhow::Result;
use kafka_user_operator::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;
    run_watch_loop(
        init.users,
        init.context,
        init.server_state,
        &init.controller_config,
    )
    .await
}
