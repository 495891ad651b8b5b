//! # Constants
//!
//! Shared constants used throughout the operator.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Finalizer marker owned by this operator.
///
/// Other controllers' markers on the same object are never touched.
pub const FINALIZER_NAME: &str = "kafka.appfarm.rs/finalizer";

/// Field manager recorded on every patch issued by the operator
pub const FIELD_MANAGER: &str = "kafka-user-operator";

/// Condition type reporting whether the Kafka user was provisioned
pub const CONDITION_CREATED: &str = "Created";

/// Reason recorded when the Kafka user exists
pub const REASON_SUCCESS: &str = "Success";

/// Reason recorded when the provisioning backend rejected the user
pub const REASON_CREATE_FAILED: &str = "CreateFailed";

/// Message recorded alongside `Created=True`
pub const MESSAGE_USER_CREATED: &str = "User created in Kafka";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default Fibonacci backoff floor for failed reconciliations (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 1;

/// Default Fibonacci backoff ceiling for failed reconciliations (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Default limit on concurrently running reconciliations
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Default tracing filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "kafka_user_operator=info,kube=warn";

/// Delay before restarting the watch after the controller stream ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;
