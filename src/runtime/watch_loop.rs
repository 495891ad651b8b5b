//! # Watch Loop
//!
//! Controller watch loop that monitors `KafkaUser` resources and triggers
//! reconciliation when changes are detected.
//!
//! The controller runtime never runs two reconciliations for the same object
//! at once; distinct objects run concurrently up to the configured limit.

use crate::config::ControllerConfig;
use crate::controller::reconciler::{reconcile, ControllerContext};
use crate::controller::server::ServerState;
use crate::crd::KafkaUser;
use crate::runtime::error_policy::handle_reconciliation_error;
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{controller, watcher, Controller};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Run the controller until SIGINT or SIGTERM is received
///
/// Restarts the watch if the controller stream ends on its own; a signal
/// drains in-flight reconciliations and exits instead.
pub async fn run_watch_loop(
    users: Api<KafkaUser>,
    context: Arc<ControllerContext>,
    server_state: Arc<ServerState>,
    config: &ControllerConfig,
) -> Result<(), anyhow::Error> {
    let shutdown = spawn_shutdown_listener(Arc::clone(&server_state));

    loop {
        if *shutdown.borrow() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let watch_span = tracing::span!(
            tracing::Level::INFO,
            "controller.watch",
            operation = "watch_loop"
        );

        info!(
            concurrency = config.max_concurrent_reconciliations,
            namespace = config.watch_namespace.as_deref().unwrap_or("*"),
            "Starting controller watch loop..."
        );

        Controller::new(users.clone(), watcher::Config::default().any_semantic())
            .with_config(
                controller::Config::default().concurrency(config.max_concurrent_reconciliations),
            )
            .graceful_shutdown_on(shutdown_requested(shutdown.clone()))
            .run(reconcile, handle_reconciliation_error, Arc::clone(&context))
            .for_each(|result| {
                let _guard = watch_span.enter();
                match result {
                    Ok((object, action)) => {
                        debug!(resource = %object, action = ?action, "watch.event.reconciled");
                    }
                    Err(e) => {
                        warn!(error = %e, "Controller stream error");
                    }
                }
                futures::future::ready(())
            })
            .await;

        if *shutdown.borrow() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let delay = config.watch_restart_delay_duration();
        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            delay.as_secs()
        );
        tokio::time::sleep(delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}

/// Completes on SIGINT, or on SIGTERM where the platform has it
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}

/// Flip readiness and broadcast shutdown once `signal` completes
///
/// Readiness drops first so probes stop routing while in-flight work drains.
fn spawn_shutdown_on<F>(signal: F, server_state: Arc<ServerState>) -> watch::Receiver<bool>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        signal.await;
        info!("Received shutdown signal, initiating graceful shutdown...");
        server_state.set_ready(false);
        let _ = tx.send(true);
    });
    rx
}

fn spawn_shutdown_listener(server_state: Arc<ServerState>) -> watch::Receiver<bool> {
    spawn_shutdown_on(shutdown_signal(), server_state)
}

/// Resolves once shutdown has been broadcast
fn shutdown_requested(
    mut shutdown: watch::Receiver<bool>,
) -> impl Future<Output = ()> + Send + Sync + 'static {
    async move {
        loop {
            let requested = *shutdown.borrow_and_update();
            if requested {
                return;
            }
            if shutdown.changed().await.is_err() {
                // Sender gone without a broadcast; never trigger
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_signal_marks_not_ready_and_triggers_shutdown() {
        let state = Arc::new(ServerState::new());
        state.set_ready(true);
        let (fire, signal) = oneshot::channel::<()>();
        let shutdown = spawn_shutdown_on(
            async move {
                let _ = signal.await;
            },
            Arc::clone(&state),
        );
        let trigger = shutdown_requested(shutdown.clone());

        fire.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), trigger)
            .await
            .expect("shutdown trigger should resolve after the signal");

        assert!(*shutdown.borrow());
        assert!(!state.is_ready());
    }

    #[tokio::test]
    async fn test_no_signal_keeps_running() {
        let state = Arc::new(ServerState::new());
        state.set_ready(true);
        let shutdown = spawn_shutdown_on(std::future::pending::<()>(), Arc::clone(&state));

        let trigger = shutdown_requested(shutdown.clone());
        assert!(tokio::time::timeout(Duration::from_millis(50), trigger)
            .await
            .is_err());
        assert!(!*shutdown.borrow());
        assert!(state.is_ready());
    }

    #[tokio::test]
    async fn test_trigger_created_after_broadcast_resolves() {
        let state = Arc::new(ServerState::new());
        let shutdown = spawn_shutdown_on(async {}, Arc::clone(&state));
        tokio::time::timeout(Duration::from_secs(5), shutdown_requested(shutdown.clone()))
            .await
            .expect("first trigger should resolve");

        // A restarted controller sees the shutdown immediately
        tokio::time::timeout(Duration::from_secs(5), shutdown_requested(shutdown))
            .await
            .expect("late trigger should resolve");
    }
}
