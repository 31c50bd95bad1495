//! Category service entry point.

use std::process::ExitCode;

use category_service::{App, Config, LogFormat, ServiceError};
use event_store::InMemoryEventStore;
use slugs::InMemorySlugAllocator;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn run(config: Config) -> Result<(), ServiceError> {
    // 1. Install Prometheus exporter
    let addr = config.metrics_addr()?;
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(%addr, "metrics exporter listening");

    // 2. Wire service and index, seed root, catch up
    let app = App::new(InMemoryEventStore::new(), InMemorySlugAllocator::new());
    app.bootstrap().await?;

    // 3. Keep the index following the store
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut follower = app.spawn_follower(config.index_poll, shutdown_rx);
    tracing::info!(poll_ms = config.index_poll.as_millis() as u64, "category service ready");

    // 4. Wait for shutdown, then drain the follower
    tokio::select! {
        _ = shutdown_signal() => {
            if shutdown_tx.send(true).is_err() {
                tracing::warn!("index follower already stopped");
            }
            follower.await??;
        }
        finished = &mut follower => {
            finished??;
            return Err(ServiceError::FollowerStopped);
        }
    }

    tracing::info!("service shut down gracefully");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            let fallback = Config::default();
            init_tracing(&fallback);
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "category service failed");
            ExitCode::FAILURE
        }
    }
}
