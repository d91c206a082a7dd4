use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediasync::config::{self, ListingMode};
use mediasync::listing::{CacheListing, ListingSource, RegistryListing};
use mediasync::metrics::Metrics;
use mediasync::scanner::{ContentCache, Monitor, Registry};
use mediasync::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging (stdout + daily rotated file under ./logs)
    std::fs::create_dir_all("logs").ok();
    let (stdout_nb, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let file_appender = tracing_appender::rolling::daily("logs", "mediasync.log");
    let (file_nb, file_guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(stdout_nb))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_nb))
        .init();
    // Keep the guards alive so the non-blocking writers flush on exit
    let _log_guards = (stdout_guard, file_guard);

    // Load configuration (embedded defaults -> mediasync.toml -> env/.env)
    let app_cfg = config::load().context("can't get configuration")?;

    let cache = Arc::new(ContentCache::new());
    let metrics = Metrics::new();
    let mut monitors: Vec<Monitor> = Vec::new();

    let listing: Arc<dyn ListingSource> = match app_cfg.listing.source {
        ListingMode::Registry => {
            let registry = Registry::new(cache.clone());
            for fp in &app_cfg.file_paths {
                registry.register(&fp.serve_path, &fp.disk_path).with_context(|| {
                    format!("couldn't register {} at {}", fp.disk_path, fp.serve_path)
                })?;
            }
            Arc::new(RegistryListing::new(Arc::new(registry)))
        }
        ListingMode::Cache => {
            for fp in &app_cfg.file_paths {
                let mut monitor = Monitor::new(
                    &fp.disk_path,
                    app_cfg.monitor.interval(),
                    cache.clone(),
                    metrics.clone(),
                )
                .await
                .with_context(|| format!("couldn't monitor {}", fp.disk_path))?;
                monitor.start()?;
                monitors.push(monitor);
            }
            Arc::new(CacheListing::new(cache.clone()))
        }
    };
    info!(source = listing.name(), roots = app_cfg.file_paths.len(), "listing source ready");

    let host = app_cfg.server.host.clone();
    let port = app_cfg.server.port;
    let state = AppState::new(app_cfg, cache, listing, metrics);
    let app = mediasync::build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid listen addr {}:{} - {}", host, port, e))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("MediaSync listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    for monitor in &mut monitors {
        if let Err(e) = monitor.stop().await {
            tracing::error!(root = %monitor.root().path.display(), error = %e, "couldn't stop monitor");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received. Stopping server...");
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received. Stopping server...");
}
