//! Stripe relay web server.
//!
//! Receives Stripe webhooks, verifies them, and forwards allowed events to
//! the configured destination.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relay::web::router;
use relay::{AppState, Config, HttpTransport};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("relay_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        stripe_secret_configured = config.stripe_webhook_secret.is_some(),
        forward_url_configured = config.forward_url.is_some(),
        forward_secret_configured = config.forward_shared_secret.is_some(),
        allowed_event_types = ?config.allowed_event_types,
        signature_tolerance_secs = config.signature_tolerance_secs,
        forward_timeout_ms = config.forward_timeout_ms,
        "config_loaded"
    );
    config.log_missing();

    let transport = HttpTransport::new(Duration::from_millis(config.forward_timeout_ms))
        .context("Failed to create HTTP client")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, transport));

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "relay_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("relay_shutdown_complete");

    Ok(())
}

/// Resolve once SIGINT or SIGTERM arrives.
///
/// A signal that cannot be listened for is logged and never fires.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, signal = "SIGINT", "signal_handler_unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, signal = "SIGTERM", "signal_handler_unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = interrupt => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    info!(signal = received, "relay_shutting_down");
}
