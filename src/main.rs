// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liquidplanner_mcp::cache::build_cache;
use liquidplanner_mcp::config::{Config, Transport};
use liquidplanner_mcp::handlers::{app_router, AppState};
use liquidplanner_mcp::health::HealthChecker;
use liquidplanner_mcp::liquidplanner::LiquidPlannerClient;
use liquidplanner_mcp::mcp::tools::{build_registry, ToolSettings};
use liquidplanner_mcp::mcp::LiquidPlannerMcp;
use liquidplanner_mcp::metrics::Metrics;
use rmcp::ServiceExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config);

    tracing::info!(
        transport = ?config.mcp_transport,
        workspace_id = config.lp_workspace_id,
        config = %config.redacted(),
        "starting liquidplanner-mcp"
    );

    let metrics = Metrics::new();
    let cache = build_cache(&config).await;
    let client = Arc::new(LiquidPlannerClient::new(&config, cache, metrics.clone())?);
    client
        .verify_credentials()
        .await
        .context("Server initialization failed")?;
    let registry = Arc::new(build_registry(
        client.clone(),
        ToolSettings::from_config(&config),
        metrics.clone(),
    ));
    tracing::info!(tools = registry.len(), "tool registry ready");

    if config.mcp_transport == Transport::Stdio {
        let server = LiquidPlannerMcp::new(registry, "stdio");
        let service = server.serve(rmcp::transport::io::stdio()).await?;
        tracing::info!("serving MCP over stdio");
        service.waiting().await?;
        tracing::info!("liquidplanner-mcp stopped");
        return Ok(());
    }

    // Create shutdown broadcast channel
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Spawn health checker task
    let health_checker = Arc::new(HealthChecker::new(
        client,
        Duration::from_secs(config.health_check_interval_secs),
    ));
    let app_state = AppState::new(health_checker.state());
    let health_shutdown_rx = shutdown_tx.subscribe();
    let health_checker_clone = Arc::clone(&health_checker);
    tokio::spawn(async move {
        health_checker_clone.run(health_shutdown_rx).await;
    });

    let app = app_router(registry, app_state.clone(), metrics);

    // Create TCP listener
    let addr: SocketAddr = format!("{}:{}", config.mcp_host, config.mcp_port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "listening for connections");

    // Spawn graceful shutdown handler
    let shutdown_tx_clone = shutdown_tx.clone();
    let shutting_down = Arc::clone(&app_state.shutting_down);
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received, initiating graceful shutdown");

        // readiness probe reports 503 from here on
        shutting_down.store(true, Ordering::SeqCst);

        let _ = shutdown_tx_clone.send(());
    });

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let mut rx = shutdown_tx.subscribe();
            let _ = rx.recv().await;
        })
        .await?;

    tracing::info!("liquidplanner-mcp stopped");
    Ok(())
}

/// Initialize tracing based on configuration.
///
/// Logs go to stderr so stdout stays free for the stdio transport.
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
