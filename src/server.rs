// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Metrics and health HTTP endpoint.
//!
//! Serves the Prometheus registry from [`crate::metrics`] and a liveness
//! probe. Nothing here touches the reconciler state.

use crate::constants::{HEALTH_SERVER_PATH, METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH};
use crate::metrics::gather_metrics;
use anyhow::{Context, Result};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tracing::{error, info};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Router with the metrics and health routes.
pub fn routes() -> Router {
    Router::new()
        .route(METRICS_SERVER_PATH, get(handle_metrics))
        .route(HEALTH_SERVER_PATH, get(handle_health))
}

async fn handle_metrics() -> impl IntoResponse {
    match gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            body,
        ),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                "failed to encode metrics".to_string(),
            )
        }
    }
}

async fn handle_health() -> &'static str {
    "ok"
}

/// Serve [`routes`] on `port` until the listener fails.
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server stops.
pub async fn serve(port: u16) -> Result<()> {
    let addr = format!("{METRICS_SERVER_BIND_ADDRESS}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind metrics server to {addr}"))?;

    info!(address = %addr, "Metrics server listening");
    axum::serve(listener, routes())
        .await
        .context("Metrics server stopped")?;

    Ok(())
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod server_tests;
