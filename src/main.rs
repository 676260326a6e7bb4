// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::Parser;
use dnshortcut::{
    config::Args, constants::TOKIO_WORKER_THREADS, context::ReconcilerContext,
    publisher::ConfigMapPublisher, server, watchers,
};
use kube::Client;
use std::sync::Arc;
use tracing::{debug, error, info};

fn main() -> Result<()> {
    let args = Args::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("dnshortcut")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    // Format: timestamp file:line LEVEL message
    //
    // Respects RUST_LOG environment variable if set, otherwise defaults to INFO level
    // Respects RUST_LOG_FORMAT environment variable for output format (text or json)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting dnshortcut");

    let settings = args.reconciler_settings()?;
    let adapters = args.adapters()?;
    info!(
        format = %settings.format,
        configmap = %format!("{}/{}", settings.target.namespace, settings.target.name),
        key = %settings.target.key,
        debounce_secs = settings.debounce.as_secs(),
        adapters = adapters.len(),
        "Configuration loaded"
    );

    // A client that cannot authenticate is fatal; nothing can be watched without it
    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await.map_err(|e| {
        error!("CRITICAL: Failed to create Kubernetes client: {e}");
        e
    })?;
    debug!("Kubernetes client initialized successfully");

    let publisher = Arc::new(ConfigMapPublisher::new(client.clone()));
    let (ctx, scheduler) = ReconcilerContext::new(publisher, settings);

    // None of these should ever return; if one does, exit the process
    tokio::select! {
        () = scheduler.run() => {
            error!("CRITICAL: Reconcile scheduler exited unexpectedly");
            anyhow::bail!("Reconcile scheduler exited unexpectedly")
        }
        result = watchers::run(client, ctx.clone(), adapters) => {
            error!("CRITICAL: Watchers exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Watchers exited unexpectedly without error")
        }
        result = server::serve(args.metrics_port) => {
            error!("CRITICAL: Metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
    }
}
