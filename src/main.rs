// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use edgelake_operator::config::Config;
use edgelake_operator::kubernetes::wait_for_edgelake_crd;
use edgelake_operator::reconcilers::EdgeLakeReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting EdgeLake operator");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: watch_namespace={}, resync_interval={:?}",
        config.watch_namespace.as_deref().unwrap_or("<all>"),
        config.resync_interval
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    info!("Waiting for EdgeLakeOperator CRD to become available...");
    wait_for_edgelake_crd(&client).await?;

    EdgeLakeReconciler::new(client, config).run().await?;

    info!("EdgeLake operator shut down");
    Ok(())
}
