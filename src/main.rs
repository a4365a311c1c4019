// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use capi_operator::{
    config::OperatorConfig,
    constants::{DEFAULT_LEASE_GRACE_SECS, TOKIO_WORKER_THREADS},
    context::{build_http_client, install_crypto_provider, Context},
    crd::v1alpha2::{
        AddonProvider, BootstrapProvider, ControlPlaneProvider, CoreProvider, IPAMProvider,
        InfrastructureProvider, RuntimeExtensionProvider,
    },
    http_server::{self, Readiness},
    metrics,
    provider_controller::run_provider_controller,
};
use clap::Parser;
use kube::Client;
use kube_lease_manager::LeaseManagerBuilder;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

fn main() -> Result<()> {
    let config = OperatorConfig::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("capi-operator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

fn init_tracing() {
    // Respects RUST_LOG, defaulting to INFO.
    // RUST_LOG_FORMAT=json switches to structured output.
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
}

async fn async_main(config: OperatorConfig) -> Result<()> {
    init_tracing();

    info!("Starting Cluster API provider operator");
    debug!(watch_namespace = ?config.watch_namespace, leader_elect = config.leader_elect, "Configuration loaded");

    install_crypto_provider();

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let context = Arc::new(Context::new(
        client.clone(),
        build_http_client()?,
        config.github_token.clone(),
        config.phase_settings(),
        config.watch_namespace.clone(),
    ));
    let readiness = Readiness::default();

    let controllers = async {
        if config.leader_elect {
            run_as_leader(&config, client, context, readiness.clone()).await
        } else {
            run_controllers(context, readiness.clone()).await
        }
    };

    tokio::select! {
        result = controllers => result,
        result = http_server::serve(config.metrics_bind_address, readiness.clone()) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("metrics server exited unexpectedly without error")
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping controllers");
            readiness.set_ready(false);
            Ok(())
        }
    }
}

/// Hold the leader lease while the controllers run.
///
/// Controllers start only after the lease is acquired. Losing it ends the
/// process so the new leader takes over.
async fn run_as_leader(
    config: &OperatorConfig,
    client: Client,
    context: Arc<Context>,
    readiness: Readiness,
) -> Result<()> {
    let identity = OperatorConfig::leader_identity();
    let manager = LeaseManagerBuilder::new(client, config.leader_election_id.as_str())
        .with_namespace(config.leader_election_namespace.as_str())
        .with_identity(identity.as_str())
        .with_duration(config.lease_duration_seconds)
        .with_grace(DEFAULT_LEASE_GRACE_SECS)
        .build()
        .await
        .context("failed to create leader lease manager")?;
    let (mut channel, lease_task) = manager.watch().await;

    info!(
        "Waiting for leader lease {}/{} as {}",
        config.leader_election_namespace, config.leader_election_id, identity
    );
    while !*channel.borrow_and_update() {
        channel
            .changed()
            .await
            .context("leader lease watcher stopped")?;
    }
    metrics::record_leader_elected(&identity);
    info!("Acquired leader lease, starting controllers");

    let result = tokio::select! {
        result = run_controllers(context, readiness) => result,
        result = wait_for_lease_loss(&mut channel) => {
            metrics::record_leader_lost(&identity);
            warn!("Lost leader lease, shutting down");
            result?;
            anyhow::bail!("leader lease lost")
        }
    };

    drop(channel);
    if let Err(e) = lease_task.await {
        warn!("Leader lease task did not stop cleanly: {e}");
    }
    result
}

async fn wait_for_lease_loss(channel: &mut watch::Receiver<bool>) -> Result<()> {
    while *channel.borrow_and_update() {
        channel
            .changed()
            .await
            .context("leader lease watcher stopped")?;
    }
    Ok(())
}

async fn run_controllers(context: Arc<Context>, readiness: Readiness) -> Result<()> {
    info!("Starting all provider controllers");
    readiness.set_ready(true);

    // Controllers should never exit - if one does, the process exits with it
    tokio::select! {
        result = run_provider_controller::<CoreProvider>(context.clone()) => {
            error!("CRITICAL: CoreProvider controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("CoreProvider controller exited unexpectedly without error")
        }
        result = run_provider_controller::<BootstrapProvider>(context.clone()) => {
            error!("CRITICAL: BootstrapProvider controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("BootstrapProvider controller exited unexpectedly without error")
        }
        result = run_provider_controller::<ControlPlaneProvider>(context.clone()) => {
            error!("CRITICAL: ControlPlaneProvider controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("ControlPlaneProvider controller exited unexpectedly without error")
        }
        result = run_provider_controller::<InfrastructureProvider>(context.clone()) => {
            error!("CRITICAL: InfrastructureProvider controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("InfrastructureProvider controller exited unexpectedly without error")
        }
        result = run_provider_controller::<IPAMProvider>(context.clone()) => {
            error!("CRITICAL: IPAMProvider controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("IPAMProvider controller exited unexpectedly without error")
        }
        result = run_provider_controller::<AddonProvider>(context.clone()) => {
            error!("CRITICAL: AddonProvider controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("AddonProvider controller exited unexpectedly without error")
        }
        result = run_provider_controller::<RuntimeExtensionProvider>(context) => {
            error!("CRITICAL: RuntimeExtensionProvider controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("RuntimeExtensionProvider controller exited unexpectedly without error")
        }
    }
}
