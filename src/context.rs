// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for all provider controllers.
//!
//! Every controller receives an `Arc<Context>` holding:
//! - the Kubernetes client used for finalizers and status patches
//! - the [`PhaseContext`] handed to the phase engine
//!
//! Nothing in here is mutable, so the seven controllers share one instance.

use crate::cluster_client::{ClusterClient, KubeClusterClient};
use crate::constants::{
    DEFAULT_DEPLOYMENT_WAIT_TIMEOUT_SECS, HTTP_REQUEST_TIMEOUT_SECS, HTTP_USER_AGENT,
    PREFLIGHT_FAILED_REQUEUE_AFTER_SECS,
};
use anyhow::{Context as _, Result};
use kube::Client;
use std::sync::Arc;
use std::time::Duration;

/// Shared context passed to all controllers.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Everything the phase engine needs
    pub phase: Arc<PhaseContext>,

    /// Namespace the controllers watch, `None` for all namespaces
    pub watch_namespace: Option<String>,
}

impl Context {
    /// Build the context around a live client.
    #[must_use]
    pub fn new(
        client: Client,
        http_client: reqwest::Client,
        github_token: Option<String>,
        settings: PhaseSettings,
        watch_namespace: Option<String>,
    ) -> Self {
        let cluster: Arc<dyn ClusterClient> = Arc::new(KubeClusterClient::new(client.clone()));
        Self {
            client,
            phase: Arc::new(PhaseContext {
                cluster,
                http_client,
                github_token,
                settings,
            }),
            watch_namespace,
        }
    }
}

/// Collaborators of the phase engine.
///
/// Built once per process. Repositories and the provider registry are not kept
/// here, they are rebuilt on every reconcile.
#[derive(Clone)]
pub struct PhaseContext {
    /// Kubernetes access
    pub cluster: Arc<dyn ClusterClient>,

    /// HTTP client for remote release repositories
    pub http_client: reqwest::Client,

    /// Token sent to GitHub when listing and downloading releases
    pub github_token: Option<String>,

    pub settings: PhaseSettings,
}

/// Timing knobs of the phase engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseSettings {
    /// Upper bound on waiting for each provider Deployment to become available
    pub deployment_wait_timeout: Duration,

    /// Requeue interval after a classified phase failure
    pub preflight_requeue_after: Duration,
}

impl Default for PhaseSettings {
    fn default() -> Self {
        Self {
            deployment_wait_timeout: Duration::from_secs(DEFAULT_DEPLOYMENT_WAIT_TIMEOUT_SECS),
            preflight_requeue_after: Duration::from_secs(PREFLIGHT_FAILED_REQUEUE_AFTER_SECS),
        }
    }
}

/// Install `ring` as the process-wide rustls crypto provider.
///
/// Both kube and reqwest use rustls, and together they compile in more than one
/// backend, so rustls cannot pick one on its own. Must run before the first
/// client is built. Later calls are no-ops.
pub fn install_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        // Err only if another thread installed one first.
        let _ = rustls::crypto::ring::default_provider().install_default();
    }
}

/// HTTP client used for release downloads.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(HTTP_USER_AGENT)
        .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
        .build()
        .context("failed to build HTTP client")
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
