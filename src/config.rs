// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line configuration of the operator binary.
//!
//! Every flag falls back to an environment variable so the Deployment can be
//! configured either way.

use crate::constants::{
    DEFAULT_LEADER_ELECTION_ID, DEFAULT_LEADER_ELECTION_NAMESPACE, DEFAULT_LEASE_DURATION_SECS,
    DEFAULT_METRICS_BIND_ADDRESS,
};
use crate::context::PhaseSettings;
use crate::duration::parse_duration;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Cluster API provider operator.
#[derive(Debug, Clone, Parser)]
#[command(name = "capi-operator", version, about)]
pub struct OperatorConfig {
    /// Address the metrics and health endpoints listen on
    #[arg(long, env = "METRICS_BIND_ADDRESS", default_value = DEFAULT_METRICS_BIND_ADDRESS)]
    pub metrics_bind_address: SocketAddr,

    /// Run controllers only while holding the leader lease
    #[arg(long, env = "LEADER_ELECT", default_value_t = false)]
    pub leader_elect: bool,

    /// Namespace of the leader lease
    #[arg(long, env = "POD_NAMESPACE", default_value = DEFAULT_LEADER_ELECTION_NAMESPACE)]
    pub leader_election_namespace: String,

    /// Name of the leader lease
    #[arg(long, env = "LEADER_ELECTION_ID", default_value = DEFAULT_LEADER_ELECTION_ID)]
    pub leader_election_id: String,

    /// Lease duration in seconds
    #[arg(long, env = "LEASE_DURATION_SECONDS", default_value_t = DEFAULT_LEASE_DURATION_SECS)]
    pub lease_duration_seconds: u64,

    /// How long to wait for each provider Deployment to become available
    #[arg(long, env = "DEPLOYMENT_WAIT_TIMEOUT", default_value = "5m", value_parser = parse_duration)]
    pub deployment_wait_timeout: Duration,

    /// Requeue interval after a failed phase
    #[arg(long, env = "PREFLIGHT_REQUEUE_AFTER", default_value = "30s", value_parser = parse_duration)]
    pub preflight_requeue_after: Duration,

    /// Token for GitHub release downloads
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Watch a single namespace instead of the whole cluster
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub watch_namespace: Option<String>,
}

impl OperatorConfig {
    /// Timing settings handed to the phase engine.
    #[must_use]
    pub fn phase_settings(&self) -> PhaseSettings {
        PhaseSettings {
            deployment_wait_timeout: self.deployment_wait_timeout,
            preflight_requeue_after: self.preflight_requeue_after,
        }
    }

    /// Identity of this replica in the leader lease.
    ///
    /// Uses `POD_NAME` when running in a pod, the hostname otherwise.
    #[must_use]
    pub fn leader_identity() -> String {
        std::env::var("POD_NAME")
            .or_else(|_| std::env::var("HOSTNAME"))
            .unwrap_or_else(|_| "capi-operator".to_string())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
