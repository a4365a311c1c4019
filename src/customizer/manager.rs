// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller-manager flags derived from `spec.manager`.
//!
//! | Field | Flag |
//! |---|---|
//! | `controller.groupKindConcurrency[k]` | `--{lowercase(k)}-concurrency` |
//! | `maxConcurrentReconciles` | `--max-concurrent-reconciles` |
//! | `cacheNamespace` | `--namespace` |
//! | `health.healthProbeBindAddress` | `--health-addr` |
//! | `leaderElection` (when `leaderElect`) | `--enable-leader-election`, `--leader-election-id`, `--leader-elect-*` |
//! | `metrics.bindAddress` | `--metrics-addr` |
//! | `webhook.{host,port,certDir}` | `--webhook-host`, `--webhook-port`, `--webhook-cert-dir` |
//! | `syncPeriod` | `--sync-period` |
//! | `profilerAddress` | `--profiler-address` |
//! | `verbosity` (unless 1) | `--v` |
//! | `featureGates` | `--feature-gates` |
//! | `additionalArgs` | as given, last |
//!
//! Duration flags are rendered in whole seconds. The liveness and readiness
//! endpoint names rewrite the existing probe paths instead of adding flags.

use super::deployment::{flag_name, set_arg};
use crate::constants::{DEFAULT_MANAGER_VERBOSITY, MANAGER_CONTAINER_NAME};
use crate::crd::v1alpha2::ManagerSpec;
use crate::duration::to_seconds_flag;
use anyhow::{Context, Result};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, Probe};

/// Set flags on the `manager` container of `deployment`.
///
/// A deployment without a `manager` container is left untouched.
///
/// # Errors
///
/// Returns an error if a duration field is not a valid duration.
pub fn customize_manager(spec: &ManagerSpec, deployment: &mut Deployment) -> Result<()> {
    let Some(container) = deployment
        .spec
        .as_mut()
        .and_then(|s| s.template.spec.as_mut())
        .and_then(|p| {
            p.containers
                .iter_mut()
                .find(|c| c.name == MANAGER_CONTAINER_NAME)
        })
    else {
        return Ok(());
    };

    let args = manager_args(spec)?;
    let container_args = container.args.get_or_insert_with(Vec::new);
    for (name, value) in &args {
        set_arg(container_args, name, value);
    }

    rewrite_probe_paths(spec, container);
    Ok(())
}

/// Ordered `(flag, value)` pairs for `spec`.
///
/// # Errors
///
/// Returns an error if a duration field is not a valid duration.
pub fn manager_args(spec: &ManagerSpec) -> Result<Vec<(String, String)>> {
    let mut args: Vec<(String, String)> = Vec::new();
    let mut push = |name: &str, value: String| args.push((name.to_string(), value));

    if let Some(concurrency) = spec
        .controller
        .as_ref()
        .and_then(|c| c.group_kind_concurrency.as_ref())
    {
        for (kind, value) in concurrency {
            push(
                &format!("--{}-concurrency", kind.to_lowercase()),
                value.to_string(),
            );
        }
    }

    if let Some(max) = spec.max_concurrent_reconciles {
        push("--max-concurrent-reconciles", max.to_string());
    }

    if let Some(namespace) = &spec.cache_namespace {
        push("--namespace", namespace.clone());
    }

    if let Some(address) = spec
        .health
        .as_ref()
        .and_then(|h| h.health_probe_bind_address.as_ref())
    {
        push("--health-addr", address.clone());
    }

    if let Some(election) = spec
        .leader_election
        .as_ref()
        .filter(|le| le.leader_elect == Some(true))
    {
        push("--enable-leader-election", "true".to_string());

        if let Some(name) = &election.resource_name {
            let id = match &election.resource_namespace {
                Some(namespace) => format!("{namespace}/{name}"),
                None => name.clone(),
            };
            push("--leader-election-id", id);
        }

        let durations = [
            ("--leader-elect-lease-duration", &election.lease_duration),
            ("--leader-elect-renew-deadline", &election.renew_deadline),
            ("--leader-elect-retry-period", &election.retry_period),
        ];
        for (flag, value) in durations {
            if let Some(value) = value {
                let seconds = to_seconds_flag(value)
                    .with_context(|| format!("invalid duration for {flag}: {value}"))?;
                push(flag, seconds);
            }
        }
    }

    if let Some(address) = spec.metrics.as_ref().and_then(|m| m.bind_address.as_ref()) {
        push("--metrics-addr", address.clone());
    }

    if let Some(webhook) = &spec.webhook {
        if let Some(host) = &webhook.host {
            push("--webhook-host", host.clone());
        }
        if let Some(port) = webhook.port {
            push("--webhook-port", port.to_string());
        }
        if let Some(cert_dir) = &webhook.cert_dir {
            push("--webhook-cert-dir", cert_dir.clone());
        }
    }

    if let Some(sync_period) = &spec.sync_period {
        let seconds = to_seconds_flag(sync_period)
            .with_context(|| format!("invalid duration for --sync-period: {sync_period}"))?;
        push("--sync-period", seconds);
    }

    if let Some(address) = &spec.profiler_address {
        push("--profiler-address", address.clone());
    }

    if let Some(verbosity) = spec
        .verbosity
        .filter(|v| *v != DEFAULT_MANAGER_VERBOSITY)
    {
        push("--v", verbosity.to_string());
    }

    if let Some(gates) = spec.feature_gates.as_ref().filter(|g| !g.is_empty()) {
        // BTreeMap iterates keys in ascending order
        let value = gates
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        push("--feature-gates", value);
    }

    for (name, value) in spec.additional_args.iter().flatten() {
        push(&flag_name(name), value.clone());
    }

    Ok(args)
}

fn rewrite_probe_paths(spec: &ManagerSpec, container: &mut Container) {
    let Some(health) = &spec.health else {
        return;
    };
    if let Some(name) = &health.liveness_endpoint_name {
        set_probe_path(container.liveness_probe.as_mut(), name);
    }
    if let Some(name) = &health.readiness_endpoint_name {
        set_probe_path(container.readiness_probe.as_mut(), name);
    }
}

fn set_probe_path(probe: Option<&mut Probe>, endpoint: &str) {
    if let Some(http_get) = probe.and_then(|p| p.http_get.as_mut()) {
        http_get.path = Some(format!("/{}", endpoint.trim_start_matches('/')));
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod manager_tests;
