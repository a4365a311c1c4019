// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for Cluster API provider management.
//!
//! Every provider role is its own namespaced kind, and all kinds share the same
//! `ProviderSpec`/`ProviderStatus` payload.
//!
//! # Resource Types
//!
//! - `CoreProvider` - the Cluster API core controller (singleton)
//! - `BootstrapProvider` - machine bootstrap (e.g., kubeadm)
//! - `ControlPlaneProvider` - control plane management (e.g., kubeadm)
//! - `InfrastructureProvider` - infrastructure (e.g., aws, docker)
//! - `IPAMProvider` - IP address management
//! - `AddonProvider` - cluster add-ons (e.g., helm)
//! - `RuntimeExtensionProvider` - runtime extensions
//!
//! # API Versions
//!
//! - [`v1alpha2`] is the storage (hub) version and the one the operator reconciles.
//! - [`v1alpha1`] is still served; [`conversion`] maps between the two.
//!
//! # Example: Creating a Core Provider
//!
//! ```rust,no_run
//! use capi_operator::crd::v1alpha2::{CoreProvider, CoreProviderSpec, ProviderSpec};
//!
//! let provider = CoreProvider::new(
//!     "cluster-api",
//!     CoreProviderSpec {
//!         provider: ProviderSpec {
//!             version: "v1.6.0".to_string(),
//!             ..Default::default()
//!         },
//!     },
//! );
//! ```

pub mod conversion;
pub mod image;
pub mod v1alpha1;
pub mod v1alpha2;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Condition represents an observation of a provider's current state.
///
/// `severity` is only meaningful when `status` is `False`.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition: Ready, `PreflightCheck` or `ProviderInstalled`.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Severity of a False condition: Error, Warning or Info.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Observed state shared by every provider kind and both API versions.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    /// Cluster API contract supported by the installed version (e.g. `v1beta1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Version of the components currently installed in the cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<String>,
}

/// Where to fetch provider components from. At most one of `url` and `selector`.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchConfiguration {
    /// Release URL, e.g.
    /// `https://github.com/kubernetes-sigs/cluster-api/releases/latest/core-components.yaml`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Label selector for `ConfigMaps` in the provider namespace holding
    /// `metadata` and `components` for one version each.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
}

/// Reference to a `ConfigMap`; namespace defaults to the provider's.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigmapReference {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Controller runtime tuning.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfigurationSpec {
    /// Per group-kind reconcile concurrency, keyed by kind (e.g. `Cluster`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_kind_concurrency: Option<BTreeMap<String, i32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_sync_timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recover_panic: Option<bool>,
}

/// Health probe configuration of the manager.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ControllerHealth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_probe_bind_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_endpoint_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness_endpoint_name: Option<String>,
}

/// Leader election configuration of the manager. Durations use Go syntax (`15s`, `7h`).
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderElectionConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_elect: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renew_deadline: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_period: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_lock: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_namespace: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ControllerMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ControllerWebhook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_dir: Option<String>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
