// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `operator.cluster.x-k8s.io/v1alpha2` provider resources (storage version).
//!
//! # Example
//!
//! ```yaml
//! apiVersion: operator.cluster.x-k8s.io/v1alpha2
//! kind: InfrastructureProvider
//! metadata:
//!   name: docker
//!   namespace: capd-system
//! spec:
//!   version: v1.6.0
//!   configSecret:
//!     name: docker-variables
//!   manager:
//!     featureGates:
//!       MachinePool: true
//!   deployment:
//!     containers:
//!       - name: manager
//!         imageUrl: registry.example.com/capd-manager:v1.6.0
//! ```

use super::{
    ConfigmapReference, ControllerConfigurationSpec, ControllerHealth, ControllerMetrics,
    ControllerWebhook, FetchConfiguration, LeaderElectionConfiguration, ProviderStatus,
};
use k8s_openapi::api::core::v1::{
    Affinity, EnvVar, LocalObjectReference, ResourceRequirements, Toleration,
};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Desired state shared by every provider kind.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    /// Target release version (semver). Empty means the repository default.
    #[serde(default)]
    pub version: String,

    /// Tuning of the provider's controller manager.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<ManagerSpec>,

    /// Mutations applied to the provider's Deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentSpec>,

    /// Secret whose keys become variables for manifest processing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_secret: Option<SecretReference>,

    /// Where to fetch components from. Defaults to the built-in provider registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_config: Option<FetchConfiguration>,

    /// `ConfigMap` holding extra YAML under the `manifests` key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_manifests: Option<ConfigmapReference>,

    /// JSON merge patches applied to matching components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_patches: Option<Vec<String>>,

    /// Manager and deployment overrides for deployments other than the main one,
    /// keyed by deployment name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_deployments: Option<BTreeMap<String, AdditionalDeployments>>,
}

/// Reference to a Secret; namespace defaults to the provider's.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Overrides for one additional deployment.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalDeployments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<ManagerSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentSpec>,
}

/// Controller manager flags derived from the spec.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<ControllerConfigurationSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_reconciles: Option<i32>,

    /// Restricts the manager cache to one namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<ControllerHealth>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_election: Option<LeaderElectionConfiguration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ControllerMetrics>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<ControllerWebhook>,

    /// Go-style duration, e.g. `10m`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_period: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiler_address: Option<String>,

    /// Log verbosity; 1 is the manager default and emits no flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_gates: Option<BTreeMap<String, bool>>,

    /// Extra `--key=value` flags, applied after everything else.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_args: Option<BTreeMap<String, String>>,
}

/// Mutations applied to a provider Deployment.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerations: Option<Vec<Toleration>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containers: Option<Vec<ContainerSpec>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_secrets: Option<Vec<LocalObjectReference>>,
}

/// Per-container overrides, matched by container name.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    pub name: String,

    /// Full image reference, `{repository}/{name}:{tag}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Flags upserted as `--key=value`; `namespace` is ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

/// Declares one provider kind backed by the shared [`ProviderSpec`].
macro_rules! provider_kind {
    ($(#[$doc:meta])* $spec:ident, $kind:tt, $plural:tt) => {
        $(#[$doc])*
        #[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
        #[kube(
            group = "operator.cluster.x-k8s.io",
            version = "v1alpha2",
            kind = $kind,
            plural = $plural,
            namespaced,
            status = "ProviderStatus",
            derive = "PartialEq",
            derive = "Default",
            category = "cluster-api",
            printcolumn = r#"{"name":"InstalledVersion","type":"string","jsonPath":".status.installedVersion"}"#,
            printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#
        )]
        pub struct $spec {
            #[serde(flatten)]
            pub provider: ProviderSpec,
        }
    };
}

provider_kind!(
    /// Installs the Cluster API core controller. At most one may exist.
    CoreProviderSpec,
    "CoreProvider",
    "coreproviders"
);

provider_kind!(
    /// Installs a bootstrap provider.
    BootstrapProviderSpec,
    "BootstrapProvider",
    "bootstrapproviders"
);

provider_kind!(
    /// Installs a control plane provider.
    ControlPlaneProviderSpec,
    "ControlPlaneProvider",
    "controlplaneproviders"
);

provider_kind!(
    /// Installs an infrastructure provider.
    InfrastructureProviderSpec,
    "InfrastructureProvider",
    "infrastructureproviders"
);

provider_kind!(
    /// Installs an IP address management provider.
    IPAMProviderSpec,
    "IPAMProvider",
    "ipamproviders"
);

provider_kind!(
    /// Installs an add-on provider.
    AddonProviderSpec,
    "AddonProvider",
    "addonproviders"
);

provider_kind!(
    /// Installs a runtime extension provider.
    RuntimeExtensionProviderSpec,
    "RuntimeExtensionProvider",
    "runtimeextensionproviders"
);
