// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `operator.cluster.x-k8s.io/v1alpha1` provider resources.
//!
//! Served for existing clients but not stored. Differences from `v1alpha2`:
//!
//! - the config secret is split into `secretName`/`secretNamespace`
//! - container images are structured ([`ImageMeta`]) instead of a flat URL
//! - `manifestPatches`, `additionalDeployments` and `manager.additionalArgs` do not exist
//!   and survive a round-trip only through the conversion-data annotation

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

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<ManagerSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_config: Option<FetchConfiguration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_manifests: Option<ConfigmapReference>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<ControllerConfigurationSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_reconciles: Option<i32>,

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

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_period: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiler_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_gates: Option<BTreeMap<String, bool>>,
}

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

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageMeta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

/// Structured container image reference.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageMeta {
    /// Registry and path, e.g. `registry.example.com:5000/team`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

macro_rules! provider_kind {
    ($spec:ident, $kind:tt, $plural:tt) => {
        #[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
        #[kube(
            group = "operator.cluster.x-k8s.io",
            version = "v1alpha1",
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

provider_kind!(CoreProviderSpec, "CoreProvider", "coreproviders");
provider_kind!(BootstrapProviderSpec, "BootstrapProvider", "bootstrapproviders");
provider_kind!(ControlPlaneProviderSpec, "ControlPlaneProvider", "controlplaneproviders");
provider_kind!(InfrastructureProviderSpec, "InfrastructureProvider", "infrastructureproviders");
provider_kind!(IPAMProviderSpec, "IPAMProvider", "ipamproviders");
provider_kind!(AddonProviderSpec, "AddonProvider", "addonproviders");
provider_kind!(
    RuntimeExtensionProviderSpec,
    "RuntimeExtensionProvider",
    "runtimeextensionproviders"
);
