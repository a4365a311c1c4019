// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Well-known providers and where their releases live.
//!
//! A provider resource without `fetchConfig` must be listed here. `fetchConfig.url`
//! registers (or overrides) an entry for the lifetime of one reconcile.

use super::{ProviderConfig, RepositoryError};
use crate::provider::ProviderKind;

const WELL_KNOWN: &[(&str, ProviderKind, &str)] = &[
    (
        "cluster-api",
        ProviderKind::Core,
        "https://github.com/kubernetes-sigs/cluster-api/releases/latest/core-components.yaml",
    ),
    (
        "kubeadm",
        ProviderKind::Bootstrap,
        "https://github.com/kubernetes-sigs/cluster-api/releases/latest/bootstrap-components.yaml",
    ),
    (
        "kubeadm",
        ProviderKind::ControlPlane,
        "https://github.com/kubernetes-sigs/cluster-api/releases/latest/control-plane-components.yaml",
    ),
    (
        "talos",
        ProviderKind::Bootstrap,
        "https://github.com/siderolabs/cluster-api-bootstrap-provider-talos/releases/latest/bootstrap-components.yaml",
    ),
    (
        "talos",
        ProviderKind::ControlPlane,
        "https://github.com/siderolabs/cluster-api-control-plane-provider-talos/releases/latest/control-plane-components.yaml",
    ),
    (
        "docker",
        ProviderKind::Infrastructure,
        "https://github.com/kubernetes-sigs/cluster-api/releases/latest/infrastructure-components-development.yaml",
    ),
    (
        "aws",
        ProviderKind::Infrastructure,
        "https://github.com/kubernetes-sigs/cluster-api-provider-aws/releases/latest/infrastructure-components.yaml",
    ),
    (
        "azure",
        ProviderKind::Infrastructure,
        "https://github.com/kubernetes-sigs/cluster-api-provider-azure/releases/latest/infrastructure-components.yaml",
    ),
    (
        "gcp",
        ProviderKind::Infrastructure,
        "https://github.com/kubernetes-sigs/cluster-api-provider-gcp/releases/latest/infrastructure-components.yaml",
    ),
    (
        "vsphere",
        ProviderKind::Infrastructure,
        "https://github.com/kubernetes-sigs/cluster-api-provider-vsphere/releases/latest/infrastructure-components.yaml",
    ),
    (
        "openstack",
        ProviderKind::Infrastructure,
        "https://github.com/kubernetes-sigs/cluster-api-provider-openstack/releases/latest/infrastructure-components.yaml",
    ),
    (
        "metal3",
        ProviderKind::Infrastructure,
        "https://github.com/metal3-io/cluster-api-provider-metal3/releases/latest/infrastructure-components.yaml",
    ),
    (
        "hetzner",
        ProviderKind::Infrastructure,
        "https://github.com/syself/cluster-api-provider-hetzner/releases/latest/infrastructure-components.yaml",
    ),
    (
        "in-cluster",
        ProviderKind::Ipam,
        "https://github.com/kubernetes-sigs/cluster-api-ipam-provider-in-cluster/releases/latest/ipam-components.yaml",
    ),
    (
        "helm",
        ProviderKind::Addon,
        "https://github.com/kubernetes-sigs/cluster-api-addon-provider-helm/releases/latest/addon-components.yaml",
    ),
];

/// Provider name/kind to release URL table.
#[derive(Clone, Debug)]
pub struct ProviderRegistry {
    providers: Vec<ProviderConfig>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self {
            providers: WELL_KNOWN
                .iter()
                .map(|(name, kind, url)| ProviderConfig {
                    name: (*name).to_string(),
                    kind: *kind,
                    url: (*url).to_string(),
                })
                .collect(),
        }
    }
}

impl ProviderRegistry {
    /// Registry with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add a provider, replacing any entry with the same name and kind.
    pub fn register(&mut self, name: &str, kind: ProviderKind, url: &str) {
        self.providers.retain(|p| !(p.name == name && p.kind == kind));
        self.providers.push(ProviderConfig {
            name: name.to_string(),
            kind,
            url: url.to_string(),
        });
    }

    /// Look up a provider.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::UnknownProvider`] if no entry matches.
    pub fn get(&self, name: &str, kind: ProviderKind) -> Result<ProviderConfig, RepositoryError> {
        self.providers
            .iter()
            .find(|p| p.name == name && p.kind == kind)
            .cloned()
            .ok_or_else(|| RepositoryError::UnknownProvider {
                name: name.to_string(),
                kind: kind.type_slug().to_string(),
            })
    }

    #[must_use]
    pub fn providers(&self) -> &[ProviderConfig] {
        &self.providers
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;
