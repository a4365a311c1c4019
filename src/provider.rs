// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Polymorphic access to the seven provider kinds.
//!
//! Every hub kind implements [`GenericProvider`], so the phase engine and the
//! controller are written once and dispatch on [`ProviderKind`] only where the
//! kinds genuinely differ (delete label prefix, cache `ConfigMap` type, singleton rule).

use crate::constants::{
    KIND_ADDON_PROVIDER, KIND_BOOTSTRAP_PROVIDER, KIND_CONTROL_PLANE_PROVIDER,
    KIND_CORE_PROVIDER, KIND_INFRASTRUCTURE_PROVIDER, KIND_IPAM_PROVIDER,
    KIND_RUNTIME_EXTENSION_PROVIDER,
};
use crate::crd::v1alpha2::{
    AddonProvider, BootstrapProvider, ControlPlaneProvider, CoreProvider, IPAMProvider,
    InfrastructureProvider, ProviderSpec, RuntimeExtensionProvider,
};
use crate::crd::{Condition, ProviderStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::core::NamespaceResourceScope;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::fmt::Debug;

/// Role a provider plays in Cluster API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Core,
    Bootstrap,
    ControlPlane,
    Infrastructure,
    Ipam,
    Addon,
    RuntimeExtension,
}

impl ProviderKind {
    /// Kubernetes kind name, e.g. `CoreProvider`.
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            ProviderKind::Core => KIND_CORE_PROVIDER,
            ProviderKind::Bootstrap => KIND_BOOTSTRAP_PROVIDER,
            ProviderKind::ControlPlane => KIND_CONTROL_PLANE_PROVIDER,
            ProviderKind::Infrastructure => KIND_INFRASTRUCTURE_PROVIDER,
            ProviderKind::Ipam => KIND_IPAM_PROVIDER,
            ProviderKind::Addon => KIND_ADDON_PROVIDER,
            ProviderKind::RuntimeExtension => KIND_RUNTIME_EXTENSION_PROVIDER,
        }
    }

    /// Short type used in cache `ConfigMap` names and labels.
    #[must_use]
    pub const fn type_slug(self) -> &'static str {
        match self {
            ProviderKind::Core => "core",
            ProviderKind::Bootstrap => "bootstrap",
            ProviderKind::ControlPlane => "controlplane",
            ProviderKind::Infrastructure => "infrastructure",
            ProviderKind::Ipam => "ipam",
            ProviderKind::Addon => "addon",
            ProviderKind::RuntimeExtension => "runtimeextension",
        }
    }

    /// Prefix of the `cluster.x-k8s.io/provider` label value. Empty for core.
    #[must_use]
    pub const fn label_prefix(self) -> &'static str {
        match self {
            ProviderKind::Core => "",
            ProviderKind::Bootstrap => "bootstrap-",
            ProviderKind::ControlPlane => "control-plane-",
            ProviderKind::Infrastructure => "infrastructure-",
            ProviderKind::Ipam => "ipam-",
            ProviderKind::Addon => "addon-",
            ProviderKind::RuntimeExtension => "runtime-extension-",
        }
    }

    /// Value of the `cluster.x-k8s.io/provider` label stamped on this provider's components.
    ///
    /// ```
    /// use capi_operator::provider::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::Core.provider_label_value("cluster-api"), "cluster-api");
    /// assert_eq!(ProviderKind::Infrastructure.provider_label_value("aws"), "infrastructure-aws");
    /// ```
    #[must_use]
    pub fn provider_label_value(self, name: &str) -> String {
        format!("{}{name}", self.label_prefix())
    }

    #[must_use]
    pub const fn is_core(self) -> bool {
        matches!(self, ProviderKind::Core)
    }

}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Capability set shared by every hub provider kind.
///
/// Name, namespace, owner references, finalizers and the deletion timestamp come
/// from [`Resource`]/`ResourceExt`; this trait adds the spec, status and kind tag.
pub trait GenericProvider:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + DeserializeOwned
    + Serialize
    + Send
    + Sync
    + 'static
{
    const KIND: ProviderKind;

    fn provider_spec(&self) -> &ProviderSpec;

    fn provider_spec_mut(&mut self) -> &mut ProviderSpec;

    fn provider_status(&self) -> Option<&ProviderStatus>;

    /// Status, created empty on first access.
    fn provider_status_mut(&mut self) -> &mut ProviderStatus;

    fn set_provider_status(&mut self, status: Option<ProviderStatus>);

    fn conditions(&self) -> &[Condition] {
        self.provider_status()
            .map(|status| status.conditions.as_slice())
            .unwrap_or_default()
    }

    fn set_conditions(&mut self, conditions: Vec<Condition>) {
        self.provider_status_mut().conditions = conditions;
    }

    fn installed_version(&self) -> Option<&str> {
        self.provider_status()
            .and_then(|status| status.installed_version.as_deref())
    }

    /// Owner reference pointing at this provider, or `None` before it has a uid.
    fn owner_reference(&self) -> Option<OwnerReference> {
        self.owner_ref(&())
    }
}

macro_rules! generic_provider {
    ($ty:ty, $kind:expr) => {
        impl GenericProvider for $ty {
            const KIND: ProviderKind = $kind;

            fn provider_spec(&self) -> &ProviderSpec {
                &self.spec.provider
            }

            fn provider_spec_mut(&mut self) -> &mut ProviderSpec {
                &mut self.spec.provider
            }

            fn provider_status(&self) -> Option<&ProviderStatus> {
                self.status.as_ref()
            }

            fn provider_status_mut(&mut self) -> &mut ProviderStatus {
                self.status.get_or_insert_with(ProviderStatus::default)
            }

            fn set_provider_status(&mut self, status: Option<ProviderStatus>) {
                self.status = status;
            }
        }
    };
}

generic_provider!(CoreProvider, ProviderKind::Core);
generic_provider!(BootstrapProvider, ProviderKind::Bootstrap);
generic_provider!(ControlPlaneProvider, ProviderKind::ControlPlane);
generic_provider!(InfrastructureProvider, ProviderKind::Infrastructure);
generic_provider!(IPAMProvider, ProviderKind::Ipam);
generic_provider!(AddonProvider, ProviderKind::Addon);
generic_provider!(RuntimeExtensionProvider, ProviderKind::RuntimeExtension);

#[cfg(test)]
#[path = "provider_tests.rs"]
mod provider_tests;
