// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for provider kinds and the generic provider capability set

#[cfg(test)]
mod tests {
    use crate::crd::v1alpha2::{ControlPlaneProvider, CoreProvider};
    use crate::crd::Condition;
    use crate::provider::{GenericProvider, ProviderKind};

    const ALL_KINDS: [ProviderKind; 7] = [
        ProviderKind::Core,
        ProviderKind::Bootstrap,
        ProviderKind::ControlPlane,
        ProviderKind::Infrastructure,
        ProviderKind::Ipam,
        ProviderKind::Addon,
        ProviderKind::RuntimeExtension,
    ];

    #[test]
    fn test_label_values_per_kind() {
        let expected = [
            (ProviderKind::Core, "cluster-api"),
            (ProviderKind::Bootstrap, "bootstrap-cluster-api"),
            (ProviderKind::ControlPlane, "control-plane-cluster-api"),
            (ProviderKind::Infrastructure, "infrastructure-cluster-api"),
            (ProviderKind::Ipam, "ipam-cluster-api"),
            (ProviderKind::Addon, "addon-cluster-api"),
            (ProviderKind::RuntimeExtension, "runtime-extension-cluster-api"),
        ];
        for (kind, label) in expected {
            assert_eq!(kind.provider_label_value("cluster-api"), label);
        }
    }

    #[test]
    fn test_display_is_kind_name() {
        for kind in ALL_KINDS {
            assert_eq!(kind.to_string(), kind.kind());
            assert!(kind.kind().ends_with("Provider"));
        }
    }

    #[test]
    fn test_only_core_is_core() {
        let cores: Vec<_> = ALL_KINDS.into_iter().filter(|k| k.is_core()).collect();
        assert_eq!(cores, vec![ProviderKind::Core]);
    }

    #[test]
    fn test_type_slugs() {
        assert_eq!(ProviderKind::ControlPlane.type_slug(), "controlplane");
        assert_eq!(ProviderKind::RuntimeExtension.type_slug(), "runtimeextension");
        assert_eq!(ProviderKind::Ipam.type_slug(), "ipam");
    }

    #[test]
    fn test_status_accessors_create_status_on_demand() {
        let mut provider = CoreProvider::new("cluster-api", Default::default());
        assert!(provider.conditions().is_empty());
        assert_eq!(provider.installed_version(), None);

        provider.set_conditions(vec![Condition {
            r#type: "Ready".to_string(),
            status: "True".to_string(),
            ..Default::default()
        }]);
        provider.provider_status_mut().installed_version = Some("v1.6.0".to_string());

        assert_eq!(provider.conditions().len(), 1);
        assert_eq!(provider.installed_version(), Some("v1.6.0"));
        assert_eq!(<CoreProvider as GenericProvider>::KIND, ProviderKind::Core);
    }

    #[test]
    fn test_owner_reference_requires_uid() {
        let mut provider = ControlPlaneProvider::new("kubeadm", Default::default());
        assert!(provider.owner_reference().is_none());

        provider.metadata.uid = Some("1234".to_string());
        let owner = provider.owner_reference().unwrap();
        assert_eq!(owner.kind, "ControlPlaneProvider");
        assert_eq!(owner.name, "kubeadm");
        assert_eq!(owner.api_version, "operator.cluster.x-k8s.io/v1alpha2");
    }

    #[test]
    fn test_spec_mutation_through_trait() {
        let mut provider = CoreProvider::new("cluster-api", Default::default());
        provider.provider_spec_mut().version = "v1.6.0".to_string();
        assert_eq!(provider.provider_spec().version, "v1.6.0");
    }
}
