// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the provider registry

#[cfg(test)]
mod tests {
    use crate::provider::ProviderKind;
    use crate::repository::registry::ProviderRegistry;
    use crate::repository::RepositoryError;

    #[test]
    fn test_well_known_providers() {
        let registry = ProviderRegistry::default();
        let core = registry.get("cluster-api", ProviderKind::Core).unwrap();
        assert!(core.url.ends_with("/core-components.yaml"));

        let bootstrap = registry.get("kubeadm", ProviderKind::Bootstrap).unwrap();
        let control_plane = registry.get("kubeadm", ProviderKind::ControlPlane).unwrap();
        assert_ne!(bootstrap.url, control_plane.url);
    }

    #[test]
    fn test_name_must_match_kind() {
        let registry = ProviderRegistry::default();
        assert!(matches!(
            registry.get("aws", ProviderKind::Bootstrap),
            Err(RepositoryError::UnknownProvider { .. })
        ));
    }

    #[test]
    fn test_register_overrides_entry() {
        let mut registry = ProviderRegistry::default();
        let before = registry.providers().len();
        registry.register(
            "aws",
            ProviderKind::Infrastructure,
            "https://github.com/me/fork/releases/latest/infrastructure-components.yaml",
        );

        assert_eq!(registry.providers().len(), before);
        assert!(registry
            .get("aws", ProviderKind::Infrastructure)
            .unwrap()
            .url
            .contains("me/fork"));
    }

    #[test]
    fn test_empty_registry_knows_only_registered() {
        let mut registry = ProviderRegistry::empty();
        assert!(registry.get("cluster-api", ProviderKind::Core).is_err());
        registry.register("custom", ProviderKind::Addon, "https://example.com/x/y/releases/latest/a.yaml");
        let err = registry.get("other", ProviderKind::Addon).unwrap_err();
        assert!(err.to_string().contains("other"));
        assert!(registry.get("custom", ProviderKind::Addon).is_ok());
    }
}
