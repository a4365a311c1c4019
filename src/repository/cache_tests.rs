// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for components cache `ConfigMaps`

#[cfg(test)]
mod tests {
    use crate::labels::{COMPRESSED_ANNOTATION, CONFIGMAP_VERSION_LABEL, OPERATOR_MANAGED_LABEL};
    use crate::provider::ProviderKind;
    use crate::repository::cache::{build_cache_config_map, CacheKey};
    use crate::repository::configmap::ConfigMapRepository;
    use crate::repository::Repository;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

    const KEY: CacheKey<'static> = CacheKey {
        kind: ProviderKind::Core,
        name: "cluster-api",
        version: "v1.6.0",
    };

    #[test]
    fn test_name_labels_and_selector() {
        assert_eq!(KEY.config_map_name(), "core-cluster-api-v1.6.0");
        let labels = KEY.labels();
        assert_eq!(labels[CONFIGMAP_VERSION_LABEL], "v1.6.0");
        assert_eq!(labels[OPERATOR_MANAGED_LABEL], "true");
        assert_eq!(KEY.selector().match_labels, Some(labels));
    }

    #[tokio::test]
    async fn test_small_components_stored_as_text() {
        let owner = OwnerReference {
            kind: "CoreProvider".to_string(),
            name: "cluster-api".to_string(),
            ..Default::default()
        };
        let cm = build_cache_config_map(&KEY, "capi-system", b"meta", b"kind: List", Some(owner))
            .unwrap();

        assert_eq!(cm.metadata.namespace.as_deref(), Some("capi-system"));
        assert!(cm.binary_data.is_none());
        assert!(cm.metadata.annotations.is_none());
        assert_eq!(cm.metadata.owner_references.as_ref().unwrap().len(), 1);

        let repo = ConfigMapRepository::new(&[cm]).unwrap();
        assert_eq!(repo.default_version(), "v1.6.0");
        assert_eq!(repo.get_file("v1.6.0", "components.yaml").await.unwrap(), b"kind: List");
    }

    #[tokio::test]
    async fn test_large_components_are_compressed_and_readable() {
        let components = "x".repeat(1_048_577);
        let cm = build_cache_config_map(&KEY, "capi-system", b"meta", components.as_bytes(), None)
            .unwrap();

        assert_eq!(
            cm.metadata.annotations.as_ref().unwrap()[COMPRESSED_ANNOTATION],
            "true"
        );
        assert!(!cm.data.as_ref().unwrap().contains_key("components"));
        assert!(cm.binary_data.as_ref().unwrap()["components"].0.len() < components.len());

        let repo = ConfigMapRepository::new(&[cm]).unwrap();
        assert_eq!(
            repo.get_file("v1.6.0", "components.yaml").await.unwrap().len(),
            components.len()
        );
    }

    #[test]
    fn test_exactly_at_threshold_is_not_compressed() {
        let components = "x".repeat(1_048_576);
        let cm = build_cache_config_map(&KEY, "ns", b"meta", components.as_bytes(), None).unwrap();
        assert!(cm.binary_data.is_none());
    }

    #[test]
    fn test_non_utf8_metadata_is_rejected() {
        assert!(build_cache_config_map(&KEY, "ns", &[0xff, 0xfe], b"c", None).is_err());
    }
}
