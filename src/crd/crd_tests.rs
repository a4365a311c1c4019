// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for provider CRD types

#[cfg(test)]
mod tests {
    use crate::crd::v1alpha2::{CoreProvider, InfrastructureProvider};
    use crate::crd::{v1alpha1, Condition, ProviderStatus};
    use kube::{CustomResourceExt, Resource};
    use serde_json::json;

    #[test]
    fn test_infrastructure_provider_deserializes_camel_case() {
        let provider: InfrastructureProvider = serde_json::from_value(json!({
            "apiVersion": "operator.cluster.x-k8s.io/v1alpha2",
            "kind": "InfrastructureProvider",
            "metadata": { "name": "docker", "namespace": "capd-system" },
            "spec": {
                "version": "v1.6.0",
                "configSecret": { "name": "docker-variables" },
                "fetchConfig": { "url": "https://github.com/kubernetes-sigs/cluster-api/releases/latest/" },
                "manager": {
                    "maxConcurrentReconciles": 5,
                    "featureGates": { "MachinePool": true }
                },
                "deployment": {
                    "replicas": 2,
                    "containers": [{ "name": "manager", "imageUrl": "quay.io/capd:v1" }]
                },
                "manifestPatches": ["{}"]
            }
        }))
        .unwrap();

        let spec = &provider.spec.provider;
        assert_eq!(spec.version, "v1.6.0");
        assert_eq!(spec.config_secret.as_ref().unwrap().name, "docker-variables");
        assert_eq!(spec.manager.as_ref().unwrap().max_concurrent_reconciles, Some(5));
        assert_eq!(spec.deployment.as_ref().unwrap().replicas, Some(2));
        assert_eq!(
            spec.deployment.as_ref().unwrap().containers.as_ref().unwrap()[0]
                .image_url
                .as_deref(),
            Some("quay.io/capd:v1")
        );
        assert_eq!(spec.manifest_patches.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_version_defaults_to_empty() {
        let provider: CoreProvider = serde_json::from_value(json!({
            "apiVersion": "operator.cluster.x-k8s.io/v1alpha2",
            "kind": "CoreProvider",
            "metadata": { "name": "cluster-api", "namespace": "capi-system" },
            "spec": {}
        }))
        .unwrap();

        assert!(provider.spec.provider.version.is_empty());
        assert!(provider.status.is_none());
    }

    #[test]
    fn test_v1alpha1_structured_image() {
        let provider: v1alpha1::CoreProvider = serde_json::from_value(json!({
            "apiVersion": "operator.cluster.x-k8s.io/v1alpha1",
            "kind": "CoreProvider",
            "metadata": { "name": "cluster-api" },
            "spec": {
                "secretName": "vars",
                "deployment": {
                    "containers": [{
                        "name": "manager",
                        "image": { "repository": "quay.io/capi", "name": "manager", "tag": "v1" }
                    }]
                }
            }
        }))
        .unwrap();

        let spec = &provider.spec.provider;
        assert_eq!(spec.secret_name.as_deref(), Some("vars"));
        let image = spec.deployment.as_ref().unwrap().containers.as_ref().unwrap()[0]
            .image
            .clone()
            .unwrap();
        assert_eq!(image.tag.as_deref(), Some("v1"));
    }

    #[test]
    fn test_status_serializes_camel_case_and_skips_empty() {
        let status = ProviderStatus {
            installed_version: Some("v1.6.0".to_string()),
            observed_generation: Some(3),
            conditions: vec![Condition {
                r#type: "Ready".to_string(),
                status: "True".to_string(),
                last_transition_time: Some("2025-01-01T00:00:00Z".to_string()),
                ..Default::default()
            }],
            contract: None,
        };

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["installedVersion"], "v1.6.0");
        assert_eq!(value["observedGeneration"], 3);
        assert_eq!(value["conditions"][0]["lastTransitionTime"], "2025-01-01T00:00:00Z");
        assert!(value.get("contract").is_none());
        assert!(value["conditions"][0].get("severity").is_none());
    }

    #[test]
    fn test_crd_identity() {
        assert_eq!(CoreProvider::group(&()), "operator.cluster.x-k8s.io");
        assert_eq!(CoreProvider::version(&()), "v1alpha2");
        assert_eq!(InfrastructureProvider::plural(&()), "infrastructureproviders");
        assert_eq!(v1alpha1::CoreProvider::version(&()), "v1alpha1");

        let crd = CoreProvider::crd();
        assert_eq!(crd.spec.scope, "Namespaced");
        assert_eq!(crd.spec.names.kind, "CoreProvider");
    }
}
