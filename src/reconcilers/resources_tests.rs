// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `resources.rs`

#[cfg(test)]
mod tests {
    use crate::reconcilers::resources::{
        deployment_available, is_excluded_from_delete, object_gvk, parse_api_version,
    };
    use crate::yaml_processor::parse_objects;
    use k8s_openapi::api::apps::v1::{Deployment, DeploymentCondition, DeploymentStatus};
    use kube::api::DynamicObject;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn deployment_with(conditions: Option<Vec<DeploymentCondition>>) -> Deployment {
        Deployment {
            status: Some(DeploymentStatus {
                conditions,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn condition(type_: &str, status: &str) -> DeploymentCondition {
        DeploymentCondition {
            type_: type_.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_api_version() {
        assert_eq!(
            parse_api_version("apiextensions.k8s.io/v1"),
            ("apiextensions.k8s.io".to_string(), "v1".to_string())
        );
        assert_eq!(parse_api_version("v1"), (String::new(), "v1".to_string()));
    }

    #[test]
    fn test_object_gvk() {
        let objects = parse_objects(
            "apiVersion: cert-manager.io/v1\nkind: Certificate\nmetadata:\n  name: serving-cert\n",
        )
        .unwrap();
        let gvk = object_gvk(&objects[0]).unwrap();
        assert_eq!(gvk.group, "cert-manager.io");
        assert_eq!(gvk.version, "v1");
        assert_eq!(gvk.kind, "Certificate");
    }

    #[test]
    fn test_object_without_types_has_no_gvk() {
        let object = DynamicObject {
            types: None,
            metadata: ObjectMeta {
                name: Some("x".to_string()),
                ..Default::default()
            },
            data: serde_json::Value::Null,
        };
        assert!(object_gvk(&object).unwrap_err().to_string().contains("x"));
    }

    #[test]
    fn test_namespaces_and_crds_are_never_deleted() {
        assert!(is_excluded_from_delete("Namespace"));
        assert!(is_excluded_from_delete("CustomResourceDefinition"));
        assert!(!is_excluded_from_delete("Deployment"));
        assert!(!is_excluded_from_delete("ClusterRole"));
    }

    #[test]
    fn test_deployment_available() {
        assert!(deployment_available(&deployment_with(Some(vec![
            condition("Progressing", "True"),
            condition("Available", "True"),
        ]))));
        assert!(!deployment_available(&deployment_with(Some(vec![condition(
            "Available", "False"
        )]))));
        assert!(!deployment_available(&deployment_with(None)));
        assert!(!deployment_available(&Deployment::default()));
    }

    #[tokio::test]
    #[ignore] // Requires Kubernetes cluster
    async fn test_apply_objects_against_cluster() {
        let client = kube::Client::try_default()
            .await
            .expect("Failed to create client");
        let objects = parse_objects(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: capi-operator-smoke\n  namespace: default\n  labels:\n    cluster.x-k8s.io/provider: smoke\ndata:\n  k: v\n",
        )
        .unwrap();

        let applied =
            crate::reconcilers::resources::apply_objects(&client, &objects, "capi-operator-test")
                .await
                .unwrap();
        assert_eq!(applied, 1);

        let deleted = crate::reconcilers::resources::delete_by_label(
            &client,
            "cluster.x-k8s.io/provider=smoke",
        )
        .await
        .unwrap();
        assert!(deleted >= 1);
    }
}
