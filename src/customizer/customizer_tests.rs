// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the manifest customizer

#[cfg(test)]
mod tests {
    use crate::components::object_kind;
    use crate::crd::v1alpha2::{
        AdditionalDeployments, ContainerSpec, DeploymentSpec, ManagerSpec, ProviderSpec,
    };
    use crate::customizer::{customize, ensure_owner_reference};
    use crate::yaml_processor::parse_objects;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
    use std::collections::BTreeMap;

    const COMPONENTS: &str = r"
apiVersion: v1
kind: Namespace
metadata:
  name: capi-system
---
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: clusters.cluster.x-k8s.io
---
apiVersion: v1
kind: ServiceAccount
metadata:
  name: capi-manager
  namespace: capi-system
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: capi-controller-manager
  namespace: capi-system
spec:
  selector:
    matchLabels:
      app: capi
  template:
    metadata:
      labels:
        app: capi
    spec:
      containers:
        - name: manager
          image: registry.k8s.io/cluster-api/cluster-api-controller:v1.6.0
          args:
            - --leader-elect
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: capi-webhook
  namespace: capi-system
spec:
  selector:
    matchLabels:
      app: webhook
  template:
    metadata:
      labels:
        app: webhook
    spec:
      containers:
        - name: manager
          image: registry.k8s.io/cluster-api/webhook:v1.6.0
";

    fn owner() -> OwnerReference {
        OwnerReference {
            api_version: "operator.cluster.x-k8s.io/v1alpha2".to_string(),
            kind: "CoreProvider".to_string(),
            name: "cluster-api".to_string(),
            uid: "uid-1".to_string(),
            ..Default::default()
        }
    }

    fn deployment_args(objects: &[kube::api::DynamicObject], name: &str) -> Vec<String> {
        let deployment = objects
            .iter()
            .find(|o| object_kind(o) == "Deployment" && o.metadata.name.as_deref() == Some(name))
            .unwrap();
        deployment.data["spec"]["template"]["spec"]["containers"][0]["args"]
            .as_array()
            .map(|a| a.iter().map(|v| v.as_str().unwrap().to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_namespaces_dropped_and_owner_refs_added() {
        let objects = parse_objects(COMPONENTS).unwrap();
        let out = customize(objects, &ProviderSpec::default(), Some(&owner())).unwrap();

        assert!(out.iter().all(|o| object_kind(o) != "Namespace"));
        assert_eq!(out.len(), 4);

        for object in &out {
            let refs = object.metadata.owner_references.as_ref();
            if object.metadata.namespace.is_some() {
                let refs = refs.unwrap();
                assert!(refs.iter().any(|r| r.kind == "CoreProvider" && r.name == "cluster-api"));
            } else {
                assert!(refs.is_none_or(Vec::is_empty));
            }
        }
    }

    #[test]
    fn test_owner_reference_not_duplicated() {
        let mut objects = parse_objects(COMPONENTS).unwrap();
        ensure_owner_reference(&mut objects[2], &owner());
        ensure_owner_reference(&mut objects[2], &owner());
        assert_eq!(objects[2].metadata.owner_references.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_manager_overrides_deployment_args() {
        let spec = ProviderSpec {
            deployment: Some(DeploymentSpec {
                containers: Some(vec![ContainerSpec {
                    name: "manager".to_string(),
                    args: Some(BTreeMap::from([("--v".to_string(), "2".to_string())])),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            manager: Some(ManagerSpec {
                verbosity: Some(5),
                ..Default::default()
            }),
            ..Default::default()
        };

        let out = customize(parse_objects(COMPONENTS).unwrap(), &spec, Some(&owner())).unwrap();
        assert_eq!(
            deployment_args(&out, "capi-controller-manager"),
            vec!["--leader-elect", "--v=5"]
        );
    }

    #[test]
    fn test_additional_deployments_replace_provider_overrides() {
        let spec = ProviderSpec {
            manager: Some(ManagerSpec {
                verbosity: Some(5),
                ..Default::default()
            }),
            additional_deployments: Some(BTreeMap::from([(
                "capi-webhook".to_string(),
                AdditionalDeployments {
                    manager: Some(ManagerSpec {
                        verbosity: Some(9),
                        ..Default::default()
                    }),
                    deployment: Some(DeploymentSpec {
                        replicas: Some(2),
                        ..Default::default()
                    }),
                },
            )])),
            ..Default::default()
        };

        let out = customize(parse_objects(COMPONENTS).unwrap(), &spec, None).unwrap();
        assert_eq!(
            deployment_args(&out, "capi-controller-manager"),
            vec!["--leader-elect", "--v=5"]
        );
        assert_eq!(deployment_args(&out, "capi-webhook"), vec!["--v=9"]);

        let webhook = out
            .iter()
            .find(|o| o.metadata.name.as_deref() == Some("capi-webhook"))
            .unwrap();
        assert_eq!(webhook.data["spec"]["replicas"], 2);
        assert_eq!(webhook.types.as_ref().unwrap().kind, "Deployment");
    }

    #[test]
    fn test_manifest_patches_applied_after_customization() {
        let spec = ProviderSpec {
            manifest_patches: Some(vec![r"
apiVersion: v1
kind: ServiceAccount
metadata:
  name: capi-manager
  annotations:
    eks.amazonaws.com/role-arn: arn:aws:iam::123:role/capi
"
            .to_string()]),
            ..Default::default()
        };

        let out = customize(parse_objects(COMPONENTS).unwrap(), &spec, Some(&owner())).unwrap();
        let sa = out.iter().find(|o| object_kind(o) == "ServiceAccount").unwrap();
        assert_eq!(
            sa.metadata.annotations.as_ref().unwrap()["eks.amazonaws.com/role-arn"],
            "arn:aws:iam::123:role/capi"
        );
        assert!(sa.metadata.owner_references.is_some());
    }

    #[test]
    fn test_no_overrides_leaves_deployment_unchanged() {
        let objects = parse_objects(COMPONENTS).unwrap();
        let original = objects[3].clone();
        let out = customize(objects, &ProviderSpec::default(), None).unwrap();
        let deployment = out
            .iter()
            .find(|o| o.metadata.name.as_deref() == Some("capi-controller-manager"))
            .unwrap();
        assert_eq!(deployment.data, original.data);
    }
}
