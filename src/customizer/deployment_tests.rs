// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for deployment overrides

#[cfg(test)]
mod tests {
    use crate::crd::v1alpha2::{ContainerSpec, DeploymentSpec};
    use crate::customizer::deployment::{customize_deployment, flag_name, set_arg, upsert_env};
    use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec as K8sDeploymentSpec};
    use k8s_openapi::api::core::v1::{
        Container, EnvVar, LocalObjectReference, PodSpec, PodTemplateSpec,
        ResourceRequirements, Toleration,
    };
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use std::collections::BTreeMap;

    fn deployment() -> Deployment {
        Deployment {
            spec: Some(K8sDeploymentSpec {
                replicas: Some(1),
                template: PodTemplateSpec {
                    spec: Some(PodSpec {
                        containers: vec![Container {
                            name: "manager".to_string(),
                            image: Some("registry.k8s.io/capi/manager:v1.6.0".to_string()),
                            args: Some(vec![
                                "--leader-elect".to_string(),
                                "--diagnostics-address=:8443".to_string(),
                            ]),
                            env: Some(vec![EnvVar {
                                name: "POD_NAME".to_string(),
                                value: Some("x".to_string()),
                                ..Default::default()
                            }]),
                            ..Default::default()
                        }],
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn manager(deployment: &Deployment) -> &Container {
        &deployment.spec.as_ref().unwrap().template.spec.as_ref().unwrap().containers[0]
    }

    #[test]
    fn test_pod_level_overrides() {
        let spec = DeploymentSpec {
            replicas: Some(3),
            node_selector: Some(BTreeMap::from([("role".to_string(), "infra".to_string())])),
            tolerations: Some(vec![Toleration {
                key: Some("dedicated".to_string()),
                operator: Some("Exists".to_string()),
                ..Default::default()
            }]),
            service_account_name: Some("custom-sa".to_string()),
            image_pull_secrets: Some(vec![LocalObjectReference {
                name: "pull".to_string(),
            }]),
            ..Default::default()
        };

        let mut d = deployment();
        customize_deployment(&spec, &mut d);

        let k8s_spec = d.spec.as_ref().unwrap();
        assert_eq!(k8s_spec.replicas, Some(3));
        let pod = k8s_spec.template.spec.as_ref().unwrap();
        assert_eq!(pod.node_selector.as_ref().unwrap()["role"], "infra");
        assert_eq!(pod.tolerations.as_ref().unwrap().len(), 1);
        assert_eq!(pod.service_account_name.as_deref(), Some("custom-sa"));
        assert_eq!(pod.image_pull_secrets.as_ref().unwrap()[0].name, "pull");
    }

    #[test]
    fn test_container_overrides() {
        let spec = DeploymentSpec {
            containers: Some(vec![ContainerSpec {
                name: "manager".to_string(),
                image_url: Some("quay.io/capi/manager:v1.7.0".to_string()),
                args: Some(BTreeMap::from([
                    ("--diagnostics-address".to_string(), ":9443".to_string()),
                    ("--namespace".to_string(), "ignored".to_string()),
                    ("insecure-diagnostics".to_string(), "true".to_string()),
                ])),
                env: Some(vec![
                    EnvVar {
                        name: "POD_NAME".to_string(),
                        value: Some("y".to_string()),
                        ..Default::default()
                    },
                    EnvVar {
                        name: "EXTRA".to_string(),
                        value: Some("1".to_string()),
                        ..Default::default()
                    },
                ]),
                resources: Some(ResourceRequirements {
                    limits: Some(BTreeMap::from([(
                        "cpu".to_string(),
                        Quantity("500m".to_string()),
                    )])),
                    ..Default::default()
                }),
                command: Some(vec!["/manager".to_string()]),
            }]),
            ..Default::default()
        };

        let mut d = deployment();
        customize_deployment(&spec, &mut d);
        let container = manager(&d);

        assert_eq!(container.image.as_deref(), Some("quay.io/capi/manager:v1.7.0"));
        assert_eq!(
            container.args.as_ref().unwrap(),
            &vec![
                "--leader-elect".to_string(),
                "--diagnostics-address=:9443".to_string(),
                "--insecure-diagnostics=true".to_string(),
            ]
        );
        let env = container.env.as_ref().unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env[0].value.as_deref(), Some("y"));
        assert_eq!(env[1].name, "EXTRA");
        assert!(container.resources.is_some());
        assert_eq!(container.command, Some(vec!["/manager".to_string()]));
    }

    #[test]
    fn test_incomplete_image_keeps_original() {
        let spec = DeploymentSpec {
            containers: Some(vec![ContainerSpec {
                name: "manager".to_string(),
                image_url: Some("manager:v2".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let mut d = deployment();
        customize_deployment(&spec, &mut d);
        assert_eq!(
            manager(&d).image.as_deref(),
            Some("registry.k8s.io/capi/manager:v1.6.0")
        );
    }

    #[test]
    fn test_image_without_tag_defaults_to_latest() {
        let spec = DeploymentSpec {
            containers: Some(vec![ContainerSpec {
                name: "manager".to_string(),
                image_url: Some("quay.io/capi/manager".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let mut d = deployment();
        customize_deployment(&spec, &mut d);
        assert_eq!(manager(&d).image.as_deref(), Some("quay.io/capi/manager:latest"));
    }

    #[test]
    fn test_unmatched_container_is_ignored() {
        let spec = DeploymentSpec {
            containers: Some(vec![ContainerSpec {
                name: "sidecar".to_string(),
                command: Some(vec!["/bin/true".to_string()]),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let mut d = deployment();
        let before = d.clone();
        customize_deployment(&spec, &mut d);
        assert_eq!(d, before);
    }

    #[test]
    fn test_set_arg_keeps_length_on_replace() {
        let mut args = vec!["--k=v1".to_string(), "--other".to_string()];
        set_arg(&mut args, "--k", "v2");
        assert_eq!(args.len(), 2);
        assert_eq!(args.iter().filter(|a| a.starts_with("--k=")).count(), 1);
        assert_eq!(args[0], "--k=v2");
    }

    #[test]
    fn test_set_arg_does_not_match_prefix_of_longer_flag() {
        let mut args = vec!["--v-extra=1".to_string()];
        set_arg(&mut args, "--v", "2");
        assert_eq!(args, vec!["--v-extra=1", "--v=2"]);
    }

    #[test]
    fn test_flag_name_adds_dashes() {
        assert_eq!(flag_name("sync-period"), "--sync-period");
        assert_eq!(flag_name("--sync-period"), "--sync-period");
        assert_eq!(flag_name("-v"), "-v");
    }

    #[test]
    fn test_upsert_env() {
        let mut vars = Vec::new();
        let var = EnvVar {
            name: "A".to_string(),
            value: Some("1".to_string()),
            ..Default::default()
        };
        upsert_env(&mut vars, &var);
        upsert_env(&mut vars, &var);
        assert_eq!(vars.len(), 1);
    }
}
