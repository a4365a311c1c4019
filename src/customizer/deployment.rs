// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deployment-level overrides from `spec.deployment`.

use crate::constants::RESERVED_NAMESPACE_ARG;
use crate::crd::image::{override_image, parse_image_url};
use crate::crd::v1alpha2::{ContainerSpec, DeploymentSpec};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, EnvVar};

/// Apply `spec` to `deployment`.
///
/// Pod-level fields are overwritten when set. Containers are matched by name;
/// unmatched container overrides are ignored.
pub fn customize_deployment(spec: &DeploymentSpec, deployment: &mut Deployment) {
    let deployment_spec = deployment.spec.get_or_insert_with(Default::default);

    if let Some(replicas) = spec.replicas {
        deployment_spec.replicas = Some(replicas);
    }

    let pod_spec = deployment_spec
        .template
        .spec
        .get_or_insert_with(Default::default);

    if let Some(affinity) = &spec.affinity {
        pod_spec.affinity = Some(affinity.clone());
    }
    if let Some(node_selector) = &spec.node_selector {
        pod_spec.node_selector = Some(node_selector.clone());
    }
    if let Some(tolerations) = &spec.tolerations {
        pod_spec.tolerations = Some(tolerations.clone());
    }
    if let Some(service_account_name) = &spec.service_account_name {
        pod_spec.service_account_name = Some(service_account_name.clone());
    }
    if let Some(image_pull_secrets) = &spec.image_pull_secrets {
        pod_spec.image_pull_secrets = Some(image_pull_secrets.clone());
    }

    for container_spec in spec.containers.iter().flatten() {
        if let Some(container) = pod_spec
            .containers
            .iter_mut()
            .find(|c| c.name == container_spec.name)
        {
            customize_container(container_spec, container);
        }
    }
}

/// Apply one container override.
pub fn customize_container(spec: &ContainerSpec, container: &mut Container) {
    for (name, value) in spec.args.iter().flatten() {
        if name.trim_start_matches('-') == RESERVED_NAMESPACE_ARG {
            continue;
        }
        let args = container.args.get_or_insert_with(Vec::new);
        set_arg(args, &flag_name(name), value);
    }

    for env in spec.env.iter().flatten() {
        let vars = container.env.get_or_insert_with(Vec::new);
        upsert_env(vars, env);
    }

    if let Some(resources) = &spec.resources {
        container.resources = Some(resources.clone());
    }

    if let Some(image) = spec
        .image_url
        .as_deref()
        .and_then(|url| override_image(&parse_image_url(url)))
    {
        container.image = Some(image);
    }

    if let Some(command) = &spec.command {
        container.command = Some(command.clone());
    }
}

/// `--name` form of an argument key given with or without leading dashes.
#[must_use]
pub fn flag_name(key: &str) -> String {
    if key.starts_with('-') {
        key.to_string()
    } else {
        format!("--{key}")
    }
}

/// Replace `{name}=<old>` in place, or append `{name}={value}`.
///
/// ```
/// use capi_operator::customizer::deployment::set_arg;
///
/// let mut args = vec!["--v=1".to_string(), "--leader-elect".to_string()];
/// set_arg(&mut args, "--v", "4");
/// set_arg(&mut args, "--metrics-addr", ":8080");
/// assert_eq!(args, vec!["--v=4", "--leader-elect", "--metrics-addr=:8080"]);
/// ```
pub fn set_arg(args: &mut Vec<String>, name: &str, value: &str) {
    let prefix = format!("{name}=");
    let arg = format!("{name}={value}");
    match args.iter_mut().find(|a| a.starts_with(&prefix)) {
        Some(existing) => *existing = arg,
        None => args.push(arg),
    }
}

/// Replace the env var with the same name, or append it.
pub fn upsert_env(vars: &mut Vec<EnvVar>, env: &EnvVar) {
    match vars.iter_mut().find(|v| v.name == env.name) {
        Some(existing) => *existing = env.clone(),
        None => vars.push(env.clone()),
    }
}

#[cfg(test)]
#[path = "deployment_tests.rs"]
mod deployment_tests;
