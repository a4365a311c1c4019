// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Conversion between `v1alpha1` and the `v1alpha2` hub.
//!
//! Down-conversion (`from_hub`) maps every field that has a `v1alpha1` counterpart and
//! serializes the full hub spec into the [`CONVERSION_DATA_ANNOTATION`] annotation.
//! Up-conversion (`to_hub`) maps the fields back, then restores the hub-only fields
//! (`manifestPatches`, `additionalDeployments`, `manager.additionalArgs`) and the
//! exact image URLs from that annotation before dropping it.
//!
//! ```rust
//! use capi_operator::crd::conversion::Convertible;
//! use capi_operator::crd::{v1alpha1, v1alpha2};
//!
//! let hub = v1alpha2::CoreProvider::new("cluster-api", Default::default());
//! let spoke = v1alpha1::CoreProvider::from_hub(&hub).unwrap();
//! assert_eq!(spoke.to_hub().unwrap(), hub);
//! ```

use super::image::{format_image_url, parse_image_url};
use super::{v1alpha1, v1alpha2};
use crate::labels::CONVERSION_DATA_ANNOTATION;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading or writing the conversion-data annotation.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("failed to encode conversion data: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode {CONVERSION_DATA_ANNOTATION} annotation: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A served API version that converts to and from the hub.
pub trait Convertible: Sized {
    type Hub;

    /// Up-convert to the hub version.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion-data annotation is present but malformed.
    fn to_hub(&self) -> Result<Self::Hub, ConversionError>;

    /// Down-convert from the hub version.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub spec cannot be serialized into the annotation.
    fn from_hub(hub: &Self::Hub) -> Result<Self, ConversionError>;
}

/// Payload stored in the conversion-data annotation.
#[derive(Debug, Serialize, Deserialize)]
struct ConversionData {
    spec: v1alpha2::ProviderSpec,
}

/// Map a `v1alpha1` spec onto the hub shape, without restoring hub-only fields.
#[must_use]
pub fn spec_to_hub(src: &v1alpha1::ProviderSpec) -> v1alpha2::ProviderSpec {
    let config_secret = src
        .secret_name
        .as_ref()
        .map(|name| v1alpha2::SecretReference {
            name: name.clone(),
            namespace: src.secret_namespace.clone(),
        });

    v1alpha2::ProviderSpec {
        version: src.version.clone(),
        manager: src.manager.as_ref().map(manager_to_hub),
        deployment: src.deployment.as_ref().map(deployment_to_hub),
        config_secret,
        fetch_config: src.fetch_config.clone(),
        additional_manifests: src.additional_manifests.clone(),
        manifest_patches: None,
        additional_deployments: None,
    }
}

/// Map a hub spec onto the `v1alpha1` shape, dropping hub-only fields.
#[must_use]
pub fn spec_from_hub(src: &v1alpha2::ProviderSpec) -> v1alpha1::ProviderSpec {
    let (secret_name, secret_namespace) = match &src.config_secret {
        Some(secret) => (Some(secret.name.clone()), secret.namespace.clone()),
        None => (None, None),
    };

    v1alpha1::ProviderSpec {
        version: src.version.clone(),
        manager: src.manager.as_ref().map(manager_from_hub),
        deployment: src.deployment.as_ref().map(deployment_from_hub),
        secret_name,
        secret_namespace,
        fetch_config: src.fetch_config.clone(),
        additional_manifests: src.additional_manifests.clone(),
    }
}

fn manager_to_hub(src: &v1alpha1::ManagerSpec) -> v1alpha2::ManagerSpec {
    v1alpha2::ManagerSpec {
        controller: src.controller.clone(),
        max_concurrent_reconciles: src.max_concurrent_reconciles,
        cache_namespace: src.cache_namespace.clone(),
        health: src.health.clone(),
        leader_election: src.leader_election.clone(),
        metrics: src.metrics.clone(),
        webhook: src.webhook.clone(),
        sync_period: src.sync_period.clone(),
        profiler_address: src.profiler_address.clone(),
        verbosity: src.verbosity,
        feature_gates: src.feature_gates.clone(),
        additional_args: None,
    }
}

fn manager_from_hub(src: &v1alpha2::ManagerSpec) -> v1alpha1::ManagerSpec {
    v1alpha1::ManagerSpec {
        controller: src.controller.clone(),
        max_concurrent_reconciles: src.max_concurrent_reconciles,
        cache_namespace: src.cache_namespace.clone(),
        health: src.health.clone(),
        leader_election: src.leader_election.clone(),
        metrics: src.metrics.clone(),
        webhook: src.webhook.clone(),
        sync_period: src.sync_period.clone(),
        profiler_address: src.profiler_address.clone(),
        verbosity: src.verbosity,
        feature_gates: src.feature_gates.clone(),
    }
}

fn deployment_to_hub(src: &v1alpha1::DeploymentSpec) -> v1alpha2::DeploymentSpec {
    v1alpha2::DeploymentSpec {
        replicas: src.replicas,
        node_selector: src.node_selector.clone(),
        tolerations: src.tolerations.clone(),
        affinity: src.affinity.clone(),
        containers: src
            .containers
            .as_ref()
            .map(|containers| containers.iter().map(container_to_hub).collect()),
        service_account_name: src.service_account_name.clone(),
        image_pull_secrets: src.image_pull_secrets.clone(),
    }
}

fn deployment_from_hub(src: &v1alpha2::DeploymentSpec) -> v1alpha1::DeploymentSpec {
    v1alpha1::DeploymentSpec {
        replicas: src.replicas,
        node_selector: src.node_selector.clone(),
        tolerations: src.tolerations.clone(),
        affinity: src.affinity.clone(),
        containers: src
            .containers
            .as_ref()
            .map(|containers| containers.iter().map(container_from_hub).collect()),
        service_account_name: src.service_account_name.clone(),
        image_pull_secrets: src.image_pull_secrets.clone(),
    }
}

fn container_to_hub(src: &v1alpha1::ContainerSpec) -> v1alpha2::ContainerSpec {
    v1alpha2::ContainerSpec {
        name: src.name.clone(),
        image_url: src.image.as_ref().map(format_image_url),
        args: src.args.clone(),
        env: src.env.clone(),
        resources: src.resources.clone(),
        command: src.command.clone(),
    }
}

fn container_from_hub(src: &v1alpha2::ContainerSpec) -> v1alpha1::ContainerSpec {
    v1alpha1::ContainerSpec {
        name: src.name.clone(),
        image: src.image_url.as_deref().map(parse_image_url),
        args: src.args.clone(),
        env: src.env.clone(),
        resources: src.resources.clone(),
        command: src.command.clone(),
    }
}

/// Copy hub-only fields from the saved spec into a freshly up-converted one.
fn restore_hub_fields(dst: &mut v1alpha2::ProviderSpec, saved: &v1alpha2::ProviderSpec) {
    dst.manifest_patches.clone_from(&saved.manifest_patches);
    dst.additional_deployments
        .clone_from(&saved.additional_deployments);

    if let (Some(manager), Some(saved_manager)) = (dst.manager.as_mut(), saved.manager.as_ref()) {
        manager
            .additional_args
            .clone_from(&saved_manager.additional_args);
    }

    let saved_containers = saved
        .deployment
        .as_ref()
        .and_then(|d| d.containers.as_ref());
    let containers = dst
        .deployment
        .as_mut()
        .and_then(|d| d.containers.as_mut());

    if let (Some(containers), Some(saved_containers)) = (containers, saved_containers) {
        for container in containers {
            let saved_url = saved_containers
                .iter()
                .find(|c| c.name == container.name)
                .and_then(|c| c.image_url.as_ref());

            // Only restore when the spoke image still matches what was saved
            if let Some(saved_url) = saved_url {
                let normalized = format_image_url(&parse_image_url(saved_url));
                if container.image_url.as_deref() == Some(normalized.as_str()) {
                    container.image_url = Some(saved_url.clone());
                }
            }
        }
    }
}

/// Strip the conversion-data annotation, returning the cleaned metadata and the saved spec.
fn take_conversion_data(
    metadata: &ObjectMeta,
) -> Result<(ObjectMeta, Option<v1alpha2::ProviderSpec>), ConversionError> {
    let mut metadata = metadata.clone();
    let Some(annotations) = metadata.annotations.as_mut() else {
        return Ok((metadata, None));
    };
    let Some(raw) = annotations.remove(CONVERSION_DATA_ANNOTATION) else {
        return Ok((metadata, None));
    };
    if annotations.is_empty() {
        metadata.annotations = None;
    }

    let data: ConversionData = serde_json::from_str(&raw).map_err(ConversionError::Decode)?;
    Ok((metadata, Some(data.spec)))
}

/// Copy metadata and record the hub spec in the conversion-data annotation.
fn with_conversion_data(
    metadata: &ObjectMeta,
    spec: &v1alpha2::ProviderSpec,
) -> Result<ObjectMeta, ConversionError> {
    let data = ConversionData { spec: spec.clone() };
    let raw = serde_json::to_string(&data).map_err(ConversionError::Encode)?;

    let mut metadata = metadata.clone();
    metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(CONVERSION_DATA_ANNOTATION.to_string(), raw);
    Ok(metadata)
}

macro_rules! convertible {
    ($kind:ident, $spec:ident) => {
        impl Convertible for v1alpha1::$kind {
            type Hub = v1alpha2::$kind;

            fn to_hub(&self) -> Result<Self::Hub, ConversionError> {
                let (metadata, saved) = take_conversion_data(&self.metadata)?;
                let mut provider = spec_to_hub(&self.spec.provider);
                if let Some(saved) = saved {
                    restore_hub_fields(&mut provider, &saved);
                }
                Ok(v1alpha2::$kind {
                    metadata,
                    spec: v1alpha2::$spec { provider },
                    status: self.status.clone(),
                })
            }

            fn from_hub(hub: &Self::Hub) -> Result<Self, ConversionError> {
                let metadata = with_conversion_data(&hub.metadata, &hub.spec.provider)?;
                Ok(Self {
                    metadata,
                    spec: v1alpha1::$spec {
                        provider: spec_from_hub(&hub.spec.provider),
                    },
                    status: hub.status.clone(),
                })
            }
        }
    };
}

convertible!(CoreProvider, CoreProviderSpec);
convertible!(BootstrapProvider, BootstrapProviderSpec);
convertible!(ControlPlaneProvider, ControlPlaneProviderSpec);
convertible!(InfrastructureProvider, InfrastructureProviderSpec);
convertible!(IPAMProvider, IPAMProviderSpec);
convertible!(AddonProvider, AddonProviderSpec);
convertible!(RuntimeExtensionProvider, RuntimeExtensionProviderSpec);

#[cfg(test)]
#[path = "conversion_tests.rs"]
mod conversion_tests;
