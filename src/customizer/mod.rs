// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Manifest customizer.
//!
//! Transforms the processed components of a provider before they are applied:
//!
//! 1. `Namespace` objects are dropped (the provider namespace already exists).
//! 2. Every namespaced object gets an owner reference to the provider CR.
//! 3. Every `Deployment` is decoded into the typed API, rewritten from the provider's
//!    `deployment` and `manager` sections (see [`deployment`] and [`manager`]), then
//!    re-encoded. `additionalDeployments[<name>]` replaces the provider-level pair for
//!    the deployment with that name.
//! 4. `manifestPatches` are applied as JSON merge patches (see [`patches`]).

pub mod deployment;
pub mod manager;
pub mod patches;

use crate::components::object_kind;
use crate::crd::v1alpha2::{DeploymentSpec, ManagerSpec, ProviderSpec};
use anyhow::{Context, Result};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::DynamicObject;
use tracing::debug;

/// Customize `objects` for the provider described by `spec`.
///
/// # Arguments
///
/// * `objects` - processed components
/// * `spec` - the provider's hub spec
/// * `owner` - owner reference to the provider CR, if it has a uid
///
/// # Errors
///
/// Returns an error if a Deployment cannot be decoded, a manager duration is not a
/// valid duration, or a manifest patch is invalid.
pub fn customize(
    objects: Vec<DynamicObject>,
    spec: &ProviderSpec,
    owner: Option<&OwnerReference>,
) -> Result<Vec<DynamicObject>> {
    let mut customized = Vec::with_capacity(objects.len());

    for mut object in objects {
        let kind = object_kind(&object).to_string();
        if kind == "Namespace" {
            debug!(name = ?object.metadata.name, "Dropping Namespace from components");
            continue;
        }

        if object.metadata.namespace.as_deref().is_some_and(|ns| !ns.is_empty()) {
            if let Some(owner) = owner {
                ensure_owner_reference(&mut object, owner);
            }
        }

        if kind == "Deployment" {
            object = customize_deployment_object(object, spec)?;
        }

        customized.push(object);
    }

    if let Some(patches) = spec.manifest_patches.as_deref() {
        patches::apply_patches(&mut customized, patches)?;
    }

    Ok(customized)
}

/// Append `owner` unless a reference with the same kind and name is present.
pub fn ensure_owner_reference(object: &mut DynamicObject, owner: &OwnerReference) {
    let references = object
        .metadata
        .owner_references
        .get_or_insert_with(Vec::new);
    let present = references
        .iter()
        .any(|r| r.kind == owner.kind && r.name == owner.name);
    if !present {
        references.push(owner.clone());
    }
}

/// Deployment and manager sections that apply to the deployment called `name`.
fn overrides_for<'a>(
    spec: &'a ProviderSpec,
    name: &str,
) -> (Option<&'a DeploymentSpec>, Option<&'a ManagerSpec>) {
    match spec
        .additional_deployments
        .as_ref()
        .and_then(|extra| extra.get(name))
    {
        Some(extra) => (extra.deployment.as_ref(), extra.manager.as_ref()),
        None => (spec.deployment.as_ref(), spec.manager.as_ref()),
    }
}

fn customize_deployment_object(object: DynamicObject, spec: &ProviderSpec) -> Result<DynamicObject> {
    let name = object.metadata.name.clone().unwrap_or_default();
    let (deployment_spec, manager_spec) = overrides_for(spec, &name);
    if deployment_spec.is_none() && manager_spec.is_none() {
        return Ok(object);
    }

    let value = serde_json::to_value(&object)
        .with_context(|| format!("failed to encode Deployment {name}"))?;
    let mut typed: Deployment = serde_json::from_value(value)
        .with_context(|| format!("failed to decode Deployment {name}"))?;

    if let Some(deployment_spec) = deployment_spec {
        deployment::customize_deployment(deployment_spec, &mut typed);
    }
    if let Some(manager_spec) = manager_spec {
        manager::customize_manager(manager_spec, &mut typed)
            .with_context(|| format!("failed to apply manager settings to Deployment {name}"))?;
    }

    debug!(deployment = %name, "Customized provider Deployment");

    let value = serde_json::to_value(&typed)
        .with_context(|| format!("failed to encode Deployment {name}"))?;
    serde_json::from_value(value).with_context(|| format!("failed to decode Deployment {name}"))
}

#[cfg(test)]
#[path = "customizer_tests.rs"]
mod customizer_tests;
