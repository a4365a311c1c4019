// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generic resource creation, deletion and readiness helpers.
//!
//! Provider components arrive as unstructured objects, so most helpers here work
//! on [`DynamicObject`]s resolved through API discovery.
//!
//! # Strategies
//!
//! - **Create or apply**: create when absent, otherwise server-side apply (forced)
//! - **Delete by label**: remove every listable object carrying a label, except
//!   namespaces and CRDs
//!
//! # Example
//!
//! ```rust,no_run
//! use capi_operator::reconcilers::resources::create_or_apply;
//! use k8s_openapi::api::core::v1::ConfigMap;
//! use kube::Client;
//! use anyhow::Result;
//!
//! async fn example(client: &Client, namespace: &str, cm: ConfigMap) -> Result<()> {
//!     create_or_apply(client, namespace, &cm, "capi-operator").await?;
//!     Ok(())
//! }
//! ```

use crate::components::{object_api_version, object_kind};
use anyhow::{anyhow, Context, Result};
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{
    DeleteParams, DynamicObject, GroupVersionKind, ListParams, Patch, PatchParams, PostParams,
};
use kube::core::NamespaceResourceScope;
use kube::discovery::{verbs, ApiCapabilities, ApiResource, Discovery, Scope};
use kube::runtime::wait::await_condition;
use kube::{Api, Client, Resource, ResourceExt};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Kinds never removed by [`delete_by_label`].
const DELETE_EXCLUDED_KINDS: [&str; 2] = ["Namespace", "CustomResourceDefinition"];

/// Create or update a typed resource using server-side apply.
///
/// If the resource exists it is patched with server-side apply, otherwise it is created.
///
/// # Errors
///
/// Returns an error if the resource has no name or an API call fails.
pub async fn create_or_apply<T>(
    client: &Client,
    namespace: &str,
    resource: &T,
    field_manager: &str,
) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let name = resource
        .meta()
        .name
        .as_ref()
        .ok_or_else(|| anyhow!("Resource must have a name"))?;

    let api: Api<T> = Api::namespaced(client.clone(), namespace);

    debug!(
        namespace = %namespace,
        name = %name,
        kind = %T::kind(&()),
        "Creating or updating resource with Apply strategy"
    );

    if api.get_opt(name).await?.is_some() {
        api.patch(
            name,
            &PatchParams::apply(field_manager).force(),
            &Patch::Apply(resource),
        )
        .await?;
        info!("Updated {} {}/{}", T::kind(&()), namespace, name);
    } else {
        api.create(&PostParams::default(), resource).await?;
        info!("Created {} {}/{}", T::kind(&()), namespace, name);
    }

    Ok(())
}

/// Split an `apiVersion` into group and version. The core group is `""`.
///
/// ```
/// use capi_operator::reconcilers::resources::parse_api_version;
///
/// assert_eq!(parse_api_version("apps/v1"), ("apps".to_string(), "v1".to_string()));
/// assert_eq!(parse_api_version("v1"), (String::new(), "v1".to_string()));
/// ```
#[must_use]
pub fn parse_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

/// Group/version/kind of an unstructured object.
///
/// # Errors
///
/// Returns an error if the object carries no type information.
pub fn object_gvk(object: &DynamicObject) -> Result<GroupVersionKind> {
    let kind = object_kind(object);
    let api_version = object_api_version(object);
    if kind.is_empty() || api_version.is_empty() {
        return Err(anyhow!(
            "object {} has no apiVersion or kind",
            object.metadata.name.as_deref().unwrap_or("<unnamed>")
        ));
    }
    let (group, version) = parse_api_version(api_version);
    Ok(GroupVersionKind {
        group,
        version,
        kind: kind.to_string(),
    })
}

/// Whether delete-by-label skips this kind.
#[must_use]
pub fn is_excluded_from_delete(kind: &str) -> bool {
    DELETE_EXCLUDED_KINDS.contains(&kind)
}

async fn run_discovery(client: &Client) -> Result<Discovery> {
    Discovery::new(client.clone())
        .run()
        .await
        .context("API discovery failed")
}

/// Apply unstructured objects in the given order.
///
/// Each object is created when absent and server-side applied otherwise. Discovery
/// is re-run once when an object's kind is unknown after CRDs were applied in the
/// same batch.
///
/// # Errors
///
/// Returns an error on the first object that cannot be resolved or applied.
pub async fn apply_objects(
    client: &Client,
    objects: &[DynamicObject],
    field_manager: &str,
) -> Result<usize> {
    let mut discovery = run_discovery(client).await?;
    let mut crds_since_discovery = false;
    let mut applied = 0;

    for object in objects {
        let gvk = object_gvk(object)?;

        let resolved = match discovery.resolve_gvk(&gvk) {
            Some(found) => Some(found),
            None if crds_since_discovery => {
                debug!(kind = %gvk.kind, "Re-running discovery after CRD install");
                discovery = run_discovery(client).await?;
                crds_since_discovery = false;
                discovery.resolve_gvk(&gvk)
            }
            None => None,
        };
        let (api_resource, caps) = resolved.ok_or_else(|| {
            anyhow!(
                "unknown resource type {}/{}",
                object_api_version(object),
                gvk.kind
            )
        })?;

        create_or_apply_dynamic(client, &api_resource, &caps, object, field_manager).await?;
        if gvk.kind == "CustomResourceDefinition" {
            crds_since_discovery = true;
        }
        applied += 1;
    }

    Ok(applied)
}

async fn create_or_apply_dynamic(
    client: &Client,
    api_resource: &ApiResource,
    caps: &ApiCapabilities,
    object: &DynamicObject,
    field_manager: &str,
) -> Result<()> {
    let name = object
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| anyhow!("{} must have a name", api_resource.kind))?;

    let api: Api<DynamicObject> = match (&caps.scope, object.metadata.namespace.as_deref()) {
        (Scope::Namespaced, Some(ns)) => Api::namespaced_with(client.clone(), ns, api_resource),
        (Scope::Namespaced, None) => Api::default_namespaced_with(client.clone(), api_resource),
        (Scope::Cluster, _) => Api::all_with(client.clone(), api_resource),
    };

    if api.get_opt(name).await?.is_some() {
        api.patch(
            name,
            &PatchParams::apply(field_manager).force(),
            &Patch::Apply(object),
        )
        .await
        .with_context(|| format!("failed to apply {} {name}", api_resource.kind))?;
        debug!(kind = %api_resource.kind, name = %name, "Applied object");
    } else {
        api.create(&PostParams::default(), object)
            .await
            .with_context(|| format!("failed to create {} {name}", api_resource.kind))?;
        debug!(kind = %api_resource.kind, name = %name, "Created object");
    }
    Ok(())
}

/// Delete every object carrying labels matching `selector`, across all namespaces.
///
/// Namespaces and CRDs are never deleted. Not-found is tolerated.
///
/// # Errors
///
/// Returns an error if discovery, a list, or a delete call fails.
pub async fn delete_by_label(client: &Client, selector: &str) -> Result<usize> {
    let discovery = run_discovery(client).await?;
    let params = ListParams::default().labels(selector);
    let mut deleted = 0;

    for group in discovery.groups() {
        for (api_resource, caps) in group.recommended_resources() {
            if is_excluded_from_delete(&api_resource.kind)
                || !caps.supports_operation(verbs::LIST)
                || !caps.supports_operation(verbs::DELETE)
            {
                continue;
            }

            let all: Api<DynamicObject> = Api::all_with(client.clone(), &api_resource);
            let list = match all.list_metadata(&params).await {
                Ok(list) => list,
                Err(kube::Error::Api(e)) if e.code == 404 || e.code == 405 => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("failed to list {}", api_resource.plural))
                }
            };

            for item in list.items {
                let name = item.name_any();
                let api: Api<DynamicObject> = match (&caps.scope, item.namespace()) {
                    (Scope::Namespaced, Some(ns)) => {
                        Api::namespaced_with(client.clone(), &ns, &api_resource)
                    }
                    _ => Api::all_with(client.clone(), &api_resource),
                };

                match api.delete(&name, &DeleteParams::background()).await {
                    Ok(_) => {
                        deleted += 1;
                        debug!(kind = %api_resource.kind, name = %name, "Deleted object");
                    }
                    Err(kube::Error::Api(e)) if e.code == 404 => {
                        warn!(kind = %api_resource.kind, name = %name, "Object already gone");
                    }
                    Err(e) => {
                        return Err(e)
                            .with_context(|| format!("failed to delete {} {name}", api_resource.kind))
                    }
                }
            }
        }
    }

    info!(selector = %selector, deleted, "Deleted labelled objects");
    Ok(deleted)
}

/// Whether a Deployment reports the `Available=True` condition.
#[must_use]
pub fn deployment_available(deployment: &Deployment) -> bool {
    deployment
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Available" && c.status == "True")
        })
}

/// Wait up to `timeout` for a Deployment to become available.
///
/// Returns `Ok(false)` on timeout. A missing Deployment counts as not available.
///
/// # Errors
///
/// Returns an error if the underlying watch fails.
pub async fn wait_for_deployment(
    client: &Client,
    namespace: &str,
    name: &str,
    timeout: Duration,
) -> Result<bool> {
    let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let condition = await_condition(api, name, |d: Option<&Deployment>| {
        d.is_some_and(deployment_available)
    });

    match tokio::time::timeout(timeout, condition).await {
        Ok(Ok(_)) => Ok(true),
        Ok(Err(e)) => Err(anyhow!("failed waiting for Deployment {namespace}/{name}: {e}")),
        Err(_) => {
            warn!(namespace = %namespace, name = %name, ?timeout, "Timed out waiting for Deployment");
            Ok(false)
        }
    }
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod resources_tests;
