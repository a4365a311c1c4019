// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes API access used by the provider phases.
//!
//! The phase engine never talks to [`kube::Client`] directly. Everything it needs
//! from the API server goes through [`ClusterClient`], which keeps the phases
//! testable against an in-memory cluster.

use crate::constants::FIELD_MANAGER;
use crate::crd::v1alpha2::{
    AddonProvider, BootstrapProvider, ControlPlaneProvider, CoreProvider, IPAMProvider,
    InfrastructureProvider, RuntimeExtensionProvider,
};
use crate::provider::{GenericProvider, ProviderKind};
use crate::reconcilers::resources;
use crate::reconcilers::status::is_condition_true;
use crate::selector;
use crate::status_reasons::CONDITION_TYPE_READY;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::{DynamicObject, ListParams};
use kube::{Api, Client, ResourceExt};
use std::time::Duration;
use tracing::debug;

/// Identity and readiness of a provider found in the cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderSummary {
    pub name: String,
    pub namespace: String,
    pub ready: bool,
}

impl ProviderSummary {
    fn from_provider<T: GenericProvider>(provider: &T) -> Self {
        Self {
            name: provider.name_any(),
            namespace: provider.namespace().unwrap_or_default(),
            ready: is_condition_true(provider.conditions(), CONDITION_TYPE_READY),
        }
    }
}

/// API server operations needed by the phase engine.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Every provider of `kind`, across all namespaces.
    async fn list_providers(&self, kind: ProviderKind) -> Result<Vec<ProviderSummary>>;

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>>;

    async fn list_config_maps(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<ConfigMap>>;

    /// Create the `ConfigMap`, or update it when it already exists.
    async fn create_config_map(&self, config_map: &ConfigMap) -> Result<()>;

    /// Create or patch each object, in order. Returns the number applied.
    async fn apply_objects(&self, objects: &[DynamicObject]) -> Result<usize>;

    /// Wait until the Deployment reports `Available`. `Ok(false)` on timeout.
    async fn wait_for_deployment_available(
        &self,
        namespace: &str,
        name: &str,
        timeout: Duration,
    ) -> Result<bool>;

    /// Delete every component matching `selector`, sparing namespaces and CRDs.
    async fn delete_components(&self, selector: &LabelSelector) -> Result<usize>;
}

/// [`ClusterClient`] backed by a live API server.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn summaries<T: GenericProvider>(&self) -> Result<Vec<ProviderSummary>> {
        let api: Api<T> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .with_context(|| format!("failed to list {}s", T::KIND))?;
        Ok(list.items.iter().map(ProviderSummary::from_provider).collect())
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn list_providers(&self, kind: ProviderKind) -> Result<Vec<ProviderSummary>> {
        match kind {
            ProviderKind::Core => self.summaries::<CoreProvider>().await,
            ProviderKind::Bootstrap => self.summaries::<BootstrapProvider>().await,
            ProviderKind::ControlPlane => self.summaries::<ControlPlaneProvider>().await,
            ProviderKind::Infrastructure => self.summaries::<InfrastructureProvider>().await,
            ProviderKind::Ipam => self.summaries::<IPAMProvider>().await,
            ProviderKind::Addon => self.summaries::<AddonProvider>().await,
            ProviderKind::RuntimeExtension => self.summaries::<RuntimeExtensionProvider>().await,
        }
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .with_context(|| format!("failed to get Secret {namespace}/{name}"))
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .with_context(|| format!("failed to get ConfigMap {namespace}/{name}"))
    }

    async fn list_config_maps(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<ConfigMap>> {
        let query = selector::to_query(selector)?;
        debug!(namespace = %namespace, selector = %query, "Listing ConfigMaps");

        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default().labels(&query))
            .await
            .with_context(|| format!("failed to list ConfigMaps in {namespace}"))?;
        Ok(list.items)
    }

    async fn create_config_map(&self, config_map: &ConfigMap) -> Result<()> {
        let namespace = config_map.namespace().unwrap_or_default();
        resources::create_or_apply(&self.client, &namespace, config_map, FIELD_MANAGER).await
    }

    async fn apply_objects(&self, objects: &[DynamicObject]) -> Result<usize> {
        resources::apply_objects(&self.client, objects, FIELD_MANAGER).await
    }

    async fn wait_for_deployment_available(
        &self,
        namespace: &str,
        name: &str,
        timeout: Duration,
    ) -> Result<bool> {
        resources::wait_for_deployment(&self.client, namespace, name, timeout).await
    }

    async fn delete_components(&self, selector: &LabelSelector) -> Result<usize> {
        let query = selector::to_query(selector)?;
        resources::delete_by_label(&self.client, &query).await
    }
}
