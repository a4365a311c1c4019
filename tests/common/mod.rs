// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use capi_operator::cluster_client::{ClusterClient, ProviderSummary};
use capi_operator::context::{install_crypto_provider, PhaseContext, PhaseSettings};
use capi_operator::labels::CONFIGMAP_VERSION_LABEL;
use capi_operator::provider::ProviderKind;
use capi_operator::selector;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::ByteString;
use kube::api::DynamicObject;
use kube::client::Client;
use kube::ResourceExt;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const METADATA_YAML: &str = r"apiVersion: clusterctl.cluster.x-k8s.io/v1alpha3
kind: Metadata
releaseSeries:
  - major: 1
    minor: 2
    contract: v1beta1
  - major: 1
    minor: 5
    contract: v1beta1
  - major: 1
    minor: 6
    contract: v1beta1
  - major: 2
    minor: 3
    contract: v1beta1
";

pub const COMPONENTS_YAML: &str = r"apiVersion: v1
kind: Namespace
metadata:
  name: capi-system
---
apiVersion: v1
kind: ServiceAccount
metadata:
  name: capi-manager
  namespace: capi-system
---
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: clusters.cluster.x-k8s.io
spec:
  group: cluster.x-k8s.io
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: capi-controller-manager
  namespace: capi-system
spec:
  selector:
    matchLabels:
      control-plane: controller-manager
  template:
    metadata:
      labels:
        control-plane: controller-manager
    spec:
      containers:
        - name: manager
          image: registry.k8s.io/cluster-api/cluster-api-controller:${CAPI_IMAGE_TAG:=v1.6.0}
          args:
            - --leader-elect
            - --metrics-bind-addr=localhost:8080
";

/// Something the fake cluster was asked to do, in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Apply(usize),
    Delete(String),
    Wait(String),
    CreateConfigMap(String),
}

#[derive(Default)]
pub struct FakeState {
    pub providers: HashMap<ProviderKind, Vec<ProviderSummary>>,
    pub secrets: Vec<Secret>,
    pub config_maps: Vec<ConfigMap>,
    pub applied: Vec<DynamicObject>,
    pub calls: Vec<Call>,
    pub deployments_unavailable: bool,
    pub fail_delete: bool,
}

/// In-memory cluster implementing [`ClusterClient`].
#[derive(Default, Clone)]
pub struct FakeCluster {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(self, kind: ProviderKind, name: &str, namespace: &str, ready: bool) -> Self {
        self.state
            .lock()
            .unwrap()
            .providers
            .entry(kind)
            .or_default()
            .push(ProviderSummary {
                name: name.to_string(),
                namespace: namespace.to_string(),
                ready,
            });
        self
    }

    /// Adds a ready `CoreProvider` in `capi-system`.
    pub fn with_ready_core(self) -> Self {
        self.with_provider(ProviderKind::Core, "cluster-api", "capi-system", true)
    }

    pub fn with_secret(self, secret: Secret) -> Self {
        self.state.lock().unwrap().secrets.push(secret);
        self
    }

    pub fn with_config_map(self, config_map: ConfigMap) -> Self {
        self.state.lock().unwrap().config_maps.push(config_map);
        self
    }

    pub fn with_unavailable_deployments(self) -> Self {
        self.state.lock().unwrap().deployments_unavailable = true;
        self
    }

    pub fn with_failing_delete(self) -> Self {
        self.state.lock().unwrap().fail_delete = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn applied(&self) -> Vec<DynamicObject> {
        self.state.lock().unwrap().applied.clone()
    }

    pub fn config_map_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .config_maps
            .iter()
            .map(ResourceExt::name_any)
            .collect()
    }

    pub fn phase_context(&self) -> PhaseContext {
        PhaseContext {
            cluster: Arc::new(self.clone()),
            http_client: reqwest::Client::new(),
            github_token: None,
            settings: PhaseSettings {
                deployment_wait_timeout: Duration::from_secs(5),
                preflight_requeue_after: Duration::from_secs(30),
            },
        }
    }
}

fn labels_of(meta: &ObjectMeta) -> BTreeMap<String, String> {
    meta.labels.clone().unwrap_or_default()
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn list_providers(&self, kind: ProviderKind) -> Result<Vec<ProviderSummary>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .providers
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .secrets
            .iter()
            .find(|s| s.namespace().as_deref() == Some(namespace) && s.name_any() == name)
            .cloned())
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .config_maps
            .iter()
            .find(|c| c.namespace().as_deref() == Some(namespace) && c.name_any() == name)
            .cloned())
    }

    async fn list_config_maps(
        &self,
        namespace: &str,
        label_selector: &LabelSelector,
    ) -> Result<Vec<ConfigMap>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .config_maps
            .iter()
            .filter(|c| c.namespace().as_deref() == Some(namespace))
            .filter(|c| selector::matches(label_selector, &labels_of(&c.metadata)))
            .cloned()
            .collect())
    }

    async fn create_config_map(&self, config_map: &ConfigMap) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let name = config_map.name_any();
        if state.config_maps.iter().any(|c| {
            c.name_any() == name && c.namespace() == config_map.namespace()
        }) {
            bail!("configmaps \"{name}\" already exists");
        }
        state.calls.push(Call::CreateConfigMap(name));
        state.config_maps.push(config_map.clone());
        Ok(())
    }

    async fn apply_objects(&self, objects: &[DynamicObject]) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        for object in objects {
            let key = (object.types.clone(), object.namespace(), object.name_any());
            state
                .applied
                .retain(|o| (o.types.clone(), o.namespace(), o.name_any()) != key);
            state.applied.push(object.clone());
        }
        state.calls.push(Call::Apply(objects.len()));
        Ok(objects.len())
    }

    async fn wait_for_deployment_available(
        &self,
        namespace: &str,
        name: &str,
        _timeout: Duration,
    ) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Wait(format!("{namespace}/{name}")));
        Ok(!state.deployments_unavailable)
    }

    async fn delete_components(&self, label_selector: &LabelSelector) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let query = selector::to_query(label_selector)?;
        if state.fail_delete {
            bail!("the server is currently unable to handle the request");
        }
        state.calls.push(Call::Delete(query));

        let before = state.applied.len();
        state
            .applied
            .retain(|o| !selector::matches(label_selector, &labels_of(&o.metadata)));
        Ok(before - state.applied.len())
    }
}

/// `ConfigMap` holding one release for the `ConfigMap` repository.
pub fn release_config_map(
    namespace: &str,
    name: &str,
    version_label: Option<&str>,
    labels: &[(&str, &str)],
    components: &str,
) -> ConfigMap {
    let mut all_labels: BTreeMap<String, String> = labels
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    if let Some(version) = version_label {
        all_labels.insert(CONFIGMAP_VERSION_LABEL.to_string(), version.to_string());
    }

    ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(all_labels),
            ..Default::default()
        },
        data: Some(BTreeMap::from([
            ("metadata".to_string(), METADATA_YAML.to_string()),
            ("components".to_string(), components.to_string()),
        ])),
        ..Default::default()
    }
}

pub fn secret(namespace: &str, name: &str, data: &[(&str, &str)]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(
            data.iter()
                .map(|(k, v)| ((*k).to_string(), ByteString(v.as_bytes().to_vec())))
                .collect(),
        ),
        ..Default::default()
    }
}

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    install_crypto_provider();
    match Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test: not running in Kubernetes cluster: {e}");
            None
        }
    }
}
