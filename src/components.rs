// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provider components: the processed object list for one provider version.
//!
//! Building [`Components`] from raw YAML substitutes variables, moves every
//! namespaced object into the provider namespace, and stamps the labels the
//! delete phase later selects on.

use crate::labels::{CLUSTERCTL_LABEL, PROVIDER_LABEL};
use crate::provider::ProviderKind;
use crate::yaml_processor;
use anyhow::Result;
use kube::api::DynamicObject;
use serde_json::Value;
use std::collections::BTreeMap;

const CERT_MANAGER_INJECT_CA_ANNOTATION: &str = "cert-manager.io/inject-ca-from";

/// Kinds that are never namespaced.
const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "Namespace",
    "CustomResourceDefinition",
    "ClusterRole",
    "ClusterRoleBinding",
    "MutatingWebhookConfiguration",
    "ValidatingWebhookConfiguration",
    "APIService",
    "PriorityClass",
    "StorageClass",
    "PersistentVolume",
    "IngressClass",
    "ClusterIssuer",
];

/// Inputs needed to build [`Components`].
#[derive(Clone, Debug)]
pub struct ComponentsOptions<'a> {
    pub provider_name: &'a str,
    pub provider_kind: ProviderKind,
    pub version: &'a str,
    pub target_namespace: &'a str,
    pub skip_template_process: bool,
}

/// Processed manifests of one provider version.
#[derive(Clone, Debug)]
pub struct Components {
    name: String,
    kind: ProviderKind,
    version: String,
    target_namespace: String,
    objects: Vec<DynamicObject>,
}

impl Components {
    /// Process raw components YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or a variable without default has no value.
    pub fn new(
        raw: &str,
        variables: &BTreeMap<String, String>,
        options: &ComponentsOptions<'_>,
    ) -> Result<Self> {
        let mut objects = if options.skip_template_process {
            yaml_processor::parse_objects(raw)?
        } else {
            yaml_processor::process_objects(raw, variables)?
        };

        let label = options
            .provider_kind
            .provider_label_value(options.provider_name);
        fix_target_namespace(&mut objects, options.target_namespace);
        add_common_labels(&mut objects, &label);

        Ok(Self {
            name: options.provider_name.to_string(),
            kind: options.provider_kind,
            version: options.version.to_string(),
            target_namespace: options.target_namespace.to_string(),
            objects,
        })
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Value of the provider label on every object.
    #[must_use]
    pub fn provider_label(&self) -> String {
        self.kind.provider_label_value(&self.name)
    }

    #[must_use]
    pub fn objects(&self) -> &[DynamicObject] {
        &self.objects
    }

    pub fn set_objects(&mut self, objects: Vec<DynamicObject>) {
        self.objects = objects;
    }

    /// Append extra objects, giving them the same namespace and labels.
    pub fn extend(&mut self, mut objects: Vec<DynamicObject>) {
        fix_target_namespace(&mut objects, &self.target_namespace);
        add_common_labels(&mut objects, &self.provider_label());
        self.objects.extend(objects);
    }

    /// Objects ordered for apply.
    #[must_use]
    pub fn objects_in_apply_order(&self) -> Vec<DynamicObject> {
        let mut objects = self.objects.clone();
        sort_for_apply(&mut objects);
        objects
    }
}

/// Kind of an unstructured object, or `""`.
#[must_use]
pub fn object_kind(object: &DynamicObject) -> &str {
    object.types.as_ref().map_or("", |t| t.kind.as_str())
}

/// API version of an unstructured object, or `""`.
#[must_use]
pub fn object_api_version(object: &DynamicObject) -> &str {
    object.types.as_ref().map_or("", |t| t.api_version.as_str())
}

#[must_use]
pub fn is_cluster_scoped(kind: &str) -> bool {
    CLUSTER_SCOPED_KINDS.contains(&kind)
}

/// Apply priority of a kind (lower applies first).
#[must_use]
pub fn kind_priority(kind: &str) -> u8 {
    match kind {
        "Namespace" => 0,
        "CustomResourceDefinition" => 1,
        "ServiceAccount" => 2,
        "ClusterRole" | "Role" => 3,
        "ClusterRoleBinding" | "RoleBinding" => 4,
        "ConfigMap" | "Secret" => 5,
        "Issuer" | "ClusterIssuer" | "Certificate" => 6,
        "Service" => 7,
        "MutatingWebhookConfiguration" | "ValidatingWebhookConfiguration" => 8,
        "Deployment" | "DaemonSet" | "StatefulSet" => 9,
        _ => 10,
    }
}

/// Stable sort by [`kind_priority`].
pub fn sort_for_apply(objects: &mut [DynamicObject]) {
    objects.sort_by_key(|o| kind_priority(object_kind(o)));
}

/// Move namespaced objects and namespace references into `namespace`.
pub fn fix_target_namespace(objects: &mut [DynamicObject], namespace: &str) {
    let previous = objects
        .iter()
        .filter(|o| object_kind(o) == "Namespace")
        .find_map(|o| o.metadata.name.clone());

    for object in objects.iter_mut() {
        let kind = object_kind(object).to_string();

        if kind == "Namespace" {
            object.metadata.name = Some(namespace.to_string());
            continue;
        }
        if !is_cluster_scoped(&kind) {
            object.metadata.namespace = Some(namespace.to_string());
        }

        match kind.as_str() {
            "ClusterRoleBinding" | "RoleBinding" => fix_subjects(&mut object.data, namespace),
            "MutatingWebhookConfiguration" | "ValidatingWebhookConfiguration" => {
                fix_webhooks(&mut object.data, namespace);
            }
            "CustomResourceDefinition" => {
                if let Some(service) = object
                    .data
                    .pointer_mut("/spec/conversion/webhook/clientConfig/service")
                {
                    set_namespace_field(service, namespace);
                }
            }
            "Certificate" => {
                if let Some(previous) = previous.as_deref() {
                    fix_dns_names(&mut object.data, previous, namespace);
                }
            }
            _ => {}
        }

        fix_inject_ca_annotation(object, namespace);
    }
}

fn fix_subjects(data: &mut Value, namespace: &str) {
    let Some(subjects) = data.get_mut("subjects").and_then(Value::as_array_mut) else {
        return;
    };
    for subject in subjects {
        if subject.get("kind").and_then(Value::as_str) == Some("ServiceAccount") {
            set_namespace_field(subject, namespace);
        }
    }
}

fn fix_webhooks(data: &mut Value, namespace: &str) {
    let Some(webhooks) = data.get_mut("webhooks").and_then(Value::as_array_mut) else {
        return;
    };
    for webhook in webhooks {
        if let Some(service) = webhook.pointer_mut("/clientConfig/service") {
            set_namespace_field(service, namespace);
        }
    }
}

fn set_namespace_field(value: &mut Value, namespace: &str) {
    if let Some(map) = value.as_object_mut() {
        map.insert("namespace".to_string(), Value::from(namespace));
    }
}

/// Rewrite `svc.<previous>.svc[.cluster.local]` style DNS names.
fn fix_dns_names(data: &mut Value, previous: &str, namespace: &str) {
    let Some(names) = data
        .pointer_mut("/spec/dnsNames")
        .and_then(Value::as_array_mut)
    else {
        return;
    };
    let needle = format!(".{previous}.svc");
    let replacement = format!(".{namespace}.svc");
    for name in names {
        if let Some(s) = name.as_str() {
            if s.contains(&needle) {
                *name = Value::from(s.replacen(&needle, &replacement, 1));
            }
        }
    }
}

/// `cert-manager.io/inject-ca-from: <ns>/<certificate>` follows the namespace.
fn fix_inject_ca_annotation(object: &mut DynamicObject, namespace: &str) {
    let Some(annotations) = object.metadata.annotations.as_mut() else {
        return;
    };
    if let Some(value) = annotations.get_mut(CERT_MANAGER_INJECT_CA_ANNOTATION) {
        if let Some((_, certificate)) = value.split_once('/') {
            *value = format!("{namespace}/{certificate}");
        }
    }
}

/// Stamp the provider and clusterctl labels on every object.
pub fn add_common_labels(objects: &mut [DynamicObject], provider_label: &str) {
    for object in objects {
        let labels = object.metadata.labels.get_or_insert_with(BTreeMap::new);
        labels.insert(PROVIDER_LABEL.to_string(), provider_label.to_string());
        labels.insert(CLUSTERCTL_LABEL.to_string(), String::new());
    }
}

#[cfg(test)]
#[path = "components_tests.rs"]
mod components_tests;
