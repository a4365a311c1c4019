// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Components cache `ConfigMaps`.
//!
//! After a remote fetch, the release metadata and components are stored in the
//! provider namespace so later reconciles of the same version read them through
//! a [`ConfigMapRepository`](super::configmap::ConfigMapRepository).

use super::compression::compress;
use crate::constants::{
    CONFIGMAP_COMPONENTS_KEY, CONFIGMAP_METADATA_KEY, MAX_CONFIGMAP_COMPONENTS_BYTES,
};
use crate::labels::{
    COMPRESSED_ANNOTATION, CONFIGMAP_NAME_LABEL, CONFIGMAP_TYPE_LABEL, CONFIGMAP_VERSION_LABEL,
    OPERATOR_MANAGED_LABEL,
};
use crate::provider::ProviderKind;
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta, OwnerReference};
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

/// Identity of a cached release.
#[derive(Clone, Copy, Debug)]
pub struct CacheKey<'a> {
    pub kind: ProviderKind,
    pub name: &'a str,
    pub version: &'a str,
}

impl CacheKey<'_> {
    /// `{type}-{provider}-{version}`
    ///
    /// ```
    /// use capi_operator::provider::ProviderKind;
    /// use capi_operator::repository::cache::CacheKey;
    ///
    /// let key = CacheKey { kind: ProviderKind::Infrastructure, name: "aws", version: "v2.3.0" };
    /// assert_eq!(key.config_map_name(), "infrastructure-aws-v2.3.0");
    /// ```
    #[must_use]
    pub fn config_map_name(&self) -> String {
        format!("{}-{}-{}", self.kind.type_slug(), self.name, self.version)
    }

    #[must_use]
    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (CONFIGMAP_NAME_LABEL.to_string(), self.name.to_string()),
            (
                CONFIGMAP_TYPE_LABEL.to_string(),
                self.kind.type_slug().to_string(),
            ),
            (CONFIGMAP_VERSION_LABEL.to_string(), self.version.to_string()),
            (OPERATOR_MANAGED_LABEL.to_string(), "true".to_string()),
        ])
    }

    /// Label selector matching the cache `ConfigMap` of this release.
    #[must_use]
    pub fn selector(&self) -> LabelSelector {
        LabelSelector {
            match_labels: Some(self.labels()),
            match_expressions: None,
        }
    }
}

/// Build the cache `ConfigMap` for a fetched release.
///
/// Components larger than 1 MiB are gzip-compressed into `binaryData`.
///
/// # Errors
///
/// Returns an error if the metadata or the uncompressed components are not UTF-8,
/// or if compression fails.
pub fn build_cache_config_map(
    key: &CacheKey<'_>,
    namespace: &str,
    metadata: &[u8],
    components: &[u8],
    owner: Option<OwnerReference>,
) -> Result<ConfigMap> {
    let metadata = std::str::from_utf8(metadata)
        .context("release metadata is not valid UTF-8")?
        .to_string();

    let mut data = BTreeMap::from([(CONFIGMAP_METADATA_KEY.to_string(), metadata)]);
    let mut binary_data = None;
    let mut annotations = None;

    if components.len() > MAX_CONFIGMAP_COMPONENTS_BYTES {
        let compressed = compress(components).context("failed to compress components")?;
        binary_data = Some(BTreeMap::from([(
            CONFIGMAP_COMPONENTS_KEY.to_string(),
            ByteString(compressed),
        )]));
        annotations = Some(BTreeMap::from([(
            COMPRESSED_ANNOTATION.to_string(),
            "true".to_string(),
        )]));
    } else {
        let components = std::str::from_utf8(components)
            .context("components are not valid UTF-8")?
            .to_string();
        data.insert(CONFIGMAP_COMPONENTS_KEY.to_string(), components);
    }

    Ok(ConfigMap {
        metadata: ObjectMeta {
            name: Some(key.config_map_name()),
            namespace: Some(namespace.to_string()),
            labels: Some(key.labels()),
            annotations,
            owner_references: owner.map(|o| vec![o]),
            ..Default::default()
        },
        data: Some(data),
        binary_data,
        ..Default::default()
    })
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod cache_tests;
