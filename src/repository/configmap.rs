// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-cluster repository backed by label-selected `ConfigMaps`.
//!
//! Each `ConfigMap` holds one release:
//!
//! - version: label `provider.cluster.x-k8s.io/version`, else the `ConfigMap` name
//! - `data["metadata"]`: release metadata (required)
//! - `data["components"]`, or gzip `binaryData["components"]` when annotated with
//!   `provider.cluster.x-k8s.io/compressed: "true"` (required)
//!
//! Releases are ordered ascending by semver, then by `ConfigMap` name. When two
//! `ConfigMaps` carry the same version, the first by name wins. The default version
//! is the lowest one and the latest version is the highest.

use super::compression::decompress;
use super::{parse_version, Repository, RepositoryError};
use crate::constants::{
    COMPONENTS_FILE, CONFIGMAP_COMPONENTS_KEY, CONFIGMAP_METADATA_KEY, METADATA_FILE,
};
use crate::labels::{COMPRESSED_ANNOTATION, CONFIGMAP_VERSION_LABEL};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::ResourceExt;
use tracing::{debug, warn};

#[derive(Debug)]
struct Release {
    version: semver::Version,
    raw_version: String,
    source: String,
    metadata: Vec<u8>,
    components: Vec<u8>,
}

/// Repository built from a set of `ConfigMaps`.
#[derive(Debug)]
pub struct ConfigMapRepository {
    releases: Vec<Release>,
}

impl ConfigMapRepository {
    /// Build the repository from already listed `ConfigMaps`.
    ///
    /// # Errors
    ///
    /// Returns an error if no `ConfigMap` is given, or if any of them has an invalid
    /// version or lacks metadata or components.
    pub fn new(config_maps: &[ConfigMap]) -> Result<Self, RepositoryError> {
        let mut releases = config_maps
            .iter()
            .map(release_from_config_map)
            .collect::<Result<Vec<_>, _>>()?;

        if releases.is_empty() {
            return Err(RepositoryError::NoVersions);
        }

        releases.sort_by(|a, b| {
            a.version
                .cmp(&b.version)
                .then_with(|| a.source.cmp(&b.source))
        });
        releases.dedup_by(|later, earlier| {
            if later.version == earlier.version {
                warn!(
                    version = %later.raw_version,
                    kept = %earlier.source,
                    ignored = %later.source,
                    "Duplicate provider version in ConfigMap repository"
                );
                true
            } else {
                false
            }
        });

        Ok(Self { releases })
    }

    /// Versions in ascending order, as written on the `ConfigMaps`.
    #[must_use]
    pub fn versions(&self) -> Vec<&str> {
        self.releases.iter().map(|r| r.raw_version.as_str()).collect()
    }

    fn release(&self, version: &str) -> Result<&Release, RepositoryError> {
        let not_found = || RepositoryError::VersionNotFound {
            version: version.to_string(),
        };
        let wanted = parse_version(version).map_err(|_| not_found())?;
        self.releases
            .iter()
            .find(|r| r.version == wanted)
            .ok_or_else(not_found)
    }
}

#[async_trait]
impl Repository for ConfigMapRepository {
    fn components_path(&self) -> &str {
        COMPONENTS_FILE
    }

    fn default_version(&self) -> &str {
        // new() guarantees at least one release
        self.releases
            .first()
            .map_or("", |r| r.raw_version.as_str())
    }

    fn latest_version(&self) -> &str {
        self.releases
            .last()
            .map_or("", |r| r.raw_version.as_str())
    }

    async fn get_file(&self, version: &str, path: &str) -> Result<Vec<u8>, RepositoryError> {
        let release = self.release(version)?;
        match path {
            METADATA_FILE => Ok(release.metadata.clone()),
            COMPONENTS_FILE => Ok(release.components.clone()),
            _ => Err(RepositoryError::FileNotFound {
                version: version.to_string(),
                path: path.to_string(),
            }),
        }
    }
}

fn release_from_config_map(cm: &ConfigMap) -> Result<Release, RepositoryError> {
    let name = cm.name_any();
    let source = match cm.namespace() {
        Some(ns) => format!("{ns}/{name}"),
        None => name.clone(),
    };

    let (raw_version, origin) = match cm.labels().get(CONFIGMAP_VERSION_LABEL) {
        Some(label) => (
            label.clone(),
            format!("Label {CONFIGMAP_VERSION_LABEL}"),
        ),
        None => (name.clone(), "Name".to_string()),
    };
    let version = parse_version(&raw_version).map_err(|_| RepositoryError::InvalidVersion {
        name: source.clone(),
        version: raw_version.clone(),
        origin,
    })?;

    let data = cm.data.as_ref();
    let metadata = data
        .and_then(|d| d.get(CONFIGMAP_METADATA_KEY))
        .ok_or_else(|| RepositoryError::MissingMetadata {
            name: source.clone(),
        })?
        .as_bytes()
        .to_vec();

    let components = match data.and_then(|d| d.get(CONFIGMAP_COMPONENTS_KEY)) {
        Some(plain) => plain.as_bytes().to_vec(),
        None => compressed_components(cm, &source)?,
    };

    debug!(configmap = %source, version = %raw_version, "Loaded provider release from ConfigMap");

    Ok(Release {
        version,
        raw_version,
        source,
        metadata,
        components,
    })
}

fn compressed_components(cm: &ConfigMap, source: &str) -> Result<Vec<u8>, RepositoryError> {
    let missing = || RepositoryError::MissingComponents {
        name: source.to_string(),
    };

    let compressed = cm
        .annotations()
        .get(COMPRESSED_ANNOTATION)
        .is_some_and(|v| v == "true");
    if !compressed {
        return Err(missing());
    }

    let bytes = cm
        .binary_data
        .as_ref()
        .and_then(|b| b.get(CONFIGMAP_COMPONENTS_KEY))
        .ok_or_else(missing)?;

    decompress(&bytes.0).map_err(|source_err| RepositoryError::Decompress {
        name: source.to_string(),
        source: source_err,
    })
}

#[cfg(test)]
#[path = "configmap_tests.rs"]
mod configmap_tests;
