// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provider release repositories.
//!
//! A repository serves files keyed by `(version, path)`. Two flavors exist:
//!
//! - [`configmap::ConfigMapRepository`] materializes versions from a label-selected
//!   set of in-cluster `ConfigMaps` (also used for the components cache).
//! - [`remote::RemoteRepository`] downloads release assets from a GitHub-style
//!   release page.
//!
//! The phase engine only sees the [`Repository`] trait.

pub mod cache;
pub mod compression;
pub mod configmap;
pub mod metadata;
pub mod registry;
pub mod remote;

use crate::provider::ProviderKind;
use async_trait::async_trait;
use thiserror::Error;

/// Files of a provider release, keyed by version and path.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Path of the components file inside a release.
    fn components_path(&self) -> &str;

    /// Version used when the provider does not pin one.
    fn default_version(&self) -> &str;

    /// Highest version the repository serves. Used when `spec.version` is empty.
    fn latest_version(&self) -> &str {
        self.default_version()
    }

    /// Read a file of the given release.
    ///
    /// # Errors
    ///
    /// Returns an error if the version or the file does not exist, or if it cannot be read.
    async fn get_file(&self, version: &str, path: &str) -> Result<Vec<u8>, RepositoryError>;
}

/// Where a provider's releases come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    pub url: String,
}

/// Errors raised while building or reading a repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("ConfigMap {name} has invalid version: {version} (from the {origin})")]
    InvalidVersion {
        name: String,
        version: String,
        origin: String,
    },

    #[error("ConfigMap {name} has no metadata")]
    MissingMetadata { name: String },

    #[error("ConfigMap {name} has no components")]
    MissingComponents { name: String },

    #[error("no provider versions found")]
    NoVersions,

    #[error("version {version} not found in repository")]
    VersionNotFound { version: String },

    #[error("file {path} not found for version {version}")]
    FileNotFound { version: String, path: String },

    #[error("failed to decompress components of ConfigMap {name}: {source}")]
    Decompress {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid repository URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("provider {name} of type {kind} is not registered")]
    UnknownProvider { name: String, kind: String },
}

/// Parse a release version, accepting an optional leading `v`.
///
/// ```
/// use capi_operator::repository::parse_version;
///
/// assert_eq!(parse_version("v1.2.3").unwrap(), semver::Version::new(1, 2, 3));
/// assert!(parse_version("latest").is_err());
/// ```
///
/// # Errors
///
/// Returns an error if the string is not a semantic version.
pub fn parse_version(version: &str) -> Result<semver::Version, semver::Error> {
    semver::Version::parse(version.strip_prefix('v').unwrap_or(version))
}
