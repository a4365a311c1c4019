// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Release metadata (`metadata.yaml`) and contract resolution.
//!
//! ```yaml
//! apiVersion: clusterctl.cluster.x-k8s.io/v1alpha3
//! kind: Metadata
//! releaseSeries:
//!   - major: 1
//!     minor: 6
//!     contract: v1beta1
//! ```

use super::parse_version;
use crate::constants::{METADATA_FILE, SUPPORTED_CONTRACTS};
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Decoded `metadata.yaml`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub release_series: Vec<ReleaseSeries>,
}

/// A `major.minor` release line and the Cluster API contract it implements.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ReleaseSeries {
    pub major: u64,
    pub minor: u64,
    pub contract: String,
}

impl Metadata {
    /// Decode `metadata.yaml` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a YAML metadata document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_yaml::from_slice(bytes).context("failed to decode release metadata")
    }

    /// Series covering `version`, matched on major and minor.
    #[must_use]
    pub fn release_series_for(&self, version: &semver::Version) -> Option<&ReleaseSeries> {
        self.release_series
            .iter()
            .find(|s| s.major == version.major && s.minor == version.minor)
    }
}

/// Resolve and check the contract a release implements.
///
/// Returns the contract when it is one this operator supports.
///
/// # Errors
///
/// Returns an error if the version does not parse, the metadata does not decode,
/// no release series covers the version, or its contract is unsupported.
pub fn validate_contract(metadata: &[u8], version: &str) -> Result<String> {
    let parsed = parse_version(version).with_context(|| format!("invalid version {version}"))?;
    let metadata = Metadata::from_bytes(metadata)?;

    let series = metadata.release_series_for(&parsed).ok_or_else(|| {
        anyhow!("release series for version {version} not found in {METADATA_FILE}")
    })?;

    if !SUPPORTED_CONTRACTS.contains(&series.contract.as_str()) {
        bail!(
            "contract {} of version {version} is not supported, expected one of {}",
            series.contract,
            SUPPORTED_CONTRACTS.join(", ")
        );
    }

    Ok(series.contract.clone())
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod metadata_tests;
