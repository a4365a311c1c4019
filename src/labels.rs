// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants used across all reconcilers.
//!
//! Cluster API tooling relies on these exact keys, so they must not be renamed.

// ============================================================================
// Provider Component Labels
// ============================================================================

/// Label stamped on every object installed for a provider; delete selects on it
pub const PROVIDER_LABEL: &str = "cluster.x-k8s.io/provider";

/// Marker label stamped on every installed component (empty value)
pub const CLUSTERCTL_LABEL: &str = "clusterctl.cluster.x-k8s.io";

// ============================================================================
// ConfigMap Repository Labels and Annotations
// ============================================================================

/// Optional label overriding the version of a repository `ConfigMap`
pub const CONFIGMAP_VERSION_LABEL: &str = "provider.cluster.x-k8s.io/version";

/// Provider name label on synthesized components `ConfigMaps`
pub const CONFIGMAP_NAME_LABEL: &str = "provider.cluster.x-k8s.io/name";

/// Provider type label on synthesized components `ConfigMaps`
pub const CONFIGMAP_TYPE_LABEL: &str = "provider.cluster.x-k8s.io/type";

/// Label marking objects created by the operator itself
pub const OPERATOR_MANAGED_LABEL: &str = "managed-by.operator.cluster.x-k8s.io";

/// Annotation signalling gzip-compressed `binaryData["components"]`
pub const COMPRESSED_ANNOTATION: &str = "provider.cluster.x-k8s.io/compressed";

// ============================================================================
// Conversion
// ============================================================================

/// Annotation carrying hub-only fields across down-conversion
pub const CONVERSION_DATA_ANNOTATION: &str = "cluster.x-k8s.io/conversion-data";

// ============================================================================
// Finalizers
// ============================================================================

/// Finalizer placed on every provider resource
pub const PROVIDER_FINALIZER: &str = "operator/provider";
