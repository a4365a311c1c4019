// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Cluster API provider operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// Storage (hub) API version
pub const API_VERSION_V1ALPHA2: &str = "v1alpha2";

/// Kind name for `CoreProvider` resource
pub const KIND_CORE_PROVIDER: &str = "CoreProvider";

/// Kind name for `BootstrapProvider` resource
pub const KIND_BOOTSTRAP_PROVIDER: &str = "BootstrapProvider";

/// Kind name for `ControlPlaneProvider` resource
pub const KIND_CONTROL_PLANE_PROVIDER: &str = "ControlPlaneProvider";

/// Kind name for `InfrastructureProvider` resource
pub const KIND_INFRASTRUCTURE_PROVIDER: &str = "InfrastructureProvider";

/// Kind name for `IPAMProvider` resource
pub const KIND_IPAM_PROVIDER: &str = "IPAMProvider";

/// Kind name for `AddonProvider` resource
pub const KIND_ADDON_PROVIDER: &str = "AddonProvider";

/// Kind name for `RuntimeExtensionProvider` resource
pub const KIND_RUNTIME_EXTENSION_PROVIDER: &str = "RuntimeExtensionProvider";

/// Field manager used for server-side apply of provider components
pub const FIELD_MANAGER: &str = "capi-operator";

// ============================================================================
// Cluster API Contract Constants
// ============================================================================

/// Contracts this operator can install providers for
pub const SUPPORTED_CONTRACTS: [&str; 2] = ["v1alpha4", "v1beta1"];

// ============================================================================
// Repository Constants
// ============================================================================

/// Repository path of the release metadata file
pub const METADATA_FILE: &str = "metadata.yaml";

/// Repository path of the components file served by `ConfigMap` repositories
pub const COMPONENTS_FILE: &str = "components.yaml";

/// `ConfigMap` data key holding release metadata
pub const CONFIGMAP_METADATA_KEY: &str = "metadata";

/// `ConfigMap` data key holding components YAML
pub const CONFIGMAP_COMPONENTS_KEY: &str = "components";

/// `ConfigMap` data key holding additional manifests
pub const ADDITIONAL_MANIFESTS_KEY: &str = "manifests";

/// Components larger than this are gzip-compressed into `binaryData` (1 MiB)
pub const MAX_CONFIGMAP_COMPONENTS_BYTES: usize = 1_048_576;

/// Public GitHub host name
pub const GITHUB_HOST: &str = "github.com";

/// Public GitHub REST API base URL
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Number of releases requested per GitHub API page
pub const GITHUB_RELEASES_PER_PAGE: u32 = 100;

/// Timeout for a single HTTP request to a release repository
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// User agent sent to release repositories
pub const HTTP_USER_AGENT: &str = "capi-operator";

// ============================================================================
// Manager Container Constants
// ============================================================================

/// Name of the controller manager container inside provider deployments
pub const MANAGER_CONTAINER_NAME: &str = "manager";

/// Container argument that can never be overridden by deployment specs
pub const RESERVED_NAMESPACE_ARG: &str = "namespace";

/// Default manager verbosity; no `--v` flag is emitted for it
pub const DEFAULT_MANAGER_VERBOSITY: i32 = 1;

/// Tag used when an image override has none
pub const DEFAULT_IMAGE_TAG: &str = "latest";

// ============================================================================
// Controller Timing Constants
// ============================================================================

/// Requeue interval after a preflight or classified phase failure
pub const PREFLIGHT_FAILED_REQUEUE_AFTER_SECS: u64 = 30;

/// Requeue interval for a provider that is installed and ready (drift check)
pub const READY_REQUEUE_AFTER_SECS: u64 = 300;

/// Requeue interval after a transient reconcile error
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Default bound on waiting for provider deployments to become available
pub const DEFAULT_DEPLOYMENT_WAIT_TIMEOUT_SECS: u64 = 300;

// ============================================================================
// Leader Election Constants
// ============================================================================

/// Default lease name used by the operator replicas
pub const DEFAULT_LEADER_ELECTION_ID: &str = "controller-leader-election-capi-operator";

/// Default namespace for the leader election lease
pub const DEFAULT_LEADER_ELECTION_NAMESPACE: &str = "capi-operator-system";

/// Default lease duration in seconds
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 15;

/// Grace period for lease renewal in seconds
pub const DEFAULT_LEASE_GRACE_SECS: u64 = 5;

// ============================================================================
// HTTP Server Constants
// ============================================================================

/// Default bind address for metrics and health endpoints
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Runtime worker threads
pub const TOKIO_WORKER_THREADS: usize = 4;
