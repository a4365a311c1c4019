// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Standard status condition types, reasons and severities for provider resources.
//!
//! Reasons are programmatic identifiers in CamelCase that explain why a condition has
//! a particular status. The values match what Cluster API tooling expects to read.
//!
//! # Condition Types
//!
//! Every provider resource carries three owned conditions:
//!
//! - **`PreflightCheck`** - spec validation, sibling providers, contract compatibility
//! - **`ProviderInstalled`** - components applied and deployments available
//! - **`Ready`** - summary of the two above
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   installedVersion: v1.6.0
//!   contract: v1beta1
//!   conditions:
//!     - type: Ready
//!       status: "False"
//!       severity: Info
//!       reason: WaitingForCoreProviderReady
//!       message: "Waiting for the CoreProvider to be installed."
//!     - type: PreflightCheck
//!       status: "False"
//!       severity: Info
//!       reason: WaitingForCoreProviderReady
//!       message: "Waiting for the CoreProvider to be installed."
//! ```

// ============================================================================
// Condition Types
// ============================================================================

/// Summary condition, computed from [`CONDITION_TYPE_PREFLIGHT_CHECK`] and
/// [`CONDITION_TYPE_PROVIDER_INSTALLED`].
pub const CONDITION_TYPE_READY: &str = "Ready";

/// Outcome of preflight validation, configuration load and component fetch.
pub const CONDITION_TYPE_PREFLIGHT_CHECK: &str = "PreflightCheck";

/// Outcome of installing (or removing) provider components.
pub const CONDITION_TYPE_PROVIDER_INSTALLED: &str = "ProviderInstalled";

/// Conditions written by the operator; all others are left untouched on patch.
pub const OWNED_CONDITION_TYPES: [&str; 3] = [
    CONDITION_TYPE_PREFLIGHT_CHECK,
    CONDITION_TYPE_PROVIDER_INSTALLED,
    CONDITION_TYPE_READY,
];

// ============================================================================
// Condition Status Values
// ============================================================================

pub const STATUS_TRUE: &str = "True";
pub const STATUS_FALSE: &str = "False";
pub const STATUS_UNKNOWN: &str = "Unknown";

// ============================================================================
// Severities
// ============================================================================

/// Condition is false because of a failure that needs user action.
pub const SEVERITY_ERROR: &str = "Error";

/// Condition is false because of a failure that may resolve on retry.
pub const SEVERITY_WARNING: &str = "Warning";

/// Condition is false while waiting on something expected to happen.
pub const SEVERITY_INFO: &str = "Info";

// ============================================================================
// PreflightCheck Reasons
// ============================================================================

/// `spec.version` is empty and nothing is installed yet.
pub const REASON_EMPTY_VERSION: &str = "EmptyVersion";

/// `spec.version` is not a semantic version.
pub const REASON_INCORRECT_VERSION_FORMAT: &str = "IncorrectVersionFormat";

/// `spec.fetchConfig` sets both `url` and `selector`.
pub const REASON_FETCH_CONFIG_VALIDATION_ERROR: &str = "FetchConfigValidationError";

/// Another provider of the same kind conflicts with this one.
pub const REASON_MORE_THAN_ONE_PROVIDER_INSTANCE_EXISTS: &str =
    "MoreThanOneProviderInstanceExists";

/// Non-core providers wait until a `CoreProvider` reports Ready.
pub const REASON_WAITING_FOR_CORE_PROVIDER_READY: &str = "WaitingForCoreProviderReady";

/// Release metadata does not declare a supported contract for the version.
pub const REASON_CAPI_VERSION_INCOMPATIBILITY: &str = "CAPIVersionIncompatibility";

/// No repository is known for the provider.
pub const REASON_UNKNOWN_PROVIDER: &str = "UnknownProvider";

/// Reading or processing components failed.
pub const REASON_COMPONENTS_FETCH_ERROR: &str = "ComponentsFetchError";

// ============================================================================
// ProviderInstalled Reasons
// ============================================================================

/// Applying components failed.
pub const REASON_INSTALL_FAILED: &str = "InstallFailed";

/// Provider deployments did not become available in time.
pub const REASON_TIMED_OUT_WAITING_FOR_DEPLOYMENT_READY: &str =
    "TimedoutWaitingForDeploymentReady";

/// Removing previously installed components failed.
pub const REASON_OLD_COMPONENTS_DELETION_ERROR: &str = "OldComponentsDeletionError";

// ============================================================================
// Messages
// ============================================================================

/// Message used when a second `CoreProvider` is found.
pub const MESSAGE_CORE_PROVIDER_SINGLETON: &str =
    "CoreProvider already exists in the cluster. Only one is allowed.";

/// Message used while waiting for the core provider.
pub const MESSAGE_WAITING_FOR_CORE_PROVIDER: &str =
    "Waiting for the CoreProvider to be installed.";

/// Message used for a conflicting non-core provider name.
///
/// # Example
///
/// ```rust
/// use capi_operator::status_reasons::more_than_one_provider_message;
///
/// assert_eq!(
///     more_than_one_provider_message("InfrastructureProvider", "aws", "capa-system"),
///     "There is already a InfrastructureProvider with name aws in namespace capa-system. \
///      Only one is allowed."
/// );
/// ```
#[must_use]
pub fn more_than_one_provider_message(kind: &str, name: &str, namespace: &str) -> String {
    format!(
        "There is already a {kind} with name {name} in namespace {namespace}. \
         Only one is allowed."
    )
}

/// Rank of a severity, higher is worse. Unknown or missing severities rank lowest.
#[must_use]
pub fn severity_rank(severity: Option<&str>) -> u8 {
    match severity {
        Some(SEVERITY_ERROR) => 3,
        Some(SEVERITY_WARNING) => 2,
        Some(SEVERITY_INFO) => 1,
        _ => 0,
    }
}

#[cfg(test)]
#[path = "status_reasons_tests.rs"]
mod status_reasons_tests;
