// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers for provider resources.
//!
//! # Condition Format
//!
//! Provider conditions follow the Cluster API format:
//! - `type`: `Ready`, `PreflightCheck` or `ProviderInstalled`
//! - `status`: "True", "False", or "Unknown"
//! - `severity`: Error, Warning or Info (False conditions only)
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp when the status changed
//!
//! The operator owns `Ready`, `PreflightCheck` and `ProviderInstalled`. Any other
//! condition found on the live object is left untouched.
//!
//! # Example
//!
//! ```rust
//! use capi_operator::reconcilers::status::{mark_false, mark_true, summarize_ready};
//! use capi_operator::status_reasons::*;
//!
//! let mut conditions = Vec::new();
//! mark_true(&mut conditions, CONDITION_TYPE_PREFLIGHT_CHECK);
//! mark_false(
//!     &mut conditions,
//!     CONDITION_TYPE_PROVIDER_INSTALLED,
//!     REASON_INSTALL_FAILED,
//!     SEVERITY_WARNING,
//!     "apply failed",
//! );
//! let ready = summarize_ready(&conditions);
//! assert_eq!(ready.status, STATUS_FALSE);
//! assert_eq!(ready.reason.as_deref(), Some(REASON_INSTALL_FAILED));
//! ```

use crate::crd::{Condition, ProviderStatus};
use crate::provider::GenericProvider;
use crate::status_reasons::{
    severity_rank, CONDITION_TYPE_PREFLIGHT_CHECK, CONDITION_TYPE_PROVIDER_INSTALLED,
    CONDITION_TYPE_READY, OWNED_CONDITION_TYPES, STATUS_FALSE, STATUS_TRUE, STATUS_UNKNOWN,
};
use anyhow::Result;
use chrono::Utc;
use kube::api::Patch;
use kube::{api::PatchParams, Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

/// Conditions the Ready summary is computed from.
const SUMMARIZED_CONDITION_TYPES: [&str; 2] =
    [CONDITION_TYPE_PREFLIGHT_CHECK, CONDITION_TYPE_PROVIDER_INSTALLED];

/// Create a new condition with the current timestamp.
///
/// Empty `reason`, `severity` or `message` are left unset.
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    severity: &str,
    message: &str,
) -> Condition {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        severity: non_empty(severity),
        reason: non_empty(reason),
        message: non_empty(message),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition by type.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Whether the condition of this type exists with status True.
#[must_use]
pub fn is_condition_true(conditions: &[Condition], condition_type: &str) -> bool {
    find_condition(conditions, condition_type).is_some_and(|c| c.status == STATUS_TRUE)
}

/// Update or add a condition in memory.
///
/// `lastTransitionTime` is preserved when the status does not change.
pub fn update_condition_in_memory(conditions: &mut Vec<Condition>, condition: Condition) {
    if let Some(existing) = conditions
        .iter_mut()
        .find(|c| c.r#type == condition.r#type)
    {
        let last_transition_time = if existing.status == condition.status {
            existing
                .last_transition_time
                .clone()
                .or(condition.last_transition_time)
        } else {
            condition.last_transition_time
        };

        existing.status = condition.status;
        existing.severity = condition.severity;
        existing.reason = condition.reason;
        existing.message = condition.message;
        existing.last_transition_time = last_transition_time;
    } else {
        conditions.push(condition);
    }
}

/// Set a condition to True, clearing reason, severity and message.
pub fn mark_true(conditions: &mut Vec<Condition>, condition_type: &str) {
    update_condition_in_memory(
        conditions,
        create_condition(condition_type, STATUS_TRUE, "", "", ""),
    );
}

/// Set a condition to False with a reason and severity.
pub fn mark_false(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    reason: &str,
    severity: &str,
    message: &str,
) {
    update_condition_in_memory(
        conditions,
        create_condition(condition_type, STATUS_FALSE, reason, severity, message),
    );
}

/// Compute the Ready condition from `PreflightCheck` and `ProviderInstalled`.
///
/// - any False: Ready is False, mirroring the most severe one (first wins on ties)
/// - otherwise any Unknown, or none present: Ready is Unknown
/// - otherwise Ready is True
#[must_use]
pub fn summarize_ready(conditions: &[Condition]) -> Condition {
    let present: Vec<&Condition> = SUMMARIZED_CONDITION_TYPES
        .iter()
        .filter_map(|t| find_condition(conditions, t))
        .collect();

    let worst_false = present
        .iter()
        .copied()
        .filter(|c| c.status == STATUS_FALSE)
        .fold(None::<&Condition>, |worst, c| match worst {
            Some(w) if severity_rank(w.severity.as_deref()) >= severity_rank(c.severity.as_deref()) => {
                Some(w)
            }
            _ => Some(c),
        });

    if let Some(failed) = worst_false {
        return create_condition(
            CONDITION_TYPE_READY,
            STATUS_FALSE,
            failed.reason.as_deref().unwrap_or_default(),
            failed.severity.as_deref().unwrap_or_default(),
            failed.message.as_deref().unwrap_or_default(),
        );
    }

    if present.is_empty() || present.iter().any(|c| c.status != STATUS_TRUE) {
        return create_condition(CONDITION_TYPE_READY, STATUS_UNKNOWN, "", "", "");
    }

    create_condition(CONDITION_TYPE_READY, STATUS_TRUE, "", "", "")
}

/// Recompute Ready in place.
pub fn set_ready_summary(conditions: &mut Vec<Condition>) {
    let ready = summarize_ready(conditions);
    update_condition_in_memory(conditions, ready);
}

/// Merge the operator-owned conditions of `computed` into `live`.
///
/// Conditions owned by other writers keep their place and content. Owned
/// conditions are replaced, or dropped when `computed` no longer has them.
#[must_use]
pub fn merge_owned_conditions(live: &[Condition], computed: &[Condition]) -> Vec<Condition> {
    let mut merged: Vec<Condition> = live
        .iter()
        .filter(|c| !OWNED_CONDITION_TYPES.contains(&c.r#type.as_str()))
        .cloned()
        .collect();

    merged.extend(
        OWNED_CONDITION_TYPES
            .iter()
            .filter_map(|t| find_condition(computed, t))
            .cloned(),
    );
    merged
}

/// Compare two condition lists ignoring `lastTransitionTime`.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    if current.len() != new.len() {
        return false;
    }

    new.iter().all(|new_cond| {
        find_condition(current, &new_cond.r#type).is_some_and(|curr| {
            curr.status == new_cond.status
                && curr.severity == new_cond.severity
                && curr.reason == new_cond.reason
                && curr.message == new_cond.message
        })
    })
}

/// Centralized status updater for provider resources.
///
/// Collects the status computed by the phase engine and applies it in a single
/// merge patch, and only when something changed.
pub struct ProviderStatusUpdater {
    namespace: String,
    name: String,
    current_status: Option<ProviderStatus>,
    new_status: ProviderStatus,
}

impl ProviderStatusUpdater {
    /// Start from the status of the live object.
    #[must_use]
    pub fn new<T: GenericProvider>(provider: &T) -> Self {
        let current_status = provider.provider_status().cloned();
        let new_status = current_status.clone().unwrap_or_default();

        Self {
            namespace: provider.namespace().unwrap_or_default(),
            name: provider.name_any(),
            current_status,
            new_status,
        }
    }

    /// Take the computed status, merging owned conditions into the live ones.
    pub fn set_status(&mut self, computed: &ProviderStatus) {
        let conditions = merge_owned_conditions(&self.new_status.conditions, &computed.conditions);
        self.new_status = ProviderStatus {
            conditions,
            ..computed.clone()
        };
    }

    /// Set the observed generation to match the current generation.
    pub fn set_observed_generation(&mut self, generation: Option<i64>) {
        self.new_status.observed_generation = generation;
    }

    #[must_use]
    pub fn status(&self) -> &ProviderStatus {
        &self.new_status
    }

    /// Whether the status differs semantically from the live one.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match &self.current_status {
            None => true,
            Some(current) => {
                current.observed_generation != self.new_status.observed_generation
                    || current.installed_version != self.new_status.installed_version
                    || current.contract != self.new_status.contract
                    || !conditions_equal(&current.conditions, &self.new_status.conditions)
            }
        }
    }

    /// Apply the collected status with one merge patch on the status subresource.
    ///
    /// # Errors
    ///
    /// Returns an error if the Kubernetes API call fails.
    pub async fn apply<T: GenericProvider>(&self, client: &Client) -> Result<()> {
        if !self.has_changes() {
            debug!(
                "{} {}/{} status unchanged, skipping update",
                T::KIND,
                self.namespace,
                self.name
            );
            return Ok(());
        }

        let api: Api<T> = Api::namespaced(client.clone(), &self.namespace);
        let patch = json!({ "status": self.new_status });

        api.patch_status(&self.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        debug!(
            "Updated {} {}/{} status: {} condition(s)",
            T::KIND,
            self.namespace,
            self.name,
            self.new_status.conditions.len()
        );

        Ok(())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
