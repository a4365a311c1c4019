// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pre-install, install and delete phases.
//!
//! Changing the installed version (up or down) first removes the old components,
//! then installs the new ones in the same reconcile. Reinstalling the same
//! version applies the components again without deleting.

use super::{PhaseOutcome, PhaseReconciler};
use crate::components::object_kind;
use crate::labels::PROVIDER_LABEL;
use crate::metrics;
use crate::phase_errors::PhaseError;
use crate::provider::GenericProvider;
use crate::reconcilers::status::mark_true;
use crate::repository::parse_version;
use crate::selector::single_label;
use crate::status_reasons::{
    CONDITION_TYPE_PROVIDER_INSTALLED, REASON_INSTALL_FAILED, REASON_OLD_COMPONENTS_DELETION_ERROR,
    REASON_TIMED_OUT_WAITING_FOR_DEPLOYMENT_READY,
};
use kube::ResourceExt;
use tracing::{debug, info};

/// Whether moving from `installed` to `target` requires removing old components.
///
/// Versions are compared semantically, so `v1.2.0` and `1.2.0` are the same release.
///
/// ```
/// use capi_operator::reconcilers::provider::install::version_changed;
///
/// assert!(version_changed("v1.5.4", "v1.6.0"));
/// assert!(version_changed("v1.6.0", "v1.5.4"));
/// assert!(!version_changed("v1.6.0", "1.6.0"));
/// ```
#[must_use]
pub fn version_changed(installed: &str, target: &str) -> bool {
    match (parse_version(installed), parse_version(target)) {
        (Ok(installed), Ok(target)) => installed != target,
        _ => installed != target,
    }
}

impl<T: GenericProvider> PhaseReconciler<'_, T> {
    pub(crate) async fn pre_install(&mut self) -> Result<PhaseOutcome, PhaseError> {
        let Some(installed) = self.provider.installed_version() else {
            return Ok(PhaseOutcome::Continue);
        };
        let target = self
            .components
            .as_ref()
            .map_or(self.version.as_str(), |c| c.version());

        if !version_changed(installed, target) {
            debug!(
                kind = %T::KIND,
                name = %self.provider.name_any(),
                version = %target,
                "Reinstalling the installed version"
            );
            return Ok(PhaseOutcome::Continue);
        }

        info!(
            kind = %T::KIND,
            name = %self.provider.name_any(),
            from = %installed,
            to = %target,
            "Version change, removing old components before install"
        );
        self.delete().await?;
        Ok(PhaseOutcome::Continue)
    }

    pub(crate) async fn install(&mut self) -> Result<PhaseOutcome, PhaseError> {
        let components = self
            .components
            .as_ref()
            .ok_or_else(|| PhaseError::Transient(anyhow::anyhow!("components not fetched")))?;
        let objects = components.objects_in_apply_order();
        let version = components.version().to_string();

        let applied = self
            .ctx
            .cluster
            .apply_objects(&objects)
            .await
            .map_err(|e| {
                PhaseError::install(
                    REASON_INSTALL_FAILED,
                    format!("failed to apply components: {e:#}"),
                )
            })?;
        metrics::record_components_applied(T::KIND.kind(), applied);

        let timeout = self.ctx.settings.deployment_wait_timeout;
        for deployment in objects.iter().filter(|o| object_kind(o) == "Deployment") {
            let name = deployment.name_any();
            let namespace = deployment
                .namespace()
                .unwrap_or_else(|| self.namespace());

            let available = self
                .ctx
                .cluster
                .wait_for_deployment_available(&namespace, &name, timeout)
                .await
                .map_err(|e| {
                    PhaseError::install(
                        REASON_INSTALL_FAILED,
                        format!("failed waiting for Deployment {namespace}/{name}: {e:#}"),
                    )
                })?;
            if !available {
                return Err(PhaseError::install(
                    REASON_TIMED_OUT_WAITING_FOR_DEPLOYMENT_READY,
                    format!(
                        "Deployment {namespace}/{name} did not become available within {}s",
                        timeout.as_secs()
                    ),
                ));
            }
        }

        info!(
            kind = %T::KIND,
            name = %self.provider.name_any(),
            version = %version,
            objects = applied,
            "Provider installed"
        );

        self.status.installed_version = Some(version);
        self.status.contract.clone_from(&self.contract);
        mark_true(&mut self.status.conditions, CONDITION_TYPE_PROVIDER_INSTALLED);
        Ok(PhaseOutcome::Done)
    }

    /// Remove every component labelled for this provider.
    pub(crate) async fn delete(&mut self) -> Result<PhaseOutcome, PhaseError> {
        let label = T::KIND.provider_label_value(&self.provider.name_any());
        let selector = single_label(PROVIDER_LABEL, &label);

        let deleted = self
            .ctx
            .cluster
            .delete_components(&selector)
            .await
            .map_err(|e| {
                PhaseError::delete(
                    REASON_OLD_COMPONENTS_DELETION_ERROR,
                    format!("failed to delete components of {label}: {e:#}"),
                )
            })?;
        metrics::record_components_deleted(T::KIND.kind(), deleted);

        info!(
            kind = %T::KIND,
            name = %self.provider.name_any(),
            label = %label,
            deleted,
            "Deleted provider components"
        );
        Ok(PhaseOutcome::Continue)
    }
}
