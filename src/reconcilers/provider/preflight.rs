// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Preflight phase.
//!
//! Validates the spec and checks sibling providers before anything is fetched:
//!
//! 1. a version is set, unless one is already installed
//! 2. the version is a semantic version
//! 3. `fetchConfig` sets at most one of `url` and `selector`
//! 4. no conflicting provider of the same kind exists
//! 5. non-core providers wait until a `CoreProvider` is Ready

use super::{PhaseOutcome, PhaseReconciler};
use crate::phase_errors::{ErrorKind, PhaseError};
use crate::provider::{GenericProvider, ProviderKind};
use crate::reconcilers::status::{mark_false, mark_true};
use crate::repository::parse_version;
use crate::status_reasons::{
    more_than_one_provider_message, CONDITION_TYPE_PREFLIGHT_CHECK, MESSAGE_CORE_PROVIDER_SINGLETON,
    MESSAGE_WAITING_FOR_CORE_PROVIDER, REASON_EMPTY_VERSION, REASON_FETCH_CONFIG_VALIDATION_ERROR,
    REASON_INCORRECT_VERSION_FORMAT, REASON_MORE_THAN_ONE_PROVIDER_INSTANCE_EXISTS,
    REASON_WAITING_FOR_CORE_PROVIDER_READY,
};
use kube::ResourceExt;
use tracing::info;

impl<T: GenericProvider> PhaseReconciler<'_, T> {
    pub(crate) async fn preflight(&mut self) -> Result<PhaseOutcome, PhaseError> {
        self.validate_spec()?;
        self.check_siblings().await?;

        if !T::KIND.is_core() && !self.core_provider_ready().await? {
            info!(
                kind = %T::KIND,
                name = %self.provider.name_any(),
                "Waiting for a ready CoreProvider"
            );
            mark_false(
                &mut self.status.conditions,
                CONDITION_TYPE_PREFLIGHT_CHECK,
                REASON_WAITING_FOR_CORE_PROVIDER_READY,
                ErrorKind::Environment.severity(),
                MESSAGE_WAITING_FOR_CORE_PROVIDER,
            );
            crate::metrics::record_reconciliation_requeue(
                T::KIND.kind(),
                REASON_WAITING_FOR_CORE_PROVIDER_READY,
            );
            return Ok(PhaseOutcome::Requeue(
                self.ctx.settings.preflight_requeue_after,
            ));
        }

        mark_true(&mut self.status.conditions, CONDITION_TYPE_PREFLIGHT_CHECK);
        Ok(PhaseOutcome::Continue)
    }

    fn validate_spec(&self) -> Result<(), PhaseError> {
        let spec = self.provider.provider_spec();

        if spec.version.is_empty() {
            // Without a pinned version the repository default is used, which only makes
            // sense once something is installed.
            if self.provider.installed_version().is_none() {
                return Err(PhaseError::validation(
                    REASON_EMPTY_VERSION,
                    "Version cannot be empty",
                ));
            }
        } else if let Err(err) = parse_version(&spec.version) {
            return Err(PhaseError::validation(
                REASON_INCORRECT_VERSION_FORMAT,
                format!("Version {} has invalid format: {err}", spec.version),
            ));
        }

        if let Some(fetch_config) = &spec.fetch_config {
            if fetch_config.url.is_some() && fetch_config.selector.is_some() {
                return Err(PhaseError::validation(
                    REASON_FETCH_CONFIG_VALIDATION_ERROR,
                    "Only one of fetchConfig.url and fetchConfig.selector can be set",
                ));
            }
        }

        Ok(())
    }

    async fn check_siblings(&self) -> Result<(), PhaseError> {
        let name = self.provider.name_any();
        let namespace = self.namespace();

        let siblings = self.ctx.cluster.list_providers(T::KIND).await?;
        let conflict = siblings
            .iter()
            .filter(|p| !(p.name == name && p.namespace == namespace))
            .find(|p| T::KIND.is_core() || p.name == name);

        match conflict {
            None => Ok(()),
            Some(_) if T::KIND.is_core() => Err(PhaseError::validation(
                REASON_MORE_THAN_ONE_PROVIDER_INSTANCE_EXISTS,
                MESSAGE_CORE_PROVIDER_SINGLETON,
            )),
            Some(other) => Err(PhaseError::validation(
                REASON_MORE_THAN_ONE_PROVIDER_INSTANCE_EXISTS,
                more_than_one_provider_message(T::KIND.kind(), &other.name, &other.namespace),
            )),
        }
    }

    async fn core_provider_ready(&self) -> Result<bool, PhaseError> {
        let cores = self.ctx.cluster.list_providers(ProviderKind::Core).await?;
        Ok(cores.iter().any(|core| core.ready))
    }
}
