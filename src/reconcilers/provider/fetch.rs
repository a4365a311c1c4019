// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Fetch phase: read, process and customize the components of the target version.

use super::{PhaseOutcome, PhaseReconciler};
use crate::components::{Components, ComponentsOptions};
use crate::constants::ADDITIONAL_MANIFESTS_KEY;
use crate::customizer;
use crate::phase_errors::PhaseError;
use crate::provider::GenericProvider;
use crate::reconcilers::status::mark_true;
use crate::status_reasons::{CONDITION_TYPE_PREFLIGHT_CHECK, REASON_COMPONENTS_FETCH_ERROR};
use crate::yaml_processor;
use kube::api::DynamicObject;
use kube::ResourceExt;
use tracing::debug;

fn fetch_error(message: impl Into<String>) -> PhaseError {
    PhaseError::fetch(REASON_COMPONENTS_FETCH_ERROR, message)
}

impl<T: GenericProvider> PhaseReconciler<'_, T> {
    pub(crate) async fn fetch(&mut self) -> Result<PhaseOutcome, PhaseError> {
        let repository = self
            .repository
            .as_deref()
            .ok_or_else(|| PhaseError::Transient(anyhow::anyhow!("repository not loaded")))?;

        let raw = repository
            .get_file(&self.version, repository.components_path())
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        let raw = String::from_utf8(raw)
            .map_err(|e| fetch_error(format!("components are not valid UTF-8: {e}")))?;

        let name = self.provider.name_any();
        let namespace = self.namespace();
        let options = ComponentsOptions {
            provider_name: &name,
            provider_kind: T::KIND,
            version: &self.version,
            target_namespace: &namespace,
            skip_template_process: false,
        };
        let mut components = Components::new(&raw, &self.variables, &options)
            .map_err(|e| fetch_error(format!("failed to process components: {e:#}")))?;

        let extra = self.additional_manifests().await?;
        if !extra.is_empty() {
            debug!(count = extra.len(), "Adding additional manifests");
            components.extend(extra);
        }

        let owner = self.provider.owner_reference();
        let customized = customizer::customize(
            components.objects().to_vec(),
            self.provider.provider_spec(),
            owner.as_ref(),
        )
        .map_err(|e| fetch_error(format!("failed to customize components: {e:#}")))?;
        components.set_objects(customized);

        debug!(
            kind = %T::KIND,
            name = %name,
            version = %components.version(),
            objects = components.objects().len(),
            "Fetched provider components"
        );

        self.components = Some(components);
        mark_true(&mut self.status.conditions, CONDITION_TYPE_PREFLIGHT_CHECK);
        Ok(PhaseOutcome::Continue)
    }

    /// Objects from `spec.additionalManifests`, processed with the same variables.
    async fn additional_manifests(&self) -> Result<Vec<DynamicObject>, PhaseError> {
        let Some(reference) = &self.provider.provider_spec().additional_manifests else {
            return Ok(Vec::new());
        };
        let namespace = reference
            .namespace
            .clone()
            .unwrap_or_else(|| self.namespace());

        let config_map = self
            .ctx
            .cluster
            .get_config_map(&namespace, &reference.name)
            .await?
            .ok_or_else(|| {
                fetch_error(format!(
                    "additional manifests ConfigMap {namespace}/{} not found",
                    reference.name
                ))
            })?;

        let manifests = config_map
            .data
            .as_ref()
            .and_then(|data| data.get(ADDITIONAL_MANIFESTS_KEY))
            .ok_or_else(|| {
                fetch_error(format!(
                    "ConfigMap {namespace}/{} has no {ADDITIONAL_MANIFESTS_KEY} key",
                    reference.name
                ))
            })?;

        yaml_processor::process_objects(manifests, &self.variables)
            .map_err(|e| fetch_error(format!("failed to process additional manifests: {e:#}")))
    }
}
