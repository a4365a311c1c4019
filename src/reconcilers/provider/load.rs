// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Load phase.
//!
//! Reads the config secret into variables, picks the repository the components
//! come from, resolves the target version and validates its contract.
//!
//! Repository selection:
//!
//! - `fetchConfig.selector`: `ConfigMaps` in the provider namespace
//! - a cached release for `(kind, name, version)`: the cache `ConfigMap`
//! - otherwise the remote release repository from `fetchConfig.url` or the
//!   built-in registry; the fetched release is then written to the cache

use super::{PhaseOutcome, PhaseReconciler};
use crate::constants::METADATA_FILE;
use crate::crd::FetchConfiguration;
use crate::phase_errors::PhaseError;
use crate::provider::GenericProvider;
use crate::repository::cache::{build_cache_config_map, CacheKey};
use crate::repository::configmap::ConfigMapRepository;
use crate::repository::metadata::validate_contract;
use crate::repository::registry::ProviderRegistry;
use crate::repository::remote::RemoteRepository;
use crate::repository::{Repository, RepositoryError};
use crate::status_reasons::{
    REASON_CAPI_VERSION_INCOMPATIBILITY, REASON_COMPONENTS_FETCH_ERROR, REASON_UNKNOWN_PROVIDER,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::{debug, info};

fn fetch_error(err: impl std::fmt::Display) -> PhaseError {
    PhaseError::fetch(REASON_COMPONENTS_FETCH_ERROR, err.to_string())
}

impl<T: GenericProvider> PhaseReconciler<'_, T> {
    pub(crate) async fn load(&mut self) -> Result<PhaseOutcome, PhaseError> {
        self.variables = self.load_config_secret().await?;

        let repository = self.build_repository().await?;
        let spec_version = &self.provider.provider_spec().version;
        // Preflight only lets an empty version through once one is installed.
        self.version = if spec_version.is_empty() {
            repository.latest_version().to_string()
        } else {
            spec_version.clone()
        };
        self.repository = Some(repository);

        self.validate_contract().await?;

        debug!(
            kind = %T::KIND,
            name = %self.provider.name_any(),
            version = %self.version,
            variables = self.variables.len(),
            "Loaded provider configuration"
        );
        Ok(PhaseOutcome::Continue)
    }

    async fn load_config_secret(&self) -> Result<BTreeMap<String, String>, PhaseError> {
        let Some(secret_ref) = &self.provider.provider_spec().config_secret else {
            return Ok(BTreeMap::new());
        };
        let namespace = secret_ref
            .namespace
            .clone()
            .unwrap_or_else(|| self.namespace());

        let secret = self
            .ctx
            .cluster
            .get_secret(&namespace, &secret_ref.name)
            .await?
            .ok_or_else(|| {
                fetch_error(format!(
                    "config secret {namespace}/{} not found",
                    secret_ref.name
                ))
            })?;

        let mut variables: BTreeMap<String, String> = secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, String::from_utf8_lossy(&value.0).into_owned()))
            .collect();
        variables.extend(secret.string_data.unwrap_or_default());
        Ok(variables)
    }

    async fn build_repository(&self) -> Result<Box<dyn Repository>, PhaseError> {
        let spec = self.provider.provider_spec();
        let fetch_config = spec.fetch_config.clone().unwrap_or_default();

        if let Some(selector) = &fetch_config.selector {
            return self.selector_repository(selector).await;
        }

        if !spec.version.is_empty() {
            if let Some(cached) = self.cached_repository(&spec.version).await? {
                return Ok(cached);
            }
        }

        let url = self.release_url(&fetch_config)?;
        let remote = RemoteRepository::new(
            self.ctx.http_client.clone(),
            &url,
            self.ctx.github_token.clone(),
        )
        .await
        .map_err(fetch_error)?;

        let version = if spec.version.is_empty() {
            remote.default_version().to_string()
        } else {
            spec.version.clone()
        };
        if let Some(cached) = self.cached_repository(&version).await? {
            return Ok(cached);
        }
        self.download_into_cache(&remote, &version).await
    }

    async fn selector_repository(
        &self,
        selector: &LabelSelector,
    ) -> Result<Box<dyn Repository>, PhaseError> {
        let config_maps = self
            .ctx
            .cluster
            .list_config_maps(&self.namespace(), selector)
            .await?;
        let repository = ConfigMapRepository::new(&config_maps).map_err(fetch_error)?;
        debug!(
            kind = %T::KIND,
            name = %self.provider.name_any(),
            versions = ?repository.versions(),
            "Using ConfigMap repository"
        );
        Ok(Box::new(repository))
    }

    fn cache_key<'v>(&'v self, name: &'v str, version: &'v str) -> CacheKey<'v> {
        CacheKey {
            kind: T::KIND,
            name,
            version,
        }
    }

    async fn cached_repository(
        &self,
        version: &str,
    ) -> Result<Option<Box<dyn Repository>>, PhaseError> {
        let name = self.provider.name_any();
        let key = self.cache_key(&name, version);
        let cached = self
            .ctx
            .cluster
            .list_config_maps(&self.namespace(), &key.selector())
            .await?;
        if cached.is_empty() {
            return Ok(None);
        }

        debug!(configmap = %key.config_map_name(), "Using cached provider release");
        let repository = ConfigMapRepository::new(&cached).map_err(fetch_error)?;
        Ok(Some(Box::new(repository)))
    }

    /// Release URL from `fetchConfig.url`, or from the registry.
    fn release_url(&self, fetch_config: &FetchConfiguration) -> Result<String, PhaseError> {
        let name = self.provider.name_any();
        let mut registry = ProviderRegistry::default();
        if let Some(url) = &fetch_config.url {
            registry.register(&name, T::KIND, url);
        }

        registry
            .get(&name, T::KIND)
            .map(|config| config.url)
            .map_err(|err| match err {
                RepositoryError::UnknownProvider { .. } => {
                    PhaseError::version_compat(REASON_UNKNOWN_PROVIDER, err.to_string())
                }
                other => fetch_error(other),
            })
    }

    async fn download_into_cache(
        &self,
        remote: &RemoteRepository,
        version: &str,
    ) -> Result<Box<dyn Repository>, PhaseError> {
        let metadata = remote
            .get_file(version, METADATA_FILE)
            .await
            .map_err(fetch_error)?;
        let components = remote
            .get_file(version, remote.components_path())
            .await
            .map_err(fetch_error)?;

        let name = self.provider.name_any();
        let key = self.cache_key(&name, version);
        let config_map = build_cache_config_map(
            &key,
            &self.namespace(),
            &metadata,
            &components,
            self.provider.owner_reference(),
        )
        .map_err(fetch_error)?;
        self.ctx.cluster.create_config_map(&config_map).await?;

        info!(
            kind = %T::KIND,
            name = %name,
            version = %version,
            configmap = %key.config_map_name(),
            "Cached provider release"
        );

        let repository =
            ConfigMapRepository::new(std::slice::from_ref(&config_map)).map_err(fetch_error)?;
        Ok(Box::new(repository))
    }

    async fn validate_contract(&mut self) -> Result<(), PhaseError> {
        let incompatible = |err: &dyn std::fmt::Display| {
            PhaseError::version_compat(REASON_CAPI_VERSION_INCOMPATIBILITY, err.to_string())
        };

        let repository = self
            .repository
            .as_deref()
            .ok_or_else(|| PhaseError::Transient(anyhow::anyhow!("repository not loaded")))?;
        let metadata = repository
            .get_file(&self.version, METADATA_FILE)
            .await
            .map_err(|e| incompatible(&e))?;
        let contract =
            validate_contract(&metadata, &self.version).map_err(|e| incompatible(&e))?;

        self.status.contract = Some(contract.clone());
        self.contract = Some(contract);
        Ok(())
    }
}
