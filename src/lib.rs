// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # capi-operator - Cluster API provider lifecycle operator
//!
//! A Kubernetes operator that installs, upgrades and removes Cluster API
//! providers declared as custom resources.
//!
//! ## Overview
//!
//! Every provider role (core, bootstrap, control plane, infrastructure, IPAM,
//! addon, runtime extension) has its own kind. For each provider object the
//! operator:
//!
//! - checks that the request is valid and does not clash with other providers
//! - loads the release from a remote repository or from labelled `ConfigMaps`
//! - processes and customizes the release components
//! - applies them and waits for the provider Deployments to become available
//! - removes them again on upgrade or deletion
//!
//! ## Modules
//!
//! - [`crd`] - provider resource types, image URLs and version conversion
//! - [`reconcilers`] - the phase engine, status handling and object application
//! - [`provider_controller`] - the generic controller driving the phase engine
//! - [`repository`] - release repositories (remote, `ConfigMap`, cache)
//! - [`customizer`] - manifest customization from the provider spec
//! - [`components`] - processed release components
//!
//! ## Example
//!
//! ```rust,no_run
//! use capi_operator::crd::v1alpha2::{InfrastructureProvider, InfrastructureProviderSpec, ProviderSpec};
//!
//! let provider = InfrastructureProvider::new(
//!     "aws",
//!     InfrastructureProviderSpec {
//!         provider: ProviderSpec {
//!             version: "v2.3.0".to_string(),
//!             ..Default::default()
//!         },
//!     },
//! );
//! ```

pub mod cluster_client;
pub mod components;
pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod customizer;
pub mod duration;
pub mod http_server;
pub mod labels;
pub mod metrics;
pub mod phase_errors;
pub mod provider;
pub mod provider_controller;
pub mod reconcilers;
pub mod repository;
pub mod selector;
pub mod status_reasons;
pub mod yaml_processor;
