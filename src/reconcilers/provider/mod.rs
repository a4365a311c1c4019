// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provider phase engine.
//!
//! A reconcile runs a fixed list of phases in order. Each phase either lets the
//! next one run in the same reconcile, asks for a requeue, finishes the run, or
//! fails. The first non-continue result short-circuits the run.
//!
//! - Install path: [`Phase::Preflight`] → [`Phase::Load`] → [`Phase::Fetch`] →
//!   [`Phase::PreInstall`] → [`Phase::Install`]
//! - Delete path: [`Phase::Delete`]
//!
//! ## Module Structure
//!
//! - [`preflight`] - spec validation, sibling checks, core readiness
//! - [`load`] - config secret, repository selection, contract validation
//! - [`fetch`] - components processing and customization
//! - [`install`] - upgrade cleanup, apply, deployment wait, delete
//!
//! The engine only mutates a working copy of the provider status. Persisting it
//! is the controller's job.

pub mod fetch;
pub mod install;
pub mod load;
pub mod preflight;

use crate::components::Components;
use crate::context::PhaseContext;
use crate::crd::ProviderStatus;
use crate::metrics;
use crate::phase_errors::PhaseError;
use crate::provider::GenericProvider;
use crate::reconcilers::status::{mark_false, set_ready_summary};
use crate::repository::Repository;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One step of a provider reconcile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Preflight,
    Load,
    Fetch,
    PreInstall,
    Install,
    Delete,
}

impl Phase {
    /// Phases of a reconcile for a live provider.
    pub const INSTALL_PATH: [Phase; 5] = [
        Phase::Preflight,
        Phase::Load,
        Phase::Fetch,
        Phase::PreInstall,
        Phase::Install,
    ];

    /// Phases of a reconcile for a provider being deleted.
    pub const DELETE_PATH: [Phase; 1] = [Phase::Delete];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Preflight => "preflight",
            Phase::Load => "load",
            Phase::Fetch => "fetch",
            Phase::PreInstall => "preInstall",
            Phase::Install => "install",
            Phase::Delete => "delete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single successful phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Run the next phase in the same reconcile.
    Continue,
    /// Stop here and reconcile again after the interval.
    Requeue(Duration),
    /// Stop here, nothing left to do.
    Done,
}

/// How a phase run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// All phases ran, or one stopped early without failing.
    Completed { requeue_after: Option<Duration> },
    /// A phase failed with a classified error, already recorded as a condition.
    Failed {
        phase: Phase,
        reason: &'static str,
        message: String,
        requeue_after: Duration,
    },
    /// A phase hit an infrastructure error that should go through backoff.
    Transient { phase: Phase, error: anyhow::Error },
}

impl RunOutcome {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }
}

/// Status computed by a run, together with how the run ended.
#[derive(Debug)]
pub struct PhaseRun {
    /// Working status, with `Ready` summarized from the other owned conditions.
    pub status: ProviderStatus,
    pub outcome: RunOutcome,
}

/// Per-reconcile state threaded through the phases.
///
/// Fields are filled by earlier phases and read by later ones: `load` sets the
/// variables, repository, target version and contract; `fetch` sets the
/// components.
pub struct PhaseReconciler<'a, T: GenericProvider> {
    pub(crate) ctx: &'a PhaseContext,
    pub(crate) provider: &'a T,
    pub(crate) status: ProviderStatus,
    pub(crate) variables: BTreeMap<String, String>,
    pub(crate) repository: Option<Box<dyn Repository>>,
    pub(crate) version: String,
    pub(crate) contract: Option<String>,
    pub(crate) components: Option<Components>,
}

impl<'a, T: GenericProvider> PhaseReconciler<'a, T> {
    #[must_use]
    pub fn new(ctx: &'a PhaseContext, provider: &'a T) -> Self {
        Self {
            ctx,
            provider,
            status: provider.provider_status().cloned().unwrap_or_default(),
            variables: BTreeMap::new(),
            repository: None,
            version: String::new(),
            contract: None,
            components: None,
        }
    }

    /// Run the install path.
    pub async fn reconcile_normal(self) -> PhaseRun {
        self.run(&Phase::INSTALL_PATH).await
    }

    /// Run the delete path.
    pub async fn reconcile_delete(self) -> PhaseRun {
        self.run(&Phase::DELETE_PATH).await
    }

    async fn run(mut self, phases: &[Phase]) -> PhaseRun {
        let mut outcome = RunOutcome::Completed {
            requeue_after: None,
        };

        for &phase in phases {
            debug!(
                kind = %T::KIND,
                name = %self.provider.name_any(),
                phase = %phase,
                "Running phase"
            );

            match self.run_phase(phase).await {
                Ok(PhaseOutcome::Continue) => {}
                Ok(PhaseOutcome::Requeue(after)) => {
                    outcome = RunOutcome::Completed {
                        requeue_after: Some(after),
                    };
                    break;
                }
                Ok(PhaseOutcome::Done) => break,
                Err(err) => {
                    outcome = self.record_failure(phase, err);
                    break;
                }
            }
        }

        set_ready_summary(&mut self.status.conditions);
        PhaseRun {
            status: self.status,
            outcome,
        }
    }

    async fn run_phase(&mut self, phase: Phase) -> Result<PhaseOutcome, PhaseError> {
        match phase {
            Phase::Preflight => self.preflight().await,
            Phase::Load => self.load().await,
            Phase::Fetch => self.fetch().await,
            Phase::PreInstall => self.pre_install().await,
            Phase::Install => self.install().await,
            Phase::Delete => self.delete().await,
        }
    }

    fn record_failure(&mut self, phase: Phase, err: PhaseError) -> RunOutcome {
        let name = self.provider.name_any();
        match err {
            PhaseError::Classified {
                kind,
                reason,
                message,
            } => {
                warn!(
                    kind = %T::KIND,
                    name = %name,
                    phase = %phase,
                    reason = reason,
                    "{message}"
                );
                mark_false(
                    &mut self.status.conditions,
                    kind.condition_type(),
                    reason,
                    kind.severity(),
                    &message,
                );
                metrics::record_phase_failure(T::KIND.kind(), phase.as_str(), reason);
                RunOutcome::Failed {
                    phase,
                    reason,
                    message,
                    requeue_after: self.ctx.settings.preflight_requeue_after,
                }
            }
            PhaseError::Transient(error) => {
                info!(
                    kind = %T::KIND,
                    name = %name,
                    phase = %phase,
                    error = %error,
                    "Phase hit a transient error"
                );
                RunOutcome::Transient { phase, error }
            }
        }
    }

    /// Namespace of the provider, where its components are installed.
    pub(crate) fn namespace(&self) -> String {
        self.provider.namespace().unwrap_or_default()
    }
}

/// Run the install path for `provider`.
pub async fn reconcile_provider<T: GenericProvider>(ctx: &PhaseContext, provider: &T) -> PhaseRun {
    PhaseReconciler::new(ctx, provider).reconcile_normal().await
}

/// Run the delete path for `provider`.
pub async fn delete_provider<T: GenericProvider>(ctx: &PhaseContext, provider: &T) -> PhaseRun {
    PhaseReconciler::new(ctx, provider).reconcile_delete().await
}
