// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generic provider controller.
//!
//! One controller runs per provider kind, all sharing this implementation. Each
//! reconcile:
//!
//! 1. adds the `operator/provider` finalizer and returns, if it is missing
//! 2. runs the delete path when the provider is being deleted, otherwise the
//!    install path
//! 3. patches the owned conditions and the rest of the status, setting
//!    `observedGeneration` only when the run completed

use crate::constants::{ERROR_REQUEUE_DURATION_SECS, READY_REQUEUE_AFTER_SECS};
use crate::context::Context;
use crate::crd::ProviderStatus;
use crate::labels::PROVIDER_FINALIZER;
use crate::metrics;
use crate::phase_errors::ReconcileError;
use crate::provider::GenericProvider;
use crate::reconcilers::provider::{delete_provider, reconcile_provider, PhaseRun, RunOutcome};
use crate::reconcilers::status::{is_condition_true, ProviderStatusUpdater};
use crate::status_reasons::CONDITION_TYPE_READY;
use anyhow::{anyhow, Result};
use futures::StreamExt;
use kube::api::Api;
use kube::runtime::controller::Action;
use kube::runtime::finalizer;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::ResourceExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Error policy for provider controllers.
///
/// Transient failures are requeued after a fixed delay.
#[allow(clippy::needless_pass_by_value)] // Signature required by kube::runtime::Controller
fn error_policy<T>(provider: Arc<T>, err: &ReconcileError, _ctx: Arc<Context>) -> Action
where
    T: GenericProvider,
{
    error!(
        error = %err,
        kind = %T::KIND,
        name = %provider.name_any(),
        namespace = ?provider.namespace(),
        "Reconciliation error - will retry in {}s",
        ERROR_REQUEUE_DURATION_SECS
    );
    metrics::record_reconciliation_requeue(T::KIND.kind(), "error");
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

/// Action after a completed install run without an explicit requeue.
fn requeue_based_on_readiness(ready: bool, not_ready_after: Duration) -> Action {
    if ready {
        Action::requeue(Duration::from_secs(READY_REQUEUE_AFTER_SECS))
    } else {
        Action::requeue(not_ready_after)
    }
}

/// Run the controller for one provider kind.
///
/// Watches every namespace unless the context restricts it to one.
///
/// # Errors
///
/// Returns an error if the controller fails to start.
pub async fn run_provider_controller<T>(context: Arc<Context>) -> Result<()>
where
    T: GenericProvider,
{
    info!("Starting {} controller", T::KIND);

    let api: Api<T> = match &context.watch_namespace {
        Some(namespace) => Api::namespaced(context.client.clone(), namespace),
        None => Api::all(context.client.clone()),
    };

    Controller::new(api, WatcherConfig::default())
        .run(reconcile::<T>, error_policy::<T>, context)
        .for_each(|result| {
            if let Ok((object, _)) = result {
                debug!("Reconciled {} {}", T::KIND, object);
            }
            futures::future::ready(())
        })
        .await;

    info!("{} controller stopped", T::KIND);
    Ok(())
}

/// Reconcile one provider, with finalizer handling and metrics.
async fn reconcile<T>(provider: Arc<T>, ctx: Arc<Context>) -> Result<Action, ReconcileError>
where
    T: GenericProvider,
{
    let start = std::time::Instant::now();
    let namespace = provider
        .namespace()
        .ok_or_else(|| ReconcileError::from(anyhow!("{} has no namespace", T::KIND)))?;
    let api: Api<T> = Api::namespaced(ctx.client.clone(), &namespace);

    let result = finalizer(&api, PROVIDER_FINALIZER, provider, |event| async {
        match event {
            finalizer::Event::Apply(p) => apply(&ctx, p.as_ref()).await,
            finalizer::Event::Cleanup(p) => cleanup(&ctx, p.as_ref()).await,
        }
    })
    .await;

    let duration = start.elapsed();
    if result.is_ok() {
        metrics::record_reconciliation_success(T::KIND.kind(), duration);
    } else {
        metrics::record_reconciliation_error(T::KIND.kind(), duration);
    }

    result.map_err(|e: finalizer::Error<ReconcileError>| match e {
        finalizer::Error::ApplyFailed(err) | finalizer::Error::CleanupFailed(err) => err,
        finalizer::Error::AddFinalizer(err) | finalizer::Error::RemoveFinalizer(err) => {
            ReconcileError::from(anyhow!("Finalizer error: {err}"))
        }
        finalizer::Error::UnnamedObject => ReconcileError::from(anyhow!("{} has no name", T::KIND)),
        finalizer::Error::InvalidFinalizer => {
            ReconcileError::from(anyhow!("Invalid finalizer for {}", T::KIND))
        }
    })
}

/// What to do with a finished run: which status to persist and what to tell the
/// controller runtime.
#[derive(Debug)]
struct RunPlan {
    patch_status: bool,
    observe_generation: bool,
    requeue_reason: Option<&'static str>,
    result: Result<Action, ReconcileError>,
}

fn transient_error(phase: impl std::fmt::Display, error: anyhow::Error) -> ReconcileError {
    ReconcileError::from(error.context(format!("{phase} phase failed")))
}

/// Plan for an install run. `ready` is the summarized `Ready` condition of the run.
fn apply_plan(outcome: RunOutcome, ready: bool, not_ready_after: Duration) -> RunPlan {
    match outcome {
        RunOutcome::Completed { requeue_after } => RunPlan {
            patch_status: true,
            observe_generation: true,
            requeue_reason: None,
            result: Ok(requeue_after.map_or_else(
                || requeue_based_on_readiness(ready, not_ready_after),
                Action::requeue,
            )),
        },
        RunOutcome::Failed {
            reason,
            requeue_after,
            ..
        } => RunPlan {
            patch_status: true,
            observe_generation: false,
            requeue_reason: Some(reason),
            result: Ok(Action::requeue(requeue_after)),
        },
        RunOutcome::Transient { phase, error } => RunPlan {
            patch_status: true,
            observe_generation: false,
            requeue_reason: None,
            result: Err(transient_error(phase, error)),
        },
    }
}

/// Plan for a delete run.
///
/// Any error keeps the finalizer in place. Classified failures are also written
/// to the status so the reason is visible.
fn cleanup_plan(outcome: RunOutcome) -> RunPlan {
    match outcome {
        RunOutcome::Completed { .. } => RunPlan {
            patch_status: false,
            observe_generation: false,
            requeue_reason: None,
            result: Ok(Action::await_change()),
        },
        RunOutcome::Failed {
            reason, message, ..
        } => RunPlan {
            patch_status: true,
            observe_generation: false,
            requeue_reason: Some(reason),
            result: Err(ReconcileError::from(anyhow!("{reason}: {message}"))),
        },
        RunOutcome::Transient { phase, error } => RunPlan {
            patch_status: false,
            observe_generation: false,
            requeue_reason: None,
            result: Err(transient_error(phase, error)),
        },
    }
}

/// Persist the status computed by a run.
async fn patch_status<T: GenericProvider>(
    ctx: &Context,
    provider: &T,
    status: &ProviderStatus,
    observe_generation: bool,
) -> Result<ProviderStatusUpdater, ReconcileError> {
    let mut updater = ProviderStatusUpdater::new(provider);
    updater.set_status(status);
    if observe_generation {
        updater.set_observed_generation(provider.meta().generation);
    }
    updater.apply::<T>(&ctx.client).await?;
    Ok(updater)
}

async fn apply<T: GenericProvider>(ctx: &Context, provider: &T) -> Result<Action, ReconcileError> {
    let PhaseRun { status, outcome } = reconcile_provider(&ctx.phase, provider).await;
    let ready = is_condition_true(&status.conditions, CONDITION_TYPE_READY);

    let plan = apply_plan(outcome, ready, ctx.phase.settings.preflight_requeue_after);
    if plan.patch_status {
        let updater = patch_status(ctx, provider, &status, plan.observe_generation).await?;
        if ready && plan.observe_generation {
            info!(
                kind = %T::KIND,
                name = %provider.name_any(),
                version = ?updater.status().installed_version,
                "Provider is ready"
            );
        }
    }
    if let Some(reason) = plan.requeue_reason {
        metrics::record_reconciliation_requeue(T::KIND.kind(), reason);
    }
    plan.result
}

async fn cleanup<T: GenericProvider>(ctx: &Context, provider: &T) -> Result<Action, ReconcileError> {
    info!(
        kind = %T::KIND,
        name = %provider.name_any(),
        "Removing provider components"
    );
    let PhaseRun { status, outcome } = delete_provider(&ctx.phase, provider).await;
    let deleted = outcome.is_completed();

    let plan = cleanup_plan(outcome);
    if plan.patch_status {
        patch_status(ctx, provider, &status, plan.observe_generation).await?;
    }
    if let Some(reason) = plan.requeue_reason {
        metrics::record_reconciliation_requeue(T::KIND.kind(), reason);
    }
    if deleted {
        metrics::record_provider_deleted(T::KIND.kind());
        info!(kind = %T::KIND, name = %provider.name_any(), "Provider deleted");
    }
    plan.result
}

#[cfg(test)]
#[path = "provider_controller_tests.rs"]
mod provider_controller_tests;
