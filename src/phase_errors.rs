// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types produced by the provider phase engine.
//!
//! A [`PhaseError`] is either *classified* or *transient*:
//!
//! - Classified errors carry an [`ErrorKind`] and a condition reason. The engine turns
//!   them into a False condition on the provider and requeues after a fixed interval.
//! - Transient errors (API conflicts, network hiccups) propagate to the controller's
//!   error policy so the workqueue applies its backoff.

use crate::status_reasons::{
    CONDITION_TYPE_PREFLIGHT_CHECK, CONDITION_TYPE_PROVIDER_INSTALLED, SEVERITY_ERROR,
    SEVERITY_INFO, SEVERITY_WARNING,
};
use thiserror::Error;

/// Class of a phase failure. Fixes the condition type and severity it is reported with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Spec shape is invalid.
    Validation,
    /// Sibling providers block progress (singleton, core not ready).
    Environment,
    /// Target version's contract is unsupported.
    VersionCompat,
    /// Repository or manifest processing failure.
    Fetch,
    /// Apply or deployment wait failure.
    Install,
    /// Removal of old components failed.
    Delete,
}

impl ErrorKind {
    #[must_use]
    pub const fn condition_type(self) -> &'static str {
        match self {
            ErrorKind::Validation
            | ErrorKind::Environment
            | ErrorKind::VersionCompat
            | ErrorKind::Fetch => CONDITION_TYPE_PREFLIGHT_CHECK,
            ErrorKind::Install | ErrorKind::Delete => CONDITION_TYPE_PROVIDER_INSTALLED,
        }
    }

    #[must_use]
    pub const fn severity(self) -> &'static str {
        match self {
            ErrorKind::Validation | ErrorKind::VersionCompat => SEVERITY_ERROR,
            ErrorKind::Environment => SEVERITY_INFO,
            ErrorKind::Fetch | ErrorKind::Install | ErrorKind::Delete => SEVERITY_WARNING,
        }
    }

    /// Metric label for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Environment => "environment",
            ErrorKind::VersionCompat => "version_compat",
            ErrorKind::Fetch => "fetch",
            ErrorKind::Install => "install",
            ErrorKind::Delete => "delete",
        }
    }
}

/// Failure of a single phase.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("{message}")]
    Classified {
        kind: ErrorKind,
        reason: &'static str,
        message: String,
    },

    #[error(transparent)]
    Transient(#[from] anyhow::Error),
}

impl PhaseError {
    pub fn classified(kind: ErrorKind, reason: &'static str, message: impl Into<String>) -> Self {
        PhaseError::Classified {
            kind,
            reason,
            message: message.into(),
        }
    }

    pub fn validation(reason: &'static str, message: impl Into<String>) -> Self {
        Self::classified(ErrorKind::Validation, reason, message)
    }

    pub fn environment(reason: &'static str, message: impl Into<String>) -> Self {
        Self::classified(ErrorKind::Environment, reason, message)
    }

    pub fn version_compat(reason: &'static str, message: impl Into<String>) -> Self {
        Self::classified(ErrorKind::VersionCompat, reason, message)
    }

    pub fn fetch(reason: &'static str, message: impl Into<String>) -> Self {
        Self::classified(ErrorKind::Fetch, reason, message)
    }

    pub fn install(reason: &'static str, message: impl Into<String>) -> Self {
        Self::classified(ErrorKind::Install, reason, message)
    }

    pub fn delete(reason: &'static str, message: impl Into<String>) -> Self {
        Self::classified(ErrorKind::Delete, reason, message)
    }

    /// Returns true if this error should go through the workqueue backoff.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, PhaseError::Transient(_))
    }

    /// Condition reason for classified errors.
    #[must_use]
    pub fn status_reason(&self) -> Option<&'static str> {
        match self {
            PhaseError::Classified { reason, .. } => Some(*reason),
            PhaseError::Transient(_) => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            PhaseError::Classified { kind, .. } => Some(*kind),
            PhaseError::Transient(_) => None,
        }
    }
}

impl From<kube::Error> for PhaseError {
    fn from(err: kube::Error) -> Self {
        PhaseError::Transient(anyhow::Error::new(err))
    }
}

/// Reconciliation error handed to the kube-rs controller runtime.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ReconcileError(#[from] anyhow::Error);

impl From<kube::Error> for ReconcileError {
    fn from(err: kube::Error) -> Self {
        ReconcileError(anyhow::Error::new(err))
    }
}

#[cfg(test)]
#[path = "phase_errors_tests.rs"]
mod phase_errors_tests;
