// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for provider resources.
//!
//! # Reconciliation Architecture
//!
//! 1. **Phases** - [`provider`] runs preflight, load, fetch, pre-install and
//!    install in order, or the delete phase for a provider being removed
//! 2. **Conditions** - every phase records its outcome as a condition, and
//!    [`status`] folds them into the `Ready` summary
//! 3. **Objects** - [`resources`] applies the processed components with
//!    server-side apply and removes them by label

pub mod provider;
pub mod resources;
pub mod status;

pub use provider::{delete_provider, reconcile_provider};
