// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Label selector utilities.
//!
//! `fetchConfig.selector` and the components cache use structured
//! [`LabelSelector`]s. The API server wants them as a query string; in-memory
//! callers match them against a label map directly.
//!
//! # Example
//!
//! ```rust
//! use capi_operator::selector::{matches, to_query};
//! use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
//! use std::collections::BTreeMap;
//!
//! let selector = LabelSelector {
//!     match_labels: Some(BTreeMap::from([("provider".to_string(), "aws".to_string())])),
//!     match_expressions: None,
//! };
//! assert_eq!(to_query(&selector).unwrap(), "provider=aws");
//!
//! let labels = BTreeMap::from([("provider".to_string(), "aws".to_string())]);
//! assert!(matches(&selector, &labels));
//! ```

use anyhow::{bail, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use std::collections::BTreeMap;

/// Render a selector in the API server's query syntax.
///
/// `matchLabels` come first (sorted by key), then `matchExpressions` in order.
///
/// # Errors
///
/// Returns an error if an expression uses an unknown operator, or if `In`/`NotIn`
/// has no values.
pub fn to_query(selector: &LabelSelector) -> Result<String> {
    let mut terms: Vec<String> = selector
        .match_labels
        .iter()
        .flatten()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();

    for requirement in selector.match_expressions.iter().flatten() {
        terms.push(requirement_query(requirement)?);
    }

    Ok(terms.join(","))
}

fn requirement_query(requirement: &LabelSelectorRequirement) -> Result<String> {
    let key = &requirement.key;
    let values = requirement.values.as_deref().unwrap_or_default();

    match requirement.operator.as_str() {
        "In" | "NotIn" if values.is_empty() => {
            bail!(
                "label selector requirement on {key} with operator {} needs values",
                requirement.operator
            )
        }
        "In" => Ok(format!("{key} in ({})", values.join(","))),
        "NotIn" => Ok(format!("{key} notin ({})", values.join(","))),
        "Exists" => Ok(key.clone()),
        "DoesNotExist" => Ok(format!("!{key}")),
        other => bail!("unsupported label selector operator {other}"),
    }
}

/// Whether `labels` satisfy `selector`. An empty selector matches everything.
///
/// Requirements with an unknown operator never match.
#[must_use]
pub fn matches(selector: &LabelSelector, labels: &BTreeMap<String, String>) -> bool {
    let labels_match = selector
        .match_labels
        .iter()
        .flatten()
        .all(|(k, v)| labels.get(k) == Some(v));

    labels_match
        && selector
            .match_expressions
            .iter()
            .flatten()
            .all(|requirement| requirement_matches(requirement, labels))
}

fn requirement_matches(
    requirement: &LabelSelectorRequirement,
    labels: &BTreeMap<String, String>,
) -> bool {
    let value = labels.get(&requirement.key);
    let values = requirement.values.as_deref().unwrap_or_default();

    match requirement.operator.as_str() {
        "In" => value.is_some_and(|v| values.contains(v)),
        "NotIn" => value.is_none_or(|v| !values.contains(v)),
        "Exists" => value.is_some(),
        "DoesNotExist" => value.is_none(),
        _ => false,
    }
}

/// Selector matching a single label value.
#[must_use]
pub fn single_label(key: &str, value: &str) -> LabelSelector {
    LabelSelector {
        match_labels: Some(BTreeMap::from([(key.to_string(), value.to_string())])),
        match_expressions: None,
    }
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod selector_tests;
