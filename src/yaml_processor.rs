// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Variable substitution and multi-document YAML decoding for provider manifests.
//!
//! Supported variable forms:
//!
//! - `${VAR}`: value of `VAR`; an error if `VAR` has no value
//! - `${VAR:=default}` and `${VAR:-default}`: value of `VAR`, or `default` when
//!   `VAR` is unset or empty
//! - `${VAR=default}`: value of `VAR`, or `default` (quotes stripped) only when
//!   `VAR` is unset
//!
//! Every variable without a value is collected so one error names all of them.

use anyhow::{bail, Context, Result};
use kube::api::DynamicObject;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Substitute `${...}` expressions in `template` from `variables`.
///
/// # Errors
///
/// Returns an error listing every variable that is referenced without a default
/// and has no value.
///
/// ```
/// use capi_operator::yaml_processor::process;
/// use std::collections::BTreeMap;
///
/// let vars = BTreeMap::from([("REGION".to_string(), "eu-west-1".to_string())]);
/// let out = process("region: ${REGION}\nzone: ${ZONE:=a}", &vars).unwrap();
/// assert_eq!(out, "region: eu-west-1\nzone: a");
/// ```
pub fn process(template: &str, variables: &BTreeMap<String, String>) -> Result<String> {
    let mut result = String::with_capacity(template.len());
    let mut missing = BTreeSet::new();
    let mut remaining = template;

    while let Some(start) = remaining.find("${") {
        result.push_str(&remaining[..start]);
        let after_start = &remaining[start + 2..];

        if let Some(end) = after_start.find('}') {
            let expr = &after_start[..end];
            match resolve_expr(expr, variables) {
                Some(value) => result.push_str(&value),
                None => {
                    missing.insert(expr.to_string());
                }
            }
            remaining = &after_start[end + 1..];
        } else {
            // No closing brace, keep the literal
            result.push_str("${");
            remaining = after_start;
        }
    }
    result.push_str(remaining);

    if !missing.is_empty() {
        let names: Vec<_> = missing.into_iter().collect();
        bail!("value for variables [{}] is not set", names.join(", "));
    }
    Ok(result)
}

fn resolve_expr(expr: &str, variables: &BTreeMap<String, String>) -> Option<String> {
    let lookup = |name: &str| variables.get(name.trim()).cloned();

    if let Some(pos) = expr.find(":=").or_else(|| expr.find(":-")) {
        let default = &expr[pos + 2..];
        let value = lookup(&expr[..pos]).filter(|v| !v.is_empty());
        return Some(value.unwrap_or_else(|| default.to_string()));
    }

    if let Some(pos) = expr.find('=') {
        let default = expr[pos + 1..].trim_matches('"');
        return Some(lookup(&expr[..pos]).unwrap_or_else(|| default.to_string()));
    }

    lookup(expr)
}

/// Decode a multi-document YAML stream into unstructured objects.
///
/// Empty and comment-only documents are skipped.
///
/// # Errors
///
/// Returns an error if a document is not valid YAML or is not a Kubernetes object.
pub fn parse_objects(yaml: &str) -> Result<Vec<DynamicObject>> {
    let mut objects = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
        let value = serde_json::Value::deserialize(document)
            .with_context(|| format!("failed to parse YAML document {index}"))?;
        if value.is_null() {
            continue;
        }
        let object: DynamicObject = serde_json::from_value(value)
            .with_context(|| format!("YAML document {index} is not a Kubernetes object"))?;
        if object.types.is_none() {
            bail!("YAML document {index} has no apiVersion/kind");
        }
        objects.push(object);
    }
    Ok(objects)
}

/// Substitute variables then decode the result into objects.
///
/// # Errors
///
/// Returns an error if substitution or decoding fails.
pub fn process_objects(
    template: &str,
    variables: &BTreeMap<String, String>,
) -> Result<Vec<DynamicObject>> {
    let processed = process(template, variables)?;
    parse_objects(&processed)
}

#[cfg(test)]
#[path = "yaml_processor_tests.rs"]
mod yaml_processor_tests;
