// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `spec.manifestPatches`: JSON merge patches (RFC 7386) against component objects.
//!
//! Each patch is a YAML or JSON document naming its target by `apiVersion`, `kind`
//! and `metadata.name`. A patch without a matching object is a no-op.

use crate::components::{object_api_version, object_kind};
use anyhow::{anyhow, Context, Result};
use kube::api::DynamicObject;
use serde_json::Value;
use tracing::debug;

/// Apply every patch in order to the objects it targets.
///
/// # Errors
///
/// Returns an error if a patch is not a mapping with `apiVersion`, `kind` and
/// `metadata.name`, or if a patched object no longer decodes.
pub fn apply_patches(objects: &mut [DynamicObject], patches: &[String]) -> Result<()> {
    for (index, raw) in patches.iter().enumerate() {
        let patch: Value = serde_yaml::from_str(raw)
            .with_context(|| format!("manifest patch {index} is not valid YAML"))?;

        let api_version = patch
            .get("apiVersion")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("manifest patch {index} has no apiVersion"))?;
        let kind = patch
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("manifest patch {index} has no kind"))?;
        let name = patch
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("manifest patch {index} has no metadata.name"))?;

        for object in objects.iter_mut() {
            if object_api_version(object) != api_version
                || object_kind(object) != kind
                || object.metadata.name.as_deref() != Some(name)
            {
                continue;
            }

            let mut target = serde_json::to_value(&*object)?;
            merge_patch(&mut target, &patch);
            *object = serde_json::from_value(target)
                .with_context(|| format!("manifest patch {index} produced an invalid {kind}"))?;
            debug!(kind = %kind, name = %name, "Applied manifest patch");
        }
    }
    Ok(())
}

/// RFC 7386 merge: objects merge recursively, `null` removes, anything else replaces.
///
/// ```
/// use capi_operator::customizer::patches::merge_patch;
/// use serde_json::json;
///
/// let mut target = json!({"a": {"b": 1, "c": 2}, "d": [1]});
/// merge_patch(&mut target, &json!({"a": {"c": null, "e": 3}, "d": [2]}));
/// assert_eq!(target, json!({"a": {"b": 1, "e": 3}, "d": [2]}));
/// ```
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    let Value::Object(target_map) = target else {
        return;
    };

    for (key, value) in patch_map {
        if value.is_null() {
            target_map.remove(key);
        } else {
            merge_patch(
                target_map.entry(key.clone()).or_insert(Value::Null),
                value,
            );
        }
    }
}

#[cfg(test)]
#[path = "patches_tests.rs"]
mod patches_tests;
