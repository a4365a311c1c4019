// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Conversion between flat image URLs and structured [`ImageMeta`].
//!
//! The registry is everything before the last `/`; the remainder splits on `:` into
//! name and tag. [`format_image_url`] is the exact inverse of [`parse_image_url`],
//! so `format_image_url(&parse_image_url(x)) == x` for any well-formed reference.

use super::v1alpha1::ImageMeta;
use crate::constants::DEFAULT_IMAGE_TAG;

/// Split an image URL into repository, name and tag.
///
/// ```
/// use capi_operator::crd::image::parse_image_url;
///
/// let image = parse_image_url("registry:5000/ns/image:tag");
/// assert_eq!(image.repository.as_deref(), Some("registry:5000/ns"));
/// assert_eq!(image.name.as_deref(), Some("image"));
/// assert_eq!(image.tag.as_deref(), Some("tag"));
/// ```
#[must_use]
pub fn parse_image_url(url: &str) -> ImageMeta {
    let url = url.trim();

    let (repository, remainder) = match url.rsplit_once('/') {
        Some((repository, remainder)) => (non_empty(repository), remainder),
        None => (None, url),
    };

    let (name, tag) = match remainder.split_once(':') {
        Some((name, tag)) => (non_empty(name), non_empty(tag)),
        None => (non_empty(remainder), None),
    };

    ImageMeta {
        repository,
        name,
        tag,
    }
}

/// Render an [`ImageMeta`] back into `{repository}/{name}:{tag}`, omitting absent parts.
#[must_use]
pub fn format_image_url(image: &ImageMeta) -> String {
    let mut url = String::new();
    if let Some(repository) = image.repository.as_deref().filter(|r| !r.is_empty()) {
        url.push_str(repository);
        url.push('/');
    }
    if let Some(name) = image.name.as_deref() {
        url.push_str(name);
    }
    if let Some(tag) = image.tag.as_deref().filter(|t| !t.is_empty()) {
        url.push(':');
        url.push_str(tag);
    }
    url
}

/// Container image to deploy for an override, or `None` when the override is incomplete.
///
/// Both repository and name must be present; a missing tag becomes `latest`.
///
/// ```
/// use capi_operator::crd::image::{override_image, parse_image_url};
///
/// let image = parse_image_url("quay.io/capi/manager");
/// assert_eq!(override_image(&image).as_deref(), Some("quay.io/capi/manager:latest"));
/// assert_eq!(override_image(&parse_image_url("manager:v1")), None);
/// ```
#[must_use]
pub fn override_image(image: &ImageMeta) -> Option<String> {
    let repository = image.repository.as_deref().filter(|r| !r.is_empty())?;
    let name = image.name.as_deref().filter(|n| !n.is_empty())?;
    let tag = image
        .tag
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_IMAGE_TAG);
    Some(format!("{repository}/{name}:{tag}"))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod image_tests;
