// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for image URL parsing and formatting

#[cfg(test)]
mod tests {
    use crate::crd::image::{format_image_url, override_image, parse_image_url};
    use crate::crd::v1alpha1::ImageMeta;

    fn image(repository: Option<&str>, name: Option<&str>, tag: Option<&str>) -> ImageMeta {
        ImageMeta {
            repository: repository.map(str::to_string),
            name: name.map(str::to_string),
            tag: tag.map(str::to_string),
        }
    }

    #[test]
    fn test_url_round_trip() {
        for url in [
            "registry:5000/ns/image:tag",
            "image",
            "registry/image",
            "image:tag",
            "gcr.io/k8s-staging-cluster-api/cluster-api-controller:v1.6.0",
        ] {
            assert_eq!(format_image_url(&parse_image_url(url)), url, "round trip of {url}");
        }
    }

    #[test]
    fn test_parse_splits_registry_on_last_slash() {
        assert_eq!(
            parse_image_url("registry:5000/ns/image:tag"),
            image(Some("registry:5000/ns"), Some("image"), Some("tag"))
        );
        assert_eq!(
            parse_image_url("registry/image"),
            image(Some("registry"), Some("image"), None)
        );
    }

    #[test]
    fn test_parse_without_registry() {
        assert_eq!(parse_image_url("image"), image(None, Some("image"), None));
        assert_eq!(
            parse_image_url("image:tag"),
            image(None, Some("image"), Some("tag"))
        );
    }

    #[test]
    fn test_structured_round_trip() {
        let samples = [
            image(Some("quay.io"), Some("manager"), Some("v1")),
            image(None, Some("manager"), None),
            image(Some("docker.io"), Some("busybox"), None),
            image(None, Some("busybox"), Some("1.36")),
        ];
        for sample in samples {
            assert_eq!(parse_image_url(&format_image_url(&sample)), sample);
        }
    }

    #[test]
    fn test_override_requires_repository_and_name() {
        assert_eq!(
            override_image(&image(Some("quay.io/capi"), Some("manager"), Some("v1.2.3"))),
            Some("quay.io/capi/manager:v1.2.3".to_string())
        );
        assert_eq!(
            override_image(&image(Some("quay.io/capi"), Some("manager"), None)),
            Some("quay.io/capi/manager:latest".to_string())
        );
        assert_eq!(override_image(&image(None, Some("manager"), Some("v1"))), None);
        assert_eq!(override_image(&image(Some("quay.io"), None, Some("v1"))), None);
    }
}
