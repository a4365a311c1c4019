// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for label selector utilities

#[cfg(test)]
mod tests {
    use crate::selector::{matches, single_label, to_query};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
    use std::collections::BTreeMap;

    fn requirement(key: &str, operator: &str, values: &[&str]) -> LabelSelectorRequirement {
        LabelSelectorRequirement {
            key: key.to_string(),
            operator: operator.to_string(),
            values: if values.is_empty() {
                None
            } else {
                Some(values.iter().map(|v| (*v).to_string()).collect())
            },
        }
    }

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_query_from_labels_and_expressions() {
        let selector = LabelSelector {
            match_labels: Some(labels(&[("provider", "aws"), ("env", "prod")])),
            match_expressions: Some(vec![
                requirement("tier", "In", &["a", "b"]),
                requirement("legacy", "NotIn", &["yes"]),
                requirement("owner", "Exists", &[]),
                requirement("deprecated", "DoesNotExist", &[]),
            ]),
        };
        assert_eq!(
            to_query(&selector).unwrap(),
            "env=prod,provider=aws,tier in (a,b),legacy notin (yes),owner,!deprecated"
        );
    }

    #[test]
    fn test_query_rejects_bad_requirements() {
        let unknown = LabelSelector {
            match_labels: None,
            match_expressions: Some(vec![requirement("k", "Gt", &["1"])]),
        };
        assert!(to_query(&unknown).is_err());

        let empty_in = LabelSelector {
            match_labels: None,
            match_expressions: Some(vec![requirement("k", "In", &[])]),
        };
        assert!(to_query(&empty_in).is_err());
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        assert_eq!(to_query(&LabelSelector::default()).unwrap(), "");
        assert!(matches(&LabelSelector::default(), &BTreeMap::new()));
    }

    #[test]
    fn test_match_labels() {
        let selector = single_label("provider", "aws");
        assert!(matches(&selector, &labels(&[("provider", "aws"), ("x", "y")])));
        assert!(!matches(&selector, &labels(&[("provider", "gcp")])));
        assert!(!matches(&selector, &BTreeMap::new()));
    }

    #[test]
    fn test_match_expressions() {
        let selector = LabelSelector {
            match_labels: None,
            match_expressions: Some(vec![
                requirement("tier", "In", &["a", "b"]),
                requirement("legacy", "NotIn", &["yes"]),
                requirement("deprecated", "DoesNotExist", &[]),
            ]),
        };
        assert!(matches(&selector, &labels(&[("tier", "a")])));
        assert!(matches(&selector, &labels(&[("tier", "b"), ("legacy", "no")])));
        assert!(!matches(&selector, &labels(&[("tier", "c")])));
        assert!(!matches(&selector, &labels(&[("tier", "a"), ("legacy", "yes")])));
        assert!(!matches(&selector, &labels(&[("tier", "a"), ("deprecated", "")])));
    }
}
