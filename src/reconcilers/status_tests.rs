// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `status.rs`

#[cfg(test)]
mod tests {
    use crate::crd::v1alpha2::{CoreProvider, CoreProviderSpec};
    use crate::crd::{Condition, ProviderStatus};
    use crate::reconcilers::status::{
        conditions_equal, create_condition, find_condition, is_condition_true, mark_false,
        mark_true, merge_owned_conditions, set_ready_summary, summarize_ready,
        update_condition_in_memory, ProviderStatusUpdater,
    };
    use crate::status_reasons::{
        CONDITION_TYPE_PREFLIGHT_CHECK, CONDITION_TYPE_PROVIDER_INSTALLED, CONDITION_TYPE_READY,
        REASON_EMPTY_VERSION, REASON_INSTALL_FAILED, REASON_WAITING_FOR_CORE_PROVIDER_READY,
        SEVERITY_ERROR, SEVERITY_INFO, SEVERITY_WARNING, STATUS_FALSE, STATUS_TRUE,
        STATUS_UNKNOWN,
    };

    fn provider(status: Option<ProviderStatus>) -> CoreProvider {
        let mut provider = CoreProvider::new("cluster-api", CoreProviderSpec::default());
        provider.metadata.namespace = Some("capi-system".to_string());
        provider.status = status;
        provider
    }

    #[test]
    fn test_create_condition_skips_empty_fields() {
        let condition = create_condition(CONDITION_TYPE_READY, STATUS_TRUE, "", "", "");
        assert_eq!(condition.r#type, CONDITION_TYPE_READY);
        assert!(condition.reason.is_none());
        assert!(condition.severity.is_none());
        assert!(condition.message.is_none());
        assert!(condition.last_transition_time.is_some());

        let failed = create_condition(
            CONDITION_TYPE_PREFLIGHT_CHECK,
            STATUS_FALSE,
            REASON_EMPTY_VERSION,
            SEVERITY_ERROR,
            "version is empty",
        );
        assert_eq!(failed.reason.as_deref(), Some(REASON_EMPTY_VERSION));
        assert_eq!(failed.severity.as_deref(), Some(SEVERITY_ERROR));
    }

    #[test]
    fn test_update_preserves_transition_time_when_status_unchanged() {
        let mut conditions = vec![Condition {
            r#type: CONDITION_TYPE_PREFLIGHT_CHECK.to_string(),
            status: STATUS_FALSE.to_string(),
            last_transition_time: Some("2024-01-01T00:00:00+00:00".to_string()),
            ..Default::default()
        }];

        mark_false(
            &mut conditions,
            CONDITION_TYPE_PREFLIGHT_CHECK,
            REASON_WAITING_FOR_CORE_PROVIDER_READY,
            SEVERITY_INFO,
            "waiting",
        );
        assert_eq!(conditions.len(), 1);
        assert_eq!(
            conditions[0].last_transition_time.as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
        assert_eq!(conditions[0].message.as_deref(), Some("waiting"));

        mark_true(&mut conditions, CONDITION_TYPE_PREFLIGHT_CHECK);
        assert_ne!(
            conditions[0].last_transition_time.as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
        assert!(conditions[0].reason.is_none());
        assert!(is_condition_true(&conditions, CONDITION_TYPE_PREFLIGHT_CHECK));
    }

    #[test]
    fn test_update_appends_new_type() {
        let mut conditions = Vec::new();
        update_condition_in_memory(
            &mut conditions,
            create_condition(CONDITION_TYPE_READY, STATUS_UNKNOWN, "", "", ""),
        );
        mark_true(&mut conditions, CONDITION_TYPE_PROVIDER_INSTALLED);
        assert_eq!(conditions.len(), 2);
        assert!(find_condition(&conditions, CONDITION_TYPE_PROVIDER_INSTALLED).is_some());
        assert!(!is_condition_true(&conditions, CONDITION_TYPE_READY));
    }

    #[test]
    fn test_ready_true_when_all_true() {
        let mut conditions = Vec::new();
        mark_true(&mut conditions, CONDITION_TYPE_PREFLIGHT_CHECK);
        mark_true(&mut conditions, CONDITION_TYPE_PROVIDER_INSTALLED);
        assert_eq!(summarize_ready(&conditions).status, STATUS_TRUE);
    }

    #[test]
    fn test_ready_unknown_without_conditions() {
        assert_eq!(summarize_ready(&[]).status, STATUS_UNKNOWN);
    }

    #[test]
    fn test_ready_unknown_when_any_unknown() {
        let mut conditions = Vec::new();
        mark_true(&mut conditions, CONDITION_TYPE_PREFLIGHT_CHECK);
        update_condition_in_memory(
            &mut conditions,
            create_condition(CONDITION_TYPE_PROVIDER_INSTALLED, STATUS_UNKNOWN, "", "", ""),
        );
        assert_eq!(summarize_ready(&conditions).status, STATUS_UNKNOWN);
    }

    #[test]
    fn test_ready_mirrors_most_severe_false() {
        let mut conditions = Vec::new();
        mark_false(
            &mut conditions,
            CONDITION_TYPE_PREFLIGHT_CHECK,
            REASON_WAITING_FOR_CORE_PROVIDER_READY,
            SEVERITY_INFO,
            "waiting",
        );
        mark_false(
            &mut conditions,
            CONDITION_TYPE_PROVIDER_INSTALLED,
            REASON_INSTALL_FAILED,
            SEVERITY_WARNING,
            "apply failed",
        );

        let ready = summarize_ready(&conditions);
        assert_eq!(ready.status, STATUS_FALSE);
        assert_eq!(ready.reason.as_deref(), Some(REASON_INSTALL_FAILED));
        assert_eq!(ready.severity.as_deref(), Some(SEVERITY_WARNING));
        assert_eq!(ready.message.as_deref(), Some("apply failed"));
    }

    #[test]
    fn test_ready_tie_goes_to_preflight() {
        let mut conditions = Vec::new();
        mark_false(
            &mut conditions,
            CONDITION_TYPE_PROVIDER_INSTALLED,
            REASON_INSTALL_FAILED,
            SEVERITY_WARNING,
            "b",
        );
        mark_false(
            &mut conditions,
            CONDITION_TYPE_PREFLIGHT_CHECK,
            "ComponentsFetchError",
            SEVERITY_WARNING,
            "a",
        );
        assert_eq!(summarize_ready(&conditions).message.as_deref(), Some("a"));
    }

    #[test]
    fn test_set_ready_summary_in_place() {
        let mut conditions = Vec::new();
        mark_true(&mut conditions, CONDITION_TYPE_PREFLIGHT_CHECK);
        set_ready_summary(&mut conditions);
        assert!(is_condition_true(&conditions, CONDITION_TYPE_READY));
    }

    #[test]
    fn test_merge_keeps_foreign_conditions() {
        let foreign = create_condition("Paused", STATUS_TRUE, "", "", "");
        let live = vec![
            foreign.clone(),
            create_condition(CONDITION_TYPE_READY, STATUS_FALSE, "Old", SEVERITY_ERROR, ""),
            create_condition(CONDITION_TYPE_PROVIDER_INSTALLED, STATUS_TRUE, "", "", ""),
        ];
        let mut computed = Vec::new();
        mark_true(&mut computed, CONDITION_TYPE_PREFLIGHT_CHECK);
        set_ready_summary(&mut computed);

        let merged = merge_owned_conditions(&live, &computed);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0], foreign);
        assert!(is_condition_true(&merged, CONDITION_TYPE_READY));
        assert!(find_condition(&merged, CONDITION_TYPE_PROVIDER_INSTALLED).is_none());
    }

    #[test]
    fn test_conditions_equal_ignores_transition_time() {
        let a = vec![create_condition(CONDITION_TYPE_READY, STATUS_TRUE, "", "", "")];
        let mut b = a.clone();
        b[0].last_transition_time = Some("2000-01-01T00:00:00Z".to_string());
        assert!(conditions_equal(&a, &b));

        b[0].severity = Some(SEVERITY_INFO.to_string());
        assert!(!conditions_equal(&a, &b));
        assert!(!conditions_equal(&a, &[]));
    }

    #[test]
    fn test_updater_detects_changes() {
        let mut live_conditions = Vec::new();
        mark_true(&mut live_conditions, CONDITION_TYPE_PREFLIGHT_CHECK);
        let live = provider(Some(ProviderStatus {
            conditions: live_conditions.clone(),
            observed_generation: Some(1),
            ..Default::default()
        }));

        let mut unchanged = ProviderStatusUpdater::new(&live);
        unchanged.set_status(live.status.as_ref().unwrap());
        assert!(!unchanged.has_changes());

        let mut updater = ProviderStatusUpdater::new(&live);
        updater.set_status(&ProviderStatus {
            conditions: live_conditions,
            installed_version: Some("v1.6.0".to_string()),
            contract: Some("v1beta1".to_string()),
            ..Default::default()
        });
        updater.set_observed_generation(Some(2));
        assert!(updater.has_changes());
        assert_eq!(updater.status().observed_generation, Some(2));
        assert_eq!(updater.status().installed_version.as_deref(), Some("v1.6.0"));
    }

    #[test]
    fn test_updater_first_status_is_a_change() {
        let updater = ProviderStatusUpdater::new(&provider(None));
        assert!(updater.has_changes());
    }
}
