//! Integration tests for the directory tool operations.
//!
//! Every operation runs against an in-memory directory, see `common`.

mod common;

use common::*;
use ldap_mcp::{
    AccountStatus, DirectoryEntry, DirectoryError, DirectoryTools, NativeStatus, RawSearchQuery,
    Resolution, MAX_LIMIT,
};

fn tools() -> DirectoryTools<FakeDirectory> {
    DirectoryTools::new(sample_directory(), BASE_DN)
}

fn uids(items: &[ldap_mcp::NormalizedRecord]) -> Vec<String> {
    let mut uids: Vec<String> = items
        .iter()
        .filter_map(|r| r.first("uid").map(str::to_string))
        .collect();
    uids.sort();
    uids
}

// ============================================================================
// Listing
// ============================================================================

mod listing {
    use super::*;

    #[tokio::test]
    async fn test_list_all_users_default_limit() {
        let mut tools = tools();
        let result = tools.list_all_users(None).await.unwrap();

        assert_eq!(result.kind, "user_list");
        assert_eq!(result.total_returned, 4);
        assert_eq!(result.limit_applied, 50);
        assert_eq!(
            uids(&result.items),
            vec!["asmith", "bsmith", "jdoe", "mlocked"]
        );
    }

    #[tokio::test]
    async fn test_list_all_users_truncates_to_limit() {
        let mut tools = tools();
        let result = tools.list_all_users(Some(2)).await.unwrap();

        assert_eq!(result.items.len(), 2);
        assert_eq!(result.total_returned, 2);
        assert_eq!(result.limit_applied, 2);
    }

    #[tokio::test]
    async fn test_limit_is_clamped() {
        let mut tools = tools();
        let result = tools.list_all_users(Some(0)).await.unwrap();
        assert_eq!(result.limit_applied, 1);
        assert_eq!(result.items.len(), 1);

        let result = tools.list_all_users(Some(1_000_000)).await.unwrap();
        assert_eq!(result.limit_applied, MAX_LIMIT);
    }

    #[tokio::test]
    async fn test_list_all_groups() {
        let mut tools = tools();
        let result = tools.list_all_groups(None).await.unwrap();

        assert_eq!(result.kind, "group_list");
        let mut names: Vec<_> = result
            .items
            .iter()
            .filter_map(|r| r.first("cn"))
            .collect();
        names.sort();
        assert_eq!(names, vec!["admins", "staff"]);
        assert!(result.items.iter().all(|g| g.get("member").is_some()));
    }

    #[tokio::test]
    async fn test_connection_error_propagates() {
        let mut directory = sample_directory();
        directory.fail_searches("connection reset by peer");
        let mut tools = DirectoryTools::new(directory, BASE_DN);

        let err = tools.list_all_users(None).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Connection(_)));
        assert!(err.to_string().contains("connection reset by peer"));
    }
}

// ============================================================================
// Searching
// ============================================================================

mod searching {
    use super::*;

    #[tokio::test]
    async fn test_search_by_name_matches_any_naming_attribute() {
        let mut tools = tools();

        let result = tools.search_users_by_name("smith", None).await.unwrap();
        assert_eq!(result.kind, "user_search");
        assert_eq!(result.search_term, "smith");
        assert_eq!(uids(&result.items), vec!["asmith", "bsmith"]);

        let result = tools.search_users_by_name("BOBBY", None).await.unwrap();
        assert_eq!(uids(&result.items), vec!["bsmith"]);
    }

    #[tokio::test]
    async fn test_search_by_name_treats_metacharacters_literally() {
        let mut directory = sample_directory();
        directory.push(user("pobrien", "Pat O'Brien"));
        let mut tools = DirectoryTools::new(directory, BASE_DN);

        let result = tools.search_users_by_name("o'Brien", None).await.unwrap();
        assert_eq!(uids(&result.items), vec!["pobrien"]);

        let result = tools.search_users_by_name("o'Brien*", None).await.unwrap();
        assert!(result.items.is_empty());
        assert!(tools.directory().searches.last().unwrap().contains("\\2a"));

        let result = tools.search_users_by_name("x)(uid=*", None).await.unwrap();
        assert!(result.items.is_empty());
    }

    #[tokio::test]
    async fn test_search_by_name_rejects_blank() {
        let mut tools = tools();
        let err = tools.search_users_by_name("   ", None).await.unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidArgument(_)));
        assert!(tools.directory().searches.is_empty());
    }

    #[tokio::test]
    async fn test_search_by_attribute_exact_and_partial() {
        let mut tools = tools();

        let result = tools
            .search_users_by_attribute("mail", "jdoe@example.com", false, None)
            .await
            .unwrap();
        assert_eq!(result.kind, "attribute_search");
        assert!(!result.partial);
        assert_eq!(uids(&result.items), vec!["jdoe"]);

        let result = tools
            .search_users_by_attribute("mail", "example.com", false, None)
            .await
            .unwrap();
        assert!(result.items.is_empty());

        let result = tools
            .search_users_by_attribute("mail", "example.com", true, Some(3))
            .await
            .unwrap();
        assert_eq!(result.total_returned, 3);
        assert_eq!(result.limit_applied, 3);
    }

    #[tokio::test]
    async fn test_search_by_attribute_rejects_bad_names() {
        let mut tools = tools();
        for name in ["", "1uid", "uid)(cn=*", "mail attr"] {
            let err = tools
                .search_users_by_attribute(name, "x", false, None)
                .await
                .unwrap_err();
            assert!(
                matches!(err, DirectoryError::InvalidArgument(_)),
                "{name:?} should be rejected"
            );
        }
        assert!(tools.directory().searches.is_empty());
    }
}

// ============================================================================
// User details and status lists
// ============================================================================

mod users {
    use super::*;

    #[tokio::test]
    async fn test_get_user_details_includes_status() {
        let mut tools = tools();
        let details = tools.get_user_details("jdoe").await.unwrap().unwrap();

        assert_eq!(details.kind, "user_details");
        assert_eq!(details.username, "jdoe");
        assert_eq!(details.user.dn, user_dn("jdoe"));
        assert_eq!(details.user.first("cn"), Some("John Doe"));

        let status = details.user.attrs.computed_status.unwrap();
        assert_eq!(status.simple_status, AccountStatus::Active);
        assert_eq!(status.resolved_by, Resolution::Manual);
        assert_eq!(tools.directory().native_calls, 1);
    }

    #[tokio::test]
    async fn test_get_user_details_not_found() {
        let mut tools = tools();
        assert!(tools.get_user_details("nobody").await.unwrap().is_none());
        assert_eq!(tools.directory().native_calls, 0);
    }

    #[tokio::test]
    async fn test_get_user_details_prefers_native_status() {
        let directory = sample_directory()
            .with_native(&user_dn("jdoe"), NativeStatus::Reported("inactive".into()));
        let mut tools = DirectoryTools::new(directory, BASE_DN);

        let details = tools.get_user_details("jdoe").await.unwrap().unwrap();
        let status = details.user.attrs.computed_status.unwrap();
        assert_eq!(status.simple_status, AccountStatus::Inactive);
        assert_eq!(status.resolved_by, Resolution::Native);
    }

    #[tokio::test]
    async fn test_get_user_details_degraded_fallback() {
        let directory = sample_directory()
            .with_default_native(NativeStatus::Failed("operations error".into()));
        let mut tools = DirectoryTools::new(directory, BASE_DN);

        let details = tools.get_user_details("mlocked").await.unwrap().unwrap();
        let status = details.user.attrs.computed_status.unwrap();
        assert_eq!(status.simple_status, AccountStatus::Locked);
        assert_eq!(status.resolved_by, Resolution::Degraded);
        assert_eq!(status.detail.as_deref(), Some("operations error"));

        let details = tools.get_user_details("jdoe").await.unwrap().unwrap();
        let status = details.user.attrs.computed_status.unwrap();
        assert_eq!(status.simple_status, AccountStatus::Unknown);
    }

    #[tokio::test]
    async fn test_list_locked_users() {
        let mut tools = tools();
        let result = tools.list_locked_users(None).await.unwrap();

        assert_eq!(result.kind, "locked_users");
        assert_eq!(uids(&result.items), vec!["mlocked"]);
        assert_eq!(result.locked_users_found, Some(1));
        assert_eq!(result.active_users_found, None);
        assert_eq!(result.total_processed, 1);
        assert_eq!(
            result.items[0]
                .attrs
                .computed_status
                .as_ref()
                .map(|s| s.simple_status),
            Some(AccountStatus::Locked)
        );
    }

    #[tokio::test]
    async fn test_list_active_users_excludes_natively_inactive() {
        let directory = sample_directory()
            .with_native(&user_dn("asmith"), NativeStatus::Reported("inactive".into()));
        let mut tools = DirectoryTools::new(directory, BASE_DN);

        let result = tools.list_active_users(None).await.unwrap();
        assert_eq!(result.kind, "active_users");
        assert_eq!(uids(&result.items), vec!["bsmith", "jdoe"]);
        assert_eq!(result.active_users_found, Some(2));
        assert_eq!(result.total_processed, 3);
    }

    #[tokio::test]
    async fn test_list_active_users_stops_at_limit() {
        let mut tools = tools();
        let result = tools.list_active_users(Some(1)).await.unwrap();

        assert_eq!(result.items.len(), 1);
        assert_eq!(result.found(), 1);
        assert_eq!(result.total_processed, 1);
        assert_eq!(tools.directory().native_calls, 1);
    }

    #[tokio::test]
    async fn test_lock_attribute_added_after_fixture() {
        let mut directory = sample_directory();
        directory.push(user("tlocked", "Tom Locked").with("nsAccountLock", ["TRUE"]));
        let mut tools = DirectoryTools::new(directory, BASE_DN);

        let result = tools.list_locked_users(None).await.unwrap();
        assert_eq!(uids(&result.items), vec!["mlocked", "tlocked"]);
    }
}

// ============================================================================
// Raw search
// ============================================================================

mod raw_search {
    use super::*;

    fn query(filter: &str) -> RawSearchQuery {
        RawSearchQuery {
            filter: Some(filter.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_defaults() {
        let mut tools = tools();
        let result = tools.raw_search(RawSearchQuery::default()).await.unwrap();

        assert_eq!(result.kind, "ldap_search");
        assert_eq!(result.base_dn, BASE_DN);
        assert_eq!(result.scope, "SUBTREE");
        assert_eq!(result.filter, "(objectClass=*)");
        assert_eq!(result.attributes_requested, None);
        assert_eq!(result.limit_applied, 100);
        assert_eq!(result.total_returned, sample_entries().len());
    }

    #[tokio::test]
    async fn test_filter_and_scope() {
        let mut tools = tools();
        let result = tools
            .raw_search(RawSearchQuery {
                base_dn: Some(PEOPLE_DN.to_string()),
                scope: Some("onelevel".to_string()),
                filter: Some("(&(objectClass=person)(cn=*Smith))".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(result.scope, "ONELEVEL");
        assert_eq!(uids(&result.items), vec!["asmith", "bsmith"]);

        let result = tools
            .raw_search(RawSearchQuery {
                base_dn: Some(PEOPLE_DN.to_string()),
                scope: Some("BASE".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].dn, PEOPLE_DN);
    }

    #[tokio::test]
    async fn test_bare_filter_is_accepted() {
        let mut tools = tools();
        let result = tools.raw_search(query("uid=jdoe")).await.unwrap();
        assert_eq!(uids(&result.items), vec!["jdoe"]);
    }

    #[tokio::test]
    async fn test_invalid_scope() {
        let mut tools = tools();
        let err = tools
            .raw_search(RawSearchQuery {
                scope: Some("DEEP".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidArgument(_)));
        assert!(err.to_string().contains("DEEP"));
        assert!(tools.directory().searches.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_filter() {
        let mut tools = tools();
        let err = tools.raw_search(query("(&(uid=jdoe)")).await.unwrap_err();
        match err {
            DirectoryError::QuerySyntax { filter, .. } => assert_eq!(filter, "(&(uid=jdoe)"),
            other => panic!("expected QuerySyntax, got {other:?}"),
        }
        assert!(tools.directory().searches.is_empty());
    }

    #[tokio::test]
    async fn test_nonexistent_base() {
        let mut tools = tools();
        let err = tools
            .raw_search(RawSearchQuery {
                base_dn: Some("ou=missing,dc=example,dc=com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::NoSuchBase(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_base_outside_configured_base() {
        let mut tools = tools();
        let err = tools
            .raw_search(RawSearchQuery {
                base_dn: Some("dc=other,dc=org".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidArgument(_)));
        assert!(tools.directory().searches.is_empty());
    }

    #[tokio::test]
    async fn test_attrs_only_and_limit() {
        let mut tools = tools();
        let result = tools
            .raw_search(RawSearchQuery {
                filter: Some("(objectClass=person)".to_string()),
                attributes: vec!["uid".to_string(), "mail".to_string()],
                attrs_only: true,
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(result.attrs_only);
        assert_eq!(result.attributes_requested.as_deref(), Some("uid,mail"));
        assert_eq!(result.total_returned, 2);
        for item in &result.items {
            assert!(item.attrs.values.values().all(Vec::is_empty));
            assert!(item.get("uid").is_some());
        }
    }

    #[tokio::test]
    async fn test_rejects_bad_attribute_selection() {
        let mut tools = tools();
        let err = tools
            .raw_search(RawSearchQuery {
                attributes: vec!["uid)(cn=*".to_string()],
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidArgument(_)));
    }
}

// ============================================================================
// Monitor and configuration
// ============================================================================

mod server_entries {
    use super::*;
    use ldap_mcp::tools::monitor::{CONFIG_DN, LDBM_DN, MONITOR_DN};

    fn server_directory() -> FakeDirectory {
        let mut directory = sample_directory();
        directory.push(
            DirectoryEntry::new(MONITOR_DN)
                .with("objectClass", ["top", "extensibleObject"])
                .with("version", ["389-Directory/2.4.5"])
                .with("threads", ["17"]),
        );
        directory.push(
            DirectoryEntry::new(CONFIG_DN)
                .with("objectClass", ["top", "nsslapdConfig"])
                .with("nsslapd-port", ["389"]),
        );
        directory.push(
            DirectoryEntry::new(LDBM_DN)
                .with("objectClass", ["top", "nsSlapdPlugin"])
                .with("cn", ["ldbm database"]),
        );
        directory.push(
            DirectoryEntry::new(format!("cn=userroot,{}", LDBM_DN))
                .with("objectClass", ["top", "nsBackendInstance"])
                .with("cn", ["userroot"])
                .with("nsslapd-suffix", [BASE_DN]),
        );
        directory.push(
            DirectoryEntry::new(format!("cn=monitor,cn=userroot,{}", LDBM_DN))
                .with("objectClass", ["top", "extensibleObject"])
                .with("entrycachehits", ["42"]),
        );
        directory
    }

    fn tools() -> DirectoryTools<FakeDirectory> {
        DirectoryTools::new(server_directory(), BASE_DN)
    }

    #[tokio::test]
    async fn test_server_monitor() {
        let mut tools = tools();
        let report = tools.run_monitor(None, None).await.unwrap();

        assert_eq!(report.kind, "monitor");
        assert_eq!(report.backend, None);
        assert_eq!(report.item.dn, MONITOR_DN);
        assert_eq!(report.item.first("version"), Some("389-Directory/2.4.5"));
    }

    #[tokio::test]
    async fn test_backend_monitor_by_name_and_suffix() {
        let mut tools = tools();

        let report = tools.run_monitor(Some("userroot"), None).await.unwrap();
        assert_eq!(report.backend.as_deref(), Some("userroot"));
        assert_eq!(report.item.first("entrycachehits"), Some("42"));

        let report = tools.run_monitor(None, Some(BASE_DN)).await.unwrap();
        assert_eq!(report.suffix.as_deref(), Some(BASE_DN));
        assert_eq!(report.item.first("entrycachehits"), Some("42"));
    }

    #[tokio::test]
    async fn test_monitor_argument_errors() {
        let mut tools = tools();

        let err = tools
            .run_monitor(Some("userroot"), Some(BASE_DN))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidArgument(_)));

        let err = tools.run_monitor(None, Some("dc=nowhere")).await.unwrap_err();
        assert!(err.to_string().contains("No backend serves suffix"));

        let err = tools
            .run_monitor(Some("user,root"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidArgument(_)));

        let err = tools.run_monitor(Some("missing"), None).await.unwrap_err();
        assert!(matches!(err, DirectoryError::NoSuchBase(_)));
    }

    #[tokio::test]
    async fn test_read_config() {
        let mut tools = tools();

        let entry = tools.read_config(None).await.unwrap().unwrap();
        assert_eq!(entry.kind, "config");
        assert_eq!(entry.dn, CONFIG_DN);
        assert_eq!(entry.item.first("nsslapd-port"), Some("389"));

        let missing = tools
            .read_config(Some("cn=missing,cn=config"))
            .await
            .unwrap();
        assert!(missing.is_none());

        let err = tools.read_config(Some(BASE_DN)).await.unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidArgument(_)));
    }
}
