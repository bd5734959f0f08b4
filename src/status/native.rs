//! Server-side account status, as computed by 389 Directory Server.
//!
//! The server reports locking through the `nsAccountLock` virtual attribute
//! (direct and role-based locks) and inactivity through the Account Policy
//! plugin. The probe reads both and answers with the server's vocabulary:
//! `activated`, `locked` or `inactive`.

use chrono::{DateTime, Duration, Utc};

use super::timestamp::parse_generalized_time;
use crate::directory::executor::read_entry;
use crate::directory::Directory;
use crate::error::{DirectoryError, Result};
use crate::filter::builder::LOCK_ATTRIBUTE;

pub const ACCOUNT_POLICY_CONFIG_DN: &str =
    "cn=config,cn=Account Policy Plugin,cn=plugins,cn=config";

const DEFAULT_STATE_ATTR: &str = "lastLoginTime";
const DEFAULT_ALT_STATE_ATTR: &str = "createTimestamp";
const DEFAULT_SPEC_ATTR: &str = "acctPolicySubentry";
const DEFAULT_LIMIT_ATTR: &str = "accountInactivityLimit";

/// Outcome of asking the server for an entry's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeStatus {
    /// The server answered with one of its status words.
    Reported(String),
    /// The server (or configuration) offers no status capability.
    Unsupported,
    /// The capability exists but the call failed.
    Failed(String),
}

/// Account Policy plugin settings relevant to inactivity.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AccountPolicy {
    state_attr: String,
    alt_state_attr: String,
    spec_attr: String,
    limit_attr: String,
    default_limit: Option<i64>,
}

impl AccountPolicy {
    async fn load<D: Directory>(directory: &mut D) -> Result<Option<Self>> {
        let Some(config) = read_entry(
            directory,
            ACCOUNT_POLICY_CONFIG_DN,
            &[
                "stateattrname",
                "altstateattrname",
                "specattrname",
                "limitattrname",
                DEFAULT_LIMIT_ATTR,
            ],
        )
        .await?
        else {
            return Ok(None);
        };

        let text = |name: &str, default: &str| {
            config
                .first_text(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map_or_else(|| default.to_string(), str::to_string)
        };

        let limit_attr = text("limitattrname", DEFAULT_LIMIT_ATTR);
        let default_limit = config
            .first_text(&limit_attr)
            .and_then(|v| v.trim().parse::<i64>().ok());

        Ok(Some(Self {
            state_attr: text("stateattrname", DEFAULT_STATE_ATTR),
            alt_state_attr: text("altstateattrname", DEFAULT_ALT_STATE_ATTR),
            spec_attr: text("specattrname", DEFAULT_SPEC_ATTR),
            limit_attr,
            default_limit,
        }))
    }
}

/// Compute the server-side status of `dn`.
///
/// Fails when the entry does not exist or any read fails.
pub async fn probe_account_policy<D: Directory>(
    directory: &mut D,
    dn: &str,
    now: DateTime<Utc>,
) -> Result<&'static str> {
    let policy = AccountPolicy::load(directory).await?;

    let mut attributes = vec![LOCK_ATTRIBUTE.to_string()];
    if let Some(policy) = &policy {
        attributes.push(policy.state_attr.clone());
        attributes.push(policy.alt_state_attr.clone());
        attributes.push(policy.spec_attr.clone());
    }
    let attribute_refs: Vec<&str> = attributes.iter().map(String::as_str).collect();

    let entry = read_entry(directory, dn, &attribute_refs)
        .await?
        .ok_or_else(|| DirectoryError::NoSuchBase(dn.to_string()))?;

    if entry
        .first_text(LOCK_ATTRIBUTE)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    {
        return Ok("locked");
    }

    let Some(policy) = policy else {
        return Ok("activated");
    };

    // A per-entry policy subentry overrides the plugin-wide limit.
    let mut limit = policy.default_limit;
    if let Some(subentry_dn) = entry.first_text(&policy.spec_attr) {
        if let Some(subentry) =
            read_entry(directory, subentry_dn, &[policy.limit_attr.as_str()]).await?
        {
            if let Some(value) = subentry.first_text(&policy.limit_attr) {
                limit = value.trim().parse::<i64>().ok().or(limit);
            }
        }
    }

    let Some(limit) = limit.filter(|l| *l > 0) else {
        return Ok("activated");
    };

    let last_activity = entry
        .first_text(&policy.state_attr)
        .and_then(parse_generalized_time)
        .or_else(|| {
            entry
                .first_text(&policy.alt_state_attr)
                .and_then(parse_generalized_time)
        });

    let Some(last) = last_activity else {
        return Ok("activated");
    };

    let expires = Duration::try_seconds(limit)
        .and_then(|delta| last.checked_add_signed(delta))
        .ok_or_else(|| {
            DirectoryError::Config(format!(
                "Account Policy inactivity limit out of range: {}",
                limit
            ))
        })?;

    if expires < now {
        Ok("inactive")
    } else {
        Ok("activated")
    }
}
