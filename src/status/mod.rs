//! Account status resolution.
//!
//! A user's status is decided by an ordered chain of [`Strategy`] values.
//! Each strategy either decides (`Some(status)`) or defers to the next one.
//! The first strategy consults the server's own status computation; the rest
//! inspect attributes already present on the entry. The only directory call
//! made here is the single [`Directory::native_status`] probe per entry.

pub mod native;
pub mod timestamp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::{Directory, DirectoryEntry};
use crate::filter::builder::LOCK_ATTRIBUTE;

pub use native::NativeStatus;
pub use timestamp::parse_generalized_time;

/// Password expiration attributes checked by the manual fallback, in order.
pub const EXPIRATION_ATTRIBUTES: [&str; 2] = ["passwordExpirationTime", "krbPasswordExpiration"];

/// Attributes the resolver reads from an entry. Searches that feed the
/// resolver must request these explicitly: most are operational.
pub const STATUS_ATTRIBUTES: [&str; 3] = [
    LOCK_ATTRIBUTE,
    EXPIRATION_ATTRIBUTES[0],
    EXPIRATION_ATTRIBUTES[1],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Locked,
    Inactive,
    Unknown,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Locked => "locked",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Unknown => "unknown",
        }
    }

    /// Map the server-side status vocabulary.
    pub fn from_native(state: &str) -> Option<Self> {
        match state.trim().to_ascii_lowercase().as_str() {
            "activated" => Some(AccountStatus::Active),
            "locked" => Some(AccountStatus::Locked),
            "inactive" => Some(AccountStatus::Inactive),
            _ => None,
        }
    }
}

/// Which path produced the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The server's status computation answered.
    Native,
    /// No server capability; attributes decided.
    Manual,
    /// The server capability failed and attributes decided instead.
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub simple_status: AccountStatus,
    pub resolved_by: Resolution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StatusReport {
    pub fn is_degraded(&self) -> bool {
        self.resolved_by == Resolution::Degraded
    }
}

/// Inputs visible to every strategy.
struct Evidence<'a> {
    entry: &'a DirectoryEntry,
    native: Option<AccountStatus>,
    native_failed: bool,
    now: DateTime<Utc>,
}

impl Evidence<'_> {
    fn lock_value(&self) -> Option<&str> {
        self.entry.first_text(LOCK_ATTRIBUTE)
    }

    fn expiration(&self) -> Option<DateTime<Utc>> {
        EXPIRATION_ATTRIBUTES
            .iter()
            .filter_map(|attr| self.entry.first_text(attr))
            .find_map(parse_generalized_time)
    }

    /// True when the entry carries anything the manual checks can use.
    fn has_manual_evidence(&self) -> bool {
        self.lock_value().is_some() || self.expiration().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Native,
    LockAttribute,
    PasswordExpiration,
    Fallback,
}

const CHAIN: [Strategy; 4] = [
    Strategy::Native,
    Strategy::LockAttribute,
    Strategy::PasswordExpiration,
    Strategy::Fallback,
];

impl Strategy {
    fn evaluate(self, evidence: &Evidence<'_>) -> Option<AccountStatus> {
        match self {
            Strategy::Native => evidence.native,
            Strategy::LockAttribute => evidence
                .lock_value()
                .filter(|v| v.trim().eq_ignore_ascii_case("true"))
                .map(|_| AccountStatus::Locked),
            Strategy::PasswordExpiration => evidence
                .expiration()
                .filter(|expires| *expires < evidence.now)
                .map(|_| AccountStatus::Inactive),
            Strategy::Fallback => {
                if evidence.native_failed && !evidence.has_manual_evidence() {
                    Some(AccountStatus::Unknown)
                } else {
                    Some(AccountStatus::Active)
                }
            }
        }
    }
}

/// Classify `entry` given the outcome of the native probe.
///
/// Pure: the same entry, native outcome and `now` always give the same
/// report.
pub fn classify(entry: &DirectoryEntry, native: &NativeStatus, now: DateTime<Utc>) -> StatusReport {
    let (native_status, native_failure) = match native {
        NativeStatus::Reported(state) => match AccountStatus::from_native(state) {
            Some(status) => (Some(status), None),
            None => (None, Some(format!("unrecognised native status '{}'", state))),
        },
        NativeStatus::Unsupported => (None, None),
        NativeStatus::Failed(reason) => (None, Some(reason.clone())),
    };

    let evidence = Evidence {
        entry,
        native: native_status,
        native_failed: native_failure.is_some(),
        now,
    };

    let (strategy, status) = CHAIN
        .iter()
        .find_map(|s| s.evaluate(&evidence).map(|status| (*s, status)))
        .unwrap_or((Strategy::Fallback, AccountStatus::Unknown));

    let resolved_by = match (strategy, &native_failure) {
        (Strategy::Native, _) => Resolution::Native,
        (_, Some(_)) => Resolution::Degraded,
        (_, None) => Resolution::Manual,
    };

    StatusReport {
        simple_status: status,
        resolved_by,
        detail: native_failure,
    }
}

/// Resolve the status of one entry: one native probe, then [`classify`].
///
/// A failed probe is logged as a degraded resolution and never returned as
/// an error.
pub async fn resolve<D: Directory>(directory: &mut D, entry: &DirectoryEntry) -> StatusReport {
    let native = directory.native_status(&entry.dn).await;
    let report = classify(entry, &native, Utc::now());

    if report.is_degraded() {
        tracing::warn!(
            dn = %entry.dn,
            status = report.simple_status.as_str(),
            "Native account status unavailable, used attribute fallback: {}",
            report.detail.as_deref().unwrap_or("unknown error")
        );
    }

    report
}
