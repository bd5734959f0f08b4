//! In-memory directory used by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use ldap_mcp::directory::dn;
use ldap_mcp::{
    Directory, DirectoryEntry, DirectoryError, Filter, NativeStatus, Result, Scope, SearchRequest,
};

pub const BASE_DN: &str = "dc=example,dc=com";
pub const PEOPLE_DN: &str = "ou=people,dc=example,dc=com";
pub const GROUPS_DN: &str = "ou=groups,dc=example,dc=com";

/// Evaluates filters and scopes against a fixed entry list.
///
/// Searches return every match regardless of the size limit, like a server
/// ignoring the requested limit.
pub struct FakeDirectory {
    entries: Vec<DirectoryEntry>,
    native: HashMap<String, NativeStatus>,
    default_native: NativeStatus,
    failure: Option<String>,
    pub searches: Vec<String>,
    pub native_calls: usize,
}

impl FakeDirectory {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries,
            native: HashMap::new(),
            default_native: NativeStatus::Unsupported,
            failure: None,
            searches: Vec::new(),
            native_calls: 0,
        }
    }

    pub fn with_native(mut self, dn: &str, status: NativeStatus) -> Self {
        self.native.insert(dn.to_lowercase(), status);
        self
    }

    pub fn with_default_native(mut self, status: NativeStatus) -> Self {
        self.default_native = status;
        self
    }

    /// Every search fails with a connection error from now on.
    pub fn fail_searches(&mut self, reason: &str) {
        self.failure = Some(reason.to_string());
    }

    pub fn push(&mut self, entry: DirectoryEntry) {
        self.entries.push(entry);
    }
}

impl Directory for FakeDirectory {
    async fn search(&mut self, request: &SearchRequest) -> Result<Vec<DirectoryEntry>> {
        self.searches.push(request.filter().to_string());

        if let Some(reason) = &self.failure {
            return Err(DirectoryError::Connection(reason.clone()));
        }

        let base = request.base_dn();
        if !self.entries.iter().any(|e| dn::same_dn(&e.dn, base)) {
            return Err(DirectoryError::NoSuchBase(base.to_string()));
        }

        let base_depth = dn::rdns(base).len();
        Ok(self
            .entries
            .iter()
            .filter(|e| match request.scope() {
                Scope::Base => dn::same_dn(&e.dn, base),
                Scope::OneLevel => {
                    dn::is_within(&e.dn, base) && dn::rdns(&e.dn).len() == base_depth + 1
                }
                Scope::Subtree => dn::is_within(&e.dn, base),
            })
            .filter(|e| matches(request.filter(), e))
            .cloned()
            .collect())
    }

    async fn native_status(&mut self, dn: &str) -> NativeStatus {
        self.native_calls += 1;
        self.native
            .get(&dn.to_lowercase())
            .cloned()
            .unwrap_or_else(|| self.default_native.clone())
    }
}

fn values(entry: &DirectoryEntry, attribute: &str) -> Vec<String> {
    entry
        .get(attribute)
        .map(|a| {
            a.values
                .iter()
                .filter_map(|v| v.as_text())
                .map(str::to_lowercase)
                .collect()
        })
        .unwrap_or_default()
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_lowercase()
}

fn compare(value: &str, assertion: &str) -> std::cmp::Ordering {
    match (value.parse::<i64>(), assertion.parse::<i64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => value.cmp(assertion),
    }
}

fn matches_substrings(value: &str, initial: Option<&str>, any: &[String], last: Option<&str>) -> bool {
    let mut rest = value;
    if let Some(initial) = initial {
        match rest.strip_prefix(initial) {
            Some(tail) => rest = tail,
            None => return false,
        }
    }
    for part in any {
        match rest.find(part.as_str()) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    match last {
        Some(last) => rest.ends_with(last),
        None => true,
    }
}

pub fn matches(filter: &Filter, entry: &DirectoryEntry) -> bool {
    match filter {
        Filter::And(items) => items.iter().all(|f| matches(f, entry)),
        Filter::Or(items) => items.iter().any(|f| matches(f, entry)),
        Filter::Not(inner) => !matches(inner, entry),
        Filter::Equality(attr, value) | Filter::Approx(attr, value) => {
            let wanted = text(value);
            values(entry, attr.as_str()).iter().any(|v| *v == wanted)
        }
        Filter::Substring(attr, parts) => {
            let initial = parts.initial.as_deref().map(text);
            let any: Vec<String> = parts.any.iter().map(|p| text(p)).collect();
            let last = parts.last.as_deref().map(text);
            values(entry, attr.as_str()).iter().any(|v| {
                matches_substrings(v, initial.as_deref(), &any, last.as_deref())
            })
        }
        Filter::GreaterOrEqual(attr, value) => {
            let wanted = text(value);
            values(entry, attr.as_str())
                .iter()
                .any(|v| compare(v, &wanted).is_ge())
        }
        Filter::LessOrEqual(attr, value) => {
            let wanted = text(value);
            values(entry, attr.as_str())
                .iter()
                .any(|v| compare(v, &wanted).is_le())
        }
        Filter::Present(attr) => entry.has(attr.as_str()),
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn container(dn: &str) -> DirectoryEntry {
    DirectoryEntry::new(dn).with("objectClass", ["top", "organizationalUnit"])
}

pub fn user(uid: &str, cn: &str) -> DirectoryEntry {
    DirectoryEntry::new(format!("uid={},{}", uid, PEOPLE_DN))
        .with("objectClass", ["top", "person", "inetOrgPerson"])
        .with("uid", [uid])
        .with("cn", [cn])
        .with("mail", [format!("{}@example.com", uid)])
}

pub fn group(cn: &str, members: &[&str]) -> DirectoryEntry {
    DirectoryEntry::new(format!("cn={},{}", cn, GROUPS_DN))
        .with("objectClass", ["top", "groupOfNames"])
        .with("cn", [cn])
        .with(
            "member",
            members
                .iter()
                .map(|uid| format!("uid={},{}", uid, PEOPLE_DN)),
        )
}

/// Base, people and groups containers with four users and two groups.
/// `mlocked` carries `nsAccountLock: true`.
pub fn sample_entries() -> Vec<DirectoryEntry> {
    vec![
        DirectoryEntry::new(BASE_DN).with("objectClass", ["top", "domain"]),
        container(PEOPLE_DN),
        container(GROUPS_DN),
        user("jdoe", "John Doe"),
        user("asmith", "Alice Smith"),
        user("bsmith", "Bob Smith").with("displayName", ["Bobby"]),
        user("mlocked", "Mallory Locked").with("nsAccountLock", ["true"]),
        group("admins", &["jdoe"]),
        group("staff", &["jdoe", "asmith", "bsmith"]),
    ]
}

pub fn sample_directory() -> FakeDirectory {
    FakeDirectory::new(sample_entries())
}

pub fn user_dn(uid: &str) -> String {
    format!("uid={},{}", uid, PEOPLE_DN)
}
