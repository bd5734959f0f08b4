//! JSON documents returned by the directory tools.

use serde::{Deserialize, Serialize};

use crate::normalize::NormalizedRecord;

/// `user_list` / `group_list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordList {
    #[serde(rename = "type")]
    pub kind: String,
    pub items: Vec<NormalizedRecord>,
    pub total_returned: usize,
    pub limit_applied: usize,
}

impl RecordList {
    pub fn new(kind: &str, items: Vec<NormalizedRecord>, limit_applied: usize) -> Self {
        Self {
            kind: kind.to_string(),
            total_returned: items.len(),
            items,
            limit_applied,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSearch {
    #[serde(rename = "type")]
    pub kind: String,
    pub search_term: String,
    pub items: Vec<NormalizedRecord>,
    pub total_returned: usize,
    pub limit_applied: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeSearch {
    #[serde(rename = "type")]
    pub kind: String,
    pub attribute: String,
    pub value: String,
    pub partial: bool,
    pub items: Vec<NormalizedRecord>,
    pub total_returned: usize,
    pub limit_applied: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetails {
    #[serde(rename = "type")]
    pub kind: String,
    pub username: String,
    pub user: NormalizedRecord,
}

/// `active_users` / `locked_users`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusList {
    #[serde(rename = "type")]
    pub kind: String,
    pub items: Vec<NormalizedRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_users_found: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_users_found: Option<usize>,
    /// Candidates classified before the limit was reached.
    pub total_processed: usize,
    pub limit_applied: usize,
}

impl StatusList {
    pub fn found(&self) -> usize {
        self.active_users_found
            .or(self.locked_users_found)
            .unwrap_or(self.items.len())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSearchResult {
    #[serde(rename = "type")]
    pub kind: String,
    pub base_dn: String,
    pub scope: String,
    pub filter: String,
    pub attributes_requested: Option<String>,
    pub attrs_only: bool,
    pub items: Vec<NormalizedRecord>,
    pub total_returned: usize,
    pub limit_applied: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorReport {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    pub item: NormalizedRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub dn: String,
    pub item: NormalizedRecord,
}
