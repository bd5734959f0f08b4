//! Conversion of directory entries into JSON-safe records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::directory::DirectoryEntry;
use crate::status::StatusReport;

/// Attribute values as strings, always a list even when single-valued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAttrs {
    #[serde(flatten)]
    pub values: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_status: Option<StatusReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub dn: String,
    pub attrs: NormalizedAttrs,
}

impl NormalizedRecord {
    pub fn with_status(mut self, status: StatusReport) -> Self {
        self.attrs.computed_status = Some(status);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Vec<String>> {
        self.attrs
            .values
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values)
    }

    /// First value of `name`, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)?.first().map(String::as_str)
    }
}

/// Normalize one entry.
///
/// Values that are not valid UTF-8 are dropped, and an attribute whose values
/// were all dropped is omitted. With `attrs_only` every attribute maps to an
/// empty list.
pub fn normalize(entry: &DirectoryEntry, attrs_only: bool) -> NormalizedRecord {
    let mut values = BTreeMap::new();

    for attribute in entry.attributes() {
        if attrs_only {
            values.insert(attribute.name.clone(), Vec::new());
            continue;
        }

        let decoded: Vec<String> = attribute
            .values
            .iter()
            .filter_map(|v| v.as_text().map(str::to_string))
            .collect();

        if decoded.is_empty() && !attribute.values.is_empty() {
            tracing::debug!(
                dn = %entry.dn,
                attribute = %attribute.name,
                "Dropping attribute with undecodable values"
            );
            continue;
        }
        values.insert(attribute.name.clone(), decoded);
    }

    NormalizedRecord {
        dn: entry.dn.clone(),
        attrs: NormalizedAttrs {
            values,
            computed_status: None,
        },
    }
}

/// Normalize at most `limit` entries, in order.
pub fn normalize_all(
    entries: &[DirectoryEntry],
    attrs_only: bool,
    limit: usize,
) -> Vec<NormalizedRecord> {
    entries
        .iter()
        .take(limit)
        .map(|entry| normalize(entry, attrs_only))
        .collect()
}
