use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, Result};
use crate::filter::Filter;

/// Default record limit for the entity tools.
pub const DEFAULT_LIMIT: usize = 50;
/// Default record limit for raw searches.
pub const DEFAULT_SEARCH_LIMIT: usize = 100;
/// No request may ask the server for more entries than this.
pub const MAX_LIMIT: usize = 1000;

/// Resolve an optional caller limit into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

/// Where to connect and how to bind. Immutable for the process lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct DirectoryEndpoint {
    pub url: String,
    pub base_dn: String,
    pub bind_dn: Option<String>,
    pub bind_password: Option<String>,
}

impl fmt::Debug for DirectoryEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryEndpoint")
            .field("url", &self.url)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &self.bind_password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    Base,
    OneLevel,
    Subtree,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Base => "BASE",
            Scope::OneLevel => "ONELEVEL",
            Scope::Subtree => "SUBTREE",
        }
    }
}

impl FromStr for Scope {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BASE" => Ok(Scope::Base),
            "ONELEVEL" | "ONE_LEVEL" | "ONE" => Ok(Scope::OneLevel),
            "SUBTREE" | "SUB" => Ok(Scope::Subtree),
            _ => Err(DirectoryError::invalid(format!(
                "Invalid scope '{}'. Expected BASE, ONELEVEL or SUBTREE",
                s
            ))),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Scope> for ldap3::Scope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Base => ldap3::Scope::Base,
            Scope::OneLevel => ldap3::Scope::OneLevel,
            Scope::Subtree => ldap3::Scope::Subtree,
        }
    }
}

/// One bounded search. Built once, then only read.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    base_dn: String,
    scope: Scope,
    filter: Filter,
    attributes: Vec<String>,
    attrs_only: bool,
    size_limit: usize,
}

impl SearchRequest {
    pub fn new(base_dn: impl Into<String>, scope: Scope, filter: Filter) -> Self {
        Self {
            base_dn: base_dn.into(),
            scope,
            filter,
            attributes: Vec::new(),
            attrs_only: false,
            size_limit: DEFAULT_LIMIT,
        }
    }

    /// Attributes to return; empty means all user attributes.
    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attrs_only(mut self, attrs_only: bool) -> Self {
        self.attrs_only = attrs_only;
        self
    }

    /// Clamped into `1..=MAX_LIMIT`.
    pub fn with_size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit.clamp(1, MAX_LIMIT);
        self
    }

    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn attrs_only(&self) -> bool {
        self.attrs_only
    }

    pub fn size_limit(&self) -> usize {
        self.size_limit
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Text(String),
    Binary(Vec<u8>),
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            AttributeValue::Binary(bytes) => std::str::from_utf8(bytes).ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<AttributeValue>,
}

/// A search result entry. Attribute names are unique ignoring ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    attributes: Vec<Attribute>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    /// Builder-style [`DirectoryEntry::insert`] for text values.
    pub fn with<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(
            name,
            values
                .into_iter()
                .map(|v| AttributeValue::Text(v.into()))
                .collect(),
        );
        self
    }

    /// Appends values; a name differing only in case merges into the
    /// existing attribute.
    pub fn insert(&mut self, name: &str, values: Vec<AttributeValue>) {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.values.extend(values),
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                values,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// First value of `name` that decodes as text.
    pub fn first_text(&self, name: &str) -> Option<&str> {
        self.get(name)?.values.iter().find_map(AttributeValue::as_text)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }
}

impl From<ldap3::SearchEntry> for DirectoryEntry {
    fn from(entry: ldap3::SearchEntry) -> Self {
        let mut result = DirectoryEntry::new(entry.dn);

        let mut text: Vec<_> = entry.attrs.into_iter().collect();
        text.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, values) in text {
            result.insert(&name, values.into_iter().map(AttributeValue::Text).collect());
        }

        let mut binary: Vec<_> = entry.bin_attrs.into_iter().collect();
        binary.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, values) in binary {
            result.insert(
                &name,
                values.into_iter().map(AttributeValue::Binary).collect(),
            );
        }

        result
    }
}
