//! Directory operations exposed as tools.
//!
//! Each operation builds a filter, runs bounded searches through the
//! executor, resolves account status where needed and normalizes the result
//! into one of the documents in [`responses`].

pub mod monitor;
pub mod responses;

use crate::directory::{
    clamp_limit, dn, execute, Directory, Scope, SearchRequest, DEFAULT_LIMIT,
    DEFAULT_SEARCH_LIMIT, MAX_LIMIT,
};
use crate::error::{DirectoryError, Result};
use crate::filter::{builder, parse_filter, AttributeName, Filter};
use crate::normalize::{normalize, normalize_all};
use crate::status::{self, AccountStatus, STATUS_ATTRIBUTES};

pub use responses::*;

/// Caller input for [`DirectoryTools::raw_search`].
#[derive(Debug, Clone, Default)]
pub struct RawSearchQuery {
    /// Defaults to the configured base DN.
    pub base_dn: Option<String>,
    /// Defaults to `SUBTREE`.
    pub scope: Option<String>,
    /// Defaults to `(objectClass=*)`.
    pub filter: Option<String>,
    pub attributes: Vec<String>,
    pub attrs_only: bool,
    pub limit: Option<usize>,
}

/// Split a comma separated attribute list, dropping blanks.
pub fn split_attribute_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_selection(attributes: &[String]) -> Result<()> {
    for name in attributes {
        if matches!(name.as_str(), "*" | "+" | "1.1") {
            continue;
        }
        AttributeName::parse(name)?;
    }
    Ok(())
}

fn user_attributes() -> Vec<String> {
    std::iter::once("*")
        .chain(STATUS_ATTRIBUTES)
        .map(str::to_string)
        .collect()
}

/// The tool operations over one directory session.
pub struct DirectoryTools<D> {
    directory: D,
    base_dn: String,
}

impl<D: Directory> DirectoryTools<D> {
    pub fn new(directory: D, base_dn: impl Into<String>) -> Self {
        Self {
            directory,
            base_dn: base_dn.into(),
        }
    }

    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut D {
        &mut self.directory
    }

    pub fn into_directory(self) -> D {
        self.directory
    }

    fn subtree(&self, filter: Filter) -> SearchRequest {
        SearchRequest::new(self.base_dn.as_str(), Scope::Subtree, filter)
    }

    pub async fn list_all_users(&mut self, limit: Option<usize>) -> Result<RecordList> {
        let limit = clamp_limit(limit, DEFAULT_LIMIT);
        let request = self.subtree(builder::all_users()).with_size_limit(limit);
        let entries = execute(&mut self.directory, &request).await?;
        Ok(RecordList::new(
            "user_list",
            normalize_all(&entries, false, limit),
            limit,
        ))
    }

    pub async fn list_all_groups(&mut self, limit: Option<usize>) -> Result<RecordList> {
        let limit = clamp_limit(limit, DEFAULT_LIMIT);
        let request = self.subtree(builder::all_groups()).with_size_limit(limit);
        let entries = execute(&mut self.directory, &request).await?;
        Ok(RecordList::new(
            "group_list",
            normalize_all(&entries, false, limit),
            limit,
        ))
    }

    pub async fn search_users_by_name(
        &mut self,
        name: &str,
        limit: Option<usize>,
    ) -> Result<UserSearch> {
        let limit = clamp_limit(limit, DEFAULT_LIMIT);
        let request = self.subtree(builder::by_name(name)?).with_size_limit(limit);
        let entries = execute(&mut self.directory, &request).await?;
        let items = normalize_all(&entries, false, limit);
        Ok(UserSearch {
            kind: "user_search".to_string(),
            search_term: name.to_string(),
            total_returned: items.len(),
            items,
            limit_applied: limit,
        })
    }

    pub async fn search_users_by_attribute(
        &mut self,
        attribute: &str,
        value: &str,
        partial: bool,
        limit: Option<usize>,
    ) -> Result<AttributeSearch> {
        let limit = clamp_limit(limit, DEFAULT_LIMIT);
        let filter = builder::by_attribute(attribute, value, partial)?;
        let request = self.subtree(filter).with_size_limit(limit);
        let entries = execute(&mut self.directory, &request).await?;
        let items = normalize_all(&entries, false, limit);
        Ok(AttributeSearch {
            kind: "attribute_search".to_string(),
            attribute: attribute.trim().to_string(),
            value: value.to_string(),
            partial,
            total_returned: items.len(),
            items,
            limit_applied: limit,
        })
    }

    /// `Ok(None)` when no user has this `uid`.
    pub async fn get_user_details(&mut self, username: &str) -> Result<Option<UserDetails>> {
        let request = self
            .subtree(builder::by_uid(username)?)
            .with_attributes(user_attributes())
            .with_size_limit(1);
        let entries = execute(&mut self.directory, &request).await?;

        let Some(entry) = entries.into_iter().next() else {
            return Ok(None);
        };

        let report = status::resolve(&mut self.directory, &entry).await;
        Ok(Some(UserDetails {
            kind: "user_details".to_string(),
            username: username.trim().to_string(),
            user: normalize(&entry, false).with_status(report),
        }))
    }

    pub async fn list_active_users(&mut self, limit: Option<usize>) -> Result<StatusList> {
        self.list_by_status(AccountStatus::Active, limit).await
    }

    pub async fn list_locked_users(&mut self, limit: Option<usize>) -> Result<StatusList> {
        self.list_by_status(AccountStatus::Locked, limit).await
    }

    /// The candidate filter only narrows the search; every candidate is
    /// classified by the status resolver before it is included.
    async fn list_by_status(
        &mut self,
        wanted: AccountStatus,
        limit: Option<usize>,
    ) -> Result<StatusList> {
        let limit = clamp_limit(limit, DEFAULT_LIMIT);
        let candidates = match wanted {
            AccountStatus::Locked => builder::locked(),
            _ => builder::active(),
        };
        let request = self
            .subtree(candidates)
            .with_attributes(user_attributes())
            .with_size_limit(MAX_LIMIT);
        let entries = execute(&mut self.directory, &request).await?;

        let mut items = Vec::new();
        let mut processed = 0;
        for entry in &entries {
            if items.len() >= limit {
                break;
            }
            processed += 1;
            let report = status::resolve(&mut self.directory, entry).await;
            if report.simple_status == wanted {
                items.push(normalize(entry, false).with_status(report));
            }
        }

        tracing::debug!(
            status = wanted.as_str(),
            candidates = entries.len(),
            processed,
            found = items.len(),
            "Classified candidate users"
        );

        let found = Some(items.len());
        let (kind, active_users_found, locked_users_found) = match wanted {
            AccountStatus::Locked => ("locked_users", None, found),
            _ => ("active_users", found, None),
        };
        Ok(StatusList {
            kind: kind.to_string(),
            items,
            active_users_found,
            locked_users_found,
            total_processed: processed,
            limit_applied: limit,
        })
    }

    /// Caller-supplied search, confined to the configured base DN.
    pub async fn raw_search(&mut self, query: RawSearchQuery) -> Result<RawSearchResult> {
        let base_dn = query
            .base_dn
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(self.base_dn.as_str())
            .to_string();
        if !dn::is_within(&base_dn, &self.base_dn) {
            return Err(DirectoryError::invalid(format!(
                "Base DN '{}' is outside the configured base '{}'",
                base_dn, self.base_dn
            )));
        }

        let scope: Scope = query.scope.as_deref().unwrap_or("SUBTREE").parse()?;
        let filter_text = query
            .filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or("(objectClass=*)")
            .to_string();
        let filter = parse_filter(&filter_text)?;
        validate_selection(&query.attributes)?;
        let limit = clamp_limit(query.limit, DEFAULT_SEARCH_LIMIT);

        let request = SearchRequest::new(base_dn.as_str(), scope, filter)
            .with_attributes(query.attributes.iter().cloned())
            .with_attrs_only(query.attrs_only)
            .with_size_limit(limit);
        let entries = execute(&mut self.directory, &request).await?;
        let items = normalize_all(&entries, query.attrs_only, limit);

        Ok(RawSearchResult {
            kind: "ldap_search".to_string(),
            base_dn,
            scope: scope.as_str().to_string(),
            filter: filter_text,
            attributes_requested: (!query.attributes.is_empty())
                .then(|| query.attributes.join(",")),
            attrs_only: query.attrs_only,
            total_returned: items.len(),
            items,
            limit_applied: limit,
        })
    }
}
