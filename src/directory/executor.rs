use super::{Directory, DirectoryEntry, Scope, SearchRequest};
use crate::error::{DirectoryError, Result};
use crate::filter::builder;

/// Issue `request` and return at most `size_limit` entries in server order.
pub async fn execute<D: Directory>(
    directory: &mut D,
    request: &SearchRequest,
) -> Result<Vec<DirectoryEntry>> {
    tracing::debug!(
        base = request.base_dn(),
        scope = request.scope().as_str(),
        filter = %request.filter(),
        size_limit = request.size_limit(),
        "LDAP search"
    );

    let mut entries = directory.search(request).await.map_err(|e| {
        tracing::debug!(base = request.base_dn(), filter = %request.filter(), "LDAP search failed: {}", e);
        e
    })?;

    if entries.len() > request.size_limit() {
        tracing::debug!(
            "Server returned {} entries, truncating to {}",
            entries.len(),
            request.size_limit()
        );
        entries.truncate(request.size_limit());
    }

    Ok(entries)
}

/// Read a single entry by DN. `Ok(None)` when it does not exist.
pub async fn read_entry<D: Directory>(
    directory: &mut D,
    dn: &str,
    attributes: &[&str],
) -> Result<Option<DirectoryEntry>> {
    let request = SearchRequest::new(dn, Scope::Base, builder::any_object())
        .with_attributes(attributes.iter().copied())
        .with_size_limit(1);

    match execute(directory, &request).await {
        Ok(entries) => Ok(entries.into_iter().next()),
        Err(DirectoryError::NoSuchBase(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
