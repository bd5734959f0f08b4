//! ldap3-backed [`Directory`] implementation.

use std::time::Duration;

use chrono::Utc;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, SearchEntry, SearchOptions};

use super::{Directory, DirectoryEndpoint, DirectoryEntry, SearchRequest};
use crate::config::Settings;
use crate::error::{DirectoryError, Result};
use crate::status::native::{probe_account_policy, NativeStatus};

const RC_SUCCESS: u32 = 0;
const RC_SIZE_LIMIT_EXCEEDED: u32 = 4;
const RC_NO_SUCH_OBJECT: u32 = 32;
const RC_FILTER_ERROR: u32 = 87;

/// A single bound connection. Owned by whoever serves tool calls; searches
/// are issued one at a time through `&mut self`.
pub struct LdapDirectory {
    ldap: Ldap,
    endpoint: DirectoryEndpoint,
    native_status: bool,
}

impl LdapDirectory {
    /// Open the connection and perform the simple bind (anonymous when no
    /// bind DN is configured).
    pub async fn connect(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let endpoint = settings.endpoint();

        let conn_settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .set_starttls(settings.starttls)
            .set_no_tls_verify(settings.no_tls_verify);

        let (conn, mut ldap) = LdapConnAsync::with_settings(conn_settings, &endpoint.url)
            .await
            .map_err(|e| DirectoryError::Connection(format!("{}: {}", endpoint.url, e)))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::error!("LDAP connection driver error: {}", e);
            }
        });

        let bind_dn = endpoint.bind_dn.as_deref().unwrap_or("");
        let password = endpoint.bind_password.as_deref().unwrap_or("");
        ldap.simple_bind(bind_dn, password)
            .await
            .map_err(|e| DirectoryError::Connection(e.to_string()))?
            .success()
            .map_err(|e| DirectoryError::Connection(format!("bind as '{}' failed: {}", bind_dn, e)))?;

        tracing::info!(
            url = %endpoint.url,
            bind_dn = if bind_dn.is_empty() { "<anonymous>" } else { bind_dn },
            "Bound to directory"
        );

        Ok(Self {
            ldap,
            endpoint,
            native_status: settings.native_status,
        })
    }

    pub fn endpoint(&self) -> &DirectoryEndpoint {
        &self.endpoint
    }

    pub async fn unbind(mut self) -> Result<()> {
        self.ldap
            .unbind()
            .await
            .map_err(|e| DirectoryError::Connection(e.to_string()))
    }
}

fn map_ldap_error(error: LdapError, filter: &str) -> DirectoryError {
    match error {
        LdapError::FilterParsing => DirectoryError::syntax(filter, "rejected by the LDAP client"),
        other => DirectoryError::Connection(other.to_string()),
    }
}

/// Map a search result code. Size limit exceeded is a normal, truncated
/// result.
fn check_result(rc: u32, text: String, filter: &str, base_dn: &str) -> Result<()> {
    match rc {
        RC_SUCCESS | RC_SIZE_LIMIT_EXCEEDED => Ok(()),
        RC_NO_SUCH_OBJECT => Err(DirectoryError::NoSuchBase(base_dn.to_string())),
        RC_FILTER_ERROR => Err(DirectoryError::syntax(filter, text)),
        code => Err(DirectoryError::Directory {
            code,
            message: text,
        }),
    }
}

impl Directory for LdapDirectory {
    async fn search(&mut self, request: &SearchRequest) -> Result<Vec<DirectoryEntry>> {
        let filter = request.filter().to_string();
        let options = SearchOptions::new()
            .sizelimit(i32::try_from(request.size_limit()).unwrap_or(i32::MAX))
            .typesonly(request.attrs_only());
        let attrs: Vec<&str> = request.attributes().iter().map(String::as_str).collect();

        let result = self
            .ldap
            .with_search_options(options)
            .search(request.base_dn(), request.scope().into(), &filter, attrs)
            .await
            .map_err(|e| map_ldap_error(e, &filter))?;
        let ldap3::SearchResult(entries, status) = result;

        check_result(status.rc, status.text, &filter, request.base_dn())?;

        Ok(entries
            .into_iter()
            .map(|entry| DirectoryEntry::from(SearchEntry::construct(entry)))
            .collect())
    }

    async fn native_status(&mut self, dn: &str) -> NativeStatus {
        if !self.native_status {
            return NativeStatus::Unsupported;
        }
        match probe_account_policy(self, dn, Utc::now()).await {
            Ok(state) => NativeStatus::Reported(state.to_string()),
            Err(e) => NativeStatus::Failed(e.to_string()),
        }
    }
}
