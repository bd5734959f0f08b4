//! Server monitor and configuration reads (389 Directory Server layout).

use super::{ConfigEntry, DirectoryTools, MonitorReport};
use crate::directory::executor::read_entry;
use crate::directory::{dn, execute, Directory, Scope, SearchRequest};
use crate::error::{DirectoryError, Result};
use crate::filter::{AttributeName, Filter};
use crate::normalize::normalize;

pub const MONITOR_DN: &str = "cn=monitor";
pub const CONFIG_DN: &str = "cn=config";
pub const LDBM_DN: &str = "cn=ldbm database,cn=plugins,cn=config";

fn backend_monitor_dn(backend: &str) -> String {
    format!("cn=monitor,cn={},{}", ldap3::dn_escape(backend), LDBM_DN)
}

impl<D: Directory> DirectoryTools<D> {
    /// Read the server monitor, or the monitor of one database backend
    /// selected by name or by the suffix it serves.
    pub async fn run_monitor(
        &mut self,
        backend: Option<&str>,
        suffix: Option<&str>,
    ) -> Result<MonitorReport> {
        let backend = backend.map(str::trim).filter(|b| !b.is_empty());
        let suffix = suffix.map(str::trim).filter(|s| !s.is_empty());

        let target = match (backend, suffix) {
            (Some(_), Some(_)) => {
                return Err(DirectoryError::invalid(
                    "Specify either a backend or a suffix, not both",
                ))
            }
            (Some(name), None) => {
                AttributeName::parse(name).map_err(|_| {
                    DirectoryError::invalid(format!("Invalid backend name '{}'", name))
                })?;
                backend_monitor_dn(name)
            }
            (None, Some(suffix)) => {
                let name = self.backend_for_suffix(suffix).await?;
                backend_monitor_dn(&name)
            }
            (None, None) => MONITOR_DN.to_string(),
        };

        let entry = read_entry(self.directory_mut(), &target, &["*", "+"])
            .await?
            .ok_or_else(|| DirectoryError::NoSuchBase(target.clone()))?;

        Ok(MonitorReport {
            kind: "monitor".to_string(),
            backend: backend.map(str::to_string),
            suffix: suffix.map(str::to_string),
            item: normalize(&entry, false),
        })
    }

    /// Name of the ldbm backend whose `nsslapd-suffix` is `suffix`.
    async fn backend_for_suffix(&mut self, suffix: &str) -> Result<String> {
        let suffix_attr = AttributeName::parse("nsslapd-suffix")?;
        let request = SearchRequest::new(
            LDBM_DN,
            Scope::OneLevel,
            Filter::eq(&suffix_attr, suffix),
        )
        .with_attributes(["cn", "nsslapd-suffix"])
        .with_size_limit(1);

        let entries = execute(self.directory_mut(), &request).await?;
        entries
            .first()
            .and_then(|entry| entry.first_text("cn"))
            .map(str::to_string)
            .ok_or_else(|| DirectoryError::invalid(format!("No backend serves suffix '{}'", suffix)))
    }

    /// Read one configuration entry under `cn=config`. `Ok(None)` when the
    /// entry does not exist.
    pub async fn read_config(&mut self, target: Option<&str>) -> Result<Option<ConfigEntry>> {
        let target = target
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(CONFIG_DN)
            .to_string();

        if !dn::is_within(&target, CONFIG_DN) {
            return Err(DirectoryError::invalid(format!(
                "'{}' is not a configuration entry (must be under {})",
                target, CONFIG_DN
            )));
        }

        let Some(entry) = read_entry(self.directory_mut(), &target, &["*", "+"]).await? else {
            return Ok(None);
        };

        Ok(Some(ConfigEntry {
            kind: "config".to_string(),
            dn: target,
            item: normalize(&entry, false),
        }))
    }
}
