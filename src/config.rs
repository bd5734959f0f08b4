//! Connection settings.
//!
//! Resolved from defaults, then an optional TOML file, then explicit
//! overrides (the CLI feeds environment variables and flags through
//! [`Overrides`]).

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::directory::DirectoryEndpoint;
use crate::error::{DirectoryError, Result};

#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub url: String,
    pub base_dn: String,
    pub bind_dn: Option<String>,
    pub bind_password: Option<String>,
    /// Ask the server for account status before falling back to attributes.
    pub native_status: bool,
    pub connect_timeout_secs: u64,
    pub starttls: bool,
    pub no_tls_verify: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: "ldap://localhost:389".to_string(),
            base_dn: String::new(),
            bind_dn: None,
            bind_password: None,
            native_status: true,
            connect_timeout_secs: 10,
            starttls: false,
            no_tls_verify: false,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("url", &self.url)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &self.bind_password.as_ref().map(|_| "***"))
            .field("native_status", &self.native_status)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("starttls", &self.starttls)
            .field("no_tls_verify", &self.no_tls_verify)
            .finish()
    }
}

/// Values that take precedence over the settings file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub base_dn: Option<String>,
    pub bind_dn: Option<String>,
    pub bind_password: Option<String>,
    pub native_status: Option<bool>,
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DirectoryError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| DirectoryError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Defaults, or the file at `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.url {
            self.url = url;
        }
        if let Some(base_dn) = overrides.base_dn {
            self.base_dn = base_dn;
        }
        if overrides.bind_dn.is_some() {
            self.bind_dn = overrides.bind_dn;
        }
        if overrides.bind_password.is_some() {
            self.bind_password = overrides.bind_password;
        }
        if let Some(native_status) = overrides.native_status {
            self.native_status = native_status;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let scheme_ok = ["ldap://", "ldaps://", "ldapi://"]
            .iter()
            .any(|scheme| self.url.to_ascii_lowercase().starts_with(scheme));
        if !scheme_ok {
            return Err(DirectoryError::Config(format!(
                "LDAP URL '{}' must start with ldap://, ldaps:// or ldapi://",
                self.url
            )));
        }
        if self.base_dn.trim().is_empty() {
            return Err(DirectoryError::Config(
                "Base DN is required (LDAP_BASE_DN or --base-dn)".to_string(),
            ));
        }
        if self.bind_dn.is_some() && self.bind_password.is_none() {
            return Err(DirectoryError::Config(format!(
                "Bind DN '{}' configured without a password",
                self.bind_dn.as_deref().unwrap_or_default()
            )));
        }
        Ok(())
    }

    pub fn endpoint(&self) -> DirectoryEndpoint {
        DirectoryEndpoint {
            url: self.url.clone(),
            base_dn: self.base_dn.trim().to_string(),
            bind_dn: self.bind_dn.clone(),
            bind_password: self.bind_password.clone(),
        }
    }
}
