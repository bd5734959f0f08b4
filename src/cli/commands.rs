use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

use ldap_mcp::config::{Overrides, Settings};
use ldap_mcp::directory::LdapDirectory;
use ldap_mcp::mcp::{McpServer, ToolReply};
use ldap_mcp::tools::DirectoryTools;

#[derive(Parser)]
#[command(name = "ldap-mcp")]
#[command(about = "Read-only LDAP directory introspection over MCP")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Start MCP server on stdio
    LDAP_URL=ldap://ldap.example.com LDAP_BASE_DN=dc=example,dc=com ldap-mcp serve

    # List users
    ldap-mcp --base-dn dc=example,dc=com users --limit 20

    # Find users by name
    ldap-mcp find smith

    # Show one user with computed account status
    ldap-mcp user jdoe

    # Raw search
    ldap-mcp search "(mail=*@example.com)" --attrs uid,mail --scope SUBTREE

    # Backend monitor by suffix
    ldap-mcp monitor --suffix dc=example,dc=com
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// LDAP server URL
    #[arg(long, global = true, env = "LDAP_URL")]
    pub url: Option<String>,

    /// Base DN for all searches
    #[arg(long, global = true, env = "LDAP_BASE_DN")]
    pub base_dn: Option<String>,

    /// DN to bind as (anonymous when omitted)
    #[arg(long, global = true, env = "LDAP_BIND_DN")]
    pub bind_dn: Option<String>,

    /// Password for the bind DN
    #[arg(long, global = true, env = "LDAP_BIND_PASSWORD", hide_env_values = true)]
    pub bind_password: Option<String>,

    /// Resolve account status from attributes only
    #[arg(long, global = true)]
    pub no_native_status: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start MCP server
    Serve,

    /// List users
    Users {
        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List groups
    Groups {
        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Find users by uid, cn, displayName or mail
    Find {
        /// Text to look for
        name: String,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one user with computed account status
    User {
        /// The user's uid
        username: String,
    },

    /// List active users
    Active {
        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List locked users
    Locked {
        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Find users by attribute value
    Attr {
        /// Attribute name
        attribute: String,

        /// Value to match
        value: String,

        /// Substring match instead of exact
        #[arg(long)]
        partial: bool,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Raw LDAP search below the base DN
    Search {
        /// LDAP filter
        filter: String,

        /// Search base (default: the configured base DN)
        #[arg(long)]
        base: Option<String>,

        /// BASE, ONELEVEL or SUBTREE
        #[arg(long)]
        scope: Option<String>,

        /// Comma separated attributes to return
        #[arg(long)]
        attrs: Option<String>,

        /// Return attribute names only
        #[arg(long)]
        attrs_only: bool,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Read server or backend monitor
    Monitor {
        /// Backend name
        #[arg(long, conflicts_with = "suffix")]
        backend: Option<String>,

        /// Suffix served by the backend
        #[arg(long)]
        suffix: Option<String>,
    },

    /// Read a configuration entry under cn=config
    Config {
        /// Entry DN (default: cn=config)
        #[arg(long)]
        dn: Option<String>,
    },
}

impl Commands {
    /// Tool name and arguments for commands that map onto an MCP tool.
    pub fn tool_call(&self) -> Option<(&'static str, Map<String, Value>)> {
        let (name, args) = match self {
            Commands::Serve => return None,
            Commands::Users { limit } => ("list_all_users", json!({ "limit": limit })),
            Commands::Groups { limit } => ("list_all_groups", json!({ "limit": limit })),
            Commands::Find { name, limit } => (
                "search_users_by_name",
                json!({ "name": name, "limit": limit }),
            ),
            Commands::User { username } => ("get_user_details", json!({ "username": username })),
            Commands::Active { limit } => ("list_active_users", json!({ "limit": limit })),
            Commands::Locked { limit } => ("list_locked_users", json!({ "limit": limit })),
            Commands::Attr {
                attribute,
                value,
                partial,
                limit,
            } => (
                "search_users_by_attribute",
                json!({
                    "attribute": attribute,
                    "value": value,
                    "partial": partial,
                    "limit": limit,
                }),
            ),
            Commands::Search {
                filter,
                base,
                scope,
                attrs,
                attrs_only,
                limit,
            } => (
                "ldap_search",
                json!({
                    "filter": filter,
                    "base_dn": base,
                    "scope": scope,
                    "attributes": attrs,
                    "attrs_only": attrs_only,
                    "limit": limit,
                }),
            ),
            Commands::Monitor { backend, suffix } => (
                "run_monitor",
                json!({ "backend": backend, "suffix": suffix }),
            ),
            Commands::Config { dn } => ("read_config", json!({ "dn": dn })),
        };

        match args {
            Value::Object(map) => Some((name, map)),
            _ => None,
        }
    }
}

impl Cli {
    /// Defaults, then the settings file, then environment and flags.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let overrides = Overrides {
            url: self.url.clone(),
            base_dn: self.base_dn.clone(),
            bind_dn: self.bind_dn.clone(),
            bind_password: self.bind_password.clone(),
            native_status: self.no_native_status.then_some(false),
        };
        let settings = Settings::load(self.config.as_deref())?.apply(overrides);
        settings.validate()?;
        Ok(settings)
    }
}

async fn open(settings: &Settings) -> anyhow::Result<DirectoryTools<LdapDirectory>> {
    let directory = LdapDirectory::connect(settings)
        .await
        .with_context(|| format!("Failed to connect to {}", settings.url))?;
    Ok(DirectoryTools::new(directory, settings.base_dn.trim()))
}

pub async fn run_mcp_server(settings: &Settings) -> anyhow::Result<()> {
    use rmcp::ServiceExt;

    let tools = open(settings).await?;
    let server = McpServer::new(tools);

    tracing::info!(base_dn = %settings.base_dn, "Starting MCP server on stdio");

    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let running = server
        .serve(transport)
        .await
        .map_err(|e| ldap_mcp::DirectoryError::Mcp(e.to_string()))?;
    running
        .waiting()
        .await
        .map_err(|e| ldap_mcp::DirectoryError::Mcp(e.to_string()))?;

    Ok(())
}

/// Run one tool and print its JSON document.
pub async fn run_tool(
    settings: &Settings,
    name: &str,
    arguments: Map<String, Value>,
) -> anyhow::Result<()> {
    let tools = open(settings).await?;
    let server = McpServer::new(tools);

    match server.execute(name, Some(arguments)).await {
        Ok(ToolReply::Json(json)) => {
            println!("{}", json);
            Ok(())
        }
        Ok(ToolReply::Failure(text)) => bail!(text),
        Err(e) => bail!("{}", e.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_command_maps_to_ldap_search() {
        let cli = Cli::try_parse_from([
            "ldap-mcp",
            "search",
            "(uid=jdoe)",
            "--scope",
            "ONELEVEL",
            "--attrs",
            "uid,mail",
            "--attrs-only",
        ])
        .unwrap();
        let (name, args) = cli.command.tool_call().unwrap();
        assert_eq!(name, "ldap_search");
        assert_eq!(args["filter"], "(uid=jdoe)");
        assert_eq!(args["scope"], "ONELEVEL");
        assert_eq!(args["attributes"], "uid,mail");
        assert_eq!(args["attrs_only"], true);
        assert!(args["limit"].is_null());
    }

    #[test]
    fn test_serve_has_no_tool() {
        let cli = Cli::try_parse_from(["ldap-mcp", "serve"]).unwrap();
        assert!(cli.command.tool_call().is_none());
    }

    #[test]
    fn test_monitor_rejects_backend_and_suffix() {
        let result = Cli::try_parse_from([
            "ldap-mcp",
            "monitor",
            "--backend",
            "userroot",
            "--suffix",
            "dc=example,dc=com",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"url = \"ldap://file.example.com\"\nbase_dn = \"dc=file,dc=com\"\n",
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from([
            "ldap-mcp",
            "--config",
            &path,
            "--base-dn",
            "dc=flag,dc=com",
            "--no-native-status",
            "users",
        ])
        .unwrap();
        let settings = cli.settings().unwrap();
        assert_eq!(settings.base_dn, "dc=flag,dc=com");
        assert!(!settings.native_status);
    }
}
