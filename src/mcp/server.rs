use std::sync::Arc;

use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool, ToolsCapability,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use super::params::*;
use crate::directory::Directory;
use crate::tools::{DirectoryTools, RawSearchQuery};

/// Serves the directory tools over MCP.
///
/// All calls share one directory session behind a mutex, so each tool call
/// runs to completion before the next one touches the connection.
pub struct McpServer<D> {
    tools: Arc<Mutex<DirectoryTools<D>>>,
}

impl<D> Clone for McpServer<D> {
    fn clone(&self) -> Self {
        Self {
            tools: Arc::clone(&self.tools),
        }
    }
}

/// Outcome of one tool call before it is wrapped for the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolReply {
    /// Pretty-printed JSON document.
    Json(String),
    /// Error text reported to the client as a failed tool call.
    Failure(String),
}

impl ToolReply {
    fn from_result<T: Serialize>(result: crate::Result<T>) -> Self {
        match result {
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(json) => ToolReply::Json(json),
                Err(e) => ToolReply::Failure(format!("Failed to serialize response: {}", e)),
            },
            Err(e) => ToolReply::Failure(e.to_string()),
        }
    }

    fn from_lookup<T: Serialize>(result: crate::Result<Option<T>>, missing: String) -> Self {
        match result {
            Ok(Some(value)) => Self::from_result(Ok(value)),
            Ok(None) => ToolReply::Failure(missing),
            Err(e) => ToolReply::Failure(e.to_string()),
        }
    }
}

impl From<ToolReply> for CallToolResult {
    fn from(reply: ToolReply) -> Self {
        match reply {
            ToolReply::Json(json) => CallToolResult::success(vec![Content::text(json)]),
            ToolReply::Failure(text) => CallToolResult::error(vec![Content::text(text)]),
        }
    }
}

fn schema_for<T: JsonSchema>() -> Arc<serde_json::Map<String, serde_json::Value>> {
    let schema = schemars::schema_for!(T);
    match serde_json::to_value(&schema) {
        Ok(serde_json::Value::Object(map)) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    }
}

fn parse<T: DeserializeOwned>(
    arguments: Option<serde_json::Map<String, serde_json::Value>>,
) -> Result<T, McpError> {
    serde_json::from_value(serde_json::Value::Object(arguments.unwrap_or_default()))
        .map_err(|e| McpError::invalid_params(e.to_string(), None))
}

fn tool<T: JsonSchema>(name: &'static str, title: &str, description: &'static str) -> Tool {
    Tool {
        name: name.into(),
        title: Some(title.to_string()),
        description: Some(description.into()),
        input_schema: schema_for::<T>(),
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    }
}

/// Tool names served by [`McpServer`].
pub const TOOL_NAMES: [&str; 10] = [
    "list_all_users",
    "search_users_by_name",
    "get_user_details",
    "list_active_users",
    "list_locked_users",
    "search_users_by_attribute",
    "list_all_groups",
    "ldap_search",
    "run_monitor",
    "read_config",
];

pub fn tool_definitions() -> Vec<Tool> {
    vec![
        tool::<LimitParams>(
            "list_all_users",
            "List All Users",
            "List user (person) entries under the base DN",
        ),
        tool::<SearchUsersByNameParams>(
            "search_users_by_name",
            "Search Users By Name",
            "Find users whose uid, cn, displayName or mail contains the given text",
        ),
        tool::<GetUserDetailsParams>(
            "get_user_details",
            "Get User Details",
            "Get all attributes and the computed account status of one user by uid",
        ),
        tool::<LimitParams>(
            "list_active_users",
            "List Active Users",
            "List users whose account status is active",
        ),
        tool::<LimitParams>(
            "list_locked_users",
            "List Locked Users",
            "List users whose account status is locked",
        ),
        tool::<SearchUsersByAttributeParams>(
            "search_users_by_attribute",
            "Search Users By Attribute",
            "Find users by the value of an arbitrary attribute",
        ),
        tool::<LimitParams>(
            "list_all_groups",
            "List All Groups",
            "List group entries under the base DN",
        ),
        tool::<LdapSearchParams>(
            "ldap_search",
            "LDAP Search",
            "Run a raw, read-only LDAP search below the base DN",
        ),
        tool::<RunMonitorParams>(
            "run_monitor",
            "Run Monitor",
            "Read server or database backend monitor statistics",
        ),
        tool::<ReadConfigParams>(
            "read_config",
            "Read Config",
            "Read a server configuration entry under cn=config",
        ),
    ]
}

impl<D: Directory + 'static> McpServer<D> {
    pub fn new(tools: DirectoryTools<D>) -> Self {
        Self {
            tools: Arc::new(Mutex::new(tools)),
        }
    }

    /// Run one tool. Malformed arguments and unknown tools are protocol
    /// errors; directory failures are reported in the reply.
    pub async fn execute(
        &self,
        name: &str,
        arguments: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<ToolReply, McpError> {
        tracing::debug!(tool = name, "Tool call");
        let mut tools = self.tools.lock().await;

        let reply = match name {
            "list_all_users" => {
                let params: LimitParams = parse(arguments)?;
                ToolReply::from_result(tools.list_all_users(params.limit).await)
            }
            "search_users_by_name" => {
                let params: SearchUsersByNameParams = parse(arguments)?;
                ToolReply::from_result(
                    tools
                        .search_users_by_name(&params.name, params.limit)
                        .await,
                )
            }
            "get_user_details" => {
                let params: GetUserDetailsParams = parse(arguments)?;
                ToolReply::from_lookup(
                    tools.get_user_details(&params.username).await,
                    format!("User not found: {}", params.username),
                )
            }
            "list_active_users" => {
                let params: LimitParams = parse(arguments)?;
                ToolReply::from_result(tools.list_active_users(params.limit).await)
            }
            "list_locked_users" => {
                let params: LimitParams = parse(arguments)?;
                ToolReply::from_result(tools.list_locked_users(params.limit).await)
            }
            "search_users_by_attribute" => {
                let params: SearchUsersByAttributeParams = parse(arguments)?;
                ToolReply::from_result(
                    tools
                        .search_users_by_attribute(
                            &params.attribute,
                            &params.value,
                            params.partial.unwrap_or(false),
                            params.limit,
                        )
                        .await,
                )
            }
            "list_all_groups" => {
                let params: LimitParams = parse(arguments)?;
                ToolReply::from_result(tools.list_all_groups(params.limit).await)
            }
            "ldap_search" => {
                let params: LdapSearchParams = parse(arguments)?;
                let query = RawSearchQuery {
                    base_dn: params.base_dn,
                    scope: params.scope,
                    filter: params.filter,
                    attributes: params
                        .attributes
                        .map(|a| a.names())
                        .unwrap_or_default(),
                    attrs_only: params.attrs_only.unwrap_or(false),
                    limit: params.limit,
                };
                ToolReply::from_result(tools.raw_search(query).await)
            }
            "run_monitor" => {
                let params: RunMonitorParams = parse(arguments)?;
                ToolReply::from_result(
                    tools
                        .run_monitor(params.backend.as_deref(), params.suffix.as_deref())
                        .await,
                )
            }
            "read_config" => {
                let params: ReadConfigParams = parse(arguments)?;
                let missing = format!(
                    "Configuration entry not found: {}",
                    params.dn.as_deref().unwrap_or("cn=config")
                );
                ToolReply::from_lookup(tools.read_config(params.dn.as_deref()).await, missing)
            }
            _ => {
                return Err(McpError::invalid_params(
                    format!("Unknown tool: {}", name),
                    None,
                ));
            }
        };

        if let ToolReply::Failure(text) = &reply {
            tracing::debug!(tool = name, "Tool call failed: {}", text);
        }
        Ok(reply)
    }
}

impl<D: Directory + 'static> ServerHandler for McpServer<D> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "ldap-mcp".to_string(),
                title: Some("LDAP Directory".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only LDAP directory introspection. \
                 Lists and searches users and groups, reports account status \
                 (active, locked, inactive) and reads server monitor and configuration entries."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            next_cursor: None,
            tools: tool_definitions(),
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.execute(request.name.as_ref(), request.arguments)
            .await
            .map(CallToolResult::from)
    }
}
