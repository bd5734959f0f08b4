pub mod params;
pub mod server;

pub use server::{tool_definitions, McpServer, ToolReply, TOOL_NAMES};
