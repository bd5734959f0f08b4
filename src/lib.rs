pub mod config;
pub mod directory;
pub mod error;
pub mod filter;
pub mod mcp;
pub mod normalize;
pub mod status;
pub mod tools;

pub use config::{Overrides, Settings};
pub use directory::{
    clamp_limit, Directory, DirectoryEndpoint, DirectoryEntry, LdapDirectory, Scope,
    SearchRequest, DEFAULT_LIMIT, DEFAULT_SEARCH_LIMIT, MAX_LIMIT,
};
pub use error::{DirectoryError, Result};
pub use filter::{AttributeName, Filter};
pub use mcp::{McpServer, ToolReply};
pub use normalize::{NormalizedAttrs, NormalizedRecord};
pub use status::{AccountStatus, NativeStatus, Resolution, StatusReport};
pub use tools::{DirectoryTools, RawSearchQuery};
