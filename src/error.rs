use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid LDAP filter syntax in '{filter}': {message}")]
    QuerySyntax { filter: String, message: String },

    #[error("Base DN '{0}' does not exist")]
    NoSuchBase(String),

    #[error("LDAP error {code}: {message}")]
    Directory { code: u32, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MCP error: {0}")]
    Mcp(String),
}

impl DirectoryError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn syntax(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QuerySyntax {
            filter: filter.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
