//! LDAP search filter AST.
//!
//! Filters are built as a tree of [`Filter`] nodes and only turned into text
//! through [`std::fmt::Display`], which escapes every assertion value. User
//! supplied fragments never reach the wire by string concatenation.

pub mod builder;
pub mod parser;

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DirectoryError, Result};

pub use parser::parse_filter;

static ATTRIBUTE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]*$").expect("valid attribute pattern"));

/// A validated attribute description (letters, digits and hyphen only).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeName(String);

impl AttributeName {
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if ATTRIBUTE_NAME.is_match(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(DirectoryError::invalid(format!(
                "Attribute name '{}' is not allowed (letters, digits and '-' only)",
                name
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Substring assertion pieces: `initial*any*any*final`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Substrings {
    pub initial: Option<Vec<u8>>,
    pub any: Vec<Vec<u8>>,
    pub last: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Equality(AttributeName, Vec<u8>),
    Substring(AttributeName, Substrings),
    GreaterOrEqual(AttributeName, Vec<u8>),
    LessOrEqual(AttributeName, Vec<u8>),
    Approx(AttributeName, Vec<u8>),
    Present(AttributeName),
}

impl Filter {
    pub fn eq(attribute: &AttributeName, value: &str) -> Self {
        Filter::Equality(attribute.clone(), value.as_bytes().to_vec())
    }

    /// `(attribute=*value*)`
    pub fn contains(attribute: &AttributeName, value: &str) -> Self {
        Filter::Substring(
            attribute.clone(),
            Substrings {
                initial: None,
                any: vec![value.as_bytes().to_vec()],
                last: None,
            },
        )
    }

    pub fn present(attribute: &AttributeName) -> Self {
        Filter::Present(attribute.clone())
    }

    pub fn negate(self) -> Self {
        Filter::Not(Box::new(self))
    }
}

/// Escape a literal for use inside a filter assertion.
///
/// UTF-8 text keeps its characters and only `*`, `(`, `)`, `\` and NUL are
/// hex-escaped. Anything that is not valid UTF-8 is escaped byte by byte.
pub fn escape_value(value: &[u8]) -> String {
    match std::str::from_utf8(value) {
        Ok(text) => ldap3::ldap_escape(text).into_owned(),
        Err(_) => value
            .iter()
            .map(|b| match b {
                b'*' | b'(' | b')' | b'\\' | 0 => format!("\\{:02x}", b),
                0x21..=0x7e => (*b as char).to_string(),
                _ => format!("\\{:02x}", b),
            })
            .collect(),
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::And(items) => {
                f.write_str("(&")?;
                for item in items {
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            Filter::Or(items) => {
                f.write_str("(|")?;
                for item in items {
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            Filter::Not(inner) => write!(f, "(!{})", inner),
            Filter::Equality(attr, value) => write!(f, "({}={})", attr, escape_value(value)),
            Filter::GreaterOrEqual(attr, value) => {
                write!(f, "({}>={})", attr, escape_value(value))
            }
            Filter::LessOrEqual(attr, value) => write!(f, "({}<={})", attr, escape_value(value)),
            Filter::Approx(attr, value) => write!(f, "({}~={})", attr, escape_value(value)),
            Filter::Present(attr) => write!(f, "({}=*)", attr),
            Filter::Substring(attr, parts) => {
                write!(f, "({}=", attr)?;
                if let Some(initial) = &parts.initial {
                    f.write_str(&escape_value(initial))?;
                }
                f.write_str("*")?;
                for any in &parts.any {
                    write!(f, "{}*", escape_value(any))?;
                }
                if let Some(last) = &parts.last {
                    f.write_str(&escape_value(last))?;
                }
                f.write_str(")")
            }
        }
    }
}
