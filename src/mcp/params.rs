//! MCP tool parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::split_attribute_list;

// === list_all_users / list_all_groups / list_active_users / list_locked_users ===
/// Parameters for the listing tools
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct LimitParams {
    /// Maximum number of entries to return (default: 50, max: 1000)
    #[serde(default)]
    pub limit: Option<usize>,
}

// === search_users_by_name ===
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchUsersByNameParams {
    /// Text to look for in uid, cn, displayName or mail (case-insensitive substring)
    pub name: String,
    /// Maximum number of entries to return (default: 50)
    #[serde(default)]
    pub limit: Option<usize>,
}

// === get_user_details ===
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetUserDetailsParams {
    /// The user's uid
    pub username: String,
}

// === search_users_by_attribute ===
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchUsersByAttributeParams {
    /// Attribute name (letters, digits and '-')
    pub attribute: String,
    /// Value to match
    pub value: String,
    /// Match the value as a substring instead of exactly (default: false)
    #[serde(default)]
    pub partial: Option<bool>,
    /// Maximum number of entries to return (default: 50)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Attribute selection given either as "uid,cn,mail" or as a list
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AttributeSelection {
    List(Vec<String>),
    Csv(String),
}

impl AttributeSelection {
    pub fn names(&self) -> Vec<String> {
        match self {
            AttributeSelection::List(names) => names
                .iter()
                .flat_map(|name| split_attribute_list(name))
                .collect(),
            AttributeSelection::Csv(list) => split_attribute_list(list),
        }
    }
}

// === ldap_search ===
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct LdapSearchParams {
    /// Search base; must be the configured base DN or below it (default: configured base DN)
    #[serde(default)]
    pub base_dn: Option<String>,
    /// BASE, ONELEVEL or SUBTREE (default: SUBTREE)
    #[serde(default)]
    pub scope: Option<String>,
    /// LDAP filter (default: "(objectClass=*)")
    #[serde(default)]
    pub filter: Option<String>,
    /// Attributes to return (default: all user attributes)
    #[serde(default)]
    pub attributes: Option<AttributeSelection>,
    /// Return attribute names only, without values (default: false)
    #[serde(default)]
    pub attrs_only: Option<bool>,
    /// Maximum number of entries to return (default: 100, max: 1000)
    #[serde(default)]
    pub limit: Option<usize>,
}

// === run_monitor ===
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct RunMonitorParams {
    /// Database backend name, e.g. "userroot"
    #[serde(default)]
    pub backend: Option<String>,
    /// Suffix served by the backend, e.g. "dc=example,dc=com"
    #[serde(default)]
    pub suffix: Option<String>,
}

// === read_config ===
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReadConfigParams {
    /// DN of the configuration entry (default: "cn=config")
    #[serde(default)]
    pub dn: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_selection_forms() {
        let csv: LdapSearchParams =
            serde_json::from_value(json!({"attributes": "uid,cn,mail"})).unwrap();
        assert_eq!(csv.attributes.unwrap().names(), vec!["uid", "cn", "mail"]);

        let list: LdapSearchParams =
            serde_json::from_value(json!({"attributes": ["uid", "cn"]})).unwrap();
        assert_eq!(list.attributes.unwrap().names(), vec!["uid", "cn"]);
    }

    #[test]
    fn test_missing_required_field() {
        let result: Result<SearchUsersByNameParams, _> =
            serde_json::from_value(json!({"limit": 5}));
        assert!(result.is_err());
    }
}
