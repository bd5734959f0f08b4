//! Fixed intent filters and filters built from user-supplied fragments.

use super::{AttributeName, Filter};
use crate::error::{DirectoryError, Result};

/// Attributes searched by [`by_name`].
pub const NAME_ATTRIBUTES: [&str; 4] = ["uid", "cn", "displayName", "mail"];

/// Group object classes recognised by [`all_groups`].
pub const GROUP_CLASSES: [&str; 4] = ["groupOfNames", "groupOfUniqueNames", "posixGroup", "group"];

pub const LOCK_ATTRIBUTE: &str = "nsAccountLock";

fn known(name: &str) -> AttributeName {
    AttributeName(name.to_string())
}

fn object_class(class: &str) -> Filter {
    Filter::eq(&known("objectClass"), class)
}

fn person() -> Filter {
    object_class("person")
}

fn locked_predicate() -> Filter {
    Filter::eq(&known(LOCK_ATTRIBUTE), "true")
}

pub fn all_users() -> Filter {
    person()
}

pub fn all_groups() -> Filter {
    Filter::Or(GROUP_CLASSES.iter().map(|class| object_class(class)).collect())
}

/// Case-insensitive substring match of `name` across the naming attributes.
pub fn by_name(name: &str) -> Result<Filter> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DirectoryError::invalid("Search name must not be empty"));
    }

    let alternatives = NAME_ATTRIBUTES
        .iter()
        .map(|attr| Filter::contains(&known(attr), name))
        .collect();

    Ok(Filter::And(vec![person(), Filter::Or(alternatives)]))
}

/// Exact user lookup on `uid`.
pub fn by_uid(username: &str) -> Result<Filter> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DirectoryError::invalid("Username must not be empty"));
    }
    Ok(Filter::And(vec![person(), Filter::eq(&known("uid"), username)]))
}

/// Equality (or substring when `partial`) match on an arbitrary attribute.
pub fn by_attribute(attribute: &str, value: &str, partial: bool) -> Result<Filter> {
    let attribute = AttributeName::parse(attribute)?;
    if value.is_empty() {
        return Err(DirectoryError::invalid("Attribute value must not be empty"));
    }

    let predicate = if partial {
        Filter::contains(&attribute, value)
    } else {
        Filter::eq(&attribute, value)
    };
    Ok(Filter::And(vec![person(), predicate]))
}

/// Candidate set for locked accounts. Approximate: final classification is
/// done by the status resolver.
pub fn locked() -> Filter {
    Filter::And(vec![person(), locked_predicate()])
}

/// Candidate set for active accounts. Approximate, see [`locked`].
pub fn active() -> Filter {
    Filter::And(vec![person(), locked_predicate().negate()])
}

/// Match any entry. Used for BASE reads of a known DN.
pub fn any_object() -> Filter {
    Filter::present(&known("objectClass"))
}
