//! Minimal DN handling: enough to compare DNs and check subtree containment.

/// Split a DN into normalized RDNs (trimmed, lowercased), honouring `\,`.
pub fn rdns(dn: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for ch in dn.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            current.push(ch);
            escaped = true;
        } else if ch == ',' {
            parts.push(normalize_rdn(&current));
            current.clear();
        } else {
            current.push(ch);
        }
    }
    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(normalize_rdn(&current));
    }
    parts
}

fn normalize_rdn(rdn: &str) -> String {
    match rdn.split_once('=') {
        Some((attr, value)) => format!(
            "{}={}",
            attr.trim().to_lowercase(),
            value.trim().to_lowercase()
        ),
        None => rdn.trim().to_lowercase(),
    }
}

/// True when `dn` equals `base` or lies beneath it.
pub fn is_within(dn: &str, base: &str) -> bool {
    let dn = rdns(dn);
    let base = rdns(base);
    if base.is_empty() {
        return true;
    }
    dn.len() >= base.len() && dn[dn.len() - base.len()..] == base[..]
}

pub fn same_dn(a: &str, b: &str) -> bool {
    rdns(a) == rdns(b)
}
