//! # Format Attributes
//!
//! The `format` keyword delegates to a [`FormatAttribute`] looked up by
//! name in the dialect's [`FormatRegistry`]. An attribute declares which
//! instance types it applies to; other types, and unknown format names,
//! pass silently.
//!
//! ## Built-in attributes
//!
//! | Name                       | Types   | Check                                |
//! |----------------------------|---------|--------------------------------------|
//! | `date-time`                | string  | RFC 3339 (chrono)                    |
//! | `date`                     | string  | `YYYY-MM-DD`                         |
//! | `time`                     | string  | `hh:mm:ss` (draft-3)                 |
//! | `email`                    | string  | `local@hostname`                     |
//! | `hostname` / `host-name`   | string  | RFC 1034 labels                      |
//! | `ipv4` / `ip-address`      | string  | dotted quad                          |
//! | `ipv6`                     | string  | RFC 4291 text form                   |
//! | `uri`                      | string  | absolute URI (url)                   |
//! | `regex`                    | string  | ECMA-262 (regress)                   |
//! | `utc-millisec`             | numeric | non-negative (draft-3)               |

use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime};
use jsv_core::{NodeType, TypeSet};
use serde_json::Value;
use url::Url;

/// A named format check.
pub trait FormatAttribute: Send + Sync + fmt::Debug {
    /// Instance types this attribute applies to.
    fn types(&self) -> TypeSet;

    /// Messages describing why `value` does not conform; empty if it does.
    fn check(&self, value: &Value) -> Vec<String>;
}

/// A format attribute backed by a plain predicate.
#[derive(Clone, Copy)]
pub struct PredicateFormat {
    name: &'static str,
    types: TypeSet,
    predicate: fn(&Value) -> bool,
}

impl PredicateFormat {
    /// An attribute that fails with a standard message when `predicate`
    /// returns false.
    pub const fn new(name: &'static str, types: TypeSet, predicate: fn(&Value) -> bool) -> Self {
        Self {
            name,
            types,
            predicate,
        }
    }
}

impl fmt::Debug for PredicateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateFormat").field("name", &self.name).finish()
    }
}

impl FormatAttribute for PredicateFormat {
    fn types(&self) -> TypeSet {
        self.types
    }

    fn check(&self, value: &Value) -> Vec<String> {
        if (self.predicate)(value) {
            Vec::new()
        } else {
            vec![format!("{value} is not a valid \"{}\"", self.name)]
        }
    }
}

const STRING: TypeSet = TypeSet::of(&[NodeType::String]);

/// Format attributes by name.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    attributes: HashMap<String, Arc<dyn FormatAttribute>>,
}

impl FormatRegistry {
    /// A registry with no attributes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The draft-3 attribute set.
    pub fn draft3() -> Self {
        Self::empty()
            .with_predicate("date-time", STRING, is_date_time)
            .with_predicate("date", STRING, is_date)
            .with_predicate("time", STRING, is_time)
            .with_predicate("email", STRING, is_email)
            .with_predicate("host-name", STRING, is_hostname)
            .with_predicate("ip-address", STRING, is_ipv4)
            .with_predicate("ipv6", STRING, is_ipv6)
            .with_predicate("uri", STRING, is_uri)
            .with_predicate("regex", STRING, is_regex)
            .with_predicate("utc-millisec", TypeSet::NUMERIC, is_utc_millisec)
    }

    /// The draft-4 attribute set.
    pub fn draft4() -> Self {
        Self::empty()
            .with_predicate("date-time", STRING, is_date_time)
            .with_predicate("email", STRING, is_email)
            .with_predicate("hostname", STRING, is_hostname)
            .with_predicate("ipv4", STRING, is_ipv4)
            .with_predicate("ipv6", STRING, is_ipv6)
            .with_predicate("uri", STRING, is_uri)
            .with_predicate("regex", STRING, is_regex)
    }

    /// Add or replace an attribute.
    pub fn with(mut self, name: &str, attribute: Arc<dyn FormatAttribute>) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    fn with_predicate(self, name: &'static str, types: TypeSet, predicate: fn(&Value) -> bool) -> Self {
        self.with(name, Arc::new(PredicateFormat::new(name, types, predicate)))
    }

    /// Look an attribute up by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn FormatAttribute>> {
        self.attributes.get(name)
    }

    /// Names of all attributes, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn with_str(value: &Value, f: impl FnOnce(&str) -> bool) -> bool {
    value.as_str().map_or(true, f)
}

fn is_date_time(value: &Value) -> bool {
    with_str(value, |s| DateTime::parse_from_rfc3339(s).is_ok())
}

fn is_date(value: &Value) -> bool {
    with_str(value, |s| s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
}

fn is_time(value: &Value) -> bool {
    with_str(value, |s| s.len() == 8 && NaiveTime::parse_from_str(s, "%H:%M:%S").is_ok())
}

fn is_hostname_str(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    !s.is_empty()
        && s.len() <= 253
        && s.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

fn is_hostname(value: &Value) -> bool {
    with_str(value, is_hostname_str)
}

fn is_email(value: &Value) -> bool {
    with_str(value, |s| match s.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && local.len() <= 64
                && !local.contains(['@', ' ', '\t', '\n'])
                && is_hostname_str(domain)
        }
        None => false,
    })
}

fn is_ipv4(value: &Value) -> bool {
    with_str(value, |s| s.parse::<Ipv4Addr>().is_ok())
}

fn is_ipv6(value: &Value) -> bool {
    with_str(value, |s| s.parse::<Ipv6Addr>().is_ok())
}

fn is_uri(value: &Value) -> bool {
    with_str(value, |s| Url::parse(s).is_ok())
}

fn is_regex(value: &Value) -> bool {
    with_str(value, |s| regress::Regex::new(s).is_ok())
}

fn is_utc_millisec(value: &Value) -> bool {
    match value {
        Value::Number(n) => !n.to_string().starts_with('-'),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(registry: &FormatRegistry, name: &str, value: Value) -> bool {
        registry.get(name).unwrap().check(&value).is_empty()
    }

    #[test]
    fn test_date_time() {
        let r = FormatRegistry::draft4();
        assert!(check(&r, "date-time", json!("2024-02-29T12:30:00Z")));
        assert!(check(&r, "date-time", json!("2024-02-29T12:30:00.5+02:00")));
        assert!(!check(&r, "date-time", json!("2023-02-29T12:30:00Z")));
        assert!(!check(&r, "date-time", json!("2024-02-29 12:30")));
    }

    #[test]
    fn test_draft3_date_and_time() {
        let r = FormatRegistry::draft3();
        assert!(check(&r, "date", json!("2024-01-31")));
        assert!(!check(&r, "date", json!("2024-1-31")));
        assert!(check(&r, "time", json!("23:59:59")));
        assert!(!check(&r, "time", json!("24:00:00")));
    }

    #[test]
    fn test_hostname_and_email() {
        let r = FormatRegistry::draft4();
        assert!(check(&r, "hostname", json!("www.example.com")));
        assert!(!check(&r, "hostname", json!("-bad.example.com")));
        assert!(!check(&r, "hostname", json!("a..b")));
        assert!(!check(&r, "hostname", json!("a".repeat(64))));
        assert!(check(&r, "email", json!("joe.bloggs@example.com")));
        assert!(!check(&r, "email", json!("no-at-sign")));
        assert!(!check(&r, "email", json!("@example.com")));
    }

    #[test]
    fn test_ip_addresses() {
        let r = FormatRegistry::draft4();
        assert!(check(&r, "ipv4", json!("192.168.0.1")));
        assert!(!check(&r, "ipv4", json!("256.1.1.1")));
        assert!(check(&r, "ipv6", json!("::1")));
        assert!(!check(&r, "ipv6", json!("12345::")));
    }

    #[test]
    fn test_uri_and_regex() {
        let r = FormatRegistry::draft4();
        assert!(check(&r, "uri", json!("http://example.com/a?b#c")));
        assert!(!check(&r, "uri", json!("not a uri")));
        assert!(check(&r, "regex", json!("^[a-z]+$")));
        assert!(!check(&r, "regex", json!("(unclosed")));
    }

    #[test]
    fn test_utc_millisec_is_numeric_only() {
        let r = FormatRegistry::draft3();
        let attr = r.get("utc-millisec").unwrap();
        assert!(attr.types().contains(NodeType::Integer));
        assert!(!attr.types().contains(NodeType::String));
        assert!(check(&r, "utc-millisec", json!(1_700_000_000_000u64)));
        assert!(!check(&r, "utc-millisec", json!(-1)));
    }

    #[test]
    fn test_draft_name_sets_differ() {
        assert!(FormatRegistry::draft3().get("host-name").is_some());
        assert!(FormatRegistry::draft3().get("hostname").is_none());
        assert!(FormatRegistry::draft4().get("hostname").is_some());
        assert!(FormatRegistry::draft4().get("utc-millisec").is_none());
    }

    #[test]
    fn test_failure_message_names_format() {
        let r = FormatRegistry::draft4();
        let messages = r.get("ipv4").unwrap().check(&json!("nope"));
        assert_eq!(messages, vec![r#""nope" is not a valid "ipv4""#.to_string()]);
    }
}
