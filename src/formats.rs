//! The format registry.
//!
//! `format` is advisory: a schema may name any format, and names the registry
//! does not know simply pass. The registry is plain data handed to the
//! compiler through `CompileOptions`, not process-global state, so strict and
//! lenient configurations can coexist.

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use url::Url;

/// A single format check over string instances.
pub type FormatCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Name to check lookup for the `format` keyword.
#[derive(Clone)]
pub struct FormatRegistry {
    checks: HashMap<String, FormatCheck>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = FormatRegistry::empty();
        registry.register("date-time", is_date_time);
        registry.register("date", is_date);
        registry.register("time", is_time);
        registry.register("email", is_email);
        registry.register("hostname", is_hostname);
        registry.register("ipv4", is_ipv4);
        registry.register("ipv6", is_ipv6);
        registry.register("uri", is_uri);
        registry.register("uri-reference", is_uri_reference);
        registry.register("uri-template", is_uri_template);
        registry.register("json-pointer", is_json_pointer);
        registry.register("relative-json-pointer", is_relative_json_pointer);
        registry.register("regex", is_regex);
        // Draft-3 spellings.
        registry.register("ip-address", is_ipv4);
        registry.register("host-name", is_hostname);
        registry
    }
}

impl FormatRegistry {
    /// A registry with no checks at all; every format name passes.
    pub fn empty() -> Self {
        FormatRegistry {
            checks: HashMap::new(),
        }
    }

    /// Register or replace a named check.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        check: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) {
        self.checks.insert(name.into(), Arc::new(check));
    }

    pub(crate) fn get(&self, name: &str) -> Option<&FormatCheck> {
        self.checks.get(name)
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.checks.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FormatRegistry")
            .field("formats", &names)
            .finish()
    }
}

fn builtin(pattern: &str) -> Regex {
    Regex::new(pattern).expect("builtin format pattern")
}

fn is_date_time(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
}

fn is_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn is_time(value: &str) -> bool {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        builtin(r"^([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]+)?([Zz]|[+-]([01][0-9]|2[0-3]):[0-5][0-9])$")
    });
    re.is_match(value)
}

/// Deliberately permissive: one `@`, non-empty local part and domain, no
/// whitespace. The registry exists precisely so callers who need the full
/// RFC 5322 grammar can plug one in.
fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !value.contains(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    }
}

fn is_hostname(value: &str) -> bool {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        builtin(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
    });
    value.len() <= 253 && re.is_match(value)
}

fn is_ipv4(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

fn is_ipv6(value: &str) -> bool {
    value.parse::<Ipv6Addr>().is_ok()
}

fn is_uri(value: &str) -> bool {
    Url::parse(value).is_ok()
}

fn is_uri_reference(value: &str) -> bool {
    !value.contains(char::is_whitespace)
        && !value.contains('\\')
        && value.matches('#').count() <= 1
}

fn is_uri_template(value: &str) -> bool {
    let mut depth = 0u32;
    for c in value.chars() {
        match c {
            '{' => {
                if depth > 0 {
                    return false;
                }
                depth = 1;
            }
            '}' => {
                if depth == 0 {
                    return false;
                }
                depth = 0;
            }
            _ if c.is_whitespace() => return false,
            _ => {}
        }
    }
    depth == 0
}

fn is_json_pointer(value: &str) -> bool {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = PATTERN.get_or_init(|| builtin(r"^(/([^/~]|~[01])*)*$"));
    re.is_match(value)
}

fn is_relative_json_pointer(value: &str) -> bool {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = PATTERN.get_or_init(|| builtin(r"^(0|[1-9][0-9]*)(#|(/([^/~]|~[01])*)*)$"));
    re.is_match(value)
}

/// Valid iff the same engine used for `pattern`/`patternProperties` accepts
/// the string as a pattern.
fn is_regex(value: &str) -> bool {
    Regex::new(value).is_ok()
}
