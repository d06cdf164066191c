//! String length and pattern keywords.
//!
//! Lengths count Unicode code points, not UTF-16 units or bytes: a string of
//! two supplementary-plane characters has length 2. Patterns are unanchored
//! and case-sensitive.

use regex::Regex;
use serde_json::{Map, Value};

use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::resolver::Scope;

use super::{limit, wrong, BoxedValidator, Validate};

struct MinLength {
    limit: u64,
}

impl Validate for MinLength {
    fn is_valid(&self, instance: &Value) -> bool {
        match instance.as_str() {
            Some(s) => s.chars().count() as u64 >= self.limit,
            None => true,
        }
    }
}

struct MaxLength {
    limit: u64,
}

impl Validate for MaxLength {
    fn is_valid(&self, instance: &Value) -> bool {
        match instance.as_str() {
            Some(s) => s.chars().count() as u64 <= self.limit,
            None => true,
        }
    }
}

struct Pattern {
    regex: Regex,
}

impl Validate for Pattern {
    fn is_valid(&self, instance: &Value) -> bool {
        match instance.as_str() {
            Some(s) => self.regex.is_match(s),
            None => true,
        }
    }
}

pub(super) fn compile(
    map: &Map<String, Value>,
    scope: &Scope,
    _ctx: &mut Compiler,
) -> Result<Vec<BoxedValidator>, CompileError> {
    let mut out: Vec<BoxedValidator> = Vec::new();

    if let Some(value) = map.get("minLength") {
        out.push(Box::new(MinLength {
            limit: limit("minLength", scope, value)?,
        }));
    }
    if let Some(value) = map.get("maxLength") {
        out.push(Box::new(MaxLength {
            limit: limit("maxLength", scope, value)?,
        }));
    }
    if let Some(value) = map.get("pattern") {
        let Value::String(pattern) = value else {
            return Err(wrong("pattern", scope, "a string", value));
        };
        let regex = compile_pattern(pattern, scope)?;
        out.push(Box::new(Pattern { regex }));
    }

    Ok(out)
}

/// Shared with `patternProperties`; an unparseable pattern fails the build.
pub(crate) fn compile_pattern(pattern: &str, scope: &Scope) -> Result<Regex, CompileError> {
    Regex::new(pattern).map_err(|source| CompileError::InvalidPattern {
        pattern: pattern.to_string(),
        pointer: scope.pointer.clone(),
        source: Box::new(source),
    })
}
