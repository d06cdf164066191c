//! The `format` keyword: advisory, registry-driven.

use serde_json::{Map, Value};

use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::formats::FormatCheck;
use crate::resolver::Scope;

use super::{wrong, BoxedValidator, Validate};

struct Format {
    check: FormatCheck,
}

impl Validate for Format {
    fn is_valid(&self, instance: &Value) -> bool {
        match instance.as_str() {
            Some(s) => (self.check)(s),
            None => true,
        }
    }
}

pub(super) fn compile(
    map: &Map<String, Value>,
    scope: &Scope,
    ctx: &mut Compiler,
) -> Result<Vec<BoxedValidator>, CompileError> {
    let Some(value) = map.get("format") else {
        return Ok(Vec::new());
    };
    let Value::String(name) = value else {
        return Err(wrong("format", scope, "a string", value));
    };
    // A name the registry does not know is a no-op pass, never an error.
    Ok(match ctx.formats().get(name) {
        Some(check) => vec![Box::new(Format {
            check: check.clone(),
        }) as BoxedValidator],
        None => Vec::new(),
    })
}
