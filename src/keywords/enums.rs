//! `enum` and `const` membership tests.

use serde_json::{Map, Value};

use crate::compiler::Compiler;
use crate::draft::Draft;
use crate::equality::json_eq;
use crate::error::CompileError;
use crate::resolver::Scope;

use super::{wrong, BoxedValidator, Validate};

struct EnumValidator {
    values: Vec<Value>,
}

impl Validate for EnumValidator {
    fn is_valid(&self, instance: &Value) -> bool {
        self.values.iter().any(|v| json_eq(v, instance))
    }
}

struct ConstValidator {
    value: Value,
}

impl Validate for ConstValidator {
    fn is_valid(&self, instance: &Value) -> bool {
        json_eq(&self.value, instance)
    }
}

pub(super) fn compile(
    map: &Map<String, Value>,
    scope: &Scope,
    ctx: &mut Compiler,
) -> Result<Vec<BoxedValidator>, CompileError> {
    let mut out: Vec<BoxedValidator> = Vec::new();

    if let Some(value) = map.get("enum") {
        match value {
            Value::Array(values) => out.push(Box::new(EnumValidator {
                values: values.clone(),
            })),
            other => return Err(wrong("enum", scope, "an array of values", other)),
        }
    }

    if ctx.draft >= Draft::Draft6 {
        if let Some(value) = map.get("const") {
            out.push(Box::new(ConstValidator {
                value: value.clone(),
            }));
        }
    }

    Ok(out)
}
