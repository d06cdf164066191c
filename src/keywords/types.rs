//! `type` and the draft-3 `disallow`.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::compiler::{Compiler, LazyNode};
use crate::draft::Draft;
use crate::error::CompileError;
use crate::resolver::Scope;

use super::{wrong, BoxedValidator, Validate};

/// A primitive type name as it appears in a `type` or `disallow` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Primitive {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
    /// Draft-3 only: matches every instance.
    Any,
}

impl Primitive {
    fn parse(name: &str, draft: Draft) -> Option<Primitive> {
        match name {
            "null" => Some(Primitive::Null),
            "boolean" => Some(Primitive::Boolean),
            "integer" => Some(Primitive::Integer),
            "number" => Some(Primitive::Number),
            "string" => Some(Primitive::String),
            "array" => Some(Primitive::Array),
            "object" => Some(Primitive::Object),
            "any" if draft == Draft::Draft3 => Some(Primitive::Any),
            _ => None,
        }
    }

    pub(crate) fn matches(self, instance: &Value, draft: Draft) -> bool {
        match self {
            Primitive::Null => instance.is_null(),
            Primitive::Boolean => instance.is_boolean(),
            Primitive::Number => instance.is_number(),
            Primitive::String => instance.is_string(),
            Primitive::Array => instance.is_array(),
            Primitive::Object => instance.is_object(),
            Primitive::Any => true,
            Primitive::Integer => match instance {
                Value::Number(n) => {
                    if n.is_i64() || n.is_u64() {
                        true
                    } else {
                        // A whole-valued float: draft 4 alone rejects it.
                        draft.integer_accepts_whole_float()
                            && n.as_f64().is_some_and(|f| f.fract() == 0.0)
                    }
                }
                _ => false,
            },
        }
    }
}

/// One entry of a `type`/`disallow` list. Draft 3 permits inline schemas
/// alongside type names; a schema entry matches only if the instance fully
/// validates against it.
enum TypeCheck {
    Primitive(Primitive),
    Schema(Arc<LazyNode>),
}

impl TypeCheck {
    fn matches(&self, instance: &Value, draft: Draft) -> bool {
        match self {
            TypeCheck::Primitive(p) => p.matches(instance, draft),
            TypeCheck::Schema(node) => node.is_valid(instance),
        }
    }
}

struct TypeValidator {
    draft: Draft,
    checks: Vec<TypeCheck>,
}

impl Validate for TypeValidator {
    fn is_valid(&self, instance: &Value) -> bool {
        self.checks.iter().any(|c| c.matches(instance, self.draft))
    }
}

/// Draft-3 `disallow`: the instance is invalid if it matches any entry.
struct DisallowValidator {
    draft: Draft,
    checks: Vec<TypeCheck>,
}

impl Validate for DisallowValidator {
    fn is_valid(&self, instance: &Value) -> bool {
        !self.checks.iter().any(|c| c.matches(instance, self.draft))
    }
}

pub(super) fn compile(
    map: &Map<String, Value>,
    scope: &Scope,
    ctx: &mut Compiler,
) -> Result<Vec<BoxedValidator>, CompileError> {
    let mut out: Vec<BoxedValidator> = Vec::new();

    if let Some(value) = map.get("type") {
        let checks = compile_checks("type", value, scope, ctx)?;
        out.push(Box::new(TypeValidator {
            draft: ctx.draft,
            checks,
        }));
    }

    if ctx.draft == Draft::Draft3 {
        if let Some(value) = map.get("disallow") {
            let checks = compile_checks("disallow", value, scope, ctx)?;
            out.push(Box::new(DisallowValidator {
                draft: ctx.draft,
                checks,
            }));
        }
    }

    Ok(out)
}

fn compile_checks(
    keyword: &'static str,
    value: &Value,
    scope: &Scope,
    ctx: &mut Compiler,
) -> Result<Vec<TypeCheck>, CompileError> {
    let expected: &'static str = if ctx.draft == Draft::Draft3 {
        "a type name or an array of type names and schemas"
    } else {
        "a type name or an array of type names"
    };
    match value {
        Value::String(name) => Ok(vec![primitive(keyword, name, scope, ctx.draft, expected)?]),
        Value::Array(entries) => {
            let list_scope = scope.descend(keyword);
            entries
                .iter()
                .enumerate()
                .map(|(index, entry)| match entry {
                    Value::String(name) => primitive(keyword, name, scope, ctx.draft, expected),
                    Value::Object(_) if ctx.draft == Draft::Draft3 => {
                        let node = ctx.subschema(&list_scope.descend(&index.to_string()))?;
                        Ok(TypeCheck::Schema(node))
                    }
                    other => Err(wrong(keyword, scope, expected, other)),
                })
                .collect()
        }
        other => Err(wrong(keyword, scope, expected, other)),
    }
}

fn primitive(
    keyword: &'static str,
    name: &str,
    scope: &Scope,
    draft: Draft,
    expected: &'static str,
) -> Result<TypeCheck, CompileError> {
    match Primitive::parse(name, draft) {
        Some(p) => Ok(TypeCheck::Primitive(p)),
        None => Err(CompileError::InvalidKeyword {
            keyword,
            pointer: scope.pointer.clone(),
            expected,
            found: format!("the unknown type name {name:?}"),
        }),
    }
}
