//! Boolean composition: `allOf`/`anyOf`/`oneOf`/`not`, the draft-3
//! `extends`, and the draft-7 conditional.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::compiler::{Compiler, LazyNode};
use crate::draft::Draft;
use crate::error::CompileError;
use crate::resolver::Scope;

use super::{subschema_list, wrong, BoxedValidator, Validate};

struct AllOf {
    schemas: Vec<Arc<LazyNode>>,
}

impl Validate for AllOf {
    fn is_valid(&self, instance: &Value) -> bool {
        self.schemas.iter().all(|schema| schema.is_valid(instance))
    }
}

struct AnyOf {
    schemas: Vec<Arc<LazyNode>>,
}

impl Validate for AnyOf {
    fn is_valid(&self, instance: &Value) -> bool {
        self.schemas.iter().any(|schema| schema.is_valid(instance))
    }
}

/// Exactly one branch must validate.
struct OneOf {
    schemas: Vec<Arc<LazyNode>>,
}

impl Validate for OneOf {
    fn is_valid(&self, instance: &Value) -> bool {
        let mut matches = 0;
        for schema in &self.schemas {
            if schema.is_valid(instance) {
                matches += 1;
                if matches > 1 {
                    return false;
                }
            }
        }
        matches == 1
    }
}

struct Not {
    schema: Arc<LazyNode>,
}

impl Validate for Not {
    fn is_valid(&self, instance: &Value) -> bool {
        !self.schema.is_valid(instance)
    }
}

/// `if`/`then`/`else`: the matching arm applies; a missing arm accepts.
struct Conditional {
    condition: Arc<LazyNode>,
    then: Option<Arc<LazyNode>>,
    otherwise: Option<Arc<LazyNode>>,
}

impl Validate for Conditional {
    fn is_valid(&self, instance: &Value) -> bool {
        let arm = if self.condition.is_valid(instance) {
            &self.then
        } else {
            &self.otherwise
        };
        arm.as_ref().map_or(true, |schema| schema.is_valid(instance))
    }
}

pub(super) fn compile(
    map: &Map<String, Value>,
    scope: &Scope,
    ctx: &mut Compiler,
) -> Result<Vec<BoxedValidator>, CompileError> {
    let mut out: Vec<BoxedValidator> = Vec::new();

    if ctx.draft >= Draft::Draft4 {
        if let Some(value) = map.get("allOf") {
            out.push(Box::new(AllOf {
                schemas: branch_list("allOf", value, scope, ctx)?,
            }));
        }
        if let Some(value) = map.get("anyOf") {
            out.push(Box::new(AnyOf {
                schemas: branch_list("anyOf", value, scope, ctx)?,
            }));
        }
        if let Some(value) = map.get("oneOf") {
            out.push(Box::new(OneOf {
                schemas: branch_list("oneOf", value, scope, ctx)?,
            }));
        }
        if map.contains_key("not") {
            out.push(Box::new(Not {
                schema: ctx.subschema(&scope.descend("not"))?,
            }));
        }
    }

    // Draft-3 `extends` composes like a one-armed (or many-armed) allOf.
    if ctx.draft == Draft::Draft3 {
        match map.get("extends") {
            None => {}
            Some(Value::Object(_)) => out.push(Box::new(AllOf {
                schemas: vec![ctx.subschema(&scope.descend("extends"))?],
            })),
            Some(Value::Array(entries)) => out.push(Box::new(AllOf {
                schemas: subschema_list("extends", scope, entries, ctx)?,
            })),
            Some(other) => {
                return Err(wrong(
                    "extends",
                    scope,
                    "a schema or an array of schemas",
                    other,
                ))
            }
        }
    }

    if ctx.draft >= Draft::Draft7 && map.contains_key("if") {
        let condition = ctx.subschema(&scope.descend("if"))?;
        let then = match map.contains_key("then") {
            true => Some(ctx.subschema(&scope.descend("then"))?),
            false => None,
        };
        let otherwise = match map.contains_key("else") {
            true => Some(ctx.subschema(&scope.descend("else"))?),
            false => None,
        };
        out.push(Box::new(Conditional {
            condition,
            then,
            otherwise,
        }));
    }

    Ok(out)
}

fn branch_list(
    keyword: &'static str,
    value: &Value,
    scope: &Scope,
    ctx: &mut Compiler,
) -> Result<Vec<Arc<LazyNode>>, CompileError> {
    match value {
        Value::Array(entries) => subschema_list(keyword, scope, entries, ctx),
        other => Err(wrong(keyword, scope, "an array of schemas", other)),
    }
}
