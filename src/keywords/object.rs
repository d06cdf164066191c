//! Object keywords.
//!
//! `properties`, `patternProperties`, and `additionalProperties` compile as
//! one fragment because they share the "matched name" computation: a
//! property name matched by `properties` or by any pattern is exempt from
//! `additionalProperties`, which governs only the remaining names.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};

use crate::compiler::{Compiler, LazyNode};
use crate::draft::Draft;
use crate::error::CompileError;
use crate::resolver::Scope;

use super::string::compile_pattern;
use super::{limit, wrong, Additional, BoxedValidator, Validate};

struct PropertiesValidator {
    properties: HashMap<String, Arc<LazyNode>>,
    patterns: Vec<(Regex, Arc<LazyNode>)>,
    additional: Additional,
}

impl Validate for PropertiesValidator {
    fn is_valid(&self, instance: &Value) -> bool {
        let Some(object) = instance.as_object() else {
            return true;
        };
        for (name, value) in object {
            let mut matched = false;
            if let Some(schema) = self.properties.get(name) {
                matched = true;
                if !schema.is_valid(value) {
                    return false;
                }
            }
            for (pattern, schema) in &self.patterns {
                if pattern.is_match(name) {
                    matched = true;
                    if !schema.is_valid(value) {
                        return false;
                    }
                }
            }
            if !matched && !self.additional.allows(value) {
                return false;
            }
        }
        true
    }
}

struct Required {
    names: Vec<String>,
}

impl Validate for Required {
    fn is_valid(&self, instance: &Value) -> bool {
        match instance.as_object() {
            Some(object) => self.names.iter().all(|name| object.contains_key(name)),
            None => true,
        }
    }
}

struct MinProperties {
    limit: u64,
}

impl Validate for MinProperties {
    fn is_valid(&self, instance: &Value) -> bool {
        instance
            .as_object()
            .map_or(true, |object| object.len() as u64 >= self.limit)
    }
}

struct MaxProperties {
    limit: u64,
}

impl Validate for MaxProperties {
    fn is_valid(&self, instance: &Value) -> bool {
        instance
            .as_object()
            .map_or(true, |object| object.len() as u64 <= self.limit)
    }
}

enum Dependency {
    /// The trigger property demands these siblings.
    Keys(Vec<String>),
    /// The trigger property applies this schema to the whole object.
    Schema(Arc<LazyNode>),
}

struct Dependencies {
    entries: Vec<(String, Dependency)>,
}

impl Validate for Dependencies {
    fn is_valid(&self, instance: &Value) -> bool {
        let Some(object) = instance.as_object() else {
            return true;
        };
        for (trigger, dependency) in &self.entries {
            if !object.contains_key(trigger) {
                continue;
            }
            let satisfied = match dependency {
                Dependency::Keys(names) => names.iter().all(|n| object.contains_key(n)),
                Dependency::Schema(schema) => schema.is_valid(instance),
            };
            if !satisfied {
                return false;
            }
        }
        true
    }
}

/// Draft-6 `propertyNames`: every key, viewed as a string instance, must
/// validate.
struct PropertyNames {
    schema: Arc<LazyNode>,
}

impl Validate for PropertyNames {
    fn is_valid(&self, instance: &Value) -> bool {
        match instance.as_object() {
            Some(object) => object
                .keys()
                .all(|name| self.schema.is_valid(&Value::String(name.clone()))),
            None => true,
        }
    }
}

pub(super) fn compile(
    map: &Map<String, Value>,
    scope: &Scope,
    ctx: &mut Compiler,
) -> Result<Vec<BoxedValidator>, CompileError> {
    let mut out: Vec<BoxedValidator> = Vec::new();

    out.extend(compile_properties(map, scope, ctx)?);

    if ctx.draft == Draft::Draft3 {
        // Draft 3 writes requiredness inside each property schema.
        out.extend(embedded_required(map));
    } else if let Some(value) = map.get("required") {
        let Value::Array(entries) = value else {
            return Err(wrong("required", scope, "an array of property names", value));
        };
        let names = entries
            .iter()
            .map(|entry| match entry {
                Value::String(name) => Ok(name.clone()),
                other => Err(wrong("required", scope, "an array of property names", other)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        out.push(Box::new(Required { names }));
    }

    if ctx.draft >= Draft::Draft4 {
        if let Some(value) = map.get("minProperties") {
            out.push(Box::new(MinProperties {
                limit: limit("minProperties", scope, value)?,
            }));
        }
        if let Some(value) = map.get("maxProperties") {
            out.push(Box::new(MaxProperties {
                limit: limit("maxProperties", scope, value)?,
            }));
        }
    }

    if let Some(value) = map.get("dependencies") {
        out.push(compile_dependencies(value, scope, ctx)?);
    }

    if ctx.draft >= Draft::Draft6 && map.contains_key("propertyNames") {
        out.push(Box::new(PropertyNames {
            schema: ctx.subschema(&scope.descend("propertyNames"))?,
        }));
    }

    Ok(out)
}

fn compile_properties(
    map: &Map<String, Value>,
    scope: &Scope,
    ctx: &mut Compiler,
) -> Result<Option<BoxedValidator>, CompileError> {
    let named = map.get("properties");
    let patterned = map.get("patternProperties");
    let additional = map.get("additionalProperties");
    if named.is_none() && patterned.is_none() && additional.is_none() {
        return Ok(None);
    }

    let mut properties = HashMap::new();
    if let Some(value) = named {
        let Value::Object(entries) = value else {
            return Err(wrong("properties", scope, "an object of schemas", value));
        };
        let base = scope.descend("properties");
        for name in entries.keys() {
            properties.insert(name.clone(), ctx.subschema(&base.descend(name))?);
        }
    }

    let mut patterns = Vec::new();
    if let Some(value) = patterned {
        let Value::Object(entries) = value else {
            return Err(wrong(
                "patternProperties",
                scope,
                "an object of schemas",
                value,
            ));
        };
        let base = scope.descend("patternProperties");
        for pattern in entries.keys() {
            let regex = compile_pattern(pattern, &base)?;
            patterns.push((regex, ctx.subschema(&base.descend(pattern))?));
        }
    }

    let additional = Additional::compile(additional, scope, "additionalProperties", ctx)?;

    Ok(Some(Box::new(PropertiesValidator {
        properties,
        patterns,
        additional,
    })))
}

/// Collect draft-3 `"required": true` flags from property subschemas.
fn embedded_required(map: &Map<String, Value>) -> Option<BoxedValidator> {
    let properties = map.get("properties")?.as_object()?;
    let names: Vec<String> = properties
        .iter()
        .filter(|(_, schema)| schema.get("required") == Some(&Value::Bool(true)))
        .map(|(name, _)| name.clone())
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(Box::new(Required { names }))
    }
}

fn compile_dependencies(
    value: &Value,
    scope: &Scope,
    ctx: &mut Compiler,
) -> Result<BoxedValidator, CompileError> {
    let Value::Object(map) = value else {
        return Err(wrong("dependencies", scope, "an object", value));
    };
    let base = scope.descend("dependencies");
    let mut entries = Vec::new();
    for (trigger, dependency) in map {
        let compiled = match dependency {
            // Draft-3 shorthand: a single property name.
            Value::String(name) if ctx.draft == Draft::Draft3 => {
                Dependency::Keys(vec![name.clone()])
            }
            Value::Array(names) => {
                let names = names
                    .iter()
                    .map(|entry| match entry {
                        Value::String(name) => Ok(name.clone()),
                        other => Err(wrong(
                            "dependencies",
                            scope,
                            "an array of property names",
                            other,
                        )),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Dependency::Keys(names)
            }
            Value::Object(_) => Dependency::Schema(ctx.subschema(&base.descend(trigger))?),
            Value::Bool(_) if ctx.draft.boolean_schemas() => {
                Dependency::Schema(ctx.subschema(&base.descend(trigger))?)
            }
            other => {
                return Err(wrong(
                    "dependencies",
                    scope,
                    "a schema or an array of property names",
                    other,
                ))
            }
        };
        entries.push((trigger.clone(), compiled));
    }
    Ok(Box::new(Dependencies { entries }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_ignores_non_objects() {
        let v = Required {
            names: vec!["a".into()],
        };
        assert!(v.is_valid(&json!("a")));
        assert!(v.is_valid(&json!([1])));
        assert!(!v.is_valid(&json!({"b": 1})));
        assert!(v.is_valid(&json!({"a": null})));
    }

    #[test]
    fn property_count_bounds() {
        let v = MinProperties { limit: 2 };
        assert!(!v.is_valid(&json!({"a": 1})));
        assert!(v.is_valid(&json!({"a": 1, "b": 2})));
        assert!(v.is_valid(&json!([1])));
        let v = MaxProperties { limit: 1 };
        assert!(!v.is_valid(&json!({"a": 1, "b": 2})));
    }

    #[test]
    fn key_dependencies() {
        let v = Dependencies {
            entries: vec![("bar".into(), Dependency::Keys(vec!["foo".into()]))],
        };
        assert!(v.is_valid(&json!({"foo": 1, "bar": 2})));
        assert!(v.is_valid(&json!({"foo": 1})));
        assert!(!v.is_valid(&json!({"bar": 2})));
        assert!(v.is_valid(&json!(["bar"])));
    }
}
