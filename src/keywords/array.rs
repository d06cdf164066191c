//! Array keywords: `items`/`additionalItems`, size bounds, `uniqueItems`,
//! and the draft-6 `contains`.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::compiler::{Compiler, LazyNode};
use crate::draft::Draft;
use crate::equality::json_eq;
use crate::error::CompileError;
use crate::resolver::Scope;

use super::{limit, subschema_list, wrong, Additional, BoxedValidator, Validate};

/// `items` as a single schema: every element must validate.
struct ItemsSchema {
    schema: Arc<LazyNode>,
}

impl Validate for ItemsSchema {
    fn is_valid(&self, instance: &Value) -> bool {
        match instance.as_array() {
            Some(items) => items.iter().all(|item| self.schema.is_valid(item)),
            None => true,
        }
    }
}

/// `items` as an array: positional ("tuple") validation, with
/// `additionalItems` governing elements past the tuple.
struct ItemsTuple {
    schemas: Vec<Arc<LazyNode>>,
    additional: Additional,
}

impl Validate for ItemsTuple {
    fn is_valid(&self, instance: &Value) -> bool {
        let Some(items) = instance.as_array() else {
            return true;
        };
        for (index, item) in items.iter().enumerate() {
            let valid = match self.schemas.get(index) {
                Some(schema) => schema.is_valid(item),
                None => self.additional.allows(item),
            };
            if !valid {
                return false;
            }
        }
        true
    }
}

struct MinItems {
    limit: u64,
}

impl Validate for MinItems {
    fn is_valid(&self, instance: &Value) -> bool {
        instance
            .as_array()
            .map_or(true, |items| items.len() as u64 >= self.limit)
    }
}

struct MaxItems {
    limit: u64,
}

impl Validate for MaxItems {
    fn is_valid(&self, instance: &Value) -> bool {
        instance
            .as_array()
            .map_or(true, |items| items.len() as u64 <= self.limit)
    }
}

/// Pairwise deep equality; `[1, 1.0]` holds duplicates, `[1, true]` does not.
struct UniqueItems;

impl Validate for UniqueItems {
    fn is_valid(&self, instance: &Value) -> bool {
        let Some(items) = instance.as_array() else {
            return true;
        };
        for (index, item) in items.iter().enumerate() {
            if items[..index].iter().any(|earlier| json_eq(earlier, item)) {
                return false;
            }
        }
        true
    }
}

/// At least one element validates. The empty array never contains anything.
struct Contains {
    schema: Arc<LazyNode>,
}

impl Validate for Contains {
    fn is_valid(&self, instance: &Value) -> bool {
        match instance.as_array() {
            Some(items) => items.iter().any(|item| self.schema.is_valid(item)),
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

    match map.get("items") {
        None => {}
        Some(Value::Array(entries)) => {
            let schemas = subschema_list("items", scope, entries, ctx)?;
            let additional =
                Additional::compile(map.get("additionalItems"), scope, "additionalItems", ctx)?;
            out.push(Box::new(ItemsTuple { schemas, additional }));
        }
        Some(Value::Object(_)) => {
            out.push(Box::new(ItemsSchema {
                schema: ctx.subschema(&scope.descend("items"))?,
            }));
        }
        Some(Value::Bool(_)) if ctx.draft.boolean_schemas() => {
            out.push(Box::new(ItemsSchema {
                schema: ctx.subschema(&scope.descend("items"))?,
            }));
        }
        Some(other) => {
            return Err(wrong("items", scope, "a schema or an array of schemas", other))
        }
    }

    if let Some(value) = map.get("minItems") {
        out.push(Box::new(MinItems {
            limit: limit("minItems", scope, value)?,
        }));
    }
    if let Some(value) = map.get("maxItems") {
        out.push(Box::new(MaxItems {
            limit: limit("maxItems", scope, value)?,
        }));
    }

    match map.get("uniqueItems") {
        None | Some(Value::Bool(false)) => {}
        Some(Value::Bool(true)) => out.push(Box::new(UniqueItems)),
        Some(other) => return Err(wrong("uniqueItems", scope, "a boolean", other)),
    }

    if ctx.draft >= Draft::Draft6 && map.contains_key("contains") {
        out.push(Box::new(Contains {
            schema: ctx.subschema(&scope.descend("contains"))?,
        }));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unique_items_uses_mathematical_number_equality() {
        let v = UniqueItems;
        assert!(!v.is_valid(&json!([1, 1.0])));
        assert!(v.is_valid(&json!([1, true])));
        assert!(v.is_valid(&json!([0, false, "0"])));
        assert!(!v.is_valid(&json!([{"a": 1}, {"a": 1.0}])));
        assert!(v.is_valid(&json!([[1, 2], [2, 1]])));
    }

    #[test]
    fn size_bounds_ignore_non_arrays() {
        let v = MinItems { limit: 3 };
        assert!(v.is_valid(&json!("ab")));
        assert!(v.is_valid(&json!({})));
        assert!(!v.is_valid(&json!([1])));
        let v = MaxItems { limit: 1 };
        assert!(!v.is_valid(&json!([1, 2])));
        assert!(v.is_valid(&json!(12)));
    }
}
