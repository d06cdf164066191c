//! The keyword compiler set.
//!
//! Each family module compiles the keywords it owns into predicate
//! fragments; a schema is valid iff every fragment accepts the instance.
//! Keywords a draft does not define, and keywords this crate does not know,
//! are skipped (forward compatibility); a known keyword with a wrong-shaped
//! value is a compile error.
//!
//! Every fragment is applicability-checked: a keyword whose instance type
//! does not match (say `minLength` against a number) accepts, it does not
//! fail.

pub(crate) mod array;
pub(crate) mod enums;
pub(crate) mod format;
pub(crate) mod logic;
pub(crate) mod numeric;
pub(crate) mod object;
pub(crate) mod reference;
pub(crate) mod string;
pub(crate) mod types;

use serde_json::{Map, Value};

use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::resolver::Scope;

/// One compiled predicate fragment.
pub(crate) trait Validate: Send + Sync {
    fn is_valid(&self, instance: &Value) -> bool;
}

pub(crate) type BoxedValidator = Box<dyn Validate>;

/// The conjunction of every keyword fragment of one schema unit.
pub(crate) struct SchemaNode {
    validators: Vec<BoxedValidator>,
}

impl SchemaNode {
    pub fn new(validators: Vec<BoxedValidator>) -> Self {
        SchemaNode { validators }
    }

    /// The boolean literal schemas: `true` accepts everything, `false`
    /// rejects everything.
    pub fn always(valid: bool) -> Self {
        if valid {
            SchemaNode { validators: Vec::new() }
        } else {
            SchemaNode {
                validators: vec![Box::new(RejectAll)],
            }
        }
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validators.iter().all(|v| v.is_valid(instance))
    }
}

struct RejectAll;

impl Validate for RejectAll {
    fn is_valid(&self, _instance: &Value) -> bool {
        false
    }
}

/// `additionalProperties` / `additionalItems`: absent means allowed, a
/// boolean toggles, a schema constrains.
pub(crate) enum Additional {
    Allowed,
    Forbidden,
    Schema(std::sync::Arc<crate::compiler::LazyNode>),
}

impl Additional {
    pub fn compile(
        value: Option<&Value>,
        scope: &Scope,
        keyword: &'static str,
        ctx: &mut Compiler,
    ) -> Result<Self, CompileError> {
        match value {
            None | Some(Value::Bool(true)) => Ok(Additional::Allowed),
            Some(Value::Bool(false)) => Ok(Additional::Forbidden),
            Some(Value::Object(_)) => {
                let node = ctx.subschema(&scope.descend(keyword))?;
                Ok(Additional::Schema(node))
            }
            Some(other) => Err(wrong(keyword, scope, "a boolean or a schema", other)),
        }
    }

    pub fn allows(&self, value: &Value) -> bool {
        match self {
            Additional::Allowed => true,
            Additional::Forbidden => false,
            Additional::Schema(node) => node.is_valid(value),
        }
    }
}

/// Compile every known keyword of a schema object into fragments.
pub(crate) fn compile_keywords(
    map: &Map<String, Value>,
    scope: &Scope,
    ctx: &mut Compiler,
) -> Result<Vec<BoxedValidator>, CompileError> {
    let mut out = Vec::new();
    out.extend(types::compile(map, scope, ctx)?);
    out.extend(enums::compile(map, scope, ctx)?);
    out.extend(numeric::compile(map, scope, ctx)?);
    out.extend(string::compile(map, scope, ctx)?);
    out.extend(array::compile(map, scope, ctx)?);
    out.extend(object::compile(map, scope, ctx)?);
    out.extend(logic::compile(map, scope, ctx)?);
    out.extend(format::compile(map, scope, ctx)?);
    Ok(out)
}

/// JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Shorthand for the wrong-shaped-keyword error.
pub(crate) fn wrong(
    keyword: &'static str,
    scope: &Scope,
    expected: &'static str,
    found: &Value,
) -> CompileError {
    CompileError::InvalidKeyword {
        keyword,
        pointer: scope.pointer.clone(),
        expected,
        found: json_type_name(found).to_string(),
    }
}

/// Parse the non-negative integer bound shared by `maxLength`, `minItems`,
/// `maxProperties`, and friends.
pub(crate) fn limit(
    keyword: &'static str,
    scope: &Scope,
    value: &Value,
) -> Result<u64, CompileError> {
    value
        .as_u64()
        .ok_or_else(|| wrong(keyword, scope, "a non-negative integer", value))
}

/// Compile the subschemas of an array-valued applicator (`allOf`, tuple
/// `items`, ...), one per element.
pub(crate) fn subschema_list(
    keyword: &'static str,
    scope: &Scope,
    items: &[Value],
    ctx: &mut Compiler,
) -> Result<Vec<std::sync::Arc<crate::compiler::LazyNode>>, CompileError> {
    let base = scope.descend(keyword);
    items
        .iter()
        .enumerate()
        .map(|(index, _)| ctx.subschema(&base.descend(&index.to_string())))
        .collect()
}
