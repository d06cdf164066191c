//! Numeric bounds and divisibility.
//!
//! The exclusivity encoding is the sharpest draft split in the whole keyword
//! set: draft 3/4 write `"maximum": 3, "exclusiveMaximum": true`, draft 6+
//! write `"exclusiveMaximum": 3` as a standalone bound. Both compile to the
//! same fragment here, with the flag folded in at compile time.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

use crate::compiler::Compiler;
use crate::draft::Draft;
use crate::equality::{is_multiple_of, num_cmp};
use crate::error::CompileError;
use crate::resolver::Scope;

use super::{wrong, BoxedValidator, Validate};

struct Bound {
    limit: Number,
    exclusive: bool,
    /// `Ordering::Less` for maximum-style bounds, `Greater` for minimums.
    valid_side: Ordering,
}

impl Validate for Bound {
    fn is_valid(&self, instance: &Value) -> bool {
        let Value::Number(n) = instance else {
            return true;
        };
        match num_cmp(n, &self.limit) {
            Ordering::Equal => !self.exclusive,
            side => side == self.valid_side,
        }
    }
}

struct MultipleOf {
    multiple: Number,
}

impl Validate for MultipleOf {
    fn is_valid(&self, instance: &Value) -> bool {
        let Value::Number(n) = instance else {
            return true;
        };
        is_multiple_of(n, &self.multiple)
    }
}

pub(super) fn compile(
    map: &Map<String, Value>,
    scope: &Scope,
    ctx: &mut Compiler,
) -> Result<Vec<BoxedValidator>, CompileError> {
    let mut out: Vec<BoxedValidator> = Vec::new();
    let boolean_exclusivity = ctx.draft <= Draft::Draft4;

    if let Some(value) = map.get("minimum") {
        let limit = number("minimum", scope, value)?;
        let exclusive =
            boolean_exclusivity && exclusivity_flag("exclusiveMinimum", scope, map)?;
        out.push(Box::new(Bound {
            limit,
            exclusive,
            valid_side: Ordering::Greater,
        }));
    }
    if let Some(value) = map.get("maximum") {
        let limit = number("maximum", scope, value)?;
        let exclusive =
            boolean_exclusivity && exclusivity_flag("exclusiveMaximum", scope, map)?;
        out.push(Box::new(Bound {
            limit,
            exclusive,
            valid_side: Ordering::Less,
        }));
    }

    if !boolean_exclusivity {
        if let Some(value) = map.get("exclusiveMinimum") {
            out.push(Box::new(Bound {
                limit: number("exclusiveMinimum", scope, value)?,
                exclusive: true,
                valid_side: Ordering::Greater,
            }));
        }
        if let Some(value) = map.get("exclusiveMaximum") {
            out.push(Box::new(Bound {
                limit: number("exclusiveMaximum", scope, value)?,
                exclusive: true,
                valid_side: Ordering::Less,
            }));
        }
    }

    let divisor_keyword = if ctx.draft == Draft::Draft3 {
        "divisibleBy"
    } else {
        "multipleOf"
    };
    if let Some(value) = map.get(divisor_keyword) {
        let multiple = number(divisor_keyword, scope, value)?;
        if multiple.as_f64().is_some_and(|f| f <= 0.0) {
            return Err(CompileError::InvalidKeyword {
                keyword: divisor_keyword,
                pointer: scope.pointer.clone(),
                expected: "a number greater than zero",
                found: multiple.to_string(),
            });
        }
        out.push(Box::new(MultipleOf { multiple }));
    }

    Ok(out)
}

fn number(
    keyword: &'static str,
    scope: &Scope,
    value: &Value,
) -> Result<Number, CompileError> {
    match value {
        Value::Number(n) => Ok(n.clone()),
        other => Err(wrong(keyword, scope, "a number", other)),
    }
}

/// The draft-3/4 boolean flag riding next to `minimum`/`maximum`.
fn exclusivity_flag(
    keyword: &'static str,
    scope: &Scope,
    map: &Map<String, Value>,
) -> Result<bool, CompileError> {
    match map.get(keyword) {
        None => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(other) => Err(wrong(keyword, scope, "a boolean", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bound(limit: Value, exclusive: bool, valid_side: Ordering) -> Bound {
        match limit {
            Value::Number(limit) => Bound {
                limit,
                exclusive,
                valid_side,
            },
            other => panic!("not a number: {other}"),
        }
    }

    #[test]
    fn inclusive_maximum() {
        let b = bound(json!(3.0), false, Ordering::Less);
        assert!(b.is_valid(&json!(3.0)));
        assert!(b.is_valid(&json!(2.2)));
        assert!(!b.is_valid(&json!(3.5)));
    }

    #[test]
    fn exclusive_maximum_rejects_the_bound() {
        let b = bound(json!(3.0), true, Ordering::Less);
        assert!(!b.is_valid(&json!(3.0)));
        assert!(b.is_valid(&json!(2.2)));
    }

    #[test]
    fn exclusive_minimum() {
        let b = bound(json!(1), true, Ordering::Greater);
        assert!(!b.is_valid(&json!(1.0)));
        assert!(b.is_valid(&json!(1.1)));
        assert!(!b.is_valid(&json!(0)));
    }

    #[test]
    fn bounds_ignore_non_numbers() {
        let b = bound(json!(3), false, Ordering::Less);
        assert!(b.is_valid(&json!("a long string")));
        assert!(b.is_valid(&json!([1, 2, 3, 4, 5])));
        assert!(b.is_valid(&json!(null)));
    }
}
