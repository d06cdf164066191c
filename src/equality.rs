//! Deep equality and numeric comparison primitives.
//!
//! `enum`, `const`, and `uniqueItems` compare instances structurally:
//! numbers compare by mathematical value (`1 == 1.0`), arrays are ordered,
//! object key order is irrelevant. The bound and multiple-of checks reuse the
//! same numeric core.
//!
//! Integer/integer arithmetic goes through `i128`, which represents every
//! JSON integer serde_json can produce exactly. The multiple-of check builds
//! exact decimal rationals from the shortest round-trip rendering of each
//! operand, because naive `%` on doubles misclassifies divisors like
//! `0.0001`.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{pow, Zero};
use serde_json::{Number, Value};

/// Structural equality over JSON values.
pub(crate) fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => num_eq(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(u, v)| json_eq(u, v))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, u)| y.get(k).is_some_and(|v| json_eq(u, v)))
        }
        _ => false,
    }
}

/// Mathematical equality: `1 == 1.0`, but `1 != true` (handled by the caller
/// through the type match in [`json_eq`]).
pub(crate) fn num_eq(a: &Number, b: &Number) -> bool {
    match (as_i128(a), as_i128(b)) {
        (Some(x), Some(y)) => x == y,
        _ => as_f64(a) == as_f64(b),
    }
}

/// Numeric ordering for `minimum`/`maximum`. JSON numbers are never NaN, so
/// the ordering is total.
pub(crate) fn num_cmp(a: &Number, b: &Number) -> Ordering {
    match (as_i128(a), as_i128(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => as_f64(a)
            .partial_cmp(&as_f64(b))
            .unwrap_or(Ordering::Equal),
    }
}

/// Exact divisibility: is `instance / multiple` a whole number?
///
/// A zero divisor never divides anything (the compiler rejects
/// `multipleOf: 0` before this is reached).
pub(crate) fn is_multiple_of(instance: &Number, multiple: &Number) -> bool {
    if let (Some(a), Some(b)) = (as_i128(instance), as_i128(multiple)) {
        return b != 0 && a % b == 0;
    }
    let (num_a, scale_a) = decimal_parts(instance);
    let (num_b, scale_b) = decimal_parts(multiple);
    if num_b.is_zero() {
        return false;
    }
    // instance = num_a / 10^scale_a, multiple = num_b / 10^scale_b.
    // Align both to the larger scale, then check integer divisibility.
    let (aligned_a, aligned_b) = if scale_b >= scale_a {
        (num_a * pow10(scale_b - scale_a), num_b)
    } else {
        (num_a, num_b * pow10(scale_a - scale_b))
    };
    aligned_a.is_multiple_of(&aligned_b)
}

fn as_i128(n: &Number) -> Option<i128> {
    if let Some(i) = n.as_i64() {
        Some(i128::from(i))
    } else {
        n.as_u64().map(i128::from)
    }
}

fn as_f64(n: &Number) -> f64 {
    n.as_f64().unwrap_or(0.0)
}

fn pow10(exp: usize) -> BigInt {
    pow(BigInt::from(10), exp)
}

/// Decompose a number into `(mantissa, scale)` with
/// `value = mantissa / 10^scale`, exactly, via the shortest decimal
/// rendering (Rust's float `Display` never uses exponent notation).
fn decimal_parts(n: &Number) -> (BigInt, usize) {
    if let Some(i) = as_i128(n) {
        return (BigInt::from(i), 0);
    }
    let rendered = as_f64(n).to_string();
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, f),
        None => (rendered.as_str(), ""),
    };
    let digits: String = int_part.chars().chain(frac_part.chars()).collect();
    let mantissa = digits.parse::<BigInt>().unwrap_or_else(|_| BigInt::zero());
    (mantissa, frac_part.len())
}
