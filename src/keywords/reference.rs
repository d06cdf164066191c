//! The `$ref` fragment.
//!
//! A reference validator holds the shared lazy cell of its target, which may
//! still be compiling when the reference is built: that is exactly how a
//! schema can point back at an ancestor without sending the compiler into a
//! loop. The cell is written once, before compilation returns.

use std::sync::Arc;

use serde_json::Value;

use crate::compiler::LazyNode;

use super::Validate;

pub(crate) struct RefValidator {
    target: Arc<LazyNode>,
}

impl RefValidator {
    pub fn new(target: Arc<LazyNode>) -> Self {
        RefValidator { target }
    }
}

impl Validate for RefValidator {
    fn is_valid(&self, instance: &Value) -> bool {
        self.target.is_valid(instance)
    }
}
