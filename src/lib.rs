//! JSON Schema validation for drafts 3, 4, 6, and 7.
//!
//! This library compiles a schema document into a reusable validator and
//! answers one question about each instance: valid or not. Compilation
//! resolves every `$ref` up front (including remote documents, fetched at
//! most once each), so validation itself never does IO and never fails.
//!
//! # Example
//!
//! ```
//! use draftschema::compile;
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "name": { "type": "string" },
//!         "age": { "type": "integer", "minimum": 0 }
//!     },
//!     "required": ["name"]
//! });
//!
//! let compiled = compile(&schema).unwrap();
//! assert!(compiled.is_valid(&json!({ "name": "ada", "age": 36 })));
//! assert!(!compiled.is_valid(&json!({ "age": 36 })));
//! assert!(!compiled.is_valid(&json!({ "name": "ada", "age": -1 })));
//! ```
//!
//! # Draft selection
//!
//! The dialect is detected from the `$schema` keyword, falling back to
//! draft 7; [`CompileOptions::draft`] overrides detection. Keywords are
//! compiled per the selected draft: a draft-4 schema with a boolean
//! `exclusiveMaximum` and a draft-7 schema with a numeric one both mean
//! what their draft says they mean.
//!
//! # Remote references
//!
//! With the default `remote` feature a `$ref` to an `http://` or `https://`
//! document is fetched with a blocking client during compilation. Supply
//! your own [`Fetch`] implementation to intercept retrieval, or compile
//! with no fetcher to make remote references a hard error.

mod compiler;
mod draft;
mod equality;
mod error;
mod formats;
mod keywords;
mod loader;
mod resolver;

pub use compiler::{compile, is_valid, CompileOptions, CompiledSchema};
pub use draft::Draft;
pub use error::{CompileError, LoadError};
pub use formats::{FormatCheck, FormatRegistry};
pub use loader::{is_url, load_json, load_json_auto, load_json_str};
pub use resolver::{BoxError, DocumentCache, Fetch};

#[cfg(feature = "remote")]
pub use loader::load_json_url;
#[cfg(feature = "remote")]
pub use resolver::HttpFetcher;
