//! The schema compiler.
//!
//! `CompileOptions::compile` walks a schema document once and produces a
//! `CompiledSchema`, a pure predicate that can be invoked any number of
//! times. Compilation is keyed by `(document, pointer)` identity: every
//! schema location compiles at most once per build, and a location is
//! registered as a placeholder before its children compile, so recursive and
//! mutually recursive references bind to the placeholder instead of
//! re-entering the compiler.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::draft::Draft;
use crate::error::CompileError;
use crate::formats::FormatRegistry;
use crate::keywords::{self, json_type_name, reference::RefValidator, SchemaNode};
use crate::resolver::{
    lookup_pointer, scan_document, DocumentCache, Fetch, Resolver, Scope, DEFAULT_BASE,
};

/// A compiled schema node, filled exactly once during compilation and
/// read-only afterwards. References share these cells; a cell observed while
/// still compiling is precisely the self-reference case.
pub(crate) struct LazyNode {
    cell: OnceLock<SchemaNode>,
}

impl LazyNode {
    fn new() -> Self {
        LazyNode {
            cell: OnceLock::new(),
        }
    }

    pub(crate) fn is_valid(&self, instance: &Value) -> bool {
        // Every cell reachable from a CompiledSchema was filled before
        // compilation returned.
        self.cell.get().map_or(false, |node| node.is_valid(instance))
    }

    fn fill(&self, node: SchemaNode) {
        let _ = self.cell.set(node);
    }
}

/// Configuration for one compilation: draft selection, base URI, format
/// checks, and the remote-fetch capability.
///
/// This is plain data constructed by the caller, not global state; distinct
/// configurations (say, strict and lenient format registries) can coexist.
pub struct CompileOptions {
    draft: Option<Draft>,
    base_uri: Option<String>,
    formats: FormatRegistry,
    fetcher: Option<Arc<dyn Fetch>>,
    documents: Arc<DocumentCache>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            draft: None,
            base_uri: None,
            formats: FormatRegistry::default(),
            fetcher: default_fetcher(),
            documents: Arc::new(DocumentCache::new()),
        }
    }
}

#[cfg(feature = "remote")]
fn default_fetcher() -> Option<Arc<dyn Fetch>> {
    Some(Arc::new(crate::resolver::HttpFetcher::new()))
}

#[cfg(not(feature = "remote"))]
fn default_fetcher() -> Option<Arc<dyn Fetch>> {
    None
}

impl CompileOptions {
    pub fn new() -> Self {
        CompileOptions::default()
    }

    /// Force a draft dialect instead of detecting it from `$schema`.
    pub fn draft(mut self, draft: Draft) -> Self {
        self.draft = Some(draft);
        self
    }

    /// Base URI that relative `$ref`s in the root document resolve against.
    pub fn base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Register one extra format check on top of the built-ins.
    pub fn format(
        mut self,
        name: impl Into<String>,
        check: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.formats.register(name, check);
        self
    }

    /// Replace the whole format registry.
    pub fn formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    /// Capability used to retrieve remote documents. With the `remote`
    /// feature enabled the default is a blocking HTTP fetcher.
    pub fn fetcher(mut self, fetcher: impl Fetch + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Drop the fetch capability entirely: any reference that would need a
    /// remote document becomes a compile error.
    pub fn offline(mut self) -> Self {
        self.fetcher = None;
        self
    }

    /// Share a remote-document cache across compilations. Purely a
    /// performance knob; each build still keeps its own compilation cache.
    pub fn document_cache(mut self, cache: Arc<DocumentCache>) -> Self {
        self.documents = cache;
        self
    }

    /// Compile a schema document into a reusable validator.
    ///
    /// # Errors
    ///
    /// Fails on unresolvable references, fetch failures, unparseable
    /// patterns, and keyword values of the wrong shape for the active
    /// draft. There is no partial result.
    pub fn compile(&self, schema: &Value) -> Result<CompiledSchema, CompileError> {
        let draft = self
            .draft
            .or_else(|| Draft::detect(schema))
            .unwrap_or(Draft::Draft7);

        let base = match &self.base_uri {
            Some(uri) => {
                let mut parsed = Url::parse(uri).map_err(|source| CompileError::InvalidUri {
                    uri: uri.clone(),
                    pointer: String::new(),
                    source,
                })?;
                parsed.set_fragment(None);
                parsed
            }
            None => Url::parse(DEFAULT_BASE).map_err(|source| CompileError::InvalidUri {
                uri: DEFAULT_BASE.to_string(),
                pointer: String::new(),
                source,
            })?,
        };

        debug!(%draft, base = %base, "compiling schema");
        let document_key = base.to_string();
        let root = Arc::new(schema.clone());
        let anchors = scan_document(&root, &base, draft)?;
        let mut resolver = Resolver::new(draft, self.fetcher.clone(), self.documents.clone());
        resolver.insert_document(document_key.clone(), root, anchors);

        let mut compiler = Compiler {
            draft,
            formats: &self.formats,
            resolver,
            cache: HashMap::new(),
            ref_chain: Vec::new(),
        };
        let root_node = compiler.subschema(&Scope::root(base, document_key))?;
        Ok(CompiledSchema {
            draft,
            root: root_node,
        })
    }
}

/// Compile a schema with default options: draft detected from `$schema`
/// (falling back to draft 7), built-in formats, HTTP fetching when the
/// `remote` feature is on.
pub fn compile(schema: &Value) -> Result<CompiledSchema, CompileError> {
    CompileOptions::new().compile(schema)
}

/// One-shot convenience: compile and validate a single instance.
pub fn is_valid(schema: &Value, instance: &Value) -> Result<bool, CompileError> {
    Ok(compile(schema)?.is_valid(instance))
}

/// The executable result of compilation: an immutable, side-effect-free
/// predicate over instances. Safe to invoke concurrently and repeatedly;
/// compilation cost is paid once.
pub struct CompiledSchema {
    draft: Draft,
    root: Arc<LazyNode>,
}

impl CompiledSchema {
    /// Does the instance satisfy the schema?
    ///
    /// Never panics and never errors, whatever the instance: keywords whose
    /// type does not match the instance are skipped, per the drafts.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.root.is_valid(instance)
    }

    /// The draft dialect this schema was compiled under.
    pub fn draft(&self) -> Draft {
        self.draft
    }
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("draft", &self.draft)
            .finish_non_exhaustive()
    }
}

/// Per-build compilation state: the resolver's document set plus the
/// `(document, pointer)` cache of compiled nodes. Discarded once the
/// `CompiledSchema` is returned.
pub(crate) struct Compiler<'a> {
    pub(crate) draft: Draft,
    formats: &'a FormatRegistry,
    resolver: Resolver,
    cache: HashMap<(String, String), Arc<LazyNode>>,
    /// Locations currently being compiled through an unbroken chain of
    /// `$ref`s. A target already on the chain closes a loop of bare
    /// references, which applies no keyword to any instance.
    ref_chain: Vec<(String, String)>,
}

impl Compiler<'_> {
    pub(crate) fn formats(&self) -> &FormatRegistry {
        self.formats
    }

    /// Compile the schema at a scope, reusing the cached node when this
    /// location was seen before (including "currently compiling" nodes,
    /// which is what terminates recursive references).
    pub(crate) fn subschema(&mut self, scope: &Scope) -> Result<Arc<LazyNode>, CompileError> {
        let key = (scope.doc.clone(), scope.pointer.clone());
        if let Some(existing) = self.cache.get(&key) {
            return Ok(existing.clone());
        }
        let lazy = Arc::new(LazyNode::new());
        self.cache.insert(key, lazy.clone());

        let root = self
            .resolver
            .document(&scope.doc)
            .ok_or_else(|| CompileError::InvalidSchema {
                pointer: scope.pointer.clone(),
                message: format!("unknown document {:?}", scope.doc),
            })?
            .root
            .clone();
        let value =
            lookup_pointer(&root, &scope.pointer).ok_or_else(|| CompileError::InvalidSchema {
                pointer: scope.pointer.clone(),
                message: "no schema at this location".to_string(),
            })?;

        // The node's own id/$id shifts the base for everything inside it.
        let mut scope = scope.clone();
        if let Value::Object(map) = value {
            if let Some(Value::String(id)) = map.get(self.draft.id_keyword()) {
                let mut joined =
                    scope
                        .base
                        .join(id)
                        .map_err(|source| CompileError::InvalidUri {
                            uri: id.clone(),
                            pointer: scope.pointer.clone(),
                            source,
                        })?;
                joined.set_fragment(None);
                scope.base = joined;
            }
        }

        let node = self.compile_node(value, &scope)?;
        lazy.fill(node);
        Ok(lazy)
    }

    fn compile_node(&mut self, value: &Value, scope: &Scope) -> Result<SchemaNode, CompileError> {
        match value {
            Value::Bool(accept) if self.draft.boolean_schemas() => Ok(SchemaNode::always(*accept)),
            Value::Object(map) => {
                if let Some(reference) = map.get("$ref") {
                    let Value::String(reference) = reference else {
                        return Err(CompileError::InvalidKeyword {
                            keyword: "$ref",
                            pointer: scope.pointer.clone(),
                            expected: "a URI reference string",
                            found: json_type_name(reference).to_string(),
                        });
                    };
                    // All sibling keywords are ignored next to $ref.
                    let target = self.resolver.resolve(scope, reference)?;
                    let here = (scope.doc.clone(), scope.pointer.clone());
                    let target_key = (target.doc.clone(), target.pointer.clone());
                    // A cycle of bare references constrains nothing; it must
                    // collapse here rather than recurse at validation time.
                    if target_key == here || self.ref_chain.contains(&target_key) {
                        return Ok(SchemaNode::new(Vec::new()));
                    }
                    self.ref_chain.push(here);
                    let node = self.subschema(&target);
                    self.ref_chain.pop();
                    return Ok(SchemaNode::new(vec![Box::new(RefValidator::new(node?))]));
                }
                // A node with real keywords ends any reference chain leading
                // into it.
                let chain = std::mem::take(&mut self.ref_chain);
                let validators = keywords::compile_keywords(map, scope, self);
                self.ref_chain = chain;
                Ok(SchemaNode::new(validators?))
            }
            other => {
                let expected = if self.draft.boolean_schemas() {
                    "expected a schema object or boolean"
                } else {
                    "expected a schema object"
                };
                Err(CompileError::InvalidSchema {
                    pointer: scope.pointer.clone(),
                    message: format!("{expected}, got {}", json_type_name(other)),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compiled_schema_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledSchema>();
    }

    #[test]
    fn sibling_keywords_are_ignored_next_to_ref() {
        let schema = json!({
            "definitions": { "free": {} },
            "$ref": "#/definitions/free",
            "maxItems": 1
        });
        let compiled = compile(&schema).unwrap();
        // maxItems would reject this, but it rides next to $ref.
        assert!(compiled.is_valid(&json!([1, 2, 3])));
    }

    #[test]
    fn boolean_schemas_need_draft_6() {
        assert!(CompileOptions::new()
            .draft(Draft::Draft7)
            .compile(&json!(true))
            .is_ok());
        assert!(CompileOptions::new()
            .draft(Draft::Draft4)
            .compile(&json!(true))
            .is_err());
    }

    #[test]
    fn unknown_keywords_are_ignored() {
        let schema = json!({ "frobnicate": 12, "x-vendor": { "maxLength": 0 } });
        let compiled = compile(&schema).unwrap();
        assert!(compiled.is_valid(&json!("anything")));
    }

    #[test]
    fn invalid_base_uri_is_a_compile_error() {
        let err = CompileOptions::new()
            .base_uri("not a uri")
            .compile(&json!({}))
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidUri { .. }));
    }
}
