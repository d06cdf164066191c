//! Reference resolution.
//!
//! A `$ref` is resolved in three steps: join the reference against the base
//! URI of the referencing scope, locate the document that owns the result
//! (the current document, an already loaded one, an embedded `id`/`$id`
//! subschema, a built-in meta-schema, or a freshly fetched remote document),
//! then walk the fragment as a JSON Pointer or match it as a
//! location-independent anchor.
//!
//! Base URIs shift whenever a subschema declares `id`/`$id`; a scan pass over
//! each document records every such declaration so absolute references can
//! land on them directly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::draft::{self, Draft};
use crate::error::CompileError;

/// Base URI used when the caller supplies none. Relative references still
/// resolve within the document; only truly remote references need a real
/// base.
pub(crate) const DEFAULT_BASE: &str = "json-schema:///";

/// Errors produced by a [`Fetch`] implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The capability to retrieve a remote schema document.
///
/// Invoked at compile time only, at most once per document identity; a
/// failure fails the whole compilation. Closures of the right shape
/// implement this directly.
pub trait Fetch: Send + Sync {
    fn fetch(&self, uri: &Url) -> Result<Value, BoxError>;
}

impl<F> Fetch for F
where
    F: Fn(&Url) -> Result<Value, BoxError> + Send + Sync,
{
    fn fetch(&self, uri: &Url) -> Result<Value, BoxError> {
        self(uri)
    }
}

/// Blocking HTTP fetcher used when the `remote` feature is enabled.
#[cfg(feature = "remote")]
pub struct HttpFetcher {
    timeout: std::time::Duration,
}

#[cfg(feature = "remote")]
impl HttpFetcher {
    /// Default timeout for HTTP requests (10 seconds).
    const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

    pub fn new() -> Self {
        HttpFetcher {
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: std::time::Duration) -> Self {
        HttpFetcher { timeout }
    }
}

#[cfg(feature = "remote")]
impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "remote")]
impl Fetch for HttpFetcher {
    fn fetch(&self, uri: &Url) -> Result<Value, BoxError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let response = client.get(uri.as_str()).send()?.error_for_status()?;
        Ok(response.json()?)
    }
}

/// Cache of fetched documents keyed by absolute URI (fragment stripped).
///
/// Entries are immutable once stored and never evicted. The cache may be
/// shared across concurrent compilations; insertion is insert-if-absent, so
/// the first fetched copy wins.
#[derive(Default)]
pub struct DocumentCache {
    entries: Mutex<HashMap<String, Arc<Value>>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        DocumentCache::default()
    }

    pub(crate) fn get(&self, uri: &str) -> Option<Arc<Value>> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(uri).cloned())
    }

    pub(crate) fn insert_if_absent(&self, uri: &str, document: Value) -> Arc<Value> {
        match self.entries.lock() {
            Ok(mut entries) => entries
                .entry(uri.to_string())
                .or_insert_with(|| Arc::new(document))
                .clone(),
            Err(_) => Arc::new(document),
        }
    }
}

/// Where an `id`/`$id` declaration lives inside a document.
#[derive(Debug, Clone)]
pub(crate) struct Anchor {
    /// JSON Pointer of the declaring subschema.
    pub pointer: String,
    /// Base URI the declaration resolves against (excluding the declared id
    /// itself; compilation re-applies it when entering the subschema).
    pub base: Url,
}

/// A loaded document plus its scanned `id`/`$id` declarations, keyed by the
/// absolute URI each declaration resolves to.
pub(crate) struct DocumentEntry {
    pub root: Arc<Value>,
    pub anchors: HashMap<String, Anchor>,
}

/// The resolution context of one schema location: base URI, owning document,
/// and JSON Pointer within it.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    pub base: Url,
    pub doc: String,
    pub pointer: String,
}

impl Scope {
    pub fn root(base: Url, doc: String) -> Self {
        Scope {
            base,
            doc,
            pointer: String::new(),
        }
    }

    /// Child scope one pointer step down.
    pub fn descend(&self, segment: &str) -> Self {
        Scope {
            base: self.base.clone(),
            doc: self.doc.clone(),
            pointer: format!("{}/{}", self.pointer, escape_segment(segment)),
        }
    }
}

/// Escape a raw key for embedding in a JSON Pointer: `~` then `/`.
pub(crate) fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Decode one pointer segment: `~1` then `~0`, in that order only. A stray
/// `~` is a malformed pointer.
fn unescape_segment(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Walk a JSON Pointer (in escaped form, `""` or `"/a/b"`) through a
/// document. Arrays step by integer index, objects by exact key.
pub(crate) fn lookup_pointer<'a>(document: &'a Value, pointer: &str) -> Option<&'a Value> {
    let mut current = document;
    if pointer.is_empty() {
        return Some(current);
    }
    for raw in pointer.split('/').skip(1) {
        let segment = unescape_segment(raw)?;
        current = match current {
            Value::Object(map) => map.get(&segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let text = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(text, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Record every `id`/`$id` declaration in a document.
///
/// Walks the full tree tracking the base URI, so nested declarations with
/// relative values resolve against their enclosing scope. Returns the anchor
/// map keyed by absolute URI (including plain-name fragments like `#foo`).
pub(crate) fn scan_document(
    root: &Value,
    base: &Url,
    draft: Draft,
) -> Result<HashMap<String, Anchor>, CompileError> {
    let mut anchors = HashMap::new();
    scan_value(root, base, draft, String::new(), &mut anchors)?;
    Ok(anchors)
}

fn scan_value(
    value: &Value,
    base: &Url,
    draft: Draft,
    pointer: String,
    anchors: &mut HashMap<String, Anchor>,
) -> Result<(), CompileError> {
    match value {
        Value::Object(map) => {
            let mut child_base = base.clone();
            if let Some(Value::String(id)) = map.get(draft.id_keyword()) {
                let declared = base.join(id).map_err(|source| CompileError::InvalidUri {
                    uri: id.clone(),
                    pointer: pointer.clone(),
                    source,
                })?;
                anchors.insert(
                    declared.to_string().trim_end_matches('#').to_string(),
                    Anchor {
                        pointer: pointer.clone(),
                        base: base.clone(),
                    },
                );
                child_base = declared;
                child_base.set_fragment(None);
            }
            for (key, child) in map {
                let child_pointer = format!("{}/{}", pointer, escape_segment(key));
                match key.as_str() {
                    // enum and const hold instance data, not schemas; an
                    // id-shaped string inside them declares nothing.
                    "enum" | "const" => {}
                    // Maps of named subschemas. Their keys are property or
                    // definition names, never keywords.
                    "properties" | "patternProperties" | "definitions" => {
                        if let Value::Object(named) = child {
                            for (name, subschema) in named {
                                scan_value(
                                    subschema,
                                    &child_base,
                                    draft,
                                    format!("{}/{}", child_pointer, escape_segment(name)),
                                    anchors,
                                )?;
                            }
                        }
                    }
                    _ => scan_value(child, &child_base, draft, child_pointer, anchors)?,
                }
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                scan_value(
                    child,
                    base,
                    draft,
                    format!("{pointer}/{index}"),
                    anchors,
                )?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Resolves references and owns the per-compilation document set.
pub(crate) struct Resolver {
    draft: Draft,
    fetcher: Option<Arc<dyn Fetch>>,
    remote_cache: Arc<DocumentCache>,
    documents: HashMap<String, DocumentEntry>,
}

impl Resolver {
    pub fn new(
        draft: Draft,
        fetcher: Option<Arc<dyn Fetch>>,
        remote_cache: Arc<DocumentCache>,
    ) -> Self {
        Resolver {
            draft,
            fetcher,
            remote_cache,
            documents: HashMap::new(),
        }
    }

    pub fn insert_document(&mut self, key: String, root: Arc<Value>, anchors: HashMap<String, Anchor>) {
        self.documents.insert(key, DocumentEntry { root, anchors });
    }

    pub fn document(&self, key: &str) -> Option<&DocumentEntry> {
        self.documents.get(key)
    }

    /// Resolve a `$ref` string against a scope, loading remote documents as
    /// needed, and return the scope of the target schema.
    pub fn resolve(&mut self, scope: &Scope, reference: &str) -> Result<Scope, CompileError> {
        let target =
            scope
                .base
                .join(reference)
                .map_err(|source| CompileError::UnresolvableRef {
                    reference: reference.to_string(),
                    pointer: scope.pointer.clone(),
                    reason: source.to_string(),
                })?;
        let fragment = match target.fragment() {
            None | Some("") => None,
            Some(f) => Some(f.to_string()),
        };
        let mut location = target.clone();
        location.set_fragment(None);

        let site = self.locate(&location, scope)?;
        match fragment {
            None => Ok(site),
            Some(f) if f.starts_with('/') => {
                let decoded =
                    percent_decode(&f).ok_or_else(|| CompileError::UnresolvableRef {
                        reference: reference.to_string(),
                        pointer: scope.pointer.clone(),
                        reason: format!("invalid percent-encoding in fragment {f:?}"),
                    })?;
                self.descend_pointer(&site, &decoded, reference, &scope.pointer)
            }
            Some(f) => {
                // Plain-name fragment: must match a scanned id declaration.
                let mut wanted = location.clone();
                wanted.set_fragment(Some(&f));
                let entry = self.entry(&site.doc, &scope.pointer, reference)?;
                match entry.anchors.get(wanted.as_str()) {
                    Some(anchor) => Ok(Scope {
                        base: anchor.base.clone(),
                        doc: site.doc,
                        pointer: anchor.pointer.clone(),
                    }),
                    None => Err(CompileError::UnresolvableRef {
                        reference: reference.to_string(),
                        pointer: scope.pointer.clone(),
                        reason: format!("no schema declares the identifier {:?}", wanted.as_str()),
                    }),
                }
            }
        }
    }

    /// Find or load the document addressed by a fragment-less URI, returning
    /// the scope of the matching schema (document root or embedded
    /// `id`-declared subschema).
    fn locate(&mut self, location: &Url, scope: &Scope) -> Result<Scope, CompileError> {
        let key = location.as_str();

        // The referencing document first: its retrieval URI or any id
        // declared inside it.
        if scope.doc == key {
            return Ok(Scope::root(location.clone(), scope.doc.clone()));
        }
        if let Some(anchor) = self
            .documents
            .get(&scope.doc)
            .and_then(|entry| entry.anchors.get(key))
        {
            return Ok(Scope {
                base: anchor.base.clone(),
                doc: scope.doc.clone(),
                pointer: anchor.pointer.clone(),
            });
        }

        // Any other document loaded earlier in this compilation.
        if self.documents.contains_key(key) {
            trace!(uri = key, "document already loaded");
            return Ok(Scope::root(location.clone(), key.to_string()));
        }
        for (doc_key, entry) in &self.documents {
            if let Some(anchor) = entry.anchors.get(key) {
                return Ok(Scope {
                    base: anchor.base.clone(),
                    doc: doc_key.clone(),
                    pointer: anchor.pointer.clone(),
                });
            }
        }

        // Built-in meta-schemas resolve without any fetch.
        if let Some(meta) = draft::builtin_meta_schema(key) {
            let root = Arc::new(meta.clone());
            let anchors = scan_document(&root, location, self.draft)?;
            self.insert_document(key.to_string(), root, anchors);
            return Ok(Scope::root(location.clone(), key.to_string()));
        }

        // Remote document: shared cache first, then the fetch capability.
        let root = match self.remote_cache.get(key) {
            Some(cached) => {
                trace!(uri = key, "remote document cache hit");
                cached
            }
            None => {
                let fetcher = self.fetcher.as_ref().ok_or_else(|| CompileError::NoFetcher {
                    uri: key.to_string(),
                })?;
                debug!(uri = key, "fetching remote document");
                let fetched =
                    fetcher
                        .fetch(location)
                        .map_err(|source| CompileError::Fetch {
                            uri: key.to_string(),
                            message: source.to_string(),
                        })?;
                self.remote_cache.insert_if_absent(key, fetched)
            }
        };
        let anchors = scan_document(&root, location, self.draft)?;
        self.insert_document(key.to_string(), root, anchors);
        Ok(Scope::root(location.clone(), key.to_string()))
    }

    /// Append a decoded JSON-Pointer fragment below a site, verifying each
    /// step and tracking `id` declarations crossed on the way so the target
    /// scope carries the right base URI.
    fn descend_pointer(
        &self,
        site: &Scope,
        decoded: &str,
        reference: &str,
        from_pointer: &str,
    ) -> Result<Scope, CompileError> {
        let entry = self.entry(&site.doc, from_pointer, reference)?;
        let err = |reason: String| CompileError::UnresolvableRef {
            reference: reference.to_string(),
            pointer: from_pointer.to_string(),
            reason,
        };

        let mut current = lookup_pointer(&entry.root, &site.pointer)
            .ok_or_else(|| err(format!("lost track of {:?}", site.pointer)))?;
        let mut base = site.base.clone();
        for raw in decoded.split('/').skip(1) {
            // Ids on the path shift the base for everything beneath them.
            if let Value::Object(map) = current {
                if let Some(Value::String(id)) = map.get(self.draft.id_keyword()) {
                    if let Ok(mut joined) = base.join(id) {
                        joined.set_fragment(None);
                        base = joined;
                    }
                }
            }
            let segment =
                unescape_segment(raw).ok_or_else(|| err(format!("malformed pointer segment {raw:?}")))?;
            current = match current {
                Value::Object(map) => map
                    .get(&segment)
                    .ok_or_else(|| err(format!("no such key {segment:?}")))?,
                Value::Array(items) => {
                    let index: usize = segment
                        .parse()
                        .map_err(|_| err(format!("{segment:?} is not an array index")))?;
                    items
                        .get(index)
                        .ok_or_else(|| err(format!("index {index} out of range")))?
                }
                other => {
                    return Err(err(format!(
                        "cannot descend into {}",
                        crate::keywords::json_type_name(other)
                    )))
                }
            };
        }
        Ok(Scope {
            base,
            doc: site.doc.clone(),
            pointer: format!("{}{}", site.pointer, decoded),
        })
    }

    fn entry(
        &self,
        doc: &str,
        pointer: &str,
        reference: &str,
    ) -> Result<&DocumentEntry, CompileError> {
        self.documents
            .get(doc)
            .ok_or_else(|| CompileError::UnresolvableRef {
                reference: reference.to_string(),
                pointer: pointer.to_string(),
                reason: format!("unknown document {doc:?}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pointer_lookup_walks_objects_and_arrays() {
        let doc = json!({"a": {"b": [10, {"c": true}]}});
        assert_eq!(lookup_pointer(&doc, ""), Some(&doc));
        assert_eq!(lookup_pointer(&doc, "/a/b/0"), Some(&json!(10)));
        assert_eq!(lookup_pointer(&doc, "/a/b/1/c"), Some(&json!(true)));
        assert_eq!(lookup_pointer(&doc, "/a/missing"), None);
        assert_eq!(lookup_pointer(&doc, "/a/b/7"), None);
        assert_eq!(lookup_pointer(&doc, "/a/b/0/c"), None);
    }

    #[test]
    fn pointer_unescaping_order() {
        let doc = json!({"a/b": 1, "m~n": 2, "~1": 3});
        assert_eq!(lookup_pointer(&doc, "/a~1b"), Some(&json!(1)));
        assert_eq!(lookup_pointer(&doc, "/m~0n"), Some(&json!(2)));
        // ~01 decodes to the literal "~1", not to "/".
        assert_eq!(lookup_pointer(&doc, "/~01"), Some(&json!(3)));
        // A stray ~ is malformed.
        assert_eq!(lookup_pointer(&doc, "/m~n"), None);
    }

    #[test]
    fn escape_round_trip() {
        assert_eq!(escape_segment("a/b~c"), "a~1b~0c");
        assert_eq!(unescape_segment("a~1b~0c").as_deref(), Some("a/b~c"));
    }

    #[test]
    fn percent_decoding() {
        assert_eq!(percent_decode("a%25b").as_deref(), Some("a%b"));
        assert_eq!(percent_decode("plain").as_deref(), Some("plain"));
        assert_eq!(percent_decode("bad%2"), None);
        assert_eq!(percent_decode("bad%zz"), None);
    }

    #[test]
    fn scan_records_nested_ids() {
        let base = Url::parse("http://localhost:1234/root.json").unwrap();
        let doc = json!({
            "id": "http://localhost:1234/sibling.json",
            "items": {
                "id": "folder/",
                "properties": {
                    "named": { "id": "#anchor" }
                }
            }
        });
        let anchors = scan_document(&doc, &base, Draft::Draft4).unwrap();
        assert_eq!(
            anchors["http://localhost:1234/sibling.json"].pointer,
            ""
        );
        assert_eq!(anchors["http://localhost:1234/folder/"].pointer, "/items");
        assert_eq!(
            anchors["http://localhost:1234/folder/#anchor"].pointer,
            "/items/properties/named"
        );
    }

    #[test]
    fn scan_skips_enum_and_const_data() {
        let base = Url::parse("http://localhost:1234/root.json").unwrap();
        let doc = json!({
            "enum": [{ "$id": "#inside-enum" }],
            "const": { "$id": "#inside-const" },
            "definitions": {
                "real": { "$id": "#real" }
            }
        });
        let anchors = scan_document(&doc, &base, Draft::Draft7).unwrap();
        assert_eq!(anchors.len(), 1);
        assert_eq!(
            anchors["http://localhost:1234/root.json#real"].pointer,
            "/definitions/real"
        );

        // Arbitrary strings are legal inside data, even unjoinable ones.
        let doc = json!({ "enum": [{ "$id": "http://[" }] });
        assert!(scan_document(&doc, &base, Draft::Draft7).unwrap().is_empty());
    }

    #[test]
    fn document_cache_insert_if_absent_keeps_first() {
        let cache = DocumentCache::new();
        assert!(cache.get("http://x/a.json").is_none());
        let first = cache.insert_if_absent("http://x/a.json", json!({"v": 1}));
        let second = cache.insert_if_absent("http://x/a.json", json!({"v": 2}));
        assert_eq!(*first, json!({"v": 1}));
        assert_eq!(*second, json!({"v": 1}));
    }
}
