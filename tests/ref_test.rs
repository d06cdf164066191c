//! Integration tests for reference resolution: remote documents, id/$id
//! scopes, and anchors.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use draftschema::{BoxError, CompileError, CompileOptions, DocumentCache, Draft};
use serde_json::{json, Value};
use url::Url;

mod remote_documents {
    use super::*;

    #[test]
    fn remote_document_is_fetched_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let fetcher = move |uri: &Url| -> Result<Value, BoxError> {
            seen.fetch_add(1, Ordering::SeqCst);
            assert_eq!(uri.as_str(), "https://example.com/item.json");
            Ok(json!({ "type": "integer" }))
        };

        // Two references to the same document identity.
        let schema = json!({
            "properties": {
                "a": { "$ref": "https://example.com/item.json" },
                "b": { "$ref": "https://example.com/item.json#" }
            }
        });
        let compiled = CompileOptions::new()
            .fetcher(fetcher)
            .compile(&schema)
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(compiled.is_valid(&json!({ "a": 1, "b": 2 })));
        assert!(!compiled.is_valid(&json!({ "a": "x" })));
    }

    #[test]
    fn fragment_into_remote_document() {
        let fetcher = |_: &Url| -> Result<Value, BoxError> {
            Ok(json!({ "definitions": { "name": { "type": "string", "minLength": 1 } } }))
        };
        let schema = json!({ "$ref": "https://example.com/defs.json#/definitions/name" });
        let compiled = CompileOptions::new()
            .fetcher(fetcher)
            .compile(&schema)
            .unwrap();
        assert!(compiled.is_valid(&json!("ok")));
        assert!(!compiled.is_valid(&json!("")));
    }

    #[test]
    fn fetch_failure_fails_compilation() {
        let fetcher = |_: &Url| -> Result<Value, BoxError> { Err("connection refused".into()) };
        let err = CompileOptions::new()
            .fetcher(fetcher)
            .compile(&json!({ "$ref": "https://example.com/gone.json" }))
            .unwrap_err();
        assert!(matches!(err, CompileError::Fetch { .. }));
    }

    #[test]
    fn remote_ref_without_fetcher_is_an_error() {
        let err = CompileOptions::new()
            .offline()
            .compile(&json!({ "$ref": "https://example.com/far.json" }))
            .unwrap_err();
        assert!(matches!(err, CompileError::NoFetcher { .. }));
    }

    #[test]
    fn shared_document_cache_spans_compilations() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(DocumentCache::new());
        let schema = json!({ "$ref": "https://example.com/shared.json" });

        for _ in 0..2 {
            let seen = calls.clone();
            let fetcher = move |_: &Url| -> Result<Value, BoxError> {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(json!({ "type": "boolean" }))
            };
            let compiled = CompileOptions::new()
                .fetcher(fetcher)
                .document_cache(cache.clone())
                .compile(&schema)
                .unwrap();
            assert!(compiled.is_valid(&json!(true)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[cfg(feature = "remote")]
    #[test]
    fn http_fetcher_resolves_mock_server_refs() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/leaf.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"type": "string"}"#)
            .create();

        let schema = json!({ "$ref": format!("{}/leaf.json", server.url()) });
        let compiled = draftschema::compile(&schema).unwrap();
        assert!(compiled.is_valid(&json!("hello")));
        assert!(!compiled.is_valid(&json!(5)));
        mock.assert();
    }
}

mod id_scopes {
    use super::*;

    #[test]
    fn nested_id_changes_the_resolution_scope() {
        // Inside "folder/inner.json" scope, "sibling.json" resolves to
        // "folder/sibling.json", not to a document next to the root.
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let fetcher = move |uri: &Url| -> Result<Value, BoxError> {
            seen.fetch_add(1, Ordering::SeqCst);
            assert_eq!(uri.as_str(), "https://example.com/folder/sibling.json");
            Ok(json!({ "type": "null" }))
        };

        let schema = json!({
            "$id": "https://example.com/root.json",
            "properties": {
                "inner": {
                    "$id": "folder/inner.json",
                    "properties": {
                        "leaf": { "$ref": "sibling.json" }
                    }
                }
            }
        });
        let compiled = CompileOptions::new()
            .fetcher(fetcher)
            .compile(&schema)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(compiled.is_valid(&json!({ "inner": { "leaf": null } })));
        assert!(!compiled.is_valid(&json!({ "inner": { "leaf": 0 } })));
    }

    #[test]
    fn absolute_ref_targets_embedded_id_without_fetching() {
        let schema = json!({
            "$id": "https://example.com/root.json",
            "definitions": {
                "piece": {
                    "$id": "https://example.com/piece.json",
                    "type": "integer"
                }
            },
            "$ref": "https://example.com/piece.json"
        });
        // No fetcher: the target must be found inside the root document.
        let compiled = CompileOptions::new().offline().compile(&schema).unwrap();
        assert!(compiled.is_valid(&json!(3)));
        assert!(!compiled.is_valid(&json!("3")));
    }

    #[test]
    fn plain_name_fragment_targets_declared_anchor() {
        let schema = json!({
            "$id": "https://example.com/root.json",
            "definitions": {
                "named": { "$id": "#piece", "type": "string" }
            },
            "$ref": "#piece"
        });
        let compiled = CompileOptions::new().offline().compile(&schema).unwrap();
        assert!(compiled.is_valid(&json!("yes")));
        assert!(!compiled.is_valid(&json!(1)));
    }

    #[test]
    fn draft_4_uses_id_not_dollar_id() {
        let schema = json!({
            "id": "https://example.com/root.json",
            "definitions": {
                "piece": { "id": "#piece", "type": "boolean" }
            },
            "$ref": "#piece"
        });
        let compiled = CompileOptions::new()
            .draft(Draft::Draft4)
            .offline()
            .compile(&schema)
            .unwrap();
        assert!(compiled.is_valid(&json!(false)));
        assert!(!compiled.is_valid(&json!(0)));
    }

    #[test]
    fn unknown_anchor_is_a_compile_error() {
        let err = CompileOptions::new()
            .offline()
            .compile(&json!({
                "$id": "https://example.com/root.json",
                "$ref": "#nowhere"
            }))
            .unwrap_err();
        assert!(matches!(err, CompileError::UnresolvableRef { .. }));
    }

    #[test]
    fn ids_inside_enum_values_declare_nothing() {
        // The object carrying "$id": "#whoops" is an enum element, not a
        // schema, so the reference has no target.
        let err = CompileOptions::new()
            .offline()
            .compile(&json!({
                "enum": [{ "$id": "#whoops" }],
                "$ref": "#whoops"
            }))
            .unwrap_err();
        assert!(matches!(err, CompileError::UnresolvableRef { .. }));
    }

    #[test]
    fn unjoinable_id_strings_inside_enum_values_still_compile() {
        let compiled = CompileOptions::new()
            .offline()
            .compile(&json!({ "enum": [{ "$id": "http://[" }] }))
            .unwrap();
        assert!(compiled.is_valid(&json!({ "$id": "http://[" })));
        assert!(!compiled.is_valid(&json!({ "$id": "elsewhere" })));
    }
}

mod meta_schemas {
    use super::*;

    #[test]
    fn draft_meta_schema_uris_resolve_without_network() {
        let drafts = [
            (Draft::Draft3, "http://json-schema.org/draft-03/schema#"),
            (Draft::Draft4, "http://json-schema.org/draft-04/schema#"),
            (Draft::Draft6, "http://json-schema.org/draft-06/schema#"),
            (Draft::Draft7, "http://json-schema.org/draft-07/schema#"),
        ];
        for (draft, uri) in drafts {
            let compiled = CompileOptions::new()
                .draft(draft)
                .offline()
                .compile(&json!({ "$ref": uri }))
                .unwrap();
            // A schema about schemas accepts a schema.
            assert!(compiled.is_valid(&json!({ "type": "string" })));
        }
    }

    #[test]
    fn pointer_escaping_in_fragments() {
        let schema = json!({
            "definitions": { "a/b": { "type": "integer" }, "c~d": { "type": "string" } },
            "properties": {
                "x": { "$ref": "#/definitions/a~1b" },
                "y": { "$ref": "#/definitions/c~0d" }
            }
        });
        let compiled = CompileOptions::new().offline().compile(&schema).unwrap();
        assert!(compiled.is_valid(&json!({ "x": 1, "y": "s" })));
        assert!(!compiled.is_valid(&json!({ "x": "1" })));
    }
}
