//! Integration tests for draft-specific keyword dialects.

use draftschema::{compile, CompileOptions, Draft};
use serde_json::json;

fn compiled(draft: Draft, schema: serde_json::Value) -> draftschema::CompiledSchema {
    CompileOptions::new().draft(draft).compile(&schema).unwrap()
}

mod detection {
    use super::*;

    #[test]
    fn dialect_comes_from_the_schema_keyword() {
        let cases = [
            ("http://json-schema.org/draft-03/schema#", Draft::Draft3),
            ("http://json-schema.org/draft-04/schema#", Draft::Draft4),
            ("http://json-schema.org/draft-06/schema", Draft::Draft6),
            ("https://json-schema.org/draft-07/schema#", Draft::Draft7),
        ];
        for (uri, expected) in cases {
            let schema = json!({ "$schema": uri });
            assert_eq!(compile(&schema).unwrap().draft(), expected);
        }
    }

    #[test]
    fn missing_schema_keyword_defaults_to_draft_7() {
        assert_eq!(compile(&json!({})).unwrap().draft(), Draft::Draft7);
    }

    #[test]
    fn explicit_draft_wins_over_detection() {
        let schema = json!({ "$schema": "http://json-schema.org/draft-04/schema#" });
        let forced = CompileOptions::new()
            .draft(Draft::Draft7)
            .compile(&schema)
            .unwrap();
        assert_eq!(forced.draft(), Draft::Draft7);
    }
}

mod draft_3 {
    use super::*;

    #[test]
    fn type_any_accepts_everything() {
        let v = compiled(Draft::Draft3, json!({ "type": "any" }));
        for instance in [json!(null), json!(1), json!("s"), json!([]), json!({})] {
            assert!(v.is_valid(&instance));
        }
    }

    #[test]
    fn type_union_may_embed_schemas() {
        let v = compiled(
            Draft::Draft3,
            json!({ "type": ["string", { "type": "object", "properties": { "n": { "type": "integer" } } }] }),
        );
        assert!(v.is_valid(&json!("text")));
        assert!(v.is_valid(&json!({ "n": 4 })));
        assert!(!v.is_valid(&json!({ "n": "4" })));
        assert!(!v.is_valid(&json!(7)));
    }

    #[test]
    fn required_is_a_flag_inside_the_property() {
        let v = compiled(
            Draft::Draft3,
            json!({ "properties": { "name": { "type": "string", "required": true } } }),
        );
        assert!(v.is_valid(&json!({ "name": "x" })));
        assert!(!v.is_valid(&json!({})));
    }

    #[test]
    fn dependencies_accept_a_single_property_name() {
        let v = compiled(Draft::Draft3, json!({ "dependencies": { "b": "a" } }));
        assert!(v.is_valid(&json!({ "a": 1, "b": 2 })));
        assert!(!v.is_valid(&json!({ "b": 2 })));
    }

    #[test]
    fn divisible_by_is_the_multiple_of_of_draft_3() {
        let v = compiled(Draft::Draft3, json!({ "divisibleBy": 2 }));
        assert!(v.is_valid(&json!(4)));
        assert!(!v.is_valid(&json!(5)));
    }

    #[test]
    fn disallow_rejects_matching_types() {
        let v = compiled(Draft::Draft3, json!({ "disallow": ["string", "null"] }));
        assert!(!v.is_valid(&json!("no")));
        assert!(!v.is_valid(&json!(null)));
        assert!(v.is_valid(&json!(1)));
    }

    #[test]
    fn extends_composes_like_all_of() {
        let v = compiled(
            Draft::Draft3,
            json!({ "extends": { "minimum": 2 }, "maximum": 5 }),
        );
        assert!(v.is_valid(&json!(3)));
        assert!(!v.is_valid(&json!(1)));
        assert!(!v.is_valid(&json!(6)));

        let v = compiled(
            Draft::Draft3,
            json!({ "extends": [{ "minimum": 2 }, { "maximum": 5 }] }),
        );
        assert!(v.is_valid(&json!(3)));
        assert!(!v.is_valid(&json!(6)));
    }

    #[test]
    fn boolean_exclusive_bounds() {
        let v = compiled(
            Draft::Draft3,
            json!({ "minimum": 1, "exclusiveMinimum": true }),
        );
        assert!(!v.is_valid(&json!(1)));
        assert!(v.is_valid(&json!(1.01)));
    }
}

mod draft_4 {
    use super::*;

    #[test]
    fn integer_rejects_whole_floats() {
        let v = compiled(Draft::Draft4, json!({ "type": "integer" }));
        assert!(v.is_valid(&json!(1)));
        assert!(!v.is_valid(&json!(1.0)));
    }

    #[test]
    fn later_drafts_accept_whole_floats_as_integers() {
        for draft in [Draft::Draft6, Draft::Draft7] {
            let v = compiled(draft, json!({ "type": "integer" }));
            assert!(v.is_valid(&json!(1)));
            assert!(v.is_valid(&json!(1.0)));
            assert!(!v.is_valid(&json!(1.5)));
        }
    }

    #[test]
    fn one_of_demands_exactly_one_branch() {
        let v = compiled(
            Draft::Draft4,
            json!({ "oneOf": [{ "multipleOf": 3 }, { "multipleOf": 5 }] }),
        );
        assert!(v.is_valid(&json!(9)));
        assert!(v.is_valid(&json!(10)));
        assert!(!v.is_valid(&json!(15)));
        assert!(!v.is_valid(&json!(2)));
    }

    #[test]
    fn not_inverts_the_inner_schema() {
        let v = compiled(Draft::Draft4, json!({ "not": { "type": "string" } }));
        assert!(v.is_valid(&json!(1)));
        assert!(!v.is_valid(&json!("s")));
    }
}

mod draft_6 {
    use super::*;

    #[test]
    fn const_pins_one_value() {
        let v = compiled(Draft::Draft6, json!({ "const": { "k": [1, 2.0] } }));
        assert!(v.is_valid(&json!({ "k": [1, 2] })));
        assert!(!v.is_valid(&json!({ "k": [2, 1] })));
        assert!(!v.is_valid(&json!({ "k": [1, 2], "extra": 0 })));
    }

    #[test]
    fn const_is_not_a_keyword_before_draft_6() {
        let v = compiled(Draft::Draft4, json!({ "const": 1 }));
        assert!(v.is_valid(&json!(2)));
    }

    #[test]
    fn contains_needs_one_matching_element() {
        let v = compiled(Draft::Draft6, json!({ "contains": { "type": "integer" } }));
        assert!(v.is_valid(&json!(["a", 3, "b"])));
        assert!(!v.is_valid(&json!(["a", "b"])));
        assert!(!v.is_valid(&json!([])));
        // Non-arrays are out of scope.
        assert!(v.is_valid(&json!("abc")));
    }

    #[test]
    fn property_names_constrain_the_keys() {
        let v = compiled(Draft::Draft6, json!({ "propertyNames": { "maxLength": 3 } }));
        assert!(v.is_valid(&json!({ "abc": 1 })));
        assert!(!v.is_valid(&json!({ "abcd": 1 })));
    }

    #[test]
    fn boolean_dependencies() {
        let v = compiled(Draft::Draft6, json!({ "dependencies": { "a": false } }));
        assert!(v.is_valid(&json!({ "b": 1 })));
        assert!(!v.is_valid(&json!({ "a": 1 })));
    }
}

mod draft_7 {
    use super::*;

    #[test]
    fn if_then_else_picks_the_matching_arm() {
        let v = compiled(
            Draft::Draft7,
            json!({
                "if": { "type": "integer" },
                "then": { "minimum": 0 },
                "else": { "maxLength": 2 }
            }),
        );
        assert!(v.is_valid(&json!(5)));
        assert!(!v.is_valid(&json!(-5)));
        assert!(v.is_valid(&json!("ab")));
        assert!(!v.is_valid(&json!("abc")));
    }

    #[test]
    fn then_without_if_is_inert() {
        let v = compiled(Draft::Draft7, json!({ "then": { "minimum": 100 } }));
        assert!(v.is_valid(&json!(1)));
    }

    #[test]
    fn if_without_then_or_else_accepts() {
        let v = compiled(Draft::Draft7, json!({ "if": { "type": "string" } }));
        assert!(v.is_valid(&json!("s")));
        assert!(v.is_valid(&json!(1)));
    }

    #[test]
    fn conditional_is_not_a_keyword_before_draft_7() {
        let v = compiled(
            Draft::Draft6,
            json!({ "if": { "type": "integer" }, "then": { "minimum": 0 } }),
        );
        assert!(v.is_valid(&json!(-5)));
    }
}

mod tuples {
    use super::*;

    #[test]
    fn tuple_items_with_additional_items() {
        let v = compiled(
            Draft::Draft7,
            json!({
                "items": [{ "type": "string" }, { "type": "integer" }],
                "additionalItems": { "type": "boolean" }
            }),
        );
        assert!(v.is_valid(&json!(["a", 1])));
        assert!(v.is_valid(&json!(["a", 1, true, false])));
        assert!(!v.is_valid(&json!(["a", 1, "extra"])));
        assert!(!v.is_valid(&json!([1, 1])));
        // Shorter than the tuple is fine.
        assert!(v.is_valid(&json!(["a"])));
    }

    #[test]
    fn additional_items_ignored_for_single_schema_items() {
        let v = compiled(
            Draft::Draft7,
            json!({ "items": { "type": "integer" }, "additionalItems": false }),
        );
        assert!(v.is_valid(&json!([1, 2, 3, 4])));
    }
}

mod pattern_properties {
    use super::*;

    #[test]
    fn matched_names_escape_additional_properties() {
        let v = compiled(
            Draft::Draft7,
            json!({
                "properties": { "name": { "type": "string" } },
                "patternProperties": { "^x-": {} },
                "additionalProperties": false
            }),
        );
        assert!(v.is_valid(&json!({ "name": "a", "x-custom": 42 })));
        assert!(!v.is_valid(&json!({ "other": 1 })));
    }

    #[test]
    fn pattern_and_named_schemas_both_apply() {
        let v = compiled(
            Draft::Draft7,
            json!({
                "properties": { "n1": { "minimum": 0 } },
                "patternProperties": { "^n": { "type": "number" } }
            }),
        );
        assert!(v.is_valid(&json!({ "n1": 5 })));
        assert!(!v.is_valid(&json!({ "n1": -5 })));
        assert!(!v.is_valid(&json!({ "n1": "5" })));
        assert!(!v.is_valid(&json!({ "n2": "x" })));
    }
}
