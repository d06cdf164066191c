//! Draft dialect selection.
//!
//! The four supported drafts share most keywords but differ in a handful of
//! places: the scope keyword (`id` vs `$id`), boolean schemas, the encoding
//! of exclusive bounds, and what counts as an integer. Those differences are
//! decided here and consulted by the keyword compilers; there is no per-draft
//! compiler hierarchy.

use std::sync::OnceLock;

use serde_json::Value;

/// A JSON Schema draft dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Draft {
    Draft3,
    Draft4,
    Draft6,
    Draft7,
}

impl Draft {
    /// Detect the draft from a schema's `$schema` keyword, if declared.
    pub fn detect(schema: &Value) -> Option<Draft> {
        let uri = schema.get("$schema")?.as_str()?;
        Draft::from_uri(uri)
    }

    /// Map a meta-schema URI to a draft. Accepts http/https and an optional
    /// trailing `#`.
    pub fn from_uri(uri: &str) -> Option<Draft> {
        let trimmed = uri
            .trim_end_matches('#')
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        match trimmed {
            "json-schema.org/draft-03/schema" => Some(Draft::Draft3),
            "json-schema.org/draft-04/schema" => Some(Draft::Draft4),
            "json-schema.org/draft-06/schema" => Some(Draft::Draft6),
            "json-schema.org/draft-07/schema" => Some(Draft::Draft7),
            _ => None,
        }
    }

    /// The canonical URI of this draft's meta-schema.
    pub fn meta_schema_uri(self) -> &'static str {
        match self {
            Draft::Draft3 => "http://json-schema.org/draft-03/schema",
            Draft::Draft4 => "http://json-schema.org/draft-04/schema",
            Draft::Draft6 => "http://json-schema.org/draft-06/schema",
            Draft::Draft7 => "http://json-schema.org/draft-07/schema",
        }
    }

    /// The keyword that shifts the resolution scope: `id` through draft 4,
    /// `$id` from draft 6 on.
    pub(crate) fn id_keyword(self) -> &'static str {
        match self {
            Draft::Draft3 | Draft::Draft4 => "id",
            Draft::Draft6 | Draft::Draft7 => "$id",
        }
    }

    /// Draft 6 introduced `true`/`false` as complete schemas.
    pub(crate) fn boolean_schemas(self) -> bool {
        self >= Draft::Draft6
    }

    /// Whether `1.0` satisfies `"type": "integer"`. Draft 4 is the odd one
    /// out: it requires an integer-typed literal, not just a whole value.
    pub(crate) fn integer_accepts_whole_float(self) -> bool {
        self != Draft::Draft4
    }
}

impl std::fmt::Display for Draft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Draft::Draft3 => "draft-03",
            Draft::Draft4 => "draft-04",
            Draft::Draft6 => "draft-06",
            Draft::Draft7 => "draft-07",
        };
        f.write_str(name)
    }
}

/// Returns the embedded meta-schema for a well-known URI, so references to
/// a draft's schema-of-schemas never hit the network.
pub(crate) fn builtin_meta_schema(uri: &str) -> Option<&'static Value> {
    static CELLS: [OnceLock<Value>; 4] = [
        OnceLock::new(),
        OnceLock::new(),
        OnceLock::new(),
        OnceLock::new(),
    ];
    const SOURCES: [&str; 4] = [
        include_str!("metaschemas/draft3.json"),
        include_str!("metaschemas/draft4.json"),
        include_str!("metaschemas/draft6.json"),
        include_str!("metaschemas/draft7.json"),
    ];
    let index = match Draft::from_uri(uri)? {
        Draft::Draft3 => 0,
        Draft::Draft4 => 1,
        Draft::Draft6 => 2,
        Draft::Draft7 => 3,
    };
    Some(CELLS[index].get_or_init(|| {
        serde_json::from_str(SOURCES[index]).expect("embedded meta-schema is valid JSON")
    }))
}
