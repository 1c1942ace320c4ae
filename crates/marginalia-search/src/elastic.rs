//! Elasticsearch (1.x query DSL) rendering of compiled queries.
//!
//! | Clause | Rendered as |
//! |--------|-------------|
//! | `MatchAll` | `{"match_all": {}}` |
//! | `MatchField` | `{"match": {field: value}}` |
//! | `MatchMulti` | `{"multi_match": {"fields", "query", "type": "cross_fields"}}` |
//! | `TermExact` | `{"term": {field: value}}` |
//! | `Not` | `{"not": clause}` |
//! | `BoolAny` | `{"bool": {"should": [...]}}` |
//! | `BoolAll` | `{"and": [...]}` |
//! | `QueryFilter` | `{"query": clause}` |
//! | `Filtered` | `{"filtered": {"filter": {"and": [...]}, "query": clause}}` |

use serde_json::{json, Map, Value as JsonValue};

use marginalia_core::{Annotation, Clause, Error, Result, SearchQuery, SearchResults};

/// Full request body: pagination, sort and query.
pub fn to_json(query: &SearchQuery) -> JsonValue {
    let mut sort = Map::new();
    sort.insert(
        query.sort.field.clone(),
        json!({
            "ignore_unmapped": query.sort.ignore_unmapped,
            "order": query.sort.order,
        }),
    );

    json!({
        "from": query.offset,
        "size": query.size,
        "sort": [sort],
        "query": clause_to_json(&query.query),
    })
}

/// Render one clause tree.
pub fn clause_to_json(clause: &Clause) -> JsonValue {
    match clause {
        Clause::MatchAll => json!({ "match_all": {} }),
        Clause::MatchField { field, value } => json!({ "match": keyed(field, json!(value)) }),
        Clause::MatchMulti { fields, values } => json!({
            "multi_match": {
                "fields": fields,
                "query": values,
                "type": "cross_fields",
            }
        }),
        Clause::TermExact { field, value } => json!({ "term": keyed(field, value.clone()) }),
        Clause::Not { clause } => json!({ "not": clause_to_json(clause) }),
        Clause::BoolAny { clauses } => json!({ "bool": { "should": render_all(clauses) } }),
        Clause::BoolAll { clauses } => json!({ "and": render_all(clauses) }),
        Clause::QueryFilter { query } => json!({ "query": clause_to_json(query) }),
        Clause::Filtered { filter, query } => json!({
            "filtered": {
                "filter": { "and": render_all(filter) },
                "query": clause_to_json(query),
            }
        }),
    }
}

fn keyed(key: &str, value: JsonValue) -> JsonValue {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    JsonValue::Object(map)
}

fn render_all(clauses: &[Clause]) -> Vec<JsonValue> {
    clauses.iter().map(clause_to_json).collect()
}

/// Parse a search response body into results.
///
/// Each hit's `_source` becomes an annotation; its `_id` fills in `id` when
/// the source lacks one.
pub fn from_response(body: &JsonValue) -> Result<SearchResults> {
    let hits = body
        .get("hits")
        .ok_or_else(|| Error::Backend("search response has no hits".to_string()))?;

    let total = match hits.get("total") {
        Some(JsonValue::Number(n)) => n.as_u64().unwrap_or(0),
        // Newer servers report {"value": n, "relation": ...}
        Some(JsonValue::Object(o)) => o.get("value").and_then(JsonValue::as_u64).unwrap_or(0),
        _ => 0,
    };

    let rows = hits
        .get("hits")
        .and_then(JsonValue::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(hit_to_annotation)
        .collect::<Result<Vec<_>>>()?;

    Ok(SearchResults { total, rows })
}

fn hit_to_annotation(hit: &JsonValue) -> Result<Annotation> {
    let mut source = match hit.get("_source") {
        Some(JsonValue::Object(source)) => source.clone(),
        _ => Map::new(),
    };
    if let Some(id) = hit.get("_id") {
        source.entry("id").or_insert_with(|| id.clone());
    }
    Ok(serde_json::from_value(JsonValue::Object(source))?)
}
