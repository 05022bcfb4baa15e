//! Parsing of organic results out of SERP JSON.

use serde_json::Value;

use rag_core::WebResult;

/// Which JSON keys hold each result field, in fallback order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldMap {
    pub title: &'static [&'static str],
    pub url: &'static [&'static str],
    pub snippet: &'static [&'static str],
}

/// Read at most `limit` results from the `organic` array.
///
/// An absent, null or non-array `organic` yields no results. Missing fields
/// become empty strings.
pub(crate) fn parse_organic(body: &Value, fields: &FieldMap, limit: usize) -> Vec<WebResult> {
    let Some(organic) = body.get("organic").and_then(Value::as_array) else {
        return Vec::new();
    };

    organic
        .iter()
        .take(limit)
        .map(|item| WebResult {
            title: first_text(item, fields.title),
            url: first_text(item, fields.url),
            snippet: first_text(item, fields.snippet),
        })
        .collect()
}

/// First non-empty string among `keys`.
fn first_text(item: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}
