use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::identity::SYNC_FIELD;
use crate::item::VaultItem;

/// Store-managed metadata that never participates in equality comparison.
pub const IGNORED_FIELDS: &[&str] = &[
    "id",
    "revisionDate",
    "creationDate",
    "deletedDate",
    "organizationId",
];

/// Login keys that change between runs without any semantic edit.
const VOLATILE_LOGIN_FIELDS: &[&str] = &["passwordRevisionDate", "totp"];

/// Produce the canonical comparison projection of an item.
///
/// The result is a JSON tree with no nulls, no store metadata, no volatile
/// login fields, no `sync_id` entry, and deterministically ordered nested
/// collections. Two items with the same semantic content always project to
/// structurally identical trees, regardless of store-assigned ordering.
/// The projection is used only for equality and is never persisted.
pub fn normalize(item: &VaultItem) -> Result<Value> {
    let tree = serde_json::to_value(item).context("Failed to project vault item to JSON")?;
    Ok(normalize_tree(tree))
}

/// Canonicalize an already-projected JSON tree. Idempotent.
pub fn normalize_tree(tree: Value) -> Value {
    let mut obj = match tree {
        Value::Object(obj) => obj,
        mut other => {
            scrub_nulls(&mut other);
            return other;
        }
    };

    for key in IGNORED_FIELDS {
        obj.remove(*key);
    }

    if let Some(Value::Object(login)) = obj.get_mut("login") {
        for key in VOLATILE_LOGIN_FIELDS {
            login.remove(*key);
        }
        let uris = match login.remove("uris") {
            Some(Value::Array(list)) => list,
            _ => Vec::new(),
        };
        login.insert("uris".to_string(), Value::Array(canonical_uris(uris)));
    }

    let fields = match obj.remove("fields") {
        Some(Value::Array(list)) => list,
        _ => Vec::new(),
    };
    obj.insert("fields".to_string(), Value::Array(canonical_fields(fields)));

    if obj.get("notes").map_or(true, Value::is_null) {
        obj.insert("notes".to_string(), Value::String(String::new()));
    }

    let mut tree = Value::Object(obj);
    scrub_nulls(&mut tree);
    tree
}

/// Rebuild a URI list for comparison: each entry keeps only the URI
/// (trimmed, lowercased), the match kind (default 0), and the port
/// (default empty), sorted by `(uri, match)`.
fn canonical_uris(uris: Vec<Value>) -> Vec<Value> {
    let mut rebuilt: Vec<Value> = uris
        .into_iter()
        .map(|entry| {
            let uri = entry
                .get("uri")
                .and_then(Value::as_str)
                .unwrap_or("")
                .trim()
                .to_lowercase();
            let match_kind = entry.get("match").and_then(Value::as_i64).unwrap_or(0);
            let port = entry
                .get("port")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            json!({ "uri": uri, "match": match_kind, "port": port })
        })
        .collect();

    rebuilt.sort_by(|a, b| uri_sort_key(a).cmp(&uri_sort_key(b)));
    rebuilt
}

fn uri_sort_key(entry: &Value) -> (String, i64) {
    (
        entry
            .get("uri")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        entry.get("match").and_then(Value::as_i64).unwrap_or(0),
    )
}

/// Drop the `sync_id` entry, coerce null values to empty, sort by name.
fn canonical_fields(fields: Vec<Value>) -> Vec<Value> {
    let mut kept: Vec<Value> = fields
        .into_iter()
        .filter(|f| f.get("name").and_then(Value::as_str) != Some(SYNC_FIELD))
        .map(|mut f| {
            if let Some(obj) = f.as_object_mut() {
                if obj.get("value").map_or(true, Value::is_null) {
                    obj.insert("value".to_string(), Value::String(String::new()));
                }
            }
            f
        })
        .collect();

    kept.sort_by_key(field_name);
    kept
}

fn field_name(entry: &Value) -> String {
    entry
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// Recursively replace every null with an empty string, at any depth.
fn scrub_nulls(value: &mut Value) {
    match value {
        Value::Null => *value = Value::String(String::new()),
        Value::Array(items) => items.iter_mut().for_each(scrub_nulls),
        Value::Object(map) => map.values_mut().for_each(scrub_nulls),
        _ => {}
    }
}
