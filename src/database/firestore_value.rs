//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore REST documents wrap every value in a single-key object naming
//! its type (`{"stringValue": "x"}`, `{"integerValue": "42"}`, ...). Integers
//! travel as decimal strings.

use serde_json::{json, Map, Value as JsonValue};

use crate::error::{Error, Result};

pub fn to_firestore_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Null => json!({ "nullValue": null }),
        JsonValue::Bool(b) => json!({ "booleanValue": b }),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        JsonValue::String(s) => json!({ "stringValue": s }),
        JsonValue::Array(items) => {
            if items.is_empty() {
                json!({ "arrayValue": {} })
            } else {
                let values: Vec<JsonValue> = items.iter().map(to_firestore_value).collect();
                json!({ "arrayValue": { "values": values } })
            }
        }
        JsonValue::Object(map) => json!({ "mapValue": { "fields": to_firestore_fields(map) } }),
    }
}

pub fn to_firestore_fields(map: &Map<String, JsonValue>) -> JsonValue {
    let fields: Map<String, JsonValue> = map
        .iter()
        .map(|(k, v)| (k.clone(), to_firestore_value(v)))
        .collect();
    JsonValue::Object(fields)
}

pub fn from_firestore_value(value: &JsonValue) -> Result<JsonValue> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::Store("Firestore value is not an object".to_string()))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| Error::Store("Empty Firestore value".to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(JsonValue::Null),
        "booleanValue" => Ok(JsonValue::Bool(inner.as_bool().unwrap_or(false))),
        "integerValue" => {
            let n = match inner {
                JsonValue::String(s) => s
                    .parse::<i64>()
                    .map_err(|e| Error::Store(format!("Bad integerValue {}: {}", s, e)))?,
                JsonValue::Number(n) => n
                    .as_i64()
                    .ok_or_else(|| Error::Store(format!("Bad integerValue {}", n)))?,
                other => return Err(Error::Store(format!("Bad integerValue {}", other))),
            };
            Ok(json!(n))
        }
        "doubleValue" => Ok(json!(inner.as_f64().unwrap_or_default())),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().map(from_firestore_value).collect::<Result<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            Ok(JsonValue::Array(values))
        }
        "mapValue" => match inner.get("fields") {
            Some(fields) => from_firestore_fields(fields),
            None => Ok(JsonValue::Object(Map::new())),
        },
        "geoPointValue" => Ok(inner.clone()),
        other => Err(Error::Store(format!("Unsupported Firestore value type {}", other))),
    }
}

pub fn from_firestore_fields(fields: &JsonValue) -> Result<JsonValue> {
    let map = fields
        .as_object()
        .ok_or_else(|| Error::Store("Firestore fields is not an object".to_string()))?;
    let mut out = Map::with_capacity(map.len());
    for (k, v) in map {
        out.insert(k.clone(), from_firestore_value(v)?);
    }
    Ok(JsonValue::Object(out))
}

/// Document id from a full resource name
/// (`projects/p/databases/(default)/documents/opportunities/<id>`).
pub fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_nested_opportunity_shape() {
        let doc = json!({
            "title": "Photography Prize",
            "payment": { "currency": "USD", "total": 1500 },
            "tags": ["Photography", "Visual Arts"],
            "deliverables": [],
            "linkVerified": true
        });
        let fields = to_firestore_fields(doc.as_object().unwrap());

        assert_eq!(fields["title"], json!({ "stringValue": "Photography Prize" }));
        assert_eq!(
            fields["payment"]["mapValue"]["fields"]["total"],
            json!({ "integerValue": "1500" })
        );
        assert_eq!(
            fields["tags"]["arrayValue"]["values"][1],
            json!({ "stringValue": "Visual Arts" })
        );
        assert_eq!(fields["deliverables"], json!({ "arrayValue": {} }));
        assert_eq!(fields["linkVerified"], json!({ "booleanValue": true }));

        assert_eq!(from_firestore_fields(&fields).unwrap(), doc);
    }

    #[test]
    fn decodes_server_only_types() {
        let fields = json!({
            "createdAt": { "timestampValue": "2026-10-18T09:30:00Z" },
            "score": { "doubleValue": 0.5 },
            "notes": { "nullValue": null }
        });
        let plain = from_firestore_fields(&fields).unwrap();
        assert_eq!(plain["createdAt"], "2026-10-18T09:30:00Z");
        assert_eq!(plain["score"], 0.5);
        assert!(plain["notes"].is_null());
    }

    #[test]
    fn rejects_garbage_integers() {
        let bad = json!({ "integerValue": "lots" });
        assert!(from_firestore_value(&bad).is_err());
    }

    #[test]
    fn extracts_document_id_from_resource_name() {
        let name = "projects/p/databases/(default)/documents/opportunities/AbC123";
        assert_eq!(document_id(name), Some("AbC123"));
        assert_eq!(document_id("trailing/"), None);
    }
}
