//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore wraps every value in a single-key object naming its type
//! (`{"stringValue": "latte"}`, `{"integerValue": "42"}`). Records are plain
//! JSON on our side, so this is the only place that knows the wire encoding.
//!
//! Top-level fields named in [`TIMESTAMP_FIELDS`] are written as
//! `timestampValue` when they hold an RFC 3339 string, which keeps dates
//! orderable in the console and readable by the site's JavaScript as
//! `Timestamp` objects. Every other string is a `stringValue`, stored as given.
//! Timestamps read back as RFC 3339 strings in UTC.

use chrono::{DateTime, SecondsFormat};
use serde_json::{Map, Number, Value, json};

use super::FirebaseError;
use crate::store::Fields;

/// Record fields that hold timestamps.
pub const TIMESTAMP_FIELDS: &[&str] = &[
    "createdAt",
    "updatedAt",
    "timestamp",
    "uploadedAt",
    "lastLoginAt",
    "deletedAt",
    "cancelledAt",
];

/// Encode a record's field map as Firestore `fields`.
#[must_use]
pub fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_field(key, value)))
        .collect()
}

fn encode_field(key: &str, value: &Value) -> Value {
    match value {
        Value::String(s)
            if TIMESTAMP_FIELDS.contains(&key) && DateTime::parse_from_rfc3339(s).is_ok() =>
        {
            json!({ "timestampValue": s })
        }
        _ => encode(value),
    }
}

fn encode_map(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (key.clone(), encode(value)))
        .collect()
}

/// Decode Firestore `fields` into a plain field map.
///
/// # Errors
///
/// Returns `FirebaseError::InvalidValue` for a value with no known type key.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Fields, FirebaseError> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode(value)?)))
        .collect()
}

/// Encode one JSON value. Strings are always `stringValue`.
#[must_use]
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => n.as_i64().map_or_else(
            || json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
            |i| json!({ "integerValue": i.to_string() }),
        ),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => {
            json!({ "mapValue": { "fields": encode_map(map) } })
        }
    }
}

/// Decode one Firestore value.
///
/// # Errors
///
/// Returns `FirebaseError::InvalidValue` for an unknown or malformed value.
pub fn decode(value: &Value) -> Result<Value, FirebaseError> {
    let invalid = || FirebaseError::InvalidValue(value.to_string());
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(invalid());
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner.as_bool().map(Value::Bool).ok_or_else(invalid),
        // Integers arrive as strings.
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .or_else(|| inner.as_i64())
            .map(|i| Value::Number(i.into()))
            .ok_or_else(invalid),
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(invalid),
        "timestampValue" => {
            let raw = inner.as_str().ok_or_else(invalid)?;
            let parsed = DateTime::parse_from_rfc3339(raw).map_err(|_| invalid())?;
            Ok(Value::String(
                parsed.to_utc().to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ))
        }
        "stringValue" | "referenceValue" | "bytesValue" => {
            inner.as_str().map(|s| Value::String(s.to_owned())).ok_or_else(invalid)
        }
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Object(fields))
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(encode(&json!(true)), json!({ "booleanValue": true }));
        assert_eq!(encode(&json!(12)), json!({ "integerValue": "12" }));
        assert_eq!(encode(&json!(4.5)), json!({ "doubleValue": 4.5 }));
        assert_eq!(encode(&json!("latte")), json!({ "stringValue": "latte" }));
        assert_eq!(encode(&Value::Null), json!({ "nullValue": null }));
    }

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => Fields::new(),
        }
    }

    #[test]
    fn test_timestamp_fields_written_as_timestamp_values() {
        let encoded = encode_fields(&fields(json!({
            "createdAt": "2026-10-19T08:30:00Z",
            "cancelledAt": "2026-10-19T09:00:00Z",
            "pickupDate": "2026-10-19",
        })));
        assert_eq!(
            Value::Object(encoded),
            json!({
                "createdAt": { "timestampValue": "2026-10-19T08:30:00Z" },
                "cancelledAt": { "timestampValue": "2026-10-19T09:00:00Z" },
                "pickupDate": { "stringValue": "2026-10-19" },
            })
        );
    }

    #[test]
    fn test_date_like_text_is_stored_verbatim() {
        let text = "2026-10-19T08:30:00+08:00";
        let encoded = encode_fields(&fields(json!({
            "title": text,
            "body": { "createdAt": text },
        })));
        assert_eq!(encoded["title"], json!({ "stringValue": text }));

        let decoded = decode_fields(&encoded).unwrap();
        assert_eq!(decoded["title"], text);
        assert_eq!(decoded["body"]["createdAt"], text);
        assert_eq!(decode(&encode(&json!(text))).unwrap(), text);
    }

    #[test]
    fn test_decode_document_fields() {
        let fields = json!({
            "name": { "stringValue": "Spanish Latte" },
            "price": { "doubleValue": 6.25 },
            "views": { "integerValue": "31" },
            "available": { "booleanValue": true },
            "createdAt": { "timestampValue": "2026-10-19T08:30:00.123456Z" },
            "items": { "arrayValue": { "values": [
                { "mapValue": { "fields": { "quantity": { "integerValue": "2" } } } }
            ] } },
            "tags": { "arrayValue": {} }
        });
        let decoded = decode_fields(fields.as_object().unwrap()).unwrap();
        assert_eq!(
            Value::Object(decoded),
            json!({
                "name": "Spanish Latte",
                "price": 6.25,
                "views": 31,
                "available": true,
                "createdAt": "2026-10-19T08:30:00.123456Z",
                "items": [{ "quantity": 2 }],
                "tags": []
            })
        );
    }

    #[test]
    fn test_nested_map_encoding() {
        let encoded = encode(&json!({ "socialMedia": { "facebook": "" } }));
        assert_eq!(
            encoded,
            json!({ "mapValue": { "fields": {
                "socialMedia": { "mapValue": { "fields": {
                    "facebook": { "stringValue": "" }
                } } }
            } } })
        );
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(decode(&json!({ "mysteryValue": 1 })).is_err());
        assert!(decode(&json!("bare")).is_err());
    }
}
