//! Conversions between JSON payloads and DynamoDB attribute values.

use aws_sdk_dynamodb::types::AttributeValue;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use super::{StoredSession, EXPIRES_ATTRIBUTE};
use crate::config::TableConfig;
use crate::error::SessionError;

/// Convert a JSON value to the attribute value DynamoDB stores for it.
///
/// Objects become maps (`M`), arrays lists (`L`), numbers `N`.
pub fn value_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(value_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), value_to_attribute(v)))
                .collect(),
        ),
    }
}

/// Convert an attribute value back to JSON.
///
/// Sets come back as arrays and binary values as base64 strings.
pub fn attribute_to_value(attribute: &AttributeValue) -> Result<Value, SessionError> {
    let value = match attribute {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(n) => parse_number(n)?,
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::B(blob) => Value::String(STANDARD.encode(blob.as_ref())),
        AttributeValue::L(items) => Value::Array(
            items
                .iter()
                .map(attribute_to_value)
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| attribute_to_value(v).map(|value| (k.clone(), value)))
                .collect::<Result<Map<_, _>, _>>()?,
        ),
        AttributeValue::Ss(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(items) => Value::Array(
            items
                .iter()
                .map(|n| parse_number(n))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::Bs(items) => Value::Array(
            items
                .iter()
                .map(|blob| Value::String(STANDARD.encode(blob.as_ref())))
                .collect(),
        ),
        other => {
            return Err(SessionError::Malformed(format!(
                "unsupported attribute value: {:?}",
                other
            )))
        }
    };
    Ok(value)
}

fn parse_number(n: &str) -> Result<Value, SessionError> {
    if let Ok(i) = n.parse::<i64>() {
        return Ok(Value::from(i));
    }
    if let Ok(u) = n.parse::<u64>() {
        return Ok(Value::from(u));
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| SessionError::Malformed(format!("invalid number `{}`", n)))
}

/// Parse the `expires` attribute; DynamoDB numbers may carry a fraction.
fn parse_expires(attribute: &AttributeValue) -> Result<i64, SessionError> {
    let n = attribute
        .as_n()
        .map_err(|_| SessionError::Malformed(format!("`{}` is not a number", EXPIRES_ATTRIBUTE)))?;
    n.parse::<i64>()
        .or_else(|_| n.parse::<f64>().map(|f| f.trunc() as i64))
        .map_err(|_| {
            SessionError::Malformed(format!("`{}` is not a number: {}", EXPIRES_ATTRIBUTE, n))
        })
}

/// Build a [`StoredSession`] from a raw item
pub(crate) fn stored_session_from_item(
    table: &TableConfig,
    item: &HashMap<String, AttributeValue>,
) -> Result<StoredSession, SessionError> {
    let data = item
        .get(&table.data_attribute)
        .ok_or_else(|| {
            SessionError::Malformed(format!("missing `{}` attribute", table.data_attribute))
        })
        .and_then(attribute_to_value)?;
    let expires = item.get(EXPIRES_ATTRIBUTE).map(parse_expires).transpose()?;

    Ok(StoredSession { data, expires })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreOptions;
    use aws_sdk_dynamodb::primitives::Blob;
    use serde_json::json;

    #[test]
    fn test_session_payload_survives_conversion() {
        let payload = json!({
            "cookie": { "originalMaxAge": 86400000, "httpOnly": true, "path": "/" },
            "updated": 1700000000123_i64,
            "cart": [1, 2.5, "three", null, { "nested": false }]
        });

        let attribute = value_to_attribute(&payload);
        assert!(matches!(attribute, AttributeValue::M(_)));
        assert_eq!(attribute_to_value(&attribute).unwrap(), payload);
    }

    #[test]
    fn test_sets_and_binary_read_back() {
        let ss = AttributeValue::Ss(vec!["a".into(), "b".into()]);
        assert_eq!(attribute_to_value(&ss).unwrap(), json!(["a", "b"]));

        let ns = AttributeValue::Ns(vec!["1".into(), "1.5".into()]);
        assert_eq!(attribute_to_value(&ns).unwrap(), json!([1, 1.5]));

        let b = AttributeValue::B(Blob::new(b"hi".to_vec()));
        assert_eq!(attribute_to_value(&b).unwrap(), json!("aGk="));
    }

    #[test]
    fn test_bad_number_is_malformed() {
        let err = attribute_to_value(&AttributeValue::N("twelve".into())).unwrap_err();
        assert!(matches!(err, SessionError::Malformed(_)));
    }

    #[test]
    fn test_stored_session_from_item() {
        let table = StoreOptions::new().resolve().unwrap().table;
        let mut item = HashMap::new();
        item.insert("id".to_string(), AttributeValue::S("sess_abc".into()));
        item.insert("sess".to_string(), value_to_attribute(&json!({ "user": "alice" })));
        item.insert("expires".to_string(), AttributeValue::N("1700000000".into()));

        let stored = stored_session_from_item(&table, &item).unwrap();
        assert_eq!(stored.data, json!({ "user": "alice" }));
        assert_eq!(stored.expires, Some(1_700_000_000));

        item.insert("expires".to_string(), AttributeValue::S("soon".into()));
        assert!(stored_session_from_item(&table, &item).is_err());

        item.remove("expires");
        assert_eq!(stored_session_from_item(&table, &item).unwrap().expires, None);
    }
}
