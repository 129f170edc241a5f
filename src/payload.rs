//! # Upstream payloads
//! Records returned by the two ML services. The dashboard core only cares whether
//! they are present; the fields are typed so consumers get a stable shape, and
//! anything unknown is kept verbatim in `extra`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::transport::{FetchError, RawPayload};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTrendsPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,
    #[serde(default)]
    pub predictions: Vec<Value>,
    #[serde(default)]
    pub models: Vec<Value>,
    #[serde(default)]
    pub analytics: Value,
    /// Chart-ready series.
    #[serde(default)]
    pub charts: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,
    #[serde(default, alias = "promotions")]
    pub active_promotions: Vec<Value>,
    #[serde(default)]
    pub models: Vec<Value>,
    #[serde(default)]
    pub analytics: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A typed upstream record. `KNOWN_FIELDS` lists the wire keys that identify it;
/// a body carrying none of them is not this record, whatever else it holds.
pub trait UpstreamPayload: DeserializeOwned {
    const KNOWN_FIELDS: &'static [&'static str];
}

impl UpstreamPayload for ServiceTrendsPayload {
    const KNOWN_FIELDS: &'static [&'static str] =
        &["businessId", "predictions", "models", "analytics", "charts"];
}

impl UpstreamPayload for PromotionPayload {
    const KNOWN_FIELDS: &'static [&'static str] = &[
        "businessId",
        "activePromotions",
        "promotions",
        "models",
        "analytics",
    ];
}

/// Decode a raw upstream body into a typed payload.
///
/// Some deployments wrap the record as `{ "success": true, "data": { … } }`. Only an
/// object with a `success` key is treated as an envelope; anything else is decoded
/// as the bare record, so a record's own `data` field stays in `extra`.
pub fn decode_payload<T: UpstreamPayload>(raw: RawPayload) -> Result<T, FetchError> {
    let mut obj = match raw {
        Value::Object(obj) => obj,
        other => {
            return Err(FetchError::decode(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            )))
        }
    };

    if obj.contains_key("success") {
        if obj.get("success") != Some(&Value::Bool(true)) {
            let reason = obj
                .get("error")
                .or_else(|| obj.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("no reason given");
            return Err(FetchError::decode(format!(
                "upstream reported failure: {reason}"
            )));
        }
        obj = match obj.remove("data") {
            Some(Value::Object(inner)) => inner,
            Some(other) => {
                return Err(FetchError::decode(format!(
                    "envelope data must be an object, got {}",
                    json_type_name(&other)
                )))
            }
            None => return Err(FetchError::decode("envelope has no data")),
        };
    }

    if !T::KNOWN_FIELDS.iter().any(|k| obj.contains_key(*k)) {
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.truncate(8);
        return Err(FetchError::decode(format!(
            "payload has none of the expected fields (got {keys:?})"
        )));
    }

    serde_json::from_value::<T>(Value::Object(obj)).map_err(|e| {
        FetchError::decode(format!("payload does not match expected shape: {e}"))
    })
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
