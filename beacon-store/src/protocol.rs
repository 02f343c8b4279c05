//! Wire protocol: one JSON object per line over TCP.
//!
//! Request:  `{"method": "POST", "path": "/save", "body": {...}}`
//! Response: `{"status": 200, "body": {"message": "State saved successfully"}}`
//!
//! Bodies and status codes follow the HTTP endpoints the agent was first
//! written against, so the same payloads work behind either transport.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const LOAD_PATH: &str = "/load";
pub const SAVE_PATH: &str = "/save";

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_METHOD_NOT_ALLOWED: u16 = 405;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

pub const MSG_SAVED: &str = "State saved successfully";
pub const MSG_INVALID_INPUT: &str = "Invalid input";
pub const MSG_METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const MSG_SAVE_FAILED: &str = "Error saving state";
pub const MSG_NO_STATE: &str = "No state found";
pub const MSG_UNKNOWN_PATH: &str = "Not found";

/// Row type for weight matrices.
pub const KIND_WEIGHT: &str = "weight";
/// Row type for bias vectors.
pub const KIND_BIAS: &str = "bias";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: Method,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl Request {
    pub fn load() -> Self {
        Self {
            method: Method::Get,
            path: LOAD_PATH.to_string(),
            body: None,
        }
    }

    pub fn save(body: Value) -> Self {
        Self {
            method: Method::Post,
            path: SAVE_PATH.to_string(),
            body: Some(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn message(status: u16, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "message": message }),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// The `message` field of the body, if present.
    pub fn message_text(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

/// The `"metadata"` layer tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetadataTag {
    #[serde(rename = "metadata")]
    Metadata,
}

/// Row layer: a weight layer index, or the agent metadata pseudo-layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerKey {
    Index(usize),
    Tag(MetadataTag),
}

impl LayerKey {
    pub const METADATA: LayerKey = LayerKey::Tag(MetadataTag::Metadata);
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKey::Index(i) => write!(f, "{}", i),
            LayerKey::Tag(MetadataTag::Metadata) => f.write_str("metadata"),
        }
    }
}

/// Body of a save request: one layer/type pair, or one metadata key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub layer: LayerKey,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
}

impl SaveRequest {
    /// Parse a save body. Every field must be present and `data` non-null.
    pub fn from_body(body: Option<&Value>) -> Option<Self> {
        let obj = body?.as_object()?;
        let data = obj.get("data").filter(|d| !d.is_null())?;
        let layer = serde_json::from_value(obj.get("layer")?.clone()).ok()?;
        let kind = obj.get("type")?.as_str()?.to_string();
        Some(Self {
            layer,
            kind,
            data: data.clone(),
        })
    }
}

/// Body of a successful load: latest rows grouped by role, keyed by layer
/// index as a string, or by metadata key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadResponse {
    #[serde(default)]
    pub weights: BTreeMap<String, Value>,
    #[serde(default)]
    pub biases: BTreeMap<String, Value>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

/// Serialize one protocol message as a newline-terminated line.
pub fn encode_line<T: Serialize>(message: &T) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_layer_key_wire_forms() {
        assert_eq!(serde_json::to_value(LayerKey::Index(2)).unwrap(), json!(2));
        assert_eq!(serde_json::to_value(LayerKey::METADATA).unwrap(), json!("metadata"));
        assert_eq!(serde_json::from_value::<LayerKey>(json!("metadata")).unwrap(), LayerKey::METADATA);
        assert!(serde_json::from_value::<LayerKey>(json!("other")).is_err());
        assert!(serde_json::from_value::<LayerKey>(json!(-1)).is_err());
    }

    #[test]
    fn test_save_body_requires_all_fields() {
        let ok = json!({"layer": 0, "type": "weight", "data": [0.1]});
        assert!(SaveRequest::from_body(Some(&ok)).is_some());

        for bad in [
            json!({"type": "weight", "data": [0.1]}),
            json!({"layer": 0, "data": [0.1]}),
            json!({"layer": 0, "type": "weight"}),
            json!({"layer": 0, "type": "weight", "data": null}),
            json!([1, 2, 3]),
        ] {
            assert!(SaveRequest::from_body(Some(&bad)).is_none(), "{}", bad);
        }
        assert!(SaveRequest::from_body(None).is_none());
    }

    #[test]
    fn test_request_line_is_single_line() {
        let line = encode_line(&Request::load()).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.contains("\"GET\""));
        assert!(!line.contains("body"));
    }
}
