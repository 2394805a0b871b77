use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Canonical vehicle record as returned by the API
///
/// Only the fields the upload pipeline needs are typed; everything else is kept
/// verbatim in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Persisted photo URLs, in display order
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl CarRecord {
    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }
}

/// Vehicle metadata submitted ahead of the photos
///
/// The payload is opaque to the pipeline and forwarded as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateCarRequest {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CreateCarRequest {
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

// Record ids are numeric on some deployments and UUID strings on others.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "invalid record id: {}",
            other
        ))),
    }
}
