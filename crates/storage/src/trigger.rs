//! Object-created notifications that start a run.

use keyword_core::error::{KeywordError, KeywordResult};
use percent_encoding::percent_decode_str;
use serde::Deserialize;

/// S3-style event notification. Only the fields the job needs are modelled.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<TriggerRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TriggerRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    /// URL-encoded object key, as delivered by the notification.
    pub key: String,
}

/// Where the input object lives, with the key already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl TriggerEvent {
    pub fn from_json(body: &[u8]) -> KeywordResult<Self> {
        serde_json::from_slice(body)
            .map_err(|e| KeywordError::Trigger(format!("invalid event payload: {e}")))
    }

    /// Location of the first record's object.
    pub fn location(&self) -> KeywordResult<ObjectLocation> {
        let record = self
            .records
            .first()
            .ok_or_else(|| KeywordError::Trigger("event has no records".to_string()))?;
        ObjectLocation::from_encoded(&record.s3.bucket.name, &record.s3.object.key)
    }
}

impl ObjectLocation {
    /// Build a location from a raw bucket name and a form-encoded key
    /// (`+` is a space, `%XX` escapes are UTF-8).
    pub fn from_encoded(bucket: &str, encoded_key: &str) -> KeywordResult<Self> {
        if bucket.is_empty() {
            return Err(KeywordError::Trigger("bucket name is empty".to_string()));
        }
        let key = decode_key(encoded_key);
        if key.is_empty() {
            return Err(KeywordError::Trigger("object key is empty".to_string()));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            key,
        })
    }
}

/// Invalid UTF-8 sequences decode to U+FFFD.
pub fn decode_key(encoded: &str) -> String {
    let spaced = encoded.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
