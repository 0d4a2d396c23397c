// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Storage-change notifications
//!
//! Only the fields the handler reads are modelled; everything else in the
//! provider's event payload is ignored during deserialization.

use crate::Result;
use crate::error::IngestError;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

/// An object-created notification as delivered by the storage service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "Records", default)]
    pub records: Vec<NotificationRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketEntity {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEntity {
    /// URL-form-encoded object key, exactly as the event carries it
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// A resolved reference to one stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    /// Build a reference, rejecting an empty bucket or key
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let bucket = bucket.into();
        let key = key.into();
        if bucket.trim().is_empty() {
            return Err(IngestError::InvalidNotification(
                "bucket name is empty".to_string(),
            ));
        }
        if key.trim().is_empty() {
            return Err(IngestError::InvalidNotification(
                "object key is empty".to_string(),
            ));
        }
        Ok(Self { bucket, key })
    }

    /// Fully-qualified source location, `s3://<bucket>/<key>`
    #[must_use]
    pub fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }

    /// Root URL of the bucket, used to register its object store
    pub fn bucket_url(&self) -> Result<url::Url> {
        Ok(url::Url::parse(&format!("s3://{}", self.bucket))?)
    }

    /// Object URL with each key segment percent-encoded
    ///
    /// Keys may contain `?`, `#` or `%`, which would otherwise be read as
    /// URL syntax when the location is parsed.
    pub fn url(&self) -> Result<url::Url> {
        let mut url = self.bucket_url()?;
        url.path_segments_mut()
            .map_err(|()| {
                IngestError::InvalidNotification(format!("bucket '{}' is not a host", self.bucket))
            })?
            .pop_if_empty()
            .extend(self.key.split('/'));
        Ok(url)
    }
}

impl Notification {
    /// Parse a notification from its JSON payload
    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Build a single-record notification for one object
    #[must_use]
    pub fn for_object(bucket: &str, key: &str) -> Self {
        Self {
            records: vec![NotificationRecord {
                event_name: Some("ObjectCreated:Put".to_string()),
                s3: S3Entity {
                    bucket: BucketEntity {
                        name: bucket.to_string(),
                    },
                    object: ObjectEntity {
                        key: encode_key(key),
                        size: None,
                    },
                },
            }],
        }
    }

    /// The object named by the first record
    ///
    /// Later records are ignored; a notification is handled as one object.
    pub fn first_object(&self) -> Result<ObjectRef> {
        let record = self.records.first().ok_or_else(|| {
            IngestError::InvalidNotification("notification has no records".to_string())
        })?;

        if self.records.len() > 1 {
            diagnostics::warn!(
                "Notification carries {count} records, only the first is processed",
                count: self.records.len()
            );
        }

        ObjectRef::new(
            record.s3.bucket.name.clone(),
            decode_key(&record.s3.object.key)?,
        )
    }
}

/// Decode an event object key: `+` is a space, `%XX` an escaped byte
pub fn decode_key(raw: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| IngestError::InvalidNotification(format!("object key '{raw}': {e}")))
}

fn encode_key(key: &str) -> String {
    use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

    // Same safe set the storage service leaves untouched in event keys
    const KEY: &AsciiSet = &NON_ALPHANUMERIC
        .remove(b'/')
        .remove(b'-')
        .remove(b'_')
        .remove(b'.')
        .remove(b'~')
        .remove(b' ');

    utf8_percent_encode(key, KEY).to_string().replace(' ', "+")
}
