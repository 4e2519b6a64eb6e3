use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const POST_COLLECTION: &str = "app.bsky.feed.post";
pub const IMAGES_EMBED_TYPE: &str = "app.bsky.embed.images";

/// PNG bytes produced by the encoder, with the settings that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

impl EncodedPayload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Blob reference handed back by `uploadBlob`. Kept verbatim so the record
/// embeds exactly what the store returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(serde_json::Value);

impl BlobRef {
    /// Returns `None` unless `value` is a JSON object.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        value.is_object().then_some(Self(value))
    }

    pub fn size(&self) -> Option<u64> {
        self.0.get("size").and_then(|v| v.as_u64())
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    pub alt: String,
    pub image: BlobRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagesEmbed {
    #[serde(rename = "$type")]
    pub kind: String,
    pub images: Vec<EmbeddedImage>,
}

impl ImagesEmbed {
    pub fn single(alt: impl Into<String>, image: BlobRef) -> Self {
        Self {
            kind: IMAGES_EMBED_TYPE.to_string(),
            images: vec![EmbeddedImage {
                alt: alt.into(),
                image,
            }],
        }
    }
}

/// An `app.bsky.feed.post` record. Built once per publish and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "$type")]
    pub kind: String,
    pub text: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed: Option<ImagesEmbed>,
}

impl PostRecord {
    pub fn new(text: impl Into<String>, created_at: DateTime<Utc>, embed: Option<ImagesEmbed>) -> Self {
        Self {
            kind: POST_COLLECTION.to_string(),
            text: text.into(),
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            embed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRecordRequest<'a> {
    pub repo: &'a str,
    pub collection: &'a str,
    pub record: &'a PostRecord,
}

/// What `createRecord` returned for the new post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRecord {
    pub uri: String,
    pub cid: Option<String>,
}

/// Authenticated account session. Read-only once established.
#[derive(Clone)]
pub struct Session {
    pub access_jwt: String,
    pub did: String,
}

impl Session {
    pub fn new(access_jwt: impl Into<String>, did: impl Into<String>) -> Self {
        Self {
            access_jwt: access_jwt.into(),
            did: did.into(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_jwt", &"<redacted>")
            .field("did", &self.did)
            .finish()
    }
}
