//! Versioned envelope for stored workflow documents.
//!
//! Files written by the file store carry a `version` next to the payload so
//! the document shape can change later without guessing. Files that predate
//! the envelope are plain documents; [`RawEnvelope::sniff`] tells the two
//! apart.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The current envelope version.
pub const CURRENT_VERSION: u32 = 1;

/// A payload tagged with the format version it was written with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u32,
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Wraps a payload at the current version.
    #[must_use]
    pub fn new(payload: T) -> Self {
        Self {
            version: CURRENT_VERSION,
            payload,
        }
    }

    #[must_use]
    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T: Serialize> Envelope<T> {
    /// Serializes the envelope as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

/// An envelope whose payload has not been decoded yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEnvelope {
    pub version: u32,
    pub payload: JsonValue,
}

impl RawEnvelope {
    /// Reads stored bytes, accepting both enveloped and bare documents.
    ///
    /// A bare document is reported as version 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not JSON.
    pub fn sniff(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: JsonValue = serde_json::from_slice(bytes)?;
        let enveloped = value
            .as_object()
            .is_some_and(|o| o.contains_key("version") && o.contains_key("payload"));

        if enveloped {
            serde_json::from_value(value)
        } else {
            Ok(Self {
                version: 0,
                payload: value,
            })
        }
    }

    /// Decodes the payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be deserialized into `T`.
    pub fn decode<T: for<'de> Deserialize<'de>>(self) -> Result<Envelope<T>, serde_json::Error> {
        let payload: T = serde_json::from_value(self.payload)?;
        Ok(Envelope {
            version: self.version,
            payload,
        })
    }
}
