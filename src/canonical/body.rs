//! Cassette encoding for request and response bodies.
//!
//! Bodies are stored as `{string: ...}` when they are valid UTF-8 and as
//! `{base64: ...}` otherwise. An absent request body is stored as `null`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Exactly one field is set.
#[derive(Serialize, Deserialize)]
struct StoredBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base64: Option<String>,
}

impl StoredBody {
    fn encode(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self { string: Some(text.to_string()), base64: None },
            Err(_) => Self { string: None, base64: Some(STANDARD.encode(bytes)) },
        }
    }

    fn decode<E: serde::de::Error>(self) -> Result<Vec<u8>, E> {
        match (self.string, self.base64) {
            (Some(text), _) => Ok(text.into_bytes()),
            (None, Some(encoded)) => STANDARD.decode(encoded).map_err(E::custom),
            (None, None) => Err(E::custom("body needs a `string` or `base64` field")),
        }
    }
}

pub(crate) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    StoredBody::encode(bytes).serialize(serializer)
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    StoredBody::deserialize(deserializer)?.decode()
}

pub(crate) mod optional {
    use super::StoredBody;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(clippy::ref_option)]
    pub(crate) fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        bytes.as_deref().map(StoredBody::encode).serialize(serializer)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<StoredBody>::deserialize(deserializer)?.map(StoredBody::decode).transpose()
    }
}
