//! Camera records as stored in the catalogue file

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Fallback display name for cameras without one
pub const UNNAMED_CAMERA: &str = "Unnamed Camera";

/// A camera entry exactly as read from JSON; any field may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
}

/// A record carrying every field a card needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Camera {
    pub id_user: String,
    pub devcode: String,
    pub name: Option<String>,
    pub stream_url: String,
}

impl CameraRecord {
    /// Promote to a `Camera` when `id_user`, `devcode` and `stream_url` are present
    pub fn validate(&self) -> Option<Camera> {
        Some(Camera {
            id_user: self.id_user.clone()?,
            devcode: self.devcode.clone()?,
            name: self.name.clone(),
            stream_url: self.stream_url.clone()?,
        })
    }
}

impl Camera {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => UNNAMED_CAMERA,
        }
    }
}

/// Upstream sends `id_user` as either a string or a number
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number for id_user, got {}",
            other
        ))),
    }
}
