use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Row of the `files` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(deserialize_with = "deserialize_byte_size")]
    pub size: u64,
    pub url: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert shape; the backend assigns `id` and timestamps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewFileRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: u64,
    pub url: String,
    pub user_id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSize {
    Int(u64),
    Float(f64),
    Text(String),
}

/// Parse a byte count written as text, e.g. `"1048576"`
fn parse_byte_size(raw: &str) -> Result<u64, String> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| format!("invalid byte size '{}'", raw))
}

/// Accepts a non-negative integer or a numeric string
fn deserialize_byte_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match RawSize::deserialize(deserializer)
        .map_err(|_| D::Error::custom("size must be a number or a numeric string"))?
    {
        RawSize::Int(value) => Ok(value),
        // JSON numbers like 2048.0 are integral; anything else is not a byte count
        RawSize::Float(value) if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 => {
            Ok(value as u64)
        }
        RawSize::Float(value) => Err(D::Error::custom(format!("invalid byte size {}", value))),
        RawSize::Text(text) => parse_byte_size(&text).map_err(D::Error::custom),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(value) => value.to_string(),
        RawId::Text(text) => text,
    })
}
