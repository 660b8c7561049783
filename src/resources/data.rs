use anyhow::Context;

/// How the bytes of a data asset are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DataKind {
    #[default]
    Text,
    Binary,
    Json,
}

/// A decoded data asset.
#[derive(Clone, Debug, PartialEq)]
pub enum Data {
    Text(String),
    Binary(Vec<u8>),
    Json(serde_json::Value),
}

impl Data {
    pub fn decode(kind: DataKind, bytes: Vec<u8>) -> anyhow::Result<Self> {
        match kind {
            DataKind::Text => Ok(Data::Text(
                String::from_utf8(bytes).context("asset is not valid UTF-8")?,
            )),
            DataKind::Binary => Ok(Data::Binary(bytes)),
            DataKind::Json => Ok(Data::Json(
                serde_json::from_slice(&bytes).context("asset is not valid JSON")?,
            )),
        }
    }

    pub fn kind(&self) -> DataKind {
        match self {
            Data::Text(_) => DataKind::Text,
            Data::Binary(_) => DataKind::Binary,
            Data::Json(_) => DataKind::Json,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Data::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Data::Text(text) => Some(text.as_bytes()),
            Data::Binary(bytes) => Some(bytes),
            Data::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Data::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Deserializes the payload into `T`, parsing text and binary payloads as JSON.
    pub fn deserialize<T>(&self) -> serde_json::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        match self {
            Data::Json(value) => serde_json::from_value(value.clone()),
            Data::Text(text) => serde_json::from_str(text),
            Data::Binary(bytes) => serde_json::from_slice(bytes),
        }
    }
}
