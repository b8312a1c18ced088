use crate::identity::PackageKind;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The decoded update document served by a package's update server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub slug: String,

    /// Name of the git host the package is served from.
    #[serde(default, deserialize_with = "lenient_string")]
    pub git: String,

    #[serde(rename = "type")]
    pub kind: PackageKind,

    #[serde(default, deserialize_with = "lenient_string")]
    pub version: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub branch: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub download_link: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub tested: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub requires: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub requires_php: String,

    #[serde(default, deserialize_with = "coerced_map")]
    pub icons: Map<String, Value>,

    #[serde(default)]
    pub banners: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(
        default,
        deserialize_with = "optional_map",
        skip_serializing_if = "Option::is_none"
    )]
    pub auth_header: Option<Map<String, Value>>,

    #[serde(default, deserialize_with = "coerced_map")]
    pub sections: Map<String, Value>,

    /// File key of the owning package, injected after decoding.
    #[serde(default)]
    pub file: String,

    /// Remaining fields, kept so cached and live manifests stay identical.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    /// `url` falls back to the slug when the remote sends none.
    pub fn url_or_slug(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.slug)
    }
}

/// Coerce any JSON shape into a key/value map.
///
/// Objects pass through, lists become index-keyed maps, a scalar becomes a
/// single `"0"` entry and null becomes empty.
pub fn coerce_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        Value::Null => Map::new(),
        scalar => Map::from_iter([("0".to_owned(), scalar)]),
    }
}

/// Loose truthiness of a decoded JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(v) => *v,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

fn coerced_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Map<String, Value>, D::Error> {
    Value::deserialize(deserializer).map(coerce_map)
}

fn optional_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Map<String, Value>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) if !map.is_empty() => Some(map),
        _ => None,
    })
}
