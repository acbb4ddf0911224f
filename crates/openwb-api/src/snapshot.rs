use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The flat key/value payload decoded from one successful status request.
///
/// Keys are opaque; values are whatever JSON the device sent. Iteration is
/// ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSnapshot(Map<String, Value>);

impl RawSnapshot {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The device's self-reported name (`systemName`), if it is a
    /// non-empty string.
    pub fn system_name(&self) -> Option<&str> {
        self.0
            .get("systemName")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for RawSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl TryFrom<Value> for RawSnapshot {
    type Error = crate::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(crate::Error::UnexpectedPayload {
                found: json_type_name(&other),
            }),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
