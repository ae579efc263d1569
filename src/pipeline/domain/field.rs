use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A value the analysis service may or may not have returned.
///
/// `Present("")` and `Absent` are different: the first was returned empty,
/// the second was never returned (or came back as null or a shape we could
/// not read).
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Present(T),
    Absent,
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Present(value) => Some(value),
            Field::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }
}

impl Field<String> {
    /// The text, if it was returned and is not blank.
    pub fn text(&self) -> Option<&str> {
        self.value()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

impl<T: DeserializeOwned> Field<T> {
    fn from_json(value: Value) -> Self {
        if value.is_null() {
            return Field::Absent;
        }
        // Numbers and booleans arrive where text is expected more often than not.
        let fallback = match &value {
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        };
        match serde_json::from_value(value) {
            Ok(parsed) => Field::Present(parsed),
            Err(_) => fallback
                .and_then(|text| serde_json::from_value(text).ok())
                .map(Field::Present)
                .unwrap_or(Field::Absent),
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Field::Present(value),
            None => Field::Absent,
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Field::from_json(value))
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Field::Present(value) => value.serialize(serializer),
            Field::Absent => serializer.serialize_none(),
        }
    }
}

/// Reads a list of text entries, treating a missing, null or non-list value as empty.
pub fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect())
}
