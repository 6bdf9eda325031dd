//! Request field sets.
//!
//! Every write route reads its input as a flat map of field name to string,
//! whatever the body encoding was (multipart, urlencoded or JSON).

use std::collections::BTreeMap;

use serde_json::Value;

/// Flat map of submitted field values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(BTreeMap<String, String>);

impl FormFields {
    /// Create an empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The value of a field, treating an empty string as absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Build a field set from a JSON object of scalars.
    ///
    /// Strings are taken as-is, numbers and booleans are rendered as text and
    /// `null` means absent. Nested arrays or objects are kept as their JSON text.
    #[must_use]
    pub fn from_json_object(object: serde_json::Map<String, Value>) -> Self {
        let fields = object
            .into_iter()
            .filter_map(|(name, value)| {
                let text = match value {
                    Value::Null => return None,
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                Some((name, text))
            })
            .collect();
        Self(fields)
    }
}

impl<K, V> FromIterator<(K, V)> for FormFields
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_empty_value_is_absent() {
        let fields: FormFields = [("name", ""), ("email", "a@b.co")].into_iter().collect();
        assert_eq!(fields.get("name"), None);
        assert_eq!(fields.get("email"), Some("a@b.co"));
        assert_eq!(fields.get("missing"), None);
    }

    #[test]
    fn test_from_json_object_renders_scalars() {
        let json = json!({"name": "Mesa", "price": 12.5, "active": true, "image": null});
        let Value::Object(object) = json else {
            unreachable!("literal is an object")
        };

        let fields = FormFields::from_json_object(object);

        assert_eq!(fields.get("name"), Some("Mesa"));
        assert_eq!(fields.get("price"), Some("12.5"));
        assert_eq!(fields.get("active"), Some("true"));
        assert_eq!(fields.get("image"), None);
    }
}
