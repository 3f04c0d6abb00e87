//! Optional fields where supplying the key matters independently of its value

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// State of an optional field whose *presence* carries meaning.
///
/// Several safe-output kinds derive capability flags from whether an override
/// was supplied at all: `update-issue: { status: }` and
/// `update-issue: { status: false }` both allow status mutation, while leaving
/// `status` out does not. Use with `#[serde(default)]` so a missing key
/// deserializes as [`FieldOverride::Absent`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldOverride<T> {
    /// The key was not written
    #[default]
    Absent,
    /// The key was written with no value
    Null,
    /// The key was written with a value
    Value(T),
}

impl<T> FieldOverride<T> {
    /// Whether the key was supplied, with or without a value
    pub fn is_supplied(&self) -> bool {
        !self.is_absent()
    }

    /// Whether the key was left out
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldOverride::Absent)
    }

    /// The supplied value, if any
    pub fn value(&self) -> Option<&T> {
        match self {
            FieldOverride::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl<'de, T> Deserialize<'de> for FieldOverride<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only reached when the key is present
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => FieldOverride::Value(value),
            None => FieldOverride::Null,
        })
    }
}

impl<T> Serialize for FieldOverride<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldOverride::Value(value) => value.serialize(serializer),
            _ => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default)]
        status: FieldOverride<bool>,
    }

    #[test]
    fn test_absent_null_and_value_are_distinct() {
        let absent: Holder = serde_yaml::from_str("{}").unwrap();
        let null: Holder = serde_yaml::from_str("status:\n").unwrap();
        let value: Holder = serde_yaml::from_str("status: false\n").unwrap();

        assert_eq!(absent.status, FieldOverride::Absent);
        assert_eq!(null.status, FieldOverride::Null);
        assert_eq!(value.status, FieldOverride::Value(false));

        assert!(!absent.status.is_supplied());
        assert!(null.status.is_supplied());
        assert!(value.status.is_supplied());
        assert_eq!(value.status.value(), Some(&false));
    }
}
