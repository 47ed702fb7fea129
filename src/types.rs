use std::collections::BTreeMap;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// A native value converted out of the foreign runtime
///
/// Mappings come from unordered foreign dictionaries, so no ordering of their
/// entries should be relied upon beyond what `BTreeMap` gives.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum Value {
    /// UTF-8 text
    Text(String),
    /// Ordered sequence, in the foreign array's order
    Sequence(Vec<Value>),
    /// Key/value mapping; keys may be any kind of value
    Mapping(BTreeMap<Value, Value>),
}

impl Value {
    /// Shorthand for building a text value
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Returns the text if this is a text value
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is a sequence
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Self]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is a mapping
    #[must_use]
    pub const fn as_mapping(&self) -> Option<&BTreeMap<Self, Self>> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Consumes the value, returning the entries if this is a mapping
    #[must_use]
    pub fn into_mapping(self) -> Option<BTreeMap<Self, Self>> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Human readable name of the variant
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Sequence(_) => "a sequence",
            Self::Mapping(_) => "a mapping",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Mapping(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_with_heterogeneous_keys() {
        let mut map = BTreeMap::new();
        map.insert(Value::text("name"), Value::text("en0"));
        map.insert(
            Value::Sequence(vec![Value::text("a"), Value::text("b")]),
            Value::text("composite"),
        );

        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get(&Value::Sequence(vec!["a".into(), "b".into()])),
            Some(&Value::text("composite"))
        );
    }

    #[test]
    fn test_narrowing_accessors() {
        let value = Value::Sequence(vec![Value::text("8.8.8.8")]);
        assert!(value.as_text().is_none());
        assert!(value.as_mapping().is_none());
        assert_eq!(value.as_sequence().map(<[Value]>::len), Some(1));
        assert_eq!(value.kind_name(), "a sequence");
    }

    #[test]
    fn test_display() {
        let mut map = BTreeMap::new();
        map.insert(
            Value::text("ServerAddresses"),
            Value::Sequence(vec![Value::text("1.1.1.1"), Value::text("::1")]),
        );
        assert_eq!(
            Value::Mapping(map).to_string(),
            r#"{"ServerAddresses": ["1.1.1.1", "::1"]}"#
        );
    }
}
