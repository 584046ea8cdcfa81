//! Ordered, multi-valued header container.

use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Header names mapped to lists of values.
///
/// Names compare case-insensitively and keep the spelling they were first
/// added with. Both the order of names and the order of values within a name
/// are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    /// Creates an empty header set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one value under `name`.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.extend_values(name, [value.into()]);
    }

    /// Appends several values under `name`, after any values already present.
    pub fn extend_values<I>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = String>,
    {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1.extend(values),
            None => self.entries.push((name, values.into_iter().collect())),
        }
    }

    /// Sets `name` to `value` only if the name is not present yet.
    ///
    /// Returns `true` when the value was inserted.
    pub fn set_default(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.position(&name).is_some() {
            return false;
        }
        self.entries.push((name, vec![value.into()]));
        true
    }

    /// Removes `name` and all of its values.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    /// All values of `name`, in insertion order. Empty if absent.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        self.position(name).map_or(&[], |idx| self.entries[idx].1.as_slice())
    }

    /// The first value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// Whether `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Iterates `(name, values)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Iterates every `(name, value)` pair, flattening multi-valued names.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    /// Number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no headers at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

impl<N, V> FromIterator<(N, Vec<V>)> for Headers
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (N, Vec<V>)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (name, values) in iter {
            headers.extend_values(name, values.into_iter().map(Into::into));
        }
        headers
    }
}

impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, values) in &self.entries {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Headers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(HeadersVisitor)
    }
}

struct HeadersVisitor;

impl<'de> Visitor<'de> for HeadersVisitor {
    type Value = Headers;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of header names to value lists, or a list of [name, values] pairs")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Headers, A::Error> {
        let mut headers = Headers::new();
        while let Some((name, values)) = access.next_entry::<String, OneOrMany>()? {
            headers.extend_values(name, values.into_vec());
        }
        Ok(headers)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Headers, A::Error> {
        let mut headers = Headers::new();
        while let Some((name, values)) = access.next_element::<(String, OneOrMany)>()? {
            headers.extend_values(name, values.into_vec());
        }
        Ok(headers)
    }
}

/// Hand-edited cassettes sometimes carry a bare string instead of a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}
