//! Purpose: Ordered multi-valued header collection and its JSON wire codec.
//! Exports: `HeaderFields`, `HeaderField`.
//! Role: Canonical JSON boundary for header data exchanged with the hosting layer.
//! Invariants: Entry order and per-entry value order round-trip exactly.
//! Invariants: Names are never deduplicated or case-folded by the codec.
//! Invariants: Decode checks token structure step by step and fails on the first deviation.

use std::fmt;
use std::slice;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::core::error::{Error, ErrorKind};

/// One header entry: a name and its values, both in original order. Repeated
/// names live in separate entries.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HeaderField {
    pub name: String,
    pub values: Vec<String>,
}

/// Ordered sequence of header entries.
///
/// The wire shape is an array of single-name objects rather than one JSON
/// object, because object keys must be unique and would silently merge or
/// drop repeated header names:
///
/// ```text
/// [ { "Accept": ["application/json"] },
///   { "Set-Cookie": ["a=1", "b=2"] } ]
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HeaderFields {
    fields: Vec<HeaderField>,
}

impl HeaderFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Never merges with existing entries of the same name.
    pub fn push(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.fields.push(HeaderField {
            name: name.into(),
            values,
        });
    }

    /// Append one value to the last entry with this exact name, or start a
    /// new entry if none exists.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        if let Some(field) = self.fields.iter_mut().rev().find(|field| field.name == name) {
            field.values.push(value.into());
            return;
        }
        self.push(name, vec![value.into()]);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HeaderField> {
        self.fields.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, HeaderField> {
        self.fields.iter()
    }

    /// Encode to the JSON wire shape. An empty collection encodes as `[]`.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|err| {
            Error::new(ErrorKind::Structural)
                .with_message("failed to encode headers as json")
                .with_source(err)
        })
    }

    /// Decode from the JSON wire shape, failing on the first token that
    /// deviates from it.
    pub fn from_json(input: &str) -> Result<Self, Error> {
        serde_json::from_str(input).map_err(|err| {
            let detail = err.to_string();
            Error::new(ErrorKind::Structural)
                .with_message(format!(
                    "header json does not match the expected shape: {detail}"
                ))
                .with_source(err)
        })
    }
}

impl IntoIterator for HeaderFields {
    type Item = HeaderField;
    type IntoIter = std::vec::IntoIter<HeaderField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a HeaderFields {
    type Item = &'a HeaderField;
    type IntoIter = slice::Iter<'a, HeaderField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl FromIterator<(String, Vec<String>)> for HeaderFields {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, values)| HeaderField { name, values })
                .collect(),
        }
    }
}

impl Serialize for HeaderFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.fields.len()))?;
        for field in &self.fields {
            seq.serialize_element(&EntryRef(field))?;
        }
        seq.end()
    }
}

/// Serializes one entry as a single-name object wrapping the value array.
struct EntryRef<'a>(&'a HeaderField);

impl Serialize for EntryRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.0.name, &self.0.values)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for HeaderFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = HeaderFields;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an array of single-name header objects")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut fields = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(EntryRepr(field)) = seq.next_element()? {
                    fields.push(field);
                }
                Ok(HeaderFields { fields })
            }
        }

        deserializer.deserialize_seq(FieldsVisitor)
    }
}

/// Deserializes one entry, insisting on exactly one name whose value is an
/// array of strings.
struct EntryRepr(HeaderField);

impl<'de> Deserialize<'de> for EntryRepr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = HeaderField;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a header object with exactly one name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let name: String = map
                    .next_key()?
                    .ok_or_else(|| de::Error::custom("header object has no name"))?;
                let values: Vec<String> = map.next_value()?;
                if map.next_key::<String>()?.is_some() {
                    return Err(de::Error::custom(
                        "header object has more than one name; expected exactly one",
                    ));
                }
                Ok(HeaderField { name, values })
            }
        }

        deserializer.deserialize_map(EntryVisitor).map(EntryRepr)
    }
}
