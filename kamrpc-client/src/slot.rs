//! Decoder for htable slot values
//!
//! The upstream tags every htable value with a `type` (`str` or `int`), but
//! the tag is not reliable: integer-tagged slots sometimes carry strings,
//! untagged slots carry either, and now and then a value is neither. The
//! decoder below never rejects a slot for that. It normalizes every value
//! to text through a fixed chain:
//!
//! | tag | first try | then |
//! |---|---|---|
//! | `str` | JSON string | shared chain |
//! | `int` | JSON number, as decimal text | shared chain |
//! | other / missing | shared chain | |
//!
//! The shared chain is: JSON string, then JSON number, then the raw JSON
//! text verbatim. The variant records which step succeeded. A JSON `null`
//! reads as an empty string under any tag.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use std::fmt;

/// A slot value normalized to text
///
/// Serializes as a plain JSON string whatever the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotValue {
    /// Decoded from a JSON string
    Str(String),
    /// Decoded from a JSON number, in canonical decimal form
    Int(String),
    /// Neither; the raw JSON text as received
    Raw(String),
}

impl SlotValue {
    /// Decode a raw wire value under an optional type tag
    ///
    /// ```rust
    /// use kamrpc_client::SlotValue;
    /// use serde_json::value::RawValue;
    ///
    /// let raw = RawValue::from_string("42".to_string()).unwrap();
    /// assert_eq!(SlotValue::decode(Some("weird"), &raw), SlotValue::Int("42".into()));
    /// ```
    pub fn decode(tag: Option<&str>, raw: &RawValue) -> Self {
        let preferred = match tag {
            Some("str") => decode_str(raw),
            Some("int") => decode_number(raw),
            _ => None,
        };
        if let Some(value) = preferred {
            return value;
        }
        if tag.is_some_and(|t| t == "str" || t == "int") {
            tracing::debug!(tag = ?tag, value = raw.get(), "Slot value does not match its tag");
        }

        decode_str(raw)
            .or_else(|| decode_number(raw))
            .unwrap_or_else(|| SlotValue::Raw(raw.get().to_string()))
    }

    /// Normalized text
    pub fn as_str(&self) -> &str {
        match self {
            SlotValue::Str(s) | SlotValue::Int(s) | SlotValue::Raw(s) => s,
        }
    }

    /// Consume into the normalized text
    pub fn into_string(self) -> String {
        match self {
            SlotValue::Str(s) | SlotValue::Int(s) | SlotValue::Raw(s) => s,
        }
    }

    /// True when the value contains `needle` (case-sensitive)
    pub fn contains(&self, needle: &str) -> bool {
        self.as_str().contains(needle)
    }
}

impl Default for SlotValue {
    fn default() -> Self {
        SlotValue::Raw(String::new())
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SlotValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

fn decode_str(raw: &RawValue) -> Option<SlotValue> {
    serde_json::from_str::<Option<String>>(raw.get())
        .ok()
        .map(|s| SlotValue::Str(s.unwrap_or_default()))
}

fn decode_number(raw: &RawValue) -> Option<SlotValue> {
    serde_json::from_str::<serde_json::Number>(raw.get())
        .ok()
        .map(|n| SlotValue::Int(n.to_string()))
}

/// Keep `null` as a raw value instead of letting `Option` swallow it
pub(crate) fn raw_value<'de, D>(deserializer: D) -> Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

/// Decode an optional raw value; a missing value becomes empty text
pub(crate) fn decode_optional(tag: Option<&str>, raw: Option<&RawValue>) -> SlotValue {
    raw.map(|r| SlotValue::decode(tag, r)).unwrap_or_default()
}
