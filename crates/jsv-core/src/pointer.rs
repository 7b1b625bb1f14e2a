//! # JSON Pointer (RFC 6901)
//!
//! A `JsonPointer` addresses one node inside a JSON document by an ordered
//! sequence of reference tokens. It is used twice by the validator: as the
//! instance path carried through recursive descent, and as the fragment
//! part of `$ref` / `id` values.
//!
//! ## Wire Format
//!
//! The encoded form is either empty (the whole document) or a sequence of
//! `/`-prefixed tokens. Inside a token, `~` is written `~0` and `/` is
//! written `~1`. Decoding reverses this; a `~` followed by anything else is
//! rejected. Encoding then decoding any token sequence yields the original.
//!
//! ## Resolution
//!
//! [`JsonPointer::resolve`] is total: it returns the addressed node or
//! `None`, and never panics, whatever the pointer and the document.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::PointerError;

/// An RFC 6901 JSON Pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    /// The empty pointer, addressing the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a pointer from raw (unescaped) reference tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Decode a pointer from its encoded string form.
    ///
    /// # Errors
    ///
    /// Returns [`PointerError::MissingLeadingSlash`] if a non-empty input
    /// does not start with `/`, and [`PointerError::IllegalEscape`] if a `~`
    /// is not followed by `0` or `1`.
    pub fn parse(input: &str) -> Result<Self, PointerError> {
        if input.is_empty() {
            return Ok(Self::root());
        }
        let Some(body) = input.strip_prefix('/') else {
            return Err(PointerError::MissingLeadingSlash {
                input: input.to_string(),
            });
        };

        let mut tokens = Vec::new();
        // Offset of the current raw token within `input`.
        let mut offset = 1;
        for raw in body.split('/') {
            tokens.push(unescape(raw, input, offset)?);
            offset += raw.len() + 1;
        }
        Ok(Self { tokens })
    }

    /// Returns a new pointer with `token` appended.
    pub fn append(&self, token: impl Into<String>) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token.into());
        Self { tokens }
    }

    /// Returns a new pointer with an array index appended.
    pub fn append_index(&self, index: usize) -> Self {
        self.append(index.to_string())
    }

    /// Returns a new pointer with every token of `other` appended.
    pub fn join(&self, other: &JsonPointer) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.extend(other.tokens.iter().cloned());
        Self { tokens }
    }

    /// The pointer addressing the parent node, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.tokens.is_empty() {
            return None;
        }
        Some(Self {
            tokens: self.tokens[..self.tokens.len() - 1].to_vec(),
        })
    }

    /// The last reference token, if any.
    pub fn last(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    /// The decoded reference tokens.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Returns true for the empty pointer.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns true if `self` is `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &JsonPointer) -> bool {
        other.tokens.starts_with(&self.tokens)
    }

    /// Resolve this pointer against `node`.
    ///
    /// Objects are looked up by exact key. Arrays require a base-10
    /// non-negative integer token without leading zeros. Scalars, absent
    /// keys, out-of-range indices and non-numeric array tokens all yield
    /// `None`.
    pub fn resolve<'a>(&self, node: &'a Value) -> Option<&'a Value> {
        let mut current = node;
        for token in &self.tokens {
            current = match current {
                Value::Object(map) => map.get(token)?,
                Value::Array(items) => items.get(array_index(token)?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Parse an array index token: digits only, no sign, no leading zero.
fn array_index(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    token.parse().ok()
}

fn unescape(raw: &str, input: &str, offset: usize) -> Result<String, PointerError> {
    if !raw.contains('~') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices();
    while let Some((i, ch)) = chars.next() {
        if ch != '~' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some((_, '0')) => out.push('~'),
            Some((_, '1')) => out.push('/'),
            _ => {
                return Err(PointerError::IllegalEscape {
                    input: input.to_string(),
                    offset: offset + i,
                })
            }
        }
    }
    Ok(out)
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}

impl std::str::FromStr for JsonPointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JsonPointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-z~/]{0,6}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z0-9~/]{0,4}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        /// Encoding then decoding yields the original token sequence.
        #[test]
        fn pointer_round_trip(tokens in prop::collection::vec("[a-z~/0-9]{0,8}", 0..6)) {
            let p = JsonPointer::from_tokens(tokens.clone());
            let decoded = JsonPointer::parse(&p.to_string()).unwrap();
            prop_assert_eq!(decoded.tokens(), tokens.as_slice());
        }

        /// Resolution never panics for arbitrary pointers and documents.
        #[test]
        fn resolve_is_total(
            tokens in prop::collection::vec("[a-z0-9~/-]{0,4}", 0..5),
            doc in json_value(),
        ) {
            let p = JsonPointer::from_tokens(tokens);
            let _ = p.resolve(&doc);
        }

        /// Parsing arbitrary strings never panics.
        #[test]
        fn parse_never_panics(s in "\\PC{0,16}") {
            let _ = JsonPointer::parse(&s);
        }
    }
}
