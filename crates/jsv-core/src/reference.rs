//! # JSON Reference — Locator Plus Fragment
//!
//! A `JsonRef` is the parsed form of both `id` and `$ref` values. It splits
//! a URI reference into a *locator* (everything before `#`) and a
//! *fragment* (a JSON Pointer, a bare identifier, or nothing).
//!
//! ## Equality
//!
//! Two references are equal iff their full encoded strings are equal. The
//! encoded string is computed once at construction.
//!
//! ## Resolution
//!
//! `base.resolve(other)`:
//! - `other` with an absolute locator wins outright;
//! - `other` with an empty locator keeps `base`'s locator and takes
//!   `other`'s fragment;
//! - `other` with a relative locator is joined onto `base`'s locator using
//!   RFC 3986 rules. Opaque `jar:` locators (`jar:<archive>!<entry>`) are
//!   joined against their entry path, since hierarchical resolution does
//!   not apply to the opaque body.
//!
//! A relative reference resolved against a base that cannot anchor it
//! (empty, relative or non-`jar` opaque) stays relative.

use std::fmt;
use std::hash::{Hash, Hasher};

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::error::ReferenceError;
use crate::pointer::JsonPointer;

/// Scheme of opaque archive locators that resolve against their entry path.
const ARCHIVE_SCHEME: &str = "jar";

/// The fragment part of a JSON Reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fragment {
    /// No fragment, or an empty one (`#`).
    Empty,
    /// A JSON Pointer fragment (`#/definitions/a`).
    Pointer(JsonPointer),
    /// A plain-name fragment (`#node`), matched against `id` values.
    Identifier(String),
}

impl Fragment {
    fn parse(input: &str, raw: &str) -> Result<Self, ReferenceError> {
        let decoded = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|_| ReferenceError::FragmentEncoding {
                input: input.to_string(),
            })?;
        if decoded.is_empty() {
            Ok(Fragment::Empty)
        } else if decoded.starts_with('/') {
            JsonPointer::parse(&decoded)
                .map(Fragment::Pointer)
                .map_err(|source| ReferenceError::MalformedFragment {
                    input: input.to_string(),
                    source,
                })
        } else {
            Ok(Fragment::Identifier(decoded.into_owned()))
        }
    }

    /// Returns true for the empty fragment.
    pub fn is_empty(&self) -> bool {
        matches!(self, Fragment::Empty)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Empty => Ok(()),
            Fragment::Pointer(p) => write!(f, "#{p}"),
            Fragment::Identifier(id) => write!(f, "#{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Locator {
    Empty,
    Relative(String),
    Absolute(Url),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Empty => Ok(()),
            Locator::Relative(s) => f.write_str(s),
            Locator::Absolute(url) => f.write_str(url.as_str()),
        }
    }
}

/// A parsed JSON Reference.
#[derive(Debug, Clone)]
pub struct JsonRef {
    locator: Locator,
    fragment: Fragment,
    encoded: String,
}

impl JsonRef {
    fn new(locator: Locator, fragment: Fragment) -> Self {
        let encoded = format!("{locator}{fragment}");
        Self {
            locator,
            fragment,
            encoded,
        }
    }

    /// The empty reference: no locator, no fragment.
    pub fn empty() -> Self {
        Self::new(Locator::Empty, Fragment::Empty)
    }

    /// Parse a URI reference into locator and fragment.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::MalformedLocator`] if the part before `#`
    /// is neither an absolute URI nor a valid relative reference, and
    /// [`ReferenceError::MalformedFragment`] if a `/`-prefixed fragment is
    /// not a valid JSON Pointer.
    pub fn parse(input: &str) -> Result<Self, ReferenceError> {
        let (raw_locator, raw_fragment) = match input.split_once('#') {
            Some((loc, frag)) => (loc, frag),
            None => (input, ""),
        };
        let fragment = Fragment::parse(input, raw_fragment)?;
        let locator = parse_locator(input, raw_locator)?;
        Ok(Self::new(locator, fragment))
    }

    /// Build a reference from an absolute URL; any URL fragment is parsed
    /// as the reference fragment.
    pub fn from_url(url: &Url) -> Result<Self, ReferenceError> {
        Self::parse(url.as_str())
    }

    /// Resolve `other` against this reference used as a base.
    pub fn resolve(&self, other: &JsonRef) -> JsonRef {
        match &other.locator {
            Locator::Absolute(_) => other.clone(),
            Locator::Empty => Self::new(self.locator.clone(), other.fragment.clone()),
            Locator::Relative(rel) => match &self.locator {
                Locator::Absolute(base) => match join(base, rel) {
                    Some(url) => Self::new(Locator::Absolute(url), other.fragment.clone()),
                    None => other.clone(),
                },
                Locator::Empty | Locator::Relative(_) => other.clone(),
            },
        }
    }

    /// True iff the locator has a scheme and the fragment is empty.
    pub fn is_absolute(&self) -> bool {
        matches!(self.locator, Locator::Absolute(_)) && self.fragment.is_empty()
    }

    /// True iff the locator part is an absolute URI.
    pub fn has_absolute_locator(&self) -> bool {
        matches!(self.locator, Locator::Absolute(_))
    }

    /// True iff both locator and fragment are empty.
    pub fn is_empty(&self) -> bool {
        matches!(self.locator, Locator::Empty) && self.fragment.is_empty()
    }

    /// This reference with its fragment stripped.
    pub fn locator(&self) -> JsonRef {
        Self::new(self.locator.clone(), Fragment::Empty)
    }

    /// The locator as a URL, when it is absolute.
    pub fn locator_url(&self) -> Option<&Url> {
        match &self.locator {
            Locator::Absolute(url) => Some(url),
            _ => None,
        }
    }

    /// The fragment part.
    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    /// The fragment as a pointer, if it is one. The empty fragment is the
    /// root pointer.
    pub fn pointer(&self) -> Option<JsonPointer> {
        match &self.fragment {
            Fragment::Empty => Some(JsonPointer::root()),
            Fragment::Pointer(p) => Some(p.clone()),
            Fragment::Identifier(_) => None,
        }
    }

    /// The same locator with a pointer fragment.
    pub fn with_pointer(&self, pointer: JsonPointer) -> JsonRef {
        let fragment = if pointer.is_empty() {
            Fragment::Empty
        } else {
            Fragment::Pointer(pointer)
        };
        Self::new(self.locator.clone(), fragment)
    }

    /// True iff `other` shares this reference's locator, i.e. moving from
    /// one to the other never leaves the current document.
    pub fn contains(&self, other: &JsonRef) -> bool {
        self.locator == other.locator
    }

    /// The full encoded string.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

fn parse_locator(input: &str, raw: &str) -> Result<Locator, ReferenceError> {
    if raw.is_empty() {
        return Ok(Locator::Empty);
    }
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_fragment(None);
            Ok(Locator::Absolute(url))
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            // Validate the relative form against a throwaway base.
            let probe = Url::parse("relative:///").and_then(|base| base.join(raw));
            match probe {
                Ok(_) => Ok(Locator::Relative(raw.to_string())),
                Err(e) => Err(ReferenceError::MalformedLocator {
                    input: input.to_string(),
                    reason: e.to_string(),
                }),
            }
        }
        Err(e) => Err(ReferenceError::MalformedLocator {
            input: input.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn join(base: &Url, relative: &str) -> Option<Url> {
    if !base.cannot_be_a_base() {
        return base.join(relative).ok();
    }
    if base.scheme() != ARCHIVE_SCHEME {
        return None;
    }
    // jar:<archive>!<entry>: resolve against the entry path only.
    let (archive, entry) = base.path().split_once('!')?;
    let entry = if entry.starts_with('/') {
        entry.to_string()
    } else {
        format!("/{entry}")
    };
    let resolved = Url::parse("file:///").ok()?.join(&entry).ok()?.join(relative).ok()?;
    Url::parse(&format!("{ARCHIVE_SCHEME}:{archive}!{}", resolved.path())).ok()
}

impl PartialEq for JsonRef {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for JsonRef {}

impl Hash for JsonRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

impl fmt::Display for JsonRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl std::str::FromStr for JsonRef {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for JsonRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded)
    }
}

impl<'de> Deserialize<'de> for JsonRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
