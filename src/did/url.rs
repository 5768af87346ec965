//! Destructure DID URLs into strongly typed components.
//!
//! A DID URL is of the form
//!
//! `did:<method>:<method-specific-id>[/<path>][?<query>][#<fragment>]`.
//!
//! The method-specific id may itself contain colons (`did:web` uses them for
//! ports and paths), so the path, query and fragment are located by scanning
//! for the first `/`, `?` or `#` after the method segment.
//!
//! Escaped forms are kept exactly as written. Decoded copies are available for
//! display, but the canonical string is always rebuilt from the escaped parts.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

static METHOD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-z0-9]+$").expect("should compile"));

/// Grammar violations raised while parsing a DID or DID URL.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DidError {
    /// The input does not start with `did:`.
    #[error("invalid DID '{0}': missing 'did:' prefix")]
    MissingPrefix(String),

    /// The method segment is empty.
    #[error("invalid DID '{0}': empty method")]
    EmptyMethod(String),

    /// The method contains characters outside `[a-z0-9]`.
    #[error("invalid DID method '{0}': must match [a-z0-9]+")]
    InvalidMethod(String),

    /// The method-specific id is empty.
    #[error("invalid DID '{0}': empty method-specific id")]
    EmptyId(String),

    /// The method-specific id contains a character that is neither an id
    /// character nor a percent-escape.
    #[error("invalid method-specific id '{0}'")]
    InvalidId(String),

    /// A `%` is not followed by two hex digits.
    #[error("malformed percent-escape in {part}: '{value}'")]
    MalformedEscape {
        /// Which component held the escape (`id`, `path`, `query` or
        /// `fragment`).
        part: &'static str,

        /// The component as written.
        value: String,
    },

    /// A plain DID was expected but the input has a path, query or fragment.
    #[error("DID can not have path, fragment or query params: '{0}'")]
    HasUrlParts(String),
}

/// A Decentralized Identifier: `did:<method>:<method-specific-id>`.
///
/// Immutable once parsed. Equality and hashing use the escaped id.
#[derive(Clone, Debug)]
pub struct Did {
    method: String,
    id: String,
    decoded_id: String,
}

impl Did {
    /// Parse a plain DID.
    ///
    /// # Errors
    ///
    /// Returns a grammar error, or [`DidError::HasUrlParts`] if the input is a
    /// DID URL with a path, query or fragment.
    pub fn parse(s: &str) -> Result<Self, DidError> {
        let url = DidUrl::parse(s)?;
        if url.has_url_parts() {
            return Err(DidError::HasUrlParts(s.to_string()));
        }
        url.did.ok_or_else(|| DidError::MissingPrefix(s.to_string()))
    }

    /// Parse a DID known at compile time.
    ///
    /// # Panics
    ///
    /// Panics if the input is not a valid DID. Never use on data supplied by
    /// a caller.
    #[must_use]
    pub fn must_parse(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|e| panic!("{e}"))
    }

    /// The DID method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The method-specific id, percent-escapes preserved.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The method-specific id with percent-escapes decoded.
    #[must_use]
    pub fn decoded_id(&self) -> &str {
        &self.decoded_id
    }

    /// A DID URL addressing `#fragment` within this DID's document.
    #[must_use]
    pub fn with_fragment(&self, fragment: &str) -> DidUrl {
        DidUrl {
            did: Some(self.clone()),
            fragment: fragment.to_string(),
            decoded_fragment: decode(fragment),
            ..DidUrl::default()
        }
    }
}

impl Display for Did {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}", self.method, self.id)
    }
}

impl FromStr for Did {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for Did {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.id == other.id
    }
}

impl Eq for Did {}

impl Hash for Did {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.method.hash(state);
        self.id.hash(state);
    }
}

impl TryFrom<DidUrl> for Did {
    type Error = DidError;

    fn try_from(url: DidUrl) -> Result<Self, Self::Error> {
        if url.has_url_parts() {
            return Err(DidError::HasUrlParts(url.to_string()));
        }
        let text = url.to_string();
        url.did.ok_or(DidError::MissingPrefix(text))
    }
}

/// A DID plus optional path, query and fragment.
///
/// A URL without a DID part is a relative reference (for example `#key-1`)
/// and is only produced by [`DidUrl::parse_reference`].
#[derive(Clone, Debug, Default)]
pub struct DidUrl {
    did: Option<Did>,
    path: String,
    decoded_path: String,
    query: Query,
    fragment: String,
    decoded_fragment: String,
}

impl DidUrl {
    /// Parse an absolute DID URL.
    ///
    /// An empty path, query or fragment is the same as an absent one, so
    /// `did:ex:1/`, `did:ex:1?` and `did:ex:1#` all print as `did:ex:1`. A
    /// query key written without `=` prints as `key=`.
    ///
    /// # Errors
    ///
    /// Returns a [`DidError`] naming the first grammar violation found.
    pub fn parse(s: &str) -> Result<Self, DidError> {
        let Some(rest) = s.strip_prefix("did:") else {
            return Err(DidError::MissingPrefix(s.to_string()));
        };
        let (method, rest) = rest.split_once(':').unwrap_or((rest, ""));
        if method.is_empty() {
            return Err(DidError::EmptyMethod(s.to_string()));
        }
        if !METHOD_REGEX.is_match(method) {
            return Err(DidError::InvalidMethod(method.to_string()));
        }

        let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let (id, remainder) = rest.split_at(end);
        if id.is_empty() {
            return Err(DidError::EmptyId(s.to_string()));
        }
        check_escapes("id", id)?;
        if !id.chars().all(|c| c == '%' || is_id_char(c)) {
            return Err(DidError::InvalidId(id.to_string()));
        }

        let mut url = Self::parse_parts(remainder)?;
        url.did = Some(Did {
            method: method.to_string(),
            id: id.to_string(),
            decoded_id: decode(id),
        });
        Ok(url)
    }

    /// Parse an absolute DID URL or a reference relative to a DID document,
    /// such as `#key-1`, `?service=files` or `/path`.
    ///
    /// # Errors
    ///
    /// Returns a [`DidError`] if the input is neither a valid DID URL nor a
    /// non-empty relative reference.
    pub fn parse_reference(s: &str) -> Result<Self, DidError> {
        if s.starts_with("did:") {
            return Self::parse(s);
        }
        if !s.starts_with(['#', '?', '/']) {
            return Err(DidError::MissingPrefix(s.to_string()));
        }
        let url = Self::parse_parts(s)?;
        if !url.has_url_parts() {
            return Err(DidError::MissingPrefix(s.to_string()));
        }
        Ok(url)
    }

    /// Parse a DID URL known at compile time.
    ///
    /// # Panics
    ///
    /// Panics if the input is not a valid DID URL. Never use on data supplied
    /// by a caller.
    #[must_use]
    pub fn must_parse(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|e| panic!("{e}"))
    }

    // Split `[/path][?query][#fragment]` and validate each part's escapes.
    fn parse_parts(s: &str) -> Result<Self, DidError> {
        let (rest, fragment) = s.split_once('#').unwrap_or((s, ""));
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let path = path.strip_prefix('/').unwrap_or(path);

        check_escapes("path", path)?;
        check_escapes("query", query)?;
        check_escapes("fragment", fragment)?;

        Ok(Self {
            did: None,
            path: path.to_string(),
            decoded_path: decode(path),
            query: Query::parse(query),
            fragment: fragment.to_string(),
            decoded_fragment: decode(fragment),
        })
    }

    /// The DID part, or `None` for a relative reference.
    #[must_use]
    pub const fn did(&self) -> Option<&Did> {
        self.did.as_ref()
    }

    /// The path without its leading `/`, escapes preserved.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        non_empty(&self.path)
    }

    /// The path with escapes decoded.
    #[must_use]
    pub fn decoded_path(&self) -> Option<&str> {
        non_empty(&self.decoded_path)
    }

    /// Query parameters.
    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// The fragment without its leading `#`, escapes preserved.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        non_empty(&self.fragment)
    }

    /// The fragment with escapes decoded.
    #[must_use]
    pub fn decoded_fragment(&self) -> Option<&str> {
        non_empty(&self.decoded_fragment)
    }

    /// `true` when the URL has no DID part.
    #[must_use]
    pub const fn is_relative(&self) -> bool {
        self.did.is_none()
    }

    /// `true` when a path, query or fragment is present.
    #[must_use]
    pub fn has_url_parts(&self) -> bool {
        !self.path.is_empty() || !self.query.is_empty() || !self.fragment.is_empty()
    }

    /// Qualify a relative reference with `base`. Absolute URLs are returned
    /// unchanged.
    #[must_use]
    pub fn resolve_against(&self, base: &Did) -> Self {
        let mut url = self.clone();
        if url.did.is_none() {
            url.did = Some(base.clone());
        }
        url
    }
}

impl Display for DidUrl {
    /// Format the URL from its escaped components, with query keys sorted.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(did) = &self.did {
            write!(f, "{did}")?;
        }
        if !self.path.is_empty() {
            write!(f, "/{}", self.path)?;
        }
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

impl FromStr for DidUrl {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Did> for DidUrl {
    fn from(did: Did) -> Self {
        Self {
            did: Some(did),
            ..Self::default()
        }
    }
}

impl PartialEq for DidUrl {
    fn eq(&self, other: &Self) -> bool {
        self.did == other.did
            && self.path == other.path
            && self.query == other.query
            && self.fragment == other.fragment
    }
}

impl Eq for DidUrl {}

impl Hash for DidUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.did.hash(state);
        self.path.hash(state);
        self.query.hash(state);
        self.fragment.hash(state);
    }
}

/// DID URL query parameters.
///
/// Keys and values are kept escaped exactly as written and print with keys
/// sorted. The values of a repeated key keep their order. Lookups use decoded
/// copies.
#[derive(Clone, Debug, Default)]
pub struct Query {
    params: BTreeMap<String, Vec<String>>,
    decoded: BTreeMap<String, Vec<String>>,
}

impl Query {
    fn parse(s: &str) -> Self {
        let mut query = Self::default();
        for pair in s.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            query.append(key, value);
        }
        query
    }

    fn append(&mut self, key: &str, value: &str) {
        self.params.entry(key.to_string()).or_default().push(value.to_string());
        self.decoded.entry(decode(key)).or_default().push(decode(value));
    }

    /// The first value for `key`, decoded.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.decoded.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    /// All decoded values for `key`, in the order they were written.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.decoded.get(key).map_or(&[], Vec::as_slice)
    }

    /// `true` when there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over escaped keys in sorted order with their escaped values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params
    }
}

impl Eq for Query {}

impl Hash for Query {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.params.hash(state);
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for (key, values) in &self.params {
            for value in values {
                write!(f, "{sep}{key}={value}")?;
                sep = "&";
            }
        }
        Ok(())
    }
}

const fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':')
}

fn check_escapes(part: &'static str, value: &str) -> Result<(), DidError> {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if !valid {
                return Err(DidError::MalformedEscape {
                    part,
                    value: value.to_string(),
                });
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

fn decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

// DIDs and DID URLs serialize as their canonical string.
macro_rules! string_serde {
    ($type:ty, $parse:path, $expecting:literal) => {
        impl Serialize for $type {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $type {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct StrVisitor;

                impl Visitor<'_> for StrVisitor {
                    type Value = $type;

                    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                        f.write_str($expecting)
                    }

                    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                        $parse(value).map_err(E::custom)
                    }
                }

                deserializer.deserialize_str(StrVisitor)
            }
        }
    };
}

string_serde!(Did, Did::parse, "a DID string");
string_serde!(DidUrl, DidUrl::parse_reference, "a DID URL or relative reference");
