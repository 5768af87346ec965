//! # Verifiable Credentials
//!
//! Parsing and serialization of Verifiable Credentials and Presentations in
//! either of their two securing formats: JSON-LD objects with embedded proofs,
//! or compact JWTs whose registered claims map onto credential fields.
//!
//! A parsed value remembers the format it came from and re-serializes in that
//! format. JWT-form values replay their source token verbatim.
//!
//! See [VC Data Model](https://www.w3.org/TR/vc-data-model/#json-web-token).

mod credential;
pub mod jwt;
mod presentation;
mod proof;

use serde::Deserialize;
use serde::de::{self, Deserializer};
use serde_json::Value;

pub use self::credential::*;
pub use self::jwt::Token;
pub use self::presentation::*;
pub use self::proof::*;

/// The base context every credential and presentation carries.
pub const VC_CONTEXT_V1: &str = "https://www.w3.org/2018/credentials/v1";

/// Type every credential carries.
pub const VC_TYPE: &str = "VerifiableCredential";

/// Type every presentation carries.
pub const VP_TYPE: &str = "VerifiablePresentation";

/// The securing format of a credential or presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// A JSON-LD object, secured by an embedded proof if at all.
    JsonLd,

    /// A compact JWT.
    Jwt,
}

/// Where a credential or presentation came from. Fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Source {
    /// Parsed from a JSON-LD object, or built in memory when `raw` is `None`.
    JsonLd { raw: Option<String> },

    /// Parsed from a compact JWT.
    Jwt { raw: String, token: Token },
}

impl Source {
    const fn format(&self) -> Format {
        match self {
            Self::JsonLd { .. } => Format::JsonLd,
            Self::Jwt { .. } => Format::Jwt,
        }
    }

    fn raw(&self) -> Option<&str> {
        match self {
            Self::JsonLd { raw } => raw.as_deref(),
            Self::Jwt { raw, .. } => Some(raw),
        }
    }

    fn token(&self) -> Option<Token> {
        match self {
            Self::JsonLd { .. } => None,
            Self::Jwt { token, .. } => Some(token.clone()),
        }
    }
}

/// Trimmed input, classified by its first character.
enum Envelope<'a> {
    JsonLd(&'a str),
    Jwt(&'a str),
}

impl<'a> Envelope<'a> {
    fn detect(text: &'a str) -> Self {
        let text = text.trim();
        if text.starts_with('{') {
            Self::JsonLd(text)
        } else {
            Self::Jwt(text)
        }
    }
}

/// Read a credential or presentation embedded in JSON: a JWT string or a
/// JSON-LD object. Returns the text to hand to the format-detecting parser.
fn embedded_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(token) => Ok(token),
        object @ Value::Object(_) => Ok(object.to_string()),
        other => Err(de::Error::invalid_type(
            de::Unexpected::Other(json_type(&other)),
            &"a JWT string or a JSON object",
        )),
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
