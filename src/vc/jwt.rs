//! # Compact JWT
//!
//! Decoding of `<header>.<claims>.<signature>` tokens and typed access to the
//! registered claims used by JWT-encoded credentials and presentations.
//!
//! Signatures are decoded but never verified here.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// A decoded compact JWT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// The JOSE header.
    pub header: Map<String, Value>,

    /// The claims set.
    pub claims: Map<String, Value>,

    /// The raw signature bytes.
    pub signature: Vec<u8>,
}

impl Token {
    /// Decode a compact JWT without verifying its signature.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] if the token does not have three
    /// base64url segments, or the header or claims are not JSON objects.
    pub fn decode(compact: &str) -> Result<Self> {
        let mut parts = compact.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::InvalidToken("expected three '.' separated segments".into()));
        };

        Ok(Self {
            header: decode_object("header", header)?,
            claims: decode_object("claims", claims)?,
            signature: Base64UrlUnpadded::decode_vec(signature)
                .map_err(|e| Error::InvalidToken(format!("issue decoding signature: {e}")))?,
        })
    }

    /// A claim by name.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }
}

fn decode_object(segment: &str, encoded: &str) -> Result<Map<String, Value>> {
    let bytes = Base64UrlUnpadded::decode_vec(encoded)
        .map_err(|e| Error::InvalidToken(format!("issue decoding {segment}: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::InvalidToken(format!("{segment} is not a JSON object: {e}")))
}

/// A claim that must be a string when present.
pub(crate) fn string_claim<'a>(
    claims: &'a Map<String, Value>, claim: &'static str,
) -> Result<Option<&'a str>> {
    match claims.get(claim) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(Error::ClaimTypeMismatch {
            claim,
            expected: "a string",
        }),
    }
}

/// A claim that must be a URI when present.
pub(crate) fn uri_claim(
    claims: &Map<String, Value>, claim: &'static str,
) -> Result<Option<String>> {
    let Some(value) = string_claim(claims, claim)? else {
        return Ok(None);
    };
    url::Url::parse(value).map_err(|source| Error::InvalidUri {
        uri: value.to_string(),
        source,
    })?;
    Ok(Some(value.to_string()))
}

/// A claim that must be a JSON object when present.
pub(crate) fn object_claim<'a>(
    claims: &'a Map<String, Value>, claim: &'static str,
) -> Result<Option<&'a Map<String, Value>>> {
    match claims.get(claim) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(object)) => Ok(Some(object)),
        Some(_) => Err(Error::ClaimTypeMismatch {
            claim,
            expected: "an object",
        }),
    }
}

/// A `NumericDate` claim: seconds since the epoch, integer or fractional.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn date_claim(
    claims: &Map<String, Value>, claim: &'static str,
) -> Result<Option<DateTime<Utc>>> {
    let Some(value) = claims.get(claim) else {
        return Ok(None);
    };
    let mismatch = || Error::ClaimTypeMismatch {
        claim,
        expected: "a NumericDate",
    };

    let date = if let Some(secs) = value.as_i64() {
        DateTime::from_timestamp(secs, 0)
    } else if let Some(secs) = value.as_f64() {
        let whole = secs.floor();
        let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::from_timestamp(whole as i64, nanos)
    } else {
        return Err(mismatch());
    };
    date.map(Some).ok_or_else(mismatch)
}
