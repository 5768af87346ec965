//! # Errors
//!
//! Error types returned by the DID and credential data model. Grammar errors
//! from DID URL parsing are carried through unchanged so callers can always
//! inspect the original cause.

use thiserror::Error;

use crate::did::{DidError, KeyPurpose};

/// Errors raised while parsing, validating or serializing DID documents and
/// verifiable credentials.
#[derive(Debug, Error)]
pub enum Error {
    /// A DID or DID URL does not conform to the DID grammar.
    #[error(transparent)]
    InvalidDid(#[from] DidError),

    /// A DID document violates a required-field rule.
    #[error("invalid DID document: {reason}")]
    InvalidDocument {
        /// Which rule was violated.
        reason: String,

        /// The grammar error behind the violation, if any.
        #[source]
        source: Option<DidError>,
    },

    /// A verification relationship references a method the document does not
    /// contain.
    #[error("unable to resolve {relationship}: {reference}")]
    UnresolvedReference {
        /// The relationship category holding the reference.
        relationship: KeyPurpose,

        /// The reference as written in the document.
        reference: String,
    },

    /// No key codec is available for the verification method type.
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// A registered JWT claim has the wrong JSON type.
    #[error("claim '{claim}' must be {expected}")]
    ClaimTypeMismatch {
        /// Claim name.
        claim: &'static str,

        /// The JSON type the claim must have.
        expected: &'static str,
    },

    /// A credential or presentation is structurally invalid.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// A compact JWT could not be decoded.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The credential subject identifier could not be determined.
    #[error(transparent)]
    InvalidSubject(#[from] SubjectError),

    /// A value that must be a URI is not one.
    #[error("invalid URI '{uri}': {source}")]
    InvalidUri {
        /// The offending value.
        uri: String,

        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// Key material could not be encoded or decoded.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The caller-supplied signer failed.
    #[error("signer failed: {0}")]
    Signer(#[source] anyhow::Error),

    /// JSON (de)serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for an [`Error::InvalidDocument`] with no underlying cause.
    pub(crate) fn document(reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            reason: reason.into(),
            source: None,
        }
    }
}

/// Reasons a credential subject DID cannot be determined.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubjectError {
    /// The credential has no `credentialSubject` entries.
    #[error("no credentialSubject")]
    NoSubject,

    /// A `credentialSubject` entry has no `id`.
    #[error("subject has no id")]
    MissingId,

    /// `credentialSubject` entries carry different ids.
    #[error("subjects disagree on id")]
    Disagree,
}
