//! # Verifiable Presentation

use std::ops::Deref;

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use super::credential::typed;
use super::jwt::{self, Token};
use super::{Envelope, Format, Proof, Source, VerifiableCredential, embedded_text};
use crate::core::Kind;
use crate::plural::{self, PRESENTATION_PLURALS};
use crate::{Error, Result};

/// The fields of a Verifiable Presentation.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    /// JSON-LD contexts: URIs or inline context objects.
    #[serde(rename = "@context", default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<Kind<Value>>,

    /// The presentation's URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Presentation types. Should include `VerifiablePresentation`.
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub type_: Vec<String>,

    /// The party presenting the credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,

    /// The presented credentials, each in its own format.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verifiable_credential: Vec<VerifiableCredential>,

    /// Embedded proofs. See [`Presentation::proofs`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proof: Vec<Map<String, Value>>,

    /// Members not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Presentation {
    /// Whether `type_` is one of the presentation's types.
    #[must_use]
    pub fn is_type(&self, type_: &str) -> bool {
        self.type_.iter().any(|t| t == type_)
    }

    /// Whether `uri` is one of the presentation's contexts.
    #[must_use]
    pub fn contains_context(&self, uri: &str) -> bool {
        self.context.iter().any(|c| c.as_str() == Some(uri))
    }

    /// The `proof` entries as typed [`Proof`]s.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry is not a valid proof.
    pub fn proofs(&self) -> Result<Vec<Proof>> {
        typed(&self.proof)
    }

    /// The presentation as a JSON-LD object, single-element plural members
    /// collapsed to bare values. Embedded credentials keep their own format.
    ///
    /// # Errors
    ///
    /// Returns an error if the presentation cannot be serialized.
    pub fn to_json(&self) -> Result<Map<String, Value>> {
        let Value::Object(mut object) = serde_json::to_value(self)? else {
            return Err(Error::InvalidCredential("presentation is not a JSON object".into()));
        };
        plural::collapse(&mut object, PRESENTATION_PLURALS);
        Ok(object)
    }

    fn from_object(mut object: Map<String, Value>) -> Result<Self> {
        plural::normalize(&mut object, PRESENTATION_PLURALS);
        serde_json::from_value(Value::Object(object))
            .map_err(|e| Error::InvalidCredential(e.to_string()))
    }
}

/// A presentation together with the format it was parsed from.
///
/// Dereferences to [`Presentation`] and serializes in its source format, the
/// same way [`VerifiableCredential`] does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiablePresentation {
    presentation: Presentation,
    source: Source,
}

impl VerifiablePresentation {
    /// Parse a presentation from a JSON-LD object or a compact JWT.
    ///
    /// In the JWT form the `vp` claim is the presentation body, `iss` becomes
    /// the holder and `jti` the id. Embedded credentials are parsed in
    /// whichever format each one uses.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a well-formed presentation, an
    /// embedded credential fails to parse, or a registered JWT claim has the
    /// wrong type.
    pub fn parse(text: &str) -> Result<Self> {
        match Envelope::detect(text) {
            Envelope::JsonLd(raw) => {
                let presentation = Presentation::from_object(serde_json::from_str(raw)?)?;
                debug!(
                    credentials = presentation.verifiable_credential.len(),
                    "parsed JSON-LD presentation"
                );
                Ok(Self {
                    presentation,
                    source: Source::JsonLd { raw: Some(raw.to_string()) },
                })
            }
            Envelope::Jwt(raw) => Self::parse_jwt(raw),
        }
    }

    fn parse_jwt(raw: &str) -> Result<Self> {
        let token = Token::decode(raw)?;
        let claims = &token.claims;

        let mut presentation = match jwt::object_claim(claims, "vp")? {
            Some(vp) => Presentation::from_object(vp.clone())?,
            None => Presentation::default(),
        };
        if let Some(jti) = jwt::uri_claim(claims, "jti")? {
            presentation.id = Some(jti);
        }
        if let Some(iss) = jwt::uri_claim(claims, "iss")? {
            presentation.holder = Some(iss);
        }
        debug!(credentials = presentation.verifiable_credential.len(), "parsed JWT presentation");

        Ok(Self {
            presentation,
            source: Source::Jwt {
                raw: raw.to_string(),
                token,
            },
        })
    }

    /// The presentation's format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.source.format()
    }

    /// The text the presentation was parsed from. `None` for a presentation
    /// built in memory.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.source.raw()
    }

    /// A copy of the decoded JWT, for JWT presentations.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        self.source.token()
    }

    /// The presentation fields.
    #[must_use]
    pub const fn presentation(&self) -> &Presentation {
        &self.presentation
    }
}

impl From<Presentation> for VerifiablePresentation {
    fn from(presentation: Presentation) -> Self {
        Self {
            presentation,
            source: Source::JsonLd { raw: None },
        }
    }
}

impl Deref for VerifiablePresentation {
    type Target = Presentation;

    fn deref(&self) -> &Self::Target {
        &self.presentation
    }
}

impl std::str::FromStr for VerifiablePresentation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for VerifiablePresentation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.source {
            Source::Jwt { raw, .. } => serializer.serialize_str(raw),
            Source::JsonLd { .. } => {
                self.presentation.to_json().map_err(S::Error::custom)?.serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for VerifiablePresentation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = embedded_text(deserializer)?;
        Self::parse(&text).map_err(D::Error::custom)
    }
}
