//! # Verifiable Credential
//!
//! [`Credential`] holds the data model fields. [`VerifiableCredential`] pairs
//! them with the format the credential was parsed from.

use std::ops::Deref;

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::jwt::{self, Token};
use super::{CredentialStatus, Envelope, Format, Proof, Source, embedded_text};
use crate::core::Kind;
use crate::did::Did;
use crate::plural::{self, CREDENTIAL_PLURALS};
use crate::provider::JwtSigner;
use crate::{Error, Result, SubjectError};

/// The fields of a Verifiable Credential.
///
/// Plural members are always held as lists. A `Credential` is also the
/// template passed to [`create_jwt_credential`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// JSON-LD contexts: URIs or inline context objects.
    #[serde(rename = "@context", default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<Kind<Value>>,

    /// The credential's URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Credential types. Should include `VerifiableCredential`.
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub type_: Vec<String>,

    /// The issuer: a URI, or an object with an `id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Kind<Map<String, Value>>>,

    /// When the credential becomes valid (data model 1.1).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<DateTime<Utc>>,

    /// When the credential becomes valid (data model 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,

    /// When the credential stops being valid (data model 1.1).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,

    /// When the credential stops being valid (data model 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,

    /// Claims about one or more subjects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credential_subject: Vec<Map<String, Value>>,

    /// Status entries. See [`Credential::credential_statuses`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<Vec<Map<String, Value>>>,

    /// Embedded proofs. See [`Credential::proofs`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proof: Vec<Map<String, Value>>,

    /// Members not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Credential {
    /// Whether `type_` is one of the credential's types.
    #[must_use]
    pub fn is_type(&self, type_: &str) -> bool {
        self.type_.iter().any(|t| t == type_)
    }

    /// Whether `uri` is one of the credential's contexts.
    #[must_use]
    pub fn contains_context(&self, uri: &str) -> bool {
        self.context.iter().any(|c| c.as_str() == Some(uri))
    }

    /// The issuer's identifier, whether the issuer is a bare URI or an object.
    #[must_use]
    pub fn issuer_id(&self) -> Option<&str> {
        match self.issuer.as_ref()? {
            Kind::String(id) => Some(id),
            Kind::Object(issuer) => issuer.get("id").and_then(Value::as_str),
        }
    }

    /// Whether the credential is valid at `at`, allowing `skew` either side.
    ///
    /// Valid unless `at + skew` is before `issuanceDate` or `validFrom`, or
    /// `at - skew` is after `expirationDate` or `validUntil`. Absent bounds
    /// are satisfied.
    #[must_use]
    pub fn valid_at(&self, at: DateTime<Utc>, skew: TimeDelta) -> bool {
        let not_before = [self.issuance_date, self.valid_from];
        let not_after = [self.expiration_date, self.valid_until];

        // saturate so an out-of-range bound counts as satisfied
        let latest = at.checked_add_signed(skew).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let earliest = at.checked_sub_signed(skew).unwrap_or(DateTime::<Utc>::MIN_UTC);

        not_before.into_iter().flatten().all(|from| latest >= from)
            && not_after.into_iter().flatten().all(|until| earliest <= until)
    }

    /// The DID shared by every `credentialSubject` entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSubject`] if there are no subjects, a subject
    /// has no `id`, or the subjects' ids differ. Returns
    /// [`Error::InvalidDid`] if the shared id is not a DID.
    pub fn subject_did(&self) -> Result<Did> {
        let mut ids =
            self.credential_subject.iter().map(|subject| subject.get("id").and_then(Value::as_str));

        let first = ids.next().ok_or(SubjectError::NoSubject)?.ok_or(SubjectError::MissingId)?;
        for id in ids {
            if id.ok_or(SubjectError::MissingId)? != first {
                return Err(SubjectError::Disagree.into());
            }
        }
        Ok(Did::parse(first)?)
    }

    /// The `proof` entries as typed [`Proof`]s.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry is not a valid proof.
    pub fn proofs(&self) -> Result<Vec<Proof>> {
        typed(&self.proof)
    }

    /// The `credentialStatus` entries as typed [`CredentialStatus`]es.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry lacks an `id` or `type`.
    pub fn credential_statuses(&self) -> Result<Vec<CredentialStatus>> {
        self.credential_status.as_deref().map_or_else(|| Ok(Vec::new()), typed)
    }

    /// The credential as a JSON-LD object, single-element plural members
    /// collapsed to bare values.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be serialized.
    pub fn to_json(&self) -> Result<Map<String, Value>> {
        let Value::Object(mut object) = serde_json::to_value(self)? else {
            return Err(Error::InvalidCredential("credential is not a JSON object".into()));
        };
        plural::collapse(&mut object, CREDENTIAL_PLURALS);
        Ok(object)
    }

    fn from_object(mut object: Map<String, Value>) -> Result<Self> {
        plural::normalize(&mut object, CREDENTIAL_PLURALS);
        serde_json::from_value(Value::Object(object))
            .map_err(|e| Error::InvalidCredential(e.to_string()))
    }
}

pub(super) fn typed<T: serde::de::DeserializeOwned>(
    entries: &[Map<String, Value>],
) -> Result<Vec<T>> {
    entries.iter().map(|entry| Ok(serde_json::from_value(Value::Object(entry.clone()))?)).collect()
}

/// A credential together with the format it was parsed from.
///
/// Dereferences to [`Credential`]. Serializes in its source format: a JWT
/// credential as its original token string, a JSON-LD credential as an object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiableCredential {
    credential: Credential,
    source: Source,
}

impl VerifiableCredential {
    /// Parse a credential from a JSON-LD object or a compact JWT.
    ///
    /// Leading and trailing whitespace is ignored. Text starting with `{` is
    /// read as JSON-LD, anything else as a JWT. JWT signatures are not
    /// verified.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a well-formed credential in the
    /// detected format, or a registered JWT claim has the wrong type.
    pub fn parse(text: &str) -> Result<Self> {
        match Envelope::detect(text) {
            Envelope::JsonLd(raw) => Self::parse_json_ld(raw),
            Envelope::Jwt(raw) => Self::parse_jwt(raw),
        }
    }

    fn parse_json_ld(raw: &str) -> Result<Self> {
        let object: Map<String, Value> = serde_json::from_str(raw)?;
        let credential = Credential::from_object(object)?;
        debug!(types = ?credential.type_, "parsed JSON-LD credential");

        Ok(Self {
            credential,
            source: Source::JsonLd { raw: Some(raw.to_string()) },
        })
    }

    fn parse_jwt(raw: &str) -> Result<Self> {
        let token = Token::decode(raw)?;
        let claims = &token.claims;

        let mut credential = match jwt::object_claim(claims, "vc")? {
            Some(vc) => Credential::from_object(vc.clone())?,
            None => Credential::default(),
        };

        if let Some(exp) = jwt::date_claim(claims, "exp")? {
            credential.expiration_date = Some(exp);
        }
        if let Some(iss) = jwt::uri_claim(claims, "iss")? {
            credential.issuer = Some(Kind::String(iss));
        }
        if let Some(nbf) = jwt::date_claim(claims, "nbf")? {
            credential.issuance_date = Some(nbf);
        }
        if let Some(sub) = jwt::string_claim(claims, "sub")?.filter(|s| !s.is_empty()) {
            for subject in &mut credential.credential_subject {
                let previous = subject.insert("id".to_string(), Value::String(sub.to_string()));
                if let Some(previous) = previous.filter(|p| p.as_str() != Some(sub)) {
                    warn!(%previous, sub, "JWT 'sub' claim replaces credentialSubject id");
                }
            }
        }
        if let Some(jti) = jwt::uri_claim(claims, "jti")? {
            credential.id = Some(jti);
        }
        debug!(types = ?credential.type_, "parsed JWT credential");

        Ok(Self {
            credential,
            source: Source::Jwt {
                raw: raw.to_string(),
                token,
            },
        })
    }

    /// The credential's format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.source.format()
    }

    /// The text the credential was parsed from. `None` for a credential
    /// built in memory.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.source.raw()
    }

    /// A copy of the decoded JWT, for JWT credentials.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        self.source.token()
    }

    /// The credential fields.
    #[must_use]
    pub const fn credential(&self) -> &Credential {
        &self.credential
    }
}

impl From<Credential> for VerifiableCredential {
    fn from(credential: Credential) -> Self {
        Self {
            credential,
            source: Source::JsonLd { raw: None },
        }
    }
}

impl Deref for VerifiableCredential {
    type Target = Credential;

    fn deref(&self) -> &Self::Target {
        &self.credential
    }
}

impl std::str::FromStr for VerifiableCredential {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for VerifiableCredential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.source {
            Source::Jwt { raw, .. } => serializer.serialize_str(raw),
            Source::JsonLd { .. } => {
                self.credential.to_json().map_err(S::Error::custom)?.serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for VerifiableCredential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = embedded_text(deserializer)?;
        Self::parse(&text).map_err(D::Error::custom)
    }
}

/// Build a JWT credential from `template` and have `signer` sign it.
///
/// The `vc` claim carries the template's `@context`, `type`,
/// `credentialSubject` and `credentialStatus`. Registered claims come from
/// the issuer (`iss`), the subject DID (`sub`), `id` (`jti`), `issuanceDate`
/// (`nbf`) and `expirationDate` (`exp`). The header carries `typ: JWT`; the
/// signer adds the rest.
///
/// The signed token is parsed back, so the result is exactly what parsing the
/// signer's output independently would give.
///
/// # Errors
///
/// Returns an error if the template uses `validFrom` or `validUntil`, has no
/// issuer or no single subject DID, or signing or re-parsing fails.
pub async fn create_jwt_credential(
    template: &Credential, signer: &impl JwtSigner,
) -> Result<VerifiableCredential> {
    if template.valid_from.is_some() || template.valid_until.is_some() {
        return Err(Error::InvalidCredential(
            "cannot use validFrom/validUntil to generate JWT-VCs".into(),
        ));
    }
    let Some(issuer) = template.issuer_id() else {
        return Err(Error::InvalidCredential("template has no issuer".into()));
    };
    let subject = template.subject_did()?;

    let mut vc = Map::new();
    vc.insert("@context".into(), serde_json::to_value(&template.context)?);
    vc.insert("type".into(), serde_json::to_value(&template.type_)?);
    vc.insert("credentialSubject".into(), serde_json::to_value(&template.credential_subject)?);
    if let Some(status) = &template.credential_status {
        vc.insert("credentialStatus".into(), serde_json::to_value(status)?);
    }

    let mut claims = Map::new();
    claims.insert("iss".into(), Value::from(issuer));
    claims.insert("sub".into(), Value::from(subject.to_string()));
    claims.insert("vc".into(), Value::Object(vc));
    if let Some(id) = &template.id {
        claims.insert("jti".into(), Value::from(id.as_str()));
    }
    if let Some(nbf) = template.issuance_date {
        claims.insert("nbf".into(), Value::from(nbf.timestamp()));
    }
    if let Some(exp) = template.expiration_date {
        claims.insert("exp".into(), Value::from(exp.timestamp()));
    }

    let mut headers = Map::new();
    headers.insert("typ".into(), Value::from("JWT"));

    let token = signer.sign(&claims, &headers).await.map_err(Error::Signer)?;
    VerifiableCredential::parse_jwt(token.trim())
}
