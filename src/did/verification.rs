//! # Verification Methods
//!
//! A DID document can express verification methods, such as cryptographic
//! public keys, which can be used to authenticate or authorize interactions
//! with the DID subject or associated parties.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::did::{Did, DidUrl};
use crate::provider::KeyCodec;
use crate::{Error, Result};

/// A verification method: a public key addressable by its own DID URL.
///
/// MAY include additional properties which can be determined from the
/// verification method as registered in the
/// [DID Specification Registries](https://www.w3.org/TR/did-spec-registries/).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "RawVerificationMethod", into = "RawVerificationMethod")]
pub struct VerificationMethod {
    /// A DID URL that identifies the verification method. May be relative to
    /// the containing document (`#key-1`).
    pub id: DidUrl,

    /// The key type, as registered in the DID Specification Registries.
    pub type_: KeyType,

    /// The DID of the controller of the verification method.
    ///
    /// Required in a parsed document. Methods added to a document with no
    /// controller set are given the document's DID.
    pub controller: Option<Did>,

    /// The public key material.
    pub key: KeyMaterial,
}

impl VerificationMethod {
    /// Build a verification method by encoding a raw public key with `codec`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedKeyType`] if the codec cannot encode keys of
    /// `type_`, or [`Error::InvalidKey`] if the key bytes are not a valid key.
    pub fn new(
        id: DidUrl, type_: KeyType, controller: Did, public_key: &[u8], codec: &impl KeyCodec,
    ) -> Result<Self> {
        let key = codec.encode(&type_, public_key)?;
        Ok(Self {
            id,
            type_,
            controller: Some(controller),
            key,
        })
    }

    /// Decode the raw public key using `codec`.
    ///
    /// # Errors
    ///
    /// Returns an error if the codec does not support the method's type or the
    /// key material cannot be decoded.
    pub fn public_key(&self, codec: &impl KeyCodec) -> Result<Vec<u8>> {
        codec.decode(self)
    }

    /// Decode a method from JSON, keeping document errors intact.
    pub(crate) fn from_json(value: Value) -> Result<Self> {
        let raw: RawVerificationMethod = serde_json::from_value(value)?;
        Self::try_from(raw)
    }

    /// The DID the method's id belongs to, if the id is absolute.
    #[must_use]
    pub fn did(&self) -> Option<&Did> {
        self.id.did()
    }
}

/// Public key material. A verification method carries exactly one encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyMaterial {
    /// `publicKeyJwk`
    Jwk(Map<String, Value>),

    /// `publicKeyMultibase`
    Multibase(String),

    /// `publicKeyBase58` (deprecated, but still common).
    Base58(String),
}

impl KeyMaterial {
    /// The JWK, if the key is JWK encoded.
    #[must_use]
    pub const fn jwk(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Jwk(jwk) => Some(jwk),
            _ => None,
        }
    }

    /// The multibase string, if the key is multibase encoded.
    #[must_use]
    pub fn multibase(&self) -> Option<&str> {
        match self {
            Self::Multibase(multibase) => Some(multibase),
            _ => None,
        }
    }

    /// The base58 string, if the key is base58 encoded.
    #[must_use]
    pub fn base58(&self) -> Option<&str> {
        match self {
            Self::Base58(base58) => Some(base58),
            _ => None,
        }
    }
}

/// Verification method types from the DID Specification Registries.
///
/// Unregistered types are kept verbatim so documents using them still parse.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// `JsonWebKey2020`
    JsonWebKey2020,

    /// `Ed25519VerificationKey2018`
    Ed25519VerificationKey2018,

    /// `Ed25519VerificationKey2020`
    Ed25519VerificationKey2020,

    /// `EcdsaSecp256k1VerificationKey2019`
    EcdsaSecp256k1VerificationKey2019,

    /// `X25519KeyAgreementKey2019`
    X25519KeyAgreementKey2019,

    /// `RsaVerificationKey2018`
    RsaVerificationKey2018,

    /// `Multikey`
    Multikey,

    /// Any other type.
    Other(String),
}

impl KeyType {
    /// The registered type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::JsonWebKey2020 => "JsonWebKey2020",
            Self::Ed25519VerificationKey2018 => "Ed25519VerificationKey2018",
            Self::Ed25519VerificationKey2020 => "Ed25519VerificationKey2020",
            Self::EcdsaSecp256k1VerificationKey2019 => "EcdsaSecp256k1VerificationKey2019",
            Self::X25519KeyAgreementKey2019 => "X25519KeyAgreementKey2019",
            Self::RsaVerificationKey2018 => "RsaVerificationKey2018",
            Self::Multikey => "Multikey",
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for KeyType {
    fn from(s: &str) -> Self {
        match s {
            "JsonWebKey2020" => Self::JsonWebKey2020,
            "Ed25519VerificationKey2018" => Self::Ed25519VerificationKey2018,
            "Ed25519VerificationKey2020" => Self::Ed25519VerificationKey2020,
            "EcdsaSecp256k1VerificationKey2019" => Self::EcdsaSecp256k1VerificationKey2019,
            "X25519KeyAgreementKey2019" => Self::X25519KeyAgreementKey2019,
            "RsaVerificationKey2018" => Self::RsaVerificationKey2018,
            "Multikey" => Self::Multikey,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for KeyType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl Display for KeyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for KeyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for KeyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// The verification relationships a DID document can express.
#[derive(Clone, Copy, Debug, Deserialize, Hash, PartialEq, Serialize, Eq)]
#[serde(rename_all = "camelCase")]
pub enum KeyPurpose {
    /// The document's `authentication` field.
    Authentication,

    /// The document's `assertionMethod` field.
    AssertionMethod,

    /// The document's `keyAgreement` field.
    KeyAgreement,

    /// The document's `capabilityInvocation` field.
    CapabilityInvocation,

    /// The document's `capabilityDelegation` field.
    CapabilityDelegation,
}

impl KeyPurpose {
    /// Every relationship, in document order.
    pub const ALL: [Self; 5] = [
        Self::Authentication,
        Self::AssertionMethod,
        Self::KeyAgreement,
        Self::CapabilityInvocation,
        Self::CapabilityDelegation,
    ];

    /// The JSON property holding the relationship.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::AssertionMethod => "assertionMethod",
            Self::KeyAgreement => "keyAgreement",
            Self::CapabilityInvocation => "capabilityInvocation",
            Self::CapabilityDelegation => "capabilityDelegation",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl Display for KeyPurpose {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry in one of a document's verification relationships.
///
/// Relationships either embed a method that belongs to the relationship alone
/// or reference one of the document's `verificationMethod` entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationRelationship {
    /// A method defined inline in the relationship.
    Embedded(VerificationMethod),

    /// A reference to a method in the document's `verificationMethod` list.
    Reference {
        /// The reference as written (possibly relative).
        reference: DidUrl,

        /// The absolute id of the referenced method.
        resolved: DidUrl,
    },
}

impl VerificationRelationship {
    /// The absolute id of the method the relationship resolves to, qualified
    /// against `base` where needed.
    #[must_use]
    pub fn resolved_id(&self, base: &Did) -> DidUrl {
        match self {
            Self::Embedded(method) => method.id.resolve_against(base),
            Self::Reference { resolved, .. } => resolved.clone(),
        }
    }

    /// `true` if the relationship was written as a reference.
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }
}

// Wire form of a verification method. Every field is optional here so that
// missing fields surface as document errors rather than serde errors.
#[derive(Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawVerificationMethod {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    type_: Option<KeyType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    controller: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    public_key_jwk: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    public_key_multibase: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    public_key_base58: Option<String>,
}

impl TryFrom<RawVerificationMethod> for VerificationMethod {
    type Error = Error;

    fn try_from(raw: RawVerificationMethod) -> Result<Self> {
        let Some(id) = raw.id else {
            return Err(Error::document("verification method missing id"));
        };
        let id = DidUrl::parse_reference(&id).map_err(|e| Error::InvalidDocument {
            reason: format!("invalid verification method id '{id}'"),
            source: Some(e),
        })?;
        let Some(type_) = raw.type_ else {
            return Err(Error::document(format!("verification method '{id}' missing type")));
        };
        let controller = raw
            .controller
            .map(|c| {
                Did::parse(&c).map_err(|e| Error::InvalidDocument {
                    reason: format!("invalid controller '{c}' on verification method '{id}'"),
                    source: Some(e),
                })
            })
            .transpose()?;

        let mut encodings = Vec::with_capacity(1);
        if let Some(jwk) = raw.public_key_jwk.filter(|jwk| !jwk.is_empty()) {
            encodings.push(KeyMaterial::Jwk(jwk));
        }
        if let Some(multibase) = raw.public_key_multibase.filter(|s| !s.is_empty()) {
            encodings.push(KeyMaterial::Multibase(multibase));
        }
        if let Some(base58) = raw.public_key_base58.filter(|s| !s.is_empty()) {
            encodings.push(KeyMaterial::Base58(base58));
        }
        if encodings.len() > 1 {
            return Err(Error::document(format!(
                "verification method '{id}': only one of publicKeyJwk, publicKeyMultibase and publicKeyBase58 can be present"
            )));
        }
        let Some(key) = encodings.pop() else {
            return Err(Error::document(format!("verification method '{id}' has no key material")));
        };

        Ok(Self {
            id,
            type_,
            controller,
            key,
        })
    }
}

impl From<VerificationMethod> for RawVerificationMethod {
    fn from(method: VerificationMethod) -> Self {
        let mut raw = Self {
            id: Some(method.id.to_string()),
            type_: Some(method.type_),
            controller: method.controller.map(|c| c.to_string()),
            ..Self::default()
        };
        match method.key {
            KeyMaterial::Jwk(jwk) => raw.public_key_jwk = Some(jwk),
            KeyMaterial::Multibase(multibase) => raw.public_key_multibase = Some(multibase),
            KeyMaterial::Base58(base58) => raw.public_key_base58 = Some(base58),
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn multikey() {
        let json = json!({
            "id": "did:web:example.com#key-0",
            "type": "Multikey",
            "controller": "did:web:example.com",
            "publicKeyMultibase": "z6MkmM42vxfqZQsv4ehtTjFFxQ4sQKS2w6WR7emozFAn5cxu"
        });
        let vm: VerificationMethod = serde_json::from_value(json.clone()).unwrap();

        assert_eq!(vm.id, DidUrl::parse("did:web:example.com#key-0").unwrap());
        assert_eq!(vm.type_, KeyType::Multikey);
        assert_eq!(vm.controller, Some(Did::parse("did:web:example.com").unwrap()));
        assert_eq!(
            vm.key.multibase(),
            Some("z6MkmM42vxfqZQsv4ehtTjFFxQ4sQKS2w6WR7emozFAn5cxu")
        );
        assert_eq!(serde_json::to_value(&vm).unwrap(), json);
    }

    #[test]
    fn json_web_key() {
        let json = json!({
            "id": "#key-0",
            "type": "JsonWebKey2020",
            "controller": "did:web:example.com",
            "publicKeyJwk": {
                "kty": "OKP",
                "crv": "Ed25519",
                "x": "Zmq-CJA17UpFeVmJ-nIKDuDEhUnoRSNIXFbxyBtCh6Y"
            }
        });
        let vm: VerificationMethod = serde_json::from_value(json.clone()).unwrap();

        assert!(vm.id.is_relative());
        assert_eq!(vm.key.jwk().and_then(|jwk| jwk.get("crv")), Some(&json!("Ed25519")));
        assert_eq!(serde_json::to_value(&vm).unwrap(), json);
    }

    #[test]
    fn unregistered_type() {
        let vm: VerificationMethod = serde_json::from_value(json!({
            "id": "did:example:123#key-1",
            "type": "BespokeKey2031",
            "publicKeyBase58": "7tnzLiRQDsPSx9sBnAHR7JWsakABXDG4Rdrt9yCmAQBX"
        }))
        .unwrap();

        assert_eq!(vm.type_, KeyType::Other("BespokeKey2031".into()));
        assert_eq!(vm.controller, None);
    }

    #[test]
    fn one_key_encoding() {
        let err = serde_json::from_value::<VerificationMethod>(json!({
            "id": "did:example:123#key-1",
            "type": "Ed25519VerificationKey2018",
            "controller": "did:example:123",
            "publicKeyBase58": "7tnzLiRQDsPSx9sBnAHR7JWsakABXDG4Rdrt9yCmAQBX",
            "publicKeyMultibase": "z7tnzLiRQDsPSx9sBnAHR7JWsakABXDG4Rdrt9yCmAQBX"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("only one of"));

        let err = serde_json::from_value::<VerificationMethod>(json!({
            "id": "did:example:123#key-1",
            "type": "Ed25519VerificationKey2018",
            "controller": "did:example:123"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("no key material"));
    }

    #[test]
    fn required_fields() {
        let err = serde_json::from_value::<VerificationMethod>(json!({
            "type": "Multikey",
            "publicKeyMultibase": "z6MkmM42vxfqZQsv4ehtTjFFxQ4sQKS2w6WR7emozFAn5cxu"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("missing id"));

        let err = serde_json::from_value::<VerificationMethod>(json!({
            "id": "did:example:123#key-1",
            "type": "Multikey",
            "controller": "did:example:123#key-1",
            "publicKeyMultibase": "z6MkmM42vxfqZQsv4ehtTjFFxQ4sQKS2w6WR7emozFAn5cxu"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("invalid controller"));
    }

    #[test]
    fn key_purpose_names() {
        assert_eq!(KeyPurpose::AssertionMethod.to_string(), "assertionMethod");
        assert_eq!(
            serde_json::to_value(KeyPurpose::CapabilityDelegation).unwrap(),
            json!("capabilityDelegation")
        );
        assert_eq!(KeyPurpose::ALL[KeyPurpose::KeyAgreement.index()], KeyPurpose::KeyAgreement);
    }
}
