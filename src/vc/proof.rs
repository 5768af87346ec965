//! # Proofs and Status
//!
//! Typed views over the `proof` and `credentialStatus` entries of a credential
//! or presentation. The entries themselves are kept as JSON objects so members
//! this crate does not model survive a round trip.
//!
//! See [Data Integrity](https://www.w3.org/TR/vc-data-integrity/#proofs) and
//! [Status](https://www.w3.org/TR/vc-data-model/#status).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An embedded proof.
///
/// Only the members common to the linked-data proof suites are typed. Suite
/// specific members (`domain`, `nonce`, `previousProof` and the like) are
/// left in `extra`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_field_names)]
pub struct Proof {
    /// The proof type, e.g. `Ed25519Signature2020` or `DataIntegrityProof`.
    #[serde(rename = "type")]
    pub type_: String,

    /// The cryptosuite used by a `DataIntegrityProof`, e.g. `eddsa-rdfc-2022`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cryptosuite: Option<String>,

    /// When the proof was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// The key used to verify the proof, usually a DID URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<String>,

    /// Why the proof was made, e.g. `assertionMethod`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<String>,

    /// Guards against replay when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,

    /// Multibase-encoded signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,

    /// Detached JWS signature, used by the 2018/2019 suites.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jws: Option<String>,

    /// Any other members.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A `credentialStatus` entry.
///
/// `id` and `type` are required. The remaining members depend on the status
/// mechanism and are kept in `extra` for the caller to project into its own
/// type with [`CredentialStatus::custom`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialStatus {
    /// The status entry's URI.
    pub id: String,

    /// The status mechanism, e.g. `StatusList2021Entry`.
    #[serde(rename = "type")]
    pub type_: String,

    /// Mechanism-specific members.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CredentialStatus {
    /// Deserialize the whole entry, including `id` and `type`, into `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not match `T`.
    pub fn custom<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_value(serde_json::to_value(self)?)?)
    }
}
