//! # Provider Traits
//!
//! Capabilities the data model relies on but does not implement. Key encoding
//! and token signing are supplied by the caller so the model stays independent
//! of any particular key store or signature suite.

use std::future::Future;

use serde_json::{Map, Value};

use crate::Result;
use crate::did::{KeyMaterial, KeyType, VerificationMethod};

/// [`KeyCodec`] converts between raw public keys and the key material carried
/// by a verification method.
///
/// Implementers dispatch on the declared key type and return
/// [`crate::Error::UnsupportedKeyType`] for types they do not handle.
pub trait KeyCodec {
    /// Encode `public_key` in the representation `key_type` calls for.
    ///
    /// # Errors
    ///
    /// Returns an error if the key type is unsupported or the key bytes are
    /// invalid for the type.
    fn encode(&self, key_type: &KeyType, public_key: &[u8]) -> Result<KeyMaterial>;

    /// Decode the raw public key held by `method`.
    ///
    /// # Errors
    ///
    /// Returns an error if the method's type is unsupported or its key
    /// material cannot be decoded.
    fn decode(&self, method: &VerificationMethod) -> Result<Vec<u8>>;
}

/// [`JwtSigner`] produces compact JWTs for credentials built by this crate.
///
/// Async and fallible because the implementer may call out to a key vault or
/// remote signing service. No timeout or retry is applied to the returned
/// future; wrap the signer if either is needed.
pub trait JwtSigner: Send + Sync {
    /// Sign `claims` with `headers`, returning the compact serialization
    /// `<header>.<claims>.<signature>`.
    ///
    /// The signer is expected to add its own `alg` and `kid` headers.
    fn sign(
        &self, claims: &Map<String, Value>, headers: &Map<String, Value>,
    ) -> impl Future<Output = anyhow::Result<String>> + Send;
}
