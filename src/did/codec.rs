//! # Ed25519 Key Codec
//!
//! A [`KeyCodec`] for Ed25519 public keys in each of the registered
//! verification method representations:
//!
//! | Type                         | Material                                  |
//! |------------------------------|-------------------------------------------|
//! | `Ed25519VerificationKey2018` | `publicKeyBase58` (raw key)               |
//! | `Ed25519VerificationKey2020` | `publicKeyMultibase` (base58btc raw key)  |
//! | `Multikey`                   | `publicKeyMultibase` (`0xed01` + key)     |
//! | `JsonWebKey2020`             | `publicKeyJwk` (`OKP` / `Ed25519`)        |

use base64ct::{Base64UrlUnpadded, Encoding};
use ed25519_dalek::{PUBLIC_KEY_LENGTH, VerifyingKey};
use multibase::Base;
use serde_json::{Map, Value};

use crate::did::{KeyMaterial, KeyType, VerificationMethod};
use crate::provider::KeyCodec;
use crate::{Error, Result};

/// Multicodec prefix for an Ed25519 public key.
pub const ED25519_CODEC: [u8; 2] = [0xed, 0x01];

/// Encodes and decodes Ed25519 public keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Codec;

impl KeyCodec for Ed25519Codec {
    fn encode(&self, key_type: &KeyType, public_key: &[u8]) -> Result<KeyMaterial> {
        let key = verifying_key(public_key)?;
        let key_bytes = key.as_bytes();

        let material = match key_type {
            KeyType::Ed25519VerificationKey2018 => KeyMaterial::Base58(base58(key_bytes)),
            KeyType::Ed25519VerificationKey2020 => {
                KeyMaterial::Multibase(multibase::encode(Base::Base58Btc, key_bytes))
            }
            KeyType::Multikey => {
                let mut multi_bytes = ED25519_CODEC.to_vec();
                multi_bytes.extend_from_slice(key_bytes);
                KeyMaterial::Multibase(multibase::encode(Base::Base58Btc, &multi_bytes))
            }
            KeyType::JsonWebKey2020 => {
                let mut jwk = Map::new();
                jwk.insert("kty".into(), Value::from("OKP"));
                jwk.insert("crv".into(), Value::from("Ed25519"));
                jwk.insert("x".into(), Value::from(Base64UrlUnpadded::encode_string(key_bytes)));
                KeyMaterial::Jwk(jwk)
            }
            other => return Err(Error::UnsupportedKeyType(other.to_string())),
        };
        Ok(material)
    }

    fn decode(&self, method: &VerificationMethod) -> Result<Vec<u8>> {
        let key_bytes = match (&method.type_, &method.key) {
            (KeyType::Ed25519VerificationKey2018, KeyMaterial::Base58(key)) => {
                let (_, bytes) = multibase::decode(format!("z{key}"))
                    .map_err(|e| Error::InvalidKey(format!("issue decoding base58 key: {e}")))?;
                bytes
            }
            (KeyType::Ed25519VerificationKey2020, KeyMaterial::Multibase(key)) => {
                decode_multibase(key)?
            }
            (KeyType::Multikey, KeyMaterial::Multibase(key)) => {
                let multi_bytes = decode_multibase(key)?;
                let Some(bytes) = multi_bytes.strip_prefix(&ED25519_CODEC) else {
                    return Err(Error::InvalidKey("key is not an Ed25519 multikey".into()));
                };
                bytes.to_vec()
            }
            (KeyType::JsonWebKey2020, KeyMaterial::Jwk(jwk)) => {
                if jwk.get("kty").and_then(Value::as_str) != Some("OKP")
                    || jwk.get("crv").and_then(Value::as_str) != Some("Ed25519")
                {
                    return Err(Error::UnsupportedKeyType("JsonWebKey2020 (non-Ed25519)".into()));
                }
                let Some(x) = jwk.get("x").and_then(Value::as_str) else {
                    return Err(Error::InvalidKey("JWK missing 'x'".into()));
                };
                Base64UrlUnpadded::decode_vec(x)
                    .map_err(|e| Error::InvalidKey(format!("issue decoding JWK 'x': {e}")))?
            }
            (
                KeyType::Ed25519VerificationKey2018
                | KeyType::Ed25519VerificationKey2020
                | KeyType::Multikey
                | KeyType::JsonWebKey2020,
                _,
            ) => {
                return Err(Error::InvalidKey(format!(
                    "key material does not match type {}",
                    method.type_
                )));
            }
            (other, _) => return Err(Error::UnsupportedKeyType(other.to_string())),
        };

        Ok(verifying_key(&key_bytes)?.to_bytes().to_vec())
    }
}

fn verifying_key(public_key: &[u8]) -> Result<VerifyingKey> {
    let bytes: [u8; PUBLIC_KEY_LENGTH] = public_key.try_into().map_err(|_| {
        Error::InvalidKey(format!("public key is not {PUBLIC_KEY_LENGTH} bytes"))
    })?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|e| Error::InvalidKey(format!("not an Ed25519 public key: {e}")))
}

fn decode_multibase(key: &str) -> Result<Vec<u8>> {
    let (base, bytes) = multibase::decode(key)
        .map_err(|e| Error::InvalidKey(format!("issue decoding multibase key: {e}")))?;
    if base != Base::Base58Btc {
        return Err(Error::InvalidKey("multibase base is not Base58Btc".into()));
    }
    Ok(bytes)
}

// Plain base58btc, without the multibase prefix.
fn base58(bytes: &[u8]) -> String {
    let encoded = multibase::encode(Base::Base58Btc, bytes);
    encoded.strip_prefix('z').map(str::to_string).unwrap_or(encoded)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::did::{Did, DidUrl};

    const MULTIKEY: &str = "z6MkmM42vxfqZQsv4ehtTjFFxQ4sQKS2w6WR7emozFAn5cxu";
    const BASE58: &str = "7tnzLiRQDsPSx9sBnAHR7JWsakABXDG4Rdrt9yCmAQBX";
    const JWK_X: &str = "Zmq-CJA17UpFeVmJ-nIKDuDEhUnoRSNIXFbxyBtCh6Y";

    fn raw_key() -> Vec<u8> {
        Base64UrlUnpadded::decode_vec(JWK_X).unwrap()
    }

    fn method(type_: KeyType) -> VerificationMethod {
        VerificationMethod::new(
            DidUrl::parse("did:example:123#key-1").unwrap(),
            type_,
            Did::parse("did:example:123").unwrap(),
            &raw_key(),
            &Ed25519Codec,
        )
        .unwrap()
    }

    #[test]
    fn encodings() {
        assert_eq!(method(KeyType::Multikey).key, KeyMaterial::Multibase(MULTIKEY.into()));
        assert_eq!(
            method(KeyType::Ed25519VerificationKey2018).key,
            KeyMaterial::Base58(BASE58.into())
        );
        assert_eq!(
            method(KeyType::Ed25519VerificationKey2020).key,
            KeyMaterial::Multibase(format!("z{BASE58}"))
        );

        let vm = method(KeyType::JsonWebKey2020);
        assert_eq!(
            serde_json::to_value(vm.key.jwk().unwrap()).unwrap(),
            json!({"kty": "OKP", "crv": "Ed25519", "x": JWK_X})
        );
    }

    #[test]
    fn decodes_every_type() {
        for type_ in [
            KeyType::Multikey,
            KeyType::Ed25519VerificationKey2018,
            KeyType::Ed25519VerificationKey2020,
            KeyType::JsonWebKey2020,
        ] {
            let vm = method(type_);
            assert_eq!(vm.public_key(&Ed25519Codec).unwrap(), raw_key());
        }
    }

    #[test]
    fn unsupported_type() {
        let err = VerificationMethod::new(
            DidUrl::parse("did:example:123#key-1").unwrap(),
            KeyType::EcdsaSecp256k1VerificationKey2019,
            Did::parse("did:example:123").unwrap(),
            &raw_key(),
            &Ed25519Codec,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedKeyType(t) if t == "EcdsaSecp256k1VerificationKey2019"));
    }

    #[test]
    fn wrong_length() {
        let err = Ed25519Codec.encode(&KeyType::Multikey, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::InvalidKey(_)));
    }
}
