//! Tests for parsing, serializing and issuing Verifiable Credentials.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{TimeDelta, TimeZone, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use serde_json::{Map, Value, json};
use vercre_ssi::vc::{
    Credential, Format, VC_CONTEXT_V1, VC_TYPE, VerifiableCredential, create_jwt_credential,
};
use vercre_ssi::{Error, JwtSigner, Kind};

// From the W3C VC Data Model, example "verifiable credential using JWT compact
// serialization".
const VC_JWT: &str = include_str!("data/vc.jwt");

struct TestSigner(SigningKey);

impl TestSigner {
    fn new() -> Self {
        Self(SigningKey::from_bytes(&[7; 32]))
    }
}

impl JwtSigner for TestSigner {
    async fn sign(
        &self, claims: &Map<String, Value>, headers: &Map<String, Value>,
    ) -> anyhow::Result<String> {
        let mut headers = headers.clone();
        headers.insert("alg".into(), json!("EdDSA"));
        headers.insert("kid".into(), json!("did:example:issuer#key-1"));

        let header = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&headers)?);
        let payload = Base64UrlUnpadded::encode_string(&serde_json::to_vec(claims)?);
        let signature = self.0.sign(format!("{header}.{payload}").as_bytes());
        Ok(format!("{header}.{payload}.{}", Base64UrlUnpadded::encode_string(&signature.to_bytes())))
    }
}

fn unsigned(claims: &Value) -> String {
    let header = Base64UrlUnpadded::encode_string(json!({"alg": "none"}).to_string().as_bytes());
    let payload = Base64UrlUnpadded::encode_string(claims.to_string().as_bytes());
    format!("{header}.{payload}.")
}

#[test]
fn jwt_claims_mapped() {
    let vc = VerifiableCredential::parse(VC_JWT).expect("should parse");

    assert_eq!(vc.format(), Format::Jwt);
    assert!(vc.is_type("UniversityDegreeCredential"));
    assert!(vc.contains_context(VC_CONTEXT_V1));
    assert_eq!(vc.issuer_id(), Some("https://example.com/keys/foo.jwk"));
    assert_eq!(vc.id.as_deref(), Some("http://example.edu/credentials/3732"));
    assert_eq!(vc.issuance_date.map(|d| d.timestamp()), Some(1_541_493_724));
    assert_eq!(vc.expiration_date.map(|d| d.timestamp()), Some(1_573_029_723));
    assert_eq!(vc.credential_subject[0]["degree"]["type"], json!("BachelorDegree"));
    assert_eq!(vc.subject_did().unwrap().to_string(), "did:example:ebfeb1f712ebc6f1c276e12ec21");

    let token = vc.token().expect("should have token");
    assert_eq!(token.header["alg"], json!("RS256"));
    assert_eq!(token.claims["nonce"], json!("660!6345FSer"));
    assert!(!token.signature.is_empty());
}

#[test]
fn jwt_serializes_verbatim() {
    let vc = VerifiableCredential::parse(&format!("\n  {VC_JWT}\n")).expect("should parse");
    assert_eq!(vc.raw(), Some(VC_JWT));
    assert_eq!(serde_json::to_string(&vc).unwrap(), format!("\"{VC_JWT}\""));

    let embedded: VerifiableCredential = serde_json::from_value(json!(VC_JWT)).unwrap();
    assert_eq!(embedded, vc);
}

#[test]
fn json_ld_normalized() {
    let input = r#"{"id":"did:example:123#vc-1","type":["VerifiableCredential","custom"],"credentialSubject":{"name":"test"}}"#;
    let vc = VerifiableCredential::parse(input).expect("should parse");

    assert_eq!(vc.format(), Format::JsonLd);
    assert_eq!(vc.raw(), Some(input));
    assert_eq!(vc.type_, vec![VC_TYPE, "custom"]);
    assert_eq!(vc.credential_subject.len(), 1);

    let output = serde_json::to_value(&vc).unwrap();
    assert_eq!(output, serde_json::from_str::<Value>(input).unwrap());
}

#[test]
fn valid_at() {
    let vc = VerifiableCredential::parse(r#"{"issuanceDate": "1999-01-01T00:00:00Z"}"#).unwrap();
    let at = |year| Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();

    assert!(vc.valid_at(at(2000), TimeDelta::zero()));
    assert!(!vc.valid_at(at(1998), TimeDelta::zero()));
    assert!(vc.valid_at(at(1998), TimeDelta::days(365)));
}

#[test]
fn claim_type_mismatch() {
    let cases = [
        ("iss", json!({"iss": 42})),
        ("jti", json!({"jti": ["urn:uuid:1"]})),
        ("nbf", json!({"nbf": "yesterday"})),
        ("sub", json!({"sub": {"id": "did:example:1"}})),
        ("vc", json!({"vc": "credential"})),
    ];
    for (name, claims) in cases {
        match VerifiableCredential::parse(&unsigned(&claims)) {
            Err(Error::ClaimTypeMismatch { claim, .. }) => assert_eq!(claim, name),
            other => panic!("{name}: expected claim type mismatch, got {other:?}"),
        }
    }

    let result = VerifiableCredential::parse(&unsigned(&json!({"iss": "not a uri"})));
    assert!(matches!(result, Err(Error::InvalidUri { .. })));
}

#[test]
fn missing_vc_claim() {
    let vc = VerifiableCredential::parse(&unsigned(&json!({"iss": "did:example:issuer"})))
        .expect("should parse");
    assert_eq!(vc.issuer_id(), Some("did:example:issuer"));
    assert!(vc.type_.is_empty());
    assert!(vc.credential_subject.is_empty());
}

#[test]
fn sub_overwrites_subject_ids() {
    let token = unsigned(&json!({
        "sub": "did:example:subject",
        "vc": {
            "credentialSubject": [{"id": "did:example:other"}, {"name": "Alice"}]
        }
    }));
    let vc = VerifiableCredential::parse(&token).expect("should parse");

    assert_eq!(vc.credential_subject[0]["id"], json!("did:example:subject"));
    assert_eq!(vc.credential_subject[1]["id"], json!("did:example:subject"));
    assert_eq!(vc.subject_did().unwrap().to_string(), "did:example:subject");
}

fn template() -> Credential {
    let Value::Object(subject) = json!({"id": "did:example:subject", "name": "Alice"}) else {
        panic!("should be an object");
    };
    Credential {
        context: vec![Kind::from(VC_CONTEXT_V1)],
        id: Some("urn:uuid:3978344f-8596-4c3a-a978-8fcaba3903c5".into()),
        type_: vec![VC_TYPE.into(), "NameCredential".into()],
        issuer: Some(Kind::from("did:example:issuer")),
        issuance_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        expiration_date: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
        credential_subject: vec![subject],
        ..Credential::default()
    }
}

#[tokio::test]
async fn create_jwt() {
    let signer = TestSigner::new();
    let template = template();

    let vc = create_jwt_credential(&template, &signer).await.expect("should create");
    assert_eq!(vc.format(), Format::Jwt);
    assert_eq!(vc.issuer_id(), Some("did:example:issuer"));
    assert_eq!(vc.id, template.id);
    assert_eq!(vc.issuance_date, template.issuance_date);
    assert_eq!(vc.expiration_date, template.expiration_date);
    assert_eq!(vc.type_, template.type_);
    assert_eq!(vc.credential_subject, template.credential_subject);

    let token = vc.token().expect("should have token");
    assert_eq!(token.header["typ"], json!("JWT"));
    assert_eq!(token.claims["sub"], json!("did:example:subject"));
    assert_eq!(token.claims["nbf"], json!(1_704_067_200));

    // the returned credential is what parsing the signer's output gives
    let raw = vc.raw().expect("should have raw");
    assert_eq!(VerifiableCredential::parse(raw).unwrap(), vc);

    let (signing_input, _) = raw.rsplit_once('.').expect("should have signature");
    let signature = Signature::from_slice(&token.signature).expect("should be a signature");
    signer.0.verifying_key().verify(signing_input.as_bytes(), &signature).expect("should verify");
}

#[tokio::test]
async fn create_rejects_valid_from() {
    let template = Credential {
        valid_from: Some(Utc::now()),
        ..template()
    };
    let Err(Error::InvalidCredential(reason)) =
        create_jwt_credential(&template, &TestSigner::new()).await
    else {
        panic!("should reject validFrom");
    };
    assert_eq!(reason, "cannot use validFrom/validUntil to generate JWT-VCs");
}

#[tokio::test]
async fn create_requires_subject() {
    let template = Credential {
        credential_subject: vec![],
        ..template()
    };
    let result = create_jwt_credential(&template, &TestSigner::new()).await;
    assert!(matches!(result, Err(Error::InvalidSubject(_))));
}
