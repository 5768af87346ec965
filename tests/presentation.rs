//! Tests for parsing and serializing Verifiable Presentations.

use serde_json::json;
use vercre_ssi::vc::{Format, VP_TYPE, VerifiablePresentation};

// From the W3C VC Data Model, example "verifiable presentation using JWT
// compact serialization". Embeds the credential in `data/vc.jwt`.
const VP_JWT: &str = include_str!("data/vp.jwt");
const VC_JWT: &str = include_str!("data/vc.jwt");

#[test]
fn jwt_claims_mapped() {
    let vp = VerifiablePresentation::parse(VP_JWT).expect("should parse");

    assert_eq!(vp.format(), Format::Jwt);
    assert!(vp.is_type(VP_TYPE));
    assert!(vp.is_type("CredentialManagerPresentation"));
    assert_eq!(vp.id.as_deref(), Some("urn:uuid:3978344f-8596-4c3a-a978-8fcaba3903c5"));
    assert_eq!(vp.holder.as_deref(), Some("did:example:ebfeb1f712ebc6f1c276e12ec21"));
    assert_eq!(vp.token().expect("should have token").header["kid"], json!("did:example:0xabc#key1"));

    let vc = &vp.verifiable_credential[0];
    assert_eq!(vc.format(), Format::Jwt);
    assert_eq!(vc.raw(), Some(VC_JWT));
    assert!(vc.is_type("UniversityDegreeCredential"));
}

#[test]
fn jwt_serializes_verbatim() {
    let vp = VerifiablePresentation::parse(VP_JWT).expect("should parse");
    assert_eq!(serde_json::to_value(&vp).unwrap(), json!(VP_JWT));

    // embedded in another JSON document
    let wrapper: serde_json::Map<String, serde_json::Value> =
        serde_json::from_value(json!({"vp": VP_JWT})).unwrap();
    let embedded: VerifiablePresentation = serde_json::from_value(wrapper["vp"].clone()).unwrap();
    assert_eq!(embedded.raw(), Some(VP_JWT));
}

// JWT credentials inside a JSON-LD presentation stay JWT strings; JSON-LD
// credentials stay objects.
#[test]
fn mixed_credentials() {
    let input = json!({
        "@context": ["https://www.w3.org/2018/credentials/v1"],
        "type": ["VerifiablePresentation"],
        "verifiableCredential": [
            VC_JWT,
            {
                "type": "VerifiableCredential",
                "issuer": "did:example:issuer",
                "credentialSubject": {"id": "did:example:holder"}
            }
        ]
    });
    let vp = VerifiablePresentation::parse(&input.to_string()).expect("should parse");

    assert_eq!(vp.format(), Format::JsonLd);
    assert_eq!(vp.verifiable_credential[0].format(), Format::Jwt);
    assert_eq!(vp.verifiable_credential[1].format(), Format::JsonLd);

    let output = serde_json::to_value(&vp).unwrap();
    assert_eq!(output["@context"], json!("https://www.w3.org/2018/credentials/v1"));
    assert_eq!(output["type"], json!("VerifiablePresentation"));
    assert_eq!(output["verifiableCredential"][0], json!(VC_JWT));
    assert_eq!(output["verifiableCredential"][1], input["verifiableCredential"][1]);
}
