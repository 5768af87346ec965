//! Tests for DID and DID URL parsing through the public API.

use std::collections::HashSet;

use vercre_ssi::Error;
use vercre_ssi::did::{Did, DidError, DidUrl, Document};

// Canonical strings survive a parse/print round trip byte for byte.
#[test]
fn round_trip() {
    let inputs = [
        "did:example:123",
        "did:example:123#key-1",
        "did:web:localhost%3A8443:user:alice",
        "did:example:123/path/to%2Fresource",
        "did:example:123?service=files&versionId=1#key-1",
        "did:ion:EiD7M8RYnUuir2bm21uu-5YmWcqqQEie-T-jYEOEBeEWJQ:eyJkZWx0YSI6e30",
        "did:example:%E2%82%AC",
        "did:example:123?versionTime=2021-05-10T17:00:00Z",
        "did:example:123?k=a%20b",
        "did:example:123?relativeRef=/resume.pdf&service=files",
    ];
    for input in inputs {
        let url: DidUrl = input.parse().unwrap_or_else(|e| panic!("{input}: {e}"));
        assert_eq!(url.to_string(), input);
    }
}

#[test]
fn equality_laws() {
    let a = DidUrl::must_parse("did:ex:1?k1=a&k2=b");
    let b = DidUrl::must_parse("did:ex:1?k2=b&k1=a");
    let c: DidUrl = serde_json::from_str("\"did:ex:1?k1=a&k2=b\"").unwrap();

    assert_eq!(a, a);
    assert_eq!(a, b);
    assert_eq!(b, a);
    assert_eq!(b, c);
    assert_eq!(a, c);

    let set: HashSet<_> = [a, b, c].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn plain_did_rejects_url_parts() {
    let err = Did::parse("did:example:123/path").unwrap_err();
    assert!(err.to_string().contains("can not have path, fragment or query params"));

    let url = DidUrl::must_parse("did:example:123#key-1");
    assert!(Did::try_from(url).is_err());
    let did = Did::try_from(DidUrl::must_parse("did:example:123")).expect("no URL parts");
    assert_eq!(did.to_string(), "did:example:123");
}

#[test]
fn grammar_cause_preserved() {
    let err: Error = Did::parse("did:Example:123").unwrap_err().into();
    assert!(matches!(err, Error::InvalidDid(DidError::InvalidMethod(_))));

    // wrapped, not replaced, when surfaced by the document resolver
    let err = Document::parse(r#"{"id": "did:example:123", "controller": "did:Example:456"}"#)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDocument { .. }));
    let source = std::error::Error::source(&err).and_then(|e| e.downcast_ref::<DidError>());
    assert!(matches!(source, Some(DidError::InvalidMethod(_))));
}

#[test]
fn relative_references() {
    let base = Did::must_parse("did:example:123");

    let fragment = DidUrl::parse_reference("#key-1").unwrap();
    assert!(fragment.is_relative());
    assert!(DidUrl::parse("#key-1").is_err());
    assert_eq!(fragment.resolve_against(&base).to_string(), "did:example:123#key-1");

    let absolute = DidUrl::must_parse("did:example:456#key-1");
    assert_eq!(absolute.resolve_against(&base), absolute);
}
