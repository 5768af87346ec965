//! # DID Document
//!
//! A DID Document is a JSON-LD document that contains information related to a
//! DID.
//!
//! Verification methods live in a single list owned by the document. The five
//! verification relationships either embed a method of their own or hold the
//! id of an entry in that list, so a method referenced from several
//! relationships exists exactly once.
//!
//! Parsing runs the plural normalizer, decodes the document structure, then
//! binds every relationship reference to its verification method. A reference
//! that does not resolve fails the whole parse.

use std::str::FromStr;

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::Kind;
use crate::did::{Did, DidUrl, KeyPurpose, Service, VerificationMethod, VerificationRelationship};
use crate::plural::{self, DOCUMENT_PLURALS};
use crate::{Error, Result};

/// The DID Core v1 JSON-LD context.
pub const DID_CONTEXT_V1: &str = "https://www.w3.org/ns/did/v1";

/// DID Document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// The context of the DID document.
    pub context: Vec<Kind<Value>>,

    /// The DID for a particular DID subject.
    ///
    /// The subject is defined as the entity identified by the DID and described
    /// by the DID document. Anything can be a DID subject: person, group,
    /// organization, physical thing, digital thing, logical thing, etc.
    pub id: Did,

    /// DIDs of entities authorized to make changes to the DID document.
    pub controller: Vec<Did>,

    /// A set of URIs that are other identifiers for the subject of the above
    /// DID.
    pub also_known_as: Vec<String>,

    /// A set of services, that express ways of communicating with the DID
    /// subject or related entities.
    pub service: Vec<Service>,

    verification_method: Vec<VerificationMethod>,
    relationships: [Vec<VerificationRelationship>; 5],
}

impl Document {
    /// An empty document for `id` with the DID v1 context.
    #[must_use]
    pub fn new(id: Did) -> Self {
        Self {
            context: vec![Kind::String(DID_CONTEXT_V1.to_string())],
            id,
            controller: vec![],
            also_known_as: vec![],
            service: vec![],
            verification_method: vec![],
            relationships: Default::default(),
        }
    }

    /// Parse a DID document from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDocument`] for structural violations and
    /// [`Error::UnresolvedReference`] if a relationship refers to a method the
    /// document does not contain. No partial document is returned.
    pub fn parse(raw: &str) -> Result<Self> {
        let object = plural::normalized_object(raw, DOCUMENT_PLURALS)?;
        Self::from_object(object)
    }

    fn from_object(object: Map<String, Value>) -> Result<Self> {
        let raw: RawDocument = serde_json::from_value(Value::Object(object))?;

        let Some(id) = raw.id else {
            return Err(Error::document("document missing id"));
        };
        let id = Did::parse(&id).map_err(|e| Error::InvalidDocument {
            reason: format!("document id '{id}' is not a DID"),
            source: Some(e),
        })?;

        let controller = raw
            .controller
            .unwrap_or_default()
            .iter()
            .map(|c| {
                Did::parse(c).map_err(|e| Error::InvalidDocument {
                    reason: format!("controller '{c}' is not a DID"),
                    source: Some(e),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let verification_method = raw
            .verification_method
            .unwrap_or_default()
            .into_iter()
            .map(document_method)
            .collect::<Result<Vec<_>>>()?;

        let mut relationships: [Vec<VerificationRelationship>; 5] = Default::default();
        let raw_relationships = [
            raw.authentication,
            raw.assertion_method,
            raw.key_agreement,
            raw.capability_invocation,
            raw.capability_delegation,
        ];
        for (purpose, entries) in KeyPurpose::ALL.into_iter().zip(raw_relationships) {
            relationships[purpose.index()] = entries
                .unwrap_or_default()
                .into_iter()
                .map(|entry| resolve_entry(purpose, entry, &id, &verification_method))
                .collect::<Result<Vec<_>>>()?;
        }

        let service = raw
            .service
            .unwrap_or_default()
            .into_iter()
            .map(Service::from_json)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            did = %id,
            methods = verification_method.len(),
            services = service.len(),
            "parsed DID document"
        );

        Ok(Self {
            context: raw.context.unwrap_or_default(),
            id,
            controller,
            also_known_as: raw.also_known_as.unwrap_or_default(),
            service,
            verification_method,
            relationships,
        })
    }

    /// Check the document against the W3C DID Core data model: the DID v1
    /// context must be present.
    ///
    /// Kept separate from parsing so documents using other contexts can still
    /// be read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDocument`] naming the missing context.
    pub fn validate(&self) -> Result<()> {
        if !self.contains_context(DID_CONTEXT_V1) {
            return Err(Error::document(format!("missing context {DID_CONTEXT_V1}")));
        }
        Ok(())
    }

    /// `true` if `uri` is one of the document's contexts.
    #[must_use]
    pub fn contains_context(&self, uri: &str) -> bool {
        self.context.iter().any(|c| c.as_str() == Some(uri))
    }

    /// The document's verification methods.
    #[must_use]
    pub fn verification_method(&self) -> &[VerificationMethod] {
        &self.verification_method
    }

    /// The entries of one verification relationship.
    #[must_use]
    pub fn relationship(&self, purpose: KeyPurpose) -> &[VerificationRelationship] {
        &self.relationships[purpose.index()]
    }

    /// The `authentication` relationship.
    #[must_use]
    pub fn authentication(&self) -> &[VerificationRelationship] {
        self.relationship(KeyPurpose::Authentication)
    }

    /// The `assertionMethod` relationship.
    #[must_use]
    pub fn assertion_method(&self) -> &[VerificationRelationship] {
        self.relationship(KeyPurpose::AssertionMethod)
    }

    /// The `keyAgreement` relationship.
    #[must_use]
    pub fn key_agreement(&self) -> &[VerificationRelationship] {
        self.relationship(KeyPurpose::KeyAgreement)
    }

    /// The `capabilityInvocation` relationship.
    #[must_use]
    pub fn capability_invocation(&self) -> &[VerificationRelationship] {
        self.relationship(KeyPurpose::CapabilityInvocation)
    }

    /// The `capabilityDelegation` relationship.
    #[must_use]
    pub fn capability_delegation(&self) -> &[VerificationRelationship] {
        self.relationship(KeyPurpose::CapabilityDelegation)
    }

    /// The method a relationship entry is bound to. Referenced methods are
    /// returned from the document's `verificationMethod` list, not copied.
    #[must_use]
    pub fn resolve<'a>(
        &'a self, relationship: &'a VerificationRelationship,
    ) -> Option<&'a VerificationMethod> {
        match relationship {
            VerificationRelationship::Embedded(method) => Some(method),
            VerificationRelationship::Reference { resolved, .. } => {
                find(&self.verification_method, resolved, &self.id)
            }
        }
    }

    /// Every method usable for `purpose`.
    pub fn methods_for(&self, purpose: KeyPurpose) -> impl Iterator<Item = &VerificationMethod> {
        self.relationship(purpose).iter().filter_map(|r| self.resolve(r))
    }

    /// Find a verification method by id, in the `verificationMethod` list or
    /// embedded in a relationship. Relative ids are qualified with the
    /// document's DID.
    #[must_use]
    pub fn find_verification_method(&self, id: &DidUrl) -> Option<&VerificationMethod> {
        let id = id.resolve_against(&self.id);
        find(&self.verification_method, &id, &self.id).or_else(|| {
            self.relationships.iter().flatten().find_map(|r| match r {
                VerificationRelationship::Embedded(m) if m.id.resolve_against(&self.id) == id => {
                    Some(m)
                }
                _ => None,
            })
        })
    }

    /// `true` if `did` is listed as a controller of the document.
    #[must_use]
    pub fn is_controller(&self, did: &Did) -> bool {
        self.controller.contains(did)
    }

    /// Find a service by id. Relative and absolute forms of a DID URL id
    /// match each other.
    #[must_use]
    pub fn service(&self, id: &str) -> Option<&Service> {
        self.service.iter().find(|s| s.matches(id, &self.id))
    }

    /// Find the single service of `service_type` and project its endpoint onto
    /// a URL. Returns the service id and the URL.
    ///
    /// # Errors
    ///
    /// Returns an error if no service or more than one service has the type,
    /// or the endpoint is not a single URL.
    pub fn resolve_endpoint_url(&self, service_type: &str) -> Result<(&str, String)> {
        let mut services = self.service.iter().filter(|s| s.type_ == service_type);
        let Some(service) = services.next() else {
            return Err(Error::document(format!(
                "service not found (did={}, type={service_type})",
                self.id
            )));
        };
        if services.next().is_some() {
            return Err(Error::document(format!(
                "multiple services found (did={}, type={service_type})",
                self.id
            )));
        }
        let url = service.endpoint::<String>().map_err(|_| {
            Error::document(format!("unable to read single URL from service (id={})", service.id))
        })?;
        Ok((service.id.as_str(), url))
    }

    /// Add a verification method to the `verificationMethod` list only.
    ///
    /// Returns `false` if a method with the same id is already present, in
    /// which case the document is unchanged.
    pub fn add_verification_method(&mut self, mut method: VerificationMethod) -> bool {
        if method.controller.is_none() {
            method.controller = Some(self.id.clone());
        }
        let id = method.id.resolve_against(&self.id);
        if find(&self.verification_method, &id, &self.id).is_some() {
            debug!(%id, "verification method already present");
            return false;
        }
        self.verification_method.push(method);
        true
    }

    /// Add `method` to the document and reference it from `authentication`.
    pub fn add_authentication_method(&mut self, method: VerificationMethod) {
        self.add_method(KeyPurpose::Authentication, method);
    }

    /// Add `method` to the document and reference it from `assertionMethod`.
    pub fn add_assertion_method(&mut self, method: VerificationMethod) {
        self.add_method(KeyPurpose::AssertionMethod, method);
    }

    /// Add `method` to the document and reference it from `keyAgreement`.
    pub fn add_key_agreement(&mut self, method: VerificationMethod) {
        self.add_method(KeyPurpose::KeyAgreement, method);
    }

    /// Add `method` to the document and reference it from
    /// `capabilityInvocation`.
    pub fn add_capability_invocation(&mut self, method: VerificationMethod) {
        self.add_method(KeyPurpose::CapabilityInvocation, method);
    }

    /// Add `method` to the document and reference it from
    /// `capabilityDelegation`.
    pub fn add_capability_delegation(&mut self, method: VerificationMethod) {
        self.add_method(KeyPurpose::CapabilityDelegation, method);
    }

    /// Add `method` to `verificationMethod` if its id is new, then reference it
    /// from `purpose` unless that relationship already resolves to the id.
    ///
    /// A method without a controller is given the document's DID. An existing
    /// controller is never overwritten.
    pub fn add_method(&mut self, purpose: KeyPurpose, method: VerificationMethod) {
        let reference = method.id.clone();
        let resolved = reference.resolve_against(&self.id);
        self.add_verification_method(method);

        let base = &self.id;
        let entries = &mut self.relationships[purpose.index()];
        if entries.iter().any(|r| r.resolved_id(base) == resolved) {
            debug!(id = %resolved, %purpose, "relationship already present");
            return;
        }
        entries.push(VerificationRelationship::Reference {
            reference,
            resolved,
        });
    }

    /// Remove the method with `id` from `verificationMethod` and from every
    /// relationship. Removing an absent id does nothing.
    pub fn remove_verification_method(&mut self, id: &DidUrl) {
        let base = &self.id;
        let id = id.resolve_against(base);

        let before = self.verification_method.len()
            + self.relationships.iter().map(Vec::len).sum::<usize>();
        self.verification_method.retain(|m| m.id.resolve_against(base) != id);
        for entries in &mut self.relationships {
            entries.retain(|r| r.resolved_id(base) != id);
        }
        let after = self.verification_method.len()
            + self.relationships.iter().map(Vec::len).sum::<usize>();

        if before == after {
            debug!(%id, "no verification method to remove");
        }
    }

    /// Serialize to a JSON object, collapsing single-element `@context` and
    /// `controller` arrays.
    ///
    /// # Errors
    ///
    /// Returns an error if a member cannot be serialized.
    pub fn to_json(&self) -> Result<Map<String, Value>> {
        let mut object = Map::new();
        if !self.context.is_empty() {
            object.insert("@context".into(), serde_json::to_value(&self.context)?);
        }
        object.insert("id".into(), Value::String(self.id.to_string()));
        if !self.controller.is_empty() {
            object.insert("controller".into(), serde_json::to_value(&self.controller)?);
        }
        if !self.also_known_as.is_empty() {
            object.insert("alsoKnownAs".into(), serde_json::to_value(&self.also_known_as)?);
        }
        if !self.verification_method.is_empty() {
            object.insert(
                "verificationMethod".into(),
                serde_json::to_value(&self.verification_method)?,
            );
        }
        for purpose in KeyPurpose::ALL {
            let entries = self.relationship(purpose);
            if entries.is_empty() {
                continue;
            }
            let values = entries
                .iter()
                .map(|r| match r {
                    VerificationRelationship::Reference { reference, .. } => {
                        Ok(Value::String(reference.to_string()))
                    }
                    VerificationRelationship::Embedded(method) => serde_json::to_value(method),
                })
                .collect::<serde_json::Result<Vec<_>>>()?;
            object.insert(purpose.as_str().into(), Value::Array(values));
        }
        if !self.service.is_empty() {
            object.insert("service".into(), serde_json::to_value(&self.service)?);
        }

        plural::collapse(&mut object, DOCUMENT_PLURALS);
        Ok(object)
    }
}

impl FromStr for Document {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().map_err(S::Error::custom)?.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut object = Map::deserialize(deserializer)?;
        plural::normalize(&mut object, DOCUMENT_PLURALS);
        Self::from_object(object).map_err(D::Error::custom)
    }
}

// Wire form of a document after plural normalization. Nested members stay as
// raw JSON so their errors surface as document errors.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(rename = "@context")]
    context: Option<Vec<Kind<Value>>>,
    id: Option<String>,
    controller: Option<Vec<String>>,
    also_known_as: Option<Vec<String>>,
    verification_method: Option<Vec<Value>>,
    authentication: Option<Vec<Value>>,
    assertion_method: Option<Vec<Value>>,
    key_agreement: Option<Vec<Value>>,
    capability_invocation: Option<Vec<Value>>,
    capability_delegation: Option<Vec<Value>>,
    service: Option<Vec<Value>>,
}

// A method inside a document must name its controller.
fn document_method(value: Value) -> Result<VerificationMethod> {
    let method = VerificationMethod::from_json(value)?;
    if method.controller.is_none() {
        let reason = format!("verification method '{}' missing controller", method.id);
        return Err(Error::document(reason));
    }
    Ok(method)
}

fn resolve_entry(
    purpose: KeyPurpose, entry: Value, base: &Did, methods: &[VerificationMethod],
) -> Result<VerificationRelationship> {
    match entry {
        Value::String(s) => {
            let reference = DidUrl::parse_reference(&s).map_err(|e| Error::InvalidDocument {
                reason: format!("{purpose} reference '{s}' is not a DID URL"),
                source: Some(e),
            })?;
            let resolved = reference.resolve_against(base);
            if find(methods, &resolved, base).is_none() {
                return Err(Error::UnresolvedReference {
                    relationship: purpose,
                    reference: resolved.to_string(),
                });
            }
            Ok(VerificationRelationship::Reference {
                reference,
                resolved,
            })
        }
        Value::Object(_) => Ok(VerificationRelationship::Embedded(document_method(entry)?)),
        _ => Err(Error::document(format!("{purpose} entries must be DID URLs or methods"))),
    }
}

fn find<'a>(
    methods: &'a [VerificationMethod], id: &DidUrl, base: &Did,
) -> Option<&'a VerificationMethod> {
    methods.iter().find(|m| m.id.resolve_against(base) == *id)
}
