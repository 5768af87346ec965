//! # Service
//!
//! Services are used to express ways of communicating with the DID subject or
//! associated entities.
//!
//! They can be any type of service the DID subject wants to advertise,
//! including decentralized identity management services for further
//! discovery, authentication, authorization, or interaction.
//!
//! Service endpoints are kept as raw JSON. Consumers project them onto a
//! concrete shape with [`Service::endpoint`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::did::{Did, DidUrl};
use crate::{Error, Result};

/// A Service is used to express a way of communicating with the DID subject or
/// associated entities.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(try_from = "RawService", into = "RawService")]
pub struct Service {
    /// A URI unique to the service. Either absolute, or a DID URL reference
    /// relative to the containing document (`#files`).
    pub id: String,

    /// The service type. SHOULD be registered in the DID Specification
    /// Registries.
    pub type_: String,

    /// A string, a map, or a set of strings and maps.
    #[allow(clippy::struct_field_names)]
    pub service_endpoint: Value,
}

impl Service {
    /// Create a new `ServiceBuilder` to build a service.
    #[must_use]
    pub fn build() -> ServiceBuilder {
        ServiceBuilder::new()
    }

    /// Deserialize the endpoint into `T`. A single-element array is unwrapped
    /// first, so `["https://example.com"]` projects onto a `String`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint does not have the shape of `T`.
    pub fn endpoint<T: DeserializeOwned>(&self) -> Result<T> {
        let value = match &self.service_endpoint {
            Value::Array(items) if items.len() == 1 => &items[0],
            value => value,
        };
        Ok(T::deserialize(value)?)
    }

    /// Decode a service from JSON, keeping document errors intact.
    pub(crate) fn from_json(value: Value) -> Result<Self> {
        let raw: RawService = serde_json::from_value(value)?;
        Self::try_from(raw)
    }

    /// `true` if the service has `id`, comparing DID URL ids after qualifying
    /// them against `base`.
    pub(crate) fn matches(&self, id: &str, base: &Did) -> bool {
        if self.id == id {
            return true;
        }
        let (Ok(own), Ok(other)) = (DidUrl::parse_reference(&self.id), DidUrl::parse_reference(id))
        else {
            return false;
        };
        own.resolve_against(base) == other.resolve_against(base)
    }
}

/// Service builder
#[derive(Default)]
pub struct ServiceBuilder {
    id: Option<String>,
    service_type: Option<String>,
    endpoint: Vec<Value>,
}

impl ServiceBuilder {
    /// Creates a new, empty `ServiceBuilder`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify the service id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Specify the service type.
    #[must_use]
    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }

    /// Add an endpoint. A service with one endpoint serializes it bare.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<Value>) -> Self {
        self.endpoint.push(endpoint.into());
        self
    }

    /// Build the service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDocument`] if the id, type or endpoint is
    /// missing or malformed.
    pub fn build(mut self) -> Result<Service> {
        let endpoint = match self.endpoint.len() {
            0 => None,
            1 => self.endpoint.pop(),
            _ => Some(Value::Array(self.endpoint)),
        };
        Service::try_from(RawService {
            id: self.id,
            type_: self.service_type,
            service_endpoint: endpoint,
        })
    }
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawService {
    id: Option<String>,

    #[serde(rename = "type")]
    type_: Option<String>,

    service_endpoint: Option<Value>,
}

impl TryFrom<RawService> for Service {
    type Error = Error;

    fn try_from(raw: RawService) -> Result<Self> {
        let Some(id) = raw.id.filter(|id| !id.is_empty()) else {
            return Err(Error::document("service missing id"));
        };
        if url::Url::parse(&id).is_err() {
            DidUrl::parse_reference(&id).map_err(|e| Error::InvalidDocument {
                reason: format!("service id '{id}' is not a URI"),
                source: Some(e),
            })?;
        }
        let Some(type_) = raw.type_.filter(|t| !t.is_empty()) else {
            return Err(Error::document(format!("service '{id}' missing type")));
        };
        let service_endpoint = match raw.service_endpoint {
            Some(endpoint @ (Value::String(_) | Value::Array(_) | Value::Object(_))) => endpoint,
            Some(_) => {
                return Err(Error::document(format!(
                    "service '{id}' endpoint must be a string, map or set"
                )));
            }
            None => return Err(Error::document(format!("service '{id}' missing serviceEndpoint"))),
        };

        Ok(Self {
            id,
            type_,
            service_endpoint,
        })
    }
}

impl From<Service> for RawService {
    fn from(service: Service) -> Self {
        Self {
            id: Some(service.id),
            type_: Some(service.type_),
            service_endpoint: Some(service.service_endpoint),
        }
    }
}
