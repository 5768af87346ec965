//! # Self-Sovereign Identity Data Model
//!
//! Parsing, validation and serialization for the W3C decentralized identity
//! data model:
//!
//! - [`did`]: DIDs and DID URLs, and the DID Document with its verification
//!   methods, verification relationships and services.
//! - [`vc`]: Verifiable Credentials and Presentations, as JSON-LD objects or
//!   compact JWTs.
//! - [`plural`]: the single-value/list normalization both documents rely on.
//!
//! Key encoding and JWT signing are left to the caller through the
//! [`KeyCodec`] and [`JwtSigner`] traits. Nothing here performs I/O or
//! verifies signatures.
//!
//! See [DID Core](https://www.w3.org/TR/did-core/) and the
//! [VC Data Model](https://www.w3.org/TR/vc-data-model/) for more.

mod core;
pub mod did;
mod error;
pub mod plural;
mod provider;
pub mod vc;

pub use self::core::Kind;
pub use self::error::{Error, SubjectError};
pub use self::provider::{JwtSigner, KeyCodec};

/// Result type for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
