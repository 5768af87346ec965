//! # Decentralized Identifiers
//!
//! DID and DID URL parsing, and the DID Document model with its verification
//! methods, verification relationships and services.
//!
//! See [DID Core](https://www.w3.org/TR/did-core/) for more.

#[cfg(feature = "ed25519")]
pub mod codec;
mod document;
mod service;
mod url;
mod verification;

pub use self::document::*;
pub use self::service::*;
pub use self::url::{Did, DidError, DidUrl, Query};
pub use self::verification::*;
