//! Credential handling for the intake gateway.
//!
//! A request's bearer credential is pulled out of its `Authorization` header
//! by [`extract_bearer`] and checked by a [`CredentialVerifier`], which asks a
//! [`CredentialStore`] for a matching record. Store failures always deny.

mod bearer;
pub mod store;
mod verifier;

pub use bearer::{AUTHORIZATION_PREFIX, Credential, bearer_from_headers, extract_bearer};
pub use store::{
    CredentialRecord, CredentialStore, InMemoryCredentialStore, NatsKvCredentialStore,
    SharedCredentialStore, SqliteCredentialStore, StoreError,
};
pub use verifier::{CredentialVerifier, LookupOutcome};
