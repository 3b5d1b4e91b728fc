//! Credential lifecycle for the cloud publishing destination.
//!
//! Turns a one-time, manual OAuth2 authorization into a durable,
//! self-refreshing token record that unattended runs can use indefinitely.
//! See [`manager`] for the state machine.

pub mod client;
pub mod error;
pub mod http;
pub mod manager;
pub mod record;

pub use client::{ClientIdentity, MissingVar};
pub use error::AuthError;
pub use manager::{CredentialManager, CredentialPaths, CredentialProvider, CredentialState};
pub use record::CredentialRecord;
