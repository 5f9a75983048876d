#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Bearer token validation.
//!
//! Verifies HS256/HS384/HS512 JWTs against a rotating set of signing keys and
//! turns the verified claims into an [`Identity`](authgate_identity::Identity):
//!
//! - [`ValidationContext`] - frozen issuer, audience, clock skew and active keys
//! - [`KeySupply`] / [`StaticKeySupply`] - where the context gets its keys
//! - [`validate`] / [`TokenValidator`] - the validation pipeline
//! - [`AuthFailure`] - the closed failure taxonomy

pub mod config;
pub mod credential;
pub mod domain;
pub mod error;
pub mod registry;

pub use config::{KeyRegistryConfig, SecretEncoding, SigningAlgorithm, SigningKeyConfig};
pub use credential::bearer_token_from_header;
pub use domain::{TokenValidator, validate, validate_at, validate_authorization_header};
pub use error::{AuthFailure, AuthFailureCode, AuthenticationOutcome, KeyRegistryError};
pub use registry::{
    DEFAULT_CLOCK_SKEW, KeySupply, SigningKeyRecord, StaticKeySupply, ValidationContext,
    ValidationContextBuilder,
};
