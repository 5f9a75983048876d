//! Domain layer for the token validator.

pub mod service;
pub(crate) mod token;

pub use service::{TokenValidator, validate, validate_at, validate_authorization_header};
