#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Identity model shared by token validation and authorization.
//!
//! The token validator produces [`Identity`] values; the policy engine
//! consumes them.
//!
//! - [`Identity`] - immutable authenticated principal
//! - [`ClaimMap`] - case-sensitive, ordered multi-valued claims
//! - [`normalize`] - the single place raw claim shapes are reconciled

pub mod claims;
pub mod identity;

pub use claims::{ClaimMap, claim_types, normalize};
pub use identity::{BEARER_SCHEME, Identity, IdentityBuilder, IdentityError};
