#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authorization decisions over authenticated identities.
//!
//! - [`AuthorizationRequest`] - what the caller wants and what it requires
//! - [`AuthorizationDecision`] - allow/deny with the full audit trail
//! - [`PolicyEvaluator`] - extension seam for custom policies
//! - [`AuthorizationEngine`] - default scope, role and ownership policy
//! - [`AuditedEvaluator`] - logs one event per decision

pub mod api;
pub mod domain;
pub mod models;

pub use api::PolicyEvaluator;
pub use domain::{AUDIT_TARGET, AuditedEvaluator, AuthorizationEngine, evaluate};
pub use models::{AuthorizationDecision, AuthorizationRequest, DenyCode, DenyReason, labels};
