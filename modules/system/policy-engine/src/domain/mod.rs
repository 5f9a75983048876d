//! Domain layer for the policy engine.

pub mod audited;
pub mod engine;

pub use audited::{AUDIT_TARGET, AuditedEvaluator};
pub use engine::{AuthorizationEngine, evaluate};
