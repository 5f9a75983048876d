//! Evaluator trait implemented by the default engine and by custom policies.

use authgate_identity::Identity;

use crate::models::{AuthorizationDecision, AuthorizationRequest};

/// Computes allow/deny decisions.
///
/// Implementations must be local, deterministic and side-effect free apart
/// from observational logging:
///
/// ```ignore
/// let engine = AuditedEvaluator::new(AuthorizationEngine::new());
/// let decision = engine.evaluate(Some(&identity), &request);
/// if !decision.allowed() {
///     // map deny reasons to a 403 response
/// }
/// ```
///
/// `identity` is `None` when the caller could not authenticate; every
/// implementation must deny with `NotAuthenticated` in that case.
pub trait PolicyEvaluator: Send + Sync {
    fn evaluate(
        &self,
        identity: Option<&Identity>,
        request: &AuthorizationRequest,
    ) -> AuthorizationDecision;
}

impl<P: PolicyEvaluator + ?Sized> PolicyEvaluator for Box<P> {
    fn evaluate(
        &self,
        identity: Option<&Identity>,
        request: &AuthorizationRequest,
    ) -> AuthorizationDecision {
        (**self).evaluate(identity, request)
    }
}

impl<P: PolicyEvaluator + ?Sized> PolicyEvaluator for std::sync::Arc<P> {
    fn evaluate(
        &self,
        identity: Option<&Identity>,
        request: &AuthorizationRequest,
    ) -> AuthorizationDecision {
        (**self).evaluate(identity, request)
    }
}
