//! Audit logging around any [`PolicyEvaluator`].

use authgate_identity::Identity;
use tracing::info;

use crate::api::PolicyEvaluator;
use crate::models::{AuthorizationDecision, AuthorizationRequest, DenyCode};

/// Tracing target for decision audit events.
pub const AUDIT_TARGET: &str = "authgate::audit";

/// Emits one audit event per decision and returns the decision unchanged.
///
/// The event carries action, resource, outcome, deny codes and satisfied
/// labels. Subject ids and claim values are never logged.
#[derive(Debug, Clone, Default)]
pub struct AuditedEvaluator<P> {
    inner: P,
}

impl<P: PolicyEvaluator> AuditedEvaluator<P> {
    #[must_use]
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: PolicyEvaluator> PolicyEvaluator for AuditedEvaluator<P> {
    #[tracing::instrument(
        skip_all,
        fields(action = %request.action, resource = %request.resource)
    )]
    fn evaluate(
        &self,
        identity: Option<&Identity>,
        request: &AuthorizationRequest,
    ) -> AuthorizationDecision {
        let decision = self.inner.evaluate(identity, request);

        let deny_codes: Vec<&str> = decision.deny_codes().map(DenyCode::as_str).collect();
        info!(
            target: AUDIT_TARGET,
            action = %request.action,
            resource = %request.resource,
            authenticated = identity.is_some(),
            allowed = decision.allowed(),
            deny_codes = ?deny_codes,
            satisfied = ?decision.satisfied_requirements(),
            "Authorization decision"
        );

        decision
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::domain::engine::AuthorizationEngine;

    struct DenyEverything;

    impl PolicyEvaluator for DenyEverything {
        fn evaluate(
            &self,
            _identity: Option<&Identity>,
            _request: &AuthorizationRequest,
        ) -> AuthorizationDecision {
            AuthorizationDecision::deny(DenyCode::ActionNotPermitted, "frozen")
        }
    }

    #[test]
    #[traced_test]
    fn logs_denial_without_changing_it() {
        let audited = AuditedEvaluator::new(DenyEverything);
        let request = AuthorizationRequest::new("delete", "orders/7");

        let decision = audited.evaluate(None, &request);

        assert_eq!(decision, DenyEverything.evaluate(None, &request));
        assert!(logs_contain("Authorization decision"));
        assert!(logs_contain("allowed=false"));
        assert!(logs_contain("action_not_permitted"));
        assert!(logs_contain("orders/7"));
    }

    #[test]
    #[traced_test]
    fn logs_labels_not_subject() {
        let audited = AuditedEvaluator::new(AuthorizationEngine::new());
        let identity = Identity::builder("subject-secret-id").build().unwrap();
        let request = AuthorizationRequest::new("read", "doc").owned_by("subject-secret-id");

        let decision = audited.evaluate(Some(&identity), &request);

        assert!(decision.allowed());
        assert!(logs_contain("allowed=true"));
        assert!(logs_contain("owner"));
        assert!(!logs_contain("subject-secret-id"));
    }
}
