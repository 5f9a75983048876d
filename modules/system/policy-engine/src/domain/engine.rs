//! Default scope, role and ownership policy.

use authgate_identity::{Identity, claim_types};

use crate::api::PolicyEvaluator;
use crate::models::{AuthorizationDecision, AuthorizationRequest, DenyCode, DenyReason, labels};

/// Evaluate `request` for `identity` with the default policy.
///
/// 1. No identity: deny `NotAuthenticated` and stop.
/// 2. Record `authenticated`.
/// 3. Every required scope must be granted; each missing one is reported.
/// 4. If roles are required, the first held role is recorded; holding none
///    yields a single `MissingRole` reason.
/// 5. A non-empty owner id must equal the subject id exactly.
///
/// Steps 3 to 5 all run regardless of earlier failures.
#[must_use]
pub fn evaluate(
    identity: Option<&Identity>,
    request: &AuthorizationRequest,
) -> AuthorizationDecision {
    let Some(identity) = identity else {
        return AuthorizationDecision::deny(
            DenyCode::NotAuthenticated,
            "request is not authenticated",
        );
    };

    let mut satisfied = vec![labels::AUTHENTICATED.to_owned()];
    let mut deny_reasons = Vec::new();

    for scope in &request.required_scopes {
        if identity.has_claim(claim_types::SCOPE, scope) {
            satisfied.push(labels::scope(scope));
        } else {
            deny_reasons.push(DenyReason::new(
                DenyCode::MissingScope,
                format!("missing required scope '{scope}'"),
            ));
        }
    }

    if !request.required_roles.is_empty() {
        match request
            .required_roles
            .iter()
            .find(|role| identity.has_claim(claim_types::ROLE, role))
        {
            Some(role) => satisfied.push(labels::role(role)),
            None => deny_reasons.push(DenyReason::new(
                DenyCode::MissingRole,
                format!(
                    "requires one of roles: {}",
                    request.required_roles.join(", ")
                ),
            )),
        }
    }

    if let Some(owner_id) = request.resource_owner_id.as_deref()
        && !owner_id.is_empty()
    {
        if owner_id == identity.subject_id() {
            satisfied.push(labels::OWNER.to_owned());
        } else {
            deny_reasons.push(DenyReason::new(
                DenyCode::ResourceOwnershipDenied,
                "subject does not own the resource",
            ));
        }
    }

    AuthorizationDecision::new(deny_reasons, satisfied)
}

/// The default [`PolicyEvaluator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationEngine;

impl AuthorizationEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PolicyEvaluator for AuthorizationEngine {
    fn evaluate(
        &self,
        identity: Option<&Identity>,
        request: &AuthorizationRequest,
    ) -> AuthorizationDecision {
        evaluate(identity, request)
    }
}
