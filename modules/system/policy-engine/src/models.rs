//! Request and decision models for authorization evaluation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Labels recorded in [`AuthorizationDecision::satisfied_requirements`].
///
/// Labels name requirement categories, never subject identifiers.
pub mod labels {
    pub const AUTHENTICATED: &str = "authenticated";
    pub const OWNER: &str = "owner";
    pub const SCOPE_PREFIX: &str = "scope:";
    pub const ROLE_PREFIX: &str = "role:";

    #[must_use]
    pub fn scope(scope: &str) -> String {
        format!("{SCOPE_PREFIX}{scope}")
    }

    #[must_use]
    pub fn role(role: &str) -> String {
        format!("{ROLE_PREFIX}{role}")
    }
}

/// What the caller wants to do and what it takes to be allowed.
///
/// Built entirely by the caller; the engine never derives or looks up any of
/// these fields.
///
/// ```json
/// {
///   "action": "update",
///   "resource": "orders/42",
///   "required_scopes": ["orders:write"],
///   "required_roles": ["admin", "editor"],
///   "resource_owner_id": "user-42"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizationRequest {
    /// Action name (e.g. "read", "update").
    pub action: String,
    /// Resource being accessed.
    pub resource: String,
    /// Every scope here must be granted.
    #[serde(default)]
    pub required_scopes: Vec<String>,
    /// Any one role here is sufficient. Empty means no role requirement.
    #[serde(default)]
    pub required_roles: Vec<String>,
    /// When set and non-empty, the subject must own the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_owner_id: Option<String>,
}

impl AuthorizationRequest {
    #[must_use]
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource: resource.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn require_scope(mut self, scope: impl Into<String>) -> Self {
        self.required_scopes.push(scope.into());
        self
    }

    #[must_use]
    pub fn require_role(mut self, role: impl Into<String>) -> Self {
        self.required_roles.push(role.into());
        self
    }

    #[must_use]
    pub fn owned_by(mut self, owner_id: impl Into<String>) -> Self {
        self.resource_owner_id = Some(owner_id.into());
        self
    }
}

/// Stable authorization deny codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyCode {
    /// No authenticated identity.
    NotAuthenticated,
    /// A required scope is not granted.
    MissingScope,
    /// None of the acceptable roles is held.
    MissingRole,
    /// The subject does not own the resource.
    ResourceOwnershipDenied,
    /// Reserved for custom evaluators.
    ActionNotPermitted,
    /// Reserved for custom evaluators.
    ResourceNotAccessible,
    /// Reserved for custom evaluators.
    PolicyNotSatisfied,
    /// Unexpected evaluator failure.
    InternalError,
}

impl DenyCode {
    pub const ALL: [Self; 8] = [
        Self::NotAuthenticated,
        Self::MissingScope,
        Self::MissingRole,
        Self::ResourceOwnershipDenied,
        Self::ActionNotPermitted,
        Self::ResourceNotAccessible,
        Self::PolicyNotSatisfied,
        Self::InternalError,
    ];

    /// Wire representation of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotAuthenticated => "not_authenticated",
            Self::MissingScope => "missing_scope",
            Self::MissingRole => "missing_role",
            Self::ResourceOwnershipDenied => "resource_ownership_denied",
            Self::ActionNotPermitted => "action_not_permitted",
            Self::ResourceNotAccessible => "resource_not_accessible",
            Self::PolicyNotSatisfied => "policy_not_satisfied",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for DenyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyReason {
    /// Machine-readable code.
    pub code: DenyCode,
    /// Human-readable details.
    pub message: String,
}

impl DenyReason {
    #[must_use]
    pub fn new(code: DenyCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Outcome of an authorization evaluation.
///
/// `allowed` holds exactly when there are no deny reasons. Satisfied
/// requirements are recorded even on denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationDecision {
    allowed: bool,
    deny_reasons: Vec<DenyReason>,
    satisfied_requirements: Vec<String>,
}

impl AuthorizationDecision {
    /// Assemble a decision; `allowed` is derived from `deny_reasons`.
    #[must_use]
    pub fn new(deny_reasons: Vec<DenyReason>, satisfied_requirements: Vec<String>) -> Self {
        Self {
            allowed: deny_reasons.is_empty(),
            deny_reasons,
            satisfied_requirements,
        }
    }

    /// Deny with a single reason and nothing satisfied.
    #[must_use]
    pub fn deny(code: DenyCode, message: impl Into<String>) -> Self {
        Self::new(vec![DenyReason::new(code, message)], Vec::new())
    }

    #[must_use]
    pub fn allowed(&self) -> bool {
        self.allowed
    }

    #[must_use]
    pub fn deny_reasons(&self) -> &[DenyReason] {
        &self.deny_reasons
    }

    #[must_use]
    pub fn satisfied_requirements(&self) -> &[String] {
        &self.satisfied_requirements
    }

    /// Deny codes in the order they were recorded.
    pub fn deny_codes(&self) -> impl Iterator<Item = DenyCode> + '_ {
        self.deny_reasons.iter().map(|r| r.code)
    }
}
