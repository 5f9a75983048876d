//! Authenticated principal and its builder.

use serde::Serialize;

use crate::claims::{ClaimMap, claim_types};

/// Authentication scheme recorded on identities produced from bearer tokens.
pub const BEARER_SCHEME: &str = "Bearer";

/// Errors raised while constructing an [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("identity requires a non-empty subject id")]
    EmptySubject,
}

/// Authenticated identity produced by successful token validation.
///
/// Immutable once built: fields are private and exposed through accessors.
/// Serializes for audit output but does not implement
/// `Deserialize`, so an `Identity` can only come out of [`IdentityBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    subject_id: String,
    scheme: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    claims: ClaimMap,
}

impl Identity {
    /// Start building an identity for `subject_id`.
    #[must_use]
    pub fn builder(subject_id: impl Into<String>) -> IdentityBuilder {
        IdentityBuilder {
            subject_id: subject_id.into(),
            scheme: BEARER_SCHEME.to_owned(),
            display_name: None,
            claims: ClaimMap::new(),
        }
    }

    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn claims(&self) -> &ClaimMap {
        &self.claims
    }

    /// Values of `claim_type`, in token order.
    #[must_use]
    pub fn claim_values(&self, claim_type: &str) -> &[String] {
        self.claims.values(claim_type)
    }

    /// Exact, case-sensitive claim check on both type and value.
    #[must_use]
    pub fn has_claim(&self, claim_type: &str, value: &str) -> bool {
        self.claims.contains(claim_type, value)
    }

    /// Granted scopes (the normalized `scope` claim).
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        self.claims.values(claim_types::SCOPE)
    }

    /// Granted roles (the `role` claim).
    #[must_use]
    pub fn roles(&self) -> &[String] {
        self.claims.values(claim_types::ROLE)
    }
}

/// Builder for [`Identity`].
#[derive(Debug)]
pub struct IdentityBuilder {
    subject_id: String,
    scheme: String,
    display_name: Option<String>,
    claims: ClaimMap,
}

impl IdentityBuilder {
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    #[must_use]
    pub fn claims(mut self, claims: ClaimMap) -> Self {
        self.claims = claims;
        self
    }

    /// Finish the identity.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::EmptySubject`] if the subject id is empty.
    pub fn build(self) -> Result<Identity, IdentityError> {
        if self.subject_id.is_empty() {
            return Err(IdentityError::EmptySubject);
        }
        Ok(Identity {
            subject_id: self.subject_id,
            scheme: self.scheme,
            display_name: self.display_name,
            claims: self.claims,
        })
    }
}
