//! Failure taxonomy for token validation and key registry errors.

use std::fmt;

use authgate_identity::Identity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable authentication failure codes.
///
/// The set is closed and each code has a fixed wire string (see
/// [`AuthFailureCode::as_str`]) suitable for API responses and audit logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailureCode {
    /// No credential was presented.
    MissingCredential,
    /// The credential is not a structurally valid JWT.
    MalformedCredential,
    /// The `Authorization` header uses a scheme other than `Bearer`.
    UnsupportedScheme,
    /// No active signing key verifies the signature.
    InvalidSignature,
    /// `exp` lies in the past, beyond the clock skew.
    TokenExpired,
    /// `nbf` lies in the future, beyond the clock skew.
    TokenNotYetValid,
    /// `iss` does not match the configured issuer.
    InvalidIssuer,
    /// `aud` does not contain the configured audience.
    InvalidAudience,
    /// A required claim is absent.
    MissingClaim,
    /// Unexpected or configuration failure.
    InternalError,
}

impl AuthFailureCode {
    /// Every code, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::MissingCredential,
        Self::MalformedCredential,
        Self::UnsupportedScheme,
        Self::InvalidSignature,
        Self::TokenExpired,
        Self::TokenNotYetValid,
        Self::InvalidIssuer,
        Self::InvalidAudience,
        Self::MissingClaim,
        Self::InternalError,
    ];

    /// Wire representation of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::MalformedCredential => "malformed_credential",
            Self::UnsupportedScheme => "unsupported_scheme",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::TokenNotYetValid => "token_not_yet_valid",
            Self::InvalidIssuer => "invalid_issuer",
            Self::InvalidAudience => "invalid_audience",
            Self::MissingClaim => "missing_claim",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for AuthFailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed authentication: exactly one code plus a human-readable message.
///
/// The code is the contract; the message is supplementary detail and never
/// contains the token or key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{code}: {message}")]
pub struct AuthFailure {
    code: AuthFailureCode,
    message: String,
}

impl AuthFailure {
    #[must_use]
    pub fn new(code: AuthFailureCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> AuthFailureCode {
        self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn missing_credential(message: impl Into<String>) -> Self {
        Self::new(AuthFailureCode::MissingCredential, message)
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::new(AuthFailureCode::MalformedCredential, message)
    }

    pub(crate) fn missing_claim(claim: &str) -> Self {
        Self::new(
            AuthFailureCode::MissingClaim,
            format!("required claim '{claim}' is missing"),
        )
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(AuthFailureCode::InternalError, message)
    }
}

impl From<jsonwebtoken::errors::Error> for AuthFailure {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        let code = match err.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => AuthFailureCode::MalformedCredential,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                AuthFailureCode::InvalidSignature
            }
            ErrorKind::ExpiredSignature => AuthFailureCode::TokenExpired,
            ErrorKind::ImmatureSignature => AuthFailureCode::TokenNotYetValid,
            ErrorKind::InvalidIssuer => AuthFailureCode::InvalidIssuer,
            ErrorKind::InvalidAudience => AuthFailureCode::InvalidAudience,
            ErrorKind::MissingRequiredClaim(_) => AuthFailureCode::MissingClaim,
            _ => AuthFailureCode::InternalError,
        };
        Self::new(code, format!("JWT error: {err}"))
    }
}

/// Result of validating a credential.
pub type AuthenticationOutcome = Result<Identity, AuthFailure>;

/// Errors raised while building the signing key registry.
///
/// These surface at startup, never during request processing.
#[derive(Debug, Error)]
pub enum KeyRegistryError {
    #[error("signing key id must not be empty")]
    EmptyKeyId,

    #[error("signing key '{key_id}' has empty key material")]
    EmptyKeyMaterial { key_id: String },

    #[error("signing key '{key_id}' secret could not be decoded: {reason}")]
    InvalidKeyEncoding { key_id: String, reason: String },

    #[error("no active signing keys configured")]
    NoActiveKeys,

    #[error("issuer must not be empty")]
    MissingIssuer,

    #[error("audience must not be empty")]
    MissingAudience,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn wire_strings_are_unique_and_match_serde() {
        let mut seen = HashSet::new();
        for code in AuthFailureCode::ALL {
            assert!(seen.insert(code.as_str()), "duplicate wire string {code}");
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
    }

    #[test]
    fn failure_display_leads_with_code() {
        let err = AuthFailure::missing_claim("sub");
        assert_eq!(err.code(), AuthFailureCode::MissingClaim);
        assert_eq!(err.to_string(), "missing_claim: required claim 'sub' is missing");
    }

    #[test]
    fn jsonwebtoken_errors_map_to_nearest_code() {
        use jsonwebtoken::errors::{Error, ErrorKind};

        let cases = [
            (ErrorKind::InvalidToken, AuthFailureCode::MalformedCredential),
            (ErrorKind::InvalidSignature, AuthFailureCode::InvalidSignature),
            (ErrorKind::ExpiredSignature, AuthFailureCode::TokenExpired),
            (ErrorKind::ImmatureSignature, AuthFailureCode::TokenNotYetValid),
            (ErrorKind::InvalidIssuer, AuthFailureCode::InvalidIssuer),
            (ErrorKind::InvalidAudience, AuthFailureCode::InvalidAudience),
            (
                ErrorKind::MissingRequiredClaim("exp".to_owned()),
                AuthFailureCode::MissingClaim,
            ),
            (ErrorKind::InvalidKeyFormat, AuthFailureCode::InternalError),
        ];

        for (kind, expected) in cases {
            let failure = AuthFailure::from(Error::from(kind));
            assert_eq!(failure.code(), expected);
        }
    }

    #[test]
    fn registry_error_messages() {
        let err = KeyRegistryError::EmptyKeyMaterial {
            key_id: "k1".to_owned(),
        };
        assert_eq!(err.to_string(), "signing key 'k1' has empty key material");
        assert_eq!(
            KeyRegistryError::NoActiveKeys.to_string(),
            "no active signing keys configured"
        );
    }
}
