//! Token validation pipeline.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use authgate_identity::{BEARER_SCHEME, Identity, claim_types, normalize};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::credential::bearer_token_from_header;
use crate::domain::token;
use crate::error::{AuthFailure, AuthFailureCode, AuthenticationOutcome};
use crate::registry::ValidationContext;

/// Validate a bearer token against the wall clock.
///
/// Checks run in a fixed order and the first failure wins: structure,
/// signature, expiry, not-before, issuer, audience, subject.
pub fn validate(token: &str, ctx: &ValidationContext) -> AuthenticationOutcome {
    validate_at(token, ctx, SystemTime::now())
}

/// Validate a bearer token as of `now`.
pub fn validate_at(
    token: &str,
    ctx: &ValidationContext,
    now: SystemTime,
) -> AuthenticationOutcome {
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthFailure::missing_credential("no credential presented"));
    }

    let parsed = token::parse(token)?;

    if ctx.active_keys().is_empty() {
        error!("No active signing keys configured; cannot verify credentials");
        return Err(AuthFailure::internal("no active signing keys configured"));
    }
    let Some(key) = token::verify_signature(token, parsed.algorithm, ctx.active_keys())? else {
        return Err(AuthFailure::new(
            AuthFailureCode::InvalidSignature,
            "no active signing key verifies the token signature",
        ));
    };
    debug!(key_id = %key.key_id(), "Token signature verified");

    let now = unix_seconds(now);
    let skew = i64::try_from(ctx.clock_skew().as_secs()).unwrap_or(i64::MAX);

    let expires_at = parsed
        .expires_at
        .ok_or_else(|| AuthFailure::missing_claim(claim_types::EXPIRES_AT))?;
    if expires_at.saturating_add(skew) < now {
        return Err(AuthFailure::new(AuthFailureCode::TokenExpired, "token has expired"));
    }
    if let Some(not_before) = parsed.not_before
        && not_before.saturating_sub(skew) > now
    {
        return Err(AuthFailure::new(
            AuthFailureCode::TokenNotYetValid,
            "token is not valid yet",
        ));
    }

    check_issuer(&parsed.claims, ctx.issuer())?;
    check_audience(&parsed.claims, ctx.audience())?;

    let subject = match parsed.claims.get(claim_types::SUBJECT) {
        Some(Value::String(sub)) if !sub.is_empty() => sub.clone(),
        other => {
            error!(
                issuer = %ctx.issuer(),
                "Verified token carries no subject; check the issuer's token configuration"
            );
            return Err(match other {
                None => AuthFailure::missing_claim(claim_types::SUBJECT),
                Some(_) => AuthFailure::new(
                    AuthFailureCode::MissingClaim,
                    "required claim 'sub' is not a non-empty string",
                ),
            });
        }
    };
    let display_name = match parsed.claims.get(claim_types::NAME) {
        Some(Value::String(name)) if !name.is_empty() => Some(name.clone()),
        _ => None,
    };

    let mut builder = Identity::builder(subject)
        .scheme(BEARER_SCHEME)
        .claims(normalize(&parsed.claims));
    if let Some(name) = display_name {
        builder = builder.display_name(name);
    }
    builder
        .build()
        .map_err(|e| AuthFailure::internal(e.to_string()))
}

/// Extract the bearer token from an `Authorization` header value and validate
/// it.
pub fn validate_authorization_header(
    header_value: &str,
    ctx: &ValidationContext,
) -> AuthenticationOutcome {
    let token = bearer_token_from_header(header_value)?;
    validate(token, ctx)
}

fn check_issuer(claims: &Map<String, Value>, expected: &str) -> Result<(), AuthFailure> {
    match claims.get(claim_types::ISSUER) {
        Some(Value::String(iss)) if iss == expected => Ok(()),
        Some(_) => Err(AuthFailure::new(
            AuthFailureCode::InvalidIssuer,
            "token issuer does not match",
        )),
        None => Err(AuthFailure::new(
            AuthFailureCode::InvalidIssuer,
            "token has no issuer",
        )),
    }
}

fn check_audience(claims: &Map<String, Value>, expected: &str) -> Result<(), AuthFailure> {
    let matches = match claims.get(claim_types::AUDIENCE) {
        Some(Value::String(aud)) => aud == expected,
        Some(Value::Array(auds)) => auds.iter().any(|a| a.as_str() == Some(expected)),
        _ => false,
    };
    if matches {
        Ok(())
    } else {
        Err(AuthFailure::new(
            AuthFailureCode::InvalidAudience,
            "token audience does not match",
        ))
    }
}

#[allow(clippy::cast_possible_wrap)] // seconds since epoch fit in i64
fn unix_seconds(at: SystemTime) -> i64 {
    match at.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

/// Token validation service.
///
/// Wraps a frozen [`ValidationContext`] and adds observational logging around
/// [`validate`]. Cheap to clone; clones share the context.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    ctx: Arc<ValidationContext>,
}

impl TokenValidator {
    #[must_use]
    pub fn new(ctx: Arc<ValidationContext>) -> Self {
        Self { ctx }
    }

    #[must_use]
    pub fn context(&self) -> &ValidationContext {
        &self.ctx
    }

    /// Validate a raw bearer token.
    #[tracing::instrument(skip_all)]
    pub fn validate(&self, token: &str) -> AuthenticationOutcome {
        log_outcome(validate(token, &self.ctx))
    }

    /// Validate the token carried by an `Authorization` header value.
    #[tracing::instrument(skip_all)]
    pub fn validate_authorization_header(&self, header_value: &str) -> AuthenticationOutcome {
        log_outcome(validate_authorization_header(header_value, &self.ctx))
    }
}

fn log_outcome(outcome: AuthenticationOutcome) -> AuthenticationOutcome {
    match &outcome {
        Ok(identity) => debug!(
            subject_id = %identity.subject_id(),
            scheme = %identity.scheme(),
            "Credential validated"
        ),
        Err(failure) => warn!(
            code = %failure.code(),
            message = %failure.message(),
            "Credential rejected"
        ),
    }
    outcome
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Duration;

    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use serde_json::json;

    use super::*;
    use crate::config::SigningAlgorithm;
    use crate::registry::SigningKeyRecord;

    const NOW: u64 = 1_700_000_000;

    fn now() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(NOW)
    }

    fn ctx() -> ValidationContext {
        ValidationContext::builder("https://issuer", "api")
            .clock_skew(Duration::from_secs(60))
            .key(
                SigningKeyRecord::new("k1", SigningAlgorithm::HS256, b"secret".to_vec(), true)
                    .unwrap(),
            )
            .build()
    }

    fn mint(claims: &Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap()
    }

    fn base_claims() -> Value {
        json!({
            "sub": "user-1",
            "iss": "https://issuer",
            "aud": "api",
            "exp": NOW + 300,
        })
    }

    #[test]
    fn accepts_valid_token() {
        let identity = validate_at(&mint(&base_claims()), &ctx(), now()).unwrap();
        assert_eq!(identity.subject_id(), "user-1");
        assert_eq!(identity.scheme(), BEARER_SCHEME);
        assert_eq!(identity.display_name(), None);
    }

    #[test]
    fn blank_token_is_missing_credential() {
        let err = validate_at("  ", &ctx(), now()).unwrap_err();
        assert_eq!(err.code(), AuthFailureCode::MissingCredential);
    }

    #[test]
    fn missing_exp_is_missing_claim() {
        let mut claims = base_claims();
        claims.as_object_mut().unwrap().remove("exp");
        let err = validate_at(&mint(&claims), &ctx(), now()).unwrap_err();
        assert_eq!(err.code(), AuthFailureCode::MissingClaim);
        assert!(err.message().contains("exp"));
    }

    #[test]
    fn subject_shape_is_reported() {
        let mut claims = base_claims();
        claims.as_object_mut().unwrap().remove("sub");
        let err = validate_at(&mint(&claims), &ctx(), now()).unwrap_err();
        assert_eq!(err.code(), AuthFailureCode::MissingClaim);
        assert!(err.message().contains("is missing"));

        for sub in [json!(42), json!(""), json!(["user-1"])] {
            claims["sub"] = sub;
            let err = validate_at(&mint(&claims), &ctx(), now()).unwrap_err();
            assert_eq!(err.code(), AuthFailureCode::MissingClaim);
            assert!(err.message().contains("not a non-empty string"), "{}", claims["sub"]);
        }
    }

    #[test]
    fn non_string_issuer_is_invalid_issuer() {
        let mut claims = base_claims();
        claims["iss"] = json!(42);
        let err = validate_at(&mint(&claims), &ctx(), now()).unwrap_err();
        assert_eq!(err.code(), AuthFailureCode::InvalidIssuer);
    }

    #[test]
    fn failure_messages_never_echo_the_token() {
        let token = mint(&json!({ "sub": "user-1", "exp": NOW + 300 }));
        let err = validate_at(&token, &ctx(), now()).unwrap_err();
        assert!(!err.message().contains(&token));
    }

    #[test]
    fn unix_seconds_handles_pre_epoch() {
        assert_eq!(unix_seconds(UNIX_EPOCH - Duration::from_secs(5)), -5);
        assert_eq!(unix_seconds(now()), 1_700_000_000);
    }
}
