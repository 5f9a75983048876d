//! Command implementations. Each returns a serializable report; [`crate::run`]
//! prints it and maps it to an exit status.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use authgate_identity::Identity;
use policy_engine::{AuthorizationDecision, AuthorizationRequest, PolicyEvaluator};
use serde::Serialize;
use token_validator::{
    AuthFailure, AuthenticationOutcome, KeyRegistryConfig, SigningAlgorithm, StaticKeySupply,
    TokenValidator, ValidationContext,
};
use tracing::info;

use crate::Status;

/// Build the validation context and check that it can serve requests.
///
/// # Errors
///
/// Fails if a key does not decode or the registry is not ready.
pub fn build_context(cfg: &KeyRegistryConfig) -> anyhow::Result<ValidationContext> {
    let supply = StaticKeySupply::from_config(cfg).context("invalid signing key configuration")?;
    let ctx = ValidationContext::from_supply(&supply);
    ctx.ensure_ready().context("key registry is not ready")?;

    info!(
        issuer = %ctx.issuer(),
        audience = %ctx.audience(),
        active_keys = ctx.active_keys().len(),
        "Key registry ready"
    );
    Ok(ctx)
}

#[derive(Debug, Serialize)]
pub struct ConfigReport {
    pub issuer: String,
    pub audience: String,
    pub clock_skew: String,
    pub active_keys: Vec<KeySummary>,
}

#[derive(Debug, Serialize)]
pub struct KeySummary {
    pub key_id: String,
    pub algorithm: SigningAlgorithm,
}

/// Summarize a ready context. Key material is never included.
#[must_use]
pub fn check_config(ctx: &ValidationContext) -> ConfigReport {
    ConfigReport {
        issuer: ctx.issuer().to_owned(),
        audience: ctx.audience().to_owned(),
        clock_skew: humantime::format_duration(ctx.clock_skew()).to_string(),
        active_keys: ctx
            .active_keys()
            .iter()
            .map(|k| KeySummary {
                key_id: k.key_id().to_owned(),
                algorithm: k.algorithm(),
            })
            .collect(),
    }
}

/// Where the credential for `validate` comes from.
#[derive(Debug, Clone, Copy)]
pub enum Credential<'a> {
    Token(&'a str),
    AuthorizationHeader(&'a str),
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ValidationReport {
    Valid { identity: Identity },
    Invalid { failure: AuthFailure },
}

impl ValidationReport {
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::Valid { .. } => Status::Success,
            Self::Invalid { .. } => Status::Rejected,
        }
    }
}

impl From<AuthenticationOutcome> for ValidationReport {
    fn from(outcome: AuthenticationOutcome) -> Self {
        match outcome {
            Ok(identity) => Self::Valid { identity },
            Err(failure) => Self::Invalid { failure },
        }
    }
}

#[must_use]
pub fn validate(validator: &TokenValidator, credential: Credential<'_>) -> ValidationReport {
    let outcome = match credential {
        Credential::Token(token) => validator.validate(token),
        Credential::AuthorizationHeader(header) => validator.validate_authorization_header(header),
    };
    outcome.into()
}

#[derive(Debug, Serialize)]
pub struct AuthorizeReport {
    /// Why the token was rejected, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_failure: Option<AuthFailure>,
    pub decision: AuthorizationDecision,
}

impl AuthorizeReport {
    #[must_use]
    pub fn status(&self) -> Status {
        if self.decision.allowed() {
            Status::Success
        } else {
            Status::Rejected
        }
    }
}

/// Validate `token` (if any) and evaluate `request`.
///
/// A rejected or absent token evaluates with no identity.
#[must_use]
pub fn authorize(
    validator: &TokenValidator,
    evaluator: &dyn PolicyEvaluator,
    token: Option<&str>,
    request: &AuthorizationRequest,
) -> AuthorizeReport {
    let (identity, authentication_failure) = match token.map(|t| validator.validate(t)) {
        Some(Ok(identity)) => (Some(identity), None),
        Some(Err(failure)) => (None, Some(failure)),
        None => (None, None),
    };

    AuthorizeReport {
        authentication_failure,
        decision: evaluator.evaluate(identity.as_ref(), request),
    }
}

/// Read an authorization request from a file, or from stdin for `-`.
///
/// # Errors
///
/// Fails if the source cannot be read or does not parse.
pub fn read_request(source: &str) -> anyhow::Result<AuthorizationRequest> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read authorization request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(Path::new(source))
            .with_context(|| format!("failed to read authorization request from {source}"))?
    };
    parse_request(&text)
}

/// Parse an authorization request written as JSON or YAML.
///
/// # Errors
///
/// Fails on syntax errors and unknown fields.
pub fn parse_request(text: &str) -> anyhow::Result<AuthorizationRequest> {
    serde_saphyr::from_str(text).context("invalid authorization request")
}
