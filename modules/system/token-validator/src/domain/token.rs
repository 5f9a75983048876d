//! Structural JWT parsing and multi-key signature verification.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use serde::de::IgnoredAny;
use serde_json::{Map, Value};

use authgate_identity::claim_types;

use crate::config::SigningAlgorithm;
use crate::error::AuthFailure;
use crate::registry::SigningKeyRecord;

/// A structurally valid, not yet verified JWT.
#[derive(Debug)]
pub(crate) struct ParsedToken {
    pub algorithm: Algorithm,
    pub claims: Map<String, Value>,
    pub expires_at: Option<i64>,
    pub not_before: Option<i64>,
}

/// Parse a compact JWT without checking its signature.
///
/// Checks the three-segment shape, a decodable header naming a known
/// algorithm, a JSON object payload, and numeric `exp`/`nbf` when present.
pub(crate) fn parse(token: &str) -> Result<ParsedToken, AuthFailure> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(AuthFailure::malformed("JWT must have 3 parts separated by dots"));
    };

    let header = decode_header(token)
        .map_err(|e| AuthFailure::malformed(format!("failed to decode JWT header: {e}")))?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AuthFailure::malformed(format!("failed to decode JWT payload: {e}")))?;

    let claims = match serde_json::from_slice::<Value>(&payload_bytes) {
        Ok(Value::Object(claims)) => claims,
        Ok(_) => return Err(AuthFailure::malformed("JWT payload is not a JSON object")),
        Err(e) => {
            return Err(AuthFailure::malformed(format!(
                "failed to parse JWT claims: {e}"
            )));
        }
    };

    let expires_at = numeric_date(&claims, claim_types::EXPIRES_AT)?;
    let not_before = numeric_date(&claims, claim_types::NOT_BEFORE)?;

    Ok(ParsedToken {
        algorithm: header.alg,
        claims,
        expires_at,
        not_before,
    })
}

/// Read a `NumericDate` claim. Fractional seconds are truncated.
#[allow(clippy::cast_possible_truncation)] // NumericDate seconds fit in i64
fn numeric_date(claims: &Map<String, Value>, claim: &str) -> Result<Option<i64>, AuthFailure> {
    match claims.get(claim) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .map(Some)
            .ok_or_else(|| AuthFailure::malformed(format!("claim '{claim}' is not a number"))),
        Some(_) => Err(AuthFailure::malformed(format!(
            "claim '{claim}' must be a numeric date"
        ))),
    }
}

/// Try every key in order and return the first one that verifies the
/// signature.
///
/// Keys whose algorithm differs from the token's `alg` are skipped, so an
/// asymmetric `alg` never verifies. Only the signature is checked here; time,
/// issuer and audience checks happen afterwards in a fixed order.
pub(crate) fn verify_signature<'k>(
    token: &str,
    algorithm: Algorithm,
    keys: &'k [SigningKeyRecord],
) -> Result<Option<&'k SigningKeyRecord>, AuthFailure> {
    let Some(algorithm) = SigningAlgorithm::from_jwt(algorithm) else {
        return Ok(None);
    };
    let mut validation = Validation::new(algorithm.to_jwt());
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;

    for key in keys.iter().filter(|k| k.algorithm() == algorithm) {
        match decode::<IgnoredAny>(token, &key.decoding_key(), &validation) {
            Ok(_) => return Ok(Some(key)),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm
                ) => {}
            Err(e) => return Err(AuthFailure::from(e)),
        }
    }
    Ok(None)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    use super::*;
    use crate::error::AuthFailureCode;

    fn segment(value: &Value) -> String {
        URL_SAFE_NO_PAD.encode(value.to_string())
    }

    fn unsigned(header: &Value, payload: &Value) -> String {
        format!("{}.{}.sig", segment(header), segment(payload))
    }

    fn key(id: &str, alg: SigningAlgorithm, secret: &[u8]) -> SigningKeyRecord {
        SigningKeyRecord::new(id, alg, secret.to_vec(), true).unwrap()
    }

    fn sign(alg: Algorithm, secret: &[u8]) -> String {
        encode(
            &Header::new(alg),
            &json!({ "sub": "u1" }),
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn rejects_wrong_segment_count() {
        for token in ["", "only.two", "too.many.parts.here", "no-dots"] {
            let err = parse(token).unwrap_err();
            assert_eq!(err.code(), AuthFailureCode::MalformedCredential, "{token}");
        }
    }

    #[test]
    fn rejects_alg_none_header() {
        let token = unsigned(&json!({ "alg": "none" }), &json!({ "sub": "u1" }));
        let err = parse(&token).unwrap_err();
        assert_eq!(err.code(), AuthFailureCode::MalformedCredential);
    }

    #[test]
    fn rejects_non_object_payload() {
        let token = unsigned(&json!({ "alg": "HS256" }), &json!(["sub", "u1"]));
        let err = parse(&token).unwrap_err();
        assert_eq!(err.code(), AuthFailureCode::MalformedCredential);
    }

    #[test]
    fn rejects_invalid_payload_base64() {
        let header = segment(&json!({ "alg": "HS256" }));
        let err = parse(&format!("{header}.!!!.sig")).unwrap_err();
        assert_eq!(err.code(), AuthFailureCode::MalformedCredential);
    }

    #[test]
    fn rejects_non_numeric_exp() {
        let token = unsigned(
            &json!({ "alg": "HS256" }),
            &json!({ "sub": "u1", "exp": "tomorrow" }),
        );
        let err = parse(&token).unwrap_err();
        assert_eq!(err.code(), AuthFailureCode::MalformedCredential);
    }

    #[test]
    fn reads_numeric_dates() {
        let token = unsigned(
            &json!({ "alg": "HS256" }),
            &json!({ "exp": 1_700_000_000, "nbf": 1_600_000_000.75 }),
        );
        let parsed = parse(&token).unwrap();
        assert_eq!(parsed.algorithm, Algorithm::HS256);
        assert_eq!(parsed.expires_at, Some(1_700_000_000));
        assert_eq!(parsed.not_before, Some(1_600_000_000));
    }

    #[test]
    fn verifies_with_any_matching_key() {
        let keys = [
            key("a", SigningAlgorithm::HS256, b"secret-a"),
            key("b", SigningAlgorithm::HS256, b"secret-b"),
        ];
        let token = sign(Algorithm::HS256, b"secret-b");

        let matched = verify_signature(&token, Algorithm::HS256, &keys).unwrap();
        assert_eq!(matched.map(SigningKeyRecord::key_id), Some("b"));
    }

    #[test]
    fn key_algorithm_must_match_header() {
        let keys = [key("a", SigningAlgorithm::HS256, b"shared")];
        let token = sign(Algorithm::HS512, b"shared");

        let matched = verify_signature(&token, Algorithm::HS512, &keys).unwrap();
        assert!(matched.is_none());
    }

    #[test]
    fn asymmetric_header_never_verifies() {
        let keys = [key("a", SigningAlgorithm::HS256, b"shared")];
        let token = sign(Algorithm::HS256, b"shared");

        let matched = verify_signature(&token, Algorithm::RS256, &keys).unwrap();
        assert!(matched.is_none());
    }

    #[test]
    fn no_matching_key_yields_none() {
        let keys = [key("a", SigningAlgorithm::HS256, b"secret-a")];
        let token = sign(Algorithm::HS256, b"someone-else");

        let matched = verify_signature(&token, Algorithm::HS256, &keys).unwrap();
        assert!(matched.is_none());
    }
}
