//! Credential extraction from an `Authorization` header value.

use authgate_identity::BEARER_SCHEME;

use crate::error::{AuthFailure, AuthFailureCode};

/// Extract the bearer token from an `Authorization` header value.
///
/// The scheme name is matched case-insensitively (RFC 6750 follows RFC 7235
/// here); the token itself is returned untouched.
///
/// # Errors
///
/// - `MissingCredential` if the header is empty or carries no token
/// - `UnsupportedScheme` if the scheme is not `Bearer`
pub fn bearer_token_from_header(header_value: &str) -> Result<&str, AuthFailure> {
    let value = header_value.trim();
    if value.is_empty() {
        return Err(AuthFailure::missing_credential("no credential presented"));
    }

    // The header value is never echoed: a bare token would land in the
    // failure message and from there in the logs.
    let (scheme, rest) = value.split_once(char::is_whitespace).unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(AuthFailure::new(
            AuthFailureCode::UnsupportedScheme,
            "unsupported authentication scheme",
        ));
    }

    let token = rest.trim();
    if token.is_empty() {
        return Err(AuthFailure::missing_credential("bearer token is empty"));
    }
    Ok(token)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn extracts_token() {
        assert_eq!(bearer_token_from_header("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token_from_header("  bearer   abc.def.ghi ").unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token_from_header("Bearer\tabc.def.ghi").unwrap(), "abc.def.ghi");
    }

    #[test]
    fn empty_header_is_missing_credential() {
        for header in ["", "   "] {
            let err = bearer_token_from_header(header).unwrap_err();
            assert_eq!(err.code(), AuthFailureCode::MissingCredential);
        }
    }

    #[test]
    fn bearer_without_token_is_missing_credential() {
        for header in ["Bearer", "Bearer   "] {
            let err = bearer_token_from_header(header).unwrap_err();
            assert_eq!(err.code(), AuthFailureCode::MissingCredential);
        }
    }

    #[test]
    fn other_schemes_are_unsupported() {
        for header in [
            "Basic dXNlcjpwYXNz",
            "Digest realm=x",
            "abc.def.ghi",
            "Bearer:abc.def.ghi",
        ] {
            let err = bearer_token_from_header(header).unwrap_err();
            assert_eq!(err.code(), AuthFailureCode::UnsupportedScheme);
            assert!(!err.message().contains(header), "{header}");
            assert!(!err.message().contains("abc.def.ghi"), "{header}");
            assert!(!err.message().contains("dXNlcjpwYXNz"), "{header}");
        }
    }
}
