//! Configuration for the static signing key supply.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

use crate::registry::DEFAULT_CLOCK_SKEW;

/// Symmetric JWT signing algorithm.
#[allow(clippy::upper_case_acronyms)] // names follow RFC 7518
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl SigningAlgorithm {
    /// The matching `jsonwebtoken` algorithm.
    #[must_use]
    pub const fn to_jwt(self) -> jsonwebtoken::Algorithm {
        match self {
            Self::HS256 => jsonwebtoken::Algorithm::HS256,
            Self::HS384 => jsonwebtoken::Algorithm::HS384,
            Self::HS512 => jsonwebtoken::Algorithm::HS512,
        }
    }

    /// Symmetric counterpart of a `jsonwebtoken` algorithm, if there is one.
    #[must_use]
    pub const fn from_jwt(alg: jsonwebtoken::Algorithm) -> Option<Self> {
        match alg {
            jsonwebtoken::Algorithm::HS256 => Some(Self::HS256),
            jsonwebtoken::Algorithm::HS384 => Some(Self::HS384),
            jsonwebtoken::Algorithm::HS512 => Some(Self::HS512),
            _ => None,
        }
    }
}

/// How a configured secret string is turned into key bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretEncoding {
    /// Standard base64 with padding.
    #[default]
    Base64,
    /// URL-safe base64 without padding.
    Base64Url,
    /// Raw UTF-8 bytes of the string.
    Utf8,
}

/// Key registry configuration.
///
/// ```yaml
/// keys:
///   issuer: "https://auth.example.com"
///   audience: "orders-api"
///   clock_skew: "5m"
///   keys:
///     - key_id: "2024-q4"
///       algorithm: HS256
///       secret: "c2VjcmV0LWtleS1tYXRlcmlhbC0wMQ=="
///     - key_id: "2025-q1"
///       algorithm: HS512
///       secret: "bmV3LXNlY3JldC1rZXktbWF0ZXJpYWw="
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyRegistryConfig {
    /// Expected `iss` claim, compared exactly.
    pub issuer: String,

    /// Expected `aud` claim, compared exactly.
    pub audience: String,

    /// Tolerance applied to `exp` and `nbf`, e.g. `"30s"` or `"5m"`.
    #[serde(deserialize_with = "deserialize_duration")]
    pub clock_skew: Duration,

    /// Signing keys in verification order.
    pub keys: Vec<SigningKeyConfig>,
}

impl Default for KeyRegistryConfig {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            audience: String::new(),
            clock_skew: DEFAULT_CLOCK_SKEW,
            keys: Vec::new(),
        }
    }
}

/// One configured signing key.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningKeyConfig {
    pub key_id: String,

    #[serde(default)]
    pub algorithm: SigningAlgorithm,

    pub secret: SecretString,

    #[serde(default)]
    pub encoding: SecretEncoding,

    /// Inactive keys are loaded but never used for verification.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}
