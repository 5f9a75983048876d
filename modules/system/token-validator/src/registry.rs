//! Signing key registry.
//!
//! The registry is populated once at startup from a [`KeySupply`] and then
//! frozen into a [`ValidationContext`]. Request processing only ever reads it,
//! so a context can be shared behind an `Arc` by any number of concurrent
//! validations without locking.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use jsonwebtoken::DecodingKey;
use secrecy::ExposeSecret;
use tracing::warn;
use zeroize::Zeroizing;

use crate::config::{KeyRegistryConfig, SecretEncoding, SigningAlgorithm, SigningKeyConfig};
use crate::error::KeyRegistryError;

/// Clock skew applied when none is configured.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(5 * 60);

/// A symmetric signing key.
///
/// Immutable after construction. Key material lives in zeroizing memory and
/// is never printed by `Debug`.
#[derive(Clone)]
pub struct SigningKeyRecord {
    key_id: String,
    algorithm: SigningAlgorithm,
    key_material: Zeroizing<Vec<u8>>,
    is_active: bool,
}

impl SigningKeyRecord {
    /// Create a key record.
    ///
    /// # Errors
    ///
    /// - [`KeyRegistryError::EmptyKeyId`] if `key_id` is empty
    /// - [`KeyRegistryError::EmptyKeyMaterial`] if `key_material` is empty
    pub fn new(
        key_id: impl Into<String>,
        algorithm: SigningAlgorithm,
        key_material: impl Into<Vec<u8>>,
        is_active: bool,
    ) -> Result<Self, KeyRegistryError> {
        let key_id = key_id.into();
        if key_id.is_empty() {
            return Err(KeyRegistryError::EmptyKeyId);
        }
        let key_material = Zeroizing::new(key_material.into());
        if key_material.is_empty() {
            return Err(KeyRegistryError::EmptyKeyMaterial { key_id });
        }
        Ok(Self {
            key_id,
            algorithm,
            key_material,
            is_active,
        })
    }

    /// Build a record from configuration, decoding the secret.
    ///
    /// # Errors
    ///
    /// - [`KeyRegistryError::InvalidKeyEncoding`] if the secret does not decode
    /// - any error from [`SigningKeyRecord::new`]
    pub fn from_config(cfg: &SigningKeyConfig) -> Result<Self, KeyRegistryError> {
        let secret = cfg.secret.expose_secret();
        let material = match cfg.encoding {
            SecretEncoding::Base64 => STANDARD.decode(secret),
            SecretEncoding::Base64Url => URL_SAFE_NO_PAD.decode(secret),
            SecretEncoding::Utf8 => Ok(secret.as_bytes().to_vec()),
        }
        .map_err(|e| KeyRegistryError::InvalidKeyEncoding {
            key_id: cfg.key_id.clone(),
            reason: e.to_string(),
        })?;

        Self::new(cfg.key_id.clone(), cfg.algorithm, material, cfg.active)
    }

    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn key_material(&self) -> &[u8] {
        &self.key_material
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub(crate) fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.key_material)
    }
}

impl fmt::Debug for SigningKeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyRecord")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .field("key_material", &"[REDACTED]")
            .field("is_active", &self.is_active)
            .finish()
    }
}

/// Source of signing keys and validation parameters.
///
/// Implementations resolve everything up front; nothing here may perform I/O
/// once request processing has started.
pub trait KeySupply: Send + Sync {
    /// Active keys in verification order.
    fn active_signing_keys(&self) -> Vec<SigningKeyRecord>;

    fn issuer(&self) -> &str;

    fn audience(&self) -> &str;

    fn clock_skew(&self) -> Duration;
}

/// [`KeySupply`] backed by static configuration.
#[derive(Debug, Clone)]
pub struct StaticKeySupply {
    issuer: String,
    audience: String,
    clock_skew: Duration,
    keys: Vec<SigningKeyRecord>,
}

impl StaticKeySupply {
    /// Decode every configured key.
    ///
    /// # Errors
    ///
    /// Returns the first key that fails to decode or validate.
    pub fn from_config(cfg: &KeyRegistryConfig) -> Result<Self, KeyRegistryError> {
        let keys = cfg
            .keys
            .iter()
            .map(SigningKeyRecord::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            clock_skew: cfg.clock_skew,
            keys,
        })
    }
}

impl KeySupply for StaticKeySupply {
    fn active_signing_keys(&self) -> Vec<SigningKeyRecord> {
        self.keys.iter().filter(|k| k.is_active()).cloned().collect()
    }

    fn issuer(&self) -> &str {
        &self.issuer
    }

    fn audience(&self) -> &str {
        &self.audience
    }

    fn clock_skew(&self) -> Duration {
        self.clock_skew
    }
}

/// Frozen validation parameters: issuer, audience, clock skew and the ordered
/// set of active keys.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    issuer: String,
    audience: String,
    clock_skew: Duration,
    active_keys: Vec<SigningKeyRecord>,
}

impl ValidationContext {
    /// Start building a context.
    #[must_use]
    pub fn builder(
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> ValidationContextBuilder {
        ValidationContextBuilder {
            issuer: issuer.into(),
            audience: audience.into(),
            clock_skew: DEFAULT_CLOCK_SKEW,
            keys: Vec::new(),
        }
    }

    /// Snapshot a key supply.
    #[must_use]
    pub fn from_supply(supply: &dyn KeySupply) -> Self {
        Self::builder(supply.issuer(), supply.audience())
            .clock_skew(supply.clock_skew())
            .keys(supply.active_signing_keys())
            .build()
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    #[must_use]
    pub fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    /// Active keys in the order signatures are tried.
    #[must_use]
    pub fn active_keys(&self) -> &[SigningKeyRecord] {
        &self.active_keys
    }

    /// Check the readiness invariant: at least one active key and a non-empty
    /// issuer and audience.
    ///
    /// Validation itself never calls this; the host does before serving.
    ///
    /// # Errors
    ///
    /// Returns the first unmet requirement.
    pub fn ensure_ready(&self) -> Result<(), KeyRegistryError> {
        if self.issuer.is_empty() {
            return Err(KeyRegistryError::MissingIssuer);
        }
        if self.audience.is_empty() {
            return Err(KeyRegistryError::MissingAudience);
        }
        if self.active_keys.is_empty() {
            return Err(KeyRegistryError::NoActiveKeys);
        }
        Ok(())
    }
}

/// Builder for [`ValidationContext`].
#[derive(Debug)]
pub struct ValidationContextBuilder {
    issuer: String,
    audience: String,
    clock_skew: Duration,
    keys: Vec<SigningKeyRecord>,
}

impl ValidationContextBuilder {
    #[must_use]
    pub fn clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    #[must_use]
    pub fn key(mut self, key: SigningKeyRecord) -> Self {
        self.keys.push(key);
        self
    }

    #[must_use]
    pub fn keys(mut self, keys: impl IntoIterator<Item = SigningKeyRecord>) -> Self {
        self.keys.extend(keys);
        self
    }

    /// Freeze the context.
    ///
    /// Inactive keys are dropped. Keys keep insertion order; a key whose id was
    /// already added is dropped with a warning.
    #[must_use]
    pub fn build(self) -> ValidationContext {
        let mut seen = HashSet::new();
        let mut active_keys = Vec::with_capacity(self.keys.len());

        for key in self.keys {
            if !key.is_active() {
                continue;
            }
            if !seen.insert(key.key_id().to_owned()) {
                warn!(key_id = %key.key_id(), "Duplicate signing key id ignored");
                continue;
            }
            active_keys.push(key);
        }

        ValidationContext {
            issuer: self.issuer,
            audience: self.audience,
            clock_skew: self.clock_skew,
            active_keys,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;

    fn key(id: &str, active: bool) -> SigningKeyRecord {
        SigningKeyRecord::new(id, SigningAlgorithm::HS256, id.as_bytes().to_vec(), active).unwrap()
    }

    fn key_ids(ctx: &ValidationContext) -> Vec<&str> {
        ctx.active_keys().iter().map(SigningKeyRecord::key_id).collect()
    }

    #[test]
    fn record_rejects_empty_id_and_material() {
        assert!(matches!(
            SigningKeyRecord::new("", SigningAlgorithm::HS256, b"k".to_vec(), true),
            Err(KeyRegistryError::EmptyKeyId)
        ));
        assert!(matches!(
            SigningKeyRecord::new("k1", SigningAlgorithm::HS256, Vec::new(), true),
            Err(KeyRegistryError::EmptyKeyMaterial { key_id }) if key_id == "k1"
        ));
    }

    #[test]
    fn record_debug_redacts_material() {
        let record = SigningKeyRecord::new(
            "k1",
            SigningAlgorithm::HS384,
            b"very-secret-bytes".to_vec(),
            true,
        )
        .unwrap();
        let debug = format!("{record:?}");
        assert!(debug.contains("k1"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("very-secret-bytes"));
    }

    #[test]
    fn builder_keeps_order_and_drops_inactive_and_duplicates() {
        let ctx = ValidationContext::builder("iss", "aud")
            .key(key("new", true))
            .key(key("retired", false))
            .key(key("old", true))
            .key(key("new", true))
            .build();

        assert_eq!(key_ids(&ctx), vec!["new", "old"]);
    }

    #[test]
    fn ensure_ready_checks_invariants() {
        let ready = ValidationContext::builder("iss", "aud")
            .key(key("k1", true))
            .build();
        assert!(ready.ensure_ready().is_ok());

        let no_keys = ValidationContext::builder("iss", "aud").build();
        assert!(matches!(
            no_keys.ensure_ready(),
            Err(KeyRegistryError::NoActiveKeys)
        ));

        let no_issuer = ValidationContext::builder("", "aud")
            .key(key("k1", true))
            .build();
        assert!(matches!(
            no_issuer.ensure_ready(),
            Err(KeyRegistryError::MissingIssuer)
        ));

        let no_audience = ValidationContext::builder("iss", "")
            .key(key("k1", true))
            .build();
        assert!(matches!(
            no_audience.ensure_ready(),
            Err(KeyRegistryError::MissingAudience)
        ));
    }

    #[test]
    fn static_supply_decodes_each_encoding() {
        let cfg: KeyRegistryConfig = serde_json::from_value(json!({
            "issuer": "https://auth.example.com",
            "audience": "orders-api",
            "clock_skew": "30s",
            "keys": [
                { "key_id": "b64", "secret": "c2VjcmV0LTE=" },
                { "key_id": "b64url", "secret": "c2VjcmV0LTI", "encoding": "base64_url" },
                { "key_id": "raw", "secret": "secret-3", "encoding": "utf8", "algorithm": "HS512" },
                { "key_id": "off", "secret": "c2VjcmV0LTQ=", "active": false },
            ],
        }))
        .unwrap();

        let supply = StaticKeySupply::from_config(&cfg).unwrap();
        let ctx = ValidationContext::from_supply(&supply);

        assert_eq!(ctx.issuer(), "https://auth.example.com");
        assert_eq!(ctx.audience(), "orders-api");
        assert_eq!(ctx.clock_skew(), Duration::from_secs(30));
        assert_eq!(key_ids(&ctx), vec!["b64", "b64url", "raw"]);
        assert_eq!(ctx.active_keys()[0].key_material(), b"secret-1");
        assert_eq!(ctx.active_keys()[1].key_material(), b"secret-2");
        assert_eq!(ctx.active_keys()[2].key_material(), b"secret-3");
        assert_eq!(ctx.active_keys()[2].algorithm(), SigningAlgorithm::HS512);
    }

    #[test]
    fn static_supply_reports_undecodable_secret() {
        let cfg: KeyRegistryConfig = serde_json::from_value(json!({
            "issuer": "iss",
            "audience": "aud",
            "keys": [{ "key_id": "broken", "secret": "not base64!!" }],
        }))
        .unwrap();

        let err = StaticKeySupply::from_config(&cfg).unwrap_err();
        assert!(matches!(
            err,
            KeyRegistryError::InvalidKeyEncoding { ref key_id, .. } if key_id == "broken"
        ));
    }
}
