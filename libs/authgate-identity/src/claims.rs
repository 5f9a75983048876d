//! Claim map and claim normalization.
//!
//! Token issuers disagree on how multi-valued claims are shaped: some emit a
//! JSON array, some a single space-delimited string (the `OAuth` `scope`
//! convention), some a bare scalar. [`normalize`] is the only place that
//! looks at those shapes; everything downstream sees a [`ClaimMap`].
//!
//! Claim types are case-sensitive. `"Role"` and `"role"` are different keys
//! and no lookup in this crate folds case.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Well-known claim types.
pub mod claim_types {
    /// Subject identifier.
    pub const SUBJECT: &str = "sub";
    /// Human-readable display name.
    pub const NAME: &str = "name";
    /// Granted scopes. The only claim that is ever split on spaces.
    pub const SCOPE: &str = "scope";
    /// Granted roles.
    pub const ROLE: &str = "role";
    /// Token issuer.
    pub const ISSUER: &str = "iss";
    /// Intended audience.
    pub const AUDIENCE: &str = "aud";
    /// Expiration time (seconds since epoch).
    pub const EXPIRES_AT: &str = "exp";
    /// Not-before time (seconds since epoch).
    pub const NOT_BEFORE: &str = "nbf";
}

/// Uniform multi-valued claim map.
///
/// Values keep the order in which the token carried them. Key order carries no
/// meaning; a `BTreeMap` is used so serialized output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClaimMap(BTreeMap<String, Vec<String>>);

impl ClaimMap {
    /// Create an empty claim map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Values of a claim type, empty if the claim is absent.
    #[must_use]
    pub fn values(&self, claim_type: &str) -> &[String] {
        self.0.get(claim_type).map_or(&[][..], Vec::as_slice)
    }

    /// Whether `claim_type` carries exactly `value`.
    ///
    /// Both the type and the value are compared ordinally.
    #[must_use]
    pub fn contains(&self, claim_type: &str, value: &str) -> bool {
        self.values(claim_type).iter().any(|v| v == value)
    }

    /// Whether the claim type is present at all.
    #[must_use]
    pub fn contains_type(&self, claim_type: &str) -> bool {
        self.0.contains_key(claim_type)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for ClaimMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Normalize raw JWT claims into a [`ClaimMap`].
///
/// Rules, applied per claim in this order:
/// 1. an array becomes one entry per element, in order;
/// 2. a `scope` string containing spaces is split on single spaces, empty
///    tokens discarded;
/// 3. any other scalar becomes a single-element list.
///
/// Strings are taken verbatim, numbers and booleans use their JSON text,
/// nested objects and arrays are kept as compact JSON. `null` values carry no
/// claim and are dropped.
#[must_use]
pub fn normalize(raw: &Map<String, Value>) -> ClaimMap {
    raw.iter()
        .filter_map(|(claim_type, value)| {
            let values = normalize_value(claim_type, value)?;
            Some((claim_type.clone(), values))
        })
        .collect()
}

fn normalize_value(claim_type: &str, value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(items.iter().filter_map(scalar_text).collect()),
        Value::String(s) if claim_type == claim_types::SCOPE && s.contains(' ') => Some(
            s.split(' ')
                .filter(|token| !token.is_empty())
                .map(str::to_owned)
                .collect(),
        ),
        other => scalar_text(other).map(|s| vec![s]),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            Some(value.to_string())
        }
    }
}
