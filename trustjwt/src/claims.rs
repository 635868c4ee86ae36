//! Parsing of decoded JWT sections into claim maps
//!
//! A [`ClaimSet`] is the generic, schema-free view of a JSON object decoded
//! from a token segment. Both the header and the payload of a token are
//! parsed into one. Typed accessors return `None` when a key is absent or
//! holds a value of a different type; callers decide whether that matters.
//!
//! [`Claims`] is the canonical view of a payload: the registered claims of
//! [RFC7519 §4.1][reg] pulled out into typed fields, with every other claim
//! retained as a custom claim.
//!
//! [reg]: https://tools.ietf.org/html/rfc7519#section-4.1
//!
//! ```
//! use trustjwt::claims::{ClaimSet, Claims};
//!
//! let set = ClaimSet::parse(br#"{"sub":"alice","exp":9999999999,"role":"admin"}"#).unwrap();
//! assert_eq!(set.get_str("sub"), Some("alice"));
//! assert_eq!(set.get_u64("exp"), Some(9_999_999_999));
//! assert_eq!(set.get_str("exp"), None);
//!
//! let claims = Claims::try_from(&set).unwrap();
//! assert_eq!(claims.sub().map(|s| s.as_str()), Some("alice"));
//! assert_eq!(claims.custom().get("role").and_then(|v| v.as_str()), Some("admin"));
//! ```

use std::{convert::TryFrom, time::SystemTime};

use aliri_braid::braid;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error;

/// An immutable JSON object decoded from a token segment
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[must_use]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    /// Parses decoded segment bytes as a JSON object
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid JSON, or if the top-level
    /// value is anything other than an object.
    pub fn parse(bytes: &[u8]) -> Result<Self, error::MalformedClaims> {
        let value: Value = serde_json::from_slice(bytes).map_err(error::malformed_claims)?;

        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(error::malformed_claims(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// The raw JSON value held under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The value under `key`, if it is a string
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// The value under `key`, if it is a number
    #[must_use]
    pub fn get_number(&self, key: &str) -> Option<&Number> {
        match self.get(key) {
            Some(Value::Number(n)) => Some(n),
            _ => None,
        }
    }

    /// The value under `key`, if it is a number representable as a `u64`
    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get_number(key).and_then(Number::as_u64)
    }

    /// The value under `key`, if it is a number representable as an `i64`
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get_number(key).and_then(Number::as_i64)
    }

    /// The value under `key`, if it is a boolean
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Whether the object holds `key`, regardless of its value
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the object is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the entries of the object
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A view of the underlying JSON map
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Unwraps the underlying JSON map
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Unix time
///
/// Unix time as represented by the number of seconds elapsed since the
/// beginning of the Unix epoch on 1970/01/01 at 00:00:00 UTC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct UnixTime(pub u64);

impl UnixTime {
    /// The current time according to the system clock
    #[must_use]
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }
}

impl From<SystemTime> for UnixTime {
    #[inline]
    fn from(t: SystemTime) -> Self {
        let secs = t
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        UnixTime(secs)
    }
}

/// An audience
#[braid(serde, ref_doc = "A borrowed reference to an [`Audience`]")]
pub struct Audience;

/// An issuer of JWTs
#[braid(serde, ref_doc = "A borrowed reference to an [`Issuer`]")]
pub struct Issuer;

/// The subject of a JWT
#[braid(serde, ref_doc = "A borrowed reference to a [`Subject`]")]
pub struct Subject;

/// A set of zero or more [`Audience`]s
///
/// Serialized as a bare string when there is exactly one audience.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OneOrMany<Audience>", into = "OneOrMany<Audience>")]
#[repr(transparent)]
#[must_use]
pub struct Audiences(Vec<Audience>);

impl Audiences {
    /// An empty audience set
    #[inline]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Indicates whether the audience set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates through references to the audiences in the set
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &AudienceRef> {
        self.0.iter().map(AsRef::as_ref)
    }
}

impl From<OneOrMany<Audience>> for Audiences {
    #[inline]
    fn from(vals: OneOrMany<Audience>) -> Self {
        match vals {
            OneOrMany::One(x) => Self(vec![x]),
            OneOrMany::Many(v) => Self(v),
        }
    }
}

impl From<Audiences> for OneOrMany<Audience> {
    #[inline]
    fn from(mut aud: Audiences) -> Self {
        if aud.0.len() == 1 {
            if let Some(single) = aud.0.pop() {
                return Self::One(single);
            }
        }

        Self::Many(aud.0)
    }
}

impl From<Vec<Audience>> for Audiences {
    #[inline]
    fn from(vals: Vec<Audience>) -> Self {
        Self(vals)
    }
}

/// A type representing one or more items, primarily for serialization
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single item
    One(T),

    /// Zero or more items, to be serialized/deserialized as an array
    Many(Vec<T>),
}

/// The canonical claims of a JWT payload
///
/// Registered claims are pulled into typed fields; everything else is kept
/// verbatim in [`custom()`][Self::custom()].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<Issuer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<Subject>,
    #[serde(default, skip_serializing_if = "Audiences::is_empty")]
    aud: Audiences,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nbf: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jti: Option<String>,
    #[serde(flatten)]
    custom: Map<String, Value>,
}

impl Claims {
    /// Issuer
    #[must_use]
    pub fn iss(&self) -> Option<&IssuerRef> {
        self.iss.as_deref()
    }

    /// Subject
    #[must_use]
    pub fn sub(&self) -> Option<&SubjectRef> {
        self.sub.as_deref()
    }

    /// Audience
    pub fn aud(&self) -> &Audiences {
        &self.aud
    }

    /// Expires
    #[must_use]
    pub fn exp(&self) -> Option<UnixTime> {
        self.exp
    }

    /// Not before
    #[must_use]
    pub fn nbf(&self) -> Option<UnixTime> {
        self.nbf
    }

    /// Issued at
    #[must_use]
    pub fn iat(&self) -> Option<UnixTime> {
        self.iat
    }

    /// JWT ID
    #[must_use]
    pub fn jti(&self) -> Option<&str> {
        self.jti.as_deref()
    }

    /// All claims other than the registered ones
    #[must_use]
    pub fn custom(&self) -> &Map<String, Value> {
        &self.custom
    }

    /// Whether the token had expired at `now`
    ///
    /// A token without an `exp` claim never expires.
    #[must_use]
    pub fn is_expired_at(&self, now: UnixTime) -> bool {
        matches!(self.exp, Some(exp) if exp < now)
    }

    /// Whether the token has expired according to the system clock
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(UnixTime::now())
    }
}

impl TryFrom<&'_ ClaimSet> for Claims {
    type Error = error::MalformedClaims;

    fn try_from(set: &ClaimSet) -> Result<Self, Self::Error> {
        serde_json::from_value(Value::Object(set.0.clone())).map_err(error::malformed_claims)
    }
}

impl TryFrom<ClaimSet> for Claims {
    type Error = error::MalformedClaims;

    fn try_from(set: ClaimSet) -> Result<Self, Self::Error> {
        serde_json::from_value(Value::Object(set.0)).map_err(error::malformed_claims)
    }
}
