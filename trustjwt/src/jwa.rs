//! Mapping of JWS `alg` names onto RSA signature schemes
//!
//! Only the RSASSA-PKCS1-v1_5 family from [RFC7518 §3.3][rsa] is
//! supported, since certificates in the trust store carry RSA keys.
//!
//! [rsa]: https://tools.ietf.org/html/rfc7518#section-3.3

use std::{fmt, str::FromStr};

use openssl::hash::MessageDigest;

use crate::error;

/// An RSA PKCS#1 v1.5 signature scheme
///
/// This list may be expanded in the future.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum SignatureScheme {
    /// RSA using SHA-256 (`RS256`)
    #[default]
    Sha256WithRsa,
    /// RSA using SHA-384 (`RS384`)
    Sha384WithRsa,
    /// RSA using SHA-512 (`RS512`)
    Sha512WithRsa,
}

impl SignatureScheme {
    /// Selects the scheme named by a JWS `alg` header value
    ///
    /// The name is matched exactly and case-sensitively. Anything else,
    /// including an absent value, falls back to
    /// [`Sha256WithRsa`][Self::Sha256WithRsa]. This never fails.
    ///
    /// ```
    /// use trustjwt::jwa::SignatureScheme;
    ///
    /// assert_eq!(SignatureScheme::for_jwt_alg(Some("RS384")), SignatureScheme::Sha384WithRsa);
    /// assert_eq!(SignatureScheme::for_jwt_alg(Some("rs384")), SignatureScheme::Sha256WithRsa);
    /// assert_eq!(SignatureScheme::for_jwt_alg(None), SignatureScheme::Sha256WithRsa);
    /// ```
    #[must_use]
    pub fn for_jwt_alg(alg: Option<&str>) -> Self {
        alg.and_then(|a| Self::strict_for_jwt_alg(a).ok())
            .unwrap_or_default()
    }

    /// Selects the scheme named by a JWS `alg` header value, rejecting
    /// unknown names
    ///
    /// # Errors
    ///
    /// Returns an error if `alg` is not exactly `RS256`, `RS384`, or `RS512`.
    pub fn strict_for_jwt_alg(alg: &str) -> Result<Self, error::UnknownAlgorithm> {
        match alg {
            "RS256" => Ok(Self::Sha256WithRsa),
            "RS384" => Ok(Self::Sha384WithRsa),
            "RS512" => Ok(Self::Sha512WithRsa),
            _ => Err(error::unknown_algorithm(alg)),
        }
    }

    /// The JWS `alg` name of this scheme
    #[must_use]
    pub const fn jwt_alg(self) -> &'static str {
        match self {
            Self::Sha256WithRsa => "RS256",
            Self::Sha384WithRsa => "RS384",
            Self::Sha512WithRsa => "RS512",
        }
    }

    /// The JCA name of this scheme, e.g. `SHA256withRSA`
    #[must_use]
    pub const fn jca_name(self) -> &'static str {
        match self {
            Self::Sha256WithRsa => "SHA256withRSA",
            Self::Sha384WithRsa => "SHA384withRSA",
            Self::Sha512WithRsa => "SHA512withRSA",
        }
    }

    pub(crate) fn message_digest(self) -> MessageDigest {
        match self {
            Self::Sha256WithRsa => MessageDigest::sha256(),
            Self::Sha384WithRsa => MessageDigest::sha384(),
            Self::Sha512WithRsa => MessageDigest::sha512(),
        }
    }

    #[cfg(test)]
    pub(crate) fn signing_params(self) -> &'static dyn ring::signature::RsaEncoding {
        match self {
            Self::Sha256WithRsa => &ring::signature::RSA_PKCS1_SHA256,
            Self::Sha384WithRsa => &ring::signature::RSA_PKCS1_SHA384,
            Self::Sha512WithRsa => &ring::signature::RSA_PKCS1_SHA512,
        }
    }
}

impl FromStr for SignatureScheme {
    type Err = error::UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::strict_for_jwt_alg(s)
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.jca_name())
    }
}
