//! Common errors

#![allow(missing_copy_implementations)]

use std::{error::Error as StdError, path::PathBuf};

use thiserror::Error;
pub use trustjwt_base64::InvalidBase64Data;

/// The token does not split into exactly a header, payload, and signature
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("malformed JWT: expected 3 segments, found {segments}")]
pub struct InvalidFormat {
    segments: usize,
}

impl InvalidFormat {
    /// The number of usable segments found in the token
    #[must_use]
    pub fn segments(&self) -> usize {
        self.segments
    }
}

pub(crate) const fn invalid_format(segments: usize) -> InvalidFormat {
    InvalidFormat { segments }
}

/// A token segment is not valid base64url
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("JWT {segment} is not valid base64url")]
pub struct EncodingError {
    segment: &'static str,
    #[source]
    source: InvalidBase64Data,
}

impl EncodingError {
    /// The name of the segment that failed to decode
    #[must_use]
    pub fn segment(&self) -> &'static str {
        self.segment
    }
}

pub(crate) fn encoding_error(segment: &'static str, source: InvalidBase64Data) -> EncodingError {
    EncodingError { segment, source }
}

/// Decoded bytes are not a JSON object
#[derive(Debug, Error)]
#[error("malformed claims: invalid JSON object")]
pub struct MalformedClaims {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_claims(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedClaims {
    MalformedClaims {
        source: source.into(),
    }
}

/// A header claim required for verification is absent or not a string
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("required header claim '{claim}' missing")]
pub struct MissingHeaderClaim {
    claim: &'static str,
}

impl MissingHeaderClaim {
    /// The name of the missing header claim
    #[must_use]
    pub fn claim(&self) -> &'static str {
        self.claim
    }
}

pub(crate) const fn missing_header_claim(claim: &'static str) -> MissingHeaderClaim {
    MissingHeaderClaim { claim }
}

/// The provided name could not be matched with a supported algorithm
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("'{alg}' does not match supported algorithms")]
pub struct UnknownAlgorithm {
    alg: String,
}

pub(crate) fn unknown_algorithm(alg: impl Into<String>) -> UnknownAlgorithm {
    UnknownAlgorithm { alg: alg.into() }
}

/// The trust store could not be opened, read, or decrypted
#[derive(Debug, Error)]
#[error("trust store unavailable: {}", path.display())]
pub struct StoreUnavailable {
    path: PathBuf,
    #[source]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl StoreUnavailable {
    /// The location of the trust store that failed to load
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

pub(crate) fn store_unavailable(
    path: impl Into<PathBuf>,
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> StoreUnavailable {
    StoreUnavailable {
        path: path.into(),
        source: source.into(),
    }
}

/// No certificate in the trust store matches the token's thumbprint
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("no trusted certificate matches thumbprint '{thumbprint}'")]
pub struct CertificateNotFound {
    thumbprint: String,
}

impl CertificateNotFound {
    /// The thumbprint that was looked up
    #[must_use]
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }
}

pub(crate) fn certificate_not_found(thumbprint: impl Into<String>) -> CertificateNotFound {
    CertificateNotFound {
        thumbprint: thumbprint.into(),
    }
}

/// The signature did not match
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("signature mismatch")]
pub struct SignatureMismatch {
    _p: (),
}

pub(crate) const fn signature_mismatch() -> SignatureMismatch {
    SignatureMismatch { _p: () }
}

/// The certificate's key was rejected
#[derive(Debug, Error)]
#[error("key rejected")]
pub struct KeyRejected {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn key_rejected(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> KeyRejected {
    KeyRejected {
        source: source.into(),
    }
}

/// Required configuration is missing or invalid
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is absent from the configuration or environment
    #[error("required setting {0} is not set")]
    Missing(&'static str),

    /// The trust store named by the configuration could not be loaded
    #[error(transparent)]
    StoreUnavailable(#[from] StoreUnavailable),
}

/// An error occurring while validating a compact JWT
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The token does not have a header, payload, and signature
    #[error(transparent)]
    InvalidFormat(#[from] InvalidFormat),

    /// A token segment is not valid base64url
    #[error(transparent)]
    EncodingError(#[from] EncodingError),

    /// The header or payload is not a JSON object
    #[error(transparent)]
    MalformedClaims(#[from] MalformedClaims),

    /// The header lacks `alg` or `x5t`
    #[error(transparent)]
    MissingHeaderClaim(#[from] MissingHeaderClaim),

    /// The header names an algorithm that strict mode does not accept
    #[error(transparent)]
    UnsupportedAlgorithm(#[from] UnknownAlgorithm),

    /// No trusted certificate matches the header thumbprint
    #[error(transparent)]
    CertificateNotFound(#[from] CertificateNotFound),

    /// The signature does not verify against the trusted certificate
    #[error(transparent)]
    VerificationFailed(#[from] SignatureMismatch),
}

impl ValidationError {
    /// Whether the token did not split into three segments
    #[must_use]
    pub fn is_invalid_format(&self) -> bool {
        matches!(self, Self::InvalidFormat(_))
    }

    /// Whether a segment failed to decode as base64url
    #[must_use]
    pub fn is_encoding_error(&self) -> bool {
        matches!(self, Self::EncodingError(_))
    }

    /// Whether the header or payload was not a JSON object
    #[must_use]
    pub fn is_malformed_claims(&self) -> bool {
        matches!(self, Self::MalformedClaims(_))
    }

    /// Whether a required header claim was missing
    #[must_use]
    pub fn is_missing_header_claim(&self) -> bool {
        matches!(self, Self::MissingHeaderClaim(_))
    }

    /// Whether no trusted certificate matched the thumbprint
    #[must_use]
    pub fn is_certificate_not_found(&self) -> bool {
        matches!(self, Self::CertificateNotFound(_))
    }

    /// Whether the signature failed to verify
    #[must_use]
    pub fn is_verification_failed(&self) -> bool {
        matches!(self, Self::VerificationFailed(_))
    }

    /// A short, stable label for the failure, suitable for logs and metrics
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) => "invalid_format",
            Self::EncodingError(_) => "encoding_error",
            Self::MalformedClaims(_) => "malformed_claims",
            Self::MissingHeaderClaim(_) => "missing_header_claim",
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::CertificateNotFound(_) => "certificate_not_found",
            Self::VerificationFailed(_) => "verification_failed",
        }
    }
}
