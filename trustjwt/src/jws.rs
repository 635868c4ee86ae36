//! JSON Web Signature headers and verification
//!
//! The specifications for this standard can be found in [RFC7515][].
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515

use std::{error::Error as StdError, ops::Deref};

use crate::{claims::ClaimSet, jwa::SignatureScheme};

/// A JWS verifier
pub trait Verifier {
    /// The verifiable signature algorithms
    type Algorithm;

    /// The error returned on a failure to verify
    type Error: StdError + Send + Sync + 'static;

    /// Whether the specific algorithm provided is compatible
    /// with this verifier
    fn can_verify(&self, alg: Self::Algorithm) -> bool;

    /// Attempts to verify the data against the signature using the
    /// specified algorithm
    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error>;
}

/// Verifies `signature` over `signing_input`, collapsing every failure to
/// `false`
///
/// A malformed signature, a key of the wrong type, and a genuine mismatch
/// are indistinguishable to the caller.
pub fn verify<V>(scheme: SignatureScheme, key: &V, signing_input: &[u8], signature: &[u8]) -> bool
where
    V: Verifier<Algorithm = SignatureScheme> + ?Sized,
{
    key.verify(scheme, signing_input, signature).is_ok()
}

/// The decoded header of a JWS
///
/// All header values are available through the underlying [`ClaimSet`];
/// the accessors here cover the ones used to select a key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct Header(ClaimSet);

impl Header {
    /// Wraps a parsed header object
    pub fn new(fields: ClaimSet) -> Self {
        Self(fields)
    }

    /// Algorithm (`alg`), if present as a string
    #[must_use]
    pub fn alg(&self) -> Option<&str> {
        self.0.get_str("alg")
    }

    /// X.509 certificate SHA-1 thumbprint (`x5t`), still base64url-encoded
    #[must_use]
    pub fn x5t(&self) -> Option<&str> {
        self.0.get_str("x5t")
    }

    /// Key ID (`kid`)
    #[must_use]
    pub fn kid(&self) -> Option<&str> {
        self.0.get_str("kid")
    }

    /// Type (`typ`)
    #[must_use]
    pub fn typ(&self) -> Option<&str> {
        self.0.get_str("typ")
    }

    /// All header values
    pub fn fields(&self) -> &ClaimSet {
        &self.0
    }

    /// Unwraps the header values
    pub fn into_fields(self) -> ClaimSet {
        self.0
    }
}

impl Deref for Header {
    type Target = ClaimSet;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<ClaimSet> for Header {
    fn from(fields: ClaimSet) -> Self {
        Self(fields)
    }
}
