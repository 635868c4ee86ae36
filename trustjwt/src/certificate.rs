//! Trusted X.509 certificates and RSA signature checks against their keys
//!
//! Signatures are RSASSA-PKCS1-v1_5, checked through `openssl`. Keys of any
//! modulus size are accepted, 1024-bit keys included.

use std::fmt;

use openssl::{
    pkey::{Id, PKey, Public},
    sign,
    x509::{X509Ref, X509},
};

use crate::{error, jwa::SignatureScheme, jws};

/// A trusted X.509 certificate
///
/// Holds the parsed certificate along with its DER encoding, which is what
/// thumbprints are computed over.
#[derive(Clone)]
pub struct Certificate {
    x509: X509,
    der: Vec<u8>,
}

impl Certificate {
    /// Parses a DER-encoded certificate
    ///
    /// # Errors
    ///
    /// The bytes are not a valid X.509 certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, error::KeyRejected> {
        let x509 = X509::from_der(der).map_err(error::key_rejected)?;
        Ok(Self {
            x509,
            der: der.to_vec(),
        })
    }

    /// Parses a single PEM-encoded certificate
    ///
    /// # Errors
    ///
    /// The text is not a valid PEM certificate.
    pub fn from_pem(pem: &[u8]) -> Result<Self, error::KeyRejected> {
        let x509 = X509::from_pem(pem).map_err(error::key_rejected)?;
        Self::from_x509(x509)
    }

    /// Wraps an `openssl` certificate
    ///
    /// # Errors
    ///
    /// The certificate cannot be re-encoded as DER.
    pub fn from_x509(x509: X509) -> Result<Self, error::KeyRejected> {
        let der = x509.to_der().map_err(error::key_rejected)?;
        Ok(Self { x509, der })
    }

    /// The DER encoding of the certificate
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The underlying `openssl` certificate
    #[must_use]
    pub fn as_x509(&self) -> &X509Ref {
        &self.x509
    }

    /// The SHA-1 digest of the DER encoding
    #[must_use]
    pub fn sha1_digest(&self) -> [u8; 20] {
        let digest =
            ring::digest::digest(&ring::digest::SHA1_FOR_LEGACY_USE_ONLY, self.der.as_slice());
        let mut out = [0; 20];
        out.copy_from_slice(digest.as_ref());
        out
    }

    /// The lower-case hex encoding of the SHA-1 digest of the DER encoding
    #[must_use]
    pub fn sha1_thumbprint(&self) -> String {
        hex::encode(self.sha1_digest())
    }

    fn rsa_public_key(&self) -> Result<PKey<Public>, error::KeyRejected> {
        let pkey = self.x509.public_key().map_err(error::key_rejected)?;
        if pkey.id() != Id::RSA {
            return Err(error::key_rejected("public key is not RSA"));
        }

        Ok(pkey)
    }
}

impl jws::Verifier for Certificate {
    type Algorithm = SignatureScheme;
    type Error = error::SignatureMismatch;

    fn can_verify(&self, _alg: Self::Algorithm) -> bool {
        self.rsa_public_key().is_ok()
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        let pkey = self.rsa_public_key().map_err(|err| {
            tracing::debug!(error = %err, "certificate does not carry an RSA public key");
            error::signature_mismatch()
        })?;

        let mut verifier = sign::Verifier::new(alg.message_digest(), &pkey)
            .map_err(|_| error::signature_mismatch())?;
        verifier
            .update(data)
            .map_err(|_| error::signature_mismatch())?;

        match verifier.verify(signature) {
            Ok(true) => Ok(()),
            Ok(false) | Err(_) => Err(error::signature_mismatch()),
        }
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("sha1", &self.sha1_thumbprint())
            .finish_non_exhaustive()
    }
}
