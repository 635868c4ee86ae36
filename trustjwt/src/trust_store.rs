//! A read-only store of trusted certificates, keyed by alias
//!
//! Stores are loaded once, from an encrypted PKCS#12 file, and never
//! mutated afterwards. Each entry carries the SHA-1 digest of the
//! certificate's DER encoding, computed at load time, so thumbprint lookups
//! are a linear scan over precomputed values.
//!
//! A [`TrustStore`] is a cheap handle over shared, immutable data and can be
//! cloned freely across threads.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use openssl::{
    pkcs12::Pkcs12,
    x509::{X509Ref, X509VerifyResult, X509},
};

use crate::{certificate::Certificate, error};

/// A single trusted certificate and its alias
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustStoreEntry {
    alias: String,
    certificate: Certificate,
    digest: [u8; 20],
    thumbprint: String,
}

impl TrustStoreEntry {
    /// Pairs a certificate with an alias, computing its thumbprint
    pub fn new(alias: impl Into<String>, certificate: Certificate) -> Self {
        let digest = certificate.sha1_digest();
        Self {
            alias: alias.into(),
            thumbprint: hex::encode(digest),
            certificate,
            digest,
        }
    }

    /// The alias under which the certificate is stored
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The trusted certificate
    #[must_use]
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// The SHA-1 digest of the certificate's DER encoding
    #[must_use]
    pub fn sha1_digest(&self) -> &[u8; 20] {
        &self.digest
    }

    /// The lower-case hex encoding of [`sha1_digest()`][Self::sha1_digest()]
    #[must_use]
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }
}

#[derive(Debug)]
struct Inner {
    source: Option<PathBuf>,
    entries: Vec<TrustStoreEntry>,
}

/// An immutable collection of trusted certificates
#[derive(Clone)]
#[must_use]
pub struct TrustStore {
    inner: Arc<Inner>,
}

impl TrustStore {
    /// Opens and decrypts a PKCS#12 trust store
    ///
    /// The certificate of the private key entry, if any, is the leaf of that
    /// entry's chain and is listed first. The issuers above it in the chain
    /// are not entries of their own. Every other certificate in the file
    /// follows as a trusted certificate entry. Aliases come from the
    /// `friendlyName` attribute, falling back to `entry-<n>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unreadable, is not a
    /// PKCS#12 archive, or if the password is wrong.
    pub fn load(path: impl AsRef<Path>, password: &str) -> Result<Self, error::StoreUnavailable> {
        let path = path.as_ref();
        let der = std::fs::read(path).map_err(|e| error::store_unavailable(path, e))?;
        let entries = parse_pkcs12(&der, password).map_err(|e| error::store_unavailable(path, e))?;

        tracing::info!(
            trust_store.path = %path.display(),
            trust_store.entries = entries.len(),
            "trust store loaded"
        );

        Ok(Self::with_source(Some(path.to_owned()), entries))
    }

    /// Decrypts a PKCS#12 trust store held in memory
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a PKCS#12 archive or if the
    /// password is wrong.
    pub fn from_pkcs12_der(der: &[u8], password: &str) -> Result<Self, error::StoreUnavailable> {
        let entries =
            parse_pkcs12(der, password).map_err(|e| error::store_unavailable("<memory>", e))?;
        Ok(Self::with_source(None, entries))
    }

    /// Builds a store from certificates that have already been loaded
    pub fn from_entries<I, A>(entries: I) -> Self
    where
        I: IntoIterator<Item = (A, Certificate)>,
        A: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(alias, cert)| TrustStoreEntry::new(alias, cert))
            .collect();

        Self::with_source(None, entries)
    }

    fn with_source(source: Option<PathBuf>, entries: Vec<TrustStoreEntry>) -> Self {
        Self {
            inner: Arc::new(Inner { source, entries }),
        }
    }

    /// The file this store was loaded from, if any
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.inner.source.as_deref()
    }

    /// All entries, in store order
    #[must_use]
    pub fn entries(&self) -> &[TrustStoreEntry] {
        &self.inner.entries
    }

    /// The number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether the store holds no certificates
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// The entry stored under `alias`
    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&TrustStoreEntry> {
        self.entries().iter().find(|e| e.alias == alias)
    }

    /// Finds the first entry whose hex-encoded SHA-1 digest equals
    /// `thumbprint`
    ///
    /// The comparison is textual and case-sensitive against the lower-case
    /// hex digest. Returns `None` when nothing matches.
    #[must_use]
    pub fn find_by_thumbprint(&self, thumbprint: &str) -> Option<&TrustStoreEntry> {
        self.entries().iter().find(|e| e.thumbprint == thumbprint)
    }

    /// Finds the first entry whose raw SHA-1 digest equals `digest`
    #[must_use]
    pub fn find_by_digest(&self, digest: &[u8]) -> Option<&TrustStoreEntry> {
        self.entries().iter().find(|e| e.digest[..] == *digest)
    }
}

impl fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TrustStore")
            .field("source", &self.inner.source)
            .field("entries", &self.inner.entries)
            .finish()
    }
}

fn fallback_alias(idx: usize) -> String {
    format!("entry-{}", idx)
}

fn parse_pkcs12(
    der: &[u8],
    password: &str,
) -> Result<Vec<TrustStoreEntry>, Box<dyn std::error::Error + Send + Sync>> {
    let parsed = Pkcs12::from_der(der)?.parse2(password)?;

    let ca: Vec<X509> = parsed.ca.into_iter().flatten().collect();
    let in_chain = match &parsed.cert {
        Some(leaf) => chain_members(leaf, &ca),
        None => vec![false; ca.len()],
    };

    let leaf = parsed.cert.into_iter();
    let trusted = ca
        .into_iter()
        .zip(in_chain)
        .filter_map(|(x509, in_chain)| (!in_chain).then_some(x509));

    let mut entries = Vec::new();
    for x509 in leaf.chain(trusted) {
        let alias = x509
            .alias()
            .map(|a| String::from_utf8_lossy(a).into_owned())
            .unwrap_or_else(|| fallback_alias(entries.len()));
        let cert = Certificate::from_x509(x509)?;
        entries.push(TrustStoreEntry::new(alias, cert));
    }

    Ok(entries)
}

/// Marks the certificates in `ca` that sit above `leaf` in its issuer chain
///
/// Each step takes the first unmarked certificate that issued the previous
/// one, so a trusted entry duplicating a chain member keeps its own slot.
fn chain_members(leaf: &X509Ref, ca: &[X509]) -> Vec<bool> {
    let mut in_chain = vec![false; ca.len()];
    if leaf.issued(leaf) == X509VerifyResult::OK {
        return in_chain;
    }

    let mut current = leaf;
    loop {
        let issuer = (0..ca.len())
            .find(|&i| !in_chain[i] && ca[i].issued(current) == X509VerifyResult::OK);
        let Some(idx) = issuer else { break };

        in_chain[idx] = true;
        current = &*ca[idx];
        if current.issued(current) == X509VerifyResult::OK {
            break;
        }
    }

    in_chain
}
