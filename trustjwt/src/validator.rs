//! Verification of compact JWTs against a trust store
//!
//! A [`TokenValidator`] splits a token, decodes its header and payload,
//! finds the certificate named by the header's `x5t` thumbprint, and checks
//! the signature with the algorithm named by `alg`. Every step either
//! succeeds or produces a [`ValidationError`]; nothing panics and nothing is
//! thrown past [`TokenValidator::validate()`].

use std::{fmt, path::PathBuf, sync::Arc};

use arc_swap::ArcSwap;
use trustjwt_base64::Base64Url;

use crate::{
    claims::{ClaimSet, Claims},
    config::{ValidatorConfig, TRUST_STORE_ENV},
    error::{self, ConfigError, ValidationError},
    jwa::SignatureScheme,
    jws::{self, Header},
    jwt::{Jwt, JwtRef, Token},
    trust_store::{TrustStore, TrustStoreEntry},
};

/// How the `alg` header value selects a signature scheme
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AlgorithmPolicy {
    /// Unrecognized names fall back to `RS256`
    #[default]
    Lenient,
    /// Only `RS256`, `RS384`, and `RS512` are accepted
    Strict,
}

/// How the `x5t` header value is compared with trusted certificates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ThumbprintFormat {
    /// `x5t` decodes to the lower-case hex text of the SHA-1 digest
    #[default]
    HexText,
    /// `x5t` decodes to the raw 20-byte SHA-1 digest, as in RFC 7515
    RawDigest,
}

struct Inner {
    store: ArcSwap<TrustStore>,
    location: Option<StoreLocation>,
    algorithm_policy: AlgorithmPolicy,
    thumbprint_format: ThumbprintFormat,
}

struct StoreLocation {
    path: PathBuf,
    password: String,
}

impl fmt::Debug for Inner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenValidator")
            .field("store", &self.store)
            .field("path", &self.location.as_ref().map(|l| &l.path))
            .field("algorithm_policy", &self.algorithm_policy)
            .field("thumbprint_format", &self.thumbprint_format)
            .finish_non_exhaustive()
    }
}

/// Validates compact JWTs against a set of trusted certificates
///
/// Cloning is cheap; clones share the same trust store, so a
/// [`reload()`][Self::reload()] through any clone is seen by all of them.
#[derive(Clone)]
pub struct TokenValidator {
    inner: Arc<Inner>,
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl TokenValidator {
    /// A validator over an already loaded store, with default policies
    pub fn new(store: TrustStore) -> Self {
        Self::with_parts(
            store,
            None,
            AlgorithmPolicy::default(),
            ThumbprintFormat::default(),
        )
    }

    /// Builds a validator from configuration, loading the trust store
    ///
    /// A preloaded store in the configuration takes precedence over the
    /// configured path.
    ///
    /// # Errors
    ///
    /// Returns an error if neither a store nor a path is configured, or if the
    /// configured file cannot be opened or decrypted.
    pub fn from_config(config: ValidatorConfig) -> Result<Self, ConfigError> {
        let (store, location) = match (config.trust_store, config.trust_store_path) {
            (Some(store), path) => {
                let location = path.map(|path| StoreLocation {
                    path,
                    password: config.trust_store_password.clone(),
                });
                (store, location)
            }
            (None, Some(path)) => {
                let store = TrustStore::load(&path, &config.trust_store_password)?;
                let location = StoreLocation {
                    path,
                    password: config.trust_store_password,
                };
                (store, Some(location))
            }
            (None, None) => return Err(ConfigError::Missing(TRUST_STORE_ENV)),
        };

        Ok(Self::with_parts(
            store,
            location,
            config.algorithm_policy,
            config.thumbprint_format,
        ))
    }

    /// Builds a validator from the process environment
    ///
    /// See [`ValidatorConfig::from_env()`].
    ///
    /// # Errors
    ///
    /// Returns an error if the environment is incomplete or the trust store
    /// cannot be loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_config(ValidatorConfig::from_env()?)
    }

    fn with_parts(
        store: TrustStore,
        location: Option<StoreLocation>,
        algorithm_policy: AlgorithmPolicy,
        thumbprint_format: ThumbprintFormat,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: ArcSwap::from_pointee(store),
                location,
                algorithm_policy,
                thumbprint_format,
            }),
        }
    }

    /// The trust store currently in use
    pub fn trust_store(&self) -> TrustStore {
        TrustStore::clone(&self.inner.store.load())
    }

    /// Swaps in a new trust store
    ///
    /// Validations already in progress finish against the previous store.
    pub fn replace_trust_store(&self, store: TrustStore) {
        tracing::info!(trust_store.entries = store.len(), "trust store replaced");
        self.inner.store.store(Arc::new(store));
    }

    /// Re-reads the trust store from the configured path
    ///
    /// Does nothing if the validator was not built from a path. On failure
    /// the current store is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or decrypted.
    pub fn reload(&self) -> Result<(), error::StoreUnavailable> {
        let Some(location) = &self.inner.location else {
            tracing::debug!("no trust store path configured; skipping reload");
            return Ok(());
        };

        let store = TrustStore::load(&location.path, &location.password)?;
        tracing::info!(
            trust_store.path = %location.path.display(),
            trust_store.entries = store.len(),
            "trust store reloaded"
        );
        self.inner.store.store(Arc::new(store));
        Ok(())
    }

    /// Whether `token` carries a valid signature from a trusted certificate
    #[must_use]
    pub fn is_valid(&self, token: &JwtRef) -> bool {
        self.validate(token).is_valid()
    }

    /// Validates `token`, returning the verified header and claims
    ///
    /// # Errors
    ///
    /// Returns the first reason the token failed validation.
    pub fn verify(&self, token: &JwtRef) -> Result<Verified, ValidationError> {
        self.validate(token).into_verified()
    }

    /// Validates `token`, keeping whatever could be decoded along the way
    ///
    /// This never fails. On rejection, [`Validation::error()`] says why, and
    /// the header and claims remain available if they decoded.
    pub fn validate<'a>(&self, token: &'a JwtRef) -> Validation<'a> {
        let mut validation = Validation::new(token);
        let outcome = self.run(token, &mut validation);

        match &outcome {
            Ok(()) => tracing::trace!(
                alias = validation.alias.as_deref(),
                alg = validation.scheme.map(SignatureScheme::jwt_alg),
                "jwt was valid"
            ),
            Err(err) => tracing::debug!(
                reason = err.reason(),
                alias = validation.alias.as_deref(),
                alg = validation.scheme.map(SignatureScheme::jwt_alg),
                error = %err,
                "JWT validation failed"
            ),
        }

        validation.outcome = outcome;
        validation
    }

    fn run(&self, token: &JwtRef, validation: &mut Validation) -> Result<(), ValidationError> {
        let segments = token.segments();
        if segments.is_empty() {
            return Err(error::invalid_format(0).into());
        }

        let header = segments
            .header()
            .map(|h| decode_object(h, "header").map(Header::from));
        let claims = segments.payload().map(|p| decode_object(p, "payload"));

        validation.header = header.as_ref().and_then(|h| h.as_ref().ok()).cloned();
        validation.claims = claims.as_ref().and_then(|c| c.as_ref().ok()).cloned();

        if segments.len() != 3 {
            header.transpose()?;
            claims.transpose()?;
            return Err(error::invalid_format(segments.len()).into());
        }

        let (Some(header), Some(claims), Some(signature), Some(signing_input)) = (
            header,
            claims,
            segments.signature(),
            segments.signing_input(),
        ) else {
            return Err(error::invalid_format(segments.len()).into());
        };
        let header = header?;
        let _ = claims?;
        tracing::trace!("decoded header and payload");

        let signature =
            Base64Url::from_encoded(signature).map_err(|e| error::encoding_error("signature", e))?;

        let x5t = header
            .x5t()
            .ok_or_else(|| error::missing_header_claim("x5t"))?;
        let alg = header
            .alg()
            .ok_or_else(|| error::missing_header_claim("alg"))?;

        let scheme = self.select_scheme(alg)?;
        validation.scheme = Some(scheme);

        let store = self.inner.store.load_full();
        let entry = self.find_certificate(&store, x5t)?;
        tracing::trace!(alias = entry.alias(), "found trusted certificate");
        validation.alias = Some(entry.alias().to_owned());

        jws::Verifier::verify(
            entry.certificate(),
            scheme,
            signing_input.as_bytes(),
            signature.as_slice(),
        )?;

        Ok(())
    }

    fn select_scheme(&self, alg: &str) -> Result<SignatureScheme, error::UnknownAlgorithm> {
        match self.inner.algorithm_policy {
            AlgorithmPolicy::Strict => SignatureScheme::strict_for_jwt_alg(alg),
            AlgorithmPolicy::Lenient => {
                let scheme = SignatureScheme::for_jwt_alg(Some(alg));
                if scheme.jwt_alg() != alg {
                    tracing::warn!(alg, fallback = scheme.jwt_alg(), "unrecognized JWT algorithm");
                }
                Ok(scheme)
            }
        }
    }

    fn find_certificate<'s>(
        &self,
        store: &'s TrustStore,
        x5t: &str,
    ) -> Result<&'s TrustStoreEntry, ValidationError> {
        let thumbprint =
            Base64Url::from_encoded(x5t).map_err(|e| error::encoding_error("x5t", e))?;

        let entry = match self.inner.thumbprint_format {
            ThumbprintFormat::HexText => {
                let text = String::from_utf8_lossy(thumbprint.as_slice());
                store
                    .find_by_thumbprint(&text)
                    .ok_or_else(|| error::certificate_not_found(text.as_ref()))?
            }
            ThumbprintFormat::RawDigest => store
                .find_by_digest(thumbprint.as_slice())
                .ok_or_else(|| error::certificate_not_found(hex::encode(thumbprint.as_slice())))?,
        };

        Ok(entry)
    }
}

fn decode_object(segment: &str, name: &'static str) -> Result<ClaimSet, ValidationError> {
    let bytes = Base64Url::from_encoded(segment).map_err(|e| error::encoding_error(name, e))?;
    Ok(ClaimSet::parse(bytes.as_slice())?)
}

/// The outcome of validating a single token
///
/// Holds whatever was decoded before validation stopped, so a rejected
/// token's header and claims can still be inspected. Values from a rejected
/// token are untrusted.
#[derive(Debug)]
#[must_use]
pub struct Validation<'a> {
    token: &'a JwtRef,
    header: Option<Header>,
    claims: Option<ClaimSet>,
    alias: Option<String>,
    scheme: Option<SignatureScheme>,
    outcome: Result<(), ValidationError>,
}

impl<'a> Validation<'a> {
    fn new(token: &'a JwtRef) -> Self {
        Self {
            token,
            header: None,
            claims: None,
            alias: None,
            scheme: None,
            outcome: Ok(()),
        }
    }

    /// Whether the token passed every check
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Why the token was rejected
    #[must_use]
    pub fn error(&self) -> Option<&ValidationError> {
        self.outcome.as_ref().err()
    }

    /// The decoded header, if it could be decoded
    #[must_use]
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// The decoded payload, if it could be decoded
    #[must_use]
    pub fn claims(&self) -> Option<&ClaimSet> {
        self.claims.as_ref()
    }

    /// The alias of the certificate matching the token's thumbprint
    #[must_use]
    pub fn certificate_alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The signature scheme selected from the token's `alg`
    #[must_use]
    pub fn scheme(&self) -> Option<SignatureScheme> {
        self.scheme
    }

    /// The validated token
    #[must_use]
    pub fn token(&self) -> &'a JwtRef {
        self.token
    }

    /// The canonical view of the decoded payload
    ///
    /// # Errors
    ///
    /// Returns an error if the payload never decoded, or if a registered
    /// claim has the wrong type.
    pub fn claims_set(&self) -> Result<Claims, error::MalformedClaims> {
        match &self.claims {
            Some(claims) => Claims::try_from(claims),
            None => Err(error::malformed_claims("payload was not decoded")),
        }
    }

    /// The canonical claims paired with the original compact token
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as
    /// [`claims_set()`][Self::claims_set()].
    pub fn into_token(self) -> Result<Token, error::MalformedClaims> {
        let claims = self.claims_set()?;
        Ok(Token::new(claims, self.token.to_owned()))
    }

    /// Converts into the verified token, or the reason for rejection
    ///
    /// # Errors
    ///
    /// Returns the reason the token was rejected.
    pub fn into_verified(self) -> Result<Verified, ValidationError> {
        self.outcome?;

        match (self.header, self.claims, self.alias, self.scheme) {
            (Some(header), Some(claims), Some(alias), Some(scheme)) => Ok(Verified {
                header,
                claims,
                alias,
                scheme,
                token: self.token.to_owned(),
            }),
            _ => Err(error::signature_mismatch().into()),
        }
    }
}

/// A token whose signature verified against a trusted certificate
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Verified {
    header: Header,
    claims: ClaimSet,
    alias: String,
    scheme: SignatureScheme,
    token: Jwt,
}

impl Verified {
    /// The verified header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The verified payload
    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    /// The alias of the certificate that verified the signature
    #[must_use]
    pub fn certificate_alias(&self) -> &str {
        &self.alias
    }

    /// The signature scheme used
    #[must_use]
    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    /// The original compact token
    pub fn token(&self) -> &JwtRef {
        &self.token
    }

    /// The canonical view of the verified payload
    ///
    /// # Errors
    ///
    /// Returns an error if a registered claim has the wrong type.
    pub fn claims_set(&self) -> Result<Claims, error::MalformedClaims> {
        Claims::try_from(&self.claims)
    }

    /// The canonical claims paired with the original compact token
    ///
    /// # Errors
    ///
    /// Returns an error if a registered claim has the wrong type.
    pub fn into_token(self) -> Result<Token, error::MalformedClaims> {
        let claims = Claims::try_from(self.claims)?;
        Ok(Token::new(claims, self.token))
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::test::{self, Signer};

    fn alice() -> serde_json::Value {
        json!({ "sub": "alice", "exp": 9_999_999_999_u64 })
    }

    fn store_of(signers: &[&Signer]) -> TrustStore {
        TrustStore::from_entries(
            signers
                .iter()
                .map(|s| (s.name().to_owned(), s.certificate().clone())),
        )
    }

    #[test]
    fn accepts_token_signed_by_trusted_certificate() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::new(store_of(&[&signer]));
        let token = Jwt::new(signer.rs_token(SignatureScheme::Sha256WithRsa, &alice())?);

        let validation = validator.validate(&token);

        assert!(validation.is_valid(), "{:?}", validation.error());
        assert_eq!(validation.certificate_alias(), Some("wso2carbon"));
        assert_eq!(validation.scheme(), Some(SignatureScheme::Sha256WithRsa));
        assert_eq!(
            validation.claims().and_then(|c| c.get_str("sub")),
            Some("alice")
        );
        assert_eq!(
            validation.claims().and_then(|c| c.get_u64("exp")),
            Some(9_999_999_999)
        );
        Ok(())
    }

    #[test]
    fn accepts_rs384_and_rs512() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::new(store_of(&[&signer]));

        for scheme in [
            SignatureScheme::Sha384WithRsa,
            SignatureScheme::Sha512WithRsa,
        ] {
            let token = Jwt::new(signer.rs_token(scheme, &alice())?);
            let verified = validator.verify(&token)?;
            assert_eq!(verified.scheme(), scheme);
        }
        Ok(())
    }

    #[test]
    fn rejects_token_signed_by_untrusted_key() -> Result<()> {
        let trusted = Signer::generate("wso2carbon")?;
        let rogue = Signer::generate("rogue")?;
        let validator = TokenValidator::new(store_of(&[&trusted]));

        // Claims the trusted certificate's thumbprint but is signed by another key
        let header = json!({ "alg": "RS256", "x5t": trusted.x5t() });
        let forged = rogue.token(SignatureScheme::Sha256WithRsa, &header, &alice())?;

        let err = validator.verify(JwtRef::from_str(&forged)).unwrap_err();

        assert!(err.is_verification_failed());
        assert!(!validator.is_valid(JwtRef::from_str(&forged)));
        Ok(())
    }

    #[test]
    fn rejects_unknown_thumbprint() -> Result<()> {
        let trusted = Signer::generate("wso2carbon")?;
        let other = Signer::generate("other")?;
        let validator = TokenValidator::new(store_of(&[&trusted]));
        let token = other.rs_token(SignatureScheme::Sha256WithRsa, &alice())?;

        let validation = validator.validate(JwtRef::from_str(&token));

        assert!(validation
            .error()
            .is_some_and(ValidationError::is_certificate_not_found));
        assert_eq!(validation.certificate_alias(), None);
        assert!(validation.header().is_some());
        Ok(())
    }

    #[test]
    fn any_changed_payload_bit_invalidates_the_signature() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::new(store_of(&[&signer]));
        let token = signer.rs_token(SignatureScheme::Sha256WithRsa, &alice())?;

        let parts: Vec<&str> = token.split('.').collect();
        let payload = Base64Url::from_encoded(parts[1])?.into_inner();
        assert!(validator.is_valid(JwtRef::from_str(&token)));

        for bit in 0..payload.len() * 8 {
            let mut bytes = payload.clone();
            bytes[bit / 8] ^= 1 << (bit % 8);
            let tampered = format!("{}.{}.{}", parts[0], Base64Url::from_raw(bytes), parts[2]);

            let validation = validator.validate(JwtRef::from_str(&tampered));

            assert!(!validation.is_valid(), "bit {} went unnoticed", bit);
            assert!(
                validation
                    .error()
                    .is_some_and(|e| e.is_verification_failed() || e.is_malformed_claims()),
                "bit {}: {:?}",
                bit,
                validation.error()
            );
        }
        Ok(())
    }

    #[test]
    fn rejects_wrong_segment_counts() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::new(store_of(&[&signer]));
        let token = signer.rs_token(SignatureScheme::Sha256WithRsa, &alice())?;
        let parts: Vec<&str> = token.split('.').collect();

        let one = parts[0].to_owned();
        let two = parts[..2].join(".");
        let four = format!("{}.{}", token, parts[2]);

        for (candidate, count) in [("", 0), (one.as_str(), 1), (two.as_str(), 2), (four.as_str(), 4)] {
            let validation = validator.validate(JwtRef::from_str(candidate));
            match validation.error() {
                Some(ValidationError::InvalidFormat(e)) => assert_eq!(e.segments(), count),
                other => panic!("expected invalid format for {} segments, got {:?}", count, other),
            }
        }

        let validation = validator.validate(JwtRef::from_str(&two));
        assert_eq!(
            validation.header().and_then(|h| h.alg()),
            Some("RS256"),
            "header of a short token is still available"
        );
        assert_eq!(
            validation.claims().and_then(|c| c.get_str("sub")),
            Some("alice")
        );
        Ok(())
    }

    #[test]
    fn trailing_separator_is_not_a_signature() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::new(store_of(&[&signer]));
        let token = signer.rs_token(SignatureScheme::Sha256WithRsa, &alice())?;
        let unsigned = format!("{}.", &token[..token.rfind('.').unwrap_or(0)]);

        let err = validator.verify(JwtRef::from_str(&unsigned)).unwrap_err();

        assert!(err.is_invalid_format());
        Ok(())
    }

    #[test]
    fn reports_header_errors_on_short_tokens() -> Result<()> {
        let validator = TokenValidator::new(TrustStore::from_entries(
            Vec::<(String, crate::Certificate)>::new(),
        ));

        let err = validator.verify(JwtRef::from_str("not$base64")).unwrap_err();
        assert!(err.is_encoding_error());

        let err = validator.verify(JwtRef::from_str("WzFd.e30")).unwrap_err();
        assert!(err.is_malformed_claims());
        Ok(())
    }

    #[test]
    fn rejects_undecodable_segments() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::new(store_of(&[&signer]));
        let token = signer.rs_token(SignatureScheme::Sha256WithRsa, &alice())?;
        let parts: Vec<&str> = token.split('.').collect();

        let bad_payload = format!("{}.{}.{}", parts[0], "e30$", parts[2]);
        match validator.verify(JwtRef::from_str(&bad_payload)) {
            Err(ValidationError::EncodingError(e)) => assert_eq!(e.segment(), "payload"),
            other => panic!("expected encoding error, got {:?}", other),
        }

        let bad_signature = format!("{}.{}.{}", parts[0], parts[1], "c2ln+/==");
        match validator.verify(JwtRef::from_str(&bad_signature)) {
            Err(ValidationError::EncodingError(e)) => assert_eq!(e.segment(), "signature"),
            other => panic!("expected encoding error, got {:?}", other),
        }

        let array_payload = format!("{}.{}.{}", parts[0], "WzEsMl0", parts[2]);
        assert!(validator
            .verify(JwtRef::from_str(&array_payload))
            .unwrap_err()
            .is_malformed_claims());
        Ok(())
    }

    #[test]
    fn requires_x5t_and_alg() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::new(store_of(&[&signer]));

        let no_x5t = signer.token(
            SignatureScheme::Sha256WithRsa,
            &json!({ "alg": "RS256" }),
            &alice(),
        )?;
        match validator.verify(JwtRef::from_str(&no_x5t)) {
            Err(ValidationError::MissingHeaderClaim(e)) => assert_eq!(e.claim(), "x5t"),
            other => panic!("expected missing x5t, got {:?}", other),
        }

        let no_alg = signer.token(
            SignatureScheme::Sha256WithRsa,
            &json!({ "x5t": signer.x5t() }),
            &alice(),
        )?;
        match validator.verify(JwtRef::from_str(&no_alg)) {
            Err(ValidationError::MissingHeaderClaim(e)) => assert_eq!(e.claim(), "alg"),
            other => panic!("expected missing alg, got {:?}", other),
        }

        let numeric_alg = signer.token(
            SignatureScheme::Sha256WithRsa,
            &json!({ "alg": 256, "x5t": signer.x5t() }),
            &alice(),
        )?;
        assert!(validator
            .verify(JwtRef::from_str(&numeric_alg))
            .unwrap_err()
            .is_missing_header_claim());
        Ok(())
    }

    #[test]
    #[traced_test]
    fn lenient_policy_falls_back_to_rs256() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::new(store_of(&[&signer]));
        let header = json!({ "alg": "HS256", "x5t": signer.x5t() });
        let token = signer.token(SignatureScheme::Sha256WithRsa, &header, &alice())?;

        let verified = validator.verify(JwtRef::from_str(&token))?;

        assert_eq!(verified.scheme(), SignatureScheme::Sha256WithRsa);
        assert!(logs_contain("unrecognized JWT algorithm"));
        Ok(())
    }

    #[test]
    fn strict_policy_rejects_unknown_algorithms() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::from_config(
            ValidatorConfig::default()
                .with_trust_store(store_of(&[&signer]))
                .with_algorithm_policy(AlgorithmPolicy::Strict),
        )?;
        let header = json!({ "alg": "RS515", "x5t": signer.x5t() });
        let token = signer.token(SignatureScheme::Sha256WithRsa, &header, &alice())?;

        let err = validator.verify(JwtRef::from_str(&token)).unwrap_err();

        assert!(matches!(err, ValidationError::UnsupportedAlgorithm(_)));

        let token = signer.rs_token(SignatureScheme::Sha512WithRsa, &alice())?;
        assert!(validator.is_valid(JwtRef::from_str(&token)));
        Ok(())
    }

    #[test]
    fn mismatched_algorithm_fails_verification() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::new(store_of(&[&signer]));
        let header = json!({ "alg": "RS512", "x5t": signer.x5t() });
        let token = signer.token(SignatureScheme::Sha256WithRsa, &header, &alice())?;

        assert!(validator
            .verify(JwtRef::from_str(&token))
            .unwrap_err()
            .is_verification_failed());
        Ok(())
    }

    #[test]
    fn raw_digest_thumbprints() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::from_config(
            ValidatorConfig::default()
                .with_trust_store(store_of(&[&signer]))
                .with_thumbprint_format(ThumbprintFormat::RawDigest),
        )?;
        let header = json!({ "alg": "RS256", "x5t": signer.x5t_raw() });
        let token = signer.token(SignatureScheme::Sha256WithRsa, &header, &alice())?;

        assert!(validator.is_valid(JwtRef::from_str(&token)));

        let hex_style = signer.rs_token(SignatureScheme::Sha256WithRsa, &alice())?;
        assert!(validator
            .verify(JwtRef::from_str(&hex_style))
            .unwrap_err()
            .is_certificate_not_found());
        Ok(())
    }

    #[test]
    fn accepts_1024_bit_keys() -> Result<()> {
        let signer = Signer::generate_with_bits("wso2carbon", 1024)?;
        let validator = TokenValidator::new(store_of(&[&signer]));

        for scheme in [
            SignatureScheme::Sha256WithRsa,
            SignatureScheme::Sha384WithRsa,
            SignatureScheme::Sha512WithRsa,
        ] {
            let header = json!({ "alg": scheme.jwt_alg(), "x5t": signer.x5t() });
            let message = format!(
                "{}.{}",
                crate::test::encode_json(&header)?,
                crate::test::encode_json(&alice())?
            );
            let signature = signer.sign_with_openssl(scheme, message.as_bytes())?;
            assert_eq!(signature.len(), 128);
            let token = format!("{}.{}", message, Base64Url::from_raw(signature));

            let verified = validator.verify(JwtRef::from_str(&token))?;
            assert_eq!(verified.scheme(), scheme);
            assert_eq!(verified.certificate_alias(), "wso2carbon");
        }
        Ok(())
    }

    #[test]
    fn chain_certificates_do_not_verify_tokens() -> Result<()> {
        let root = Signer::generate("root-ca")?;
        let intermediate = Signer::issued_by("intermediate-ca", &root)?;
        let leaf = Signer::issued_by("wso2carbon", &intermediate)?;
        let der = crate::test::pkcs12_store(&leaf, &[&intermediate, &root], "changeit")?;
        let validator = TokenValidator::new(TrustStore::from_pkcs12_der(&der, "changeit")?);

        let from_intermediate = intermediate.rs_token(SignatureScheme::Sha256WithRsa, &alice())?;
        let err = validator
            .verify(JwtRef::from_str(&from_intermediate))
            .unwrap_err();
        assert!(err.is_certificate_not_found());

        let from_leaf = leaf.rs_token(SignatureScheme::Sha256WithRsa, &alice())?;
        assert!(validator.is_valid(JwtRef::from_str(&from_leaf)));
        Ok(())
    }

    #[test]
    fn partial_results_survive_failure() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::new(store_of(&[&signer]));
        let token = signer.rs_token(SignatureScheme::Sha256WithRsa, &alice())?;
        let broken = format!("{}AAAA", token);

        let validation = validator.validate(JwtRef::from_str(&broken));

        assert!(!validation.is_valid());
        assert_eq!(validation.certificate_alias(), Some("wso2carbon"));
        assert_eq!(validation.header().and_then(|h| h.alg()), Some("RS256"));
        assert_eq!(
            validation.claims_set()?.sub().map(|s| s.as_str()),
            Some("alice")
        );
        Ok(())
    }

    #[test]
    fn verified_token_round_trips_header_and_claims() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::new(store_of(&[&signer]));
        let header = json!({ "alg": "RS384", "x5t": signer.x5t(), "typ": "JWT", "kid": "k1" });
        let claims = json!({
            "sub": "alice",
            "iss": "https://localhost:9443/oauth2/token",
            "aud": ["a", "b"],
            "exp": 9_999_999_999_u64,
            "scope": "openid",
            "nested": { "roles": ["admin"] }
        });
        let token = signer.token(SignatureScheme::Sha384WithRsa, &header, &claims)?;

        let verified = validator.verify(JwtRef::from_str(&token))?;

        assert_eq!(
            serde_json::to_value(verified.header().fields())?,
            header
        );
        assert_eq!(serde_json::to_value(verified.claims())?, claims);
        assert_eq!(verified.token().as_str(), token);

        let canonical = verified.into_token()?;
        assert_eq!(canonical.jwt().as_str(), token);
        assert_eq!(
            canonical.claims().iss().map(|i| i.as_str()),
            Some("https://localhost:9443/oauth2/token")
        );
        assert_eq!(canonical.claims().aud().iter().count(), 2);
        assert_eq!(
            canonical.claims().custom().get("scope"),
            Some(&json!("openid"))
        );
        Ok(())
    }

    #[test]
    fn expired_tokens_still_verify() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::new(store_of(&[&signer]));
        let token = signer.rs_token(SignatureScheme::Sha256WithRsa, &json!({ "exp": 1 }))?;

        assert!(validator.is_valid(JwtRef::from_str(&token)));
        Ok(())
    }

    #[test]
    #[traced_test]
    fn loads_and_reloads_store_from_file() -> Result<()> {
        let first = Signer::generate("first")?;
        let second = Signer::generate("second")?;

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("client-truststore.p12");
        std::fs::write(&path, crate::test::pkcs12_store(&first, &[], "s3cret")?)?;

        let validator = TokenValidator::from_config(ValidatorConfig::new(&path, "s3cret"))?;
        let from_second = second.rs_token(SignatureScheme::Sha256WithRsa, &alice())?;
        assert!(!validator.is_valid(JwtRef::from_str(&from_second)));

        std::fs::write(
            &path,
            crate::test::pkcs12_store(&first, &[&second], "s3cret")?,
        )?;
        let shared = validator.clone();
        validator.reload()?;

        assert!(shared.is_valid(JwtRef::from_str(&from_second)));
        assert_eq!(shared.trust_store().len(), 2);
        assert!(logs_contain("trust store reloaded"));
        assert!(!logs_contain("s3cret"));
        Ok(())
    }

    #[test]
    fn failed_reload_keeps_current_store() -> Result<()> {
        let signer = Signer::generate("first")?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("client-truststore.p12");
        std::fs::write(&path, crate::test::pkcs12_store(&signer, &[], "changeit")?)?;

        let validator = TokenValidator::from_config(ValidatorConfig::new(&path, "changeit"))?;
        std::fs::remove_file(&path)?;

        assert!(validator.reload().is_err());
        assert_eq!(validator.trust_store().len(), 1);
        Ok(())
    }

    #[test]
    fn unavailable_store_fails_construction() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("missing.p12");

        match TokenValidator::from_config(ValidatorConfig::new(&path, "changeit")) {
            Err(ConfigError::StoreUnavailable(err)) => assert_eq!(err.path(), path.as_path()),
            other => panic!("expected an unavailable store, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn config_without_a_store_is_incomplete() {
        let err = TokenValidator::from_config(ValidatorConfig::default()).unwrap_err();

        assert!(matches!(err, ConfigError::Missing(TRUST_STORE_ENV)));
    }

    #[test]
    fn replacing_the_store_changes_what_is_trusted() -> Result<()> {
        let first = Signer::generate("first")?;
        let second = Signer::generate("second")?;
        let validator = TokenValidator::new(store_of(&[&first]));
        let token = second.rs_token(SignatureScheme::Sha256WithRsa, &alice())?;

        assert!(!validator.is_valid(JwtRef::from_str(&token)));
        validator.replace_trust_store(store_of(&[&second]));
        assert!(validator.is_valid(JwtRef::from_str(&token)));
        Ok(())
    }

    #[test]
    fn validates_concurrently() -> Result<()> {
        let signer = Signer::generate("wso2carbon")?;
        let validator = TokenValidator::new(store_of(&[&signer]));
        let token = Jwt::new(signer.rs_token(SignatureScheme::Sha256WithRsa, &alice())?);

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| validator.is_valid(&token)))
                .collect();
            for handle in handles {
                assert!(matches!(handle.join(), Ok(true)));
            }
        });
        Ok(())
    }

    #[test]
    fn debug_output_hides_password() -> Result<()> {
        let signer = Signer::generate("first")?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("client-truststore.p12");
        std::fs::write(&path, crate::test::pkcs12_store(&signer, &[], "s3cret-pass")?)?;

        let validator = TokenValidator::from_config(ValidatorConfig::new(&path, "s3cret-pass"))?;

        assert!(!format!("{:?}", validator).contains("s3cret-pass"));
        Ok(())
    }
}
