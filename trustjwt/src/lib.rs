//! Verification of signed JSON Web Tokens against a local trust store
//!
//! Tokens name their signing certificate with the `x5t` header: the
//! base64url-encoded SHA-1 thumbprint of the certificate. This crate finds
//! that certificate among a set of trusted X.509 certificates, loaded from a
//! PKCS#12 file, and checks the token's RSA signature with
//! `RS256`, `RS384`, or `RS512`.
//!
//! * JSON Web Signature (JWS): [RFC7515][]
//! * JSON Web Algorithms (JWA): [RFC7518][]
//! * JSON Web Token (JWT): [RFC7519][]
//!
//! Only signature validity is established. Expiry, audience, issuer, and
//! subject are left to the caller, through [`Validation::claims_set()`].
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC7519]: https://tools.ietf.org/html/rfc7519
//!
//! # Example
//!
//! ```no_run
//! use trustjwt::{JwtRef, TokenValidator, ValidatorConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let validator = TokenValidator::from_config(ValidatorConfig::new(
//!     "/opt/carbon/repository/resources/security/client-truststore.p12",
//!     "wso2carbon",
//! ))?;
//!
//! let token = JwtRef::from_str(concat!(
//!     "eyJhbGciOiJSUzI1NiIsIng1dCI6Ik5tSm1PR1V4TXpabVlqTTJaRFJoTlRabFl",
//!     "UQTFOMk0wWXpJelpXSmhNRGMyTldSa1pUUTVNZz09In0.",
//!     "eyJzdWIiOiJhbGljZSIsImV4cCI6OTk5OTk5OTk5OX0.",
//!     "c2lnbmF0dXJl"
//! ));
//!
//! let validation = validator.validate(token);
//! if validation.is_valid() {
//!     let sub = validation.claims().and_then(|c| c.get_str("sub"));
//!     println!("signed by {:?} for {:?}", validation.certificate_alias(), sub);
//! } else if let Some(err) = validation.error() {
//!     println!("rejected: {}", err);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod certificate;
pub mod claims;
pub mod config;
pub mod error;
pub mod jwa;
pub mod jws;
pub mod jwt;
pub mod trust_store;
mod validator;


pub use certificate::Certificate;
pub use config::ValidatorConfig;
pub use jwt::{Jwt, JwtRef};
pub use trust_store::{TrustStore, TrustStoreEntry};
pub use validator::{AlgorithmPolicy, ThumbprintFormat, TokenValidator, Validation, Verified};
