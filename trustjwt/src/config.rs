//! Validator configuration
//!
//! Configuration is passed explicitly to
//! [`TokenValidator::from_config()`][crate::TokenValidator::from_config()].
//! [`ValidatorConfig::from_env()`] fills it from the process environment
//! for deployments that keep their trust store in the conventional place.

use std::{fmt, path::PathBuf};

use crate::{
    error::ConfigError,
    trust_store::TrustStore,
    validator::{AlgorithmPolicy, ThumbprintFormat},
};

/// Environment variable naming the trust store file
pub const TRUST_STORE_ENV: &str = "TRUSTJWT_TRUST_STORE";

/// Environment variable holding the trust store password
pub const TRUST_STORE_PASSWORD_ENV: &str = "TRUSTJWT_TRUST_STORE_PASSWORD";

/// Environment variable naming the server installation root
pub const CARBON_HOME_ENV: &str = "CARBON_HOME";

/// Location of the client trust store, relative to [`CARBON_HOME_ENV`]
pub const DEFAULT_TRUST_STORE_PATH: &str = "repository/resources/security/client-truststore.p12";

/// Settings for a [`TokenValidator`][crate::TokenValidator]
///
/// The password is never printed by the [`Debug`] implementation.
#[derive(Clone, Default)]
#[must_use]
pub struct ValidatorConfig {
    pub(crate) trust_store_path: Option<PathBuf>,
    pub(crate) trust_store_password: String,
    pub(crate) trust_store: Option<TrustStore>,
    pub(crate) algorithm_policy: AlgorithmPolicy,
    pub(crate) thumbprint_format: ThumbprintFormat,
}

impl ValidatorConfig {
    /// Configuration for a PKCS#12 trust store at `path`
    pub fn new(path: impl Into<PathBuf>, password: impl Into<String>) -> Self {
        Self::default()
            .with_trust_store_path(path)
            .with_trust_store_password(password)
    }

    /// Reads the trust store location from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if neither [`TRUST_STORE_ENV`] nor
    /// [`CARBON_HOME_ENV`] is set, or if [`TRUST_STORE_PASSWORD_ENV`] is not
    /// set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the trust store location through `lookup`
    ///
    /// `lookup` is called with an environment variable name and returns its
    /// value, if set. An empty path counts as unset; an empty password is
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as
    /// [`from_env()`][Self::from_env()].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let path = match non_empty(TRUST_STORE_ENV) {
            Some(path) => PathBuf::from(path),
            None => non_empty(CARBON_HOME_ENV)
                .map(|home| PathBuf::from(home).join(DEFAULT_TRUST_STORE_PATH))
                .ok_or(ConfigError::Missing(TRUST_STORE_ENV))?,
        };

        let password =
            lookup(TRUST_STORE_PASSWORD_ENV).ok_or(ConfigError::Missing(TRUST_STORE_PASSWORD_ENV))?;

        tracing::debug!(trust_store.path = %path.display(), "trust store configured from environment");

        Ok(Self::new(path, password))
    }

    /// Sets the trust store file
    pub fn with_trust_store_path(self, path: impl Into<PathBuf>) -> Self {
        Self {
            trust_store_path: Some(path.into()),
            ..self
        }
    }

    /// Sets the trust store password
    pub fn with_trust_store_password(self, password: impl Into<String>) -> Self {
        Self {
            trust_store_password: password.into(),
            ..self
        }
    }

    /// Uses an already loaded store instead of reading one from disk
    pub fn with_trust_store(self, store: TrustStore) -> Self {
        Self {
            trust_store: Some(store),
            ..self
        }
    }

    /// Sets how `alg` header values select a signature scheme
    pub fn with_algorithm_policy(self, algorithm_policy: AlgorithmPolicy) -> Self {
        Self {
            algorithm_policy,
            ..self
        }
    }

    /// Sets how `x5t` header values are matched
    pub fn with_thumbprint_format(self, thumbprint_format: ThumbprintFormat) -> Self {
        Self {
            thumbprint_format,
            ..self
        }
    }

    /// The configured trust store file
    #[must_use]
    pub fn trust_store_path(&self) -> Option<&std::path::Path> {
        self.trust_store_path.as_deref()
    }

    /// The configured algorithm policy
    #[must_use]
    pub fn algorithm_policy(&self) -> AlgorithmPolicy {
        self.algorithm_policy
    }

    /// The configured thumbprint format
    #[must_use]
    pub fn thumbprint_format(&self) -> ThumbprintFormat {
        self.thumbprint_format
    }
}

impl fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("trust_store_path", &self.trust_store_path)
            .field("trust_store_password", &"***")
            .field("trust_store", &self.trust_store)
            .field("algorithm_policy", &self.algorithm_policy)
            .field("thumbprint_format", &self.thumbprint_format)
            .finish()
    }
}
