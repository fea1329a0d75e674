//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use hrms_infra::directory::{InMemoryUserDirectory, StoreError};
use hrms_infra::identity::{HttpKeyProvider, JwtCredentialVerifier, KeyProvider, KeySet, SigningKey, StaticKeyProvider};
use hrms_infra::session::{CookiePolicy, InMemoryRevocationStore, SessionConfig, SessionManager};
use hrms_infra::{Backend, PrincipalResolver};

const DEV_SESSION_SECRET: &str = "dev-session-secret";
const DEV_IDENTITY_SECRET: &str = "dev-identity-secret";

/// How long fetched provider keys are trusted before refetching.
const KEY_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid HRMS_BIND_ADDR '{0}'")]
    InvalidBindAddr(String),

    #[error("{0} must be set when APP_ENV=production")]
    MissingInProduction(&'static str),

    #[error("failed to load users file: {0}")]
    Users(#[from] StoreError),
}

/// Where credential signing keys come from.
#[derive(Clone, PartialEq, Eq)]
pub enum IdentityKeys {
    /// Shared HS256 secret, optionally bound to a key id.
    Secret { secret: String, key_id: Option<String> },
    /// Provider-published RSA keys.
    Remote { url: String },
}

impl core::fmt::Debug for IdentityKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IdentityKeys::Secret { key_id, .. } => f
                .debug_struct("Secret")
                .field("key_id", key_id)
                .finish_non_exhaustive(),
            IdentityKeys::Remote { url } => f.debug_struct("Remote").field("url", url).finish(),
        }
    }
}

#[derive(Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub session_secret: String,
    pub identity_keys: IdentityKeys,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub production: bool,
    pub users_file: Option<PathBuf>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let production = get("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));

        let raw_addr = get("HRMS_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(raw_addr.clone()))?;

        let session_secret = match get("SESSION_SECRET") {
            Some(secret) => secret,
            None if production => return Err(ConfigError::MissingInProduction("SESSION_SECRET")),
            None => {
                tracing::warn!("SESSION_SECRET not set; using insecure dev default");
                DEV_SESSION_SECRET.to_string()
            }
        };

        let identity_keys = match (get("IDENTITY_KEYS_URL"), get("IDENTITY_SIGNING_SECRET")) {
            (Some(url), _) => IdentityKeys::Remote { url },
            (None, Some(secret)) => IdentityKeys::Secret {
                secret,
                key_id: get("IDENTITY_KEY_ID"),
            },
            (None, None) if production => {
                return Err(ConfigError::MissingInProduction("IDENTITY_KEYS_URL"));
            }
            (None, None) => {
                tracing::warn!("no identity keys configured; using insecure dev secret");
                IdentityKeys::Secret {
                    secret: DEV_IDENTITY_SECRET.to_string(),
                    key_id: None,
                }
            }
        };

        Ok(Self {
            bind_addr,
            session_secret,
            identity_keys,
            issuer: get("IDENTITY_ISSUER"),
            audience: get("IDENTITY_AUDIENCE"),
            production,
            users_file: get("HRMS_USERS_FILE").map(PathBuf::from),
        })
    }

    pub fn cookie_policy(&self) -> CookiePolicy {
        if self.production {
            CookiePolicy::default()
        } else {
            CookiePolicy::development()
        }
    }

    /// Wire verifier, session manager and directory for this configuration.
    pub fn build_backend(&self) -> Result<Backend, ConfigError> {
        let keys: Arc<dyn KeyProvider> = match &self.identity_keys {
            IdentityKeys::Secret { secret, key_id } => {
                let key = SigningKey::hs256(secret.as_bytes());
                let set = match key_id {
                    Some(kid) => KeySet::new().with_key(kid.clone(), key),
                    None => KeySet::new().with_fallback(key),
                };
                Arc::new(StaticKeyProvider::new(set))
            }
            IdentityKeys::Remote { url } => Arc::new(HttpKeyProvider::new(url.clone(), KEY_CACHE_TTL)),
        };

        let mut verifier = JwtCredentialVerifier::new(keys);
        if let Some(issuer) = &self.issuer {
            verifier = verifier.with_issuer(issuer.clone());
        }
        if let Some(audience) = &self.audience {
            verifier = verifier.with_audience(audience.clone());
        }

        let sessions = SessionManager::new(
            Arc::new(verifier),
            Arc::new(InMemoryRevocationStore::new()),
            self.session_secret.as_bytes(),
            SessionConfig::default(),
        );

        let directory = match &self.users_file {
            Some(path) => InMemoryUserDirectory::load_json_file(path)?,
            None => {
                tracing::warn!("HRMS_USERS_FILE not set; user directory starts empty");
                InMemoryUserDirectory::new()
            }
        };

        Ok(Backend::new(
            Arc::new(sessions),
            Arc::new(PrincipalResolver::new(Arc::new(directory))),
        ))
    }
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("identity_keys", &self.identity_keys)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("production", &self.production)
            .field("users_file", &self.users_file)
            .finish_non_exhaustive()
    }
}
