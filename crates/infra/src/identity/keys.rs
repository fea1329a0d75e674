//! Identity-provider signing keys.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;

use super::VerificationError;

/// One verification key and the algorithm it is valid for.
#[derive(Clone)]
pub struct SigningKey {
    pub algorithm: Algorithm,
    pub key: DecodingKey,
}

impl core::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    pub fn hs256(secret: &[u8]) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            key: DecodingKey::from_secret(secret),
        }
    }

    pub fn rs256_pem(pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self {
            algorithm: Algorithm::RS256,
            key: DecodingKey::from_rsa_pem(pem)?,
        })
    }
}

/// The provider's current keys, addressed by JWT `kid`.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, SigningKey>,
    /// Used for credentials without a `kid` header.
    fallback: Option<SigningKey>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, kid: impl Into<String>, key: SigningKey) -> Self {
        self.keys.insert(kid.into(), key);
        self
    }

    pub fn with_fallback(mut self, key: SigningKey) -> Self {
        self.fallback = Some(key);
        self
    }

    pub fn len(&self) -> usize {
        self.keys.len() + usize::from(self.fallback.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn select(&self, kid: Option<&str>) -> Result<&SigningKey, VerificationError> {
        match kid {
            Some(kid) => self
                .keys
                .get(kid)
                .ok_or_else(|| VerificationError::UnknownKey(kid.to_string())),
            None => self
                .fallback
                .as_ref()
                .ok_or_else(|| VerificationError::UnknownKey("<none>".to_string())),
        }
    }
}

/// Source of the identity provider's current signing keys.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn current_keys(&self) -> Result<Arc<KeySet>, VerificationError>;

    /// Refetch ahead of schedule after a credential named a key we do not
    /// hold. `None` means nothing new was fetched.
    async fn refresh(&self) -> Result<Option<Arc<KeySet>>, VerificationError> {
        Ok(None)
    }
}

/// Fixed keys from configuration.
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    keys: Arc<KeySet>,
}

impl StaticKeyProvider {
    pub fn new(keys: KeySet) -> Self {
        Self { keys: Arc::new(keys) }
    }
}

#[async_trait]
impl KeyProvider for StaticKeyProvider {
    async fn current_keys(&self) -> Result<Arc<KeySet>, VerificationError> {
        Ok(self.keys.clone())
    }
}

/// Keys published by the provider as a JSON object `{ "<kid>": "<RSA public key PEM>" }`.
///
/// The fetched set is cached for `ttl`; a failed fetch surfaces as
/// `ProviderUnavailable` (no retry here). An unknown `kid` may force an early
/// refetch, at most once per `min_refresh`.
pub struct HttpKeyProvider {
    client: reqwest::Client,
    url: String,
    ttl: Duration,
    min_refresh: Duration,
    cache: RwLock<Option<(Instant, Arc<KeySet>)>>,
}

const DEFAULT_MIN_REFRESH: Duration = Duration::from_secs(30);

impl HttpKeyProvider {
    pub fn new(url: impl Into<String>, ttl: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), url, ttl)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            ttl,
            min_refresh: DEFAULT_MIN_REFRESH,
            cache: RwLock::new(None),
        }
    }

    pub fn with_min_refresh(mut self, min_refresh: Duration) -> Self {
        self.min_refresh = min_refresh;
        self
    }

    async fn reload(&self) -> Result<Arc<KeySet>, VerificationError> {
        let keys = Arc::new(self.fetch().await?);
        tracing::debug!(count = keys.len(), url = %self.url, "refreshed identity provider keys");
        *self.cache.write().await = Some((Instant::now(), keys.clone()));
        Ok(keys)
    }

    async fn fetch(&self) -> Result<KeySet, VerificationError> {
        let res = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| VerificationError::ProviderUnavailable(e.to_string()))?;

        let published: HashMap<String, String> = res
            .json()
            .await
            .map_err(|e| VerificationError::ProviderUnavailable(format!("invalid key document: {e}")))?;

        Ok(parse_published_keys(published))
    }
}

fn parse_published_keys(published: HashMap<String, String>) -> KeySet {
    let mut set = KeySet::new();
    for (kid, pem) in published {
        match SigningKey::rs256_pem(pem.as_bytes()) {
            Ok(key) => set = set.with_key(kid, key),
            Err(e) => tracing::warn!(%kid, "skipping unparseable signing key: {e}"),
        }
    }
    set
}

#[async_trait]
impl KeyProvider for HttpKeyProvider {
    async fn current_keys(&self) -> Result<Arc<KeySet>, VerificationError> {
        if let Some((fetched_at, keys)) = self.cache.read().await.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(keys.clone());
            }
        }

        self.reload().await
    }

    async fn refresh(&self) -> Result<Option<Arc<KeySet>>, VerificationError> {
        if let Some((fetched_at, _)) = self.cache.read().await.as_ref() {
            if fetched_at.elapsed() < self.min_refresh {
                return Ok(None);
            }
        }
        self.reload().await.map(Some)
    }
}
