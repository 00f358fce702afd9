use async_trait::async_trait;
use jsonwebtoken::{jwk::JwkSet, DecodingKey};
use metrics::counter;
use moka::future::Cache;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum KeySetError {
    #[error("Failed to fetch JWKS: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("JWKS endpoint returned {0}")]
    Status(u16),

    #[error("JWKS unavailable, next fetch allowed after {0:?} cooldown")]
    CoolingDown(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum KeyLookupError {
    #[error("No key found with kid: {0}")]
    UnknownKid(String),

    #[error("Key set unavailable: {0}")]
    KeySet(#[from] KeySetError),

    #[error("Failed to create decoding key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
}

/// Where the provider's published signing keys come from.
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, KeySetError>;
}

pub struct HttpKeySource {
    client: reqwest::Client,
    jwks_url: String,
}

impl HttpKeySource {
    pub fn new(jwks_url: &str, timeout: Duration) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            jwks_url: jwks_url.to_string(),
        })
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self.client.get(&self.jwks_url).send().await?;

        if !response.status().is_success() {
            return Err(KeySetError::Status(response.status().as_u16()));
        }

        Ok(response.json::<JwkSet>().await?)
    }
}

/// Read-mostly cache of the provider key set.
///
/// Readers never block on each other. A refresh replaces the whole set
/// (last writer wins), so concurrent readers only ever see a complete set.
pub struct JwksCache {
    cache: Cache<&'static str, Arc<JwkSet>>,
    source: Arc<dyn KeySource>,
    // Serialises implicit fetches and remembers when the last one ran.
    last_refresh: Mutex<Option<Instant>>,
    refresh_cooldown: Duration,
}

const JWKS_KEY: &str = "jwks";

impl JwksCache {
    pub fn new(source: Arc<dyn KeySource>, ttl: Duration, refresh_cooldown: Duration) -> Self {
        let cache = Cache::builder().time_to_live(ttl).build();

        Self {
            cache,
            source,
            last_refresh: Mutex::new(None),
            refresh_cooldown,
        }
    }

    /// Cached key set, loading it on first use or after TTL expiry.
    /// Loads go through the same cooldown as unknown-kid refreshes, so while
    /// the provider is down at most one fetch runs per window.
    pub async fn get_jwks(&self) -> Result<Arc<JwkSet>, KeySetError> {
        if let Some(jwks) = self.cache.get(JWKS_KEY).await {
            return Ok(jwks);
        }

        self.refresh_if_due().await
    }

    /// Unconditionally refetch the key set and replace the cached copy.
    /// On failure the previous set stays cached.
    pub async fn refresh(&self) -> Result<Arc<JwkSet>, KeySetError> {
        match self.source.fetch().await {
            Ok(jwks) => {
                let jwks = Arc::new(jwks);
                self.cache.insert(JWKS_KEY, jwks.clone()).await;
                counter!("jwks_refreshes_total", "outcome" => "ok").increment(1);
                tracing::info!(keys = jwks.keys.len(), "JWKS refreshed");
                Ok(jwks)
            }
            Err(e) => {
                counter!("jwks_refreshes_total", "outcome" => "error").increment(1);
                tracing::warn!(error = %e, "JWKS refresh failed");
                Err(e)
            }
        }
    }

    pub async fn get_decoding_key(&self, kid: &str) -> Result<DecodingKey, KeyLookupError> {
        if let Some(jwks) = self.cache.get(JWKS_KEY).await {
            if let Some(key) = find_key(&jwks, kid) {
                return key;
            }
        }

        // Unknown kid or nothing cached: the provider may have rotated keys.
        tracing::debug!(kid, "kid not in cached JWKS, attempting refresh");
        let jwks = self.refresh_if_due().await?;

        find_key(&jwks, kid).unwrap_or_else(|| Err(KeyLookupError::UnknownKid(kid.to_string())))
    }

    /// Refresh unless another fetch ran within the cooldown window.
    /// Callers that lose the race get whatever set is cached now. A failed
    /// refresh falls back to the previous set when one is still cached.
    async fn refresh_if_due(&self) -> Result<Arc<JwkSet>, KeySetError> {
        let mut last_refresh = self.last_refresh.lock().await;

        let due = match *last_refresh {
            Some(at) => at.elapsed() >= self.refresh_cooldown,
            None => true,
        };

        if !due {
            return self
                .cache
                .get(JWKS_KEY)
                .await
                .ok_or(KeySetError::CoolingDown(self.refresh_cooldown));
        }

        *last_refresh = Some(Instant::now());
        match self.refresh().await {
            Ok(jwks) => Ok(jwks),
            Err(e) => self.cache.get(JWKS_KEY).await.ok_or(e),
        }
    }
}

fn find_key(jwks: &JwkSet, kid: &str) -> Option<Result<DecodingKey, KeyLookupError>> {
    jwks.keys
        .iter()
        .find(|k| k.common.key_id.as_deref() == Some(kid))
        .map(|jwk| DecodingKey::from_jwk(jwk).map_err(KeyLookupError::from))
}
