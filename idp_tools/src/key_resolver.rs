use std::time::Duration;

use bms_common::Secret;
use log::*;
use thiserror::Error;
use tokio::{
    sync::{Mutex, RwLock},
    time::Instant,
};

use crate::{data_objects::JwtKey, IdpApiError};

/// How long resolved signing material stays cached before the next resolution re-fetches
/// it from the provider.
pub const KEY_CACHE_TTL: Duration = Duration::from_secs(3600);

/// The source of the provider's published JWT key set. [`crate::IdpApi`] is the production
/// implementation; tests substitute fakes.
#[allow(async_fn_in_trait)]
pub trait KeyProvider {
    async fn fetch_published_keys(&self) -> Result<Vec<JwtKey>, IdpApiError>;
}

#[derive(Debug, Error)]
pub enum KeyResolverError {
    #[error("Could not fetch the JWT key set from the identity provider: {0}")]
    Provider(#[from] IdpApiError),
}

struct CacheEntry {
    material: Secret<String>,
    expires_at: Instant,
}

/// Resolves the material used to verify bearer-token signatures.
///
/// The first key of the provider's published set is held in a single cache slot for
/// [`KEY_CACHE_TTL`]. While that entry is fresh, resolution takes a read lock and clones
/// the material; no I/O happens. When the slot is empty or expired, one caller re-fetches
/// under the refresh lock and everyone else waits for its result.
///
/// A provider that publishes nothing (a 404, or an empty key set) resolves to the shared
/// fallback secret, and that answer is deliberately *not* cached: publication is picked up
/// on the very next resolution. Any other provider failure is an error, never a silent
/// fallback.
pub struct KeyResolver<P> {
    provider: Option<P>,
    fallback: Secret<String>,
    ttl: Duration,
    slot: RwLock<Option<CacheEntry>>,
    refresh: Mutex<()>,
}

impl<P: KeyProvider> KeyResolver<P> {
    pub fn new(provider: P, fallback: Secret<String>) -> Self {
        Self::with_ttl(Some(provider), fallback, KEY_CACHE_TTL)
    }

    /// A resolver for deployments without an identity provider. Always resolves to the
    /// shared secret.
    pub fn local_only(fallback: Secret<String>) -> Self {
        Self::with_ttl(None, fallback, KEY_CACHE_TTL)
    }

    pub fn with_ttl(provider: Option<P>, fallback: Secret<String>, ttl: Duration) -> Self {
        Self { provider, fallback, ttl, slot: RwLock::new(None), refresh: Mutex::new(()) }
    }

    pub async fn resolve(&self) -> Result<Secret<String>, KeyResolverError> {
        if let Some(material) = self.cached().await {
            return Ok(material);
        }
        let Some(provider) = &self.provider else {
            return Ok(self.fallback.clone());
        };
        let _refresh = self.refresh.lock().await;
        // Another resolution may have repopulated the slot while we waited for the lock.
        if let Some(material) = self.cached().await {
            return Ok(material);
        }
        match provider.fetch_published_keys().await {
            Ok(keys) => match keys.into_iter().next() {
                Some(key) => {
                    debug!("🗝️ Caching the provider's published key");
                    let material = Secret::new(key.public_key);
                    let entry = CacheEntry { material: material.clone(), expires_at: Instant::now() + self.ttl };
                    *self.slot.write().await = Some(entry);
                    Ok(material)
                },
                None => {
                    debug!("🗝️ The provider published an empty key set. Using the shared secret.");
                    Ok(self.fallback.clone())
                },
            },
            Err(IdpApiError::NoPublishedKeys) => {
                debug!("🗝️ The provider publishes no key set. Using the shared secret.");
                Ok(self.fallback.clone())
            },
            Err(e) => {
                warn!("🗝️ Could not resolve JWT signing material: {e}");
                Err(e.into())
            },
        }
    }

    async fn cached(&self) -> Option<Secret<String>> {
        let slot = self.slot.read().await;
        slot.as_ref().filter(|entry| Instant::now() < entry.expires_at).map(|entry| entry.material.clone())
    }
}
