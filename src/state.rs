use std::sync::Arc;

use serde_json::Value;
use tokio::time::Duration;

use calshare_core::{CalendarConfiguration, SaveRequest, StateId, StoredEntry};

use crate::store::{KvStore, StoreError};

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 30);

const LEGACY_PREFIX: &str = "calendar:";

// Bounds regeneration when a fresh identifier collides with a live record.
const MAX_ID_ATTEMPTS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("ID is required")]
    MissingId,
    #[error("{0}")]
    BadRequest(String),
    #[error("State not found")]
    NotFound,
    #[error("Not authorized to update this state")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create, fetch and password-gated update of shared calendar configurations.
///
/// The password check and the following write are separate store calls, so two
/// concurrent updates that both pass the check race with last-write-wins.
pub struct StateService<S: ?Sized> {
    store: Arc<S>,
    ttl: Duration,
}

impl<S: ?Sized> Clone for StateService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ttl: self.ttl,
        }
    }
}

impl<S: KvStore + ?Sized> StateService<S> {
    pub fn new(store: Arc<S>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub async fn fetch(&self, id: &str) -> Result<CalendarConfiguration, Error> {
        let id = id.parse::<StateId>().map_err(|_| Error::MissingId)?;
        let entry = self.load(&id).await?.ok_or(Error::NotFound)?;
        Ok(entry.state)
    }

    pub async fn save(&self, request: SaveRequest) -> Result<StateId, Error> {
        let SaveRequest {
            state,
            id,
            password,
        } = request;

        let id = match id {
            Some(id) => {
                if let Some(existing) = self.load(&id).await? {
                    if existing.password != password {
                        log::info!("Rejected update of `{id}`: password mismatch");
                        return Err(Error::Forbidden);
                    }
                }
                id
            }
            None => self.fresh_id().await?,
        };

        let entry = StoredEntry { state, password };
        let value = serde_json::to_value(&entry).map_err(|source| StoreError::Encode {
            key: id.to_string(),
            source,
        })?;

        self.store.set(id.as_str(), value, Some(self.ttl)).await?;
        log::debug!("Stored state `{id}`");

        Ok(id)
    }

    /// Reads a document written through [`StateService::save_raw`].
    pub async fn fetch_raw(&self, id: &str) -> Result<Value, Error> {
        let id = id.parse::<StateId>().map_err(|_| Error::MissingId)?;
        self.store
            .get(&legacy_key(&id))
            .await?
            .ok_or(Error::NotFound)
    }

    /// Stores an arbitrary document under a fresh identifier, without expiry or
    /// password.
    pub async fn save_raw(&self, body: Value) -> Result<StateId, Error> {
        let id = StateId::generate();
        self.store.set(&legacy_key(&id), body, None).await?;
        log::debug!("Stored legacy calendar `{id}`");
        Ok(id)
    }

    async fn load(&self, id: &StateId) -> Result<Option<StoredEntry>, Error> {
        let Some(value) = self.store.get(id.as_str()).await? else {
            return Ok(None);
        };

        let entry = serde_json::from_value(value).map_err(|source| StoreError::Malformed {
            key: id.to_string(),
            source,
        })?;

        Ok(Some(entry))
    }

    async fn fresh_id(&self) -> Result<StateId, Error> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = StateId::generate();
            if self.store.get(id.as_str()).await?.is_none() {
                return Ok(id);
            }
            log::warn!("Generated identifier `{id}` is taken, retrying");
        }

        Err(StoreError::Unavailable("could not allocate a fresh identifier".into()).into())
    }
}

fn legacy_key(id: &StateId) -> String {
    format!("{LEGACY_PREFIX}{id}")
}
