//! Allow-list persistence
//!
//! The allow-list is stored as a JSON array of origin strings. It is treated
//! as a set: order is kept only because the storage format is a list.
//! Concurrent writers are last-write-wins.

use serde_json::Value;

use crate::error::{ActivationError, HostError};
use crate::host::KeyValueStore;
use crate::origin::{resolve_origin, Origin};

pub const ALLOWED_ORIGINS_KEY: &str = "enabledOrigins";

/// Allow-list view over a key-value service.
pub struct OriginStore<'a, S> {
    kv: &'a S,
}

impl<'a, S: KeyValueStore> OriginStore<'a, S> {
    pub fn new(kv: &'a S) -> Self {
        Self { kv }
    }

    /// Read the allow-list, canonicalizing entries and dropping junk.
    pub async fn load(&self) -> Result<Vec<Origin>, HostError> {
        let value = self.kv.get(ALLOWED_ORIGINS_KEY).await?;
        Ok(decode_origins(value))
    }

    pub async fn contains(&self, origin: &Origin) -> Result<bool, HostError> {
        Ok(self.load().await?.contains(origin))
    }

    /// Add `origin` if absent. Returns the resulting list.
    pub async fn add(&self, origin: &Origin) -> Result<Vec<Origin>, ActivationError> {
        let mut origins = self.load().await?;
        if !origins.contains(origin) {
            origins.push(origin.clone());
            self.save(&origins).await?;
        }
        Ok(origins)
    }

    /// Remove `origin` if present. Returns the resulting list.
    pub async fn remove(&self, origin: &Origin) -> Result<Vec<Origin>, ActivationError> {
        let mut origins = self.load().await?;
        let before = origins.len();
        origins.retain(|o| o != origin);
        if origins.len() != before {
            self.save(&origins).await?;
        }
        Ok(origins)
    }

    /// Empty the allow-list. Returns what was removed.
    pub async fn clear(&self) -> Result<Vec<Origin>, ActivationError> {
        let origins = self.load().await?;
        self.save(&[]).await?;
        Ok(origins)
    }

    async fn save(&self, origins: &[Origin]) -> Result<(), ActivationError> {
        let value = Value::Array(
            origins
                .iter()
                .map(|o| Value::String(o.as_str().to_string()))
                .collect(),
        );
        self.kv
            .set(ALLOWED_ORIGINS_KEY, value)
            .await
            .map_err(|source| ActivationError::Storage { key: ALLOWED_ORIGINS_KEY, source })
    }
}

fn decode_origins(value: Option<Value>) -> Vec<Origin> {
    let entries = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            log::warn!("allow-list is not an array, treating as empty: {}", other);
            return Vec::new();
        }
    };

    let mut origins: Vec<Origin> = Vec::with_capacity(entries.len());
    for entry in entries {
        let origin = entry.as_str().and_then(resolve_origin);
        match origin {
            Some(origin) if !origins.contains(&origin) => origins.push(origin),
            Some(_) => {}
            None => log::warn!("skipping invalid allow-list entry: {}", entry),
        }
    }
    origins
}
