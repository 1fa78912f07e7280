use async_trait::async_trait;

use crate::proto::{transport::Transport, Result};

/// Reads a piece of device state over the command channel.
#[async_trait]
pub trait Fetch: Send + Sync {
    type Value: Clone + Send;

    async fn fetch(&self, transport: &mut Transport) -> Result<Self::Value>;
}

/// A value read from the device at most once, until it is invalidated or
/// overwritten.
///
/// With caching disabled every [`LazyCache::get`] goes to the device and the
/// fetched value replaces whatever was stored before.
pub struct LazyCache<F: Fetch> {
    fetcher: F,
    value: Option<F::Value>,
    enabled: bool,
}

impl<F: Fetch> LazyCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            value: None,
            enabled: true,
        }
    }

    pub async fn get(&mut self, transport: &mut Transport) -> Result<F::Value> {
        if self.enabled {
            if let Some(value) = &self.value {
                return Ok(value.clone());
            }
        }
        // A failed fetch leaves no stale value behind.
        self.value = None;
        let value = self.fetcher.fetch(transport).await?;
        self.value = Some(value.clone());
        Ok(value)
    }

    pub fn set(&mut self, value: F::Value) {
        self.value = Some(value);
    }

    pub fn invalidate(&mut self) {
        self.value = None;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }

    /// The stored value, without going to the device.
    pub fn peek(&self) -> Option<&F::Value> {
        self.value.as_ref()
    }
}
