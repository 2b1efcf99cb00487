use std::{collections::HashMap, future::Future, sync::Arc};

use tokio::sync::{Mutex, OnceCell};

use crate::{
    domain::{ChannelId, ProxyHandle},
    Result,
};

type Slot = Arc<OnceCell<ProxyHandle>>;

/// A handle checked out of the cache, remembering which slot produced it.
#[derive(Clone, Debug)]
pub struct CachedIdentity {
    pub handle: ProxyHandle,
    slot: Slot,
}

/// Per-channel proxy identity cache shared by all relay operations.
///
/// Each channel owns one slot. Concurrent misses on a slot share a single
/// creation; a failed creation is retried by the next caller, and an empty
/// slot with no waiters is dropped.
/// Eviction only removes the slot that produced the failing handle, so a slot
/// re-created concurrently is never dropped and an evicted one never returns.
#[derive(Default)]
pub struct IdentityCache {
    slots: Mutex<HashMap<ChannelId, Slot>>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, channel_id: ChannelId) -> Slot {
        let mut map = self.slots.lock().await;
        map.entry(channel_id)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    pub async fn get_or_create<F, Fut>(
        &self,
        channel_id: ChannelId,
        create: F,
    ) -> Result<CachedIdentity>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ProxyHandle>>,
    {
        let slot = self.slot(channel_id).await;
        match slot.get_or_try_init(create).await {
            Ok(handle) => {
                let handle = handle.clone();
                Ok(CachedIdentity { handle, slot })
            }
            Err(e) => {
                self.prune_empty(channel_id, &slot).await;
                Err(e)
            }
        }
    }

    /// Drop an empty slot nobody else is waiting on.
    async fn prune_empty(&self, channel_id: ChannelId, slot: &Slot) {
        let mut map = self.slots.lock().await;
        let idle = match map.get(&channel_id) {
            // One reference in the map, one held by the caller.
            Some(current) => {
                Arc::ptr_eq(current, slot) && !slot.initialized() && Arc::strong_count(slot) == 2
            }
            None => false,
        };
        if idle {
            map.remove(&channel_id);
        }
    }

    /// Evict `identity` if it is still the channel's current slot.
    ///
    /// Returns whether anything was removed.
    pub async fn invalidate(&self, channel_id: ChannelId, identity: &CachedIdentity) -> bool {
        let mut map = self.slots.lock().await;
        match map.get(&channel_id) {
            Some(current) if Arc::ptr_eq(current, &identity.slot) => {
                map.remove(&channel_id);
                true
            }
            _ => false,
        }
    }

    pub async fn cached(&self, channel_id: ChannelId) -> Option<ProxyHandle> {
        let map = self.slots.lock().await;
        map.get(&channel_id).and_then(|s| s.get().cloned())
    }

    /// Whether `proxy_id` is one of our live proxy identities.
    pub async fn owns(&self, proxy_id: &str) -> bool {
        let map = self.slots.lock().await;
        map.values()
            .any(|s| s.get().is_some_and(|h| h.id == proxy_id))
    }
}
