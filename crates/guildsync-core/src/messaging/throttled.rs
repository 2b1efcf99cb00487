use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{Attachment, ChannelId, EmbedRef, MessageId, ProxyHandle},
    messaging::{port::RelayPlatform, types::PlatformCapabilities},
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* outbound platform calls.
    pub global_min_interval: Duration,
    /// Minimum spacing between calls targeting the same channel.
    pub per_channel_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(20), // ~50/sec
            per_channel_min_interval: Duration::from_millis(250),
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// RelayPlatform decorator that spaces out outbound calls.
///
/// A fan-out burst hits many channels at once; this keeps us well under the
/// platform's per-route limits. It does not guarantee zero 429s.
pub struct ThrottledPlatform {
    inner: Arc<dyn RelayPlatform>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_channel: Mutex<HashMap<ChannelId, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledPlatform {
    pub fn new(inner: Arc<dyn RelayPlatform>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_channel: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for_channel(&self, channel_id: ChannelId) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_channel.lock().await;
        if !map.contains_key(&channel_id) {
            // An expired limiter behaves like a fresh one, so idle channels can go.
            let now = Instant::now();
            map.retain(|_, lim| {
                Arc::strong_count(lim) > 1 || lim.try_lock().map_or(true, |l| l.next > now)
            });
        }
        map.entry(channel_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_channel_min_interval,
                )))
            })
            .clone()
    }

    async fn throttle_channel(&self, channel_id: ChannelId) {
        let global_wait = { self.global.lock().await.reserve() };
        let channel_wait = {
            let lim = self.limiter_for_channel(channel_id).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = global_wait.max(channel_wait);
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl RelayPlatform for ThrottledPlatform {
    fn capabilities(&self) -> PlatformCapabilities {
        self.inner.capabilities()
    }

    async fn send_as_bot(
        &self,
        channel_id: ChannelId,
        content: &str,
        attachments: &[Attachment],
        embeds: &[EmbedRef],
    ) -> Result<()> {
        self.throttle_channel(channel_id).await;
        self.inner
            .send_as_bot(channel_id, content, attachments, embeds)
            .await
    }

    async fn create_or_fetch_proxy_identity(&self, channel_id: ChannelId) -> Result<ProxyHandle> {
        self.throttle_channel(channel_id).await;
        self.inner.create_or_fetch_proxy_identity(channel_id).await
    }

    async fn send_as_proxy(
        &self,
        handle: &ProxyHandle,
        display_name: &str,
        avatar_url: Option<&str>,
        content: &str,
        attachments: &[Attachment],
        embeds: &[EmbedRef],
    ) -> Result<()> {
        self.throttle_channel(handle.channel_id).await;
        self.inner
            .send_as_proxy(handle, display_name, avatar_url, content, attachments, embeds)
            .await
    }

    async fn reply(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: &str,
    ) -> Result<()> {
        self.throttle_channel(channel_id).await;
        self.inner.reply(channel_id, message_id, content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakePlatform;

    #[tokio::test]
    async fn limiter_spaces_consecutive_reservations() {
        let mut lim = IntervalLimiter::new(Duration::from_millis(100));
        assert!(lim.reserve().is_zero());
        let second = lim.reserve();
        assert!(second > Duration::from_millis(50));
        assert!(second <= Duration::from_millis(100));
        let third = lim.reserve();
        assert!(third > second);
    }

    #[tokio::test]
    async fn idle_channel_limiters_are_dropped() {
        let throttled = ThrottledPlatform::new(
            Arc::new(FakePlatform::default()),
            ThrottleConfig {
                global_min_interval: Duration::from_millis(0),
                per_channel_min_interval: Duration::from_millis(1),
            },
        );
        throttled.send_as_bot(ChannelId(1), "a", &[], &[]).await.unwrap();
        sleep(Duration::from_millis(10)).await;
        throttled.send_as_bot(ChannelId(2), "b", &[], &[]).await.unwrap();

        let map = throttled.per_channel.lock().await;
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&ChannelId(2)));
    }

    #[tokio::test]
    async fn decorator_forwards_every_call() {
        let inner = Arc::new(FakePlatform::default());
        let throttled = ThrottledPlatform::new(
            inner.clone(),
            ThrottleConfig {
                global_min_interval: Duration::from_millis(0),
                per_channel_min_interval: Duration::from_millis(1),
            },
        );

        let handle = throttled
            .create_or_fetch_proxy_identity(ChannelId(7))
            .await
            .unwrap();
        throttled
            .send_as_proxy(&handle, "Ann", None, "hi", &[], &[])
            .await
            .unwrap();
        throttled
            .send_as_bot(ChannelId(8), "[Ann] hi", &[], &[])
            .await
            .unwrap();
        throttled
            .reply(ChannelId(8), MessageId(1), "hola")
            .await
            .unwrap();

        assert_eq!(inner.proxy_sends().len(), 1);
        assert_eq!(inner.bot_sends().len(), 1);
        assert_eq!(inner.replies().len(), 1);
        assert_eq!(
            throttled.capabilities().max_message_len,
            inner.capabilities().max_message_len
        );
    }
}
