use std::sync::Arc;

use crate::{
    domain::{ChannelId, RelayMessage},
    messaging::{
        port::RelayPlatform,
        types::{truncate_chars, PlatformCapabilities},
    },
    relay::identity::IdentityCache,
    Result,
};

const UNKNOWN_AUTHOR: &str = "Unknown";

/// Result of delivering to one channel. Never an error: failures are data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Posted under the author's name/avatar through the proxy identity.
    Proxied,
    /// Posted as the relay itself with the author's name in the text.
    FellBack { proxy_error: Option<String> },
    /// Both paths failed.
    Failed {
        proxy_error: Option<String>,
        error: String,
    },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        !matches!(self, DeliveryOutcome::Failed { .. })
    }
}

/// Sends rendered text into a destination channel.
///
/// The proxy path is tried once; on any failure the channel's identity is
/// evicted and a single plain post is attempted instead.
#[derive(Clone)]
pub struct DeliveryAgent {
    platform: Arc<dyn RelayPlatform>,
    identities: Arc<IdentityCache>,
}

impl DeliveryAgent {
    pub fn new(platform: Arc<dyn RelayPlatform>, identities: Arc<IdentityCache>) -> Self {
        Self {
            platform,
            identities,
        }
    }

    pub async fn deliver(
        &self,
        channel_id: ChannelId,
        rendered_text: &str,
        original: &RelayMessage,
    ) -> DeliveryOutcome {
        let caps = self.platform.capabilities();

        let proxy_error = if caps.supports_proxy_identity {
            match self
                .send_via_proxy(channel_id, rendered_text, original, &caps)
                .await
            {
                Ok(()) => return DeliveryOutcome::Proxied,
                Err(e) => {
                    tracing::warn!(
                        channel = channel_id.0,
                        error = %e,
                        "proxy delivery failed, falling back to bot post"
                    );
                    Some(e.to_string())
                }
            }
        } else {
            None
        };

        let content = truncate_chars(
            &attributed(display_name(original), rendered_text),
            caps.max_message_len,
        );
        match self
            .platform
            .send_as_bot(
                channel_id,
                &content,
                &original.attachments,
                &original.embeds,
            )
            .await
        {
            Ok(()) => DeliveryOutcome::FellBack { proxy_error },
            Err(e) => {
                tracing::error!(channel = channel_id.0, error = %e, "fallback delivery failed");
                DeliveryOutcome::Failed {
                    proxy_error,
                    error: e.to_string(),
                }
            }
        }
    }

    async fn send_via_proxy(
        &self,
        channel_id: ChannelId,
        rendered_text: &str,
        original: &RelayMessage,
        caps: &PlatformCapabilities,
    ) -> Result<()> {
        let platform = self.platform.clone();
        let identity = self
            .identities
            .get_or_create(channel_id, || async move {
                platform.create_or_fetch_proxy_identity(channel_id).await
            })
            .await?;

        let name = truncate_chars(display_name(original), caps.max_display_name_len);
        let content = truncate_chars(rendered_text, caps.max_message_len);
        let sent = self
            .platform
            .send_as_proxy(
                &identity.handle,
                &name,
                original.author.avatar_url.as_deref(),
                &content,
                &original.attachments,
                &original.embeds,
            )
            .await;

        if sent.is_err() && self.identities.invalidate(channel_id, &identity).await {
            tracing::debug!(channel = channel_id.0, proxy = %identity.handle.id, "proxy identity evicted");
        }
        sent
    }
}

fn display_name(message: &RelayMessage) -> &str {
    let name = message.author.display_name.trim();
    if name.is_empty() {
        UNKNOWN_AUTHOR
    } else {
        name
    }
}

/// `[Name] text`, or just `[Name]` for attachment-only posts.
fn attributed(name: &str, text: &str) -> String {
    if text.trim().is_empty() {
        format!("[{name}]")
    } else {
        format!("[{name}] {text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{message, FakePlatform};

    fn agent(platform: &Arc<FakePlatform>) -> (DeliveryAgent, Arc<IdentityCache>) {
        let cache = Arc::new(IdentityCache::new());
        (DeliveryAgent::new(platform.clone(), cache.clone()), cache)
    }

    #[tokio::test]
    async fn proxy_path_preserves_author_and_rich_content() {
        let platform = Arc::new(FakePlatform::default());
        let (agent, cache) = agent(&platform);
        let msg = message(1, "hello");

        let out = agent.deliver(ChannelId(2), "hola", &msg).await;
        assert_eq!(out, DeliveryOutcome::Proxied);

        let sent = platform.proxy_sends();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].display_name.as_deref(), Some("Ann"));
        assert_eq!(sent[0].content, "hola");
        assert_eq!((sent[0].attachments, sent[0].embeds), (1, 1));
        assert!(cache.cached(ChannelId(2)).await.is_some());
    }

    #[tokio::test]
    async fn identity_is_reused_across_deliveries() {
        let platform = Arc::new(FakePlatform::default());
        let (agent, _) = agent(&platform);
        let msg = message(1, "hello");

        agent.deliver(ChannelId(2), "a", &msg).await;
        agent.deliver(ChannelId(2), "b", &msg).await;
        assert_eq!(platform.identity_creations(), 1);
    }

    #[tokio::test]
    async fn proxy_failure_falls_back_once_and_evicts() {
        let platform = Arc::new(FakePlatform::default());
        let (agent, cache) = agent(&platform);
        let msg = message(1, "hello");

        agent.deliver(ChannelId(2), "warm", &msg).await;
        assert_eq!(platform.identity_creations(), 1);

        platform.fail_proxy_sends(ChannelId(2));
        let out = agent.deliver(ChannelId(2), "hello", &msg).await;
        assert!(
            matches!(out, DeliveryOutcome::FellBack { proxy_error: Some(ref e) } if e.contains("Unknown Webhook"))
        );
        assert!(cache.cached(ChannelId(2)).await.is_none());

        let bot = platform.bot_sends();
        assert_eq!(bot.len(), 1);
        assert_eq!(bot[0].content, "[Ann] hello");
        assert_eq!((bot[0].attachments, bot[0].embeds), (1, 1));

        // The next delivery re-creates the identity instead of reusing the stale one.
        platform.heal_proxy_sends(ChannelId(2));
        assert_eq!(
            agent.deliver(ChannelId(2), "again", &msg).await,
            DeliveryOutcome::Proxied
        );
        assert_eq!(platform.identity_creations(), 2);
        let last = platform.proxy_sends().pop().unwrap();
        assert_eq!(last.proxy_id.as_deref(), Some("hook-2-2"));
    }

    #[tokio::test]
    async fn identity_creation_failure_falls_back() {
        let platform = Arc::new(FakePlatform::default());
        let (agent, _) = agent(&platform);
        platform.fail_identity_creation(ChannelId(2));

        let out = agent.deliver(ChannelId(2), "hi", &message(1, "hi")).await;
        assert!(matches!(out, DeliveryOutcome::FellBack { proxy_error: Some(_) }));
        assert_eq!(platform.bot_sends()[0].content, "[Ann] hi");
    }

    #[tokio::test]
    async fn both_paths_failing_is_reported_not_raised() {
        let platform = Arc::new(FakePlatform::default());
        let (agent, _) = agent(&platform);
        platform.fail_proxy_sends(ChannelId(2));
        platform.fail_bot_sends(ChannelId(2));

        let out = agent.deliver(ChannelId(2), "hi", &message(1, "hi")).await;
        assert!(!out.is_delivered());
        assert!(matches!(
            out,
            DeliveryOutcome::Failed {
                proxy_error: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn attribution_handles_empty_text() {
        assert_eq!(attributed("Ann", "hi"), "[Ann] hi");
        assert_eq!(attributed("Ann", "  "), "[Ann]");
    }

    #[tokio::test]
    async fn blank_author_name_uses_placeholder() {
        let platform = Arc::new(FakePlatform::default());
        let (agent, _) = agent(&platform);
        let mut msg = message(1, "hi");
        msg.author.display_name = "   ".to_string();

        agent.deliver(ChannelId(2), "hi", &msg).await;
        assert_eq!(
            platform.proxy_sends()[0].display_name.as_deref(),
            Some("Unknown")
        );
    }
}
