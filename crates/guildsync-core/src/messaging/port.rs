use async_trait::async_trait;

use crate::{
    domain::{Attachment, ChannelId, EmbedRef, MessageId, ProxyHandle},
    messaging::types::PlatformCapabilities,
    Result,
};

/// Chat platform delivery primitives.
///
/// Discord is the first implementation; proxy identities map onto webhooks.
#[async_trait]
pub trait RelayPlatform: Send + Sync {
    fn capabilities(&self) -> PlatformCapabilities;

    /// Post as the relay's own account.
    async fn send_as_bot(
        &self,
        channel_id: ChannelId,
        content: &str,
        attachments: &[Attachment],
        embeds: &[EmbedRef],
    ) -> Result<()>;

    /// Return a proxy identity for `channel_id`, reusing one the relay already
    /// owns there before creating a new one.
    async fn create_or_fetch_proxy_identity(&self, channel_id: ChannelId) -> Result<ProxyHandle>;

    #[allow(clippy::too_many_arguments)]
    async fn send_as_proxy(
        &self,
        handle: &ProxyHandle,
        display_name: &str,
        avatar_url: Option<&str>,
        content: &str,
        attachments: &[Attachment],
        embeds: &[EmbedRef],
    ) -> Result<()>;

    /// Reply to a message in place (used by reaction translation).
    async fn reply(&self, channel_id: ChannelId, message_id: MessageId, content: &str)
        -> Result<()>;
}
