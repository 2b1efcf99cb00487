//! Discord adapter (serenity).
//!
//! This crate implements the `guildsync-core` RelayPlatform over the Discord
//! REST API. Proxy identities are channel webhooks owned by the bot user.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serenity::all as dc;
use serenity::http::Http;
use tokio::sync::Mutex;

pub mod handlers;
pub mod router;

use guildsync_core::{
    domain::{Attachment, ChannelId, EmbedRef, MessageId, ProxyHandle},
    errors::Error,
    messaging::{
        port::RelayPlatform,
        types::{truncate_chars, PlatformCapabilities},
    },
    Result,
};

const MAX_MESSAGE_LEN: usize = 2000;

pub struct DiscordPlatform {
    http: Arc<Http>,
    self_id: dc::UserId,
    webhook_name: String,
    /// Webhooks we have fetched or created, keyed by webhook id.
    webhooks: Mutex<HashMap<String, dc::Webhook>>,
}

impl DiscordPlatform {
    pub fn new(http: Arc<Http>, self_id: dc::UserId, webhook_name: impl Into<String>) -> Self {
        Self {
            http,
            self_id,
            webhook_name: webhook_name.into(),
            webhooks: Mutex::new(HashMap::new()),
        }
    }

    fn dc_channel(channel_id: ChannelId) -> dc::ChannelId {
        dc::ChannelId::new(channel_id.0)
    }

    fn map_err(e: serenity::Error) -> Error {
        Error::Delivery(format!("discord error: {e}"))
    }

    /// Only webhooks the bot created carry a token we can execute with.
    fn is_own_webhook(&self, webhook: &dc::Webhook) -> bool {
        webhook.token.is_some() && webhook.user.as_ref().is_some_and(|u| u.id == self.self_id)
    }

    async fn webhook_for(&self, handle: &ProxyHandle) -> Result<dc::Webhook> {
        if let Some(w) = self.webhooks.lock().await.get(&handle.id) {
            return Ok(w.clone());
        }
        let webhook = dc::Webhook::from_url(&self.http, &handle.token)
            .await
            .map_err(Self::map_err)?;
        self.webhooks
            .lock()
            .await
            .insert(handle.id.clone(), webhook.clone());
        Ok(webhook)
    }

    /// Re-upload attachments. Any that cannot be fetched are linked instead.
    async fn files(&self, attachments: &[Attachment]) -> (Vec<dc::CreateAttachment>, Vec<String>) {
        let mut files = Vec::with_capacity(attachments.len());
        let mut links = Vec::new();
        for a in attachments {
            match dc::CreateAttachment::url(&self.http, &a.url).await {
                Ok(f) => files.push(f),
                Err(e) => {
                    tracing::warn!(file = %a.filename, error = %e, "attachment download failed, linking instead");
                    links.push(a.url.clone());
                }
            }
        }
        (files, links)
    }
}

fn to_embeds(embeds: &[EmbedRef]) -> Vec<dc::CreateEmbed> {
    embeds
        .iter()
        .filter_map(|e| match serde_json::from_value::<dc::Embed>(e.0.clone()) {
            Ok(embed) => Some(dc::CreateEmbed::from(embed)),
            Err(err) => {
                tracing::debug!(error = %err, "dropping unparseable embed");
                None
            }
        })
        .collect()
}

/// Append attachment links, shortening `content` so the whole post stays
/// within `max_len` characters.
fn with_links(content: &str, links: &[String], max_len: usize) -> String {
    if links.is_empty() {
        return truncate_chars(content, max_len);
    }
    let tail: usize = links.iter().map(|l| l.chars().count() + 1).sum();
    let room = max_len.saturating_sub(tail);
    let mut out = if content.is_empty() || room == 0 {
        String::new()
    } else {
        truncate_chars(content, room)
    };
    for link in links {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(link);
    }
    truncate_chars(&out, max_len)
}

#[async_trait]
impl RelayPlatform for DiscordPlatform {
    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities {
            supports_proxy_identity: true,
            max_message_len: MAX_MESSAGE_LEN,
            max_display_name_len: 80,
        }
    }

    async fn send_as_bot(
        &self,
        channel_id: ChannelId,
        content: &str,
        attachments: &[Attachment],
        embeds: &[EmbedRef],
    ) -> Result<()> {
        let (files, links) = self.files(attachments).await;
        let builder = dc::CreateMessage::new()
            .content(with_links(content, &links, MAX_MESSAGE_LEN))
            .add_files(files)
            .embeds(to_embeds(embeds));
        Self::dc_channel(channel_id)
            .send_message(&self.http, builder)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn create_or_fetch_proxy_identity(&self, channel_id: ChannelId) -> Result<ProxyHandle> {
        let channel = Self::dc_channel(channel_id);
        let existing = channel.webhooks(&self.http).await.map_err(Self::map_err)?;

        let webhook = match existing.into_iter().find(|w| self.is_own_webhook(w)) {
            Some(w) => {
                tracing::debug!(channel = channel_id.0, webhook = %w.id, "reusing webhook");
                w
            }
            None => {
                let w = channel
                    .create_webhook(&self.http, dc::CreateWebhook::new(&self.webhook_name))
                    .await
                    .map_err(Self::map_err)?;
                tracing::info!(channel = channel_id.0, webhook = %w.id, "created webhook");
                w
            }
        };

        let handle = ProxyHandle {
            channel_id,
            id: webhook.id.to_string(),
            token: webhook.url().map_err(Self::map_err)?,
        };
        self.webhooks
            .lock()
            .await
            .insert(handle.id.clone(), webhook);
        Ok(handle)
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
        let webhook = self.webhook_for(handle).await?;
        let (files, links) = self.files(attachments).await;

        let mut builder = dc::ExecuteWebhook::new()
            .content(with_links(content, &links, MAX_MESSAGE_LEN))
            .username(display_name)
            .add_files(files)
            .embeds(to_embeds(embeds));
        if let Some(url) = avatar_url {
            builder = builder.avatar_url(url);
        }

        let sent = webhook.execute(&self.http, false, builder).await;
        if let Err(e) = sent {
            // Deleted or rotated webhooks must be refetched next time.
            self.webhooks.lock().await.remove(&handle.id);
            return Err(Self::map_err(e));
        }
        Ok(())
    }

    async fn reply(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: &str,
    ) -> Result<()> {
        let channel = Self::dc_channel(channel_id);
        let builder = dc::CreateMessage::new()
            .content(content)
            .reference_message((channel, dc::MessageId::new(message_id.0)));
        channel
            .send_message(&self.http, builder)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}
