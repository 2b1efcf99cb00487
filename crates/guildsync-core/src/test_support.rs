//! Hand-written fakes for the core ports, shared by unit tests.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    domain::*,
    errors::Error,
    messaging::{port::RelayPlatform, types::PlatformCapabilities},
    ports::{SyncStore, Translator},
    retry::Sleeper,
    store::JsonFileStore,
    Result,
};

#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Translator that tags text with the target language, e.g. `[es] hello`.
#[derive(Default)]
pub struct FakeTranslator {
    calls: Mutex<Vec<(String, String)>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeTranslator {
    pub fn fail_language(&self, language: &str) {
        self.failing.lock().unwrap().insert(language.to_string());
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), target_language.to_string()));
        if self.failing.lock().unwrap().contains(target_language) {
            return Err(Error::TranslationUnavailable {
                language: target_language.to_string(),
                attempts: 4,
                reason: "fake outage".to_string(),
            });
        }
        Ok(format!("[{target_language}] {text}"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: ChannelId,
    pub display_name: Option<String>,
    pub content: String,
    pub attachments: usize,
    pub embeds: usize,
    pub proxy_id: Option<String>,
}

#[derive(Default)]
pub struct FakePlatform {
    identity_creations: AtomicUsize,
    creation_delay: Mutex<Option<Duration>>,
    bot_sends: Mutex<Vec<SentMessage>>,
    proxy_sends: Mutex<Vec<SentMessage>>,
    replies: Mutex<Vec<(ChannelId, MessageId, String)>>,
    failing_proxy_channels: Mutex<HashSet<ChannelId>>,
    failing_bot_channels: Mutex<HashSet<ChannelId>>,
    failing_identity_channels: Mutex<HashSet<ChannelId>>,
}

impl FakePlatform {
    pub fn fail_proxy_sends(&self, channel_id: ChannelId) {
        self.failing_proxy_channels.lock().unwrap().insert(channel_id);
    }

    pub fn heal_proxy_sends(&self, channel_id: ChannelId) {
        self.failing_proxy_channels
            .lock()
            .unwrap()
            .remove(&channel_id);
    }

    pub fn fail_bot_sends(&self, channel_id: ChannelId) {
        self.failing_bot_channels.lock().unwrap().insert(channel_id);
    }

    pub fn fail_identity_creation(&self, channel_id: ChannelId) {
        self.failing_identity_channels
            .lock()
            .unwrap()
            .insert(channel_id);
    }

    pub fn slow_identity_creation(&self, delay: Duration) {
        *self.creation_delay.lock().unwrap() = Some(delay);
    }

    pub fn identity_creations(&self) -> usize {
        self.identity_creations.load(Ordering::SeqCst)
    }

    pub fn bot_sends(&self) -> Vec<SentMessage> {
        self.bot_sends.lock().unwrap().clone()
    }

    pub fn proxy_sends(&self) -> Vec<SentMessage> {
        self.proxy_sends.lock().unwrap().clone()
    }

    pub fn replies(&self) -> Vec<(ChannelId, MessageId, String)> {
        self.replies.lock().unwrap().clone()
    }

    /// Every successful delivery, proxy or bot.
    pub fn deliveries(&self) -> Vec<SentMessage> {
        let mut all = self.proxy_sends();
        all.extend(self.bot_sends());
        all
    }
}

#[async_trait]
impl RelayPlatform for FakePlatform {
    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities::default()
    }

    async fn send_as_bot(
        &self,
        channel_id: ChannelId,
        content: &str,
        attachments: &[Attachment],
        embeds: &[EmbedRef],
    ) -> Result<()> {
        if self.failing_bot_channels.lock().unwrap().contains(&channel_id) {
            return Err(Error::Delivery(format!("bot send to {channel_id} failed")));
        }
        self.bot_sends.lock().unwrap().push(SentMessage {
            channel_id,
            display_name: None,
            content: content.to_string(),
            attachments: attachments.len(),
            embeds: embeds.len(),
            proxy_id: None,
        });
        Ok(())
    }

    async fn create_or_fetch_proxy_identity(&self, channel_id: ChannelId) -> Result<ProxyHandle> {
        let n = self.identity_creations.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = *self.creation_delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        if self
            .failing_identity_channels
            .lock()
            .unwrap()
            .contains(&channel_id)
        {
            return Err(Error::Delivery("missing webhook permission".to_string()));
        }
        Ok(ProxyHandle {
            channel_id,
            id: format!("hook-{}-{n}", channel_id.0),
            token: "secret".to_string(),
        })
    }

    async fn send_as_proxy(
        &self,
        handle: &ProxyHandle,
        display_name: &str,
        _avatar_url: Option<&str>,
        content: &str,
        attachments: &[Attachment],
        embeds: &[EmbedRef],
    ) -> Result<()> {
        if self
            .failing_proxy_channels
            .lock()
            .unwrap()
            .contains(&handle.channel_id)
        {
            return Err(Error::Delivery("Unknown Webhook".to_string()));
        }
        self.proxy_sends.lock().unwrap().push(SentMessage {
            channel_id: handle.channel_id,
            display_name: Some(display_name.to_string()),
            content: content.to_string(),
            attachments: attachments.len(),
            embeds: embeds.len(),
            proxy_id: Some(handle.id.clone()),
        });
        Ok(())
    }

    async fn reply(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: &str,
    ) -> Result<()> {
        self.replies
            .lock()
            .unwrap()
            .push((channel_id, message_id, content.to_string()));
        Ok(())
    }
}

pub fn author(id: u64, name: &str) -> Author {
    Author {
        id: UserId(id),
        display_name: name.to_string(),
        avatar_url: Some(format!("https://cdn.example/{id}.png")),
        is_bot: false,
    }
}

pub fn message(channel: u64, text: &str) -> RelayMessage {
    RelayMessage {
        source_channel_id: ChannelId(channel),
        message_id: MessageId(9000 + channel),
        author: author(42, "Ann"),
        webhook_id: None,
        text_content: text.to_string(),
        attachments: vec![Attachment {
            filename: "cat.png".to_string(),
            url: "https://cdn.example/cat.png".to_string(),
        }],
        embeds: vec![EmbedRef(serde_json::json!({"title": "link"}))],
    }
}

/// In-memory store holding one group with the given `(channel, language)` links.
pub async fn store_with_group(channels: &[(u64, Option<&str>)]) -> (JsonFileStore, SyncGroupId) {
    let store = JsonFileStore::in_memory();
    let group = store.create_group(UserId(1)).await.unwrap();
    for (channel, language) in channels {
        store
            .link_channel(ChannelLink {
                channel_id: ChannelId(*channel),
                sync_group_id: group.id.clone(),
                language_code: language.map(str::to_string),
                guild_id: GuildId(100 + channel),
                name: format!("chan-{channel}"),
                added_by: UserId(1),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }
    (store, group.id)
}
