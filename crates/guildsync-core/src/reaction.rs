//! Flag-reaction translation: react with a country flag, get a translated reply.

use std::sync::Arc;

use crate::{
    domain::{ChannelId, MessageId},
    languages::find_by_flag,
    messaging::{port::RelayPlatform, types::truncate_chars},
    ports::Translator,
};

#[derive(Clone, Debug)]
pub struct ReactionEvent {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub user_is_bot: bool,
    pub emoji: String,
    /// Text of the message that was reacted to.
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReactionOutcome {
    Ignored(&'static str),
    Replied { language: String },
    Failed(String),
}

pub struct ReactionTranslator {
    translator: Arc<dyn Translator>,
    platform: Arc<dyn RelayPlatform>,
}

impl ReactionTranslator {
    pub fn new(translator: Arc<dyn Translator>, platform: Arc<dyn RelayPlatform>) -> Self {
        Self {
            translator,
            platform,
        }
    }

    pub async fn handle(&self, event: &ReactionEvent) -> ReactionOutcome {
        if event.user_is_bot {
            return ReactionOutcome::Ignored("bot reaction");
        }
        let Some(language) = find_by_flag(&event.emoji) else {
            return ReactionOutcome::Ignored("not a language flag");
        };
        if event.content.trim().is_empty() {
            return ReactionOutcome::Ignored("no text to translate");
        }

        let translated = match self.translator.translate(&event.content, language.code).await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(message = event.message_id.0, language = language.code, error = %e, "reaction translation failed");
                return ReactionOutcome::Failed(e.to_string());
            }
        };

        let content = truncate_chars(&translated, self.platform.capabilities().max_message_len);
        match self
            .platform
            .reply(event.channel_id, event.message_id, &content)
            .await
        {
            Ok(()) => {
                tracing::debug!(message = event.message_id.0, language = language.code, "posted reaction translation");
                ReactionOutcome::Replied {
                    language: language.code.to_string(),
                }
            }
            Err(e) => ReactionOutcome::Failed(e.to_string()),
        }
    }
}
