use std::sync::Arc;

use serenity::all::Message;

use guildsync_core::domain::{Attachment, Author, ChannelId, EmbedRef, MessageId, RelayMessage, UserId};

use crate::router::AppState;

pub(super) fn to_relay_message(msg: &Message) -> RelayMessage {
    let nick = msg.member.as_ref().and_then(|m| m.nick.as_deref());
    RelayMessage {
        source_channel_id: ChannelId(msg.channel_id.get()),
        message_id: MessageId(msg.id.get()),
        author: Author {
            id: UserId(msg.author.id.get()),
            display_name: display_name(nick, msg.author.global_name.as_deref(), &msg.author.name),
            avatar_url: Some(msg.author.face()),
            is_bot: msg.author.bot,
        },
        webhook_id: msg.webhook_id.map(|w| w.to_string()),
        text_content: msg.content.clone(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| Attachment {
                filename: a.filename.clone(),
                url: a.url.clone(),
            })
            .collect(),
        embeds: msg
            .embeds
            .iter()
            .filter_map(|e| serde_json::to_value(e).ok())
            .map(EmbedRef)
            .collect(),
    }
}

/// Server nickname, then global display name, then username.
fn display_name(nick: Option<&str>, global_name: Option<&str>, username: &str) -> String {
    [nick, global_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|n| !n.is_empty())
        .unwrap_or(username)
        .to_string()
}

pub(super) async fn handle_relay(state: Arc<AppState>, msg: RelayMessage) {
    match state.relay.relay(&msg).await {
        Ok(report) => {
            tracing::debug!(
                channel = msg.source_channel_id.0,
                outcome = ?report.outcome,
                "relay finished"
            );
        }
        Err(e) => {
            tracing::error!(channel = msg.source_channel_id.0, error = %e, "relay failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_nickname() {
        assert_eq!(display_name(Some("Nick"), Some("Global"), "user"), "Nick");
        assert_eq!(display_name(None, Some("Global"), "user"), "Global");
        assert_eq!(display_name(Some(" "), None, "user"), "user");
    }
}
