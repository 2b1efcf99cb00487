use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chat platform user id (snowflake).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// Chat platform channel id (snowflake).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

/// Chat platform guild/server id (snowflake).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuildId(pub u64);

/// Chat platform message id (snowflake).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

/// Sync group id (uuid v4, also used as the join code).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncGroupId(pub String);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SyncGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The author of a relayed message, as shown at the destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub is_bot: bool,
}

/// Opaque attachment reference, passed through untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
}

/// Opaque embed payload in the platform's own JSON shape.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbedRef(pub serde_json::Value);

/// An incoming user post. Read-only to the relay engine.
#[derive(Clone, Debug)]
pub struct RelayMessage {
    pub source_channel_id: ChannelId,
    pub message_id: MessageId,
    pub author: Author,
    /// Set when the post came through a proxy identity (webhook).
    pub webhook_id: Option<String>,
    pub text_content: String,
    pub attachments: Vec<Attachment>,
    pub embeds: Vec<EmbedRef>,
}

/// One channel's membership in a sync group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLink {
    pub channel_id: ChannelId,
    pub sync_group_id: SyncGroupId,
    /// Declared language; `None` for links created before languages existed.
    #[serde(default)]
    pub language_code: Option<String>,
    pub guild_id: GuildId,
    pub name: String,
    pub added_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncGroup {
    pub id: SyncGroupId,
    pub name: String,
    pub description: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRecord {
    pub id: GuildId,
    pub name: String,
    pub icon_url: Option<String>,
}

/// Capability to post into `channel_id` under an arbitrary name/avatar.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyHandle {
    pub channel_id: ChannelId,
    pub id: String,
    pub token: String,
}

impl fmt::Debug for ProxyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyHandle")
            .field("channel_id", &self.channel_id)
            .field("id", &self.id)
            .field("token", &"<redacted>")
            .finish()
    }
}
