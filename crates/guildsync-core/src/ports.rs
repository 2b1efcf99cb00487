use async_trait::async_trait;

use crate::{domain::*, Result};

/// Group/channel persistence.
///
/// The relay engine only uses the read half; the admin commands use the writes.
#[async_trait]
pub trait SyncStore: Send + Sync {
    async fn find_group_for_channel(&self, channel_id: ChannelId) -> Result<Option<SyncGroupId>>;
    async fn list_channels_in_group(&self, group_id: &SyncGroupId) -> Result<Vec<ChannelLink>>;
    async fn get_group(&self, group_id: &SyncGroupId) -> Result<Option<SyncGroup>>;

    async fn upsert_user(&self, user: UserRecord) -> Result<()>;
    async fn upsert_guild(&self, guild: GuildRecord) -> Result<()>;
    async fn create_group(&self, created_by: UserId) -> Result<SyncGroup>;
    /// Removes a group that has no linked channels. Unknown groups are a no-op.
    async fn delete_group(&self, group_id: &SyncGroupId) -> Result<()>;
    /// Fails when the channel already belongs to a group or the group is unknown.
    async fn link_channel(&self, link: ChannelLink) -> Result<()>;
    /// Returns the removed link, if any.
    async fn unlink_channel(&self, channel_id: ChannelId) -> Result<Option<ChannelLink>>;
}

/// Text translation backend.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_language` (ISO 639-1 code).
    ///
    /// Fails with `Error::TranslationUnavailable` rather than returning the
    /// untranslated input.
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}
