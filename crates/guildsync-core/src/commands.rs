//! Admin text commands (`!guildsync create`, `!guildsync join <code>`, ...).

use std::sync::Arc;

use chrono::Utc;

use crate::{
    domain::{ChannelId, ChannelLink, GuildId, GuildRecord, SyncGroupId, UserId, UserRecord},
    languages::{find_by_code, normalize_language, LANGUAGES},
    ports::SyncStore,
    Error,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdminCommand {
    About,
    Create { language: String },
    Join { group_code: String, language: String },
    Leave,
    Languages,
    Help,
}

impl AdminCommand {
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            AdminCommand::Create { .. } | AdminCommand::Join { .. } | AdminCommand::Leave
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("missing group code; usage: `join <group_code> [language]`")]
    MissingGroupCode,
    #[error("unsupported language `{0}`; see `languages`")]
    UnsupportedLanguage(String),
}

/// Parse `text` as a command under `prefix`.
///
/// `None` when the text is not addressed to us at all.
pub fn parse_command(text: &str, prefix: &str) -> Option<Result<AdminCommand, CommandError>> {
    let rest = text.trim().strip_prefix(prefix)?;
    // `!guildsyncfoo` is not ours.
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let mut args = rest.split_whitespace();
    let name = args.next().unwrap_or("help").to_lowercase();
    Some(match name.as_str() {
        "about" => Ok(AdminCommand::About),
        "create" => parse_language(args.next()).map(|language| AdminCommand::Create { language }),
        "join" => match args.next() {
            Some(code) => parse_language(args.next()).map(|language| AdminCommand::Join {
                group_code: code.to_string(),
                language,
            }),
            None => Err(CommandError::MissingGroupCode),
        },
        "leave" => Ok(AdminCommand::Leave),
        "languages" | "langs" => Ok(AdminCommand::Languages),
        "help" => Ok(AdminCommand::Help),
        other => Err(CommandError::Unknown(other.to_string())),
    })
}

fn parse_language(arg: Option<&str>) -> Result<String, CommandError> {
    match arg {
        None => Ok(normalize_language(None)),
        Some(code) => find_by_code(code)
            .map(|l| l.code.to_string())
            .ok_or_else(|| CommandError::UnsupportedLanguage(code.to_string())),
    }
}

/// Who issued a command, and where.
#[derive(Clone, Debug)]
pub struct CommandContext {
    pub user_id: UserId,
    pub username: String,
    pub guild_id: GuildId,
    pub guild_name: String,
    pub guild_icon: Option<String>,
    pub channel_id: ChannelId,
    pub channel_name: String,
    /// Trusted flag supplied by the platform adapter.
    pub is_admin: bool,
}

pub const ABOUT_TEXT: &str = "**GuildSync** is a free, open-source, self-hostable Discord bot \
designed to break down language barriers in global gaming communities. \
It enables seamless, real-time multilingual communication and cross-server collaboration.";

pub struct CommandService {
    store: Arc<dyn SyncStore>,
    prefix: String,
}

impl CommandService {
    pub fn new(store: Arc<dyn SyncStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Execute and return the reply text. Failures become readable replies.
    pub async fn execute(&self, cmd: AdminCommand, ctx: &CommandContext) -> String {
        if cmd.requires_admin() && !ctx.is_admin {
            return "You need the Administrator permission to manage sync groups.".to_string();
        }

        let result = match &cmd {
            AdminCommand::About => Ok(ABOUT_TEXT.to_string()),
            AdminCommand::Languages => Ok(languages_text()),
            AdminCommand::Help => Ok(self.help_text()),
            AdminCommand::Create { language } => self.create(ctx, language).await,
            AdminCommand::Join {
                group_code,
                language,
            } => self.join(ctx, group_code, language).await,
            AdminCommand::Leave => self.leave(ctx).await,
        };

        match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(command = ?cmd, channel = ctx.channel_id.0, error = %e, "command failed");
                match e {
                    Error::Store(msg) => format!("Could not update sync settings: {msg}."),
                    _ => "Something went wrong while running that command.".to_string(),
                }
            }
        }
    }

    async fn register_caller(&self, ctx: &CommandContext) -> crate::Result<()> {
        self.store
            .upsert_user(UserRecord {
                id: ctx.user_id,
                username: ctx.username.clone(),
            })
            .await?;
        self.store
            .upsert_guild(GuildRecord {
                id: ctx.guild_id,
                name: ctx.guild_name.clone(),
                icon_url: ctx.guild_icon.clone(),
            })
            .await
    }

    fn link_for(&self, ctx: &CommandContext, group_id: SyncGroupId, language: &str) -> ChannelLink {
        ChannelLink {
            channel_id: ctx.channel_id,
            sync_group_id: group_id,
            language_code: Some(language.to_string()),
            guild_id: ctx.guild_id,
            name: ctx.channel_name.clone(),
            added_by: ctx.user_id,
            created_at: Utc::now(),
        }
    }

    async fn create(&self, ctx: &CommandContext, language: &str) -> crate::Result<String> {
        if let Some(existing) = self.store.find_group_for_channel(ctx.channel_id).await? {
            return Ok(format!(
                "This channel is already linked to sync group `{existing}`. Use `{} leave` first.",
                self.prefix
            ));
        }
        self.register_caller(ctx).await?;
        let group = self.store.create_group(ctx.user_id).await?;
        if let Err(e) = self
            .store
            .link_channel(self.link_for(ctx, group.id.clone(), language))
            .await
        {
            if let Err(cleanup) = self.store.delete_group(&group.id).await {
                tracing::warn!(group = %group.id, error = %cleanup, "failed to remove unlinked sync group");
            }
            return Err(e);
        }

        tracing::info!(group = %group.id, channel = ctx.channel_id.0, language, "channel linked to new sync group");
        Ok(format!(
            "Created new sync group and linked channel <#{}>!\n**Group code:** `{}`\n\nTo link another channel, use:\n`{} join {} [language]`",
            ctx.channel_id, group.id, self.prefix, group.id
        ))
    }

    async fn join(&self, ctx: &CommandContext, group_code: &str, language: &str) -> crate::Result<String> {
        let group_id = SyncGroupId(group_code.to_string());
        if self.store.get_group(&group_id).await?.is_none() {
            return Ok(format!("No sync group with code `{group_code}` exists."));
        }
        if let Some(existing) = self.store.find_group_for_channel(ctx.channel_id).await? {
            return Ok(format!(
                "This channel is already linked to sync group `{existing}`. Use `{} leave` first.",
                self.prefix
            ));
        }
        self.register_caller(ctx).await?;
        self.store
            .link_channel(self.link_for(ctx, group_id, language))
            .await?;

        tracing::info!(group = group_code, channel = ctx.channel_id.0, language, "channel joined sync group");
        Ok(format!(
            "Linked channel <#{}> to sync group `{group_code}`!",
            ctx.channel_id
        ))
    }

    async fn leave(&self, ctx: &CommandContext) -> crate::Result<String> {
        Ok(match self.store.unlink_channel(ctx.channel_id).await? {
            Some(link) => {
                tracing::info!(group = %link.sync_group_id, channel = ctx.channel_id.0, "channel left sync group");
                format!(
                    "Unlinked channel <#{}> from sync group `{}`.",
                    ctx.channel_id, link.sync_group_id
                )
            }
            None => "This channel is not linked to any sync group.".to_string(),
        })
    }

    fn help_text(&self) -> String {
        let p = &self.prefix;
        format!(
            "**GuildSync commands**\n\
             `{p} about` - what this bot does\n\
             `{p} create [language]` - start a sync group with this channel (admin)\n\
             `{p} join <group_code> [language]` - link this channel to a group (admin)\n\
             `{p} leave` - unlink this channel (admin)\n\
             `{p} languages` - list supported language codes\n\
             React to any message with a country flag to get a translation."
        )
    }
}

fn languages_text() -> String {
    let mut out = String::from("**Supported languages**\n");
    for l in LANGUAGES {
        out.push_str(&format!("{} `{}` {}\n", l.flag, l.code, l.native_name));
    }
    out
}
