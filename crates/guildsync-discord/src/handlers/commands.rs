use serenity::all::{Context, Message};

use guildsync_core::{
    commands::{AdminCommand, CommandContext, CommandError},
    domain::{ChannelId, GuildId, UserId},
};

use crate::router::AppState;

pub(super) async fn handle_command(
    state: &AppState,
    ctx: &Context,
    msg: &Message,
    parsed: Result<AdminCommand, CommandError>,
) {
    let reply = match parsed {
        Ok(cmd) => match command_context(ctx, msg).await {
            Some(cx) => state.commands.execute(cmd, &cx).await,
            None => "Error: Could not determine target channel or guild.".to_string(),
        },
        Err(e) => format!("{e}. Try `{} help`.", state.commands.prefix()),
    };

    if let Err(e) = msg.reply(&ctx.http, reply).await {
        tracing::warn!(channel = %msg.channel_id, error = %e, "failed to send command response");
    }
}

async fn command_context(ctx: &Context, msg: &Message) -> Option<CommandContext> {
    let guild_id = msg.guild_id?;
    let (guild_name, guild_icon) = ctx
        .cache
        .guild(guild_id)
        .map(|g| (g.name.clone(), g.icon_url()))
        .unwrap_or_else(|| (guild_id.to_string(), None));

    // Guild owners resolve to all permissions.
    let is_admin = msg
        .author_permissions(&ctx.cache)
        .is_some_and(|p| p.administrator());

    let channel_name = msg
        .channel_id
        .name(ctx)
        .await
        .unwrap_or_else(|_| "Unnamed Channel".to_string());

    Some(CommandContext {
        user_id: UserId(msg.author.id.get()),
        username: msg.author.tag(),
        guild_id: GuildId(guild_id.get()),
        guild_name,
        guild_icon,
        channel_id: ChannelId(msg.channel_id.get()),
        channel_name,
        is_admin,
    })
}
