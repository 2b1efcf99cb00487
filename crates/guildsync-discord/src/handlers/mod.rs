//! Discord gateway event handlers.
//!
//! Each handler is a small adapter that converts serenity types into core
//! values and calls into `guildsync-core` (relay, commands, reactions).

use std::sync::Arc;

use serenity::{
    all::{Context, EventHandler, GatewayIntents, Message, Reaction, Ready},
    async_trait,
};

use guildsync_core::commands::parse_command;

use crate::router::AppState;

mod commands;
mod reaction;
mod relay;

pub struct Handler {
    state: Arc<AppState>,
}

impl Handler {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_MESSAGE_REACTIONS
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Sync groups are guild-only.
        if msg.guild_id.is_none() {
            return;
        }

        if !msg.author.bot && msg.webhook_id.is_none() {
            if let Some(parsed) = parse_command(&msg.content, self.state.commands.prefix()) {
                commands::handle_command(&self.state, &ctx, &msg, parsed).await;
                return;
            }
        }

        let state = self.state.clone();
        let relay_msg = relay::to_relay_message(&msg);
        tokio::spawn(async move { relay::handle_relay(state, relay_msg).await });
    }

    async fn reaction_add(&self, ctx: Context, add_reaction: Reaction) {
        reaction::handle_reaction(&self.state, &ctx, add_reaction).await;
    }
}
