use serenity::all::{Context, Reaction, ReactionType};

use guildsync_core::{
    domain::{ChannelId, MessageId},
    languages::find_by_flag,
    reaction::ReactionEvent,
};

use crate::router::AppState;

pub(super) async fn handle_reaction(state: &AppState, ctx: &Context, reaction: Reaction) {
    let Some(translator) = state.reactions.as_ref() else {
        return;
    };
    if reaction.guild_id.is_none() {
        return;
    }
    let ReactionType::Unicode(emoji) = &reaction.emoji else {
        return;
    };
    // Skip the REST lookups below for ordinary emoji.
    if find_by_flag(emoji).is_none() {
        return;
    }

    let user_is_bot = match reaction.user(ctx).await {
        Ok(user) => user.bot,
        Err(e) => {
            tracing::warn!(error = %e, "failed to resolve reacting user");
            return;
        }
    };
    let message = match reaction.message(&ctx.http).await {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(message = %reaction.message_id, error = %e, "failed to fetch reacted message");
            return;
        }
    };

    let event = ReactionEvent {
        channel_id: ChannelId(reaction.channel_id.get()),
        message_id: MessageId(reaction.message_id.get()),
        user_is_bot,
        emoji: emoji.clone(),
        content: message.content,
    };
    let outcome = translator.handle(&event).await;
    tracing::debug!(message = event.message_id.0, outcome = ?outcome, "reaction handled");
}
